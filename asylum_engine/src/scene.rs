//! The loaded scene: world state, its actors and objects, and the rendering
//! state they draw into.

use std::collections::VecDeque;

use serde::Serialize;

use crate::actor::{Actor, ActorStatus, StatusDispatch};
use crate::error::{ContentError, ContentResult};
use crate::frame::TickContext;
use crate::graphics::{Compositor, DrawFlags, DrawQueue, PaletteEngine, Point};
use crate::object::Object;
use crate::resources::ResourceProvider;
use crate::services::Services;
use crate::world::World;

/// Oldest transcript entries are dropped past this many.
pub const EVENT_LOG_LIMIT: usize = 4096;

/// Where an actor looks when asked to face something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FaceTarget {
    /// Centre of an object's current frame.
    Object(i32),
    /// Centre of an action area's polygon.
    ActionArea(i32),
    Actor(i32),
    /// Both coordinates set to the same value.
    Point(i32),
}

impl FaceTarget {
    /// Decodes the `(target, from)` pair scripts pass.
    pub fn from_params(target: i32, from: i32) -> Option<Self> {
        match from {
            0 => Some(FaceTarget::Object(target)),
            1 => Some(FaceTarget::ActionArea(target)),
            2 => Some(FaceTarget::Actor(target)),
            3 => Some(FaceTarget::Point(target)),
            _ => None,
        }
    }
}

pub struct Scene {
    pub world: World,
    pub actors: Vec<Actor>,
    pub objects: Vec<Object>,
    pub palette: PaletteEngine,
    pub compositor: Compositor,
    pub queue: DrawQueue,
    pub dispatch: StatusDispatch,
    /// Transcript of notable state changes, oldest first, holding at most
    /// [`EVENT_LOG_LIMIT`] entries.
    pub events: VecDeque<String>,
}

impl Scene {
    pub fn new(gamma_level: i32) -> Self {
        Scene {
            world: World::new(),
            actors: Vec::new(),
            objects: Vec::new(),
            palette: PaletteEngine::new(gamma_level),
            compositor: Compositor::new(),
            queue: DrawQueue::new(),
            dispatch: StatusDispatch::builtin(),
            events: VecDeque::new(),
        }
    }

    pub fn with_actors(mut self, actors: Vec<Actor>) -> Self {
        self.actors = actors;
        self
    }

    pub fn with_objects(mut self, objects: Vec<Object>) -> Self {
        self.objects = objects;
        self
    }

    pub fn record(&mut self, event: impl Into<String>) {
        let event = event.into();
        log::debug!("{event}");
        if self.events.len() == EVENT_LOG_LIMIT {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn actor(&self, index: i32) -> ContentResult<&Actor> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.actors.get(index))
            .ok_or(ContentError::MissingActor(index))
    }

    pub fn actor_mut(&mut self, index: i32) -> ContentResult<&mut Actor> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.actors.get_mut(index))
            .ok_or(ContentError::MissingActor(index))
    }

    /// Actor `index` together with the world it moves in.
    pub fn actor_and_world(&mut self, index: i32) -> ContentResult<(&mut Actor, &World)> {
        let actor = usize::try_from(index)
            .ok()
            .and_then(|index| self.actors.get_mut(index))
            .ok_or(ContentError::MissingActor(index))?;
        Ok((actor, &self.world))
    }

    pub fn player_index(&self) -> i32 {
        self.world.player_actor_index as i32
    }

    pub fn player(&self) -> ContentResult<&Actor> {
        self.actor(self.player_index())
    }

    pub fn player_mut(&mut self) -> ContentResult<&mut Actor> {
        self.actor_mut(self.player_index())
    }

    pub fn object(&self, id: i32) -> ContentResult<&Object> {
        self.objects
            .iter()
            .find(|object| object.id == id)
            .ok_or(ContentError::MissingObject(id))
    }

    pub fn object_mut(&mut self, id: i32) -> ContentResult<&mut Object> {
        self.objects
            .iter_mut()
            .find(|object| object.id == id)
            .ok_or(ContentError::MissingObject(id))
    }

    /// Disables object `id` and drops its pending draw.
    pub fn remove_object(&mut self, id: i32) -> ContentResult<()> {
        let object = self
            .objects
            .iter_mut()
            .find(|object| object.id == id)
            .ok_or(ContentError::MissingObject(id))?;
        object.disable_and_remove(&mut self.queue);
        Ok(())
    }

    /// Scene position sounds are heard from: the player's feet, or the
    /// middle of the view when there is no player.
    pub fn listener(&self) -> Point {
        match self.player() {
            Ok(player) => player.center(),
            Err(_) => self.world.camera.view().center(),
        }
    }

    pub fn actor_statuses(&self) -> Vec<ActorStatus> {
        self.actors.iter().map(|actor| actor.status).collect()
    }

    /// Records every actor whose status differs from `before`.
    pub fn record_status_changes(&mut self, before: &[ActorStatus]) {
        let changes: Vec<String> = self
            .actors
            .iter()
            .zip(before)
            .filter(|(actor, old)| actor.status != **old)
            .map(|(actor, old)| {
                format!(
                    "actor.{}.status {} -> {}",
                    actor.index,
                    old.as_i32(),
                    actor.status.as_i32()
                )
            })
            .collect();
        for change in changes {
            self.record(change);
        }
    }

    /// Turns actor `index` towards `target`. A missing action area only
    /// warns, as the lookup is optional.
    pub fn face_target(
        &mut self,
        index: i32,
        target: FaceTarget,
        resources: &dyn ResourceProvider,
    ) -> ContentResult<()> {
        let point = match target {
            FaceTarget::Object(id) => self.object(id)?.frame_center(resources)?,
            FaceTarget::ActionArea(id) => match self.world.action_area(id) {
                Ok(area) => area.polygon.center(),
                Err(_) => {
                    log::warn!("actor {index} cannot face missing action area {id}");
                    return Ok(());
                }
            },
            FaceTarget::Actor(other) => self.actor(other)?.center(),
            FaceTarget::Point(value) => Point::new(value, value),
        };
        self.actor_mut(index)?.face_point(point, resources)
    }

    /// Runs one autonomous step of every actor, then every object.
    pub fn update_entities(
        &mut self,
        services: &mut Services,
        now: u64,
        script_processing: bool,
    ) -> ContentResult<()> {
        let mut ctx = TickContext {
            now,
            script_processing,
            services,
            listener: self.listener(),
            camera: self.world.camera.position(),
        };
        for actor in self.actors.iter_mut() {
            actor.update(&self.dispatch, &mut ctx, &mut self.world)?;
        }
        for object in self.objects.iter_mut() {
            object.update(&mut ctx, &mut self.world)?;
        }
        Ok(())
    }

    /// Draws the background straight into the back buffer. A missing
    /// background leaves the buffer as it is.
    pub fn draw_background(&mut self, resources: &dyn ResourceProvider) -> ContentResult<()> {
        let id = self.world.background_resource_id;
        if id == 0 {
            return Ok(());
        }
        if resources.graphic(id).is_none() {
            log::warn!("background {id:#010x} is missing");
            return Ok(());
        }
        let origin = Point::new(0, 0) - self.world.camera.position();
        self.compositor
            .draw(resources, id, 0, origin, DrawFlags::empty(), false)
    }

    /// Queues every object, then every actor.
    pub fn queue_entities(&mut self, performance: i32) {
        for object in &self.objects {
            object.draw(&mut self.queue, &self.world, performance);
        }
        for actor in &self.actors {
            actor.draw(&mut self.queue, &self.world);
        }
    }
}
