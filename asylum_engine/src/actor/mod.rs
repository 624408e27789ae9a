//! Animated characters: status buckets, direction-driven graphics, walking
//! and the reaction hive used by dialogue scripts.

pub mod dispatch;

use asylum_formats::{ActorRecord, ResourceId, ACTOR_GRAPHIC_SLOTS};
use bitflags::bitflags;
use serde::Serialize;

use crate::audio::{volume_adjustment, AudioMixer};
use crate::config::VOLUME_SILENT;
use crate::error::{ContentError, ContentResult};
use crate::frame::TickContext;
use crate::graphics::{DrawFlags, DrawQueue, Point, Rect};
use crate::resources::{ResourceProvider, SpeechRequest};
use crate::services::Services;
use crate::world::{ActionType, World};

pub use dispatch::{StatusDispatch, StatusHandler};

/// Direction value meaning "keep the current one".
pub const DIRECTION_NONE: i32 = 8;
pub const REACTION_SLOTS: usize = 8;
const MAX_REACTION: i32 = 16;
/// `update_mode` value that freezes the actor's graphics.
pub const UPDATE_MODE_FROZEN: i32 = 5;

/// First graphic slot of each status bucket.
pub mod bucket {
    pub const WALK: i32 = 0;
    pub const IDLE: i32 = 5;
    pub const FIDGET: i32 = 10;
    pub const FIDGET_ALT: i32 = 15;
    pub const TALK: i32 = 20;
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
    pub struct ActorFlags: u32 {
        const VISIBLE = 0x1;
        const MASKED = 0x2;
        const _ = !0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(i32)]
pub enum ActorStatus {
    None = 0,
    Walking = 1,
    WalkingTo = 2,
    Interacting = 3,
    Enabled = 4,
    Disabled = 5,
    ShowingInventory = 6,
    InteractionDone = 7,
    Talking = 8,
    Fidget = 9,
    Status10 = 10,
    Status11 = 11,
    Walking2 = 12,
    WalkingTo2 = 13,
    Enabled2 = 14,
    Status15 = 15,
    Status16 = 16,
    Status17 = 17,
    Status18 = 18,
    Interacting2 = 19,
    InteractionDone2 = 20,
    Status21 = 21,
}

impl ActorStatus {
    pub const ALL: [ActorStatus; 22] = [
        ActorStatus::None,
        ActorStatus::Walking,
        ActorStatus::WalkingTo,
        ActorStatus::Interacting,
        ActorStatus::Enabled,
        ActorStatus::Disabled,
        ActorStatus::ShowingInventory,
        ActorStatus::InteractionDone,
        ActorStatus::Talking,
        ActorStatus::Fidget,
        ActorStatus::Status10,
        ActorStatus::Status11,
        ActorStatus::Walking2,
        ActorStatus::WalkingTo2,
        ActorStatus::Enabled2,
        ActorStatus::Status15,
        ActorStatus::Status16,
        ActorStatus::Status17,
        ActorStatus::Status18,
        ActorStatus::Interacting2,
        ActorStatus::InteractionDone2,
        ActorStatus::Status21,
    ];

    pub fn from_i32(value: i32) -> Option<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_walking_to(self) -> bool {
        matches!(self, ActorStatus::WalkingTo | ActorStatus::WalkingTo2)
    }

    /// Statuses past `Status11` belong to the alternate set.
    pub fn is_alternate(self) -> bool {
        self > ActorStatus::Status11
    }
}

/// Unit step for each direction.
pub const DIRECTION_DELTAS: [Point; 8] = [
    Point::new(0, -1),
    Point::new(-1, -1),
    Point::new(-1, 0),
    Point::new(-1, 1),
    Point::new(0, 1),
    Point::new(1, 1),
    Point::new(1, 0),
    Point::new(1, -1),
];

/// Collapses mirrored directions onto the sprite set they reuse.
pub fn mirrored_direction(direction: i32) -> i32 {
    if direction > 4 {
        8 - direction
    } else {
        direction
    }
}

/// Compass direction from `from` towards `to`: 0 faces up, 2 left, 4 down,
/// 6 right, odd values the diagonals in between.
pub fn get_direction(from: Point, to: Point) -> i32 {
    let dx = to.x - from.x;
    let dy = from.y - to.y;

    let base = if dx == 0 {
        90
    } else {
        (dy.unsigned_abs() as f64)
            .atan2(dx.unsigned_abs() as f64)
            .to_degrees()
            .floor() as i32
    };
    let mut angle = match (dx < 0, dy < 0) {
        (false, false) => base,
        (false, true) => 360 - base,
        (true, false) => 180 - base,
        (true, true) => base + 180,
    };
    if angle >= 360 {
        angle -= 360;
    }

    match angle {
        157..=201 => 2,
        112..=156 => 1,
        67..=111 => 0,
        22..=66 => 7,
        292..=336 => 5,
        247..=291 => 4,
        202..=246 => 3,
        _ => 6,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActorMask {
    pub resource_id: ResourceId,
    /// Scene position of the mask's top-left corner.
    pub destination: Point,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub index: usize,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub resource_id: ResourceId,
    pub frame_index: u32,
    pub frame_count: u32,
    /// Top-left of the sprite box; `x1 + x2, y1 + y2` is the actor's feet.
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub bounding_rect: Rect,
    pub direction: i32,
    pub status: ActorStatus,
    pub priority: i32,
    pub flags: ActorFlags,
    pub action_index1: i32,
    pub action_index2: i32,
    pub action_index3: i32,
    pub reactions: [i32; REACTION_SLOTS],
    pub number_value01: i32,
    pub marker: i32,
    pub graphic_resource_ids: Vec<ResourceId>,
    pub walking_sounds: [ResourceId; 4],
    pub tick_value: u64,
    pub action_type: ActionType,
    pub sound_resource_id: ResourceId,
    pub update_mode: i32,
    pub attenuation: i32,
    pub transparency: i32,
    /// Parameters of the last scripted behaviour request.
    pub behaviour: [i32; 8],
    /// Free-form flag scripts set and branch on.
    pub script_flag: i32,
    pub mask: Option<ActorMask>,
    walk_target: Option<Point>,
}

impl Actor {
    pub fn new(index: usize) -> Self {
        Actor {
            index,
            name: String::new(),
            x: 0,
            y: 0,
            resource_id: 0,
            frame_index: 0,
            frame_count: 1,
            x1: 0,
            y1: 0,
            x2: 0,
            y2: 0,
            bounding_rect: Rect::default(),
            direction: 0,
            status: ActorStatus::Enabled,
            priority: 0,
            flags: ActorFlags::VISIBLE,
            action_index1: 0,
            action_index2: 0,
            action_index3: 0,
            reactions: [0; REACTION_SLOTS],
            number_value01: 0,
            marker: 0,
            graphic_resource_ids: vec![0; ACTOR_GRAPHIC_SLOTS],
            walking_sounds: [0; 4],
            tick_value: 0,
            action_type: ActionType::empty(),
            sound_resource_id: 0,
            update_mode: 0,
            attenuation: 0,
            transparency: 0,
            behaviour: [0; 8],
            script_flag: 0,
            mask: None,
            walk_target: None,
        }
    }

    pub fn from_record(index: usize, record: &ActorRecord) -> Self {
        let status = ActorStatus::from_i32(record.status).unwrap_or_else(|| {
            log::warn!("actor {index}: unknown status {}, using Enabled", record.status);
            ActorStatus::Enabled
        });
        Actor {
            name: record.name.clone(),
            x: record.x,
            y: record.y,
            resource_id: record.resource_id,
            frame_index: record.frame_index.max(0) as u32,
            frame_count: record.frame_count.max(0) as u32,
            x1: record.x1,
            y1: record.y1,
            x2: record.x2,
            y2: record.y2,
            bounding_rect: record.bounding_rect.into(),
            direction: record.direction,
            status,
            priority: record.priority,
            flags: ActorFlags::from_bits_retain(record.flags as u32),
            action_index1: record.action_index1,
            action_index2: record.action_index2,
            action_index3: record.action_index3,
            reactions: record.reactions,
            number_value01: record.number_value01,
            marker: record.marker,
            graphic_resource_ids: record.graphic_resource_ids.to_vec(),
            walking_sounds: record.walking_sounds,
            tick_value: record.tick_value.max(0) as u64,
            action_type: ActionType::from_record(record.action_type),
            sound_resource_id: record.sound_resource_id,
            update_mode: record.update_mode,
            attenuation: record.attenuation,
            transparency: record.transparency,
            ..Actor::new(index)
        }
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(ActorFlags::VISIBLE)
    }

    pub fn set_visible(&mut self, visible: bool, mixer: &mut dyn AudioMixer) {
        self.flags.set(ActorFlags::VISIBLE, visible);
        self.stop_sound(mixer);
    }

    pub fn stop_sound(&self, mixer: &mut dyn AudioMixer) {
        if self.sound_resource_id != 0 && mixer.is_playing(self.sound_resource_id) {
            mixer.stop(self.sound_resource_id);
        }
    }

    /// Where the actor stands.
    pub fn center(&self) -> Point {
        Point::new(self.x1 + self.x2, self.y1 + self.y2)
    }

    pub fn is_at(&self, x: i32, y: i32) -> bool {
        self.center() == Point::new(x, y)
    }

    pub fn walk_target(&self) -> Option<Point> {
        self.walk_target
    }

    pub fn graphic_slot(&self, slot: i32) -> ContentResult<ResourceId> {
        usize::try_from(slot)
            .ok()
            .and_then(|index| self.graphic_resource_ids.get(index).copied())
            .ok_or(ContentError::GraphicSlot {
                actor: self.index,
                slot,
            })
    }

    /// True when slot `index` holds its own graphic rather than the idle one.
    pub fn is_default_direction(&self, index: usize) -> bool {
        self.graphic_resource_ids.get(index) != self.graphic_resource_ids.get(bucket::IDLE as usize)
    }

    fn refresh_frame_count(&mut self, resources: &dyn ResourceProvider) {
        match resources.frame_count(self.resource_id) {
            Some(count) => self.frame_count = count,
            None => log::warn!(
                "actor {}: graphic {:#010x} is missing, keeping {} frames",
                self.index,
                self.resource_id,
                self.frame_count
            ),
        }
    }

    /// Swaps in graphic `id` and rewinds it.
    pub fn set_graphic(&mut self, id: ResourceId, resources: &dyn ResourceProvider) {
        self.resource_id = id;
        self.refresh_frame_count(resources);
        self.frame_index = 0;
    }

    /// Picks the graphic of bucket `offset` for the current direction and
    /// rewinds it.
    pub fn update_graphic_data(
        &mut self,
        offset: i32,
        resources: &dyn ResourceProvider,
    ) -> ContentResult<()> {
        let id = self.graphic_slot(mirrored_direction(self.direction) + offset)?;
        self.set_graphic(id, resources);
        Ok(())
    }

    pub fn update_status(
        &mut self,
        status: ActorStatus,
        services: &mut Services,
    ) -> ContentResult<()> {
        let resources = services.resources.as_ref();
        match status {
            ActorStatus::Walking | ActorStatus::Walking2 => {
                if !matches!(
                    self.status,
                    ActorStatus::Enabled
                        | ActorStatus::Fidget
                        | ActorStatus::Enabled2
                        | ActorStatus::Status15
                        | ActorStatus::Status18
                ) {
                    return Ok(());
                }
                self.update_graphic_data(bucket::WALK, resources)?;
                if matches!(
                    self.status,
                    ActorStatus::Enabled2 | ActorStatus::Status15 | ActorStatus::Status18
                ) {
                    self.status = ActorStatus::Walking2;
                    return Ok(());
                }
            }
            ActorStatus::WalkingTo | ActorStatus::WalkingTo2 => {
                self.update_graphic_data(bucket::WALK, resources)?;
            }
            ActorStatus::Enabled | ActorStatus::ShowingInventory | ActorStatus::Enabled2 => {
                self.update_graphic_data(bucket::IDLE, resources)?;
            }
            ActorStatus::Disabled => {
                self.update_graphic_data(bucket::FIDGET_ALT, resources)?;
            }
            ActorStatus::Talking | ActorStatus::Status10 | ActorStatus::Status17 => {
                self.update_graphic_data(bucket::TALK, resources)?;
            }
            ActorStatus::Fidget => {
                if services.encounters.is_running() {
                    return Ok(());
                }
                let offset = if services.random.get_random_bit()
                    && self.is_default_direction(bucket::FIDGET_ALT as usize)
                {
                    bucket::FIDGET_ALT
                } else {
                    bucket::FIDGET
                };
                self.update_graphic_data(offset, services.resources.as_ref())?;
            }
            ActorStatus::Status15 => {
                self.update_graphic_data(bucket::FIDGET, resources)?;
            }
            ActorStatus::Status16 => {
                self.update_graphic_data(bucket::FIDGET_ALT, resources)?;
            }
            _ => {}
        }
        self.status = status;
        Ok(())
    }

    /// Turns the actor and swaps in the graphic its status uses for the new
    /// direction.
    pub fn update_from_direction(
        &mut self,
        direction: i32,
        resources: &dyn ResourceProvider,
    ) -> ContentResult<()> {
        self.direction = direction;
        if self.update_mode == UPDATE_MODE_FROZEN {
            return Ok(());
        }
        let base = mirrored_direction(direction);
        match self.status {
            ActorStatus::Disabled | ActorStatus::Enabled | ActorStatus::Enabled2 => {
                self.resource_id = self.graphic_slot(base + bucket::IDLE)?;
                self.refresh_frame_count(resources);
            }
            ActorStatus::Walking | ActorStatus::WalkingTo | ActorStatus::Walking2 => {
                self.resource_id = self.graphic_slot(base + bucket::WALK)?;
            }
            ActorStatus::Talking => {
                self.resource_id = self.graphic_slot(base + bucket::TALK)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Places the actor's feet at `(x, y)`.
    pub fn set_position(
        &mut self,
        x: i32,
        y: i32,
        direction: i32,
        frame: i32,
        resources: &dyn ResourceProvider,
    ) -> ContentResult<()> {
        self.x1 = x - self.x2;
        self.y1 = y - self.y2;
        if self.direction != DIRECTION_NONE {
            self.update_from_direction(direction, resources)?;
        }
        if frame > 0 {
            self.frame_index = frame as u32;
        }
        Ok(())
    }

    pub fn face_point(
        &mut self,
        point: Point,
        resources: &dyn ResourceProvider,
    ) -> ContentResult<()> {
        let direction = get_direction(self.center(), point);
        self.update_from_direction(direction, resources)
    }

    /// Plans a straight walk to `(x, y)`; false when the point lies outside
    /// every walkable region.
    pub fn process(&mut self, x: i32, y: i32, world: &World) -> bool {
        let target = Point::new(x, y);
        if !world.is_walkable(target) {
            return false;
        }
        self.walk_target = Some(target);
        true
    }

    /// True when `steps` single-pixel moves from `from` along `direction`
    /// all stay walkable.
    pub fn can_step(world: &World, from: Point, direction: i32, steps: i32) -> bool {
        let delta = DIRECTION_DELTAS[direction.rem_euclid(8) as usize];
        (1..=steps).all(|step| {
            world.is_walkable(Point::new(from.x + delta.x * step, from.y + delta.y * step))
        })
    }

    /// Starts walking to `(x, y)`, or complains when it cannot be reached.
    pub fn process_status(
        &mut self,
        x: i32,
        y: i32,
        do_speech: bool,
        world: &World,
        services: &mut Services,
    ) -> ContentResult<()> {
        if self.process(x, y, world) {
            let status = if self.status <= ActorStatus::Status11 {
                ActorStatus::WalkingTo
            } else {
                ActorStatus::WalkingTo2
            };
            self.update_status(status, services)?;
        } else if do_speech {
            services.play_speech(SpeechRequest::Indexed { index: 1 });
        }
        Ok(())
    }

    /// Moves one step along the planned walk. Returns true on arrival.
    pub(crate) fn step_walk(
        &mut self,
        step: i32,
        resources: &dyn ResourceProvider,
    ) -> ContentResult<bool> {
        let Some(target) = self.walk_target else {
            return Ok(true);
        };
        let center = self.center();
        let dx = target.x - center.x;
        let dy = target.y - center.y;
        let distance = ((dx as f64).powi(2) + (dy as f64).powi(2)).sqrt();
        if distance <= step as f64 {
            self.x1 += dx;
            self.y1 += dy;
            self.walk_target = None;
            return Ok(true);
        }

        let direction = get_direction(center, target);
        if direction != self.direction {
            self.update_from_direction(direction, resources)?;
        }
        self.x1 += (dx as f64 * step as f64 / distance).round() as i32;
        self.y1 += (dy as f64 * step as f64 / distance).round() as i32;
        Ok(false)
    }

    pub(crate) fn advance_loop(&mut self) {
        if self.frame_count > 0 {
            self.frame_index = (self.frame_index + 1) % self.frame_count;
        }
    }

    pub fn add_reaction(&mut self, reaction: i32, number_add: i32) {
        if reaction <= 0 || reaction > MAX_REACTION {
            return;
        }
        if self.reactions.contains(&reaction) {
            self.number_value01 += number_add;
            return;
        }
        let Some(slot) = self.reactions.iter_mut().find(|slot| **slot == 0) else {
            log::warn!("actor {}: reaction hive is full, dropping {reaction}", self.index);
            return;
        };
        *slot = reaction;
        self.number_value01 += number_add;
    }

    /// Subtracts from the hive counter, or drops `reaction` when there is
    /// nothing to subtract.
    pub fn remove_reaction(&mut self, reaction: i32, number_sub: i32) {
        if reaction <= 0 || reaction > MAX_REACTION {
            return;
        }
        if number_sub != 0 {
            self.number_value01 = (self.number_value01 - number_sub).max(0);
            return;
        }
        if let Some(position) = self.reactions.iter().position(|slot| *slot == reaction) {
            self.reactions.copy_within(position + 1.., position);
            self.reactions[REACTION_SLOTS - 1] = 0;
        }
    }

    pub fn has_reaction(&self, reaction: i32, test_number: i32) -> bool {
        if reaction <= 0 || reaction > MAX_REACTION {
            return false;
        }
        if test_number != 0 {
            return self.reactions.contains(&reaction) && self.number_value01 >= test_number;
        }
        self.reactions.contains(&reaction)
    }

    pub fn clear_behaviour(&mut self) {
        self.behaviour = [0; 8];
        self.walk_target = None;
    }

    /// Runs the handler registered for the current status, then keeps the
    /// actor's voice at the level its distance calls for.
    pub fn update(
        &mut self,
        dispatch: &StatusDispatch,
        ctx: &mut TickContext<'_>,
        world: &mut World,
    ) -> ContentResult<()> {
        if !self.is_visible() {
            return Ok(());
        }
        if let Some(handler) = dispatch.resolve(self.status, world.chapter, self.index) {
            handler(self, ctx, world)?;
        }
        self.set_volume(ctx);
        Ok(())
    }

    fn set_volume(&self, ctx: &mut TickContext<'_>) {
        let id = self.sound_resource_id;
        if id == 0 || !ctx.services.mixer.is_playing(id) {
            return;
        }
        let volume = ctx.services.config.voice_volume
            + volume_adjustment(ctx.listener, self.center(), self.attenuation, 0);
        ctx.services.mixer.set_volume(id, volume.max(VOLUME_SILENT));
    }

    pub fn draw(&self, queue: &mut DrawQueue, world: &World) {
        if !self.is_visible() || self.resource_id == 0 {
            return;
        }
        let camera = world.camera.position();
        let point = Point::new(self.x + self.x1, self.y + self.y1) - camera;
        let flags = if self.direction > 4 {
            DrawFlags::MIRROR_LEFT_RIGHT
        } else {
            DrawFlags::empty()
        };
        match self.mask {
            Some(mask) if self.flags.contains(ActorFlags::MASKED) => queue.add_masked(
                self.resource_id,
                self.frame_index,
                point,
                mask.resource_id,
                mask.destination - camera,
                flags,
                self.priority,
            ),
            _ => queue.add(
                self.resource_id,
                self.frame_index,
                point,
                flags,
                self.transparency,
                self.priority,
            ),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::graphics::GraphicItemKind;
    use crate::resources::InMemoryResources;
    use asylum_formats::{GraphicFrame, GraphicResource};

    pub(crate) fn graphic_id(slot: usize) -> ResourceId {
        0x0100_0000 + slot as i32
    }

    /// Actor whose slot `n` holds graphic `graphic_id(n)` with `n % 4 + 1`
    /// frames.
    pub(crate) fn rigged() -> (Actor, Services) {
        let mut resources = InMemoryResources::new();
        let mut actor = Actor::new(0);
        for slot in 0..ACTOR_GRAPHIC_SLOTS {
            let frames = (0..slot % 4 + 1).map(|_| GraphicFrame::solid(2, 2, 1)).collect();
            resources.insert_graphic(graphic_id(slot), GraphicResource::new(frames));
            actor.graphic_resource_ids[slot] = graphic_id(slot);
        }
        (actor, Services::new(EngineConfig::default(), Box::new(resources)))
    }

    #[test]
    fn directions_follow_the_compass_sectors() {
        let origin = Point::new(100, 100);
        assert_eq!(get_direction(origin, Point::new(100, 50)), 0);
        assert_eq!(get_direction(origin, Point::new(50, 50)), 1);
        assert_eq!(get_direction(origin, Point::new(50, 100)), 2);
        assert_eq!(get_direction(origin, Point::new(50, 150)), 3);
        assert_eq!(get_direction(origin, Point::new(100, 150)), 4);
        assert_eq!(get_direction(origin, Point::new(150, 150)), 5);
        assert_eq!(get_direction(origin, Point::new(150, 100)), 6);
        assert_eq!(get_direction(origin, Point::new(150, 50)), 7);
        assert_eq!(get_direction(origin, origin), 0);
    }

    #[test]
    fn mirrored_directions_share_graphics() {
        let (mut actor, services) = rigged();
        let resources = services.resources.as_ref();
        for direction in 5..=8 {
            actor.update_from_direction(direction, resources).unwrap();
            let mirrored = actor.resource_id;
            actor.update_from_direction(8 - direction, resources).unwrap();
            assert_eq!(mirrored, actor.resource_id);
            assert_eq!(mirrored, graphic_id((8 - direction) as usize + 5));
        }
    }

    #[test]
    fn status_buckets_select_graphic_offsets() {
        let (mut actor, mut services) = rigged();
        actor.direction = 6;

        actor.update_status(ActorStatus::Talking, &mut services).unwrap();
        assert_eq!(actor.resource_id, graphic_id(22));
        assert_eq!(actor.frame_count, 3);

        actor.update_status(ActorStatus::Disabled, &mut services).unwrap();
        assert_eq!(actor.resource_id, graphic_id(17));

        actor.update_status(ActorStatus::Status15, &mut services).unwrap();
        assert_eq!(actor.resource_id, graphic_id(12));

        actor.update_status(ActorStatus::Enabled2, &mut services).unwrap();
        assert_eq!(actor.resource_id, graphic_id(7));
        actor.update_status(ActorStatus::Walking, &mut services).unwrap();
        assert_eq!(actor.status, ActorStatus::Walking2);
        assert_eq!(actor.resource_id, graphic_id(2));
    }

    #[test]
    fn walking_request_ignored_from_busy_statuses() {
        let (mut actor, mut services) = rigged();
        actor.status = ActorStatus::Talking;
        actor.update_status(ActorStatus::Walking, &mut services).unwrap();
        assert_eq!(actor.status, ActorStatus::Talking);
    }

    #[test]
    fn set_position_places_the_feet() {
        let (mut actor, services) = rigged();
        actor.x2 = 10;
        actor.y2 = 40;
        actor
            .set_position(200, 300, 2, 3, services.resources.as_ref())
            .unwrap();
        assert_eq!((actor.x1, actor.y1), (190, 260));
        assert!(actor.is_at(200, 300));
        assert_eq!(actor.resource_id, graphic_id(7));
        assert_eq!(actor.frame_index, 3);

        actor.direction = DIRECTION_NONE;
        actor
            .set_position(0, 0, 4, 0, services.resources.as_ref())
            .unwrap();
        assert_eq!(actor.direction, DIRECTION_NONE);
    }

    #[test]
    fn out_of_range_slot_is_a_content_error() {
        let (mut actor, services) = rigged();
        assert_eq!(
            actor.update_graphic_data(60, services.resources.as_ref()),
            Err(ContentError::GraphicSlot { actor: 0, slot: 60 })
        );
    }

    #[test]
    fn reaction_hive_adds_removes_and_tests() {
        let mut actor = Actor::new(3);
        actor.add_reaction(4, 2);
        actor.add_reaction(6, 1);
        actor.add_reaction(40, 1);
        assert_eq!(&actor.reactions[..3], &[4, 6, 0]);
        assert_eq!(actor.number_value01, 3);
        assert!(actor.has_reaction(6, 0));
        assert!(actor.has_reaction(6, 3));
        assert!(!actor.has_reaction(6, 4));

        actor.remove_reaction(4, 0);
        assert_eq!(&actor.reactions[..2], &[6, 0]);
        actor.remove_reaction(6, 5);
        assert_eq!(actor.number_value01, 0);
        assert!(actor.has_reaction(6, 0));
    }

    #[test]
    fn walk_stays_inside_walkable_regions() {
        let (mut actor, mut services) = rigged();
        let mut world = World::new();
        world.walkable.push(Rect::new(0, 0, 100, 100));
        assert!(!actor.process(150, 20, &world));

        actor
            .process_status(30, 40, false, &world, &mut services)
            .unwrap();
        assert_eq!(actor.status, ActorStatus::WalkingTo);
        assert_eq!(actor.walk_target(), Some(Point::new(30, 40)));

        let resources = services.resources.as_ref();
        let mut arrived = false;
        for _ in 0..10 {
            if actor.step_walk(8, resources).unwrap() {
                arrived = true;
                break;
            }
        }
        assert!(arrived);
        assert!(actor.is_at(30, 40));
        assert_eq!(actor.direction, 5);
    }

    #[test]
    fn draw_mirrors_directions_past_four() {
        let mut world = World::new();
        world.camera.set_position(5, 5);
        let mut actor = Actor::new(1);
        actor.resource_id = 9;
        actor.x1 = 20;
        actor.y1 = 30;
        actor.direction = 6;
        actor.priority = 4;

        let mut queue = DrawQueue::new();
        actor.draw(&mut queue, &world);
        let item = queue.items()[0];
        assert_eq!(item.source, Point::new(15, 25));
        assert_eq!(item.flags, DrawFlags::MIRROR_LEFT_RIGHT);
        assert_eq!(item.priority, 4);

        actor.flags |= ActorFlags::MASKED;
        actor.mask = Some(ActorMask {
            resource_id: 50,
            destination: Point::new(10, 10),
        });
        actor.draw(&mut queue, &world);
        assert_eq!(
            queue.items()[1].kind,
            GraphicItemKind::Masked {
                mask: 50,
                destination: Point::new(5, 5)
            }
        );
    }
}
