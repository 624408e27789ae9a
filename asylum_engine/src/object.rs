//! Scene props: animation modes driven by flag bits, ambient sound slots and
//! the draw request each visible prop contributes to the frame.

use asylum_formats::{
    FrameSoundItem, ObjectRecord, ResourceId, SoundItem, OBJECT_GAME_FLAGS, OBJECT_SOUND_ITEMS,
};
use bitflags::bitflags;
use serde::Serialize;

use crate::audio::{panning_at, volume_adjustment, AudioMixer};
use crate::config::VOLUME_SILENT;
use crate::error::{ContentError, ContentResult};
use crate::frame::TickContext;
use crate::graphics::{DrawFlags, DrawQueue, Point, Rect};
use crate::resources::ResourceProvider;
use crate::world::{ActionType, GameFlags, World};

/// Activity value of objects that animate on their own.
pub const ACTIVITY_ANIMATED: i32 = 4;

/// Sounds quieter than this are not worth playing.
const AUDIBLE_THRESHOLD: i32 = -5000;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
    pub struct ObjectFlags: u32 {
        const ENABLED = 0x0000_0001;
        /// Not drawn; sounds come from the centre of the whole resource.
        const OFFSCREEN = 0x0000_0004;
        const ONE_SHOT = 0x0000_0008;
        const RANDOM_START = 0x0000_0010;
        const LOOP = 0x0000_0020;
        const PING_PONG_FORWARD = 0x0000_0200;
        const PING_PONG_BACKWARD = 0x0000_0400;
        const RANDOM_FRAME = 0x0000_0800;
        const MIRRORED = 0x0000_1000;
        const NO_DRAW = 0x0000_4000;
        const REVERSE_ONE_SHOT = 0x0001_0000;
        const REMOVED = 0x0002_0000;
        const DECELERATE = 0x0004_0000;

        /// Every animation mode bit.
        const ANIMATION = Self::ONE_SHOT.bits()
            | Self::RANDOM_START.bits()
            | Self::LOOP.bits()
            | Self::PING_PONG_FORWARD.bits()
            | Self::PING_PONG_BACKWARD.bits()
            | Self::RANDOM_FRAME.bits()
            | Self::REVERSE_ONE_SHOT.bits();
        const PING_PONG = Self::PING_PONG_FORWARD.bits() | Self::PING_PONG_BACKWARD.bits();

        const _ = !0;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Object {
    pub id: i32,
    pub name: String,
    pub resource_id: ResourceId,
    pub x: i32,
    pub y: i32,
    pub bounding_rect: Rect,
    pub frame_index: u32,
    pub frame_count: u32,
    pub flags: ObjectFlags,
    pub activity: i32,
    pub polygon_index: i32,
    pub action_type: ActionType,
    pub game_flags: [i32; OBJECT_GAME_FLAGS],
    pub fps: i32,
    pub tick_count: u64,
    /// Seconds between random-start and random-frame rolls.
    pub random_interval: u32,
    pub random_chance: u32,
    pub priority: i32,
    pub script_index: i32,
    pub sound_items: [SoundItem; OBJECT_SOUND_ITEMS],
    pub frame_sound_items: Vec<FrameSoundItem>,
    /// 1..=3 crossfades against the background, 4 and up pick a table.
    pub transparency: i32,
    pub sound_x: i32,
    pub sound_y: i32,
    /// 1 when the object's animation drives the shared point.
    pub tracks_camera: i32,
    pub random_resource_ids: Vec<ResourceId>,
    pub sound_resource_id: ResourceId,
    pub attenuation: i32,
}

impl Object {
    pub fn new(id: i32, resource_id: ResourceId, frame_count: u32) -> Self {
        Object {
            id,
            name: String::new(),
            resource_id,
            x: 0,
            y: 0,
            bounding_rect: Rect::default(),
            frame_index: 0,
            frame_count,
            flags: ObjectFlags::ENABLED,
            activity: ACTIVITY_ANIMATED,
            polygon_index: -1,
            action_type: ActionType::empty(),
            game_flags: [0; OBJECT_GAME_FLAGS],
            fps: 10,
            tick_count: 0,
            random_interval: 0,
            random_chance: 0,
            priority: 0,
            script_index: -1,
            sound_items: [SoundItem::default(); OBJECT_SOUND_ITEMS],
            frame_sound_items: Vec::new(),
            transparency: 0,
            sound_x: 0,
            sound_y: 0,
            tracks_camera: 0,
            random_resource_ids: Vec::new(),
            sound_resource_id: 0,
            attenuation: 0,
        }
    }

    pub fn from_record(record: &ObjectRecord) -> Self {
        Object {
            id: record.id,
            name: record.name.clone(),
            resource_id: record.resource_id,
            x: record.x,
            y: record.y,
            bounding_rect: record.bounding_rect.into(),
            frame_index: record.frame_index,
            frame_count: record.frame_count,
            flags: ObjectFlags::from_bits_retain(record.flags),
            activity: record.activity,
            polygon_index: record.polygon_index,
            action_type: ActionType::from_record(record.action_type),
            game_flags: record.game_flags,
            fps: record.fps,
            tick_count: record.tick_count as u64,
            random_interval: record.random_interval,
            random_chance: record.random_chance,
            priority: record.priority,
            script_index: record.script_index,
            sound_items: record.sound_items,
            frame_sound_items: record
                .frame_sound_items
                .iter()
                .filter(|item| item.resource_id != 0)
                .copied()
                .collect(),
            transparency: record.transparency,
            sound_x: record.sound_x,
            sound_y: record.sound_y,
            tracks_camera: record.tracks_camera,
            random_resource_ids: record
                .random_resource_ids
                .iter()
                .copied()
                .filter(|id| *id != 0)
                .collect(),
            sound_resource_id: record.sound_resource_id,
            attenuation: record.attenuation,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.flags.contains(ObjectFlags::ENABLED)
    }

    /// Enabled and every game flag condition holds.
    pub fn is_visible(&self, flags: &GameFlags) -> bool {
        self.is_enabled()
            && self
                .game_flags
                .iter()
                .all(|condition| flags.satisfies(*condition))
    }

    pub fn is_on_screen(&self, flags: &GameFlags, view: Rect) -> bool {
        self.is_visible(flags) && self.bounding_rect.translate(self.x, self.y).intersects(&view)
    }

    /// Still playing a one-shot animation in either direction.
    pub fn check_flags(&self) -> bool {
        self.is_enabled()
            && self
                .flags
                .intersects(ObjectFlags::ONE_SHOT | ObjectFlags::REVERSE_ONE_SHOT)
    }

    /// Adds `flags` and rewinds to the frame the new mode starts from.
    pub fn set_next_frame(&mut self, flags: ObjectFlags) {
        self.flags |= flags | ObjectFlags::ENABLED;
        self.frame_index = if self.flags.contains(ObjectFlags::REVERSE_ONE_SHOT) {
            self.frame_count.saturating_sub(1)
        } else {
            0
        };
    }

    pub fn last_frame(&self) -> u32 {
        self.frame_count.saturating_sub(1)
    }

    pub fn disable(&mut self) {
        self.flags.remove(ObjectFlags::ENABLED);
    }

    pub fn disable_and_remove(&mut self, queue: &mut DrawQueue) {
        self.disable();
        self.flags.insert(ObjectFlags::REMOVED);
        queue.remove_resource(self.resource_id);
    }

    pub fn stop_sound(&self, mixer: &mut dyn AudioMixer) {
        if self.sound_resource_id != 0 && mixer.is_playing(self.sound_resource_id) {
            mixer.stop(self.sound_resource_id);
        }
    }

    /// Stops every ambient slot and forgets its sound.
    pub fn stop_all_sounds(&mut self, mixer: &mut dyn AudioMixer) {
        for item in self.sound_items.iter_mut() {
            if item.resource_id != 0 {
                mixer.stop(item.resource_id);
                item.resource_id = 0;
            }
        }
    }

    /// Bounding box of the current frame relative to the object position.
    pub fn frame_rect(&self, resources: &dyn ResourceProvider) -> ContentResult<Rect> {
        frame_rect(resources, self.resource_id, self.frame_index)
    }

    pub fn frame_center(&self, resources: &dyn ResourceProvider) -> ContentResult<Point> {
        let rect = self.frame_rect(resources)?;
        Ok(Point::new(
            self.x + rect.left + rect.width() / 2,
            self.y + rect.top + rect.height() / 2,
        ))
    }

    fn frame_delay(&self) -> Option<u64> {
        (self.fps > 0).then(|| 1000 / self.fps as u64)
    }

    fn frame_due(&self, now: u64) -> bool {
        self.frame_delay()
            .is_some_and(|delay| now.saturating_sub(self.tick_count) >= delay)
    }

    fn random_due(&self, now: u64) -> bool {
        now.saturating_sub(self.tick_count) >= 1000 * self.random_interval as u64
    }

    fn roll(&self, ctx: &mut TickContext<'_>) -> bool {
        ctx.services.random.get_random(self.random_chance as i32) == 1
    }

    /// Advances the animation by one tick and keeps its sounds in step.
    pub fn update(&mut self, ctx: &mut TickContext<'_>, world: &mut World) -> ContentResult<()> {
        if self.frame_count == 0 {
            return Err(ContentError::EmptyObject(self.id));
        }
        if self.activity != ACTIVITY_ANIMATED {
            return Ok(());
        }
        if !self.is_visible(&world.flags) {
            self.silence(ctx.services.mixer.as_mut());
            return Ok(());
        }

        let now = ctx.now;
        let mut changed = false;

        if self.flags.contains(ObjectFlags::LOOP) {
            if self.frame_due(now) {
                self.frame_index = (self.frame_index + 1) % self.frame_count;
                self.tick_count = now;
                changed = true;
            }
        } else if self.flags.contains(ObjectFlags::RANDOM_START) {
            if self.frame_index == 0 && self.random_due(now) {
                if self.roll(ctx) {
                    if !self.random_resource_ids.is_empty() {
                        self.swap_random_resource(ctx)?;
                    }
                    self.frame_index += 1;
                }
                self.tick_count = now;
                changed = true;
            }
            if self.frame_index != 0 && self.frame_due(now) {
                self.frame_index = (self.frame_index + 1) % self.frame_count;
                self.tick_count = now;
                changed = true;
            }
        } else if self.flags.contains(ObjectFlags::RANDOM_FRAME) {
            if self.random_due(now) {
                if self.roll(ctx) {
                    self.frame_index = (self.frame_index + 1) % self.frame_count;
                }
                self.tick_count = now;
                changed = true;
            }
        } else if self.flags.contains(ObjectFlags::ONE_SHOT) {
            if self.frame_due(now) {
                self.frame_index += 1;
                if self.frame_index < self.last_frame() {
                    self.track_frame(ctx, world)?;
                } else {
                    self.flags.remove(ObjectFlags::ONE_SHOT);
                    self.untrack(world);
                }
                self.tick_count = now;
                changed = true;
            }
        } else if !self.flags.intersects(ObjectFlags::PING_PONG) {
            if self.flags.contains(ObjectFlags::REVERSE_ONE_SHOT) && self.frame_due(now) {
                self.frame_index = self.frame_index.saturating_sub(1);
                if self.frame_index == 0 {
                    self.flags.remove(ObjectFlags::REVERSE_ONE_SHOT);
                    self.untrack(world);
                } else {
                    self.track_frame(ctx, world)?;
                }
                self.tick_count = now;
                changed = true;
            }
        } else if self.frame_due(now) {
            if self.flags.contains(ObjectFlags::PING_PONG_FORWARD) {
                if self.frame_index == self.last_frame() {
                    self.frame_index = self.frame_index.saturating_sub(1);
                    self.flags.remove(ObjectFlags::PING_PONG_FORWARD);
                    self.flags.insert(ObjectFlags::PING_PONG_BACKWARD);
                } else {
                    self.frame_index += 1;
                }
            } else if self.frame_index > 0 {
                self.frame_index -= 1;
            } else {
                self.frame_index += 1;
                self.flags.remove(ObjectFlags::PING_PONG_BACKWARD);
                self.flags.insert(ObjectFlags::PING_PONG_FORWARD);
            }
            self.tick_count = now;
            changed = true;
        }

        if self.flags.contains(ObjectFlags::DECELERATE) && self.frame_index == self.last_frame() {
            self.fps = if self.fps <= 15 { (self.fps - 2).max(0) } else { 15 };
            if self.fps == 0 {
                self.flags.remove(ObjectFlags::ANIMATION);
            }
        }

        if changed {
            self.play_sounds(ctx)?;
        }
        Ok(())
    }

    fn swap_random_resource(&mut self, ctx: &mut TickContext<'_>) -> ContentResult<()> {
        let pick = ctx
            .services
            .random
            .get_random(self.random_resource_ids.len() as i32) as usize;
        let Some(&id) = self.random_resource_ids.get(pick) else {
            return Err(ContentError::NoRandomResource(self.id));
        };
        let count = ctx
            .services
            .resources
            .frame_count(id)
            .ok_or(ContentError::MissingGraphic(id))?;
        if count == 0 {
            return Err(ContentError::EmptyObject(self.id));
        }
        self.resource_id = id;
        self.frame_count = count;
        Ok(())
    }

    fn track_frame(&self, ctx: &TickContext<'_>, world: &mut World) -> ContentResult<()> {
        if self.tracks_camera == 1 {
            world.shared_point = self.frame_center(ctx.services.resources.as_ref())?;
        }
        Ok(())
    }

    fn untrack(&self, world: &mut World) {
        if self.tracks_camera == 1 {
            world.shared_point = Point::new(-1, -1);
        }
    }

    /// Hidden objects stop their looping slots for good and their own sound.
    fn silence(&mut self, mixer: &mut dyn AudioMixer) {
        for item in self.sound_items.iter_mut() {
            if item.resource_id != 0 && item.looping != 0 && mixer.is_playing(item.resource_id) {
                mixer.stop(item.resource_id);
                item.resource_id = 0;
                item.looping = 0;
            }
        }
        self.stop_sound(mixer);
    }

    fn sound_point(&self, resources: &dyn ResourceProvider) -> ContentResult<Point> {
        if self.sound_x != 0 || self.sound_y != 0 {
            return Ok(Point::new(self.sound_x, self.sound_y));
        }
        if self.flags.contains(ObjectFlags::OFFSCREEN) {
            let resource = resources
                .graphic(self.resource_id)
                .ok_or(ContentError::MissingGraphic(self.resource_id))?;
            let height = resource
                .frames
                .iter()
                .map(|frame| frame.height as i32)
                .max()
                .unwrap_or(0);
            return Ok(Point::new(
                self.x + resource.max_width / 2,
                self.y + height / 2,
            ));
        }
        let rect = self.frame_rect(resources)?;
        Ok(Point::new(
            self.x + rect.width() / 2,
            self.y + rect.height() / 2,
        ))
    }

    fn is_audible_source(&self) -> bool {
        self.sound_resource_id != 0
            || !self.frame_sound_items.is_empty()
            || self.sound_items.iter().any(|item| item.resource_id != 0)
    }

    fn play_sounds(&mut self, ctx: &mut TickContext<'_>) -> ContentResult<()> {
        if !self.is_audible_source() {
            return Ok(());
        }
        let point = self.sound_point(ctx.services.resources.as_ref())?;
        let pan = panning_at(point.x - ctx.camera.x);
        let sfx = ctx.services.config.sfx_volume;
        let mixer = ctx.services.mixer.as_mut();

        for item in self.sound_items.iter().filter(|item| item.resource_id != 0) {
            let volume = sfx + volume_adjustment(ctx.listener, point, item.attenuation, item.delta);
            if item.looping != 0 && !mixer.is_playing(item.resource_id) && volume > AUDIBLE_THRESHOLD {
                mixer.play_sound(item.resource_id, true, volume, pan);
            }
            if mixer.is_playing(item.resource_id) {
                if volume > AUDIBLE_THRESHOLD {
                    mixer.set_panning(item.resource_id, pan);
                    mixer.set_volume(item.resource_id, volume.min(0));
                } else {
                    mixer.stop(item.resource_id);
                }
            }
        }

        for item in self
            .frame_sound_items
            .iter()
            .filter(|item| item.frame_index == self.frame_index as i32)
        {
            let volume = sfx + volume_adjustment(ctx.listener, point, item.attenuation, item.delta);
            if volume > AUDIBLE_THRESHOLD {
                mixer.play_sound(item.resource_id, false, volume.min(0), pan);
            }
        }

        self.set_volume(ctx)
    }

    /// Keeps the object's own sound at the level its distance calls for.
    fn set_volume(&self, ctx: &mut TickContext<'_>) -> ContentResult<()> {
        let id = self.sound_resource_id;
        if id == 0 || !ctx.services.mixer.is_playing(id) {
            return Ok(());
        }
        let rect = self.frame_rect(ctx.services.resources.as_ref())?;
        let point = Point::new(self.x + rect.width() / 2, self.y + rect.height() / 2);
        let volume = ctx.services.config.voice_volume
            + volume_adjustment(ctx.listener, point, self.attenuation, 0);
        ctx.services.mixer.set_volume(id, volume.max(VOLUME_SILENT));
        Ok(())
    }

    /// Queues the object for this frame, or blends it into the background
    /// for the crossfade transparencies.
    pub fn draw(&self, queue: &mut DrawQueue, world: &World, performance: i32) {
        if self.flags.intersects(ObjectFlags::OFFSCREEN | ObjectFlags::NO_DRAW) {
            return;
        }
        if !self.is_on_screen(&world.flags, world.camera.view()) {
            return;
        }
        let camera = world.camera.position();
        let point = Point::new(self.x, self.y) - camera;

        if self.transparency <= 0 || self.transparency >= 4 || performance <= 1 {
            let flags = if self.flags.contains(ObjectFlags::MIRRORED) {
                DrawFlags::MIRROR_LEFT_RIGHT
            } else {
                DrawFlags::empty()
            };
            queue.add(
                self.resource_id,
                self.frame_index,
                point,
                flags,
                self.transparency - 3,
                self.priority,
            );
        } else {
            queue.add_crossfade(
                self.resource_id,
                self.frame_index,
                point,
                world.background_resource_id,
                camera,
                self.transparency - 1,
                self.priority,
            );
        }
    }
}

pub(crate) fn frame_rect(
    resources: &dyn ResourceProvider,
    id: ResourceId,
    frame_index: u32,
) -> ContentResult<Rect> {
    let frame = resources
        .graphic(id)
        .ok_or(ContentError::MissingGraphic(id))?
        .frame(frame_index as usize)
        .ok_or(ContentError::FrameOutOfRange {
            resource: id,
            frame: frame_index,
        })?;
    Ok(Rect::new(
        frame.x,
        frame.y,
        frame.x + frame.width as i32,
        frame.y + frame.height as i32,
    ))
}
