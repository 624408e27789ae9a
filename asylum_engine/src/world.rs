//! Scene-wide state shared by scripts, actors and objects: game flags, the
//! camera, action areas and the cutscene matte.

use std::collections::BTreeSet;

use asylum_formats::ResourceId;
use bitflags::bitflags;
use serde::Serialize;

use crate::audio::MUSIC_STOPPED;
use crate::error::{ContentError, ContentResult};
use crate::graphics::{Point, Rect, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Game flag raised by speech opcodes while a non-blocking line plays.
pub const SPEECH_GAME_FLAG: i32 = 219;

/// Camera is scrolling and a script waits for it to arrive.
pub const MOTION_SCROLL_WAIT: i32 = 2;
/// Camera is at rest.
pub const MOTION_STILL: i32 = 3;
/// Camera is scrolling and nobody waits for it.
pub const MOTION_SCROLL: i32 = 5;

/// Bar height at which a movie matte is fully closed.
pub const MATTE_BAR_MAX: i32 = 170;
const MATTE_STEP: i32 = 4;

bitflags! {
    /// Engine-wide switches that persist across ticks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
    pub struct EngineFlags: u32 {
        const TYPE1 = 1 << 0;
        const TYPE2 = 1 << 1;
        const SCENE_RECT_CHANGED = 1 << 2;
    }
}

bitflags! {
    /// Interaction kinds an object, actor or action area currently offers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
    pub struct ActionType: u32 {
        const FIND = 0x01;
        const TALK = 0x02;
        const GRAB = 0x04;
        const TYPE8 = 0x08;
        const TYPE16 = 0x10;

        const _ = !0;
    }
}

impl ActionType {
    pub fn from_record(value: i32) -> Self {
        ActionType::from_bits_retain(value as u32)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameFlags {
    set: BTreeSet<i32>,
}

impl GameFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, flag: i32) {
        self.set.insert(flag);
    }

    pub fn clear(&mut self, flag: i32) {
        self.set.remove(&flag);
    }

    pub fn toggle(&mut self, flag: i32) {
        if !self.set.remove(&flag) {
            self.set.insert(flag);
        }
    }

    pub fn is_set(&self, flag: i32) -> bool {
        self.set.contains(&flag)
    }

    /// Object visibility condition: a positive flag must be set, zero or a
    /// negative flag names one that must be clear.
    pub fn satisfies(&self, condition: i32) -> bool {
        if condition <= 0 {
            !self.is_set(-condition)
        } else {
            self.is_set(condition)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.set.iter().copied()
    }
}

/// Interactive region of the scene and the script it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionArea {
    pub id: i32,
    pub script_index: i32,
    /// Bounding rectangle of the area's polygon.
    pub polygon: Rect,
    pub action_type: ActionType,
    pub flags: i32,
    pub palette_resource_id: ResourceId,
}

impl ActionArea {
    pub fn new(id: i32, script_index: i32, polygon: Rect) -> Self {
        ActionArea {
            id,
            script_index,
            polygon,
            action_type: ActionType::empty(),
            flags: 0,
            palette_resource_id: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AmbientSound {
    pub resource_id: ResourceId,
    pub delta: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Camera {
    pub x_left: i32,
    pub y_top: i32,
    pub motion_status: i32,
    target: Option<Point>,
    speed: i32,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            x_left: 0,
            y_top: 0,
            motion_status: MOTION_STILL,
            target: None,
            speed: 0,
        }
    }
}

impl Camera {
    pub fn position(&self) -> Point {
        Point::new(self.x_left, self.y_top)
    }

    pub fn view(&self) -> Rect {
        Rect::new(
            self.x_left,
            self.y_top,
            self.x_left + SCREEN_WIDTH,
            self.y_top + SCREEN_HEIGHT,
        )
    }

    pub fn target(&self) -> Option<Point> {
        self.target
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.x_left = x;
        self.y_top = y;
        self.target = None;
    }

    /// Starts scrolling towards `target` at `speed` pixels per tick. Returns
    /// true when the camera is already there.
    pub fn scroll_to(&mut self, target: Point, speed: i32) -> bool {
        if self.position() == target {
            self.target = None;
            return true;
        }
        self.target = Some(target);
        self.speed = speed.max(1);
        false
    }

    pub fn cancel_scroll(&mut self) {
        self.target = None;
    }

    /// Moves one tick towards the scroll target. Arriving puts the camera at
    /// rest.
    pub fn step(&mut self) {
        let Some(target) = self.target else {
            return;
        };
        self.x_left += (target.x - self.x_left).clamp(-self.speed, self.speed);
        self.y_top += (target.y - self.y_top).clamp(-self.speed, self.speed);
        if self.position() == target {
            self.target = None;
            if matches!(self.motion_status, MOTION_SCROLL_WAIT | MOTION_SCROLL) {
                self.motion_status = MOTION_STILL;
            }
        }
    }
}

/// Letterbox bars closing in before a movie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Matte {
    pub bar_height: i32,
    /// Non-zero while the bars lead into a movie.
    pub var1: i32,
    pub var2: i32,
    pub play_sound: bool,
    pub initialized: bool,
    pub pending_video: Option<i32>,
}

impl Matte {
    pub fn is_active(&self) -> bool {
        self.bar_height > 0
    }

    /// Grows the bars; returns the video to start once they close.
    pub fn advance(&mut self) -> Option<i32> {
        if self.bar_height <= 0 || self.bar_height >= MATTE_BAR_MAX {
            return None;
        }
        self.bar_height = (self.bar_height + MATTE_STEP).min(MATTE_BAR_MAX);
        if self.bar_height == MATTE_BAR_MAX && self.var1 != 0 {
            return self.pending_video.take();
        }
        None
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct World {
    pub chapter: i32,
    pub flags: GameFlags,
    pub engine_flags: EngineFlags,
    pub camera: Camera,
    pub matte: Matte,
    pub background_resource_id: ResourceId,
    pub current_palette_id: ResourceId,
    /// Scene graphics addressable by index from scripts.
    pub graphic_resource_ids: Vec<ResourceId>,
    pub action_areas: Vec<ActionArea>,
    pub ambient_sounds: Vec<AmbientSound>,
    pub scene_rects: Vec<Rect>,
    pub scene_rect_index: usize,
    /// Regions actors may walk in; empty means unrestricted.
    pub walkable: Vec<Rect>,
    pub player_actor_index: usize,
    pub pending_player_change: Option<usize>,
    /// Point of interest shared between animations and the audio listener;
    /// (-1, -1) when unset.
    pub shared_point: Point,
    pub music_resource_index: i32,
    pub cursor_visible: bool,
    pub skip_draw_scene: bool,
    /// Height of the widescreen bars drawn this frame; zero hides them.
    pub wide_screen_bar: i32,
}

impl Default for World {
    fn default() -> Self {
        World {
            chapter: 1,
            flags: GameFlags::new(),
            engine_flags: EngineFlags::empty(),
            camera: Camera::default(),
            matte: Matte::default(),
            background_resource_id: 0,
            current_palette_id: 0,
            graphic_resource_ids: Vec::new(),
            action_areas: Vec::new(),
            ambient_sounds: Vec::new(),
            scene_rects: Vec::new(),
            scene_rect_index: 0,
            walkable: Vec::new(),
            player_actor_index: 0,
            pending_player_change: None,
            shared_point: Point::new(-1, -1),
            music_resource_index: MUSIC_STOPPED,
            cursor_visible: true,
            skip_draw_scene: false,
            wide_screen_bar: 0,
        }
    }
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action_area(&self, id: i32) -> ContentResult<&ActionArea> {
        self.action_areas
            .iter()
            .find(|area| area.id == id)
            .ok_or(ContentError::MissingActionArea(id))
    }

    pub fn action_area_mut(&mut self, id: i32) -> ContentResult<&mut ActionArea> {
        self.action_areas
            .iter_mut()
            .find(|area| area.id == id)
            .ok_or(ContentError::MissingActionArea(id))
    }

    pub fn is_walkable(&self, point: Point) -> bool {
        self.walkable.is_empty() || self.walkable.iter().any(|rect| rect.contains(point))
    }

    pub fn shared_point_is_set(&self) -> bool {
        self.shared_point != Point::new(-1, -1)
    }
}
