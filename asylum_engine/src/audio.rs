//! Audio boundary plus the listener model used to turn positions into
//! volumes and pans. Volumes are hundredths of a decibel (0 loudest,
//! -10000 silent); pans run from -10000 (left) to 10000 (right).

use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use asylum_formats::ResourceId;
use serde::Serialize;

use crate::config::VOLUME_SILENT;
use crate::graphics::{Point, SCREEN_WIDTH};
use crate::resources::SpeechLine;

pub const PAN_LEFT: i32 = -10000;
pub const PAN_RIGHT: i32 = 10000;

/// Music id meaning "no track".
pub const MUSIC_STOPPED: ResourceId = -666;

pub trait AudioMixer {
    fn is_playing(&self, id: ResourceId) -> bool;
    fn play_sound(&mut self, id: ResourceId, looping: bool, volume: i32, pan: i32);
    fn stop(&mut self, id: ResourceId);
    fn stop_all(&mut self);
    fn set_volume(&mut self, id: ResourceId, volume: i32);
    fn set_panning(&mut self, id: ResourceId, pan: i32);
    fn change_music(&mut self, id: ResourceId, volume: i32);
    fn stop_music(&mut self);

    /// Lets virtual playback progress; hosts with a real mixer ignore it.
    fn advance(&mut self, _elapsed_ms: u64) {}
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AudioEvent {
    SoundPlay {
        id: ResourceId,
        looping: bool,
        volume: i32,
        pan: i32,
    },
    SoundStop {
        id: ResourceId,
    },
    StopAll,
    SetVolume {
        id: ResourceId,
        volume: i32,
    },
    SetPanning {
        id: ResourceId,
        pan: i32,
    },
    MusicPlay {
        id: ResourceId,
        volume: i32,
    },
    MusicStop,
}

#[derive(Debug, Default)]
struct MixerState {
    events: Vec<AudioEvent>,
    /// Playing sounds and the virtual time left; looping sounds have none.
    playing: BTreeMap<ResourceId, Option<u64>>,
    music: Option<ResourceId>,
}

/// Mixer that records every call. One-shot sounds play for a fixed virtual
/// duration; looping sounds play until stopped.
#[derive(Clone, Default)]
pub struct RecordingMixer {
    state: Rc<RefCell<MixerState>>,
    one_shot_ms: u64,
}

impl RecordingMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_one_shot_duration(ms: u64) -> Self {
        RecordingMixer {
            state: Rc::default(),
            one_shot_ms: ms,
        }
    }

    pub fn events(&self) -> Vec<AudioEvent> {
        self.state.borrow().events.clone()
    }

    pub fn music(&self) -> Option<ResourceId> {
        self.state.borrow().music
    }

    /// Marks a sound as finished, as the host mixer would once it drains.
    pub fn finish(&self, id: ResourceId) {
        self.state.borrow_mut().playing.remove(&id);
    }
}

impl AudioMixer for RecordingMixer {
    fn is_playing(&self, id: ResourceId) -> bool {
        self.state.borrow().playing.contains_key(&id)
    }

    fn play_sound(&mut self, id: ResourceId, looping: bool, volume: i32, pan: i32) {
        let mut state = self.state.borrow_mut();
        state.events.push(AudioEvent::SoundPlay {
            id,
            looping,
            volume,
            pan,
        });
        let remaining = if looping { None } else { Some(self.one_shot_ms) };
        state.playing.insert(id, remaining);
    }

    fn stop(&mut self, id: ResourceId) {
        let mut state = self.state.borrow_mut();
        state.events.push(AudioEvent::SoundStop { id });
        state.playing.remove(&id);
    }

    fn stop_all(&mut self) {
        let mut state = self.state.borrow_mut();
        state.events.push(AudioEvent::StopAll);
        state.playing.clear();
    }

    fn set_volume(&mut self, id: ResourceId, volume: i32) {
        self.state
            .borrow_mut()
            .events
            .push(AudioEvent::SetVolume { id, volume });
    }

    fn set_panning(&mut self, id: ResourceId, pan: i32) {
        self.state
            .borrow_mut()
            .events
            .push(AudioEvent::SetPanning { id, pan });
    }

    fn change_music(&mut self, id: ResourceId, volume: i32) {
        let mut state = self.state.borrow_mut();
        state.events.push(AudioEvent::MusicPlay { id, volume });
        state.music = Some(id);
    }

    fn stop_music(&mut self) {
        let mut state = self.state.borrow_mut();
        state.events.push(AudioEvent::MusicStop);
        state.music = None;
    }

    fn advance(&mut self, elapsed_ms: u64) {
        self.state.borrow_mut().playing.retain(|_, remaining| match remaining {
            None => true,
            Some(left) => {
                *left = left.saturating_sub(elapsed_ms);
                *left > 0
            }
        });
    }
}

pub fn isqrt(value: i32) -> i32 {
    if value <= 0 {
        return 0;
    }
    let mut root = (value as f64).sqrt() as i32;
    while root * root > value {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= value {
        root += 1;
    }
    root
}

/// Attenuation of a sound at `point` heard from `listener`, to be added to
/// the configured base volume.
pub fn volume_adjustment(listener: Point, point: Point, attenuation: i32, delta: i32) -> i32 {
    if attenuation == 0 {
        return -(delta * delta);
    }
    let dx = (point.x - listener.x) as i64;
    let dy = (point.y - listener.y) as i64;
    let distance = (dx * dx + dy * dy).min(i32::MAX as i64) as i32;
    let value = (isqrt(distance) as i64 * attenuation as i64 / 100 + delta as i64)
        .clamp(-(1 << 20), 1 << 20);
    (-(value * value)).max(VOLUME_SILENT as i64) as i32
}

/// Pan for a screen-space x coordinate.
pub fn panning_at(x: i32) -> i32 {
    if x < 0 {
        PAN_LEFT
    } else if x >= SCREEN_WIDTH {
        PAN_RIGHT
    } else {
        (x - SCREEN_WIDTH / 2) * PAN_RIGHT / (SCREEN_WIDTH / 2)
    }
}

/// The speech line currently playing, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Speech {
    pub sound: Option<ResourceId>,
    pub text: Option<ResourceId>,
}

impl Speech {
    pub fn play(&mut self, mixer: &mut dyn AudioMixer, line: SpeechLine, volume: i32) -> ResourceId {
        if let Some(previous) = self.sound {
            if mixer.is_playing(previous) {
                mixer.stop(previous);
            }
        }
        mixer.play_sound(line.sound, false, volume, 0);
        self.sound = Some(line.sound);
        self.text = Some(line.text);
        line.sound
    }

    pub fn is_playing(&self, mixer: &dyn AudioMixer) -> bool {
        self.sound.is_some_and(|id| mixer.is_playing(id))
    }

    pub fn reset(&mut self) {
        *self = Speech::default();
    }
}
