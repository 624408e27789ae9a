//! Collaborators the core drives but does not own, bundled so opcodes and
//! entity updates can reach them through one handle.

use std::{cell::RefCell, rc::Rc};

use asylum_formats::ResourceId;
use serde::Serialize;

use crate::audio::{AudioMixer, RecordingMixer, Speech};
use crate::config::EngineConfig;
use crate::random::GameRandom;
use crate::resources::{ResourceProvider, SpeechRequest};

/// Dialogue puzzle sub-interpreter.
pub trait EncounterRunner {
    fn run(&mut self, index: i32, object_id1: i32, object_id2: i32, actor_index: i32);
    fn is_running(&self) -> bool;
    fn set_flag5(&mut self, value: i32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EncounterRun {
    pub index: i32,
    pub object_id1: i32,
    pub object_id2: i32,
    pub actor_index: i32,
}

#[derive(Debug, Default)]
struct EncounterState {
    runs: Vec<EncounterRun>,
    running: bool,
    flag5: i32,
}

/// Encounter runner that remembers every launch and stays "running" until
/// `finish` is called.
#[derive(Clone, Default)]
pub struct RecordingEncounters {
    state: Rc<RefCell<EncounterState>>,
}

impl RecordingEncounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> Vec<EncounterRun> {
        self.state.borrow().runs.clone()
    }

    pub fn flag5(&self) -> i32 {
        self.state.borrow().flag5
    }

    pub fn finish(&self) {
        self.state.borrow_mut().running = false;
    }
}

impl EncounterRunner for RecordingEncounters {
    fn run(&mut self, index: i32, object_id1: i32, object_id2: i32, actor_index: i32) {
        let mut state = self.state.borrow_mut();
        state.runs.push(EncounterRun {
            index,
            object_id1,
            object_id2,
            actor_index,
        });
        state.running = true;
    }

    fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    fn set_flag5(&mut self, value: i32) {
        self.state.borrow_mut().flag5 = value;
    }
}

pub struct Services {
    pub mixer: Box<dyn AudioMixer>,
    pub resources: Box<dyn ResourceProvider>,
    pub encounters: Box<dyn EncounterRunner>,
    pub random: GameRandom,
    pub config: EngineConfig,
    pub speech: Speech,
}

impl Services {
    /// Services backed by a recording mixer and encounter runner.
    pub fn new(config: EngineConfig, resources: Box<dyn ResourceProvider>) -> Self {
        Services {
            mixer: Box::new(RecordingMixer::new()),
            resources,
            encounters: Box::new(RecordingEncounters::new()),
            random: GameRandom::new(config.random_seed),
            config,
            speech: Speech::default(),
        }
    }

    pub fn with_mixer(mut self, mixer: Box<dyn AudioMixer>) -> Self {
        self.mixer = mixer;
        self
    }

    pub fn with_encounters(mut self, encounters: Box<dyn EncounterRunner>) -> Self {
        self.encounters = encounters;
        self
    }

    /// Plays a speech line at voice volume. Unknown lines are skipped.
    pub fn play_speech(&mut self, request: SpeechRequest) -> Option<ResourceId> {
        let Some(line) = self.resources.speech(request) else {
            log::warn!("no speech line for {request:?}");
            return None;
        };
        Some(self.speech.play(self.mixer.as_mut(), line, self.config.voice_volume))
    }

    pub fn speech_is_playing(&self) -> bool {
        self.speech.is_playing(self.mixer.as_ref())
    }
}
