use serde::Serialize;

use crate::graphics::Point;
use crate::services::Services;

/// Work the host has to carry out on behalf of the core once the tick ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameRequest {
    /// Load the scene stored in resource pack `pack`.
    ChangeScene { pack: i32 },
    RunPuzzle { index: i32 },
    PlayVideo { index: i32 },
    ShowOptions,
    Quit,
}

/// Engine-wide switches scoped to the running tick, plus the speech hold
/// that outlives it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FrameContext {
    pub now: u64,
    pub tick: u64,
    /// Set while the interpreter steps; reset at the start of every tick.
    pub script_processing: bool,
    /// Raised by blocking speech opcodes until their line finishes.
    pub script_hold: bool,
    pub mouse: Point,
    pub requests: Vec<FrameRequest>,
}

impl FrameContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_tick(&mut self, now: u64) {
        self.now = now;
        self.tick += 1;
        self.script_processing = false;
        self.requests.clear();
    }

    pub fn is_script_processing(&self) -> bool {
        self.script_processing || self.script_hold
    }

    pub fn request(&mut self, request: FrameRequest) {
        if !self.requests.contains(&request) {
            self.requests.push(request);
        }
    }
}

/// What an actor or object needs from the rest of the engine while it
/// advances by one tick.
pub struct TickContext<'a> {
    pub now: u64,
    pub script_processing: bool,
    pub services: &'a mut Services,
    /// Listener position for the distance volume model, in scene space.
    pub listener: Point,
    pub camera: Point,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_tick_keeps_speech_hold() {
        let mut frame = FrameContext::new();
        frame.script_processing = true;
        frame.script_hold = true;
        frame.request(FrameRequest::Quit);
        frame.request(FrameRequest::Quit);
        assert_eq!(frame.requests.len(), 1);

        frame.begin_tick(120);
        assert_eq!(frame.now, 120);
        assert_eq!(frame.tick, 1);
        assert!(frame.requests.is_empty());
        assert!(!frame.script_processing);
        assert!(frame.is_script_processing());
    }
}
