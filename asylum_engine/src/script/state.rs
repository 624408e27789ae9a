//! Execution state of commands that span several ticks, kept apart from the
//! declared parameters. Registers outlive a finished run; a script that
//! faults is wiped so its next run starts from the declared parameters.

use std::collections::HashMap;

use asylum_formats::{ResourceId, ScriptRecord};
use serde::Serialize;

use crate::graphics::Point;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    NotStarted,
    /// Started and polling for its completion condition.
    Waiting,
    /// Finished at least once; the next run starts over.
    Completed,
}

/// Scratch registers of one script line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommandState {
    pub phase: Phase,
    pub counter: i32,
    pub value: i32,
    pub handle: ResourceId,
    pub latch: bool,
    pub point: Point,
    seeded: bool,
}

impl CommandState {
    /// Runs `init` the first time the line executes. Later runs keep the
    /// registers the line left behind.
    pub fn seed_with(&mut self, init: impl FnOnce(&mut CommandState)) {
        if !self.seeded {
            init(self);
            self.seeded = true;
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.phase == Phase::Waiting
    }

    pub fn wait(&mut self) {
        self.phase = Phase::Waiting;
    }

    pub fn complete(&mut self) {
        self.phase = Phase::Completed;
    }
}

/// Keyed by `(script index, line)`.
#[derive(Debug, Clone, Default)]
pub struct StateTable {
    lines: HashMap<(usize, usize), CommandState>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line_mut(&mut self, script: usize, line: usize) -> &mut CommandState {
        self.lines.entry((script, line)).or_default()
    }

    pub fn line(&self, script: usize, line: usize) -> Option<&CommandState> {
        self.lines.get(&(script, line))
    }

    /// Forgets every line of `script`.
    pub fn reset_script(&mut self, script: usize) {
        self.lines.retain(|(index, _), _| *index != script);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Per-script registers that persist across runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScriptVars {
    pub value: i32,
    pub counter: i32,
}

impl ScriptVars {
    pub fn from_record(record: &ScriptRecord) -> Self {
        ScriptVars {
            value: record.value,
            counter: record.counter,
        }
    }
}
