use asylum_formats::{ResourceId, ScriptCommand, ScriptRecord};

use crate::actor::Actor;
use crate::error::{ContentError, ContentResult};
use crate::frame::FrameContext;
use crate::object::Object;
use crate::platform::Platform;
use crate::scene::Scene;
use crate::services::Services;
use crate::world::World;

use super::queue::ScriptQueue;
use super::state::{CommandState, ScriptVars};

/// What the interpreter does once a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Next line, same tick.
    Advance,
    /// Stay on this line and give up the rest of the tick.
    Repeat,
    /// Jump to a Return line and carry on after it.
    Label(i32),
    /// Set the cursor to `line` as is.
    Goto(i32),
    /// The script is finished.
    Done,
    /// Hand control back to the frame loop right away.
    Exit { advance: bool },
}

/// Everything a handler may read or change while its line runs.
pub struct OpContext<'a> {
    pub scene: &'a mut Scene,
    pub services: &'a mut Services,
    pub frame: &'a mut FrameContext,
    pub platform: &'a mut dyn Platform,
    pub state: &'a mut CommandState,
    pub vars: &'a mut ScriptVars,
    pub queue: &'a mut ScriptQueue,
    pub script: &'a ScriptRecord,
    pub script_index: usize,
    pub line: usize,
    /// Actor the running script was queued for.
    pub actor_index: i32,
}

impl OpContext<'_> {
    pub fn world(&mut self) -> &mut World {
        &mut self.scene.world
    }

    pub fn actor_mut(&mut self, index: i32) -> ContentResult<&mut Actor> {
        self.scene.actor_mut(index)
    }

    pub fn object_mut(&mut self, id: i32) -> ContentResult<&mut Object> {
        self.scene.object_mut(id)
    }

    /// `index` when non-zero, else the actor the script was queued for.
    pub fn actor_or_queued(&self, index: i32) -> i32 {
        if index != 0 {
            index
        } else {
            self.actor_index
        }
    }

    pub fn is_playing(&self, id: ResourceId) -> bool {
        self.services.mixer.is_playing(id)
    }

    pub fn record(&mut self, event: impl Into<String>) {
        self.scene.record(event);
    }
}

/// Rejects `value` unless `valid` holds.
pub fn check_param(
    opcode: &'static str,
    name: &'static str,
    value: i32,
    valid: bool,
) -> ContentResult<i32> {
    if valid {
        Ok(value)
    } else {
        Err(ContentError::InvalidParameter {
            opcode,
            name,
            value,
        })
    }
}

/// One-line rendering of a command for logs.
pub fn describe(command: &ScriptCommand) -> String {
    let params: Vec<String> = command.params.iter().map(i32::to_string).collect();
    format!("{:#04x}({})", command.opcode, params.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_lists_every_parameter() {
        let command = ScriptCommand::new(0x36, &[12, -1]);
        assert_eq!(describe(&command), "0x36(12, -1, 0, 0, 0, 0, 0, 0, 0)");
    }

    #[test]
    fn check_param_names_the_offender() {
        assert_eq!(check_param("Op", "param1", 3, true), Ok(3));
        assert_eq!(
            check_param("Op", "param1", -3, false),
            Err(ContentError::InvalidParameter {
                opcode: "Op",
                name: "param1",
                value: -3
            })
        );
    }
}
