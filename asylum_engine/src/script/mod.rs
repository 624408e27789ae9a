//! The action-list virtual machine: a catalog of opcodes, per-line command
//! state and an interpreter that resumes scripts across frames.

pub mod command;
pub mod interpreter;
pub mod opcode;
pub mod ops;
pub mod queue;
pub mod state;

pub use command::{Control, OpContext};
pub use interpreter::{Interpreter, StepOutcome};
pub use opcode::{Opcode, OPCODES, OPCODE_COUNT};
pub use queue::{ScriptQueue, ScriptQueueEntry};
pub use state::{CommandState, Phase, ScriptVars, StateTable};
