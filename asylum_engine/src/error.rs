use asylum_formats::ResourceId;
use thiserror::Error;

/// Faults that mean the loaded content does not match what the engine
/// supports. They are fatal unless the engine runs in lenient mode, where
/// the offending script is terminated instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("script {script} line {line}: unknown opcode {opcode:#04x}")]
    UnknownOpcode {
        script: usize,
        line: usize,
        opcode: i32,
    },
    #[error("script {script}: line {line} is outside its {count} commands")]
    LineOutOfRange {
        script: usize,
        line: i64,
        count: usize,
    },
    #[error("no script at index {0}")]
    MissingScript(i32),
    #[error("no actor with index {0}")]
    MissingActor(i32),
    #[error("no object with id {0}")]
    MissingObject(i32),
    #[error("no action area with id {0}")]
    MissingActionArea(i32),
    #[error("object {0} has no frame")]
    EmptyObject(i32),
    #[error("object {0} has no random resource to pick from")]
    NoRandomResource(i32),
    #[error("actor {actor}: graphic slot {slot} is out of range")]
    GraphicSlot { actor: usize, slot: i32 },
    #[error("palette resource {0:#010x} is missing or invalid")]
    InvalidPalette(ResourceId),
    #[error("graphic resource {0:#010x} is missing")]
    MissingGraphic(ResourceId),
    #[error("graphic resource {resource:#010x} has no frame {frame}")]
    FrameOutOfRange { resource: ResourceId, frame: u32 },
    #[error("{opcode}: invalid parameter {name} = {value}")]
    InvalidParameter {
        opcode: &'static str,
        name: &'static str,
        value: i32,
    },
    #[error("script {script} ran {limit} commands without yielding")]
    RunawayScript { script: usize, limit: usize },
}

pub type ContentResult<T> = Result<T, ContentError>;
