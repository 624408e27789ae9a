//! Core of the Asylum adventure engine: the action-list script machine, the
//! actor and object state machines, the draw queue with its compositor, the
//! palette engine and the frame loop that ties them together.

pub mod actor;
pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod frame;
pub mod frame_loop;
pub mod graphics;
pub mod object;
pub mod platform;
pub mod random;
pub mod resources;
pub mod runtime;
pub mod scene;
pub mod script;
pub mod services;
pub mod world;

pub use config::EngineConfig;
pub use error::{ContentError, ContentResult};
pub use frame::{FrameContext, FrameRequest};
pub use frame_loop::{Engine, TickReport};
pub use scene::Scene;
pub use services::Services;
