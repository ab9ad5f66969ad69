pub mod cli;
pub mod clock;
pub mod config;
pub mod control;
pub mod event_loop;
pub mod logging;
pub mod messages;
pub mod midi;
pub mod midi_output;
pub mod notes;
pub mod pattern;
pub mod scheduler;
pub mod sink;
pub mod state;

pub use control::{ControlError, Controller};
pub use event_loop::{EngineHandle, EventLoop};
pub use messages::{EngineCommand, EngineEvent};
pub use pattern::{Clip, Lane, Pattern, Step};
pub use scheduler::Sequencer;
pub use sink::{EventSink, SinkError};
