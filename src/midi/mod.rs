//! MIDI output plumbing
//!
//! - [`MidiMessage`] and its wire encoding
//! - [`MidiPort`] trait for anything that accepts MIDI bytes
//! - [`MidirPort`] for real devices via midir
//! - [`MockMidiPort`] for tests
//!
mod engine;
pub mod midir_engine;
pub mod mock_engine;

pub use engine::{MidiError, MidiMessage, MidiPort, Result};

pub use midir_engine::MidirPort;
pub use mock_engine::MockMidiPort;
