//! Messages exchanged with the engine thread.
//!
//! Commands flow in from the control surface, events flow out to the sinks.
//! Both directions are closed enums so every consumer matches exhaustively.

use crate::pattern::Pattern;
use std::time::Instant;

/// Inbound control messages. Values are assumed valid; see
/// [`crate::control::Controller`] for the checked way of sending them.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    SetBpm(f64),
    SetPpq(u32),
    SetPattern(Pattern),
    Start,
    Stop,
}

/// Outbound timing and note events, in generation order.
///
/// `time` fields are the drift-corrected pulse times, not the moment the
/// engine woke up. Treat them as scheduling guidance.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Engine thread is up; nothing has happened yet.
    Initial,
    Started,
    /// Transport stopped. Notes that were sounding are dropped without a
    /// note-off; sinks that drive hardware should silence them.
    Stopped,
    Tick {
        time: Instant,
        pulse: u64,
    },
    Step {
        clip_index: usize,
        step_index: usize,
        time: Instant,
    },
    NoteOn {
        channel: u8,
        midi_note: u8,
        velocity: u8,
        time: Instant,
    },
    NoteOff {
        channel: u8,
        note: u8,
        time: Instant,
    },
}

impl EngineEvent {
    /// Short lowercase name used in logs and the monitor output.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineEvent::Initial => "initial",
            EngineEvent::Started => "started",
            EngineEvent::Stopped => "stopped",
            EngineEvent::Tick { .. } => "tick",
            EngineEvent::Step { .. } => "step",
            EngineEvent::NoteOn { .. } => "note_on",
            EngineEvent::NoteOff { .. } => "note_off",
        }
    }

    pub fn time(&self) -> Option<Instant> {
        match self {
            EngineEvent::Tick { time, .. }
            | EngineEvent::Step { time, .. }
            | EngineEvent::NoteOn { time, .. }
            | EngineEvent::NoteOff { time, .. } => Some(*time),
            EngineEvent::Initial | EngineEvent::Started | EngineEvent::Stopped => None,
        }
    }
}
