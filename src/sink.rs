//! Consumers of engine events.

use crate::messages::EngineEvent;
use crate::midi::MidiError;
use crossbeam::channel::Sender;
use log::{debug, info};
use std::io::Write;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error(transparent)]
    Midi(#[from] MidiError),
    #[error("event receiver has gone away")]
    Disconnected,
    #[error("monitor write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Receives every event the engine emits, in order.
///
/// A failing sink is logged by the event loop and keeps receiving later
/// events; it never stops the engine.
pub trait EventSink: Send {
    fn emit(&mut self, event: &EngineEvent) -> Result<(), SinkError>;
}

impl EventSink for Vec<EngineEvent> {
    fn emit(&mut self, event: &EngineEvent) -> Result<(), SinkError> {
        self.push(event.clone());
        Ok(())
    }
}

/// Forwards events over a channel, e.g. to a UI thread.
pub struct ChannelSink {
    tx: Sender<EngineEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<EngineEvent>) -> Self {
        ChannelSink { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: &EngineEvent) -> Result<(), SinkError> {
        self.tx
            .send(event.clone())
            .map_err(|_| SinkError::Disconnected)
    }
}

/// Human-readable event printer. Ticks are only logged at trace level
/// unless `show_ticks` is set, otherwise the output is unreadable.
pub struct MonitorSink<W: Write + Send> {
    out: W,
    epoch: Option<Instant>,
    show_ticks: bool,
}

impl MonitorSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        MonitorSink::new(std::io::stdout(), false)
    }
}

impl<W: Write + Send> MonitorSink<W> {
    pub fn new(out: W, show_ticks: bool) -> Self {
        MonitorSink {
            out,
            epoch: None,
            show_ticks,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn offset_ms(&self, time: Instant) -> f64 {
        self.epoch
            .map(|epoch| time.saturating_duration_since(epoch).as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }

    fn describe(&self, event: &EngineEvent) -> String {
        match event {
            EngineEvent::Initial | EngineEvent::Started | EngineEvent::Stopped => {
                event.kind().to_string()
            }
            EngineEvent::Tick { time, pulse } => {
                format!("tick pulse={} at {:.3}ms", pulse, self.offset_ms(*time))
            }
            EngineEvent::Step {
                clip_index,
                step_index,
                time,
            } => format!(
                "step clip={} step={} at {:.3}ms",
                clip_index,
                step_index,
                self.offset_ms(*time)
            ),
            EngineEvent::NoteOn {
                channel,
                midi_note,
                velocity,
                time,
            } => format!(
                "note_on ch={} note={} vel={} at {:.3}ms",
                channel,
                midi_note,
                velocity,
                self.offset_ms(*time)
            ),
            EngineEvent::NoteOff {
                channel,
                note,
                time,
            } => format!(
                "note_off ch={} note={} at {:.3}ms",
                channel,
                note,
                self.offset_ms(*time)
            ),
        }
    }
}

impl<W: Write + Send> EventSink for MonitorSink<W> {
    fn emit(&mut self, event: &EngineEvent) -> Result<(), SinkError> {
        // Offsets are measured from the first pulse after each start.
        if let EngineEvent::Started = event {
            self.epoch = None;
            info!("Monitor: transport started");
        }
        if self.epoch.is_none() {
            if let Some(time) = event.time() {
                self.epoch = Some(time);
            }
        }

        let line = self.describe(event);
        if matches!(event, EngineEvent::Tick { .. }) {
            log::trace!("{}", line);
            if !self.show_ticks {
                return Ok(());
            }
        } else {
            debug!("{}", line);
        }

        let wall_clock = chrono::Local::now().format("%H:%M:%S%.3f");
        writeln!(self.out, "[{}] {}", wall_clock, line)?;
        Ok(())
    }
}
