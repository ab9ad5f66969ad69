use crate::messages::EngineEvent;
use crate::midi::{MidiMessage, MidiPort};
use crate::sink::{EventSink, SinkError};
use log::{debug, info};
use std::collections::BTreeSet;

/// Turns engine events into wire messages on a MIDI port.
///
/// Engine channels are 1-based and become `channel - 1` in the status byte.
/// The engine drops sounding notes on stop without releasing them, so with
/// `panic_on_stop` this sink follows every Stop with All Notes Off on each
/// channel it has played on since the last start.
pub struct MidiOutputSink<P: MidiPort> {
    port: P,
    panic_on_stop: bool,
    used_channels: BTreeSet<u8>,
}

impl<P: MidiPort> MidiOutputSink<P> {
    pub fn new(port: P, panic_on_stop: bool) -> Self {
        info!(
            "MIDI output on '{}' (all-notes-off on stop: {})",
            port.name(),
            panic_on_stop
        );
        MidiOutputSink {
            port,
            panic_on_stop,
            used_channels: BTreeSet::new(),
        }
    }

    fn status_channel(channel: u8) -> u8 {
        channel.saturating_sub(1) & 0x0F
    }

    fn silence_used_channels(&mut self) -> Result<(), SinkError> {
        for channel in std::mem::take(&mut self.used_channels) {
            debug!("All notes off on channel {}", channel + 1);
            self.port.send(MidiMessage::AllNotesOff { channel })?;
        }
        Ok(())
    }
}

impl<P: MidiPort> EventSink for MidiOutputSink<P> {
    fn emit(&mut self, event: &EngineEvent) -> Result<(), SinkError> {
        match *event {
            EngineEvent::Initial | EngineEvent::Step { .. } => {}
            EngineEvent::Started => {
                self.used_channels.clear();
                self.port.send(MidiMessage::Start)?;
            }
            EngineEvent::Stopped => {
                self.port.send(MidiMessage::Stop)?;
                if self.panic_on_stop {
                    self.silence_used_channels()?;
                }
            }
            EngineEvent::Tick { .. } => self.port.send(MidiMessage::Clock)?,
            EngineEvent::NoteOn {
                channel,
                midi_note,
                velocity,
                ..
            } => {
                let channel = Self::status_channel(channel);
                self.used_channels.insert(channel);
                self.port.send(MidiMessage::NoteOn {
                    channel,
                    note: midi_note,
                    velocity,
                })?;
            }
            EngineEvent::NoteOff { channel, note, .. } => {
                self.port.send(MidiMessage::NoteOff {
                    channel: Self::status_channel(channel),
                    note,
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::MockMidiPort;
    use std::time::Instant;

    #[test]
    fn test_channel_is_shifted_into_status_byte() {
        let port = MockMidiPort::new();
        let mut sink = MidiOutputSink::new(port.clone(), false);
        let time = Instant::now();
        sink.emit(&EngineEvent::NoteOn {
            channel: 10,
            midi_note: 36,
            velocity: 100,
            time,
        })
        .unwrap();
        sink.emit(&EngineEvent::NoteOff {
            channel: 10,
            note: 36,
            time,
        })
        .unwrap();

        assert_eq!(port.sent_bytes(), vec![vec![0x99, 36, 100], vec![0x89, 36, 0]]);
    }

    #[test]
    fn test_step_and_initial_are_not_sent() {
        let port = MockMidiPort::new();
        let mut sink = MidiOutputSink::new(port.clone(), true);
        sink.emit(&EngineEvent::Initial).unwrap();
        sink.emit(&EngineEvent::Step {
            clip_index: 0,
            step_index: 3,
            time: Instant::now(),
        })
        .unwrap();
        assert!(port.sent_bytes().is_empty());
    }

    #[test]
    fn test_send_failure_is_reported() {
        let mut sink = MidiOutputSink::new(MockMidiPort::failing(), false);
        assert!(matches!(
            sink.emit(&EngineEvent::Started),
            Err(SinkError::Midi(_))
        ));
    }
}
