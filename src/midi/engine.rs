use thiserror::Error;

/// Errors raised while talking to a MIDI port.
#[derive(Debug, Error)]
pub enum MidiError {
    /// The MIDI backend could not be initialised
    #[error("MIDI init error: {0}")]
    InitError(String),
    /// No port name contained the requested device name
    #[error("MIDI output device '{0}' not found")]
    DeviceNotFound(String),
    /// Connecting to a port failed
    #[error("MIDI connection error: {0}")]
    ConnectionError(String),
    /// Writing to a connected port failed
    #[error("MIDI send error: {0}")]
    SendError(String),
}

/// Result type for MIDI operations
pub type Result<T> = std::result::Result<T, MidiError>;

/// Wire-level messages the output side produces.
///
/// Channels here are 0-based, as they appear in the status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
    AllNotesOff { channel: u8 },
    /// Timing clock, one per pulse
    Clock,
    Start,
    Stop,
}

const ALL_NOTES_OFF_CONTROLLER: u8 = 123;

impl MidiMessage {
    pub fn to_bytes(&self) -> Vec<u8> {
        match *self {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => vec![0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiMessage::NoteOff { channel, note } => vec![0x80 | (channel & 0x0F), note & 0x7F, 0],
            MidiMessage::AllNotesOff { channel } => {
                vec![0xB0 | (channel & 0x0F), ALL_NOTES_OFF_CONTROLLER, 0]
            }
            MidiMessage::Clock => vec![0xF8],
            MidiMessage::Start => vec![0xFA],
            MidiMessage::Stop => vec![0xFC],
        }
    }

    /// Inverse of [`MidiMessage::to_bytes`] for the messages this crate
    /// sends; anything else is `None`.
    pub fn parse(data: &[u8]) -> Option<MidiMessage> {
        let status = *data.first()?;
        match status {
            0xF8 => return Some(MidiMessage::Clock),
            0xFA => return Some(MidiMessage::Start),
            0xFC => return Some(MidiMessage::Stop),
            _ => {}
        }

        let channel = status & 0x0F;
        match (status & 0xF0, data.get(1), data.get(2)) {
            (0x90, Some(&note), Some(&velocity)) => Some(MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            }),
            (0x80, Some(&note), Some(_)) => Some(MidiMessage::NoteOff { channel, note }),
            (0xB0, Some(&ALL_NOTES_OFF_CONTROLLER), Some(_)) => {
                Some(MidiMessage::AllNotesOff { channel })
            }
            _ => None,
        }
    }
}

/// A connected MIDI output.
pub trait MidiPort: Send {
    fn send(&mut self, msg: MidiMessage) -> Result<()>;

    fn name(&self) -> &str;
}
