use crate::midi::{MidiError, MidiMessage, MidiPort, Result};
use std::sync::{Arc, Mutex};

/// Port that records what it is sent. Clones share the same log, so a test
/// can keep one clone while another is moved into a sink.
#[derive(Clone, Default)]
pub struct MockMidiPort {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_sends: bool,
}

impl MockMidiPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// A port whose every send fails.
    pub fn failing() -> Self {
        MockMidiPort {
            fail_sends: true,
            ..Self::default()
        }
    }

    /// Raw bytes of every message sent so far.
    pub fn sent_bytes(&self) -> Vec<Vec<u8>> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Every message sent so far, decoded.
    pub fn sent_messages(&self) -> Vec<MidiMessage> {
        self.sent_bytes()
            .iter()
            .filter_map(|bytes| MidiMessage::parse(bytes))
            .collect()
    }
}

impl MidiPort for MockMidiPort {
    fn send(&mut self, msg: MidiMessage) -> Result<()> {
        if self.fail_sends {
            return Err(MidiError::SendError("mock port refuses sends".to_string()));
        }
        self.sent
            .lock()
            .map_err(|_| MidiError::SendError("mock port poisoned".to_string()))?
            .push(msg.to_bytes());
        Ok(())
    }

    fn name(&self) -> &str {
        "Mock Device"
    }
}
