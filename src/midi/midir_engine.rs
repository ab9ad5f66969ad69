use crate::midi::{MidiError, MidiMessage, MidiPort, Result};
use log::{debug, info};
use midir::{MidiOutput, MidiOutputConnection};

const CLIENT_NAME: &str = "pulsestep-output";

/// Output port backed by `midir`.
pub struct MidirPort {
    connection: MidiOutputConnection,
    port_name: String,
}

impl MidirPort {
    /// Connects to the first output port whose name contains `device_name`.
    pub fn connect(device_name: &str) -> Result<Self> {
        let midi_out =
            MidiOutput::new(CLIENT_NAME).map_err(|e| MidiError::InitError(e.to_string()))?;

        let out_ports = midi_out.ports();
        let port = out_ports
            .iter()
            .find(|p| {
                midi_out
                    .port_name(p)
                    .unwrap_or_default()
                    .contains(device_name)
            })
            .ok_or_else(|| MidiError::DeviceNotFound(device_name.to_string()))?;

        let port_name = midi_out
            .port_name(port)
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;
        info!("Connecting to MIDI output port: {}", port_name);

        let connection = midi_out
            .connect(port, "pulsestep-output-conn")
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;

        Ok(MidirPort {
            connection,
            port_name,
        })
    }

    /// Names of every MIDI output port currently visible.
    pub fn list_available_ports() -> Result<Vec<String>> {
        let midi_out = MidiOutput::new("pulsestep-port-lister")
            .map_err(|e| MidiError::InitError(e.to_string()))?;
        let ports = midi_out.ports();
        Ok(ports
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect())
    }
}

impl MidiPort for MidirPort {
    fn send(&mut self, msg: MidiMessage) -> Result<()> {
        let bytes = msg.to_bytes();
        if !matches!(msg, MidiMessage::Clock) {
            debug!("Sending {:?} as {:02X?}", msg, bytes);
        }
        self.connection
            .send(&bytes)
            .map_err(|e| MidiError::SendError(e.to_string()))
    }

    fn name(&self) -> &str {
        &self.port_name
    }
}
