pub mod input;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// List available MIDI output devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Settings file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Tempo in beats per minute
    #[arg(short, long)]
    pub bpm: Option<f64>,

    /// Pulses per quarter note
    #[arg(short, long)]
    pub ppq: Option<u32>,

    /// Send to the first MIDI output whose name contains this text
    #[arg(long, value_name = "DEVICE")]
    pub midi_output: Option<String>,

    /// Do not send All Notes Off after stopping
    #[arg(long)]
    pub no_panic: bool,

    /// Print engine events to stdout
    #[arg(short, long)]
    pub monitor: bool,

    /// Stop and exit after this many seconds instead of reading commands from stdin
    #[arg(short, long, value_name = "SECS")]
    pub duration: Option<f64>,

    /// Log level for the log file (off, error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn validate_device(device_name: &str, devices: &[String]) -> Result<(), String> {
    if !devices.iter().any(|d| d.contains(device_name)) {
        let mut error_msg = format!(
            "Error: Device '{}' not found in available devices:\n",
            device_name
        );
        for device in devices {
            error_msg.push_str(&format!("  - {}\n", device));
        }
        return Err(error_msg);
    }
    Ok(())
}
