// config.rs

use crate::cli::Args;
use crate::clock::{DEFAULT_BPM, DEFAULT_PPQ};
use crate::control::{validate_bpm, validate_ppq, ControlError};
use log::{debug, info, LevelFilter};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub const ENV_PREFIX: &str = "PULSESTEP";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not load settings: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error(transparent)]
    Invalid(#[from] ControlError),
    #[error("unknown log level '{0}'")]
    LogLevel(String),
}

/// Runtime settings, layered from defaults, an optional TOML file,
/// `PULSESTEP_*` environment variables and finally the command line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub bpm: f64,
    pub ppq: u32,
    /// Substring of the MIDI output port to connect to.
    #[serde(default)]
    pub midi_output: Option<String>,
    /// Send All Notes Off on every used channel after Stop.
    pub panic_on_stop: bool,
    pub log_level: String,
    /// Print events to stdout.
    pub monitor: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            bpm: DEFAULT_BPM,
            ppq: DEFAULT_PPQ,
            midi_output: None,
            panic_on_stop: true,
            log_level: "debug".to_string(),
            monitor: false,
        }
    }
}

impl Settings {
    /// Builds settings from defaults, `file` (if given) and the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, SettingsError> {
        let defaults = Settings::default();
        let mut builder = ::config::Config::builder()
            .set_default("bpm", defaults.bpm)?
            .set_default("ppq", defaults.ppq as i64)?
            .set_default("panic_on_stop", defaults.panic_on_stop)?
            .set_default("log_level", defaults.log_level)?
            .set_default("monitor", defaults.monitor)?;

        if let Some(path) = file {
            info!("Reading settings from {}", path.display());
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        builder = builder.add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let settings: Settings = builder.build()?.try_deserialize()?;
        debug!("Loaded settings: {:?}", settings);
        settings.validate()
    }

    /// Command-line values win over everything else.
    pub fn with_overrides(mut self, args: &Args) -> Result<Self, SettingsError> {
        if let Some(bpm) = args.bpm {
            self.bpm = bpm;
        }
        if let Some(ppq) = args.ppq {
            self.ppq = ppq;
        }
        if let Some(device) = &args.midi_output {
            self.midi_output = Some(device.clone());
        }
        if args.no_panic {
            self.panic_on_stop = false;
        }
        if args.monitor {
            self.monitor = true;
        }
        if let Some(level) = &args.log_level {
            self.log_level = level.clone();
        }
        self.validate()
    }

    pub fn level_filter(&self) -> Result<LevelFilter, SettingsError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| SettingsError::LogLevel(self.log_level.clone()))
    }

    fn validate(self) -> Result<Self, SettingsError> {
        validate_bpm(self.bpm)?;
        validate_ppq(self.ppq)?;
        self.level_filter()?;
        Ok(self)
    }
}
