//! Checked front door to a running engine.
//!
//! The engine trusts every command it receives. [`Controller`] is where bad
//! values are turned away: bpm must be finite and positive, ppq non-zero and
//! patterns must pass [`Pattern::validate`].

use crate::messages::EngineCommand;
use crate::pattern::{Pattern, PatternError};
use crossbeam::channel::Sender;
use log::warn;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ControlError {
    #[error("BPM must be a positive number, got {0}")]
    InvalidBpm(f64),
    #[error("PPQ must be at least 1, got {0}")]
    InvalidPpq(u32),
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),
    #[error("engine is no longer running")]
    EngineGone,
}

pub fn validate_bpm(bpm: f64) -> Result<f64, ControlError> {
    if bpm.is_finite() && bpm > 0.0 {
        Ok(bpm)
    } else {
        Err(ControlError::InvalidBpm(bpm))
    }
}

pub fn validate_ppq(ppq: u32) -> Result<u32, ControlError> {
    if ppq > 0 {
        Ok(ppq)
    } else {
        Err(ControlError::InvalidPpq(ppq))
    }
}

#[derive(Clone)]
pub struct Controller {
    tx: Sender<EngineCommand>,
}

impl Controller {
    pub fn new(tx: Sender<EngineCommand>) -> Self {
        Controller { tx }
    }

    pub fn set_bpm(&self, bpm: f64) -> Result<(), ControlError> {
        let bpm = validate_bpm(bpm).inspect_err(|e| warn!("Rejected command: {}", e))?;
        self.send(EngineCommand::SetBpm(bpm))
    }

    pub fn set_ppq(&self, ppq: u32) -> Result<(), ControlError> {
        let ppq = validate_ppq(ppq).inspect_err(|e| warn!("Rejected command: {}", e))?;
        self.send(EngineCommand::SetPpq(ppq))
    }

    pub fn set_pattern(&self, pattern: Pattern) -> Result<(), ControlError> {
        if let Err(e) = pattern.validate() {
            warn!("Rejected pattern '{}': {}", pattern.name, e);
            return Err(e.into());
        }
        self.send(EngineCommand::SetPattern(pattern))
    }

    pub fn start(&self) -> Result<(), ControlError> {
        self.send(EngineCommand::Start)
    }

    pub fn stop(&self) -> Result<(), ControlError> {
        self.send(EngineCommand::Stop)
    }

    fn send(&self, command: EngineCommand) -> Result<(), ControlError> {
        self.tx.send(command).map_err(|_| ControlError::EngineGone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Clip;
    use crossbeam::channel::unbounded;

    #[test]
    fn test_rejects_non_positive_tempo() {
        let (tx, rx) = unbounded();
        let controller = Controller::new(tx);

        assert_eq!(controller.set_bpm(0.0), Err(ControlError::InvalidBpm(0.0)));
        assert_eq!(controller.set_bpm(-10.0), Err(ControlError::InvalidBpm(-10.0)));
        assert!(controller.set_bpm(f64::NAN).is_err());
        assert_eq!(controller.set_ppq(0), Err(ControlError::InvalidPpq(0)));
        assert!(rx.try_recv().is_err(), "nothing should reach the engine");
    }

    #[test]
    fn test_forwards_valid_commands_in_order() {
        let (tx, rx) = unbounded();
        let controller = Controller::new(tx);

        controller.set_bpm(98.5).unwrap();
        controller.set_ppq(96).unwrap();
        controller.start().unwrap();
        controller.stop().unwrap();

        let received: Vec<EngineCommand> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                EngineCommand::SetBpm(98.5),
                EngineCommand::SetPpq(96),
                EngineCommand::Start,
                EngineCommand::Stop,
            ]
        );
    }

    #[test]
    fn test_rejects_invalid_pattern() {
        let (tx, rx) = unbounded();
        let controller = Controller::new(tx);
        let pattern = Pattern::new("bad").with_clip(Clip::new("c", 17, 4, 4));

        assert!(matches!(
            controller.set_pattern(pattern),
            Err(ControlError::InvalidPattern(PatternError::ChannelOutOfRange { channel: 17, .. }))
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_reports_engine_gone() {
        let (tx, rx) = unbounded();
        drop(rx);
        let controller = Controller::new(tx);
        assert_eq!(controller.start(), Err(ControlError::EngineGone));
    }
}
