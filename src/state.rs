use crate::clock::{self, DEFAULT_BPM, DEFAULT_PPQ};
use crate::notes::ActiveNotes;
use crate::pattern::Pattern;
use std::time::{Duration, Instant};

/// Everything one engine instance knows. Owned by a single
/// [`crate::scheduler::Sequencer`]; there is no shared global copy.
#[derive(Debug)]
pub struct EngineState {
    bpm: f64,
    ppq: u32,
    tick_interval: Duration,
    pub running: bool,
    pub pulse_count: u64,
    pub last_tick_time: Option<Instant>,
    pub pattern: Pattern,
    /// Per clip, the next step boundary that has not fired yet.
    pub step_cursors: Vec<u64>,
    pub active_notes: ActiveNotes,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            ppq: DEFAULT_PPQ,
            tick_interval: clock::tick_interval(DEFAULT_BPM, DEFAULT_PPQ),
            running: false,
            pulse_count: 0,
            last_tick_time: None,
            pattern: Pattern::default(),
            step_cursors: Vec::new(),
            active_notes: ActiveNotes::new(),
        }
    }
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tempo(&mut self, bpm: f64) {
        self.bpm = bpm;
        self.tick_interval = clock::tick_interval(self.bpm, self.ppq);
    }

    pub fn tempo(&self) -> f64 {
        self.bpm
    }

    pub fn set_ppq(&mut self, ppq: u32) {
        self.ppq = ppq;
        self.tick_interval = clock::tick_interval(self.bpm, self.ppq);
    }

    pub fn ppq(&self) -> u32 {
        self.ppq
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn is_playing(&self) -> bool {
        self.running
    }

    pub fn get_tick_count(&self) -> u64 {
        self.pulse_count
    }
}
