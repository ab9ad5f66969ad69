//! The drift-corrected pulse loop.
//!
//! [`Sequencer`] is a plain state machine: it is handed the current time and
//! appends the events that became due. The thread that owns it (see
//! [`crate::event_loop`]) decides when to call it again, using the wait
//! returned by [`Sequencer::poll`].

use crate::clock;
use crate::messages::{EngineCommand, EngineEvent};
use crate::state::EngineState;
use log::{debug, info, trace};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct Sequencer {
    state: EngineState,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// Applies one control command. Tempo and pattern changes take effect
    /// from the next pulse evaluated; already sounding notes keep their
    /// off times.
    pub fn apply(&mut self, command: EngineCommand, now: Instant, out: &mut Vec<EngineEvent>) {
        match command {
            EngineCommand::SetBpm(bpm) => {
                self.state.set_tempo(bpm);
                info!(
                    "Tempo set to {} BPM, tick interval {:?}",
                    bpm,
                    self.state.tick_interval()
                );
            }
            EngineCommand::SetPpq(ppq) => {
                self.state.set_ppq(ppq);
                self.rebase_cursors();
                info!(
                    "Resolution set to {} PPQ, tick interval {:?}",
                    ppq,
                    self.state.tick_interval()
                );
            }
            EngineCommand::SetPattern(pattern) => {
                info!(
                    "Pattern '{}' loaded with {} clip(s)",
                    pattern.name,
                    pattern.clips.len()
                );
                self.state.pattern = pattern;
                let (ppq, pulse) = (self.state.ppq(), self.state.pulse_count);
                self.state.step_cursors = self
                    .state
                    .pattern
                    .clips
                    .iter()
                    .map(|clip| clip.next_boundary_from(ppq, pulse))
                    .collect();
            }
            EngineCommand::Start => self.start(now, out),
            EngineCommand::Stop => self.stop(out),
        }
    }

    fn start(&mut self, now: Instant, out: &mut Vec<EngineEvent>) {
        if self.state.running {
            debug!("Start ignored, already running");
            return;
        }
        self.state.running = true;
        self.state.pulse_count = 0;
        self.state.step_cursors = vec![0; self.state.pattern.clips.len()];
        self.state.active_notes.clear();
        self.state.last_tick_time = Some(now);
        info!("Sequencer started at {} BPM / {} PPQ", self.state.tempo(), self.state.ppq());
        out.push(EngineEvent::Started);
    }

    /// Notes still sounding are forgotten without a note-off.
    fn stop(&mut self, out: &mut Vec<EngineEvent>) {
        if !self.state.running {
            debug!("Stop ignored, not running");
            return;
        }
        let abandoned = self.state.active_notes.len();
        self.state.running = false;
        self.state.last_tick_time = None;
        self.state.active_notes.clear();
        info!(
            "Sequencer stopped after {} pulses, {} note(s) left sounding",
            self.state.pulse_count, abandoned
        );
        out.push(EngineEvent::Stopped);
    }

    /// Keeps the clip cursors on the absolute grid after a resolution change.
    ///
    /// Boundaries that already fired are never repeated. If the new grid
    /// puts the pulse counter past a boundary that never fired, the most
    /// recent one fires on the next pulse; any older ones are dropped.
    fn rebase_cursors(&mut self) {
        let (ppq, pulse) = (self.state.ppq(), self.state.pulse_count);
        for (clip, next) in self
            .state
            .pattern
            .clips
            .iter()
            .zip(self.state.step_cursors.iter_mut())
        {
            let overdue = clip.next_boundary_from(ppq, pulse).saturating_sub(1);
            if overdue > *next {
                debug!(
                    "Clip '{}' skips to boundary {} after resolution change",
                    clip.name, overdue
                );
                *next = overdue;
            }
        }
    }

    /// Runs every pulse that has come due by `now`, in order, and returns
    /// how long to wait until the next one. `None` while stopped.
    ///
    /// A late wake-up replays the missed pulses with their scheduled
    /// times; the anchor advances by exactly one interval per pulse.
    pub fn poll(&mut self, now: Instant, out: &mut Vec<EngineEvent>) -> Option<Duration> {
        if !self.state.running {
            return None;
        }
        let interval = self.state.tick_interval();
        let mut last_tick = *self.state.last_tick_time.get_or_insert(now);

        let mut caught_up = 0u32;
        while now.saturating_duration_since(last_tick) >= interval {
            let pulse_time = last_tick + interval;
            self.process_pulse(pulse_time, out);
            last_tick = pulse_time;
            self.state.last_tick_time = Some(last_tick);
            self.state.pulse_count += 1;
            caught_up += 1;
        }
        if caught_up > 1 {
            debug!("Caught up {} pulses after a late wake-up", caught_up);
        }

        Some(interval.saturating_sub(now.saturating_duration_since(last_tick)))
    }

    fn process_pulse(&mut self, time: Instant, out: &mut Vec<EngineEvent>) {
        let pulse = self.state.pulse_count;

        // Offs first so a retriggered note ends before it starts again.
        for released in self.state.active_notes.release_due(time) {
            debug!("Note off ch={} note={}", released.channel, released.note);
            out.push(EngineEvent::NoteOff {
                channel: released.channel,
                note: released.note,
                time,
            });
        }

        let ppq = self.state.ppq();
        let interval = self.state.tick_interval();
        let clips = self
            .state
            .pattern
            .clips
            .iter()
            .zip(self.state.step_cursors.iter_mut())
            .enumerate();
        for (clip_index, (clip, next)) in clips {
            let last = clip.last_boundary_at(ppq, pulse);
            let due = *next..=last;
            *next = (*next).max(last + 1);
            for boundary in due {
                let step_index = clip.wrap_step(boundary);
                out.push(EngineEvent::Step {
                    clip_index,
                    step_index,
                    time,
                });

                for lane in &clip.lanes {
                    let Some(step) = lane.steps.get(&step_index) else {
                        continue;
                    };
                    debug!(
                        "Note on clip={} step={} {} ch={} note={} vel={}",
                        clip_index,
                        step_index,
                        lane.instrument,
                        clip.channel,
                        lane.midi_note,
                        step.velocity
                    );
                    out.push(EngineEvent::NoteOn {
                        channel: clip.channel,
                        midi_note: lane.midi_note,
                        velocity: step.velocity,
                        time,
                    });

                    let (pulses, steps_per_beat) = clip.pulses_per_step(ppq);
                    let length = clock::scale_interval(
                        interval,
                        pulses * step.length_in_steps as u64,
                        steps_per_beat,
                    );
                    self.state
                        .active_notes
                        .register(lane.midi_note, clip.channel, time + length);
                }
            }
        }

        trace!("Pulse {}", pulse);
        out.push(EngineEvent::Tick { time, pulse });
    }
}
