//! Clips, lanes and steps, plus the pure step-grid arithmetic.
//!
//! Every clip runs its own grid off the single global pulse counter. A clip
//! with `subdivision_per_beat = s` has a step boundary every `ppq / s` pulses;
//! when that ratio is not whole, boundary `k` sits at the rational pulse
//! position `k * ppq / s` and fires on the first pulse at or after it. All of
//! this is integer arithmetic, so boundaries are never missed or doubled.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use thiserror::Error;

pub const MIN_CHANNEL: u8 = 1;
pub const MAX_CHANNEL: u8 = 16;
pub const MAX_DATA_BYTE: u8 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub velocity: u8,
    /// Duration in steps of the owning clip; may reach past the next boundary.
    pub length_in_steps: u32,
}

impl Step {
    pub fn new(velocity: u8, length_in_steps: u32) -> Self {
        Step {
            velocity,
            length_in_steps,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lane {
    pub instrument: String,
    pub midi_note: u8,
    /// Step index to step. A missing key is silence.
    pub steps: BTreeMap<usize, Step>,
}

impl Lane {
    pub fn new(instrument: impl Into<String>, midi_note: u8) -> Self {
        Lane {
            instrument: instrument.into(),
            midi_note,
            steps: BTreeMap::new(),
        }
    }

    /// Builder helper placing the same step at each index.
    pub fn with_hits(mut self, indices: &[usize], step: Step) -> Self {
        for &index in indices {
            self.steps.insert(index, step);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub name: String,
    /// MIDI channel, 1-based.
    pub channel: u8,
    pub lanes: Vec<Lane>,
    pub beats_per_measure: u32,
    pub subdivision_per_beat: u32,
}

impl Clip {
    pub fn new(
        name: impl Into<String>,
        channel: u8,
        beats_per_measure: u32,
        subdivision_per_beat: u32,
    ) -> Self {
        Clip {
            name: name.into(),
            channel,
            lanes: Vec::new(),
            beats_per_measure,
            subdivision_per_beat,
        }
    }

    pub fn with_lane(mut self, lane: Lane) -> Self {
        self.lanes.push(lane);
        self
    }

    pub fn total_steps(&self) -> usize {
        calculate_length_in_steps(self.beats_per_measure, self.subdivision_per_beat)
    }

    /// Pulses between two step boundaries as the exact ratio
    /// `(numerator, denominator)`, i.e. `ppq / subdivision_per_beat`.
    pub fn pulses_per_step(&self, ppq: u32) -> (u64, u64) {
        (ppq as u64, self.subdivision_per_beat as u64)
    }

    /// Step boundaries that land on `pulse`, as absolute boundary numbers.
    ///
    /// Usually zero or one; several only when a clip subdivides finer than
    /// the pulse resolution.
    pub fn boundaries_at(&self, ppq: u32, pulse: u64) -> RangeInclusive<u64> {
        self.next_boundary_from(ppq, pulse)..=self.last_boundary_at(ppq, pulse)
    }

    /// The latest boundary at or before `pulse`.
    pub fn last_boundary_at(&self, ppq: u32, pulse: u64) -> u64 {
        let (num, den) = self.pulses_per_step(ppq);
        (pulse as u128 * den as u128 / num.max(1) as u128) as u64
    }

    /// The first boundary not yet due when `pulse` is about to run.
    pub fn next_boundary_from(&self, ppq: u32, pulse: u64) -> u64 {
        match pulse {
            0 => 0,
            p => self.last_boundary_at(ppq, p - 1) + 1,
        }
    }

    /// The step index playing at `pulse`.
    pub fn step_index(&self, ppq: u32, pulse: u64) -> usize {
        self.wrap_step(self.last_boundary_at(ppq, pulse))
    }

    pub(crate) fn wrap_step(&self, boundary: u64) -> usize {
        (boundary % self.total_steps().max(1) as u64) as usize
    }

    fn validate(&self, clip_index: usize) -> Result<(), PatternError> {
        if !(MIN_CHANNEL..=MAX_CHANNEL).contains(&self.channel) {
            return Err(PatternError::ChannelOutOfRange {
                clip: clip_index,
                channel: self.channel,
            });
        }
        if self.beats_per_measure == 0 || self.subdivision_per_beat == 0 {
            return Err(PatternError::EmptyGrid { clip: clip_index });
        }
        let total_steps = self.total_steps();
        for (lane_index, lane) in self.lanes.iter().enumerate() {
            if lane.midi_note > MAX_DATA_BYTE {
                return Err(PatternError::NoteOutOfRange {
                    clip: clip_index,
                    lane: lane_index,
                    note: lane.midi_note,
                });
            }
            for (&step_index, step) in &lane.steps {
                if step_index >= total_steps {
                    return Err(PatternError::StepOutOfRange {
                        clip: clip_index,
                        lane: lane_index,
                        step: step_index,
                        total_steps,
                    });
                }
                if step.velocity > MAX_DATA_BYTE {
                    return Err(PatternError::VelocityOutOfRange {
                        clip: clip_index,
                        lane: lane_index,
                        step: step_index,
                        velocity: step.velocity,
                    });
                }
                if step.length_in_steps == 0 {
                    return Err(PatternError::ZeroLength {
                        clip: clip_index,
                        lane: lane_index,
                        step: step_index,
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pattern {
    pub name: String,
    pub clips: Vec<Clip>,
}

impl Pattern {
    pub fn new(name: impl Into<String>) -> Self {
        Pattern {
            name: name.into(),
            clips: Vec::new(),
        }
    }

    pub fn with_clip(mut self, clip: Clip) -> Self {
        self.clips.push(clip);
        self
    }

    /// Checks channel, note, velocity and grid ranges on every clip.
    pub fn validate(&self) -> Result<(), PatternError> {
        self.clips
            .iter()
            .enumerate()
            .try_for_each(|(index, clip)| clip.validate(index))
    }

    /// A one-bar drum groove on channel 10: kick on 0, 2, 8 and 11,
    /// snare on 4 and 12, sixteenth-note grid.
    pub fn demo() -> Self {
        let hit = Step::new(100, 1);
        Pattern::new("Demo").with_clip(
            Clip::new("Drums", 10, 4, 4)
                .with_lane(Lane::new("kick", 36).with_hits(&[0, 2, 8, 11], hit))
                .with_lane(Lane::new("snare", 37).with_hits(&[4, 12], hit)),
        )
    }
}

pub fn calculate_length_in_steps(beats: u32, steps_per_beat: u32) -> usize {
    beats as usize * steps_per_beat as usize
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("clip {clip}: channel {channel} is outside 1..=16")]
    ChannelOutOfRange { clip: usize, channel: u8 },
    #[error("clip {clip}: beats per measure and subdivision must both be at least 1")]
    EmptyGrid { clip: usize },
    #[error("clip {clip} lane {lane}: MIDI note {note} is outside 0..=127")]
    NoteOutOfRange { clip: usize, lane: usize, note: u8 },
    #[error("clip {clip} lane {lane} step {step}: velocity {velocity} is outside 0..=127")]
    VelocityOutOfRange {
        clip: usize,
        lane: usize,
        step: usize,
        velocity: u8,
    },
    #[error("clip {clip} lane {lane}: step {step} is past the last step ({total_steps} steps)")]
    StepOutOfRange {
        clip: usize,
        lane: usize,
        step: usize,
        total_steps: usize,
    },
    #[error("clip {clip} lane {lane} step {step}: length must be at least one step")]
    ZeroLength { clip: usize, lane: usize, step: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fired_pulses(clip: &Clip, ppq: u32, pulses: u64) -> Vec<(u64, usize)> {
        (0..pulses)
            .flat_map(|p| {
                clip.boundaries_at(ppq, p)
                    .map(move |k| (p, clip.wrap_step(k)))
            })
            .collect()
    }

    #[test]
    fn test_sixteenth_grid_boundaries() {
        let clip = Clip::new("c", 1, 4, 4);
        assert_eq!(clip.total_steps(), 16);
        assert_eq!(clip.pulses_per_step(24), (24, 4));

        let fired = fired_pulses(&clip, 24, 25);
        assert_eq!(
            fired,
            vec![(0, 0), (6, 1), (12, 2), (18, 3), (24, 4)]
        );
    }

    #[test]
    fn test_step_index_wraps_at_measure() {
        let clip = Clip::new("c", 1, 4, 4);
        assert_eq!(clip.step_index(24, 90), 15);
        assert_eq!(clip.step_index(24, 96), 0);
        assert_eq!(fired_pulses(&clip, 24, 97).last(), Some(&(96, 0)));
    }

    #[test]
    fn test_fractional_spacing_fires_every_step_once() {
        // 24 / 5 = 4.8 pulses per step
        let clip = Clip::new("quintuplets", 1, 1, 5);
        let fired = fired_pulses(&clip, 24, 25);
        assert_eq!(fired, vec![(0, 0), (5, 1), (10, 2), (15, 3), (20, 4), (24, 0)]);
    }

    #[test]
    fn test_subdivision_finer_than_ppq() {
        let clip = Clip::new("fast", 1, 1, 8);
        let fired = fired_pulses(&clip, 4, 3);
        assert_eq!(
            fired,
            vec![(0, 0), (1, 1), (1, 2), (2, 3), (2, 4)]
        );
    }

    #[test]
    fn test_next_boundary_after_a_partial_step() {
        let clip = Clip::new("c", 1, 4, 4);
        assert_eq!(clip.next_boundary_from(24, 0), 0);
        assert_eq!(clip.next_boundary_from(24, 6), 1);
        assert_eq!(clip.next_boundary_from(24, 7), 2);
        assert_eq!(clip.last_boundary_at(24, 11), 1);
        assert_eq!(clip.last_boundary_at(48, 11), 0);
    }

    #[test]
    fn test_demo_pattern_is_valid() {
        let pattern = Pattern::demo();
        assert_eq!(pattern.validate(), Ok(()));
        assert_eq!(pattern.clips[0].lanes[0].steps.len(), 4);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let bad_channel = Pattern::new("p").with_clip(Clip::new("c", 0, 4, 4));
        assert_eq!(
            bad_channel.validate(),
            Err(PatternError::ChannelOutOfRange { clip: 0, channel: 0 })
        );

        let empty_grid = Pattern::new("p").with_clip(Clip::new("c", 1, 0, 4));
        assert_eq!(empty_grid.validate(), Err(PatternError::EmptyGrid { clip: 0 }));

        let past_end = Pattern::new("p").with_clip(
            Clip::new("c", 1, 1, 4).with_lane(Lane::new("x", 60).with_hits(&[4], Step::new(90, 1))),
        );
        assert!(matches!(
            past_end.validate(),
            Err(PatternError::StepOutOfRange { step: 4, total_steps: 4, .. })
        ));

        let loud = Pattern::new("p").with_clip(
            Clip::new("c", 1, 1, 4).with_lane(Lane::new("x", 60).with_hits(&[0], Step::new(200, 1))),
        );
        assert!(matches!(
            loud.validate(),
            Err(PatternError::VelocityOutOfRange { velocity: 200, .. })
        ));

        let silent = Pattern::new("p").with_clip(
            Clip::new("c", 1, 1, 4).with_lane(Lane::new("x", 60).with_hits(&[0], Step::new(90, 0))),
        );
        assert!(matches!(silent.validate(), Err(PatternError::ZeroLength { .. })));
    }

    #[test]
    fn test_empty_pattern_is_valid() {
        assert_eq!(Pattern::default().validate(), Ok(()));
    }
}
