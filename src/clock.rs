// clock.rs

use std::time::Duration;

/// Default tempo in beats per minute.
pub const DEFAULT_BPM: f64 = 120.0;

/// Default resolution, the MIDI standard 24 pulses per quarter note.
pub const DEFAULT_PPQ: u32 = 24;

/// Milliseconds between two pulses at the given tempo and resolution.
///
/// Only defined for `bpm > 0` and `ppq > 0`; callers validate before
/// reaching this point.
pub fn tick_interval_ms(bpm: f64, ppq: u32) -> f64 {
    (60.0 / bpm / ppq as f64) * 1000.0
}

/// Shortest pulse interval the engine will run at.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_nanos(1);

/// [`tick_interval_ms`] as a `Duration`, rounded to the nearest nanosecond
/// and never shorter than [`MIN_TICK_INTERVAL`].
///
/// Pulse times are built by adding this rounded value, so against the exact
/// tempo they run off by at most half a nanosecond per pulse (about 24 ns
/// per minute at 120 BPM / 24 PPQ).
pub fn tick_interval(bpm: f64, ppq: u32) -> Duration {
    let nanos = (tick_interval_ms(bpm, ppq) * 1_000_000.0).round();
    Duration::from_nanos(nanos as u64).max(MIN_TICK_INTERVAL)
}

/// Scales a pulse interval by the rational `numerator / denominator` using
/// integer nanoseconds, so integral results stay exact.
pub fn scale_interval(interval: Duration, numerator: u64, denominator: u64) -> Duration {
    let nanos = interval.as_nanos() * numerator as u128 / denominator.max(1) as u128;
    Duration::from_nanos(nanos.min(u64::MAX as u128) as u64)
}
