//! Session time base
//!
//! Elapsed seconds since the session started, either from a monotonic
//! wall clock or derived from the number of samples seen. The sample
//! clock makes replayed recordings and tests fully deterministic.

use crate::config::ClockKind;
use std::time::Instant;

/// Monotonic elapsed-time source for a session
#[derive(Debug, Clone)]
pub struct SessionClock {
    kind: ClockKind,
    sampling_rate_hz: f64,
    started: Instant,
    last_elapsed: f64,
}

impl SessionClock {
    pub fn new(kind: ClockKind, sampling_rate_hz: f64) -> Self {
        Self {
            kind,
            sampling_rate_hz,
            started: Instant::now(),
            last_elapsed: 0.0,
        }
    }

    /// Clock driven only by sample count
    pub fn from_samples(sampling_rate_hz: f64) -> Self {
        Self::new(ClockKind::Samples, sampling_rate_hz)
    }

    pub fn kind(&self) -> ClockKind {
        self.kind
    }

    /// Restart at zero
    pub fn reset(&mut self) {
        self.started = Instant::now();
        self.last_elapsed = 0.0;
    }

    /// Elapsed seconds after `samples_ingested` samples.
    ///
    /// Never decreases between calls.
    pub fn elapsed_seconds(&mut self, samples_ingested: u64) -> f64 {
        let raw = match self.kind {
            ClockKind::Wall => self.started.elapsed().as_secs_f64(),
            ClockKind::Samples => samples_ingested as f64 / self.sampling_rate_hz,
        };

        if raw > self.last_elapsed {
            self.last_elapsed = raw;
        }
        self.last_elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_clock() {
        let mut clock = SessionClock::from_samples(250.0);
        assert_eq!(clock.elapsed_seconds(0), 0.0);
        assert_eq!(clock.elapsed_seconds(250), 1.0);
        assert_eq!(clock.elapsed_seconds(7500), 30.0);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let mut clock = SessionClock::from_samples(100.0);
        assert_eq!(clock.elapsed_seconds(500), 5.0);
        // A smaller count never moves time backwards
        assert_eq!(clock.elapsed_seconds(100), 5.0);

        clock.reset();
        assert_eq!(clock.elapsed_seconds(100), 1.0);
    }

    #[test]
    fn test_wall_clock_advances() {
        let mut clock = SessionClock::new(ClockKind::Wall, 250.0);
        let first = clock.elapsed_seconds(0);
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = clock.elapsed_seconds(0);
        assert!(second > first);
        assert_eq!(clock.kind(), ClockKind::Wall);
    }
}
