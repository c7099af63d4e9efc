//! Simulated serial link: EEG samples rendered as text lines

use crate::eeg_simulator::{EegConfig, EegSimulator};
use focus_core::{config_error, FocusResult, SampleSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::debug;

/// Lines a flaky link might produce instead of a number
const GARBAGE: [&str; 4] = ["", "ERR", "12.3.4", "nan"];

/// [`SampleSource`] backed by an [`EegSimulator`]
pub struct SyntheticSource {
    simulator: EegSimulator,
    rng: StdRng,
    malformed_probability: f64,
    paced: bool,
    limit: Option<u64>,
    emitted: u64,
    started: Option<Instant>,
    closed: bool,
}

impl SyntheticSource {
    pub fn new(config: EegConfig) -> FocusResult<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            simulator: EegSimulator::new(config)?,
            rng,
            malformed_probability: 0.0,
            paced: false,
            limit: None,
            emitted: 0,
            started: None,
            closed: false,
        })
    }

    /// Replace a fraction of lines with garbage
    pub fn with_malformed_probability(mut self, probability: f64) -> FocusResult<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(config_error!("malformed probability must be within [0, 1], got {}", probability));
        }
        self.malformed_probability = probability;
        Ok(self)
    }

    /// Emit lines in real time at the sampling rate
    pub fn paced(mut self, paced: bool) -> Self {
        self.paced = paced;
        self
    }

    /// End the stream after `lines` lines
    pub fn with_limit(mut self, lines: u64) -> Self {
        self.limit = Some(lines);
        self
    }

    /// Stream length for `seconds` of signal
    pub fn with_duration(self, seconds: f64) -> Self {
        let rate = self.simulator.config().sampling_rate_hz;
        let lines = (seconds * rate).round().max(0.0) as u64;
        self.with_limit(lines)
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn wait_for_slot(&mut self) {
        let started = *self.started.get_or_insert_with(Instant::now);
        let rate = self.simulator.config().sampling_rate_hz;
        let due = started + Duration::from_secs_f64(self.emitted as f64 / rate);
        let now = Instant::now();
        if due > now {
            std::thread::sleep(due - now);
        }
    }
}

impl SampleSource for SyntheticSource {
    fn next_line(&mut self) -> FocusResult<Option<String>> {
        if self.closed || self.limit.is_some_and(|limit| self.emitted >= limit) {
            return Ok(None);
        }
        if self.paced {
            self.wait_for_slot();
        }

        let value = self.simulator.next_sample();
        self.emitted += 1;

        if self.malformed_probability > 0.0 && self.rng.gen::<f64>() < self.malformed_probability {
            let garbage = GARBAGE[self.rng.gen_range(0..GARBAGE.len())];
            return Ok(Some(garbage.to_string()));
        }
        Ok(Some(format!("{:.6}", value)))
    }

    fn close(&mut self) {
        if !self.closed {
            debug!(lines = self.emitted, "synthetic source closed");
            self.closed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal_patterns::SignalPattern;
    use focus_core::parse_sample;

    fn config(seed: u64) -> EegConfig {
        EegConfig {
            pattern: SignalPattern::Relaxed { scale: 1.0 },
            seed: Some(seed),
            ..EegConfig::default()
        }
    }

    fn drain(source: &mut SyntheticSource) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = source.next_line().unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_limit_ends_stream() {
        let mut source = SyntheticSource::new(config(1)).unwrap().with_duration(2.0);
        let lines = drain(&mut source);

        assert_eq!(lines.len(), 500);
        assert!(lines.iter().all(|l| parse_sample(l).is_ok()));
        assert_eq!(source.emitted(), 500);
    }

    #[test]
    fn test_malformed_injection() {
        let mut source = SyntheticSource::new(config(5))
            .unwrap()
            .with_malformed_probability(0.2)
            .unwrap()
            .with_limit(2000);

        let malformed = drain(&mut source)
            .iter()
            .filter(|l| parse_sample(l).is_err())
            .count();
        assert!(malformed > 250 && malformed < 550, "malformed {}", malformed);

        assert!(SyntheticSource::new(config(5))
            .unwrap()
            .with_malformed_probability(1.5)
            .is_err());
    }

    #[test]
    fn test_same_seed_same_lines() {
        let a = drain(&mut SyntheticSource::new(config(9)).unwrap().with_limit(100));
        let b = drain(&mut SyntheticSource::new(config(9)).unwrap().with_limit(100));
        assert_eq!(a, b);
    }

    #[test]
    fn test_close_ends_stream() {
        let mut source = SyntheticSource::new(config(2)).unwrap();
        assert!(source.next_line().unwrap().is_some());

        source.close();
        assert!(source.is_closed());
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn test_paced_source_keeps_rate() {
        let mut source = SyntheticSource::new(EegConfig {
            sampling_rate_hz: 1000.0,
            ..config(3)
        })
        .unwrap()
        .paced(true)
        .with_limit(50);

        let started = Instant::now();
        assert_eq!(drain(&mut source).len(), 50);
        assert!(started.elapsed() >= Duration::from_millis(45));
    }
}
