//! Single-channel EEG simulator with configurable rhythm patterns

use crate::signal_patterns::SignalPattern;
use focus_core::{config_error, FocusResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Noise configuration for EEG simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation (0.0 = no noise)
    pub gaussian_std: f64,
    /// Amplitude of a slow 0.1 Hz drift
    pub baseline_wander: f64,
    /// Per-sample probability of an eye-blink style spike
    pub artifact_prob: f64,
    pub artifact_amp: f64,
}

impl NoiseConfig {
    /// No noise at all
    pub fn silent() -> Self {
        Self {
            gaussian_std: 0.0,
            baseline_wander: 0.0,
            artifact_prob: 0.0,
            artifact_amp: 0.0,
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gaussian_std: 0.1,
            baseline_wander: 0.05,
            artifact_prob: 0.0005,
            artifact_amp: 2.0,
        }
    }
}

/// Configuration for EEG simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EegConfig {
    pub sampling_rate_hz: f64,
    pub pattern: SignalPattern,
    pub noise: NoiseConfig,
    /// Power line interference (50/60Hz)
    pub powerline_freq_hz: Option<f64>,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for EegConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: 250.0,
            pattern: SignalPattern::Relaxed { scale: 1.0 },
            noise: NoiseConfig::default(),
            powerline_freq_hz: Some(50.0),
            seed: None,
        }
    }
}

impl EegConfig {
    pub fn validate(&self) -> FocusResult<()> {
        if !(self.sampling_rate_hz.is_finite() && self.sampling_rate_hz > 0.0) {
            return Err(config_error!("simulator sampling rate must be positive"));
        }
        if !(0.0..=1.0).contains(&self.noise.artifact_prob) {
            return Err(config_error!("artifact_prob must be within [0, 1]"));
        }
        match self.pattern {
            SignalPattern::Alternating { period_seconds, .. } if period_seconds <= 0.0 => {
                Err(config_error!("alternating period must be positive"))
            }
            _ => Ok(()),
        }
    }
}

/// EEG signal simulator
pub struct EegSimulator {
    config: EegConfig,
    rng: StdRng,
    normal_dist: Normal<f64>,
    sample_index: u64,
}

impl EegSimulator {
    /// Create new EEG simulator with configuration
    pub fn new(config: EegConfig) -> FocusResult<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let normal_dist = Normal::new(0.0, config.noise.gaussian_std)
            .map_err(|e| config_error!("Failed to create normal distribution: {}", e))?;

        Ok(Self {
            config,
            rng,
            normal_dist,
            sample_index: 0,
        })
    }

    /// Seconds of signal generated so far
    pub fn time(&self) -> f64 {
        self.sample_index as f64 / self.config.sampling_rate_hz
    }

    /// Next sample in the stream
    pub fn next_sample(&mut self) -> f64 {
        let time = self.time();
        self.sample_index += 1;

        let mut value = self.config.pattern.value_at(time);
        value += self.noise(time);
        if let Some(freq) = self.config.powerline_freq_hz {
            value += 0.05 * (2.0 * PI * freq * time).sin();
        }
        value
    }

    fn noise(&mut self, time: f64) -> f64 {
        let noise = &self.config.noise;
        let mut value = self.normal_dist.sample(&mut self.rng);
        value += noise.baseline_wander * (2.0 * PI * 0.1 * time).sin();

        if noise.artifact_prob > 0.0 && self.rng.gen::<f64>() < noise.artifact_prob {
            value += noise.artifact_amp * self.rng.gen_range(-1.0..1.0);
        }
        value
    }

    /// Generate `count` consecutive samples
    pub fn generate_samples(&mut self, count: usize) -> Vec<f64> {
        (0..count).map(|_| self.next_sample()).collect()
    }

    /// Generate EEG signal for specified duration
    pub fn generate(&mut self, duration_seconds: f64) -> Vec<f64> {
        let count = (duration_seconds * self.config.sampling_rate_hz).round().max(0.0) as usize;
        self.generate_samples(count)
    }

    /// Restart the time base (noise sequence continues)
    pub fn reset_time(&mut self) {
        self.sample_index = 0;
    }

    /// Get current configuration
    pub fn config(&self) -> &EegConfig {
        &self.config
    }

    /// Swap the pattern without resetting time
    pub fn set_pattern(&mut self, pattern: SignalPattern) -> FocusResult<()> {
        let config = EegConfig {
            pattern,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_core::{FocusError, FrequencyBand, SamplingConfig};
    use focus_processing::{compute_band_powers, PowerNormalizer};

    fn seeded(pattern: SignalPattern, seed: u64) -> EegSimulator {
        EegSimulator::new(EegConfig {
            pattern,
            seed: Some(seed),
            ..EegConfig::default()
        })
        .unwrap()
    }

    fn concentration(samples: &[f64]) -> f64 {
        let powers = compute_band_powers(
            samples,
            &SamplingConfig::new(250.0, 2.0),
            &FrequencyBand::eeg_bands(),
        )
        .unwrap();
        let normalizer = PowerNormalizer::default();
        normalizer.concentration(&normalizer.normalize(&powers).unwrap()).unwrap()
    }

    #[test]
    fn test_eeg_simulator_basic() {
        let mut simulator = seeded(SignalPattern::Relaxed { scale: 1.0 }, 7);
        let signal = simulator.generate(2.0);

        assert_eq!(signal.len(), 500);
        assert_eq!(simulator.time(), 2.0);
        assert!(signal.iter().all(|v| v.is_finite()));

        simulator.reset_time();
        assert_eq!(simulator.time(), 0.0);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = seeded(SignalPattern::Focused { scale: 1.0 }, 42).generate_samples(300);
        let b = seeded(SignalPattern::Focused { scale: 1.0 }, 42).generate_samples(300);
        let c = seeded(SignalPattern::Focused { scale: 1.0 }, 43).generate_samples(300);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_silent_noise_matches_pattern() {
        let pattern = SignalPattern::PureTone { frequency_hz: 10.0, amplitude: 1.0 };
        let mut simulator = EegSimulator::new(EegConfig {
            pattern,
            noise: NoiseConfig::silent(),
            powerline_freq_hz: None,
            seed: Some(1),
            ..EegConfig::default()
        })
        .unwrap();

        for i in 0..50 {
            let expected = pattern.value_at(i as f64 / 250.0);
            assert!((simulator.next_sample() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_patterns_read_as_intended() {
        let relaxed = seeded(SignalPattern::Relaxed { scale: 1.0 }, 3).generate(2.0);
        let focused = seeded(SignalPattern::Focused { scale: 1.0 }, 3).generate(2.0);

        assert!(concentration(&relaxed) < 0.5);
        assert!(concentration(&focused) > 0.5);
    }

    #[test]
    fn test_invalid_config() {
        let config = EegConfig {
            sampling_rate_hz: 0.0,
            ..EegConfig::default()
        };
        assert!(matches!(EegSimulator::new(config), Err(FocusError::InvalidConfig { .. })));

        let mut simulator = seeded(SignalPattern::Flat, 1);
        let bad = SignalPattern::Alternating { period_seconds: 0.0, scale: 1.0 };
        assert!(simulator.set_pattern(bad).is_err());
        assert_eq!(simulator.config().pattern, SignalPattern::Flat);
    }
}
