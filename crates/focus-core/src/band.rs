//! Frequency band definitions

use crate::error::{FocusError, FocusResult};
use serde::{Deserialize, Serialize};

/// Name of the band conventionally associated with relaxation
pub const ALPHA: &str = "alpha";
/// Name of the band conventionally associated with concentration
pub const BETA: &str = "beta";

/// Frequency band definition for band-power analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub name: String,
    pub low_hz: f64,
    pub high_hz: f64,
}

impl FrequencyBand {
    pub fn new(name: impl Into<String>, low_hz: f64, high_hz: f64) -> Self {
        Self {
            name: name.into(),
            low_hz,
            high_hz,
        }
    }

    /// The five canonical EEG bands, in analysis order
    pub fn eeg_bands() -> Vec<FrequencyBand> {
        vec![
            FrequencyBand::new("delta", 0.5, 4.0),
            FrequencyBand::new("theta", 4.0, 8.0),
            FrequencyBand::new(ALPHA, 8.0, 12.0),
            FrequencyBand::new(BETA, 12.0, 30.0),
            FrequencyBand::new("gamma", 30.0, 40.0),
        ]
    }

    /// Geometric center, where a bandpass has unity gain
    pub fn center_hz(&self) -> f64 {
        (self.low_hz * self.high_hz).sqrt()
    }

    pub fn bandwidth_hz(&self) -> f64 {
        self.high_hz - self.low_hz
    }

    pub fn contains(&self, freq_hz: f64) -> bool {
        freq_hz >= self.low_hz && freq_hz <= self.high_hz
    }

    /// Check `0 < low < high < nyquist`
    pub fn validate(&self, sampling_rate_hz: f64) -> FocusResult<()> {
        let nyquist_hz = sampling_rate_hz / 2.0;
        let ordered = self.low_hz > 0.0 && self.low_hz < self.high_hz && self.high_hz < nyquist_hz;

        if self.name.trim().is_empty() || !ordered || !self.low_hz.is_finite() {
            return Err(FocusError::InvalidBand {
                name: self.name.clone(),
                low_hz: self.low_hz,
                high_hz: self.high_hz,
                nyquist_hz,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_bands_order() {
        let names: Vec<_> = FrequencyBand::eeg_bands().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["delta", "theta", "alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_band_validation() {
        let alpha = FrequencyBand::new(ALPHA, 8.0, 12.0);
        assert!(alpha.validate(250.0).is_ok());

        // Upper edge at or above Nyquist
        let too_high = FrequencyBand::new("high", 100.0, 125.0);
        assert!(matches!(too_high.validate(250.0), Err(FocusError::InvalidBand { .. })));

        // Inverted and zero edges
        assert!(FrequencyBand::new("inv", 12.0, 8.0).validate(250.0).is_err());
        assert!(FrequencyBand::new("dc", 0.0, 4.0).validate(250.0).is_err());
        assert!(FrequencyBand::new("", 1.0, 4.0).validate(250.0).is_err());
    }

    #[test]
    fn test_band_geometry() {
        let beta = FrequencyBand::new(BETA, 12.0, 30.0);
        assert_eq!(beta.bandwidth_hz(), 18.0);
        assert!((beta.center_hz() - 360.0_f64.sqrt()).abs() < 1e-12);
        assert!(beta.contains(20.0));
        assert!(!beta.contains(10.0));
    }
}
