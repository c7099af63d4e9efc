//! Session configuration
//!
//! Everything the engine needs is checked once by [`SessionConfig::validate`]
//! so that a bad window length or band is rejected at startup instead of
//! at the first processed window.

use crate::band::{FrequencyBand, ALPHA, BETA};
use crate::config_error;
use crate::error::{FocusError, FocusResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Butterworth prototype order used per band
pub const DEFAULT_FILTER_ORDER: usize = 4;

/// Padding used by forward-backward filtering of a bandpass built from
/// `order` second-order sections: three times the digital filter length.
pub const fn zero_phase_pad_len(order: usize) -> usize {
    3 * (2 * order + 1)
}

/// Shortest window the zero-phase filter can process
pub const fn min_window_samples(order: usize) -> usize {
    zero_phase_pad_len(order) + 1
}

/// How samples are gathered into analysis windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMode {
    /// Rolling window, processed as new samples arrive
    Sliding,
    /// Fixed segments, each processed exactly once
    Segment,
}

/// Full-spectrum estimator used for snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectralMode {
    /// Raw FFT magnitude of the whole window
    Fft,
    /// Welch-averaged power spectral density
    Welch,
}

/// Where elapsed session time comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockKind {
    /// Monotonic wall clock
    Wall,
    /// Samples ingested divided by the sampling rate
    Samples,
}

/// Bands that form the concentration ratio `focus / (relax + focus)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationBands {
    pub focus_band: String,
    pub relax_band: String,
}

impl Default for ConcentrationBands {
    fn default() -> Self {
        Self {
            focus_band: BETA.to_string(),
            relax_band: ALPHA.to_string(),
        }
    }
}

/// Sampling rate and analysis window length
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub sampling_rate_hz: f64,
    pub window_seconds: f64,
}

impl SamplingConfig {
    pub fn new(sampling_rate_hz: f64, window_seconds: f64) -> Self {
        Self { sampling_rate_hz, window_seconds }
    }

    /// `round(rate × seconds)`
    pub fn window_samples(&self) -> usize {
        (self.sampling_rate_hz * self.window_seconds).round().max(0.0) as usize
    }

    pub fn nyquist_hz(&self) -> f64 {
        self.sampling_rate_hz / 2.0
    }

    /// Rate and window sanity plus minimum filter support for `order`
    pub fn validate(&self, order: usize) -> FocusResult<()> {
        if !(self.sampling_rate_hz.is_finite() && self.sampling_rate_hz > 0.0) {
            return Err(config_error!("sampling_rate_hz must be positive, got {}", self.sampling_rate_hz));
        }
        if !(self.window_seconds.is_finite() && self.window_seconds > 0.0) {
            return Err(config_error!("window_seconds must be positive, got {}", self.window_seconds));
        }

        let required = min_window_samples(order);
        let available = self.window_samples();
        if available < required {
            return Err(FocusError::InsufficientSamples { required, available });
        }

        Ok(())
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self::new(250.0, 2.0)
    }
}

/// Complete configuration for one acquisition session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub sampling: SamplingConfig,
    pub bands: Vec<FrequencyBand>,
    pub acquisition_mode: AcquisitionMode,
    pub spectral_mode: SpectralMode,
    /// Seconds between spectral snapshots
    pub snapshot_interval_seconds: f64,
    /// Pause after each snapshot before ingestion resumes
    pub cooldown_seconds: f64,
    pub filter_order: usize,
    /// Sliding mode: process once every `hop_samples` new samples
    pub hop_samples: usize,
    /// Sliding mode: retained history, defaults to the window length
    pub max_buffer_samples: Option<usize>,
    /// Welch sub-segment length, defaults to half the window
    pub welch_segment_samples: Option<usize>,
    pub concentration: ConcentrationBands,
    pub clock: ClockKind,
    /// Bounded queue between ingestion and processing
    pub queue_capacity: usize,
    /// How long a stopping session waits for a blocked source read
    pub shutdown_grace_seconds: f64,
}

impl SessionConfig {
    /// Continuous acquisition: 2 s rolling window, Welch snapshots
    pub fn sliding() -> Self {
        Self {
            sampling: SamplingConfig::new(250.0, 2.0),
            bands: FrequencyBand::eeg_bands(),
            acquisition_mode: AcquisitionMode::Sliding,
            spectral_mode: SpectralMode::Welch,
            snapshot_interval_seconds: 30.0,
            cooldown_seconds: 5.0,
            filter_order: DEFAULT_FILTER_ORDER,
            hop_samples: 1,
            max_buffer_samples: None,
            welch_segment_samples: None,
            concentration: ConcentrationBands::default(),
            clock: ClockKind::Wall,
            queue_capacity: 1024,
            shutdown_grace_seconds: 2.0,
        }
    }

    /// Segmented acquisition: 30 s segments, FFT magnitude per segment
    pub fn segment() -> Self {
        Self {
            sampling: SamplingConfig::new(250.0, 30.0),
            acquisition_mode: AcquisitionMode::Segment,
            spectral_mode: SpectralMode::Fft,
            ..Self::sliding()
        }
    }

    /// Preset matching an acquisition mode
    pub fn for_mode(mode: AcquisitionMode) -> Self {
        match mode {
            AcquisitionMode::Sliding => Self::sliding(),
            AcquisitionMode::Segment => Self::segment(),
        }
    }

    pub fn window_samples(&self) -> usize {
        self.sampling.window_samples()
    }

    /// Sliding-mode history cap
    pub fn buffer_capacity(&self) -> usize {
        self.max_buffer_samples.unwrap_or_else(|| self.window_samples())
    }

    pub fn welch_segment_len(&self) -> usize {
        self.welch_segment_samples.unwrap_or_else(|| self.window_samples() / 2)
    }

    /// Validate entire configuration
    pub fn validate(&self) -> FocusResult<()> {
        if self.filter_order == 0 {
            return Err(config_error!("filter_order must be at least 1"));
        }

        self.sampling.validate(self.filter_order)?;

        if self.bands.is_empty() {
            return Err(config_error!("at least one frequency band is required"));
        }

        let mut seen = HashSet::new();
        for band in &self.bands {
            band.validate(self.sampling.sampling_rate_hz)?;
            if !seen.insert(band.name.as_str()) {
                return Err(config_error!("duplicate band name '{}'", band.name));
            }
        }

        for name in [&self.concentration.focus_band, &self.concentration.relax_band] {
            if !seen.contains(name.as_str()) {
                return Err(FocusError::MissingBand { name: name.clone() });
            }
        }
        if self.concentration.focus_band == self.concentration.relax_band {
            return Err(config_error!("concentration bands must differ"));
        }

        if !(self.snapshot_interval_seconds.is_finite() && self.snapshot_interval_seconds > 0.0) {
            return Err(config_error!(
                "snapshot_interval_seconds must be positive, got {}",
                self.snapshot_interval_seconds
            ));
        }
        if !(self.cooldown_seconds.is_finite() && self.cooldown_seconds >= 0.0) {
            return Err(config_error!("cooldown_seconds must be non-negative, got {}", self.cooldown_seconds));
        }
        if !(self.shutdown_grace_seconds.is_finite() && self.shutdown_grace_seconds >= 0.0) {
            return Err(config_error!("shutdown_grace_seconds must be non-negative"));
        }

        if self.hop_samples == 0 {
            return Err(config_error!("hop_samples must be at least 1"));
        }
        if self.queue_capacity == 0 {
            return Err(config_error!("queue_capacity must be at least 1"));
        }

        let window = self.window_samples();
        if self.buffer_capacity() < window {
            return Err(config_error!(
                "max_buffer_samples ({}) must hold a full window of {} samples",
                self.buffer_capacity(),
                window
            ));
        }

        let segment = self.welch_segment_len();
        if segment < 2 || segment > window {
            return Err(config_error!(
                "welch_segment_samples must be within 2..={}, got {}",
                window,
                segment
            ));
        }

        Ok(())
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> FocusResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| FocusError::Serialization {
            reason: format!("Failed to serialize configuration: {}", e),
        })
    }

    /// Import configuration from JSON; missing fields take sliding defaults
    pub fn from_json(json: &str) -> FocusResult<Self> {
        serde_json::from_str(json).map_err(|e| FocusError::Serialization {
            reason: format!("Failed to deserialize configuration: {}", e),
        })
    }

    /// Read a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> FocusResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| FocusError::Serialization {
            reason: format!("Failed to read {}: {}", path.display(), e),
        })?;
        Self::from_json(&json)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::sliding()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(SessionConfig::sliding().validate().is_ok());
        assert!(SessionConfig::segment().validate().is_ok());

        assert_eq!(SessionConfig::sliding().window_samples(), 500);
        assert_eq!(SessionConfig::segment().window_samples(), 7500);
        assert_eq!(SessionConfig::for_mode(AcquisitionMode::Segment).spectral_mode, SpectralMode::Fft);
    }

    #[test]
    fn test_window_below_filter_support_rejected() {
        let mut config = SessionConfig::sliding();
        config.sampling = SamplingConfig::new(250.0, 0.01);

        assert_eq!(config.sampling.window_samples(), 3);
        assert_eq!(
            config.validate(),
            Err(FocusError::InsufficientSamples { required: 28, available: 3 })
        );
    }

    #[test]
    fn test_pad_len() {
        assert_eq!(zero_phase_pad_len(4), 27);
        assert_eq!(min_window_samples(4), 28);
    }

    #[test]
    fn test_band_errors() {
        let mut config = SessionConfig::sliding();
        config.bands.push(FrequencyBand::new("alpha", 9.0, 11.0));
        assert!(matches!(config.validate(), Err(FocusError::InvalidConfig { .. })));

        let mut config = SessionConfig::sliding();
        config.bands.retain(|b| b.name != "beta");
        assert_eq!(config.validate(), Err(FocusError::MissingBand { name: "beta".into() }));

        let mut config = SessionConfig::sliding();
        config.sampling.sampling_rate_hz = 60.0;
        assert!(matches!(config.validate(), Err(FocusError::InvalidBand { .. })));
    }

    #[test]
    fn test_scalar_limits() {
        let mut config = SessionConfig::sliding();
        config.hop_samples = 0;
        assert!(config.validate().is_err());

        let mut config = SessionConfig::sliding();
        config.max_buffer_samples = Some(100);
        assert!(config.validate().is_err());

        let mut config = SessionConfig::sliding();
        config.welch_segment_samples = Some(600);
        assert!(config.validate().is_err());

        let mut config = SessionConfig::sliding();
        config.snapshot_interval_seconds = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_serialization() {
        let config = SessionConfig::segment();
        let json = config.to_json().unwrap();
        assert!(json.contains("\"segment\""));

        let restored = SessionConfig::from_json(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SessionConfig::from_json(r#"{ "snapshot_interval_seconds": 10.0 }"#).unwrap();
        assert_eq!(config.snapshot_interval_seconds, 10.0);
        assert_eq!(config.acquisition_mode, AcquisitionMode::Sliding);
        assert_eq!(config.bands.len(), 5);
    }
}
