//! Full-spectrum estimates for snapshots

use focus_core::{FocusError, FocusResult, SessionConfig, SpectralMode, Spectrum};
use realfft::RealFftPlanner;
use rustfft::{num_complex::Complex, FftPlanner};
use std::f64::consts::PI;

/// Stateless spectrum estimator over one analysis window
pub trait SpectralEstimator: Send + Sync {
    fn mode(&self) -> SpectralMode;

    fn estimate(&self, samples: &[f64]) -> FocusResult<Spectrum>;
}

/// Build the estimator selected by the configuration
pub fn for_mode(config: &SessionConfig) -> Box<dyn SpectralEstimator> {
    let rate = config.sampling.sampling_rate_hz;
    match config.spectral_mode {
        SpectralMode::Fft => Box::new(FftMagnitude::new(rate)),
        SpectralMode::Welch => Box::new(WelchPsd::new(rate, config.welch_segment_len())),
    }
}

/// Magnitude of the DFT of the whole window; no windowing, detrending
/// or scaling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FftMagnitude {
    sampling_rate_hz: f64,
}

impl FftMagnitude {
    pub fn new(sampling_rate_hz: f64) -> Self {
        Self { sampling_rate_hz }
    }
}

impl SpectralEstimator for FftMagnitude {
    fn mode(&self) -> SpectralMode {
        SpectralMode::Fft
    }

    fn estimate(&self, samples: &[f64]) -> FocusResult<Spectrum> {
        let n = samples.len();
        if n < 2 {
            return Err(FocusError::InsufficientSamples { required: 2, available: n });
        }

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n);

        let mut buffer: Vec<Complex<f64>> = samples.iter().map(|&x| Complex::new(x, 0.0)).collect();
        fft.process(&mut buffer);

        let bins = n / 2;
        let resolution = self.sampling_rate_hz / n as f64;
        Ok(Spectrum {
            frequencies: (0..bins).map(|k| k as f64 * resolution).collect(),
            magnitudes: buffer[..bins].iter().map(|c| c.norm()).collect(),
        })
    }
}

/// Welch-averaged one-sided power spectral density in V²/Hz.
///
/// Periodic Hann window, 50% overlap, per-segment mean removal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WelchPsd {
    sampling_rate_hz: f64,
    segment_len: usize,
}

impl WelchPsd {
    pub fn new(sampling_rate_hz: f64, segment_len: usize) -> Self {
        Self { sampling_rate_hz, segment_len }
    }

    pub fn segment_len(&self) -> usize {
        self.segment_len
    }
}

fn hann_periodic(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / len as f64).cos())
        .collect()
}

impl SpectralEstimator for WelchPsd {
    fn mode(&self) -> SpectralMode {
        SpectralMode::Welch
    }

    fn estimate(&self, samples: &[f64]) -> FocusResult<Spectrum> {
        // Segments longer than the window shrink to the window
        let nperseg = self.segment_len.min(samples.len());
        if nperseg < 2 {
            return Err(FocusError::InsufficientSamples { required: 2, available: samples.len() });
        }
        let step = nperseg - nperseg / 2;

        let window = hann_periodic(nperseg);
        let scale = 1.0 / (self.sampling_rate_hz * window.iter().map(|w| w * w).sum::<f64>());

        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(nperseg);
        let mut input = r2c.make_input_vec();
        let mut output = r2c.make_output_vec();
        let bins = output.len();

        let mut density = vec![0.0; bins];
        let mut segments = 0usize;
        for start in (0..=samples.len() - nperseg).step_by(step) {
            let segment = &samples[start..start + nperseg];
            let mean = segment.iter().sum::<f64>() / nperseg as f64;
            for ((slot, &x), w) in input.iter_mut().zip(segment).zip(&window) {
                *slot = (x - mean) * w;
            }

            r2c.process(&mut input, &mut output)
                .map_err(|_| FocusError::InvalidOperation { reason: "fft buffer length mismatch" })?;

            for (acc, c) in density.iter_mut().zip(&output) {
                *acc += c.norm_sqr();
            }
            segments += 1;
        }

        // One-sided: double everything except DC and, for even lengths,
        // the Nyquist bin
        let doubled_end = if nperseg % 2 == 0 { bins - 1 } else { bins };
        let norm = scale / segments as f64;
        for (k, value) in density.iter_mut().enumerate() {
            *value *= norm;
            if k > 0 && k < doubled_end {
                *value *= 2.0;
            }
        }

        let resolution = self.sampling_rate_hz / nperseg as f64;
        Ok(Spectrum {
            frequencies: (0..bins).map(|k| k as f64 * resolution).collect(),
            magnitudes: density,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 250.0;

    fn sine(freq_hz: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * freq_hz * i as f64 / FS).sin())
            .collect()
    }

    fn peak_index(values: &[f64]) -> usize {
        values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn test_fft_peak_bin() {
        let spectrum = FftMagnitude::new(FS).estimate(&sine(10.0, 500)).unwrap();

        assert_eq!(spectrum.len(), 250);
        assert_eq!(spectrum.frequencies[1], 0.5);
        assert_eq!(peak_index(&spectrum.magnitudes), 20);
        assert!((spectrum.frequencies[20] - 10.0).abs() <= FS / 500.0);
        // Unnormalized: a unit sine over N samples peaks near N/2
        assert!((spectrum.magnitudes[20] - 250.0).abs() < 1e-6);
    }

    #[test]
    fn test_fft_odd_length() {
        let spectrum = FftMagnitude::new(FS).estimate(&sine(25.0, 101)).unwrap();
        assert_eq!(spectrum.len(), 50);
        assert!(spectrum.frequencies.windows(2).all(|w| w[1] > w[0]));
        assert!(FftMagnitude::new(FS).estimate(&[1.0]).is_err());
    }

    #[test]
    fn test_welch_peak_and_length() {
        let spectrum = WelchPsd::new(FS, 250).estimate(&sine(10.0, 500)).unwrap();

        assert_eq!(spectrum.len(), 126);
        assert_eq!(spectrum.frequencies.last().copied(), Some(125.0));
        assert_eq!(peak_index(&spectrum.magnitudes), 10);
        assert_eq!(spectrum.frequencies[10], 10.0);
    }

    #[test]
    fn test_welch_density_integrates_to_power() {
        let spectrum = WelchPsd::new(FS, 250).estimate(&sine(10.0, 500)).unwrap();
        let df = spectrum.frequencies[1];
        let power: f64 = spectrum.magnitudes.iter().sum::<f64>() * df;
        assert!((power - 0.5).abs() < 0.025, "power {}", power);
    }

    #[test]
    fn test_welch_removes_offset() {
        let shifted: Vec<f64> = sine(10.0, 500).into_iter().map(|x| x + 100.0).collect();
        let spectrum = WelchPsd::new(FS, 250).estimate(&shifted).unwrap();
        assert!(spectrum.magnitudes[0] < 1e-6);
    }

    #[test]
    fn test_welch_segment_clamped_to_window() {
        let spectrum = WelchPsd::new(FS, 1000).estimate(&sine(10.0, 100)).unwrap();
        assert_eq!(spectrum.len(), 51);
    }

    #[test]
    fn test_for_mode() {
        assert_eq!(for_mode(&SessionConfig::sliding()).mode(), SpectralMode::Welch);
        assert_eq!(for_mode(&SessionConfig::segment()).mode(), SpectralMode::Fft);
    }
}
