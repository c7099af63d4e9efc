//! Zero-phase Butterworth band filters
//!
//! Each band gets its own bandpass, designed once from an analog
//! Butterworth prototype (bandpass transform, pre-warped bilinear
//! transform) and stored as cascaded second-order sections. Windows are
//! filtered forward and backward with odd-extension padding and
//! steady-state initial conditions, so the output has no phase shift.

use focus_core::{
    zero_phase_pad_len, BandPowerSet, FocusError, FocusResult, FrequencyBand, SamplingConfig,
    SessionConfig, DEFAULT_FILTER_ORDER,
};
use num_complex::Complex64;
use std::f64::consts::PI;
use tracing::debug;

/// One second-order section in transposed direct form II.
///
/// `a[0]` is always 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Biquad {
    /// Section gain for a constant input
    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    /// Internal state after a unit step has settled
    fn steady_state(&self) -> [f64; 2] {
        let y = self.dc_gain();
        let z2 = self.b[2] - self.a[2] * y;
        let z1 = self.b[1] - self.a[1] * y + z2;
        [z1, z2]
    }

    fn response(&self, z1: Complex64) -> Complex64 {
        let z2 = z1 * z1;
        let num = z1 * self.b[1] + z2 * self.b[2] + self.b[0];
        let den = z1 * self.a[1] + z2 * self.a[2] + self.a[0];
        num / den
    }
}

/// Cascade of second-order sections
#[derive(Debug, Clone, PartialEq)]
pub struct SosFilter {
    sections: Vec<Biquad>,
}

impl SosFilter {
    pub fn new(sections: Vec<Biquad>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Edge padding used by [`SosFilter::filtfilt`]
    pub fn pad_len(&self) -> usize {
        zero_phase_pad_len(self.sections.len())
    }

    /// Per-section initial state for a unit step, scaled by the gain of
    /// the sections before it
    fn initial_state(&self) -> Vec<[f64; 2]> {
        let mut scale = 1.0;
        self.sections
            .iter()
            .map(|section| {
                let [z1, z2] = section.steady_state();
                let state = [z1 * scale, z2 * scale];
                scale *= section.dc_gain();
                state
            })
            .collect()
    }

    /// Run the cascade once, starting from `initial_state × first`
    fn run(&self, input: &[f64], first: f64, initial: &[[f64; 2]]) -> Vec<f64> {
        let mut output = input.to_vec();
        for (section, zi) in self.sections.iter().zip(initial) {
            let [b0, b1, b2] = section.b;
            let [_, a1, a2] = section.a;
            let mut z = [zi[0] * first, zi[1] * first];

            for value in output.iter_mut() {
                let x = *value;
                let y = b0 * x + z[0];
                z[0] = b1 * x - a1 * y + z[1];
                z[1] = b2 * x - a2 * y;
                *value = y;
            }
        }
        output
    }

    /// Single causal pass from rest
    pub fn filter(&self, input: &[f64]) -> Vec<f64> {
        let rest = vec![[0.0; 2]; self.sections.len()];
        self.run(input, 0.0, &rest)
    }

    /// Forward-backward filtering with odd-extension padding.
    ///
    /// Needs more than [`SosFilter::pad_len`] samples.
    pub fn filtfilt(&self, samples: &[f64]) -> FocusResult<Vec<f64>> {
        let pad = self.pad_len();
        if samples.len() <= pad {
            return Err(FocusError::InsufficientSamples {
                required: pad + 1,
                available: samples.len(),
            });
        }

        let extended = odd_extend(samples, pad);
        let initial = self.initial_state();

        let forward = self.run(&extended, extended[0], &initial);
        let reversed: Vec<f64> = forward.into_iter().rev().collect();
        let mut backward = self.run(&reversed, reversed[0], &initial);
        backward.reverse();

        Ok(backward[pad..pad + samples.len()].to_vec())
    }

    /// Gain at `freq_hz`
    pub fn magnitude_response(&self, freq_hz: f64, sampling_rate_hz: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz / sampling_rate_hz;
        let z1 = Complex64::from_polar(1.0, -omega);
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(z1))
            .norm()
    }
}

/// Point-symmetric extension of `n` samples at both ends
fn odd_extend(samples: &[f64], n: usize) -> Vec<f64> {
    let len = samples.len();
    let first = samples[0];
    let last = samples[len - 1];

    let mut extended = Vec::with_capacity(len + 2 * n);
    extended.extend((1..=n).rev().map(|i| 2.0 * first - samples[i]));
    extended.extend_from_slice(samples);
    extended.extend((1..=n).map(|i| 2.0 * last - samples[len - 1 - i]));
    extended
}

/// Mean-square power `Σx² / N`
pub fn mean_square(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|x| x * x).sum::<f64>() / samples.len() as f64
}

/// Butterworth bandpass for one frequency band
#[derive(Debug, Clone)]
pub struct ButterworthBandpass {
    band: FrequencyBand,
    order: usize,
    sampling_rate_hz: f64,
    sos: SosFilter,
}

impl ButterworthBandpass {
    /// Design an `order`-pole prototype bandpass (2 × `order` poles)
    pub fn design(band: &FrequencyBand, sampling_rate_hz: f64, order: usize) -> FocusResult<Self> {
        band.validate(sampling_rate_hz)?;
        if order == 0 {
            return Err(FocusError::FilterDesign {
                reason: "filter order must be at least 1".to_string(),
            });
        }

        let sos = design_bandpass_sos(order, band.low_hz, band.high_hz, sampling_rate_hz)?;
        debug!(
            band = %band.name,
            low_hz = band.low_hz,
            high_hz = band.high_hz,
            sections = sos.sections().len(),
            "designed bandpass"
        );

        Ok(Self {
            band: band.clone(),
            order,
            sampling_rate_hz,
            sos,
        })
    }

    pub fn band(&self) -> &FrequencyBand {
        &self.band
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn sos(&self) -> &SosFilter {
        &self.sos
    }

    pub fn filtfilt(&self, samples: &[f64]) -> FocusResult<Vec<f64>> {
        self.sos.filtfilt(samples)
    }

    /// Mean-square power of the zero-phase filtered window
    pub fn band_power(&self, samples: &[f64]) -> FocusResult<f64> {
        Ok(mean_square(&self.filtfilt(samples)?))
    }

    pub fn magnitude_response(&self, freq_hz: f64) -> f64 {
        self.sos.magnitude_response(freq_hz, self.sampling_rate_hz)
    }
}

fn design_bandpass_sos(order: usize, low_hz: f64, high_hz: f64, sampling_rate_hz: f64) -> FocusResult<SosFilter> {
    let n = order as i32;
    let nyquist = sampling_rate_hz / 2.0;
    let four = Complex64::new(4.0, 0.0);

    // Pre-warped edges on a sampling rate normalized to 2
    let warp = |f: f64| 4.0 * (PI * (f / nyquist) / 2.0).tan();
    let wl = warp(low_hz);
    let wh = warp(high_hz);
    let bw = wh - wl;
    let w0 = (wl * wh).sqrt();

    // Lowpass prototype poles mapped to bandpass pole pairs
    let mut analog = Vec::with_capacity(2 * order);
    for m in (-(n - 1)..n).step_by(2) {
        let proto = -Complex64::from_polar(1.0, PI * m as f64 / (2.0 * n as f64));
        let lp = proto * (bw / 2.0);
        let offset = (lp * lp - w0 * w0).sqrt();
        analog.push(lp + offset);
        analog.push(lp - offset);
    }

    // Bilinear transform; the order zeros at s = 0 land on z = 1, the
    // rest on z = -1
    let denom = analog.iter().fold(Complex64::new(1.0, 0.0), |acc, p| acc * (four - p));
    let gain = bw.powi(n) * (Complex64::new(4f64.powi(n), 0.0) / denom).re;
    let digital: Vec<Complex64> = analog.iter().map(|p| (four + p) / (four - p)).collect();

    let tolerance = 1e-10;
    let mut sections = Vec::with_capacity(order);
    let mut real_poles = Vec::new();
    for pole in &digital {
        if pole.im > tolerance {
            sections.push(Biquad {
                b: [1.0, 0.0, -1.0],
                a: [1.0, -2.0 * pole.re, pole.norm_sqr()],
            });
        } else if pole.im.abs() <= tolerance {
            real_poles.push(pole.re);
        }
    }
    for pair in real_poles.chunks(2) {
        match pair {
            [r1, r2] => sections.push(Biquad {
                b: [1.0, 0.0, -1.0],
                a: [1.0, -(r1 + r2), r1 * r2],
            }),
            _ => {
                return Err(FocusError::FilterDesign {
                    reason: "unpaired real pole".to_string(),
                })
            }
        }
    }

    if sections.len() != order {
        return Err(FocusError::FilterDesign {
            reason: format!("expected {} sections, built {}", order, sections.len()),
        });
    }
    if let Some(first) = sections.first_mut() {
        first.b = [gain, 0.0, -gain];
    }

    let finite = sections
        .iter()
        .all(|s| s.b.iter().chain(&s.a).all(|c| c.is_finite()));
    if !finite || !gain.is_finite() {
        return Err(FocusError::FilterDesign {
            reason: format!("non-finite coefficients for {}-{}Hz", low_hz, high_hz),
        });
    }

    Ok(SosFilter::new(sections))
}

/// Independent bandpass per configured band
#[derive(Debug, Clone)]
pub struct BandFilterBank {
    filters: Vec<ButterworthBandpass>,
}

impl BandFilterBank {
    pub fn new(bands: &[FrequencyBand], sampling_rate_hz: f64, order: usize) -> FocusResult<Self> {
        let filters = bands
            .iter()
            .map(|band| ButterworthBandpass::design(band, sampling_rate_hz, order))
            .collect::<FocusResult<Vec<_>>>()?;
        Ok(Self { filters })
    }

    pub fn from_config(config: &SessionConfig) -> FocusResult<Self> {
        Self::new(&config.bands, config.sampling.sampling_rate_hz, config.filter_order)
    }

    pub fn filters(&self) -> &[ButterworthBandpass] {
        &self.filters
    }

    /// Raw power per band, in band order
    pub fn compute(&self, samples: &[f64]) -> FocusResult<BandPowerSet> {
        let mut powers = BandPowerSet::with_capacity(self.filters.len());
        for filter in &self.filters {
            powers.insert(filter.band().name.clone(), filter.band_power(samples)?);
        }
        Ok(powers)
    }
}

/// One-shot band powers with the default filter order
pub fn compute_band_powers(
    samples: &[f64],
    sampling: &SamplingConfig,
    bands: &[FrequencyBand],
) -> FocusResult<BandPowerSet> {
    BandFilterBank::new(bands, sampling.sampling_rate_hz, DEFAULT_FILTER_ORDER)?.compute(samples)
}
