//! Pre-defined EEG rhythm patterns for simulation

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Amplitude of each canonical rhythm at one instant
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RhythmMix {
    pub delta: f64,
    pub theta: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl RhythmMix {
    /// Eyes-closed rest: alpha dominant
    pub const RELAXED: RhythmMix = RhythmMix {
        delta: 0.2,
        theta: 0.3,
        alpha: 1.0,
        beta: 0.25,
        gamma: 0.05,
    };

    /// Task engagement: beta dominant
    pub const FOCUSED: RhythmMix = RhythmMix {
        delta: 0.2,
        theta: 0.2,
        alpha: 0.3,
        beta: 1.0,
        gamma: 0.1,
    };

    /// Linear blend, `weight` 0 gives `self`, 1 gives `other`
    pub fn blend(&self, other: &RhythmMix, weight: f64) -> RhythmMix {
        let w = weight.clamp(0.0, 1.0);
        let mix = |a: f64, b: f64| a * (1.0 - w) + b * w;
        RhythmMix {
            delta: mix(self.delta, other.delta),
            theta: mix(self.theta, other.theta),
            alpha: mix(self.alpha, other.alpha),
            beta: mix(self.beta, other.beta),
            gamma: mix(self.gamma, other.gamma),
        }
    }

    pub fn scale(&self, factor: f64) -> RhythmMix {
        RhythmMix {
            delta: self.delta * factor,
            theta: self.theta * factor,
            alpha: self.alpha * factor,
            beta: self.beta * factor,
            gamma: self.gamma * factor,
        }
    }

    /// Sum of one sine per rhythm, placed well inside each band
    pub fn value_at(&self, time: f64) -> f64 {
        let tone = |freq: f64, phase: f64| (2.0 * PI * freq * time + phase).sin();
        self.delta * tone(2.0, 0.0)
            + self.theta * tone(6.0, 0.7)
            + self.alpha * tone(10.0, 1.3)
            + self.beta * tone(20.0, 2.1)
            + self.gamma * tone(35.0, 0.4)
    }
}

/// Predefined EEG signal patterns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalPattern {
    /// Single sinusoid
    PureTone { frequency_hz: f64, amplitude: f64 },
    /// Alpha-dominant rest
    Relaxed { scale: f64 },
    /// Beta-dominant engagement
    Focused { scale: f64 },
    /// Relaxed for the first half of each period, focused for the second
    Alternating { period_seconds: f64, scale: f64 },
    /// Gradual shift from relaxed to focused
    Transition { duration_seconds: f64, scale: f64 },
    /// No signal at all
    Flat,
}

impl SignalPattern {
    /// Rhythm amplitudes at `time`, `None` for patterns that are not
    /// built from the canonical rhythms
    pub fn mix_at(&self, time: f64) -> Option<RhythmMix> {
        match *self {
            SignalPattern::Relaxed { scale } => Some(RhythmMix::RELAXED.scale(scale)),
            SignalPattern::Focused { scale } => Some(RhythmMix::FOCUSED.scale(scale)),
            SignalPattern::Alternating { period_seconds, scale } => {
                let phase = time.rem_euclid(period_seconds);
                let mix = if phase < period_seconds / 2.0 {
                    RhythmMix::RELAXED
                } else {
                    RhythmMix::FOCUSED
                };
                Some(mix.scale(scale))
            }
            SignalPattern::Transition { duration_seconds, scale } => {
                let weight = if duration_seconds > 0.0 { time / duration_seconds } else { 1.0 };
                Some(RhythmMix::RELAXED.blend(&RhythmMix::FOCUSED, weight).scale(scale))
            }
            SignalPattern::PureTone { .. } | SignalPattern::Flat => None,
        }
    }

    /// Noise-free signal value at `time` seconds
    pub fn value_at(&self, time: f64) -> f64 {
        match *self {
            SignalPattern::PureTone { frequency_hz, amplitude } => {
                amplitude * (2.0 * PI * frequency_hz * time).sin()
            }
            SignalPattern::Flat => 0.0,
            _ => self.mix_at(time).map(|mix| mix.value_at(time)).unwrap_or(0.0),
        }
    }

    /// Get pattern description
    pub fn description(&self) -> &'static str {
        match self {
            SignalPattern::PureTone { .. } => "Pure tone",
            SignalPattern::Relaxed { .. } => "Relaxed, alpha dominant",
            SignalPattern::Focused { .. } => "Focused, beta dominant",
            SignalPattern::Alternating { .. } => "Alternating relaxed and focused",
            SignalPattern::Transition { .. } => "Gradual shift toward focus",
            SignalPattern::Flat => "Flat line",
        }
    }

    /// Create common preset patterns
    pub fn presets() -> Vec<(&'static str, SignalPattern)> {
        vec![
            ("alpha-tone", SignalPattern::PureTone { frequency_hz: 10.0, amplitude: 1.0 }),
            ("beta-tone", SignalPattern::PureTone { frequency_hz: 20.0, amplitude: 1.0 }),
            ("relaxed", SignalPattern::Relaxed { scale: 1.0 }),
            ("focused", SignalPattern::Focused { scale: 1.0 }),
            ("alternating", SignalPattern::Alternating { period_seconds: 60.0, scale: 1.0 }),
            ("transition", SignalPattern::Transition { duration_seconds: 120.0, scale: 1.0 }),
            ("flat", SignalPattern::Flat),
        ]
    }

    /// Look up a preset by name, ignoring case
    pub fn preset(name: &str) -> Option<SignalPattern> {
        Self::presets()
            .into_iter()
            .find(|(preset, _)| preset.eq_ignore_ascii_case(name.trim()))
            .map(|(_, pattern)| pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_tone() {
        let tone = SignalPattern::PureTone { frequency_hz: 10.0, amplitude: 2.0 };
        assert!(tone.value_at(0.0).abs() < 1e-12);
        assert!((tone.value_at(0.025) - 2.0).abs() < 1e-9);
        assert_eq!(SignalPattern::Flat.value_at(3.0), 0.0);
    }

    #[test]
    fn test_alternating_switches_halfway() {
        let pattern = SignalPattern::Alternating { period_seconds: 10.0, scale: 1.0 };
        assert_eq!(pattern.mix_at(1.0), Some(RhythmMix::RELAXED));
        assert_eq!(pattern.mix_at(6.0), Some(RhythmMix::FOCUSED));
        assert_eq!(pattern.mix_at(11.0), Some(RhythmMix::RELAXED));
    }

    #[test]
    fn test_transition_reaches_focus() {
        let pattern = SignalPattern::Transition { duration_seconds: 10.0, scale: 1.0 };
        assert_eq!(pattern.mix_at(0.0), Some(RhythmMix::RELAXED));
        assert_eq!(pattern.mix_at(20.0), Some(RhythmMix::FOCUSED));

        let halfway = pattern.mix_at(5.0).unwrap();
        assert!((halfway.alpha - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(SignalPattern::preset(" Relaxed "), Some(SignalPattern::Relaxed { scale: 1.0 }));
        assert_eq!(SignalPattern::preset("unknown"), None);

        for (name, pattern) in SignalPattern::presets() {
            assert_eq!(SignalPattern::preset(name), Some(pattern));
            assert!(!pattern.description().is_empty());
        }
    }

    #[test]
    fn test_pattern_json() {
        let pattern = SignalPattern::Alternating { period_seconds: 30.0, scale: 2.0 };
        let json = serde_json::to_string(&pattern).unwrap();
        assert!(json.contains("\"type\":\"alternating\""));
        assert_eq!(serde_json::from_str::<SignalPattern>(&json).unwrap(), pattern);
    }
}
