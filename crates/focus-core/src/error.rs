//! Error handling for the focus engine
//!
//! One error type covers the whole acquisition path, from a malformed
//! source line up to a degenerate signal reported by the normalizer.

use core::fmt;

/// Result type alias for focus engine operations
pub type FocusResult<T> = Result<T, FocusError>;

/// Error type for all focus engine operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum FocusError {
    /// A source line could not be parsed as a finite number
    MalformedSample {
        /// The offending token, already trimmed
        token: String,
    },

    /// Window too short for zero-phase filtering
    InsufficientSamples {
        /// Minimum number of samples the filter needs
        required: usize,
        /// Number of samples that were provided
        available: usize,
    },

    /// Every band power was exactly zero (flat line)
    ZeroTotalPower,

    /// Alpha + beta power is zero, so the ratio has no value
    UndefinedConcentration,

    /// A band referenced by name is not part of the power set
    MissingBand {
        /// Name that was looked up
        name: String,
    },

    /// The sample source ended or failed
    SourceDisconnected {
        /// What happened to the link
        reason: String,
    },

    /// Configuration rejected at startup
    InvalidConfig {
        /// Description of the configuration error
        reason: String,
    },

    /// Band edges violate `0 < low < high < nyquist`
    InvalidBand {
        /// Band name
        name: String,
        /// Lower edge in Hz
        low_hz: f64,
        /// Upper edge in Hz
        high_hz: f64,
        /// Nyquist frequency of the configured sampling rate
        nyquist_hz: f64,
    },

    /// Filter coefficients could not be produced
    FilterDesign {
        /// Description of the design failure
        reason: String,
    },

    /// Operation not allowed in the current mode or state
    InvalidOperation {
        /// Why the call was refused
        reason: &'static str,
    },

    /// Configuration (de)serialization failure
    Serialization {
        /// Serializer message
        reason: String,
    },
}

impl fmt::Display for FocusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FocusError::MalformedSample { token } => {
                write!(f, "Malformed sample: {:?} is not a number", token)
            }
            FocusError::InsufficientSamples { required, available } => {
                write!(f, "Insufficient samples: filter needs at least {}, window has {}",
                       required, available)
            }
            FocusError::ZeroTotalPower => {
                write!(f, "Total band power is zero; cannot normalize")
            }
            FocusError::UndefinedConcentration => {
                write!(f, "Concentration undefined: alpha + beta power is zero")
            }
            FocusError::MissingBand { name } => {
                write!(f, "Band '{}' is not configured", name)
            }
            FocusError::SourceDisconnected { reason } => {
                write!(f, "Sample source disconnected: {}", reason)
            }
            FocusError::InvalidConfig { reason } => {
                write!(f, "Invalid configuration: {}", reason)
            }
            FocusError::InvalidBand { name, low_hz, high_hz, nyquist_hz } => {
                write!(f, "Invalid band '{}': {}-{}Hz must satisfy 0 < low < high < {}Hz",
                       name, low_hz, high_hz, nyquist_hz)
            }
            FocusError::FilterDesign { reason } => {
                write!(f, "Filter design failed: {}", reason)
            }
            FocusError::InvalidOperation { reason } => {
                write!(f, "Invalid operation: {}", reason)
            }
            FocusError::Serialization { reason } => {
                write!(f, "Serialization error: {}", reason)
            }
        }
    }
}

impl std::error::Error for FocusError {}

impl FocusError {
    /// Degenerate-signal errors end a session but say nothing about the link
    pub fn is_degenerate_signal(&self) -> bool {
        matches!(self, FocusError::ZeroTotalPower | FocusError::UndefinedConcentration)
    }
}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)+) => {
        $crate::error::FocusError::InvalidConfig {
            reason: format!($($arg)+),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = FocusError::InsufficientSamples {
            required: 28,
            available: 3,
        };
        let display = format!("{}", error);
        assert!(display.contains("Insufficient samples"));
        assert!(display.contains("28"));
        assert!(display.contains("3"));
    }

    #[test]
    fn test_config_error_macro() {
        let error = config_error!("hop_samples must be at least {}", 1);
        assert_eq!(error, FocusError::InvalidConfig {
            reason: "hop_samples must be at least 1".to_string(),
        });
    }

    #[test]
    fn test_degenerate_classification() {
        assert!(FocusError::ZeroTotalPower.is_degenerate_signal());
        assert!(FocusError::UndefinedConcentration.is_degenerate_signal());
        assert!(!FocusError::SourceDisconnected { reason: "eof".into() }.is_degenerate_signal());
    }
}
