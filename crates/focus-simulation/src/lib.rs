//! Focus-Simulation: synthetic EEG generation
//!
//! Rhythm patterns, a seeded single-channel simulator and a sample source
//! that stands in for a serial EEG link.

pub mod eeg_simulator;
pub mod signal_patterns;
pub mod synthetic_source;

pub use eeg_simulator::*;
pub use signal_patterns::*;
pub use synthetic_source::*;
