//! Focus-Core: foundation types for EEG band-power analysis
//!
//! Bands, configuration, power sets, session records, sample sources
//! and the shared error type.

pub mod band;
pub mod clock;
pub mod config;
pub mod error;
pub mod power;
pub mod records;
pub mod source;

pub use band::{FrequencyBand, ALPHA, BETA};
pub use clock::SessionClock;
pub use config::*;
pub use error::{FocusError, FocusResult};
pub use power::{BandPowerSet, NormalizedPowerSet};
pub use records::*;
pub use source::{parse_sample, LineSource, ManualSource, SampleSource};
