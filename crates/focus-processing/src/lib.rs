//! Focus-Processing: band power, spectra and the acquisition session
//!
//! Sample buffering, zero-phase band filters, power normalization,
//! spectral snapshots and the session controller that ties them to a
//! sample source and a presentation sink.

pub mod buffer;
pub mod filters;
pub mod normalizer;
pub mod session;
pub mod sink;
pub mod spectral;

pub use buffer::{PushOutcome, SampleBuffer};
pub use filters::{compute_band_powers, BandFilterBank, Biquad, ButterworthBandpass, SosFilter};
pub use normalizer::{normalize, PowerNormalizer};
pub use session::{SessionController, SessionHandle};
pub use sink::{BroadcastSink, PresentationSink, SessionEvent, Tee, TracingSink};
pub use spectral::{FftMagnitude, SpectralEstimator, WelchPsd};
