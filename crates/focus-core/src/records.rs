//! Records produced by a session: per-window reports, spectral
//! snapshots, the concentration time series and the final summary.

use crate::config::SpectralMode;
use crate::power::{BandPowerSet, NormalizedPowerSet};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Full-spectrum estimate of one window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    /// Ascending, non-negative bin frequencies in Hz
    pub frequencies: Vec<f64>,
    /// Magnitude or density per bin, same length as `frequencies`
    pub magnitudes: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequency of the largest bin, skipping DC
    pub fn peak_frequency(&self) -> Option<f64> {
        self.frequencies
            .iter()
            .zip(&self.magnitudes)
            .skip(1)
            .fold(None, |best: Option<(f64, f64)>, (&f, &m)| match best {
                Some((_, top)) if top >= m => best,
                _ => Some((f, m)),
            })
            .map(|(f, _)| f)
    }
}

/// Spectrum emitted on the snapshot cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralSnapshot {
    /// 1-based, strictly increasing within a session
    pub sequence_number: u64,
    pub elapsed_seconds: f64,
    pub mode: SpectralMode,
    pub spectrum: Spectrum,
}

impl SpectralSnapshot {
    pub fn frequencies(&self) -> &[f64] {
        &self.spectrum.frequencies
    }

    pub fn magnitudes(&self) -> &[f64] {
        &self.spectrum.magnitudes
    }
}

/// Coarse reading of the concentration ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusState {
    /// Focus band outweighs relax band
    Concentrated,
    Relaxed,
}

impl FocusState {
    pub fn from_concentration(concentration: f64) -> Self {
        if concentration > 0.5 {
            FocusState::Concentrated
        } else {
            FocusState::Relaxed
        }
    }
}

impl std::fmt::Display for FocusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FocusState::Concentrated => write!(f, "concentrated"),
            FocusState::Relaxed => write!(f, "relaxed"),
        }
    }
}

/// Result of processing one analysis window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowReport {
    /// 1-based window counter
    pub sequence: u64,
    pub elapsed_seconds: f64,
    pub raw_powers: BandPowerSet,
    pub band_powers: NormalizedPowerSet,
    /// Normalized relax-band share
    pub alpha_power: f64,
    /// Normalized focus-band share
    pub beta_power: f64,
    pub concentration: f64,
    pub focus_state: FocusState,
}

impl WindowReport {
    pub fn to_record(&self) -> TimeSeriesRecord {
        TimeSeriesRecord {
            elapsed_seconds: self.elapsed_seconds,
            alpha_power: self.alpha_power,
            beta_power: self.beta_power,
            concentration: self.concentration,
        }
    }
}

/// One row of the concentration time series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    pub elapsed_seconds: f64,
    pub alpha_power: f64,
    pub beta_power: f64,
    pub concentration: f64,
}

/// Append-only concentration history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesLog {
    records: Vec<TimeSeriesRecord>,
}

impl TimeSeriesLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: TimeSeriesRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[TimeSeriesRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&TimeSeriesRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mean concentration over the whole log
    pub fn mean_concentration(&self) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        let sum: f64 = self.records.iter().map(|r| r.concentration).sum();
        Some(sum / self.records.len() as f64)
    }
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    /// Accumulating samples toward a full window
    Filling,
    /// A full window is available
    Ready,
    Processing,
    /// Terminal
    Stopped,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Stopped)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Filling => "filling",
            SessionState::Ready => "ready",
            SessionState::Processing => "processing",
            SessionState::Stopped => "stopped",
        };
        write!(f, "{}", name)
    }
}

/// Counters reported when a session ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub samples_ingested: u64,
    pub malformed_discarded: u64,
    pub windows_processed: u64,
    pub snapshots_emitted: u64,
    pub elapsed_seconds: f64,
    pub final_state: SessionState,
}

impl SessionSummary {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            samples_ingested: 0,
            malformed_discarded: 0,
            windows_processed: 0,
            snapshots_emitted: 0,
            elapsed_seconds: 0.0,
            final_state: SessionState::Idle,
        }
    }
}
