//! Acquisition session
//!
//! [`SessionController`] owns the buffer, the filter bank, the spectral
//! estimator and the time series. Samples go in through [`SessionController::ingest`];
//! snapshots come out of [`SessionController::poll_snapshot`]. Both are
//! synchronous. [`SessionController::run`] drives them from a
//! [`SampleSource`] read on a blocking task and handed over through a
//! bounded queue.

use crate::buffer::SampleBuffer;
use crate::filters::BandFilterBank;
use crate::normalizer::PowerNormalizer;
use crate::sink::PresentationSink;
use crate::spectral::{self, SpectralEstimator};
use focus_core::{
    parse_sample, AcquisitionMode, FocusError, FocusResult, FocusState, SampleSource, SessionClock,
    SessionConfig, SessionState, SessionSummary, SpectralSnapshot, TimeSeriesLog, WindowReport,
};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{timeout, Duration};
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// What the ingestion task forwards, in source order
#[derive(Debug, Clone, Copy, PartialEq)]
enum Ingested {
    Sample(f64),
    Malformed,
}

enum Next {
    Signal(bool),
    Item(Option<Ingested>),
}

/// Cooperative stop for a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    stop: Arc<watch::Sender<bool>>,
}

impl SessionHandle {
    /// Ask the session to stop after the current sample
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }
}

/// Streaming band-power session
pub struct SessionController<K: PresentationSink> {
    config: SessionConfig,
    buffer: SampleBuffer,
    bank: BandFilterBank,
    normalizer: PowerNormalizer,
    estimator: Box<dyn SpectralEstimator>,
    clock: SessionClock,
    sink: K,
    log: TimeSeriesLog,
    summary: SessionSummary,
    state: SessionState,
    /// Samples since the last sliding window
    pending: usize,
    last_snapshot_at: f64,
    /// Segment mode: the most recent segment not yet snapshotted
    last_segment: Option<Vec<f64>>,
    stop_tx: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
}

impl<K: PresentationSink> SessionController<K> {
    /// Validate the configuration and design every band filter
    pub fn new(config: SessionConfig, sink: K) -> FocusResult<Self> {
        config.validate()?;

        let bank = BandFilterBank::from_config(&config)?;
        let (stop_tx, stop_rx) = watch::channel(false);
        let session_id = Uuid::new_v4();
        debug!(
            session = %session_id,
            mode = ?config.acquisition_mode,
            window_samples = config.window_samples(),
            "session created"
        );

        Ok(Self {
            buffer: SampleBuffer::from_config(&config),
            normalizer: PowerNormalizer::new(config.concentration.clone()),
            estimator: spectral::for_mode(&config),
            clock: SessionClock::new(config.clock, config.sampling.sampling_rate_hz),
            bank,
            sink,
            log: TimeSeriesLog::new(),
            summary: SessionSummary::new(session_id),
            state: SessionState::Idle,
            pending: 0,
            last_snapshot_at: 0.0,
            last_segment: None,
            stop_tx: Arc::new(stop_tx),
            stop_rx,
            config,
        })
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            stop: Arc::clone(&self.stop_tx),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    pub fn log(&self) -> &TimeSeriesLog {
        &self.log
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "session state");
            self.state = next;
        }
    }

    fn elapsed(&mut self) -> f64 {
        self.clock.elapsed_seconds(self.summary.samples_ingested)
    }

    /// Add one parsed sample; returns the report when a window was processed
    pub fn ingest(&mut self, value: f64) -> FocusResult<Option<WindowReport>> {
        if self.state.is_terminal() {
            return Err(FocusError::InvalidOperation {
                reason: "session is stopped",
            });
        }

        self.summary.samples_ingested += 1;
        if self.state == SessionState::Idle {
            self.transition(SessionState::Filling);
        }
        self.buffer.push(value);

        match self.config.acquisition_mode {
            AcquisitionMode::Sliding => {
                self.pending += 1;
                if !self.buffer.is_ready() {
                    return Ok(None);
                }
                if self.summary.windows_processed > 0 && self.pending < self.config.hop_samples {
                    return Ok(None);
                }

                self.pending = 0;
                self.transition(SessionState::Ready);
                let window = self.buffer.snapshot();
                let result = self.process(&window);
                self.transition(SessionState::Filling);
                result.map(Some)
            }
            AcquisitionMode::Segment => {
                if !self.buffer.is_ready() {
                    return Ok(None);
                }

                self.transition(SessionState::Ready);
                let segment = self.buffer.consume()?;
                let result = self.process(&segment);
                self.last_segment = Some(segment);
                self.transition(SessionState::Idle);
                result.map(Some)
            }
        }
    }

    fn process(&mut self, window: &[f64]) -> FocusResult<WindowReport> {
        self.transition(SessionState::Processing);
        let elapsed_seconds = self.elapsed();

        let raw_powers = self.bank.compute(window)?;
        let band_powers = self.normalizer.normalize(&raw_powers)?;
        let concentration = self.normalizer.concentration(&band_powers)?;
        let alpha_power = band_powers.require(self.normalizer.relax_band())?;
        let beta_power = band_powers.require(self.normalizer.focus_band())?;

        self.summary.windows_processed += 1;
        let report = WindowReport {
            sequence: self.summary.windows_processed,
            elapsed_seconds,
            raw_powers,
            band_powers,
            alpha_power,
            beta_power,
            concentration,
            focus_state: FocusState::from_concentration(concentration),
        };

        self.log.append(report.to_record());
        self.sink.on_window(&report);
        Ok(report)
    }

    /// Emit a spectral snapshot if the interval has elapsed and a window
    /// is available
    pub fn poll_snapshot(&mut self) -> FocusResult<Option<SpectralSnapshot>> {
        let elapsed_seconds = self.elapsed();
        if elapsed_seconds - self.last_snapshot_at < self.config.snapshot_interval_seconds {
            return Ok(None);
        }

        let window = match self.config.acquisition_mode {
            AcquisitionMode::Sliding if self.buffer.is_ready() => self.buffer.snapshot(),
            AcquisitionMode::Sliding => return Ok(None),
            // Each segment is snapshotted at most once
            AcquisitionMode::Segment => match self.last_segment.take() {
                Some(segment) => segment,
                None => return Ok(None),
            },
        };

        let spectrum = self.estimator.estimate(&window)?;
        self.summary.snapshots_emitted += 1;
        self.last_snapshot_at = elapsed_seconds;

        let snapshot = SpectralSnapshot {
            sequence_number: self.summary.snapshots_emitted,
            elapsed_seconds,
            mode: self.estimator.mode(),
            spectrum,
        };
        self.sink.on_snapshot(&snapshot);
        Ok(Some(snapshot))
    }

    /// Enter the terminal state and report to the sink
    pub fn finish(&mut self) -> SessionSummary {
        if !self.state.is_terminal() {
            self.transition(SessionState::Stopped);
            self.summary.elapsed_seconds = self.elapsed();
            self.summary.final_state = SessionState::Stopped;
            self.sink.on_finish(&self.summary, &self.log);
        }
        self.summary.clone()
    }

    /// Feed one queued item: count malformed lines, process samples,
    /// emit due snapshots
    fn accept(&mut self, item: Ingested) -> FocusResult<bool> {
        match item {
            Ingested::Malformed => {
                self.summary.malformed_discarded += 1;
                Ok(false)
            }
            Ingested::Sample(value) => {
                self.ingest(value)?;
                Ok(self.poll_snapshot()?.is_some())
            }
        }
    }

    /// Pause after a snapshot; a stop request cuts it short
    async fn cooldown(&self, stop_rx: &mut watch::Receiver<bool>) {
        if self.config.cooldown_seconds <= 0.0 {
            return;
        }
        debug!(seconds = self.config.cooldown_seconds, "cooldown");

        let pause = tokio::time::sleep(Duration::from_secs_f64(self.config.cooldown_seconds));
        tokio::pin!(pause);
        loop {
            tokio::select! {
                _ = &mut pause => return,
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        return;
                    }
                }
            }
        }
    }

    /// Run until the source ends, a degenerate window is met, or the
    /// session is stopped through a [`SessionHandle`].
    ///
    /// Queued samples are drained and a due snapshot is flushed before
    /// returning. End of stream is reported as `SourceDisconnected`.
    pub async fn run<S: SampleSource + 'static>(&mut self, source: S) -> FocusResult<SessionSummary> {
        if self.state.is_terminal() {
            return Err(FocusError::InvalidOperation {
                reason: "session is stopped",
            });
        }
        if self.summary.samples_ingested == 0 {
            self.clock.reset();
        }

        let (tx, mut rx) = mpsc::channel(self.config.queue_capacity);
        let ingest_stop = self.stop_rx.clone();
        let ingestion = tokio::task::spawn_blocking(move || ingest_lines(source, tx, ingest_stop));

        let mut stop_rx = self.stop_rx.clone();
        let mut failure: Option<FocusError> = None;

        loop {
            if *stop_rx.borrow_and_update() {
                debug!("stop requested");
                break;
            }

            let next = tokio::select! {
                biased;
                changed = stop_rx.changed() => Next::Signal(changed.is_ok()),
                item = rx.recv() => Next::Item(item),
            };

            match next {
                Next::Signal(true) => continue,
                Next::Signal(false) => break,
                Next::Item(None) => break,
                Next::Item(Some(item)) => match self.accept(item) {
                    Ok(true) => self.cooldown(&mut stop_rx).await,
                    Ok(false) => {}
                    Err(e) => {
                        warn!(error = %e, "ending session");
                        failure = Some(e);
                        break;
                    }
                },
            }
        }

        // Orderly shutdown: no new samples. Queued ones are still processed
        // on stop or end of stream; after a failure they are discarded.
        self.stop_tx.send_replace(true);
        rx.close();
        let mut drained = 0usize;
        while let Ok(item) = rx.try_recv() {
            drained += 1;
            if failure.is_some() {
                continue;
            }
            if let Err(e) = self.accept(item) {
                debug!(error = %e, "error while draining");
                failure = Some(e);
            }
        }
        if drained > 0 {
            debug!(drained, "drained queued samples");
        }
        if failure.is_none() {
            if let Err(e) = self.poll_snapshot() {
                failure = Some(e);
            }
        }

        let grace = Duration::from_secs_f64(self.config.shutdown_grace_seconds);
        let ingestion_end = match timeout(grace, ingestion).await {
            Ok(Ok(end)) => end,
            Ok(Err(join_error)) => Some(FocusError::SourceDisconnected {
                reason: format!("ingestion task failed: {}", join_error),
            }),
            Err(_) => {
                warn!(
                    grace_seconds = self.config.shutdown_grace_seconds,
                    "sample source still blocked in a read; abandoning it"
                );
                None
            }
        };

        let summary = self.finish();
        match failure.or(ingestion_end) {
            Some(error) => Err(error),
            None => Ok(summary),
        }
    }
}

/// Blocking read loop. Returns why the source ended, or `None` when the
/// session stopped first. Closes the source exactly once.
fn ingest_lines<S: SampleSource>(
    mut source: S,
    tx: mpsc::Sender<Ingested>,
    stop: watch::Receiver<bool>,
) -> Option<FocusError> {
    let end = loop {
        if *stop.borrow() {
            break None;
        }

        let item = match source.next_line() {
            Ok(Some(line)) => match parse_sample(&line) {
                Ok(value) => Ingested::Sample(value),
                Err(e) => {
                    trace!(error = %e, "discarding line");
                    Ingested::Malformed
                }
            },
            Ok(None) => {
                break Some(FocusError::SourceDisconnected {
                    reason: "end of stream".to_string(),
                })
            }
            Err(e) => break Some(e),
        };

        if tx.blocking_send(item).is_err() {
            break None;
        }
    };

    source.close();
    debug!("sample source closed");
    end
}
