//! Presentation sinks: where window reports, snapshots and the final
//! summary go

use focus_core::{SessionSummary, SpectralSnapshot, TimeSeriesLog, WindowReport};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::info;

/// Everything a session publishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Window(WindowReport),
    Snapshot(SpectralSnapshot),
    Finished {
        summary: SessionSummary,
        log: TimeSeriesLog,
    },
}

/// Receiver of session output
pub trait PresentationSink: Send {
    fn on_window(&mut self, report: &WindowReport);

    fn on_snapshot(&mut self, snapshot: &SpectralSnapshot);

    fn on_finish(&mut self, _summary: &SessionSummary, _log: &TimeSeriesLog) {}
}

/// Logs one line per window and per snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl PresentationSink for TracingSink {
    fn on_window(&mut self, report: &WindowReport) {
        info!(
            "Time: {:.2}s | Alpha: {:.4} | Beta: {:.4} | Concentration: {:.2} ({})",
            report.elapsed_seconds,
            report.alpha_power,
            report.beta_power,
            report.concentration,
            report.focus_state
        );
    }

    fn on_snapshot(&mut self, snapshot: &SpectralSnapshot) {
        info!(
            sequence = snapshot.sequence_number,
            mode = ?snapshot.mode,
            bins = snapshot.spectrum.len(),
            peak_hz = snapshot.spectrum.peak_frequency().unwrap_or(0.0),
            "Spectral snapshot at {:.2}s",
            snapshot.elapsed_seconds
        );
    }

    fn on_finish(&mut self, summary: &SessionSummary, log: &TimeSeriesLog) {
        info!(
            session = %summary.session_id,
            windows = summary.windows_processed,
            snapshots = summary.snapshots_emitted,
            malformed = summary.malformed_discarded,
            mean_concentration = log.mean_concentration().unwrap_or(0.0),
            "Session {} after {:.2}s",
            summary.final_state,
            summary.elapsed_seconds
        );
    }
}

/// Fans events out to any number of subscribers
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<SessionEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }
}

impl PresentationSink for BroadcastSink {
    fn on_window(&mut self, report: &WindowReport) {
        self.publish(SessionEvent::Window(report.clone()));
    }

    fn on_snapshot(&mut self, snapshot: &SpectralSnapshot) {
        self.publish(SessionEvent::Snapshot(snapshot.clone()));
    }

    fn on_finish(&mut self, summary: &SessionSummary, log: &TimeSeriesLog) {
        self.publish(SessionEvent::Finished {
            summary: summary.clone(),
            log: log.clone(),
        });
    }
}

/// Collects events in memory
impl PresentationSink for Vec<SessionEvent> {
    fn on_window(&mut self, report: &WindowReport) {
        self.push(SessionEvent::Window(report.clone()));
    }

    fn on_snapshot(&mut self, snapshot: &SpectralSnapshot) {
        self.push(SessionEvent::Snapshot(snapshot.clone()));
    }

    fn on_finish(&mut self, summary: &SessionSummary, log: &TimeSeriesLog) {
        self.push(SessionEvent::Finished {
            summary: summary.clone(),
            log: log.clone(),
        });
    }
}

impl<S: PresentationSink + ?Sized> PresentationSink for Box<S> {
    fn on_window(&mut self, report: &WindowReport) {
        (**self).on_window(report)
    }

    fn on_snapshot(&mut self, snapshot: &SpectralSnapshot) {
        (**self).on_snapshot(snapshot)
    }

    fn on_finish(&mut self, summary: &SessionSummary, log: &TimeSeriesLog) {
        (**self).on_finish(summary, log)
    }
}

/// Sends every event to both sinks
#[derive(Debug, Clone)]
pub struct Tee<A, B>(pub A, pub B);

impl<A: PresentationSink, B: PresentationSink> PresentationSink for Tee<A, B> {
    fn on_window(&mut self, report: &WindowReport) {
        self.0.on_window(report);
        self.1.on_window(report);
    }

    fn on_snapshot(&mut self, snapshot: &SpectralSnapshot) {
        self.0.on_snapshot(snapshot);
        self.1.on_snapshot(snapshot);
    }

    fn on_finish(&mut self, summary: &SessionSummary, log: &TimeSeriesLog) {
        self.0.on_finish(summary, log);
        self.1.on_finish(summary, log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_core::{
        BandPowerSet, FocusState, NormalizedPowerSet, SessionState, SpectralMode, Spectrum,
    };
    use uuid::Uuid;

    fn report() -> WindowReport {
        WindowReport {
            sequence: 1,
            elapsed_seconds: 2.0,
            raw_powers: BandPowerSet::new(),
            band_powers: NormalizedPowerSet::from_fractions(vec![
                ("alpha".to_string(), 0.25),
                ("beta".to_string(), 0.75),
            ]),
            alpha_power: 0.25,
            beta_power: 0.75,
            concentration: 0.75,
            focus_state: FocusState::Concentrated,
        }
    }

    fn snapshot() -> SpectralSnapshot {
        SpectralSnapshot {
            sequence_number: 1,
            elapsed_seconds: 30.0,
            mode: SpectralMode::Welch,
            spectrum: Spectrum {
                frequencies: vec![0.0, 1.0],
                magnitudes: vec![0.0, 2.0],
            },
        }
    }

    #[test]
    fn test_vec_sink_collects_in_order() {
        let mut events: Vec<SessionEvent> = Vec::new();
        events.on_window(&report());
        events.on_snapshot(&snapshot());

        let mut summary = SessionSummary::new(Uuid::new_v4());
        summary.final_state = SessionState::Stopped;
        events.on_finish(&summary, &TimeSeriesLog::new());

        assert!(matches!(events[0], SessionEvent::Window(_)));
        assert!(matches!(events[1], SessionEvent::Snapshot(_)));
        assert!(matches!(events[2], SessionEvent::Finished { .. }));
    }

    #[tokio::test]
    async fn test_broadcast_sink_fans_out() {
        let mut sink = BroadcastSink::new(16);
        let mut first = sink.subscribe();
        let mut second = sink.subscribe();

        sink.on_window(&report());
        sink.on_snapshot(&snapshot());

        for receiver in [&mut first, &mut second] {
            assert_eq!(receiver.recv().await.unwrap(), SessionEvent::Window(report()));
            assert_eq!(receiver.recv().await.unwrap(), SessionEvent::Snapshot(snapshot()));
        }
    }

    #[test]
    fn test_broadcast_without_subscribers() {
        let mut sink = BroadcastSink::new(1);
        sink.on_window(&report());
    }

    #[test]
    fn test_tee_and_event_json() {
        let mut tee = Tee(Vec::<SessionEvent>::new(), TracingSink);
        tee.on_window(&report());
        assert_eq!(tee.0.len(), 1);

        let json = serde_json::to_string(&tee.0[0]).unwrap();
        assert!(json.contains("\"event\":\"window\""));
    }
}
