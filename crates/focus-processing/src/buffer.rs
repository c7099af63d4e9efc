//! Sample history for the analysis window
//!
//! Sliding buffers keep a rolling history and always expose the most
//! recent window. Segment buffers fill up once, are consumed whole, and
//! carry any overflow into the next segment.

use focus_core::{AcquisitionMode, FocusError, FocusResult, SessionConfig};
use std::collections::VecDeque;

/// What happened to a pushed sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Added to the current window
    Accepted,
    /// Segment was full; queued for the next segment
    Deferred,
}

/// Bounded sample history in either acquisition mode
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    mode: AcquisitionMode,
    window_samples: usize,
    max_len: usize,
    samples: VecDeque<f64>,
    deferred: VecDeque<f64>,
}

impl SampleBuffer {
    /// Rolling buffer retaining at most `max_len` samples
    pub fn sliding(window_samples: usize, max_len: usize) -> Self {
        Self {
            mode: AcquisitionMode::Sliding,
            window_samples,
            max_len: max_len.max(window_samples),
            samples: VecDeque::with_capacity(max_len.max(window_samples) + 1),
            deferred: VecDeque::new(),
        }
    }

    /// Fixed-size segment buffer
    pub fn segment(window_samples: usize) -> Self {
        Self {
            mode: AcquisitionMode::Segment,
            window_samples,
            max_len: window_samples,
            samples: VecDeque::with_capacity(window_samples),
            deferred: VecDeque::new(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        match config.acquisition_mode {
            AcquisitionMode::Sliding => Self::sliding(config.window_samples(), config.buffer_capacity()),
            AcquisitionMode::Segment => Self::segment(config.window_samples()),
        }
    }

    pub fn mode(&self) -> AcquisitionMode {
        self.mode
    }

    pub fn window_samples(&self) -> usize {
        self.window_samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples waiting for the next segment
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    pub fn push(&mut self, value: f64) -> PushOutcome {
        match self.mode {
            AcquisitionMode::Sliding => {
                self.samples.push_back(value);
                while self.samples.len() > self.max_len {
                    self.samples.pop_front();
                }
                PushOutcome::Accepted
            }
            AcquisitionMode::Segment => {
                if self.samples.len() >= self.window_samples {
                    self.deferred.push_back(value);
                    PushOutcome::Deferred
                } else {
                    self.samples.push_back(value);
                    PushOutcome::Accepted
                }
            }
        }
    }

    /// A full analysis window is available
    pub fn is_ready(&self) -> bool {
        self.samples.len() >= self.window_samples
    }

    /// Copy of the current analysis window, oldest first.
    ///
    /// Sliding buffers return at most the last `window_samples` values.
    pub fn snapshot(&self) -> Vec<f64> {
        let skip = self.samples.len().saturating_sub(self.window_samples);
        self.samples.iter().skip(skip).copied().collect()
    }

    /// Take the full segment and restart from any deferred samples
    pub fn consume(&mut self) -> FocusResult<Vec<f64>> {
        if self.mode != AcquisitionMode::Segment {
            return Err(FocusError::InvalidOperation {
                reason: "consume is only defined for segment buffers",
            });
        }
        if !self.is_ready() {
            return Err(FocusError::InvalidOperation {
                reason: "segment is not complete",
            });
        }

        let segment: Vec<f64> = self.samples.drain(..).collect();
        let carry = self.deferred.len().min(self.window_samples);
        self.samples.extend(self.deferred.drain(..carry));
        Ok(segment)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.deferred.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sliding_retains_most_recent() {
        let mut buffer = SampleBuffer::sliding(5, 5);
        for i in 1..=7 {
            assert_eq!(buffer.push(i as f64), PushOutcome::Accepted);
        }

        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.snapshot(), vec![3.0, 4.0, 5.0, 6.0, 7.0]);
        assert!(buffer.is_ready());
    }

    #[test]
    fn test_sliding_larger_history() {
        let mut buffer = SampleBuffer::sliding(3, 6);
        for i in 1..=8 {
            buffer.push(i as f64);
        }

        assert_eq!(buffer.len(), 6);
        // Analysis window is still only the newest three
        assert_eq!(buffer.snapshot(), vec![6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_sliding_snapshot_does_not_mutate() {
        let mut buffer = SampleBuffer::sliding(4, 4);
        buffer.push(1.0);
        buffer.push(2.0);
        assert!(!buffer.is_ready());
        assert_eq!(buffer.snapshot(), vec![1.0, 2.0]);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_sliding_consume_rejected() {
        let mut buffer = SampleBuffer::sliding(2, 2);
        buffer.push(1.0);
        buffer.push(2.0);
        assert!(matches!(buffer.consume(), Err(FocusError::InvalidOperation { .. })));
    }

    #[test]
    fn test_segment_ready_and_consume() {
        let mut buffer = SampleBuffer::segment(3);
        buffer.push(1.0);
        buffer.push(2.0);
        assert!(!buffer.is_ready());
        assert!(matches!(buffer.consume(), Err(FocusError::InvalidOperation { .. })));

        buffer.push(3.0);
        assert!(buffer.is_ready());
        assert_eq!(buffer.consume().unwrap(), vec![1.0, 2.0, 3.0]);
        assert!(buffer.is_empty());
        assert!(!buffer.is_ready());
    }

    #[test]
    fn test_segment_overflow_deferred_not_dropped() {
        let mut buffer = SampleBuffer::segment(3);
        for v in [1.0, 2.0, 3.0] {
            assert_eq!(buffer.push(v), PushOutcome::Accepted);
        }
        for v in [4.0, 5.0, 6.0, 7.0] {
            assert_eq!(buffer.push(v), PushOutcome::Deferred);
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.deferred_len(), 4);

        assert_eq!(buffer.consume().unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(buffer.snapshot(), vec![4.0, 5.0, 6.0]);
        assert_eq!(buffer.deferred_len(), 1);

        assert_eq!(buffer.consume().unwrap(), vec![4.0, 5.0, 6.0]);
        assert_eq!(buffer.snapshot(), vec![7.0]);
        assert_eq!(buffer.deferred_len(), 0);
    }

    #[test]
    fn test_from_config() {
        let buffer = SampleBuffer::from_config(&SessionConfig::segment());
        assert_eq!(buffer.mode(), AcquisitionMode::Segment);
        assert_eq!(buffer.window_samples(), 7500);

        let buffer = SampleBuffer::from_config(&SessionConfig::sliding());
        assert_eq!(buffer.mode(), AcquisitionMode::Sliding);
        assert_eq!(buffer.window_samples(), 500);
    }
}
