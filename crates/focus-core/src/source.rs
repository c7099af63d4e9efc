//! Sample sources
//!
//! A source yields raw text lines, one sample per line. Parsing happens
//! at this boundary so that only finite values reach the buffers.

use crate::error::{FocusError, FocusResult};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Something that yields sample lines on demand.
///
/// `Ok(None)` means the link closed. Reads may block; sessions call
/// them from a blocking task.
pub trait SampleSource: Send {
    fn next_line(&mut self) -> FocusResult<Option<String>>;

    /// Release the underlying device or handle
    fn close(&mut self) {}
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn next_line(&mut self) -> FocusResult<Option<String>> {
        (**self).next_line()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Parse one line into a finite sample value
pub fn parse_sample(line: &str) -> FocusResult<f64> {
    let token = line.trim();
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(FocusError::MalformedSample {
            token: token.to_string(),
        }),
    }
}

/// Line-oriented source over any buffered reader: stdin, a file, or a
/// serial device path already configured by the operating system.
pub struct LineSource<R: BufRead + Send> {
    reader: Option<R>,
    line: Vec<u8>,
}

impl<R: BufRead + Send> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            line: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }
}

impl LineSource<BufReader<File>> {
    /// Open a file or character device for reading
    pub fn open(path: impl AsRef<Path>) -> FocusResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| FocusError::SourceDisconnected {
            reason: format!("cannot open {}: {}", path.display(), e),
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead + Send> SampleSource for LineSource<R> {
    fn next_line(&mut self) -> FocusResult<Option<String>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        // Raw bytes: line noise must reach parsing as a malformed token,
        // not fail the read
        self.line.clear();
        match reader.read_until(b'\n', &mut self.line) {
            Ok(0) => Ok(None),
            Ok(_) => {
                let line = String::from_utf8_lossy(&self.line);
                Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
            }
            Err(e) => Err(FocusError::SourceDisconnected {
                reason: e.to_string(),
            }),
        }
    }

    fn close(&mut self) {
        self.reader = None;
    }
}

/// In-memory source for tests and deterministic playback
#[derive(Debug, Default)]
pub struct ManualSource {
    queue: VecDeque<String>,
    closes: Arc<AtomicUsize>,
}

impl ManualSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: lines.into_iter().map(Into::into).collect(),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Lines from sample values
    pub fn from_samples(samples: &[f64]) -> Self {
        Self::new(samples.iter().map(|v| v.to_string()))
    }

    /// Shared counter of `close` calls, readable after the source moves
    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl SampleSource for ManualSource {
    fn next_line(&mut self) -> FocusResult<Option<String>> {
        Ok(self.queue.pop_front())
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
