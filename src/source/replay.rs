//! Replay of a recorded feed log.
//!
//! Reads a file holding one feed message (a JSON array) per line, as written
//! by capturing the server's frames, and hands the batches out in order.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use roomwatch_types::{decode_batch, DecodedBatch};

use super::ReadingSource;

/// A source that replays a newline-delimited feed log.
///
/// The file is read on the first poll. Each poll returns at most one batch;
/// with a non-zero interval, batches are spaced at least that far apart.
/// Lines that fail to decode are skipped and reported through `error()`.
#[derive(Debug)]
pub struct ReplaySource {
    path: PathBuf,
    description: String,
    interval: Duration,
    lines: Option<VecDeque<(usize, String)>>,
    next_due: Option<Instant>,
    last_error: Option<String>,
}

impl ReplaySource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("replay: {}", path.display());
        Self {
            path,
            description,
            interval: Duration::ZERO,
            lines: None,
            next_due: None,
            last_error: None,
        }
    }

    /// Space batches at least `interval` apart.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once every line of the log has been consumed.
    pub fn is_finished(&self) -> bool {
        self.lines.as_ref().is_some_and(VecDeque::is_empty)
    }

    fn load(&mut self) -> Option<&mut VecDeque<(usize, String)>> {
        if self.lines.is_none() {
            match fs::read_to_string(&self.path) {
                Ok(content) => {
                    let lines = content
                        .lines()
                        .enumerate()
                        .filter(|(_, line)| !line.trim().is_empty())
                        .map(|(i, line)| (i + 1, line.to_string()))
                        .collect();
                    self.lines = Some(lines);
                }
                Err(e) => {
                    self.last_error = Some(format!("Read error: {}", e));
                    return None;
                }
            }
        }
        self.lines.as_mut()
    }
}

impl ReadingSource for ReplaySource {
    fn poll(&mut self) -> Option<DecodedBatch> {
        let now = Instant::now();
        if let Some(due) = self.next_due {
            if now < due {
                return None;
            }
        }

        let mut parse_error = None;
        let mut batch = None;
        {
            let lines = self.load()?;
            while let Some((number, line)) = lines.pop_front() {
                match decode_batch(line.as_bytes()) {
                    Ok(decoded) => {
                        batch = Some(decoded);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(line = number, error = %e, "skipping undecodable log line");
                        parse_error = Some(format!("Parse error on line {}: {}", number, e));
                    }
                }
            }
        }

        if parse_error.is_some() {
            self.last_error = parse_error;
        }
        if batch.is_some() {
            self.next_due = Some(now + self.interval);
        }
        batch
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.clone()
    }
}
