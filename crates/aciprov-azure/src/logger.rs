//! Line-oriented log sink used for operation milestones.

use std::sync::Mutex;

use log::info;

/// Writes one plain-text line.
pub trait Logger: Send + Sync {
    fn write(&self, message: &str);
}

/// Forwards every line to the `log` facade at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl Logger for LogWriter {
    fn write(&self, message: &str) {
        info!(target: "aciprov", "{}", message);
    }
}

/// Keeps lines in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|l| l.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Lines starting with `prefix`.
    pub fn lines_starting_with(&self, prefix: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.starts_with(prefix))
            .collect()
    }
}

impl Logger for MemoryLogger {
    fn write(&self, message: &str) {
        match self.lines.lock() {
            Ok(mut lines) => lines.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}
