//! Append-only telemetry log for one scrape call.
//!
//! Every major transition appends a timestamped message. The log is
//! returned to the caller for diagnostics after the call completes,
//! success or failure; it is never consulted for control flow.

use chrono::{DateTime, Utc};
use tracing::debug;

/// One timestamped telemetry message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl LogEntry {
    fn render(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Ordered, append-only message sink owned by the engine instance for the
/// duration of one scrape call.
#[derive(Debug, Default)]
pub struct TelemetryLog {
    entries: Vec<LogEntry>,
}

impl TelemetryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(target: "reviewlens::telemetry", "{message}");
        self.entries.push(LogEntry {
            timestamp: Utc::now(),
            message,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reset at the start of a new call; the engine instance is reusable
    /// but carries no cross-call log state.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The log as ordered display strings.
    pub fn render(&self) -> Vec<String> {
        self.entries.iter().map(LogEntry::render).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_ordered_and_timestamped() {
        let mut log = TelemetryLog::new();
        log.record("session acquired");
        log.record("navigation complete");

        let rendered = log.render();
        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].ends_with("session acquired"));
        assert!(rendered[1].ends_with("navigation complete"));
        // "[HH:MM:SS] " prefix
        assert!(rendered[0].starts_with('['));
        assert_eq!(rendered[0].find(']'), Some(9));
    }

    #[test]
    fn clear_resets_between_calls() {
        let mut log = TelemetryLog::new();
        log.record("first call");
        log.clear();
        assert!(log.is_empty());
        log.record("second call");
        assert_eq!(log.len(), 1);
    }
}
