//! Engine error taxonomy.
//!
//! Only these two variants abort a scrape call. Everything else degrades:
//! empty and partial extractions are successful outcomes, and per-strategy
//! faults never leave the field extractor.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The browser automation runtime could not be started. Fatal; the
    /// engine never retries this.
    #[error("browser environment unavailable: {reason}")]
    Environment { reason: String },

    /// The target page was unreachable or navigation timed out. Fatal for
    /// this call.
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
}

impl EngineError {
    pub fn environment(reason: impl Into<String>) -> Self {
        Self::Environment {
            reason: reason.into(),
        }
    }

    pub fn navigation(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
