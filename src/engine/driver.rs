//! The seam between the engine loop and the browser.
//!
//! `SessionDriver` abstracts exactly the operations one scrape performs
//! against its exclusively owned session. The chromiumoxide session
//! implements it for real pages; scenario tests implement it with
//! scripted snapshots.

use std::time::Duration;

use async_trait::async_trait;

use crate::engine::error::EngineError;

#[async_trait]
pub trait SessionDriver: Send {
    /// Load the target page. Unreachable host or timeout is fatal for the
    /// call.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), EngineError>;

    /// Best-effort activation of the reviews tab. Some page variants land
    /// on reviews directly, so failure is non-fatal. Returns whether an
    /// affordance was activated.
    async fn prepare(&mut self) -> bool;

    /// One pagination advance: scroll to bottom (window and reviews pane)
    /// and activate any visible "load more" affordances. Best-effort;
    /// faults are swallowed by the implementation.
    async fn advance(&mut self);

    /// Snapshot of the currently rendered document. `None` when the
    /// session cannot produce one this round; the engine treats that as a
    /// round without growth rather than a fatal error.
    async fn page_html(&mut self) -> Option<String>;

    /// Close the session. The engine calls this exactly once on every
    /// exit path.
    async fn release(&mut self);
}
