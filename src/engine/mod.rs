//! The review extraction engine.
//!
//! One engine instance runs one scrape at a time: it exclusively owns the
//! browser session for the duration of the call, drives pagination until a
//! stop condition holds, and accumulates validated, deduplicated records
//! in discovery order. Instances are cheap; callers needing concurrent
//! scrapes construct one engine (and one session) per scrape.

pub mod driver;
pub mod error;
pub mod extract;
pub mod paginate;
pub mod session;
pub mod strategy;
pub mod telemetry;
pub mod validate;

use std::time::Duration;

use scraper::Html;
use tracing::info;

use crate::config::{EngineConfig, ExtractionRules};
use crate::models::{BusinessInfo, ScrapeOutcome, StopReason};

use driver::SessionDriver;
use error::EngineError;
use paginate::PaginationDriver;
use telemetry::TelemetryLog;
use validate::{Insertion, RecordAccumulator};

/// Scroll-pagination review extraction engine.
///
/// The telemetry log lives on the instance for the duration of one call
/// and can be read back after both successful and failed calls; there are
/// no other cross-call state guarantees.
pub struct ReviewScrapeEngine {
    config: EngineConfig,
    rules: ExtractionRules,
    telemetry: TelemetryLog,
}

impl ReviewScrapeEngine {
    pub fn new(config: EngineConfig, rules: ExtractionRules) -> Self {
        Self {
            config,
            rules,
            telemetry: TelemetryLog::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default(), ExtractionRules::default())
    }

    pub fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    /// The telemetry log of the most recent call, as ordered strings.
    pub fn telemetry(&self) -> Vec<String> {
        self.telemetry.render()
    }

    /// Run one scrape against an already-acquired session.
    ///
    /// The session is taken by value: it belongs to this call alone and is
    /// released exactly once on every exit path, fatal errors included.
    /// Zero records is a successful outcome; only environment and
    /// navigation failures are errors.
    pub async fn scrape<D: SessionDriver>(
        &mut self,
        mut session: D,
        url: &str,
        requested_max: usize,
    ) -> Result<ScrapeOutcome, EngineError> {
        self.telemetry.clear();
        self.telemetry.record(format!("session acquired for {url}"));

        let result = self.run(&mut session, url, requested_max).await;

        // The single release point for this call.
        session.release().await;
        self.telemetry.record("session released");

        match &result {
            Ok(outcome) => {
                self.telemetry.record(format!(
                    "scrape finished: {} records ({})",
                    outcome.reviews.len(),
                    outcome.stop_reason
                ));
            }
            Err(e) => self.telemetry.record(format!("scrape failed: {e}")),
        }

        result.map(|mut outcome| {
            outcome.telemetry = self.telemetry.render();
            outcome
        })
    }

    async fn run<D: SessionDriver>(
        &mut self,
        session: &mut D,
        url: &str,
        requested_max: usize,
    ) -> Result<ScrapeOutcome, EngineError> {
        session
            .navigate(url, self.config.navigation_timeout())
            .await?;
        self.telemetry.record("navigation complete");

        if session.prepare().await {
            self.telemetry.record("reviews tab activated");
        } else {
            self.telemetry
                .record("no reviews tab affordance; assuming reviews in view");
        }

        // Identity is resolved once per session, from the first snapshot.
        let first_snapshot = session.page_html().await;
        let business_name = first_snapshot
            .as_deref()
            .map(Html::parse_document)
            .as_ref()
            .and_then(|doc| extract::resolve_business_identity(doc, &self.rules))
            .unwrap_or_else(|| self.config.placeholder_identity.clone());
        self.telemetry
            .record(format!("business identity: {business_name}"));

        let business = BusinessInfo::new(business_name, url);
        let target = requested_max.min(self.config.hard_cap);
        let mut paginator = PaginationDriver::new(
            self.config.stability_threshold,
            self.config.max_rounds,
        );
        let mut accumulator = RecordAccumulator::new(self.config.hard_cap);
        let (pause_min, pause_max) = self.config.pause_bounds();

        let stop_reason = loop {
            session.advance().await;
            let pause = paginate::jittered_pause_ms(pause_min, pause_max);
            tokio::time::sleep(Duration::from_millis(pause)).await;

            // A failed snapshot counts as a round without growth; the
            // stability threshold or the cap will end a page that stays
            // unreadable.
            let container_count = match session.page_html().await {
                Some(html) => {
                    let document = Html::parse_document(&html);
                    let containers = extract::candidate_containers(&document, &self.rules);
                    let count = containers.len();

                    for container in containers {
                        if accumulator.len() >= target {
                            break;
                        }
                        let fields = extract::extract_fields(container, &self.rules);
                        match accumulator.offer(&fields, &business.name) {
                            Insertion::Accepted => self.telemetry.record(format!(
                                "accepted record {} ({})",
                                accumulator.len(),
                                fields.identity.as_deref().unwrap_or("?")
                            )),
                            Insertion::Duplicate => {}
                            Insertion::Invalid => {
                                self.telemetry.record("rejected container: fields unresolved")
                            }
                            Insertion::CapReached => break,
                        }
                    }
                    count
                }
                None => {
                    self.telemetry.record("snapshot unavailable this round");
                    0
                }
            };

            self.telemetry.record(format!(
                "round {}: {} containers, {} records",
                paginator.rounds() + 1,
                container_count,
                accumulator.len()
            ));

            if let Some(reason) = paginator.observe(container_count, accumulator.len(), target) {
                break reason;
            }
        };

        self.telemetry
            .record(format!("pagination stopped: {stop_reason}"));
        if accumulator.is_empty() {
            self.telemetry
                .record("extraction empty: pagination budget exhausted with zero records");
        }
        info!(
            records = accumulator.len(),
            rounds = paginator.rounds(),
            %stop_reason,
            "scrape complete"
        );

        Ok(ScrapeOutcome {
            business,
            reviews: accumulator.into_reviews(),
            stop_reason,
            telemetry: Vec::new(), // filled by the caller from the live log
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Scripted session: serves one HTML snapshot per advance, counts
    /// release calls.
    struct ScriptedSession {
        snapshots: Vec<String>,
        cursor: usize,
        fail_navigation: bool,
        releases: Arc<AtomicUsize>,
    }

    impl ScriptedSession {
        fn new(snapshots: Vec<String>, releases: Arc<AtomicUsize>) -> Self {
            Self {
                snapshots,
                cursor: 0,
                fail_navigation: false,
                releases,
            }
        }
    }

    #[async_trait]
    impl SessionDriver for ScriptedSession {
        async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), EngineError> {
            if self.fail_navigation {
                Err(EngineError::navigation(url, "unreachable host"))
            } else {
                Ok(())
            }
        }

        async fn prepare(&mut self) -> bool {
            true
        }

        async fn advance(&mut self) {
            if self.cursor + 1 < self.snapshots.len() {
                self.cursor += 1;
            }
        }

        async fn page_html(&mut self) -> Option<String> {
            self.snapshots.get(self.cursor).cloned()
        }

        async fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn review_html(id: usize) -> String {
        format!(
            r#"<div data-review-id="r{id}">
                <div class="d4r55">Reviewer {id}</div>
                <span role="img" aria-label="4 stars"></span>
                <span class="wiI7pd">Review body number {id}, detailed enough to count.</span>
                <span class="rsqaWe">{id} weeks ago</span>
            </div>"#
        )
    }

    fn page(n: usize) -> String {
        let reviews: String = (0..n).map(review_html).collect();
        format!("<html><body><h1>Corner Cafe</h1>{reviews}</body></html>")
    }

    fn fast_config() -> EngineConfig {
        EngineConfig {
            pause_min_ms: 0,
            pause_max_ms: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn release_runs_exactly_once_on_success() {
        let releases = Arc::new(AtomicUsize::new(0));
        let session = ScriptedSession::new(vec![page(3); 4], releases.clone());
        let mut engine = ReviewScrapeEngine::new(fast_config(), ExtractionRules::default());

        let outcome = engine.scrape(session, "https://example.test", 50).await.unwrap();
        assert_eq!(outcome.reviews.len(), 3);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn release_runs_exactly_once_on_navigation_failure() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut session = ScriptedSession::new(vec![page(3)], releases.clone());
        session.fail_navigation = true;
        let mut engine = ReviewScrapeEngine::new(fast_config(), ExtractionRules::default());

        let err = engine
            .scrape(session, "https://example.test", 50)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Navigation { .. }));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        // Telemetry survives the failed call.
        assert!(engine
            .telemetry()
            .iter()
            .any(|line| line.contains("session released")));
    }

    #[tokio::test]
    async fn identity_placeholder_when_every_strategy_fails() {
        let releases = Arc::new(AtomicUsize::new(0));
        let body = format!("<html><body>{}</body></html>", review_html(1));
        let session = ScriptedSession::new(vec![body; 4], releases.clone());
        let mut engine = ReviewScrapeEngine::new(fast_config(), ExtractionRules::default());

        let outcome = engine.scrape(session, "https://example.test", 50).await.unwrap();
        assert_eq!(outcome.business.name, "Unknown Business");
        assert_eq!(outcome.reviews.len(), 1);
        assert_eq!(outcome.reviews[0].shop_name, "Unknown Business");
    }
}
