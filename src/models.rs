//! Core record types shared by the scrape engine and the import path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum length for a review body to count as free text.
pub const MIN_TEXT_LEN: usize = 10;

/// Date string used when no date strategy resolves. Date absence never
/// disqualifies a record.
pub const DATE_PLACEHOLDER: &str = "Recent";

/// A single validated review record. Immutable once constructed; every
/// instance has passed the field invariants in [`Review::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub reviewer_name: String,
    pub rating: u8,
    pub review_text: String,
    pub review_date: String,
    pub shop_name: String,
}

/// Reasons a candidate record fails validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("reviewer name is empty")]
    EmptyName,
    #[error("rating {0} is outside 1..=5")]
    RatingOutOfRange(i64),
    #[error("review text is shorter than {MIN_TEXT_LEN} characters or purely numeric")]
    InvalidText,
}

impl Review {
    /// Construct a review, enforcing the invariants shared by the scrape
    /// and import paths: non-empty name, rating in 1..=5, text of at least
    /// [`MIN_TEXT_LEN`] characters that is not purely numeric. A missing
    /// date falls back to [`DATE_PLACEHOLDER`].
    pub fn new(
        reviewer_name: &str,
        rating: i64,
        review_text: &str,
        review_date: Option<&str>,
        shop_name: &str,
    ) -> Result<Self, RecordError> {
        let name = reviewer_name.trim();
        if name.len() <= 1 {
            return Err(RecordError::EmptyName);
        }
        if !(1..=5).contains(&rating) {
            return Err(RecordError::RatingOutOfRange(rating));
        }
        let text = review_text.trim();
        if text.len() < MIN_TEXT_LEN || is_purely_numeric(text) {
            return Err(RecordError::InvalidText);
        }
        let date = review_date
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(DATE_PLACEHOLDER);

        Ok(Self {
            reviewer_name: name.to_string(),
            rating: rating as u8,
            review_text: text.to_string(),
            review_date: date.to_string(),
            shop_name: shop_name.trim().to_string(),
        })
    }
}

/// True when the string contains no alphabetic content at all, e.g. a bare
/// "5/5" or "10 000" that slipped into a text slot.
pub fn is_purely_numeric(text: &str) -> bool {
    !text.chars().any(|c| c.is_alphabetic())
}

/// The target page's resolved business identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessInfo {
    pub name: String,
    pub url: String,
    pub scraped_at: DateTime<Utc>,
}

impl BusinessInfo {
    pub fn new(name: String, url: &str) -> Self {
        Self {
            name,
            url: url.to_string(),
            scraped_at: Utc::now(),
        }
    }
}

/// Why the pagination loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The requested record count was reached.
    TargetReached,
    /// The container count stopped growing for the configured number of
    /// consecutive rounds.
    Stable,
    /// The absolute round cap was hit before the page stabilized.
    IterationCap,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TargetReached => write!(f, "target reached"),
            Self::Stable => write!(f, "container count stable"),
            Self::IterationCap => write!(f, "iteration cap reached"),
        }
    }
}

/// Result of one scrape call: records in discovery order, the resolved
/// business identity, why the loop stopped, and the telemetry log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeOutcome {
    pub business: BusinessInfo,
    pub reviews: Vec<Review>,
    pub stop_reason: StopReason,
    pub telemetry: Vec<String>,
}

impl ScrapeOutcome {
    /// Human-readable outcome line, e.g. "found 30 of requested 50".
    pub fn summary(&self, requested: usize) -> String {
        format!("found {} of requested {}", self.reviews.len(), requested)
    }
}
