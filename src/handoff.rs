//! Interfaces for downstream collaborators.
//!
//! The engine hands consumers the validated, deduplicated record sequence
//! plus the business identity and nothing else. Dashboards, charting, and
//! hosted-language-model analysis live behind these seams; the engine
//! knows neither their prompt formats nor their APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{BusinessInfo, Review, ScrapeOutcome};

/// Everything a downstream consumer receives from one extraction,
/// regardless of whether it came from a scrape or a tabular import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDataset {
    pub business: BusinessInfo,
    pub reviews: Vec<Review>,
}

impl ReviewDataset {
    pub fn new(business: BusinessInfo, reviews: Vec<Review>) -> Self {
        Self { business, reviews }
    }

    pub fn summary(&self) -> RatingSummary {
        RatingSummary::from_reviews(&self.reviews)
    }
}

impl From<ScrapeOutcome> for ReviewDataset {
    fn from(outcome: ScrapeOutcome) -> Self {
        Self {
            business: outcome.business,
            reviews: outcome.reviews,
        }
    }
}

/// Read-only aggregate for the analytics/dashboard consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub total_reviews: usize,
    pub average_rating: f64,
    /// Count per star, index 0 = 1 star.
    pub distribution: [usize; 5],
    pub generated_at: DateTime<Utc>,
}

impl RatingSummary {
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let mut distribution = [0usize; 5];
        let mut sum = 0u64;
        for review in reviews {
            // rating is validated to 1..=5 at construction
            distribution[usize::from(review.rating) - 1] += 1;
            sum += u64::from(review.rating);
        }
        let average_rating = if reviews.is_empty() {
            0.0
        } else {
            sum as f64 / reviews.len() as f64
        };
        Self {
            total_reviews: reviews.len(),
            average_rating,
            distribution,
            generated_at: Utc::now(),
        }
    }
}

impl std::fmt::Display for RatingSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "total reviews: {}", self.total_reviews)?;
        writeln!(f, "average rating: {:.2}/5", self.average_rating)?;
        for (stars, count) in self.distribution.iter().enumerate().rev() {
            writeln!(f, "  {} star: {}", stars + 1, count)?;
        }
        Ok(())
    }
}

/// External hosted-language-model collaborator. Implementations own their
/// prompt formats and transport; the engine only supplies the dataset.
#[async_trait]
pub trait InsightCollaborator {
    /// Answer a free-text question over the dataset.
    async fn answer(&self, dataset: &ReviewDataset, question: &str) -> anyhow::Result<String>;

    /// Produce a free-text insight report over the dataset.
    async fn insights(&self, dataset: &ReviewDataset) -> anyhow::Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: i64) -> Review {
        Review::new(
            "Maria K.",
            rating,
            "A review body long enough to pass.",
            None,
            "Corner Cafe",
        )
        .unwrap()
    }

    #[test]
    fn summary_distribution_and_average() {
        let reviews = vec![review(5), review(5), review(4), review(1)];
        let summary = RatingSummary::from_reviews(&reviews);
        assert_eq!(summary.total_reviews, 4);
        assert_eq!(summary.distribution, [1, 0, 0, 1, 2]);
        assert!((summary.average_rating - 3.75).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_dataset_has_zero_average() {
        let summary = RatingSummary::from_reviews(&[]);
        assert_eq!(summary.total_reviews, 0);
        assert_eq!(summary.average_rating, 0.0);
    }
}
