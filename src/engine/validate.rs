//! Record validation, deduplication, and the global hard cap.
//!
//! Pagination snapshots are cumulative: containers rendered in earlier
//! rounds are still in the DOM when later rounds are snapshotted, so the
//! same visual element is re-observed many times. Dedup therefore spans
//! the whole multi-round accumulation, keyed by a fingerprint of the
//! normalized identity and text.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::engine::extract::RawFields;
use crate::models::{Review, ScrapeOutcome};

/// Outcome of offering one candidate to the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Accepted,
    /// Same dedupe key already seen this session.
    Duplicate,
    /// Candidate failed a field invariant.
    Invalid,
    /// Global hard cap already reached; nothing further is accepted.
    CapReached,
}

/// Accumulates validated records in discovery order for one scrape call.
#[derive(Debug)]
pub struct RecordAccumulator {
    seen: HashSet<[u8; 32]>,
    reviews: Vec<Review>,
    hard_cap: usize,
}

impl RecordAccumulator {
    pub fn new(hard_cap: usize) -> Self {
        Self {
            seen: HashSet::new(),
            reviews: Vec::new(),
            hard_cap,
        }
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    pub fn into_reviews(self) -> Vec<Review> {
        self.reviews
    }

    /// Build a record from extracted fields and insert it unless its
    /// dedupe key was already seen. Non-viable fields yield `Invalid`.
    pub fn offer(&mut self, fields: &RawFields, shop_name: &str) -> Insertion {
        if self.reviews.len() >= self.hard_cap {
            return Insertion::CapReached;
        }
        let (Some(identity), Some(rating), Some(text)) =
            (&fields.identity, fields.rating, &fields.text)
        else {
            return Insertion::Invalid;
        };

        let review = match Review::new(
            identity,
            i64::from(rating),
            text,
            fields.date.as_deref(),
            shop_name,
        ) {
            Ok(review) => review,
            Err(_) => return Insertion::Invalid,
        };

        let key = fingerprint(&review.reviewer_name, &review.review_text);
        if !self.seen.insert(key) {
            return Insertion::Duplicate;
        }
        self.reviews.push(review);
        Insertion::Accepted
    }
}

/// Dedupe key: SHA-256 over the normalized identity and text. Both fields
/// participate so two different reviewers with identical short texts stay
/// distinct.
pub fn fingerprint(identity: &str, text: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(normalize(identity));
    hasher.update([0u8]);
    hasher.update(normalize(text));
    hasher.finalize().into()
}

/// Lowercase and collapse whitespace so trivial render differences across
/// snapshots (wrapping, padding) do not defeat dedup.
fn normalize(value: &str) -> String {
    value.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when no two records in an outcome share a dedupe key. Diagnostic
/// helper used by tests.
pub fn all_keys_distinct(outcome: &ScrapeOutcome) -> bool {
    let mut keys = HashSet::new();
    outcome
        .reviews
        .iter()
        .all(|r| keys.insert(fingerprint(&r.reviewer_name, &r.review_text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(identity: &str, rating: u8, text: &str) -> RawFields {
        RawFields {
            identity: Some(identity.to_string()),
            rating: Some(rating),
            text: Some(text.to_string()),
            date: None,
        }
    }

    #[test]
    fn accepts_valid_candidate_once() {
        let mut acc = RecordAccumulator::new(500);
        let candidate = fields("Maria K.", 5, "Fantastic espresso, cozy atmosphere.");
        assert_eq!(acc.offer(&candidate, "Corner Cafe"), Insertion::Accepted);
        assert_eq!(acc.offer(&candidate, "Corner Cafe"), Insertion::Duplicate);
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn normalization_collapses_render_differences() {
        let mut acc = RecordAccumulator::new(500);
        let first = fields("Maria K.", 5, "Fantastic espresso,  cozy atmosphere.");
        let second = fields("maria k.", 5, "fantastic espresso, cozy\natmosphere.");
        assert_eq!(acc.offer(&first, "x"), Insertion::Accepted);
        assert_eq!(acc.offer(&second, "x"), Insertion::Duplicate);
    }

    #[test]
    fn same_text_different_reviewer_is_not_a_duplicate() {
        let mut acc = RecordAccumulator::new(500);
        let a = fields("Maria K.", 5, "Great place, would come again.");
        let b = fields("Sam P.", 5, "Great place, would come again.");
        assert_eq!(acc.offer(&a, "x"), Insertion::Accepted);
        assert_eq!(acc.offer(&b, "x"), Insertion::Accepted);
    }

    #[test]
    fn nonviable_fields_are_invalid() {
        let mut acc = RecordAccumulator::new(500);
        let missing_rating = RawFields {
            identity: Some("Maria K.".into()),
            rating: None,
            text: Some("Fantastic espresso, cozy atmosphere.".into()),
            date: None,
        };
        assert_eq!(acc.offer(&missing_rating, "x"), Insertion::Invalid);
        assert!(acc.is_empty());
    }

    #[test]
    fn hard_cap_stops_accumulation() {
        let mut acc = RecordAccumulator::new(2);
        for i in 0..4 {
            let candidate = fields(
                &format!("Reviewer {i}"),
                4,
                &format!("Review body number {i}, long enough."),
            );
            acc.offer(&candidate, "x");
        }
        assert_eq!(acc.len(), 2);
        let extra = fields("One More", 4, "Another long enough review body.");
        assert_eq!(acc.offer(&extra, "x"), Insertion::CapReached);
    }
}
