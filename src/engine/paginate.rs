//! Pagination control: decides when more scrolling is worthwhile.
//!
//! Page rendering is asynchronous and outside the caller's control; a
//! fixed-count scroll loop either starves on slow pages or runs forever on
//! synthetic-content pages. The driver therefore combines a record-count
//! target, a container-count stability check, and an absolute round cap.
//!
//! The driver is a pure state machine fed observed counts; it holds no
//! browser handle, which keeps the loop logic testable without a session.

use rand::Rng;

use crate::models::StopReason;

/// Loop states. `Done` is terminal; there is no re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationState {
    Idle,
    Scrolling,
    /// Container count did not grow last round; scrolling resumes if it
    /// grows again before the stability threshold is hit.
    Stalled,
    Done(StopReason),
}

/// Hybrid stop-policy pagination driver.
#[derive(Debug)]
pub struct PaginationDriver {
    stability_threshold: u32,
    max_rounds: u32,
    state: PaginationState,
    rounds: u32,
    stalled_rounds: u32,
    last_count: usize,
}

impl PaginationDriver {
    pub fn new(stability_threshold: u32, max_rounds: u32) -> Self {
        Self {
            // A threshold of zero would stop before the first observation.
            stability_threshold: stability_threshold.max(1),
            max_rounds: max_rounds.max(1),
            state: PaginationState::Idle,
            rounds: 0,
            stalled_rounds: 0,
            last_count: 0,
        }
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Feed one round's observation: the candidate-container count in the
    /// latest snapshot, the records accepted so far, and the effective
    /// record target. Returns the stop reason once a stop condition holds;
    /// conditions are checked in a fixed order (target, stability, cap).
    pub fn observe(&mut self, container_count: usize, accepted: usize, target: usize) -> Option<StopReason> {
        if let PaginationState::Done(reason) = self.state {
            return Some(reason);
        }
        self.rounds += 1;

        if accepted >= target {
            return self.finish(StopReason::TargetReached);
        }

        if container_count > self.last_count {
            self.last_count = container_count;
            self.stalled_rounds = 0;
            self.state = PaginationState::Scrolling;
        } else {
            self.stalled_rounds += 1;
            self.state = PaginationState::Stalled;
            if self.stalled_rounds >= self.stability_threshold {
                return self.finish(StopReason::Stable);
            }
        }

        if self.rounds >= self.max_rounds {
            return self.finish(StopReason::IterationCap);
        }
        None
    }

    fn finish(&mut self, reason: StopReason) -> Option<StopReason> {
        self.state = PaginationState::Done(reason);
        Some(reason)
    }
}

/// Pick a jittered inter-round pause within the configured bounds. The
/// jitter is a rendering-settling heuristic, not a correctness mechanism.
pub fn jittered_pause_ms(min_ms: u64, max_ms: u64) -> u64 {
    if min_ms >= max_ms {
        return min_ms;
    }
    rand::rng().random_range(min_ms..=max_ms)
}
