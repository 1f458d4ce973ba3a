//! reviewlens - review extraction from dynamically rendered pages.
//!
//! Turns a pagination-by-scroll page into a bounded, validated sequence of
//! structured review records despite unstable, partially loaded markup.
//! The engine owns one browser session per scrape, drives scrolling until
//! a stop condition holds, extracts fields through declarative fallback
//! strategy chains, and deduplicates re-observed containers across
//! snapshots.

pub mod cli;
pub mod config;
pub mod engine;
pub mod handoff;
pub mod import;
pub mod models;

pub use config::{Config, EngineConfig, ExtractionRules};
pub use engine::error::EngineError;
pub use engine::session::BrowserSession;
pub use engine::ReviewScrapeEngine;
pub use handoff::{InsightCollaborator, RatingSummary, ReviewDataset};
pub use models::{BusinessInfo, Review, ScrapeOutcome, StopReason};
