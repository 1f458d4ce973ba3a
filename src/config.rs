//! Engine and extraction configuration.
//!
//! Behavior that varies per deployment (pagination budgets, pause jitter)
//! and per page variant (selector sets) is data, not code. The built-in
//! defaults cover the currently known markup variants of the target pages;
//! new variants are handled by editing a TOML file, not by forking the
//! engine.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::strategy::FieldStrategy;

/// Behavioral configuration for one scrape engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Consecutive rounds without container-count growth before the loop is
    /// considered exhausted.
    #[serde(default = "default_stability_threshold")]
    pub stability_threshold: u32,

    /// Absolute cap on pagination rounds. Bounds worst-case runtime on
    /// pages that never stabilize.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Inter-round pause jitter bounds, milliseconds.
    #[serde(default = "default_pause_min_ms")]
    pub pause_min_ms: u64,
    #[serde(default = "default_pause_max_ms")]
    pub pause_max_ms: u64,

    /// Page navigation timeout in seconds.
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    /// Hard cap on accumulated records, enforced independently of the
    /// caller's requested maximum.
    #[serde(default = "default_hard_cap")]
    pub hard_cap: usize,

    /// Business identity used when every resolution strategy fails.
    #[serde(default = "default_placeholder_identity")]
    pub placeholder_identity: String,

    /// Run the browser in headless mode (default: true).
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Explicit browser executable path. When unset, the launcher probes
    /// the environment and well-known install locations.
    #[serde(default)]
    pub browser_executable: Option<String>,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stability_threshold: default_stability_threshold(),
            max_rounds: default_max_rounds(),
            pause_min_ms: default_pause_min_ms(),
            pause_max_ms: default_pause_max_ms(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            hard_cap: default_hard_cap(),
            placeholder_identity: default_placeholder_identity(),
            headless: default_headless(),
            browser_executable: None,
            chrome_args: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    /// Inter-round pause bounds as a (min, max) pair, corrected so the
    /// range is never inverted.
    pub fn pause_bounds(&self) -> (u64, u64) {
        if self.pause_min_ms <= self.pause_max_ms {
            (self.pause_min_ms, self.pause_max_ms)
        } else {
            (self.pause_max_ms, self.pause_min_ms)
        }
    }
}

fn default_stability_threshold() -> u32 {
    2
}
fn default_max_rounds() -> u32 {
    40
}
fn default_pause_min_ms() -> u64 {
    800
}
fn default_pause_max_ms() -> u64 {
    2200
}
fn default_navigation_timeout_secs() -> u64 {
    30
}
fn default_hard_cap() -> usize {
    500
}
fn default_placeholder_identity() -> String {
    "Unknown Business".to_string()
}
fn default_headless() -> bool {
    true
}

/// Declarative extraction rules: ordered strategy chains per logical field
/// plus the selector lists the session uses to drive the page.
///
/// The defaults consolidate the selector sets that previously lived in
/// eight hand-maintained scraper variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRules {
    /// Candidate review container selectors, tried in order; the first one
    /// that matches anything in a snapshot wins for that round.
    #[serde(default = "default_container_selectors")]
    pub container_selectors: Vec<String>,

    /// Reviewer identity strategies.
    #[serde(default = "default_identity_strategies")]
    pub identity: Vec<FieldStrategy>,

    /// Numeric rating strategies.
    #[serde(default = "default_rating_strategies")]
    pub rating: Vec<FieldStrategy>,

    /// Review body strategies.
    #[serde(default = "default_text_strategies")]
    pub text: Vec<FieldStrategy>,

    /// Relative-date strategies.
    #[serde(default = "default_date_strategies")]
    pub date: Vec<FieldStrategy>,

    /// Generic placeholder labels that disqualify an identity value.
    #[serde(default = "default_identity_blocklist")]
    pub identity_blocklist: Vec<String>,

    /// Top-level page selectors for the business name.
    #[serde(default = "default_business_selectors")]
    pub business_selectors: Vec<String>,

    /// Selectors for the reviews tab affordance, clicked once after
    /// navigation.
    #[serde(default = "default_tab_selectors")]
    pub tab_selectors: Vec<String>,

    /// Selectors for "load more" / "show more" affordances, clicked every
    /// round.
    #[serde(default = "default_load_more_selectors")]
    pub load_more_selectors: Vec<String>,

    /// Selectors for the scrollable reviews pane, used for container
    /// scrolling in addition to window scrolling.
    #[serde(default = "default_scroll_pane_selectors")]
    pub scroll_pane_selectors: Vec<String>,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            container_selectors: default_container_selectors(),
            identity: default_identity_strategies(),
            rating: default_rating_strategies(),
            text: default_text_strategies(),
            date: default_date_strategies(),
            identity_blocklist: default_identity_blocklist(),
            business_selectors: default_business_selectors(),
            tab_selectors: default_tab_selectors(),
            load_more_selectors: default_load_more_selectors(),
            scroll_pane_selectors: default_scroll_pane_selectors(),
        }
    }
}

fn default_container_selectors() -> Vec<String> {
    vec![
        "[data-review-id]".into(),
        ".jftiEf".into(),
        ".MyEned".into(),
        ".fontBodyMedium".into(),
    ]
}

fn default_identity_strategies() -> Vec<FieldStrategy> {
    vec![
        FieldStrategy::text(".d4r55"),
        FieldStrategy::text(".X43Kjb"),
        FieldStrategy::text(".TSUbDb"),
        FieldStrategy::text(".WNxzHc"),
        FieldStrategy::text("a[data-value]"),
        FieldStrategy::text(".fontBodyMedium a"),
        FieldStrategy::text("span[data-value]"),
    ]
}

fn default_rating_strategies() -> Vec<FieldStrategy> {
    vec![
        FieldStrategy::attr("[role=\"img\"][aria-label*=\"star\"]", "aria-label"),
        FieldStrategy::attr(".kvMYJc", "aria-label"),
        FieldStrategy::text(".fzvQIb"),
    ]
}

fn default_text_strategies() -> Vec<FieldStrategy> {
    vec![
        FieldStrategy::text(".wiI7pd"),
        FieldStrategy::text(".MyEned span"),
        FieldStrategy::text(".rsqaWe"),
        FieldStrategy::text(".fontBodyMedium span"),
    ]
}

fn default_date_strategies() -> Vec<FieldStrategy> {
    vec![
        FieldStrategy::text(".rsqaWe"),
        FieldStrategy::text(".p34Ii"),
        FieldStrategy::text(".DU9Pgb"),
    ]
}

fn default_identity_blocklist() -> Vec<String> {
    ["google user", "a google user", "user", "anonymous", "guest"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_business_selectors() -> Vec<String> {
    vec![
        "h1.DUwDvf".into(),
        "h1[data-attrid=\"title\"]".into(),
        "h1".into(),
        ".x3AX1-LfntMc-header-title-title".into(),
    ]
}

fn default_tab_selectors() -> Vec<String> {
    vec![
        "button[role=\"tab\"]".into(),
        "[role=\"tablist\"] button".into(),
        ".hh2c6".into(),
    ]
}

fn default_load_more_selectors() -> Vec<String> {
    vec![
        "button[aria-label*=\"more\" i]".into(),
        ".w8nwRe".into(),
        "button[jsaction*=\"review\"]".into(),
    ]
}

fn default_scroll_pane_selectors() -> Vec<String> {
    vec![".m6QErb".into(), "[role=\"main\"]".into(), ".siAUzd".into()]
}

/// Top-level configuration file: `[engine]` and `[rules]` tables, both
/// optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub rules: ExtractionRules,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config = toml::from_str(&raw)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_config_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config.stability_threshold, 2);
        assert_eq!(config.max_rounds, 40);
        assert_eq!(config.hard_cap, 500);
        assert_eq!(config.placeholder_identity, "Unknown Business");
        assert!(config.headless);
    }

    #[test]
    fn pause_bounds_never_inverted() {
        let config = EngineConfig {
            pause_min_ms: 3000,
            pause_max_ms: 1000,
            ..Default::default()
        };
        assert_eq!(config.pause_bounds(), (1000, 3000));
    }

    #[test]
    fn rules_defaults_cover_every_field() {
        let rules = ExtractionRules::default();
        assert!(!rules.container_selectors.is_empty());
        assert!(!rules.identity.is_empty());
        assert!(!rules.rating.is_empty());
        assert!(!rules.text.is_empty());
        assert!(!rules.date.is_empty());
        assert!(rules.identity_blocklist.contains(&"anonymous".to_string()));
    }

    #[test]
    fn config_toml_overrides_selected_keys() {
        let toml = r#"
            [engine]
            stability_threshold = 3
            max_rounds = 10

            [rules]
            container_selectors = [".review-card"]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.engine.stability_threshold, 3);
        assert_eq!(config.engine.max_rounds, 10);
        // Untouched keys keep their defaults
        assert_eq!(config.engine.hard_cap, 500);
        assert_eq!(config.rules.container_selectors, vec![".review-card".to_string()]);
        assert!(!config.rules.identity.is_empty());
    }
}
