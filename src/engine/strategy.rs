//! Declarative field-extraction strategies.
//!
//! Each logical field is resolved by an ordered chain of strategies; the
//! first strategy whose extracted value passes the field's predicate wins
//! and later strategies are not attempted. Chains are configuration data
//! (see [`crate::config::ExtractionRules`]), not code.

use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

use crate::models::is_purely_numeric;
use crate::models::MIN_TEXT_LEN;

/// One extraction strategy: a CSS selector plus the value source (element
/// text, or a named attribute).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStrategy {
    pub selector: String,
    /// When set, read this attribute of the matched element instead of its
    /// text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl FieldStrategy {
    pub fn text(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attribute: None,
        }
    }

    pub fn attr(selector: &str, attribute: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attribute: Some(attribute.to_string()),
        }
    }

    /// Extract this strategy's raw value from one container. Returns None
    /// when the selector does not parse, matches nothing, or yields an
    /// empty value; a bad strategy is "try the next one", never a fault.
    pub fn extract(&self, container: ElementRef<'_>) -> Option<String> {
        let selector = Selector::parse(&self.selector).ok()?;
        let element = container.select(&selector).next()?;
        let raw = match &self.attribute {
            Some(name) => element.value().attr(name)?.to_string(),
            None => element.text().collect::<String>(),
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Evaluate a strategy chain against one container, returning the first
/// value that satisfies `accept`.
pub fn resolve_field<F>(
    container: ElementRef<'_>,
    chain: &[FieldStrategy],
    accept: F,
) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    chain
        .iter()
        .filter_map(|strategy| strategy.extract(container))
        .find(|value| accept(value))
}

/// Identity predicate: more than one character and not a generic
/// placeholder label.
pub fn valid_identity(value: &str, blocklist: &[String]) -> bool {
    let normalized = value.trim().to_lowercase();
    normalized.len() > 1 && !blocklist.iter().any(|entry| *entry == normalized)
}

/// Text predicate: long enough to be free text and not purely numeric.
pub fn valid_text(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.len() >= MIN_TEXT_LEN && !is_purely_numeric(trimmed)
}

/// Parse a rating from a raw strategy value such as "5 stars" or
/// "Rated 4.0 out of 5". The first integer found must fall in 1..=5.
pub fn parse_rating(raw: &str) -> Option<u8> {
    let digits = Regex::new(r"\d+").ok()?;
    let value: i64 = digits.find(raw)?.as_str().parse().ok()?;
    if (1..=5).contains(&value) {
        Some(value as u8)
    } else {
        None
    }
}
