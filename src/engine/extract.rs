//! Field extraction over rendered-HTML snapshots.
//!
//! The session hands the engine one snapshot per pagination round; this
//! module finds the candidate containers in it and resolves each logical
//! field through its strategy chain. Containers are ephemeral: they exist
//! only while the snapshot is parsed and are never persisted.

use scraper::{ElementRef, Html, Selector};

use crate::config::ExtractionRules;
use crate::engine::strategy::{self, parse_rating};

/// Per-container extraction result: the winning strategy's value per
/// field, or absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pub identity: Option<String>,
    pub rating: Option<u8>,
    pub text: Option<String>,
    pub date: Option<String>,
}

impl RawFields {
    /// A container is viable only when identity, rating, and text all
    /// resolved. Date alone never blocks acceptance.
    pub fn is_viable(&self) -> bool {
        self.identity.is_some() && self.rating.is_some() && self.text.is_some()
    }
}

/// Find candidate review containers in a snapshot. Container selectors are
/// tried in order; the first one that matches anything wins for this
/// snapshot, mirroring how the page variants differ wholesale rather than
/// per container.
pub fn candidate_containers<'a>(
    document: &'a Html,
    rules: &ExtractionRules,
) -> Vec<ElementRef<'a>> {
    for raw in &rules.container_selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let matched: Vec<ElementRef<'a>> = document.select(&selector).collect();
        if !matched.is_empty() {
            return matched;
        }
    }
    Vec::new()
}

/// Run every field chain against one container.
pub fn extract_fields(container: ElementRef<'_>, rules: &ExtractionRules) -> RawFields {
    let identity = strategy::resolve_field(container, &rules.identity, |value| {
        strategy::valid_identity(value, &rules.identity_blocklist)
    });
    let rating = strategy::resolve_field(container, &rules.rating, |value| {
        parse_rating(value).is_some()
    })
    .and_then(|value| parse_rating(&value));
    let text = strategy::resolve_field(container, &rules.text, strategy::valid_text);
    let date = strategy::resolve_field(container, &rules.date, |value| !value.trim().is_empty());

    RawFields {
        identity,
        rating,
        text,
        date,
    }
}

/// Resolve the business identity from the top-level page via its own
/// fallback chain. Returns None when every strategy fails; the engine then
/// substitutes the configured placeholder. Never fatal.
pub fn resolve_business_identity(document: &Html, rules: &ExtractionRules) -> Option<String> {
    for raw in &rules.business_selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let name = element.text().collect::<String>();
            let name = name.trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"
        <div data-review-id="r1">
            <div class="d4r55">Maria K.</div>
            <span role="img" aria-label="5 stars"></span>
            <span class="wiI7pd">Fantastic espresso, cozy atmosphere.</span>
            <span class="rsqaWe">2 weeks ago</span>
        </div>
    "#;

    #[test]
    fn extracts_all_four_fields() {
        let document = Html::parse_document(WELL_FORMED);
        let rules = ExtractionRules::default();
        let containers = candidate_containers(&document, &rules);
        assert_eq!(containers.len(), 1);

        let fields = extract_fields(containers[0], &rules);
        assert_eq!(fields.identity.as_deref(), Some("Maria K."));
        assert_eq!(fields.rating, Some(5));
        assert_eq!(
            fields.text.as_deref(),
            Some("Fantastic espresso, cozy atmosphere.")
        );
        assert_eq!(fields.date.as_deref(), Some("2 weeks ago"));
        assert!(fields.is_viable());
    }

    #[test]
    fn container_selector_fallback_applies_per_snapshot() {
        // No [data-review-id] anywhere; the .jftiEf variant wins.
        let html = r#"
            <div class="jftiEf"><div class="d4r55">A</div></div>
            <div class="jftiEf"><div class="d4r55">B</div></div>
        "#;
        let document = Html::parse_document(html);
        let rules = ExtractionRules::default();
        assert_eq!(candidate_containers(&document, &rules).len(), 2);
    }

    #[test]
    fn missing_rating_makes_container_nonviable() {
        let html = r#"
            <div data-review-id="r1">
                <div class="d4r55">Maria K.</div>
                <span class="wiI7pd">Fantastic espresso, cozy atmosphere.</span>
            </div>
        "#;
        let document = Html::parse_document(html);
        let rules = ExtractionRules::default();
        let containers = candidate_containers(&document, &rules);
        let fields = extract_fields(containers[0], &rules);
        assert_eq!(fields.rating, None);
        assert!(!fields.is_viable());
    }

    #[test]
    fn rating_chain_rejects_out_of_range_values() {
        // aria-label resolves but parses to 9; the chain yields nothing.
        let html = r#"
            <div data-review-id="r1">
                <div class="d4r55">Maria K.</div>
                <span role="img" aria-label="9 stars"></span>
                <span class="wiI7pd">Fantastic espresso, cozy atmosphere.</span>
            </div>
        "#;
        let document = Html::parse_document(html);
        let rules = ExtractionRules::default();
        let fields = extract_fields(candidate_containers(&document, &rules)[0], &rules);
        assert_eq!(fields.rating, None);
    }

    #[test]
    fn blocklisted_identity_falls_through_to_next_strategy() {
        let html = r#"
            <div data-review-id="r1">
                <div class="d4r55">Google User</div>
                <div class="X43Kjb">Sam P.</div>
            </div>
        "#;
        let document = Html::parse_document(html);
        let rules = ExtractionRules::default();
        let fields = extract_fields(candidate_containers(&document, &rules)[0], &rules);
        assert_eq!(fields.identity.as_deref(), Some("Sam P."));
    }

    #[test]
    fn missing_date_leaves_field_absent() {
        let html = r#"
            <div data-review-id="r1">
                <div class="d4r55">Maria K.</div>
                <span role="img" aria-label="4 stars"></span>
                <span class="wiI7pd">Fantastic espresso, cozy atmosphere.</span>
            </div>
        "#;
        let document = Html::parse_document(html);
        let rules = ExtractionRules::default();
        let fields = extract_fields(candidate_containers(&document, &rules)[0], &rules);
        assert_eq!(fields.date, None);
        assert!(fields.is_viable());
    }

    #[test]
    fn business_identity_uses_fallback_chain() {
        let document = Html::parse_document("<h1>  Corner Cafe </h1>");
        let rules = ExtractionRules::default();
        assert_eq!(
            resolve_business_identity(&document, &rules).as_deref(),
            Some("Corner Cafe")
        );

        let empty = Html::parse_document("<div>no heading</div>");
        assert_eq!(resolve_business_identity(&empty, &rules), None);
    }
}
