//! Tabular import path.
//!
//! An alternate record producer that bypasses the engine entirely: rows
//! from an externally supplied CSV are mapped into the same record schema
//! and held to the same field invariants before reaching any downstream
//! consumer. Invalid rows are skipped and counted, never repaired.

use std::mem::take;

use thiserror::Error;
use tracing::debug;

use crate::models::Review;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV has no header row")]
    MissingHeader,
    #[error("CSV header has no usable columns (need at least a name, rating, and text column)")]
    UnusableHeader,
}

/// Result of one import: the validated records plus how many rows were
/// dropped for failing an invariant.
#[derive(Debug)]
pub struct ImportReport {
    pub reviews: Vec<Review>,
    pub skipped: usize,
}

/// Column indices resolved from header aliases. The original exports used
/// several header generations; both old and new names are accepted.
#[derive(Debug, Default)]
struct ColumnMap {
    name: Option<usize>,
    rating: Option<usize>,
    text: Option<usize>,
    date: Option<usize>,
    shop: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &[String]) -> Self {
        let mut map = Self::default();
        for (index, raw) in header.iter().enumerate() {
            let key = raw.trim().to_lowercase();
            match key.as_str() {
                "reviewer_name" | "name" | "reviewer" => map.name.get_or_insert(index),
                "rating" | "stars" => map.rating.get_or_insert(index),
                "review_text" | "text" | "review" => map.text.get_or_insert(index),
                "review_date" | "date" => map.date.get_or_insert(index),
                "shop_name" | "business" | "title" => map.shop.get_or_insert(index),
                _ => continue,
            };
        }
        map
    }

    fn usable(&self) -> bool {
        self.name.is_some() && self.rating.is_some() && self.text.is_some()
    }
}

/// Import CSV text into validated reviews. `default_shop` is used when the
/// file carries no business column.
pub fn import_csv(text: &str, default_shop: &str) -> Result<ImportReport, ImportError> {
    let mut rows = parse_rows(text, ',');
    if rows.is_empty() {
        return Err(ImportError::MissingHeader);
    }
    let header = rows.remove(0);
    let columns = ColumnMap::from_header(&header);
    if !columns.usable() {
        return Err(ImportError::UnusableHeader);
    }

    let mut reviews = Vec::new();
    let mut skipped = 0usize;
    for row in &rows {
        let cell = |index: Option<usize>| index.and_then(|i| row.get(i)).map(|s| s.trim());

        let name = cell(columns.name).unwrap_or("");
        let rating = cell(columns.rating)
            .and_then(|raw| raw.parse::<f64>().ok())
            .map(|value| value as i64)
            .unwrap_or(0);
        let text = cell(columns.text).unwrap_or("");
        let date = cell(columns.date).filter(|d| !d.is_empty());
        let shop = cell(columns.shop).filter(|s| !s.is_empty()).unwrap_or(default_shop);

        match Review::new(name, rating, text, date, shop) {
            Ok(review) => reviews.push(review),
            Err(e) => {
                debug!("skipping row: {e}");
                skipped += 1;
            }
        }
    }

    Ok(ImportReport { reviews, skipped })
}

/// Minimal CSV parser: quote and CRLF tolerant, no external dependency.
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row: Vec<String> = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next(); // double-quote escape
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            c if c == sep && !in_quotes => {
                row.push(take(&mut field));
            }
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    // Flush the trailing field/row even if quotes were unterminated.
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "reviewer_name,rating,review_text,review_date\n\
        Maria K.,5,\"Fantastic espresso, cozy atmosphere.\",2 weeks ago\n\
        Sam P.,4,Good pastries and quick service here,recently\n";

    #[test]
    fn imports_well_formed_rows() {
        let report = import_csv(SAMPLE, "Corner Cafe").unwrap();
        assert_eq!(report.reviews.len(), 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.reviews[0].reviewer_name, "Maria K.");
        assert_eq!(report.reviews[0].rating, 5);
        assert_eq!(
            report.reviews[0].review_text,
            "Fantastic espresso, cozy atmosphere."
        );
        assert_eq!(report.reviews[0].shop_name, "Corner Cafe");
    }

    #[test]
    fn legacy_header_aliases_are_accepted() {
        let csv = "name,stars,text,date,title\n\
            Maria K.,5,Fantastic espresso and cozy atmosphere,2 weeks ago,Corner Cafe\n";
        let report = import_csv(csv, "fallback").unwrap();
        assert_eq!(report.reviews.len(), 1);
        assert_eq!(report.reviews[0].shop_name, "Corner Cafe");
    }

    #[test]
    fn rows_failing_invariants_are_skipped_not_repaired() {
        let csv = "reviewer_name,rating,review_text\n\
            Maria K.,7,This rating is out of range entirely\n\
            Sam P.,4,short\n\
            Ada L.,3,Perfectly reasonable review body here\n";
        let report = import_csv(csv, "x").unwrap();
        assert_eq!(report.reviews.len(), 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.reviews[0].reviewer_name, "Ada L.");
    }

    #[test]
    fn fractional_ratings_truncate_before_validation() {
        let csv = "reviewer_name,rating,review_text\n\
            Maria K.,4.0,Solid flat white and friendly staff\n";
        let report = import_csv(csv, "x").unwrap();
        assert_eq!(report.reviews[0].rating, 4);
    }

    #[test]
    fn missing_header_and_unusable_header_are_errors() {
        assert!(matches!(import_csv("", "x"), Err(ImportError::MissingHeader)));
        assert!(matches!(
            import_csv("a,b,c\n1,2,3\n", "x"),
            Err(ImportError::UnusableHeader)
        ));
    }

    #[test]
    fn parser_handles_quotes_and_crlf() {
        let rows = parse_rows("a,\"b,c\"\"q\"\r\nd,e\r\n", ',');
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], "b,c\"q");
        assert_eq!(rows[1], vec!["d".to_string(), "e".to_string()]);
    }
}
