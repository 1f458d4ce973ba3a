//! CLI commands.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use crate::config::Config;
use crate::engine::session::BrowserSession;
use crate::engine::ReviewScrapeEngine;
use crate::handoff::ReviewDataset;
use crate::import::import_csv;

#[derive(Parser)]
#[command(name = "rlens")]
#[command(about = "Review extraction from dynamically rendered pages")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape reviews from a target page
    Scrape {
        /// Target page URL
        url: String,
        /// Maximum number of records to collect
        #[arg(short, long, default_value = "50")]
        max_reviews: usize,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
        /// Print the telemetry log after the scrape
        #[arg(long)]
        telemetry: bool,
        /// Run the browser with a visible window
        #[arg(long)]
        headful: bool,
    },

    /// Import reviews from a CSV file instead of scraping
    Import {
        /// CSV file path
        file: PathBuf,
        /// Business name to use when the file has no business column
        #[arg(short, long, default_value = "Unknown Business")]
        shop_name: String,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a rating summary for a previously saved dataset (JSON)
    Summarize {
        /// Dataset file path
        file: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Scrape {
            url,
            max_reviews,
            output,
            format,
            telemetry,
            headful,
        } => {
            url::Url::parse(&url).with_context(|| format!("invalid target URL: {url}"))?;

            let mut engine_config = config.engine.clone();
            if headful {
                engine_config.headless = false;
            }

            let session = BrowserSession::launch(&engine_config, config.rules.clone()).await?;
            let mut engine = ReviewScrapeEngine::new(engine_config, config.rules);

            let result = engine.scrape(session, &url, max_reviews).await;
            if telemetry {
                for line in engine.telemetry() {
                    eprintln!("{line}");
                }
            }
            let outcome = result?;

            eprintln!("{}", outcome.summary(max_reviews));
            info!(business = %outcome.business.name, "scrape outcome ready");

            let dataset = ReviewDataset::from(outcome);
            let rendered = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&dataset)?,
                OutputFormat::Csv => dataset_to_csv(&dataset),
            };
            write_output(output.as_deref(), &rendered)?;
        }

        Commands::Import {
            file,
            shop_name,
            output,
        } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let report = import_csv(&raw, &shop_name)?;
            eprintln!(
                "imported {} records ({} rows skipped)",
                report.reviews.len(),
                report.skipped
            );

            let business = crate::models::BusinessInfo::new(shop_name, "csv-import");
            let dataset = ReviewDataset::new(business, report.reviews);
            let rendered = serde_json::to_string_pretty(&dataset)?;
            write_output(output.as_deref(), &rendered)?;
        }

        Commands::Summarize { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let dataset: ReviewDataset = serde_json::from_str(&raw)
                .context("file is not a saved review dataset")?;
            println!("business: {}", dataset.business.name);
            print!("{}", dataset.summary());
        }
    }

    Ok(())
}

fn write_output(path: Option<&std::path::Path>, rendered: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

/// Render a dataset as CSV with the canonical header.
fn dataset_to_csv(dataset: &ReviewDataset) -> String {
    let mut out = String::from("reviewer_name,rating,review_text,review_date,shop_name\n");
    for review in &dataset.reviews {
        let row = [
            review.reviewer_name.as_str(),
            &review.rating.to_string(),
            review.review_text.as_str(),
            review.review_date.as_str(),
            review.shop_name.as_str(),
        ]
        .map(csv_escape)
        .join(",");
        out.push_str(&row);
        out.push('\n');
    }
    out
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BusinessInfo, Review};

    #[test]
    fn csv_output_quotes_embedded_commas() {
        let review = Review::new(
            "Maria K.",
            5,
            "Fantastic espresso, cozy atmosphere.",
            Some("2 weeks ago"),
            "Corner Cafe",
        )
        .unwrap();
        let dataset = ReviewDataset::new(BusinessInfo::new("Corner Cafe".into(), "x"), vec![review]);
        let csv = dataset_to_csv(&dataset);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("reviewer_name,rating,review_text,review_date,shop_name")
        );
        assert_eq!(
            lines.next(),
            Some("Maria K.,5,\"Fantastic espresso, cozy atmosphere.\",2 weeks ago,Corner Cafe")
        );
    }
}
