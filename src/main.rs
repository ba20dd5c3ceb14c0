mod catalog;
mod db;
mod export;
mod extract;
mod index;
mod normalize;
mod parser;
mod query;
mod repertory;
mod scraper;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::warn;

use crate::parser::ParseDiagnostics;
use crate::repertory::Repertory;

#[derive(Parser)]
#[command(name = "kent_scraper", about = "Kent's Repertory scraper and remedy lookup")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate the URL queue from the page catalog
    Init,
    /// Scrape unvisited pages
    Scrape {
        /// Max pages to scrape (default: all unvisited)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Parse scraped pages into the processed repertory document
    Process {
        /// Max pages to process (default: all scraped)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Processed document path
        #[arg(short, long, default_value = "data/processed_repertory.json")]
        output: PathBuf,
        /// Sample-query fixture path
        #[arg(long, default_value = "data/sample_queries.json")]
        samples: PathBuf,
    },
    /// Scrape + process in one pipeline
    Run {
        /// Max pages to scrape+process
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[arg(short, long, default_value = "data/processed_repertory.json")]
        output: PathBuf,
        #[arg(long, default_value = "data/sample_queries.json")]
        samples: PathBuf,
    },
    /// Ranked remedies for body parts + symptoms
    Query {
        /// Body parts (e.g. HEAD STOMACH)
        #[arg(short, long, num_args = 1.., required = true)]
        body_parts: Vec<String>,
        /// Symptoms (e.g. pain nausea)
        #[arg(short, long, num_args = 1.., required = true)]
        symptoms: Vec<String>,
        /// Processed document to query
        #[arg(short, long, default_value = "data/processed_repertory.json")]
        input: PathBuf,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Everything known about one remedy
    Remedy {
        /// Remedy abbreviation (e.g. Bell, Nux-v)
        name: String,
        #[arg(short, long, default_value = "data/processed_repertory.json")]
        input: PathBuf,
    },
    /// Show scraping statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = catalog::page_urls();
            let inserted = db::insert_pages(&conn, &pages)?;
            println!("Inserted {} new page URLs ({} total in catalog)", inserted, pages.len());
            Ok(())
        }
        Commands::Scrape { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited pages. Run 'init' first or all pages are scraped.");
                return Ok(());
            }
            println!("Scraping {} pages (streaming to DB)...", pages.len());
            let stats = scraper::scrape_pages_streaming(&conn, pages).await?;
            println!("Done: {} scraped ({} ok, {} errors).", stats.total, stats.ok, stats.errors);
            Ok(())
        }
        Commands::Process { limit, output, samples } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            process_and_export(&conn, limit, &output, &samples)
        }
        Commands::Run { limit, output, samples } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited pages. Run 'init' first.");
                return Ok(());
            }

            let t_scrape = Instant::now();
            println!("Pipeline: scraping {} pages (streaming to DB)...", pages.len());
            let stats = scraper::scrape_pages_streaming(&conn, pages).await?;
            println!(
                "Scraped {} pages ({} ok, {} errors) in {:.1}s",
                stats.total,
                stats.ok,
                stats.errors,
                t_scrape.elapsed().as_secs_f64()
            );

            process_and_export(&conn, None, &output, &samples)
        }
        Commands::Query { body_parts, symptoms, input, limit } => {
            let repertory = export::load_repertory(&input)?;
            // Repertory section names are uppercase
            let body_parts: Vec<String> =
                body_parts.iter().map(|bp| bp.to_uppercase()).collect();
            let results = query::find_remedies(&repertory, &body_parts, &symptoms);
            if results.is_empty() {
                println!("No remedies found.");
                return Ok(());
            }

            println!("{:>3} | {:<12} | {:>5} | {}", "#", "Remedy", "Score", "Matches");
            println!("{}", "-".repeat(60));
            for (i, m) in results.iter().take(limit).enumerate() {
                println!(
                    "{:>3} | {:<12} | {:>5} | {}",
                    i + 1,
                    m.remedy,
                    m.score,
                    m.matches.join(", ")
                );
            }
            println!("\n{} remedies ({} shown)", results.len(), results.len().min(limit));

            // Category tags per queried symptom, for context
            println!("\n--- Symptom categories ---");
            for symptom in &symptoms {
                println!("  {}: {}", symptom, normalize::categorize(symptom).join(", "));
            }
            Ok(())
        }
        Commands::Remedy { name, input } => {
            let repertory = export::load_repertory(&input)?;
            let indices = index::build(&repertory);
            match query::remedy_details(&indices, &name) {
                Some(details) => {
                    println!("{}", details.name);
                    println!("  Indications: {}", details.total_indications);
                    println!("  Body parts:  {}", details.body_parts.join(", "));
                    println!("  Symptoms:    {}", details.symptoms.join(", "));
                }
                None => println!("Remedy '{}' not found.", name),
            }
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Total:     {}", s.total);
            println!("Visited:   {}", s.visited);
            println!("Unvisited: {}", s.unvisited);
            println!("Scraped:   {}", s.scraped);
            println!("Errors:    {}", s.errors);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Parse all scraped pages, merge, normalize, index, validate, and persist.
/// Zero extracted records is a success with a warning, not a failure; only
/// an unwritable output is fatal.
fn process_and_export(
    conn: &rusqlite::Connection,
    limit: Option<usize>,
    output: &std::path::Path,
    samples: &std::path::Path,
) -> anyhow::Result<()> {
    let pages = db::fetch_scraped(conn, limit)?;
    if pages.is_empty() {
        println!("No scraped pages. Run 'scrape' first.");
        return Ok(());
    }

    println!("Processing {} pages...", pages.len());
    let (raw, diag) = build_repertory(&pages);

    if diag.records == 0 {
        warn!("No records extracted from {} pages", pages.len());
    }

    let canonical = normalize::normalize_repertory(&raw);
    let indices = index::build(&canonical);
    let report = canonical.validate();

    export::write_processed(output, &canonical, &indices, &report)?;
    export::write_sample_queries(samples, &canonical)?;

    println!(
        "Saved {} body parts, {} symptoms, {} remedies ({} records from {} lines, {} skipped).",
        report.total_body_parts, report.total_symptoms, report.total_remedies,
        diag.records, diag.lines, diag.skipped,
    );
    if !report.issues.is_empty() {
        println!("Validation issues: {} (see report in {})", report.issues.len(), output.display());
    }
    Ok(())
}

/// Parse pages in parallel, merge sequentially. Merge order does not matter
/// (leaf sets union), but a single writer applies each merge.
fn build_repertory(pages: &[db::ScrapedPage]) -> (Repertory, ParseDiagnostics) {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut raw = Repertory::new();
    let mut diag = ParseDiagnostics::default();

    for chunk in pages.chunks(200) {
        let outcomes: Vec<_> = chunk.par_iter().map(parser::process_page).collect();
        for outcome in outcomes {
            diag.absorb(outcome.diagnostics);
            raw.merge(outcome.partial);
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    raw.prune_empty();
    (raw, diag)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
