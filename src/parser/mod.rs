pub mod classify;
pub mod page;

use std::collections::HashSet;

use crate::db::ScrapedPage;
use crate::extract;
use crate::repertory::Repertory;

pub use page::ParseDiagnostics;

pub struct PageOutcome {
    pub partial: Repertory,
    pub diagnostics: ParseDiagnostics,
}

/// Per-page pipeline: HTML → text lines + anchor body-part candidates →
/// parsed partial repertory. Total over its input: a page that yields
/// nothing is an outcome, not an error.
pub fn process_page(scraped: &ScrapedPage) -> PageOutcome {
    let lines = extract::extract_lines(&scraped.html);
    let body_parts = extract::extract_anchor_texts(&scraped.html);
    let outcome = parse_lines(&lines, &body_parts);
    if outcome.diagnostics.records == 0 {
        tracing::debug!("Page {} ({}) yielded no records", scraped.page_no, scraped.url);
    }
    outcome
}

pub fn parse_lines(lines: &[String], body_parts: &HashSet<String>) -> PageOutcome {
    let (partial, diagnostics) = page::parse_page(lines, body_parts);
    PageOutcome { partial, diagnostics }
}
