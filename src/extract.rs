use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};

static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Visible page text as trimmed, non-empty lines, in document order.
pub fn extract_lines(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .root_element()
        .text()
        .flat_map(|node| node.split('\n'))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Body-part candidates: uppercase anchor texts longer than 2 characters.
/// Repertory pages carry a navigation bar of section links (MIND, VERTIGO,
/// HEAD, ...) which is the only reliable enumeration of section names.
pub fn extract_anchor_texts(html: &str) -> HashSet<String> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR_SEL)
        .map(|a| a.text().collect::<String>().trim().to_string())
        .filter(|text| text.len() > 2 && is_uppercase(text))
        .collect()
}

/// At least one cased character and no lowercase ones.
fn is_uppercase(text: &str) -> bool {
    text.chars().any(|c| c.is_alphabetic()) && !text.chars().any(|c| c.is_lowercase())
}
