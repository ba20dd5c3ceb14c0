use std::sync::LazyLock;

use regex::Regex;

static PAGE_REF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^p\.\s*\d+$").unwrap());
static MAIN_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][A-Z\s-]+)\b:?\s*(.*)$").unwrap());
static REMEDY_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z][A-Za-z-]{0,20}\.").unwrap());
static NOISE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^p\.\s*\d+",    // p.109, p. 110
        r"^page\s*\d+",   // page 109
        r"^\d+$",         // bare page numbers
        r"^[a-z]+\s*\d+", // lowercase word + number (anchor fragments)
        r"^-+$",
        r"^next$",
        r"^prev$",
        r"^home$",
        r"^copyright",
        r"^m[ée]di-t",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){}", p)).unwrap())
    .collect()
});

// Remedy abbreviation shapes: Nat-m, Kali-c, Ant-s-aur, Calc carb, FERR
static REMEDY_SHAPE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^[A-Z][a-z]+(-[a-z]+)*$",
        r"^[A-Z][a-z]+\s[a-z]+$",
        r"^[A-Z]{2,}[a-z-]*$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

const MAX_REMEDY_LEN: usize = 12;

/// Page references, navigation fragments, and boilerplate. Takes precedence
/// over every other shape: a string that is both noise and remedy-shaped
/// (e.g. all digits) is discarded.
pub fn is_noise(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || NOISE_RES.iter().any(|re| re.is_match(trimmed))
}

/// Strict page marker (`p. <digits>` and nothing else), used for the
/// body-part adjacency rule.
pub fn is_page_marker(text: &str) -> bool {
    PAGE_REF_RE.is_match(text.trim().to_lowercase().as_str())
}

/// Main symptom headers open with an uppercase run (`PAIN: ...`,
/// `BURNING PAIN lancinating: ...`) or, in the alternate convention, end with
/// a colon and are mostly uppercase.
pub fn is_main_symptom_header(text: &str) -> bool {
    let trimmed = text.trim();
    if is_noise(trimmed) {
        return false;
    }
    if MAIN_HEADER_RE.is_match(trimmed) {
        return true;
    }
    if let Some(before_colon) = trimmed.strip_suffix(':') {
        return mostly_uppercase(before_colon.trim());
    }
    false
}

/// Split a main-symptom header into the uppercase symptom and the remainder
/// of the line. The header's trailing colon (if any) is consumed here, so the
/// remainder starts at the sub-symptom text.
pub fn split_main_header(text: &str) -> Option<(String, String)> {
    let caps = MAIN_HEADER_RE.captures(text.trim())?;
    let symptom = caps[1].trim().to_string();
    if symptom.is_empty() {
        return None;
    }
    Some((symptom, caps[2].trim().to_string()))
}

/// Sub-symptom headers end with a colon and start lowercase
/// (`throbbing, worse motion:`).
pub fn is_sub_symptom_header(text: &str) -> bool {
    let trimmed = text.trim();
    if is_noise(trimmed) {
        return false;
    }
    match trimmed.strip_suffix(':') {
        Some(body) => body
            .trim()
            .chars()
            .next()
            .is_some_and(|c| c.is_lowercase()),
        None => false,
    }
}

/// Remedy abbreviation shape check, after stripping a trailing period.
pub fn is_remedy_token(text: &str) -> bool {
    let trimmed = text.trim().trim_end_matches('.');
    if trimmed.len() > MAX_REMEDY_LEN || is_noise(trimmed) {
        return false;
    }
    REMEDY_SHAPE_RES.iter().any(|re| re.is_match(trimmed))
}

/// Scan free text for remedy tokens: runs of letters/hyphens terminated by a
/// literal period, left to right, non-overlapping. Tokens come back
/// period-stripped and capitalized (`bell.` → `Bell`).
pub fn extract_remedy_tokens(text: &str) -> Vec<String> {
    REMEDY_TOKEN_RE
        .find_iter(text)
        .map(|m| capitalize(m.as_str().trim_end_matches('.').trim()))
        .collect()
}

fn mostly_uppercase(text: &str) -> bool {
    let upper = text.chars().filter(|c| c.is_ascii_uppercase()).count();
    let lower = text.chars().filter(|c| c.is_ascii_lowercase()).count();
    let total = upper + lower;
    total > 0 && upper * 10 >= total * 7
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}
