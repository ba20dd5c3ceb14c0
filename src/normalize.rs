use std::sync::LazyLock;

use regex::Regex;

use crate::repertory::Repertory;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static EDGE_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-:,.\s]+|[-:,.\s]+$").unwrap());

/// Recognized symptom roots, checked by substring containment. First match
/// in this order wins; "burning-itching" collapses to whichever root comes
/// first here. That ambiguity is accepted.
const SYMPTOM_ROOTS: &[&str] = &[
    "aching",
    "burning",
    "pain",
    "throbbing",
    "shooting",
    "stinging",
    "cramping",
    "inflammation",
    "swelling",
    "numbness",
    "weakness",
    "anxiety",
    "depression",
    "irritability",
    "restlessness",
    "fever",
    "chills",
    "nausea",
    "vomiting",
    "diarrhea",
    "constipation",
    "cough",
    "congestion",
    "discharge",
    "eruption",
    "itching",
    "dryness",
    "moisture",
];

const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("pain", &["pain", "aching", "sore", "hurt"]),
    ("burning", &["burning", "burn", "hot"]),
    ("inflammation", &["inflammation", "swelling", "inflamed"]),
    ("neurological", &["numbness", "tingling", "weakness"]),
    ("mental", &["anxiety", "fear", "worry", "depression", "sad"]),
    ("digestive", &["nausea", "vomiting", "diarrhea", "constipation"]),
    ("respiratory", &["cough", "congestion", "breathing"]),
    ("skin", &["itching", "rash", "eruption", "dry"]),
];

/// Canonical form of a symptom: lowercased, whitespace collapsed, edge
/// punctuation stripped, then collapsed to a known root if one is contained.
pub fn normalize_symptom(text: &str) -> String {
    let lowered = text.to_lowercase();
    let collapsed = WHITESPACE_RE.replace_all(lowered.trim(), " ");
    let cleaned = EDGE_PUNCT_RE.replace_all(&collapsed, "").to_string();

    for root in SYMPTOM_ROOTS {
        if cleaned.contains(root) {
            return root.to_string();
        }
    }
    cleaned
}

/// Category tags for a symptom, drawn from a fixed vocabulary. Not mutually
/// exclusive; independent of `normalize_symptom`.
pub fn categorize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let tags: Vec<String> = CATEGORY_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| lowered.contains(kw)))
        .map(|(tag, _)| tag.to_string())
        .collect();
    if tags.is_empty() {
        vec!["general".to_string()]
    } else {
        tags
    }
}

/// Rewrite symptom and sub-symptom keys of a raw parse into canonical form.
/// Keys that collapse to the same canonical text union their remedy sets.
pub fn normalize_repertory(raw: &Repertory) -> Repertory {
    let mut canonical = Repertory::new();
    for (body_part, symptom, sub_symptom, remedies) in raw.leaves() {
        if remedies.is_empty() {
            continue;
        }
        canonical.insert(
            body_part,
            &normalize_symptom(symptom),
            &normalize_symptom(sub_symptom),
            remedies.iter().cloned(),
        );
    }
    canonical
}
