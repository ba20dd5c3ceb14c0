use std::collections::HashSet;

use crate::parser::classify;
use crate::repertory::Repertory;

const DEFAULT_SUB_SYMPTOM: &str = "general";

/// Tally of what happened while parsing one page. Unparseable lines are a
/// tolerance policy, not an error: repertory text is typographically noisy
/// and a strict parser would reject most real pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseDiagnostics {
    pub lines: usize,
    pub skipped: usize,
    pub records: usize,
}

impl ParseDiagnostics {
    pub fn absorb(&mut self, other: ParseDiagnostics) {
        self.lines += other.lines;
        self.skipped += other.skipped;
        self.records += other.records;
    }
}

/// Parse one page's text lines into a partial repertory.
///
/// `body_parts` is the candidate set from the page's navigation anchors.
/// A body-part section boundary is only trusted when the candidate line is
/// immediately followed by a `p. <n>` marker — short all-caps remedy
/// abbreviations can coincidentally match a body-part name, so the page
/// marker is the single source of truth for section switches.
pub fn parse_page(
    lines: &[String],
    body_parts: &HashSet<String>,
) -> (Repertory, ParseDiagnostics) {
    let mut data = Repertory::new();
    let mut diag = ParseDiagnostics { lines: lines.len(), ..Default::default() };

    let mut current_body_part: Option<String> = None;
    let mut current_symptom: Option<String> = None;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();

        // Body-part switch: candidate name + page marker on the next line
        if body_parts.contains(line)
            && lines.get(i + 1).is_some_and(|next| classify::is_page_marker(next))
        {
            current_body_part = Some(line.to_string());
            current_symptom = None;
            i += 2; // consume the page-marker line too
            continue;
        }

        // Cross-references point elsewhere in the book; their remedy text
        // belongs to the referenced rubric, not this one
        if classify::is_noise(line) || line.contains("See ") {
            diag.skipped += 1;
            i += 1;
            continue;
        }

        let remainder = match classify::split_main_header(line) {
            Some((symptom, rest)) => {
                current_symptom = Some(symptom);
                rest
            }
            None if current_symptom.is_some() => line.to_string(),
            None => {
                diag.skipped += 1;
                i += 1;
                continue;
            }
        };

        let (sub_symptom, remedy_text) = split_remainder(&remainder);
        let remedies = classify::extract_remedy_tokens(remedy_text);

        match (&current_body_part, &current_symptom) {
            (Some(bp), Some(symptom)) if !remedies.is_empty() => {
                data.insert(bp, symptom, sub_symptom, remedies);
                diag.records += 1;
            }
            _ => diag.skipped += 1,
        }

        i += 1;
    }

    (data, diag)
}

/// Split a remainder into (sub-symptom, remedy text) on the first colon.
/// No colon means the whole remainder is remedy text under "general".
fn split_remainder(remainder: &str) -> (&str, &str) {
    match remainder.split_once(':') {
        Some((sub, meds)) => {
            let sub = sub.trim_matches(|c: char| c == ' ' || c == ',' || c == '.');
            if sub.is_empty() {
                (DEFAULT_SUB_SYMPTOM, meds)
            } else {
                (sub, meds)
            }
        }
        None => (DEFAULT_SUB_SYMPTOM, remainder),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(lines: &[&str], body_parts: &[&str]) -> (Repertory, ParseDiagnostics) {
        let lines: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        let body_parts: HashSet<String> = body_parts.iter().map(|s| s.to_string()).collect();
        parse_page(&lines, &body_parts)
    }

    #[test]
    fn body_part_symptom_sub_symptom() {
        let (data, _) = parse(
            &["HEAD", "p. 109", "PAIN: throbbing, worse motion: Bell. Nux-v."],
            &["HEAD"],
        );
        let remedies: Vec<&String> =
            data.0["HEAD"]["PAIN"]["throbbing, worse motion"].iter().collect();
        assert_eq!(remedies, ["Bell", "Nux-v"]);
    }

    #[test]
    fn body_part_without_page_marker_not_trusted() {
        // "HEAD" without a following "p. <n>" line is not a section switch,
        // so nothing is emitted under it
        let (data, _) = parse(&["HEAD", "PAIN: Bell."], &["HEAD"]);
        assert!(data.is_empty());
    }

    #[test]
    fn continuation_lines_attach_to_current_symptom() {
        let (data, _) = parse(
            &["HEAD", "p. 109", "PAIN: Bell.", "burning: Ars. Phos."],
            &["HEAD"],
        );
        assert!(data.0["HEAD"]["PAIN"].contains_key("general"));
        let burning: Vec<&String> = data.0["HEAD"]["PAIN"]["burning"].iter().collect();
        assert_eq!(burning, ["Ars", "Phos"]);
    }

    #[test]
    fn missing_sub_symptom_defaults_to_general() {
        let (data, _) = parse(&["HEAD", "p. 109", "HEAT Amyl-n. Bell."], &["HEAD"]);
        assert!(data.0["HEAD"]["HEAT"].contains_key("general"));
    }

    #[test]
    fn empty_colon_prefix_defaults_to_general() {
        let (data, _) = parse(&["HEAD", "p. 109", "PAIN , .: Bell."], &["HEAD"]);
        assert!(data.0["HEAD"]["PAIN"].contains_key("general"));
    }

    #[test]
    fn lines_before_any_context_are_skipped() {
        let (data, diag) = parse(&["throbbing: Bell.", "some stray text"], &[]);
        assert!(data.is_empty());
        assert_eq!(diag.skipped, 2);
    }

    #[test]
    fn noise_lines_are_skipped() {
        let (data, diag) = parse(
            &["HEAD", "p. 109", "next", "Copyright © 2000 Médi-T", "PAIN: Bell."],
            &["HEAD"],
        );
        assert_eq!(diag.skipped, 2);
        assert_eq!(data.0["HEAD"].len(), 1);
    }

    #[test]
    fn cross_references_are_skipped() {
        let (data, _) = parse(
            &["HEAD", "p. 109", "PAIN: See Vertigo. Bell."],
            &["HEAD"],
        );
        assert!(data.is_empty());
    }

    #[test]
    fn symptom_without_remedies_emits_nothing() {
        let (data, diag) = parse(&["HEAD", "p. 109", "PAIN: throbbing and dull"], &["HEAD"]);
        assert!(data.is_empty());
        assert_eq!(diag.records, 0);
    }

    #[test]
    fn empty_page_is_valid() {
        let (data, diag) = parse(&[], &[]);
        assert!(data.is_empty());
        assert_eq!(diag.lines, 0);
    }

    #[test]
    fn section_switch_resets_symptom() {
        let (data, _) = parse(
            &[
                "HEAD", "p. 109",
                "PAIN: Bell.",
                "EYE", "p. 235",
                "burning: Ars.",
            ],
            &["HEAD", "EYE"],
        );
        // "burning" has no symptom context after the switch, so nothing
        // lands under EYE
        assert!(!data.0.contains_key("EYE"));
        assert!(data.0.contains_key("HEAD"));
    }
}
