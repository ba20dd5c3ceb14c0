use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::index::Indices;
use crate::normalize;
use crate::repertory::Repertory;

/// One ranked result: a remedy, its match-count score, and where it matched.
/// The score is a simple count of matching (body part, symptom) locations,
/// each credited at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemedyMatch {
    pub remedy: String,
    pub score: usize,
    pub matches: Vec<String>,
    pub body_parts: Vec<String>,
    pub symptoms: Vec<String>,
}

/// Rank remedies indicated for the given body parts and symptoms.
///
/// Symptom terms fall back to their normalized form, so "PAIN" finds the
/// canonical "pain" key. Unknown names contribute zero matches; empty inputs
/// return an empty result. Sorted by score descending, then remedy name
/// ascending for reproducible output.
pub fn find_remedies(
    repertory: &Repertory,
    body_parts: &[String],
    symptoms: &[String],
) -> Vec<RemedyMatch> {
    if body_parts.is_empty() || symptoms.is_empty() {
        return Vec::new();
    }

    let body_parts: BTreeSet<String> = body_parts.iter().cloned().collect();
    let symptoms: BTreeSet<String> = symptoms.iter().cloned().collect();

    let mut locations: BTreeMap<String, BTreeSet<(String, String)>> = BTreeMap::new();
    for body_part in &body_parts {
        for term in &symptoms {
            // Exact key first, then the canonical form, so both raw-cased
            // input ("PAIN") and canonical input ("pain") resolve
            let (key, remedies) = match repertory.remedies_at(body_part, term) {
                Some(remedies) => (term.clone(), remedies),
                None => {
                    let canonical = normalize::normalize_symptom(term);
                    match repertory.remedies_at(body_part, &canonical) {
                        Some(remedies) => (canonical, remedies),
                        None => continue,
                    }
                }
            };
            for remedy in remedies {
                locations
                    .entry(remedy)
                    .or_default()
                    .insert((body_part.clone(), key.clone()));
            }
        }
    }

    let mut results: Vec<RemedyMatch> = locations
        .into_iter()
        .map(|(remedy, locs)| {
            let matches: Vec<String> =
                locs.iter().map(|(bp, sym)| format!("{}:{}", bp, sym)).collect();
            let body_parts: BTreeSet<String> = locs.iter().map(|(bp, _)| bp.clone()).collect();
            let symptoms: BTreeSet<String> = locs.iter().map(|(_, sym)| sym.clone()).collect();
            RemedyMatch {
                remedy,
                score: locs.len(),
                matches,
                body_parts: body_parts.into_iter().collect(),
                symptoms: symptoms.into_iter().collect(),
            }
        })
        .collect();

    results.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.remedy.cmp(&b.remedy)));
    results
}

/// Everything known about a single remedy, from the remedy index.
#[derive(Debug, Clone, Serialize)]
pub struct RemedyDetails {
    pub name: String,
    pub body_parts: Vec<String>,
    pub symptoms: Vec<String>,
    pub total_indications: usize,
}

pub fn remedy_details(indices: &Indices, name: &str) -> Option<RemedyDetails> {
    let locations = indices.remedy_index.get(name)?;
    let body_parts: BTreeSet<String> = locations.iter().map(|(bp, _)| bp.clone()).collect();
    let symptoms: BTreeSet<String> = locations.iter().map(|(_, sym)| sym.clone()).collect();
    Some(RemedyDetails {
        name: name.to_string(),
        body_parts: body_parts.into_iter().collect(),
        symptoms: symptoms.into_iter().collect(),
        total_indications: locations.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index;

    fn sample() -> Repertory {
        let mut r = Repertory::new();
        r.insert("HEAD", "pain", "throbbing, worse motion", ["Bell".to_string(), "Nux-v".to_string()]);
        r.insert("STOMACH", "nausea", "general", ["Nux-v".to_string(), "Ip".to_string()]);
        r.insert("STOMACH", "pain", "general", ["Nux-v".to_string()]);
        r
    }

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_location_tie_breaks_alphabetically() {
        let results = find_remedies(&sample(), &owned(&["HEAD"]), &owned(&["PAIN"]));
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].remedy, "Bell");
        assert_eq!(results[0].score, 1);
        assert_eq!(results[0].matches, vec!["HEAD:pain"]);
        assert_eq!(results[1].remedy, "Nux-v");
    }

    #[test]
    fn cross_location_scores_accumulate() {
        let results = find_remedies(
            &sample(),
            &owned(&["HEAD", "STOMACH"]),
            &owned(&["pain", "nausea"]),
        );
        assert_eq!(results[0].remedy, "Nux-v");
        assert_eq!(results[0].score, 3);
        assert_eq!(results[0].body_parts, owned(&["HEAD", "STOMACH"]));
        assert_eq!(results[0].symptoms, owned(&["nausea", "pain"]));
    }

    #[test]
    fn raw_keys_match_without_normalization() {
        // A pre-normalization repertory keeps the uppercase symptom key
        let mut raw = Repertory::new();
        raw.insert("HEAD", "PAIN", "throbbing, worse motion", ["Bell".to_string(), "Nux-v".to_string()]);
        let results = find_remedies(&raw, &owned(&["HEAD"]), &owned(&["PAIN"]));
        assert_eq!(results[0].remedy, "Bell");
        assert_eq!(results[0].matches, vec!["HEAD:PAIN"]);
        assert_eq!(results[1].remedy, "Nux-v");
    }

    #[test]
    fn empty_inputs_return_empty() {
        assert!(find_remedies(&sample(), &[], &[]).is_empty());
        assert!(find_remedies(&sample(), &owned(&["HEAD"]), &[]).is_empty());
    }

    #[test]
    fn unknown_names_contribute_nothing() {
        let results = find_remedies(&sample(), &owned(&["SPLEEN"]), &owned(&["pain"]));
        assert!(results.is_empty());
    }

    #[test]
    fn duplicate_inputs_do_not_inflate_scores() {
        let results =
            find_remedies(&sample(), &owned(&["HEAD", "HEAD"]), &owned(&["pain", "PAIN"]));
        assert_eq!(results[0].score, 1);
    }

    #[test]
    fn adding_a_symptom_never_lowers_scores() {
        let repertory = sample();
        let narrow = find_remedies(&repertory, &owned(&["HEAD", "STOMACH"]), &owned(&["pain"]));
        let wide = find_remedies(
            &repertory,
            &owned(&["HEAD", "STOMACH"]),
            &owned(&["pain", "nausea"]),
        );
        for before in &narrow {
            let after = wide.iter().find(|m| m.remedy == before.remedy).unwrap();
            assert!(after.score >= before.score);
        }
    }

    #[test]
    fn details_from_remedy_index() {
        let indices = index::build(&sample());
        let details = remedy_details(&indices, "Nux-v").unwrap();
        assert_eq!(details.total_indications, 3);
        assert_eq!(details.body_parts, owned(&["HEAD", "STOMACH"]));
        assert!(remedy_details(&indices, "Missing").is_none());
    }
}
