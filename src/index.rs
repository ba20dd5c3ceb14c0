use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::repertory::Repertory;

/// Denormalized snapshot for query/UI convenience, serialized into the
/// processed document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchIndex {
    pub all_body_parts: BTreeSet<String>,
    pub all_symptoms: BTreeSet<String>,
    pub all_remedies: BTreeSet<String>,
    pub symptoms_by_body_part: BTreeMap<String, Vec<String>>,
    pub remedies_by_symptom: BTreeMap<String, BTreeSet<String>>,
    pub remedies_by_body_part: BTreeMap<String, BTreeSet<String>>,
    pub body_parts_by_symptom: BTreeMap<String, BTreeSet<String>>,
}

/// Read-only lookup structures derived from a frozen repertory. Rebuilt
/// wholesale after any re-scrape; never maintained incrementally.
#[derive(Debug, Clone, Default)]
pub struct Indices {
    /// remedy → (body part, symptom) locations; sub-symptom granularity is
    /// flattened here, body part + symptom is the unit of indication
    pub remedy_index: BTreeMap<String, BTreeSet<(String, String)>>,
    /// symptom → body parts where it occurs
    pub symptom_index: BTreeMap<String, BTreeSet<String>>,
    pub search: SearchIndex,
}

/// Single pass over every leaf. Deterministic: building twice from the same
/// repertory yields identical contents.
pub fn build(repertory: &Repertory) -> Indices {
    let mut indices = Indices::default();

    for (body_part, symptoms) in &repertory.0 {
        indices.search.all_body_parts.insert(body_part.clone());
        indices
            .search
            .symptoms_by_body_part
            .insert(body_part.clone(), symptoms.keys().cloned().collect());

        for (symptom, subs) in symptoms {
            indices.search.all_symptoms.insert(symptom.clone());
            indices
                .symptom_index
                .entry(symptom.clone())
                .or_default()
                .insert(body_part.clone());
            indices
                .search
                .body_parts_by_symptom
                .entry(symptom.clone())
                .or_default()
                .insert(body_part.clone());

            for remedies in subs.values() {
                for remedy in remedies {
                    indices.search.all_remedies.insert(remedy.clone());
                    indices
                        .remedy_index
                        .entry(remedy.clone())
                        .or_default()
                        .insert((body_part.clone(), symptom.clone()));
                    indices
                        .search
                        .remedies_by_symptom
                        .entry(symptom.clone())
                        .or_default()
                        .insert(remedy.clone());
                    indices
                        .search
                        .remedies_by_body_part
                        .entry(body_part.clone())
                        .or_default()
                        .insert(remedy.clone());
                }
            }
        }
    }

    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Repertory {
        let mut r = Repertory::new();
        r.insert("HEAD", "pain", "throbbing", ["Bell".to_string(), "Nux-v".to_string()]);
        r.insert("HEAD", "pain", "general", ["Bell".to_string()]);
        r.insert("STOMACH", "nausea", "general", ["Nux-v".to_string()]);
        r
    }

    #[test]
    fn remedy_index_flattens_sub_symptoms() {
        let indices = build(&sample());
        let bell = &indices.remedy_index["Bell"];
        // Two leaves under HEAD/pain collapse to one location
        assert_eq!(bell.len(), 1);
        assert!(bell.contains(&("HEAD".to_string(), "pain".to_string())));

        let nux = &indices.remedy_index["Nux-v"];
        assert_eq!(nux.len(), 2);
    }

    #[test]
    fn symptom_index_maps_to_body_parts() {
        let indices = build(&sample());
        assert!(indices.symptom_index["pain"].contains("HEAD"));
        assert!(indices.symptom_index["nausea"].contains("STOMACH"));
    }

    #[test]
    fn search_index_totals() {
        let indices = build(&sample());
        assert_eq!(indices.search.all_body_parts.len(), 2);
        assert_eq!(indices.search.all_symptoms.len(), 2);
        assert_eq!(indices.search.all_remedies.len(), 2);
        assert_eq!(indices.search.symptoms_by_body_part["HEAD"], vec!["pain"]);
        assert!(indices.search.remedies_by_body_part["HEAD"].contains("Bell"));
        assert!(indices.search.body_parts_by_symptom["nausea"].contains("STOMACH"));
    }

    #[test]
    fn rebuild_is_deterministic() {
        let repertory = sample();
        let a = build(&repertory);
        let b = build(&repertory);
        assert_eq!(a.remedy_index, b.remedy_index);
        assert_eq!(a.symptom_index, b.symptom_index);
        assert_eq!(a.search.all_remedies, b.search.all_remedies);
    }
}
