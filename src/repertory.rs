use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::parser::classify;

pub type RemedySet = BTreeSet<String>;
type SubSymptomMap = BTreeMap<String, RemedySet>;
type SymptomMap = BTreeMap<String, SubSymptomMap>;

/// The full hierarchical structure: body part → symptom → sub-symptom →
/// remedy set. BTree containers keep keys ordered and remedy leaves
/// sorted + deduplicated, which makes `merge` commutative and idempotent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Repertory(pub BTreeMap<String, SymptomMap>);

impl Repertory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append remedies at a leaf, creating intermediate maps as needed.
    pub fn insert<I>(&mut self, body_part: &str, symptom: &str, sub_symptom: &str, remedies: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.0
            .entry(body_part.to_string())
            .or_default()
            .entry(symptom.to_string())
            .or_default()
            .entry(sub_symptom.to_string())
            .or_default()
            .extend(remedies);
    }

    /// Union another partial (typically one page's output) into this one.
    /// Order-independent: pages retried after transient fetch failures can
    /// arrive in any order, or twice, without changing the result.
    pub fn merge(&mut self, other: Repertory) {
        for (body_part, symptoms) in other.0 {
            let bp_entry = self.0.entry(body_part).or_default();
            for (symptom, subs) in symptoms {
                let sym_entry = bp_entry.entry(symptom).or_default();
                for (sub, remedies) in subs {
                    sym_entry.entry(sub).or_default().extend(remedies);
                }
            }
        }
    }

    /// Drop empty leaves, then empty symptoms and body parts, so the final
    /// structure never maps a key to nothing.
    pub fn prune_empty(&mut self) {
        for symptoms in self.0.values_mut() {
            for subs in symptoms.values_mut() {
                subs.retain(|_, remedies| !remedies.is_empty());
            }
            symptoms.retain(|_, subs| !subs.is_empty());
        }
        self.0.retain(|_, symptoms| !symptoms.is_empty());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn body_part_count(&self) -> usize {
        self.0.len()
    }

    /// Distinct symptom keys across all body parts.
    pub fn symptom_count(&self) -> usize {
        self.0
            .values()
            .flat_map(|symptoms| symptoms.keys())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Distinct remedies across all leaves.
    pub fn remedy_count(&self) -> usize {
        self.leaves().flat_map(|(_, _, _, r)| r.iter()).collect::<BTreeSet<_>>().len()
    }

    /// Total number of (body part, symptom, sub-symptom) leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    pub fn leaves(&self) -> impl Iterator<Item = (&str, &str, &str, &RemedySet)> {
        self.0.iter().flat_map(|(bp, symptoms)| {
            symptoms.iter().flat_map(move |(sym, subs)| {
                subs.iter()
                    .map(move |(sub, remedies)| (bp.as_str(), sym.as_str(), sub.as_str(), remedies))
            })
        })
    }

    /// All remedies under (body part, symptom), sub-symptoms unioned.
    /// Remedy indication granularity for queries is body part + symptom.
    pub fn remedies_at(&self, body_part: &str, symptom: &str) -> Option<RemedySet> {
        let subs = self.0.get(body_part)?.get(symptom)?;
        let mut remedies = RemedySet::new();
        for leaf in subs.values() {
            remedies.extend(leaf.iter().cloned());
        }
        (!remedies.is_empty()).then_some(remedies)
    }

    /// Post-hoc structural audit. Anomalies are reported, never thrown;
    /// persistence proceeds regardless.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport {
            total_body_parts: self.body_part_count(),
            total_symptoms: self.symptom_count(),
            total_remedies: self.remedy_count(),
            ..Default::default()
        };

        for (body_part, symptoms) in &self.0 {
            if symptoms.is_empty() {
                report.empty_body_parts.push(body_part.clone());
            }
        }

        let mut symptom_counts: Vec<(String, usize)> = self
            .0
            .iter()
            .map(|(bp, symptoms)| (bp.clone(), symptoms.len()))
            .collect();
        symptom_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        symptom_counts.truncate(10);
        report.body_parts_with_most_symptoms = symptom_counts;

        let mut remedy_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for (_, _, _, remedies) in self.leaves() {
            for remedy in remedies {
                *remedy_counts.entry(remedy).or_default() += 1;
            }
        }
        let mut most_common: Vec<(String, usize)> =
            remedy_counts.into_iter().map(|(r, n)| (r.to_string(), n)).collect();
        most_common.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        most_common.truncate(20);
        report.most_common_remedies = most_common;

        for (bp, sym, sub, remedies) in self.leaves() {
            if remedies.is_empty() {
                report.issues.push(format!("Empty remedy list for {}:{}:{}", bp, sym, sub));
            }
            // A classifier escape: leaf text that still looks like page noise
            if classify::is_noise(sym) || (sub != "general" && classify::is_noise(sub)) {
                report.issues.push(format!("Noise-like leaf text at {}:{}:{}", bp, sym, sub));
            }
            for remedy in remedies {
                if !classify::is_remedy_token(remedy) {
                    report.issues.push(format!(
                        "Non-remedy-shaped token '{}' at {}:{}:{}",
                        remedy, bp, sym, sub
                    ));
                }
            }
        }

        report
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_body_parts: usize,
    pub total_symptoms: usize,
    pub total_remedies: usize,
    pub empty_body_parts: Vec<String>,
    pub body_parts_with_most_symptoms: Vec<(String, usize)>,
    pub most_common_remedies: Vec<(String, usize)>,
    pub issues: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(remedies: &[&str]) -> Repertory {
        let mut r = Repertory::new();
        r.insert("HEAD", "PAIN", "general", remedies.iter().map(|s| s.to_string()));
        r
    }

    #[test]
    fn merge_unions_and_sorts() {
        let mut acc = page(&["Nux-v"]);
        acc.merge(page(&["Bell"]));
        let remedies = acc.remedies_at("HEAD", "PAIN").unwrap();
        let as_vec: Vec<&String> = remedies.iter().collect();
        assert_eq!(as_vec, ["Bell", "Nux-v"]);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut acc = Repertory::new();
        acc.merge(page(&["Bell", "Ars"]));
        let once = acc.clone();
        acc.merge(page(&["Bell", "Ars"]));
        assert_eq!(acc, once);
    }

    #[test]
    fn merge_is_order_independent() {
        let a = page(&["Bell"]);
        let mut b = Repertory::new();
        b.insert("HEAD", "HEAT", "flushes", ["Amyl-n".to_string()]);

        let mut ab = Repertory::new();
        ab.merge(a.clone());
        ab.merge(b.clone());

        let mut ba = Repertory::new();
        ba.merge(b);
        ba.merge(a);

        assert_eq!(ab, ba);
    }

    #[test]
    fn duplicate_remedy_across_pages_kept_once() {
        let mut acc = page(&["Bell"]);
        acc.merge(page(&["Bell"]));
        assert_eq!(acc.remedies_at("HEAD", "PAIN").unwrap().len(), 1);
    }

    #[test]
    fn prune_removes_empty_branches() {
        let mut r = Repertory::new();
        r.insert("HEAD", "PAIN", "general", std::iter::empty());
        r.insert("MIND", "ANXIETY", "general", ["Acon".to_string()]);
        r.prune_empty();
        assert!(!r.0.contains_key("HEAD"));
        assert!(r.0.contains_key("MIND"));
        assert!(r.leaves().all(|(_, _, _, remedies)| !remedies.is_empty()));
    }

    #[test]
    fn remedies_at_flattens_sub_symptoms() {
        let mut r = Repertory::new();
        r.insert("HEAD", "PAIN", "throbbing", ["Bell".to_string()]);
        r.insert("HEAD", "PAIN", "burning", ["Ars".to_string()]);
        let remedies = r.remedies_at("HEAD", "PAIN").unwrap();
        assert_eq!(remedies.len(), 2);
    }

    #[test]
    fn validation_flags_noise_leaves() {
        let mut r = Repertory::new();
        r.insert("HEAD", "p. 109", "general", ["Bell".to_string()]);
        let report = r.validate();
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("Noise-like"));
    }

    #[test]
    fn validation_counts() {
        let mut r = page(&["Bell", "Nux-v"]);
        r.insert("MIND", "ANXIETY", "general", ["Acon".to_string(), "Bell".to_string()]);
        let report = r.validate();
        assert_eq!(report.total_body_parts, 2);
        assert_eq!(report.total_symptoms, 2);
        assert_eq!(report.total_remedies, 3);
        assert_eq!(report.most_common_remedies[0], ("Bell".to_string(), 2));
    }
}
