use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::index::{Indices, SearchIndex};
use crate::normalize;
use crate::query::{self, RemedyMatch};
use crate::repertory::{Repertory, ValidationReport};

const SOURCE_LABEL: &str = "Kent's Repertory of the Homoeopathic Materia Medica";

#[derive(Debug, Serialize)]
pub struct Metadata {
    pub source: String,
    pub processing_date: String,
    pub total_body_parts: usize,
    pub total_symptoms: usize,
    pub total_remedies: usize,
    /// category tags per canonical symptom
    pub symptom_categories: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ProcessedDocument<'a> {
    pub metadata: Metadata,
    pub data: &'a Repertory,
    pub search_index: &'a SearchIndex,
    pub validation_report: &'a ValidationReport,
}

/// Write the processed repertory document as pretty JSON. The only fatal
/// failure in the pipeline: everything upstream degrades to an empty or
/// partial structure, but an unwritable output is surfaced to the caller.
pub fn write_processed(
    path: &Path,
    repertory: &Repertory,
    indices: &Indices,
    report: &ValidationReport,
) -> Result<()> {
    let symptom_categories = indices
        .search
        .all_symptoms
        .iter()
        .map(|symptom| (symptom.clone(), normalize::categorize(symptom)))
        .collect();

    let document = ProcessedDocument {
        metadata: Metadata {
            source: SOURCE_LABEL.to_string(),
            processing_date: chrono::Utc::now().to_rfc3339(),
            total_body_parts: repertory.body_part_count(),
            total_symptoms: repertory.symptom_count(),
            total_remedies: repertory.remedy_count(),
            symptom_categories,
        },
        data: repertory,
        search_index: &indices.search,
        validation_report: report,
    };

    let json = serde_json::to_string_pretty(&document)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Processed data saved to {}", path.display());
    Ok(())
}

/// Load the repertory back out of a processed document.
pub fn load_repertory(path: &Path) -> Result<Repertory> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document: serde_json::Value = serde_json::from_str(&text)?;
    let data = document
        .get("data")
        .cloned()
        .with_context(|| format!("No 'data' key in {}", path.display()))?;
    Ok(serde_json::from_value(data)?)
}

// ── Sample queries ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleQuery {
    #[serde(rename = "type")]
    pub kind: String,
    pub body_parts: Vec<String>,
    pub symptoms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_remedies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SampleResult {
    query: SampleQuery,
    results: Vec<RemedyMatch>,
    remedy_count: usize,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct SampleDocument {
    samples: Vec<SampleQuery>,
    test_results: BTreeMap<String, SampleResult>,
}

/// Generate representative queries against the built repertory and persist
/// them with their results, as a regression fixture for later runs.
pub fn write_sample_queries(path: &Path, repertory: &Repertory) -> Result<()> {
    let samples = create_sample_queries(repertory);

    let mut test_results = BTreeMap::new();
    for (i, sample) in samples.iter().enumerate() {
        let results = query::find_remedies(repertory, &sample.body_parts, &sample.symptoms);
        test_results.insert(
            format!("query_{}", i + 1),
            SampleResult {
                query: sample.clone(),
                remedy_count: results.len(),
                results,
                status: "success",
            },
        );
    }

    let document = SampleDocument { samples, test_results };
    let json = serde_json::to_string_pretty(&document)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Sample queries saved to {}", path.display());
    Ok(())
}

fn create_sample_queries(repertory: &Repertory) -> Vec<SampleQuery> {
    let mut samples = Vec::new();
    let body_parts: Vec<&String> = repertory.0.keys().take(5).collect();

    // Single body part, single symptom (with expected remedies)
    for body_part in &body_parts {
        for symptom in repertory.0[*body_part].keys().take(3) {
            let expected = repertory
                .remedies_at(body_part, symptom)
                .map(|remedies| remedies.into_iter().collect());
            samples.push(SampleQuery {
                kind: "single_body_part_single_symptom".to_string(),
                body_parts: vec![(*body_part).clone()],
                symptoms: vec![symptom.clone()],
                expected_remedies: expected,
                description: None,
            });
        }
    }

    // Multiple body parts sharing a common symptom
    for symptom in ["pain", "burning", "inflammation"] {
        let with_symptom: Vec<String> = repertory
            .0
            .iter()
            .filter(|(_, symptoms)| symptoms.contains_key(symptom))
            .map(|(bp, _)| bp.clone())
            .take(3)
            .collect();
        if with_symptom.len() >= 2 {
            samples.push(SampleQuery {
                kind: "multiple_body_parts_single_symptom".to_string(),
                body_parts: with_symptom,
                symptoms: vec![symptom.to_string()],
                expected_remedies: None,
                description: Some(format!("Multiple body parts with {}", symptom)),
            });
        }
    }

    // Single body part, multiple symptoms
    for body_part in body_parts.iter().take(3) {
        let symptoms: Vec<String> = repertory.0[*body_part].keys().take(3).cloned().collect();
        if symptoms.len() >= 2 {
            samples.push(SampleQuery {
                kind: "single_body_part_multiple_symptoms".to_string(),
                body_parts: vec![(*body_part).clone()],
                symptoms,
                expected_remedies: None,
                description: Some(format!("Multiple symptoms in {}", body_part)),
            });
        }
    }

    // Multiple body parts, multiple symptoms
    if body_parts.len() >= 2 {
        let symptoms: Vec<String> = body_parts
            .iter()
            .take(2)
            .filter_map(|bp| repertory.0[*bp].keys().next().cloned())
            .collect();
        samples.push(SampleQuery {
            kind: "multiple_body_parts_multiple_symptoms".to_string(),
            body_parts: body_parts.iter().take(2).map(|bp| (*bp).clone()).collect(),
            symptoms,
            expected_remedies: None,
            description: Some("Complex multi-part query".to_string()),
        });
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index;

    fn sample_repertory() -> Repertory {
        let mut r = Repertory::new();
        r.insert("HEAD", "pain", "throbbing", ["Bell".to_string(), "Nux-v".to_string()]);
        r.insert("HEAD", "burning", "general", ["Ars".to_string()]);
        r.insert("STOMACH", "pain", "general", ["Nux-v".to_string()]);
        r.insert("STOMACH", "nausea", "general", ["Ip".to_string()]);
        r
    }

    #[test]
    fn roundtrip_through_processed_document() {
        let repertory = sample_repertory();
        let indices = index::build(&repertory);
        let report = repertory.validate();

        let dir = std::env::temp_dir().join("kent_export_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("processed.json");
        write_processed(&path, &repertory, &indices, &report).unwrap();

        let loaded = load_repertory(&path).unwrap();
        assert_eq!(loaded, repertory);
    }

    #[test]
    fn samples_cover_query_shapes() {
        let samples = create_sample_queries(&sample_repertory());
        let kinds: Vec<&str> = samples.iter().map(|s| s.kind.as_str()).collect();
        assert!(kinds.contains(&"single_body_part_single_symptom"));
        assert!(kinds.contains(&"multiple_body_parts_single_symptom"));
        assert!(kinds.contains(&"single_body_part_multiple_symptoms"));
        assert!(kinds.contains(&"multiple_body_parts_multiple_symptoms"));
    }

    #[test]
    fn single_single_samples_carry_expected_remedies() {
        let samples = create_sample_queries(&sample_repertory());
        let single = samples
            .iter()
            .find(|s| s.kind == "single_body_part_single_symptom")
            .unwrap();
        assert!(single.expected_remedies.is_some());
    }

    #[test]
    fn sample_document_written() {
        let dir = std::env::temp_dir().join("kent_export_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("samples.json");
        write_sample_queries(&path, &sample_repertory()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value.get("samples").is_some());
        assert!(value.get("test_results").is_some());
    }
}
