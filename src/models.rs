use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Raw disruption mention produced by the upstream extraction pipeline.
/// Fields may be missing, ambiguous, or inconsistent; nothing here is
/// validated beyond basic shape.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedRecord {
    pub event_id: String,
    pub disruption_type: String,
    pub event_date_raw: Option<String>,
    pub location_raw: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub published_at_raw: Option<String>,
    pub url: Option<String>,
    pub duration_hours: Option<f64>,
    pub evidence: Vec<String>,
    pub method: Option<String>,
    pub extras: HashMap<String, Value>,
    pub confidence: f64,
}

/// Raw event record from one external reference dataset.
#[derive(Debug, Clone, Serialize)]
pub struct RefEvent {
    pub ref_id: String,
    pub dataset: String,
    pub ref_type: String,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub location_name: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub text: Option<String>,
}

/// Where a canonical field value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    ExtractedEventDate,
    PublicationDateFallback,
    ReferenceDataset,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    ExtractedLocation,
    ReferenceDataset,
    Missing,
}

/// Field-level provenance for a canonical event. Records which fields were
/// inferred rather than extracted, and whether a field is weak (e.g. a
/// publish date standing in for an event date).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub url: Option<String>,
    pub dataset: Option<String>,
    pub date_source: DateSource,
    pub date_is_weak: bool,
    pub location_source: LocationSource,
    pub location_is_weak: bool,
}

impl Provenance {
    pub fn missing() -> Self {
        Self {
            url: None,
            dataset: None,
            date_source: DateSource::Missing,
            date_is_weak: true,
            location_source: LocationSource::Missing,
            location_is_weak: true,
        }
    }
}

/// Canonical form of one extracted mention. Both temporal signals are kept
/// separately because the deduplicator merges them independently.
#[derive(Debug, Clone, Serialize)]
pub struct MentionEvent {
    pub id: String,
    pub kind: String,
    pub event_date: Option<NaiveDate>,
    pub publish_date: Option<NaiveDate>,
    pub location_name: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub url: Option<String>,
    pub duration_hours: Option<f64>,
    pub evidence: Vec<String>,
    pub method: Option<String>,
    pub extras: HashMap<String, Value>,
    pub confidence: f64,
    pub provenance: Provenance,
}

/// Merged indicator value: a single scalar, or the ordered list of distinct
/// values contributed by the merged mentions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraValue {
    List(Vec<Value>),
    Scalar(Value),
}

/// One consolidated disruption event, merged from one or more mentions.
#[derive(Debug, Clone, Serialize)]
pub struct MergedEvent {
    pub event_id: String,
    pub disruption_type: String,
    pub event_date: Option<NaiveDate>,
    pub publish_date: Option<NaiveDate>,
    pub location_name: Option<String>,
    pub source_title: Option<String>,
    pub urls: Vec<String>,
    pub num_articles: usize,
    pub duration_hours: Option<f64>,
    pub evidence: Vec<String>,
    pub method: Vec<String>,
    pub extras: BTreeMap<String, ExtraValue>,
    pub confidence: f64,
}

/// Normalised event representation used for matching. Both extracted and
/// reference events are converted to this form.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalEvent {
    pub id: String,
    pub kind: String,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub location_name: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub text: String,
    pub meta: Provenance,
}

/// Named similarity features for one candidate pair.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FeatureScores {
    pub time: f64,
    pub location: f64,
    pub text: f64,
}

/// One extracted-reference candidate pair with similarity features.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateMatch {
    pub extracted_id: String,
    pub ref_id: String,
    pub dataset: String,
    pub features: FeatureScores,
    pub score: f64,
}

/// Final decision for one source event in a forward or inverse pass.
#[derive(Debug, Clone, Serialize)]
pub struct MatchDecision {
    pub source_id: String,
    pub matched_id: Option<String>,
    pub matched_dataset: Option<String>,
    pub score: f64,
    pub passed: bool,
    pub reason: String,
}
