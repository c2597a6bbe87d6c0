use crate::models::MatchDecision;
use serde::Serialize;
use std::collections::BTreeMap;

/// High-level validation metrics for one run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub forward_total: usize,
    pub forward_matched: usize,
    pub forward_match_rate: f64,
    pub inverse_total: usize,
    pub inverse_matched: usize,
    pub inverse_match_rate: f64,
}

/// Failure-reason histograms and the per-dataset breakdown of successful
/// forward matches.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub forward_failure_reasons: BTreeMap<String, usize>,
    pub inverse_failure_reasons: BTreeMap<String, usize>,
    pub forward_dataset_breakdown: BTreeMap<String, usize>,
}

/// Flat row shape for the per-decision CSV outputs.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRow {
    pub source_id: String,
    pub matched_id: Option<String>,
    pub matched_dataset: Option<String>,
    pub score: f64,
    pub passed: bool,
    pub reason: String,
}

fn match_rate(matched: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64
    }
}

/// Compute forward/inverse totals, matched counts, and match rates.
pub fn build_summary(forward: &[MatchDecision], inverse: &[MatchDecision]) -> Summary {
    let forward_matched = forward.iter().filter(|d| d.passed).count();
    let inverse_matched = inverse.iter().filter(|d| d.passed).count();

    Summary {
        forward_total: forward.len(),
        forward_matched,
        forward_match_rate: match_rate(forward_matched, forward.len()),
        inverse_total: inverse.len(),
        inverse_matched,
        inverse_match_rate: match_rate(inverse_matched, inverse.len()),
    }
}

/// Count failure reasons for unmatched events.
pub fn failure_reasons(decisions: &[MatchDecision]) -> BTreeMap<String, usize> {
    let mut reasons = BTreeMap::new();
    for d in decisions.iter().filter(|d| !d.passed) {
        *reasons.entry(d.reason.clone()).or_default() += 1;
    }
    reasons
}

/// Count successful matches by reference dataset.
pub fn dataset_breakdown(decisions: &[MatchDecision]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for d in decisions.iter().filter(|d| d.passed) {
        if let Some(dataset) = &d.matched_dataset {
            *counts.entry(dataset.clone()).or_default() += 1;
        }
    }
    counts
}

/// Assemble the diagnostics object from both decision sets.
pub fn build_diagnostics(forward: &[MatchDecision], inverse: &[MatchDecision]) -> Diagnostics {
    Diagnostics {
        forward_failure_reasons: failure_reasons(forward),
        inverse_failure_reasons: failure_reasons(inverse),
        forward_dataset_breakdown: dataset_breakdown(forward),
    }
}

/// Convert decisions into flat rows suitable for CSV output.
pub fn decisions_to_rows(decisions: &[MatchDecision]) -> Vec<DecisionRow> {
    decisions
        .iter()
        .map(|d| DecisionRow {
            source_id: d.source_id.clone(),
            matched_id: d.matched_id.clone(),
            matched_dataset: d.matched_dataset.clone(),
            score: d.score,
            passed: d.passed,
            reason: d.reason.clone(),
        })
        .collect()
}
