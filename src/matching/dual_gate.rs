use crate::models::{CandidateMatch, MatchDecision};
use std::collections::HashMap;

pub const REASON_ABOVE_THRESHOLD: &str = "score_above_threshold";
pub const REASON_BELOW_THRESHOLD: &str = "score_below_threshold";

/// Decisions from both validation passes over one candidate set.
#[derive(Debug, Clone)]
pub struct DualGateOutcome {
    pub forward: Vec<MatchDecision>,
    pub inverse: Vec<MatchDecision>,
}

/// Group candidates by a key, pick each group's best-scoring candidate
/// (first wins on ties), and gate it against the threshold. Groups are
/// emitted in first-encounter order so output is deterministic.
fn gate_pass<'a>(
    candidates: &'a [CandidateMatch],
    threshold: f64,
    key: impl Fn(&'a CandidateMatch) -> &'a str,
    matched_id: impl Fn(&'a CandidateMatch) -> &'a str,
) -> Vec<MatchDecision> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&CandidateMatch>> = HashMap::new();

    for candidate in candidates {
        let k = key(candidate);
        groups
            .entry(k)
            .or_insert_with(|| {
                order.push(k);
                Vec::new()
            })
            .push(candidate);
    }

    let mut decisions = Vec::with_capacity(order.len());

    for k in order {
        let group = &groups[k];

        let mut best = group[0];
        for &candidate in &group[1..] {
            if candidate.score > best.score {
                best = candidate;
            }
        }

        if best.score >= threshold {
            decisions.push(MatchDecision {
                source_id: k.to_string(),
                matched_id: Some(matched_id(best).to_string()),
                matched_dataset: Some(best.dataset.clone()),
                score: best.score,
                passed: true,
                reason: REASON_ABOVE_THRESHOLD.to_string(),
            });
        } else {
            decisions.push(MatchDecision {
                source_id: k.to_string(),
                matched_id: None,
                matched_dataset: None,
                score: best.score,
                passed: false,
                reason: REASON_BELOW_THRESHOLD.to_string(),
            });
        }
    }

    decisions
}

/// Forward validation: for each extracted event, does its best reference
/// match clear the threshold? Precision-oriented signal.
pub fn forward_validation(candidates: &[CandidateMatch], threshold: f64) -> Vec<MatchDecision> {
    gate_pass(
        candidates,
        threshold,
        |c| c.extracted_id.as_str(),
        |c| c.ref_id.as_str(),
    )
}

/// Inverse validation: for each reference event, does its best extracted
/// match clear the threshold? Coverage-oriented signal.
pub fn inverse_validation(candidates: &[CandidateMatch], threshold: f64) -> Vec<MatchDecision> {
    gate_pass(
        candidates,
        threshold,
        |c| c.ref_id.as_str(),
        |c| c.extracted_id.as_str(),
    )
}

/// Run both passes over the same candidate set.
pub fn run_dual_gate(candidates: &[CandidateMatch], threshold: f64) -> DualGateOutcome {
    DualGateOutcome {
        forward: forward_validation(candidates, threshold),
        inverse: inverse_validation(candidates, threshold),
    }
}
