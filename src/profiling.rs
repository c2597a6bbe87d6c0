use crate::models::ExtractedRecord;
use serde::Serialize;
use std::collections::HashSet;

/// Completeness metrics over an extracted-event batch. Diagnostic only;
/// nothing downstream keys off these numbers.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedProfile {
    pub n_events: usize,
    pub missing_date_rate: f64,
    pub missing_location_rate: f64,
    pub unknown_type_rate: f64,
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |s| s.trim().is_empty())
}

/// Compute basic profiling statistics for a batch of extracted events.
pub fn profile_extracted_events(events: &[ExtractedRecord]) -> ExtractedProfile {
    let n = events.len();
    if n == 0 {
        return ExtractedProfile {
            n_events: 0,
            missing_date_rate: 0.0,
            missing_location_rate: 0.0,
            unknown_type_rate: 0.0,
        };
    }

    let missing_date = events
        .iter()
        .filter(|e| is_blank(e.event_date_raw.as_deref()))
        .count();
    let missing_location = events
        .iter()
        .filter(|e| is_blank(e.location_raw.as_deref()))
        .count();
    let unknown_type = events
        .iter()
        .filter(|e| e.disruption_type == "unknown")
        .count();

    ExtractedProfile {
        n_events: n,
        missing_date_rate: missing_date as f64 / n as f64,
        missing_location_rate: missing_location as f64 / n as f64,
        unknown_type_rate: unknown_type as f64 / n as f64,
    }
}

/// Keep only events whose disruption type is in the allow-set. `None`
/// disables filtering.
pub fn filter_by_type(
    events: Vec<ExtractedRecord>,
    allowed_types: Option<&HashSet<String>>,
) -> Vec<ExtractedRecord> {
    let Some(allowed) = allowed_types else {
        return events;
    };

    let allowed: HashSet<String> = allowed.iter().map(|t| t.to_lowercase()).collect();

    events
        .into_iter()
        .filter(|e| allowed.contains(&e.disruption_type.to_lowercase()))
        .collect()
}
