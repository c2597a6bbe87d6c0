use crate::config::MatchingConfig;
use crate::models::CanonicalEvent;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

/// Check whether two date ranges overlap once each is expanded by the
/// tolerance window. An absent start date on either side means no overlap
/// can be established.
fn date_overlap(
    d1_start: Option<NaiveDate>,
    d1_end: Option<NaiveDate>,
    d2_start: Option<NaiveDate>,
    d2_end: Option<NaiveDate>,
    max_days: i64,
) -> bool {
    let (Some(d1_start), Some(d2_start)) = (d1_start, d2_start) else {
        return false;
    };

    let d1_end = d1_end.unwrap_or(d1_start);
    let d2_end = d2_end.unwrap_or(d2_start);

    d1_start <= d2_end + Duration::days(max_days) && d1_end >= d2_start - Duration::days(max_days)
}

/// Coarse blocking: for each extracted event, propose the reference events
/// that share its type and overlap its date window. Only cheap filters run
/// here; scoring happens downstream.
///
/// Every extracted id appears in the output, possibly with an empty
/// candidate list. Undated events produce zero candidates. Candidates past
/// the per-event cap are dropped in encounter order.
pub fn generate_candidates(
    extracted: &[CanonicalEvent],
    references: &[CanonicalEvent],
    config: &MatchingConfig,
) -> Vec<(String, Vec<String>)> {
    let mut refs_by_kind: HashMap<&str, Vec<&CanonicalEvent>> = HashMap::new();
    for r in references {
        refs_by_kind.entry(r.kind.as_str()).or_default().push(r);
    }

    let mut candidates = Vec::with_capacity(extracted.len());

    for e in extracted {
        let mut matched: Vec<String> = Vec::new();

        if let Some(pool) = refs_by_kind.get(e.kind.as_str()) {
            for r in pool {
                if date_overlap(
                    e.date_start,
                    e.date_end,
                    r.date_start,
                    r.date_end,
                    config.max_days_apart,
                ) {
                    matched.push(r.id.clone());
                    if matched.len() >= config.max_candidates_per_event {
                        break;
                    }
                }
            }
        }

        candidates.push((e.id.clone(), matched));
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;

    fn canonical(id: &str, kind: &str, start: Option<&str>, end: Option<&str>) -> CanonicalEvent {
        let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        CanonicalEvent {
            id: id.to_string(),
            kind: kind.to_string(),
            date_start: start.map(parse),
            date_end: end.map(parse),
            location_name: None,
            country: None,
            lat: None,
            lon: None,
            text: String::new(),
            meta: Provenance::missing(),
        }
    }

    #[test]
    fn test_type_must_match_exactly() {
        let extracted = vec![canonical("e1", "flood", Some("2024-03-01"), None)];
        let references = vec![canonical("r1", "protest", Some("2024-03-01"), None)];
        let out = generate_candidates(&extracted, &references, &MatchingConfig::default());
        assert_eq!(out, vec![("e1".to_string(), vec![])]);
    }

    #[test]
    fn test_overlap_within_tolerance() {
        let extracted = vec![canonical("e1", "flood", Some("2024-03-10"), None)];
        let references = vec![
            canonical("r1", "flood", Some("2024-03-01"), Some("2024-03-04")),
            canonical("r2", "flood", Some("2024-02-01"), Some("2024-02-10")),
        ];
        let out = generate_candidates(&extracted, &references, &MatchingConfig::default());
        // r1's end is 6 days away (inside the 7-day window); r2 is not.
        assert_eq!(out[0].1, vec!["r1".to_string()]);
    }

    #[test]
    fn test_undated_events_produce_zero_candidates() {
        let extracted = vec![canonical("e1", "flood", None, None)];
        let references = vec![canonical("r1", "flood", Some("2024-03-01"), None)];
        let out = generate_candidates(&extracted, &references, &MatchingConfig::default());
        assert_eq!(out, vec![("e1".to_string(), vec![])]);

        let extracted = vec![canonical("e1", "flood", Some("2024-03-01"), None)];
        let references = vec![canonical("r1", "flood", None, None)];
        let out = generate_candidates(&extracted, &references, &MatchingConfig::default());
        assert_eq!(out, vec![("e1".to_string(), vec![])]);
    }

    #[test]
    fn test_candidate_cap_drops_in_encounter_order() {
        let extracted = vec![canonical("e1", "flood", Some("2024-03-01"), None)];
        let references: Vec<CanonicalEvent> = (0..10)
            .map(|i| canonical(&format!("r{i}"), "flood", Some("2024-03-01"), None))
            .collect();

        let config = MatchingConfig {
            max_candidates_per_event: 3,
            ..MatchingConfig::default()
        };
        let out = generate_candidates(&extracted, &references, &config);
        assert_eq!(
            out[0].1,
            vec!["r0".to_string(), "r1".to_string(), "r2".to_string()]
        );
    }
}
