use crate::models::{CandidateMatch, CanonicalEvent, FeatureScores};
use std::collections::HashSet;

/// Temporal proximity in [0, 1]: 1.0 when the extracted date falls inside
/// the reference's [start, end] range, decaying as 1 / (1 + days) with the
/// distance to the nearest endpoint. 0.0 when either side is undated.
fn time_score(e: &CanonicalEvent, r: &CanonicalEvent) -> f64 {
    let (Some(e_d), Some(r_start)) = (e.date_start, r.date_start) else {
        return 0.0;
    };
    let r_end = r.date_end.unwrap_or(r_start);

    if r_start <= e_d && e_d <= r_end {
        return 1.0;
    }

    let delta = (e_d - r_start)
        .num_days()
        .abs()
        .min((e_d - r_end).num_days().abs());
    1.0 / (1.0 + delta as f64)
}

/// Weak location agreement: 1.0 when either location string contains the
/// other (case-insensitive), else 0.0. No partial credit.
fn location_score(e: &CanonicalEvent, r: &CanonicalEvent) -> f64 {
    let (Some(e_loc), Some(r_loc)) = (e.location_name.as_deref(), r.location_name.as_deref())
    else {
        return 0.0;
    };

    let e_loc = e_loc.to_lowercase();
    let r_loc = r_loc.to_lowercase();

    if e_loc.is_empty() || r_loc.is_empty() {
        return 0.0;
    }

    if r_loc.contains(&e_loc) || e_loc.contains(&r_loc) {
        1.0
    } else {
        0.0
    }
}

/// Jaccard similarity of whitespace-tokenised, lowercased text.
fn text_score(e: &CanonicalEvent, r: &CanonicalEvent) -> f64 {
    let e_lower = e.text.to_lowercase();
    let r_lower = r.text.to_lowercase();

    let e_tokens: HashSet<&str> = e_lower.split_whitespace().collect();
    let r_tokens: HashSet<&str> = r_lower.split_whitespace().collect();

    if e_tokens.is_empty() || r_tokens.is_empty() {
        return 0.0;
    }

    let intersection = e_tokens.intersection(&r_tokens).count();
    let union = e_tokens.union(&r_tokens).count();

    intersection as f64 / union as f64
}

/// Compute similarity features and the combined score for one candidate
/// pair. The weights are part of the matching contract; downstream
/// thresholds are calibrated against them.
pub fn score_candidate(extracted: &CanonicalEvent, reference: &CanonicalEvent) -> CandidateMatch {
    let t = time_score(extracted, reference);
    let l = location_score(extracted, reference);
    let x = text_score(extracted, reference);

    let score = 0.5 * t + 0.3 * l + 0.2 * x;

    CandidateMatch {
        extracted_id: extracted.id.clone(),
        ref_id: reference.id.clone(),
        dataset: reference
            .meta
            .dataset
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        features: FeatureScores {
            time: t,
            location: l,
            text: x,
        },
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;
    use chrono::NaiveDate;

    fn event(
        id: &str,
        start: Option<&str>,
        end: Option<&str>,
        location: Option<&str>,
        text: &str,
    ) -> CanonicalEvent {
        let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        CanonicalEvent {
            id: id.to_string(),
            kind: "flood".to_string(),
            date_start: start.map(parse),
            date_end: end.map(parse),
            location_name: location.map(str::to_string),
            country: None,
            lat: None,
            lon: None,
            text: text.to_string(),
            meta: Provenance::missing(),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_time_score_inside_range() {
        let e = event("e", Some("2024-03-02"), None, None, "");
        let r = event("r", Some("2024-03-01"), Some("2024-03-05"), None, "");
        let m = score_candidate(&e, &r);
        assert!(close(m.features.time, 1.0));
    }

    #[test]
    fn test_time_score_decays_with_distance() {
        let e = event("e", Some("2024-03-08"), None, None, "");
        let r = event("r", Some("2024-03-01"), Some("2024-03-05"), None, "");
        // 3 days past the range end.
        assert!(close(score_candidate(&e, &r).features.time, 1.0 / 4.0));

        let undated = event("e", None, None, None, "");
        assert!(close(score_candidate(&undated, &r).features.time, 0.0));
    }

    #[test]
    fn test_location_score_is_binary_substring() {
        let e = event("e", None, None, Some("Jakarta, Indonesia"), "");
        let r = event("r", None, None, Some("jakarta"), "");
        assert!(close(score_candidate(&e, &r).features.location, 1.0));

        let r2 = event("r", None, None, Some("Surabaya"), "");
        assert!(close(score_candidate(&e, &r2).features.location, 0.0));

        let r3 = event("r", None, None, None, "");
        assert!(close(score_candidate(&e, &r3).features.location, 0.0));
    }

    #[test]
    fn test_text_score_jaccard() {
        let e = event("e", None, None, None, "flood in jakarta");
        let r = event("r", None, None, None, "jakarta flood warning issued");
        // intersection {flood, jakarta} = 2, union = 5
        assert!(close(score_candidate(&e, &r).features.text, 2.0 / 5.0));

        let empty = event("r", None, None, None, "");
        assert!(close(score_candidate(&e, &empty).features.text, 0.0));
    }

    #[test]
    fn test_combined_score_weights() {
        let e = event(
            "e",
            Some("2024-03-02"),
            None,
            Some("Jakarta"),
            "flood in jakarta",
        );
        let r = event(
            "r",
            Some("2024-03-01"),
            Some("2024-03-05"),
            Some("Jakarta, Indonesia"),
            "jakarta flood warning issued",
        );
        let m = score_candidate(&e, &r);
        assert!(close(m.score, 0.5 * 1.0 + 0.3 * 1.0 + 0.2 * (2.0 / 5.0)));
    }

    #[test]
    fn test_dataset_defaults_to_unknown() {
        let e = event("e", None, None, None, "");
        let r = event("r", None, None, None, "");
        assert_eq!(score_candidate(&e, &r).dataset, "unknown");
    }
}
