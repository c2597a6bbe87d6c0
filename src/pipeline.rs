use crate::canonical;
use crate::config::{DedupeConfig, ValidationConfig};
use crate::dedupe::{self, DedupeStats};
use crate::error::{Result, ValidationError};
use crate::io::{self, MergedRow};
use crate::matching::{candidates, dual_gate, scoring};
use crate::models::{CandidateMatch, CanonicalEvent};
use crate::profiling;
use crate::reference::{self, loaders};
use crate::report::{self, Summary};
use chrono::{Duration, NaiveDate};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::info;

/// Consolidate raw extracted mentions into one record per disruption
/// event, writing the merged table as CSV and JSONL.
pub fn run_consolidation(
    input: &Path,
    output_dir: &Path,
    config: &DedupeConfig,
) -> Result<DedupeStats> {
    let records = io::load_extracted_records(input)?;
    info!("Loaded {} extracted records from {}", records.len(), input.display());

    let mentions: Vec<_> = records.iter().map(canonical::normalize_mention).collect();
    let (merged, stats) = dedupe::dedupe_events(mentions, config);

    fs::create_dir_all(output_dir)?;
    io::write_jsonl(&output_dir.join("consolidated_events.jsonl"), &merged)?;

    let rows: Vec<MergedRow> = merged
        .iter()
        .map(MergedRow::from_event)
        .collect::<Result<_>>()?;
    io::write_csv(&output_dir.join("consolidated_events.csv"), &rows)?;

    stats.log();
    Ok(stats)
}

/// Time window the reference caches should cover: the extracted events'
/// date span expanded by a buffer on both ends. The caching step itself
/// runs outside this crate; the window is logged so it can be supplied.
pub fn compute_cache_window(
    events: &[CanonicalEvent],
    buffer_days: i64,
) -> Result<(NaiveDate, NaiveDate)> {
    let dates: Vec<NaiveDate> = events.iter().filter_map(|e| e.date_start).collect();

    let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) else {
        return Err(ValidationError::Config(
            "no dated extracted events available".to_string(),
        ));
    };

    Ok((
        *min - Duration::days(buffer_days),
        *max + Duration::days(buffer_days),
    ))
}

/// Validate extracted events against cached reference datasets end to end
/// and write all output artifacts.
pub fn run_validation(
    extracted_path: &Path,
    reference_cache_dir: &Path,
    output_dir: &Path,
    config: &ValidationConfig,
) -> Result<Summary> {
    // 1) Load extracted disruption events, then restrict validation scope.
    let extracted_raw = io::load_extracted_records(extracted_path)?;
    info!(
        "Loaded {} extracted records from {}",
        extracted_raw.len(),
        extracted_path.display()
    );

    let allowed: Option<HashSet<String>> = config
        .allowed_types
        .as_ref()
        .map(|types| types.iter().map(|t| t.to_lowercase()).collect());
    let extracted_scoped = profiling::filter_by_type(extracted_raw, allowed.as_ref());
    info!("{} records in validation scope", extracted_scoped.len());

    // 2) Profile for diagnostics (no effect on matching).
    let extracted_profile = profiling::profile_extracted_events(&extracted_scoped);

    // 3) Canonicalise the extracted stream.
    let extracted_canonical: Vec<CanonicalEvent> = extracted_scoped
        .iter()
        .map(canonical::normalize_mention)
        .map(|m| canonical::mention_to_canonical(&m))
        .collect();

    // 4) The reference caches must cover this window.
    let (window_start, window_end) =
        compute_cache_window(&extracted_canonical, config.cache_buffer_days)?;
    info!("Reference window: {window_start} to {window_end}");

    // 5) Load and standardise the cached reference datasets.
    let reference_raw = loaders::load_all_flood_references(reference_cache_dir)?;
    let reference_canonical = reference::standardise_reference_events(&reference_raw);

    // 6) Candidate generation and scoring.
    let candidate_map =
        candidates::generate_candidates(&extracted_canonical, &reference_canonical, &config.matching);

    let ext_lookup: HashMap<&str, &CanonicalEvent> = extracted_canonical
        .iter()
        .map(|e| (e.id.as_str(), e))
        .collect();
    let ref_lookup: HashMap<&str, &CanonicalEvent> = reference_canonical
        .iter()
        .map(|r| (r.id.as_str(), r))
        .collect();

    let mut scored: Vec<CandidateMatch> = Vec::new();
    for (extracted_id, ref_ids) in &candidate_map {
        let Some(e) = ext_lookup.get(extracted_id.as_str()) else {
            continue;
        };
        for ref_id in ref_ids {
            let Some(r) = ref_lookup.get(ref_id.as_str()) else {
                continue;
            };
            scored.push(scoring::score_candidate(e, r));
        }
    }
    info!("Scored {} candidate pairs", scored.len());

    // 7) Dual-gate validation and reporting.
    let outcome = dual_gate::run_dual_gate(&scored, config.matching.score_threshold);
    let summary = report::build_summary(&outcome.forward, &outcome.inverse);
    let diagnostics = report::build_diagnostics(&outcome.forward, &outcome.inverse);

    info!(
        "Forward: {}/{} matched ({:.1}%), inverse: {}/{} matched ({:.1}%)",
        summary.forward_matched,
        summary.forward_total,
        100.0 * summary.forward_match_rate,
        summary.inverse_matched,
        summary.inverse_total,
        100.0 * summary.inverse_match_rate
    );

    // 8) Write outputs.
    fs::create_dir_all(output_dir)?;
    io::write_json(&output_dir.join("extracted_profile.json"), &extracted_profile)?;
    io::write_json(&output_dir.join("summary.json"), &summary)?;
    io::write_json(&output_dir.join("diagnostics.json"), &diagnostics)?;
    io::write_csv(
        &output_dir.join("forward_matches.csv"),
        &report::decisions_to_rows(&outcome.forward),
    )?;
    io::write_csv(
        &output_dir.join("inverse_matches.csv"),
        &report::decisions_to_rows(&outcome.inverse),
    )?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;

    fn dated(id: &str, date: &str) -> CanonicalEvent {
        CanonicalEvent {
            id: id.to_string(),
            kind: "flood".to_string(),
            date_start: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            date_end: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            location_name: None,
            country: None,
            lat: None,
            lon: None,
            text: String::new(),
            meta: Provenance::missing(),
        }
    }

    #[test]
    fn test_cache_window_expands_span_by_buffer() {
        let events = vec![dated("a", "2024-03-05"), dated("b", "2024-03-20")];
        let (start, end) = compute_cache_window(&events, 14).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 20).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 4, 3).unwrap());
    }

    #[test]
    fn test_cache_window_requires_dated_events() {
        let mut undated = dated("a", "2024-03-05");
        undated.date_start = None;
        let err = compute_cache_window(&[undated], 14).unwrap_err();
        assert!(matches!(err, ValidationError::Config(_)));
    }
}
