pub mod loaders;

use crate::models::{CanonicalEvent, DateSource, LocationSource, Provenance, RefEvent};

/// Convert reference events into canonical form for matching.
///
/// Light normalisation only: no merging (reference datasets arrive already
/// deduplicated) and no inference beyond filling the matchable text from
/// the location when the dataset carries no description.
pub fn standardise_reference_events(ref_events: &[RefEvent]) -> Vec<CanonicalEvent> {
    ref_events
        .iter()
        .map(|r| {
            let text = r
                .text
                .as_deref()
                .or(r.location_name.as_deref())
                .unwrap_or("")
                .trim()
                .to_string();

            // Point-in-time records carry only a start date; ranges that
            // arrive reversed are normalised so date_end >= date_start.
            let date_start = r.date_start;
            let date_end = match (r.date_start, r.date_end) {
                (Some(start), Some(end)) => Some(end.max(start)),
                (Some(start), None) => Some(start),
                (None, end) => end,
            };

            let (date_source, date_is_weak) = if date_start.is_some() {
                (DateSource::ReferenceDataset, false)
            } else {
                (DateSource::Missing, true)
            };
            let (location_source, location_is_weak) = if r.location_name.is_some() {
                (LocationSource::ReferenceDataset, false)
            } else {
                (LocationSource::Missing, true)
            };

            CanonicalEvent {
                id: r.ref_id.clone(),
                kind: {
                    let k = r.ref_type.trim().to_lowercase();
                    if k.is_empty() {
                        "unknown".to_string()
                    } else {
                        k
                    }
                },
                date_start,
                date_end,
                location_name: r.location_name.clone(),
                country: r.country.clone(),
                lat: r.lat,
                lon: r.lon,
                text,
                meta: Provenance {
                    url: None,
                    dataset: Some(r.dataset.clone()),
                    date_source,
                    date_is_weak,
                    location_source,
                    location_is_weak,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ref_event(start: Option<&str>, end: Option<&str>) -> RefEvent {
        let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        RefEvent {
            ref_id: "DFO_1".to_string(),
            dataset: "DFO".to_string(),
            ref_type: "Flood".to_string(),
            date_start: start.map(parse),
            date_end: end.map(parse),
            location_name: Some("Jakarta".to_string()),
            country: Some("Indonesia".to_string()),
            lat: Some(-6.2),
            lon: Some(106.8),
            text: None,
        }
    }

    #[test]
    fn test_standardise_fills_text_and_dates() {
        let canonical = standardise_reference_events(&[ref_event(Some("2024-03-01"), None)]);
        assert_eq!(canonical.len(), 1);

        let c = &canonical[0];
        assert_eq!(c.kind, "flood");
        assert_eq!(c.text, "Jakarta");
        assert_eq!(c.date_end, c.date_start);
        assert_eq!(c.meta.dataset, Some("DFO".to_string()));
        assert_eq!(c.meta.date_source, DateSource::ReferenceDataset);
        assert!(!c.meta.date_is_weak);
    }

    #[test]
    fn test_standardise_orders_reversed_ranges() {
        let canonical =
            standardise_reference_events(&[ref_event(Some("2024-03-05"), Some("2024-03-01"))]);
        let c = &canonical[0];
        assert!(c.date_end >= c.date_start);
    }

    #[test]
    fn test_standardise_missing_dates_are_weak() {
        let canonical = standardise_reference_events(&[ref_event(None, None)]);
        let c = &canonical[0];
        assert_eq!(c.date_start, None);
        assert_eq!(c.meta.date_source, DateSource::Missing);
        assert!(c.meta.date_is_weak);
    }
}
