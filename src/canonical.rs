use crate::models::{
    CanonicalEvent, DateSource, ExtractedRecord, LocationSource, MentionEvent, MergedEvent,
    Provenance,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Location strings that mean "no location was extracted".
const LOCATION_SENTINELS: [&str; 4] = ["unknown", "n/a", "na", "none"];

/// Date formats accepted from upstream extraction output, tried in order.
const DATE_FORMATS: [&str; 5] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a raw date string into a `NaiveDate`.
///
/// Tries the common extraction formats first, then RFC 3339 as a last
/// resort. Returns `None` on anything unparsable; malformed dates degrade
/// to missing, they never fail the pipeline.
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let full = raw?.trim();
    if full.is_empty() {
        return None;
    }

    // Datetime strings may carry sub-second or timezone suffixes; the
    // fixed formats only look at the first 19 characters.
    let head = if full.len() > 19 {
        full.get(..19).unwrap_or(full)
    } else {
        full
    };

    for fmt in DATE_FORMATS {
        if fmt.contains("%H") {
            if let Ok(dt) = NaiveDateTime::parse_from_str(head, fmt) {
                return Some(dt.date());
            }
        } else if let Ok(d) = NaiveDate::parse_from_str(head, fmt) {
            return Some(d);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(full) {
        return Some(dt.date_naive());
    }

    None
}

/// Convert a raw extracted record into its canonical mention form.
///
/// Date inference: prefer the explicit event date; fall back to the
/// publication date and tag the result as weak; otherwise tag as missing.
/// Location inference: sentinel strings ("unknown", "n/a", ...) and blank
/// strings are treated as absent.
pub fn normalize_mention(record: &ExtractedRecord) -> MentionEvent {
    let kind = {
        let k = record.disruption_type.trim().to_lowercase();
        if k.is_empty() {
            "unknown".to_string()
        } else {
            k
        }
    };

    let event_date = parse_date(record.event_date_raw.as_deref());
    let publish_date = parse_date(record.published_at_raw.as_deref());

    let (date_source, date_is_weak) = if event_date.is_some() {
        (DateSource::ExtractedEventDate, false)
    } else if publish_date.is_some() {
        (DateSource::PublicationDateFallback, true)
    } else {
        (DateSource::Missing, true)
    };

    let location_name = record.location_raw.as_deref().and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() || LOCATION_SENTINELS.contains(&trimmed.to_lowercase().as_str()) {
            None
        } else {
            Some(trimmed.to_string())
        }
    });

    let (location_source, location_is_weak) = if location_name.is_some() {
        (LocationSource::ExtractedLocation, false)
    } else {
        (LocationSource::Missing, true)
    };

    MentionEvent {
        id: record.event_id.clone(),
        kind,
        event_date,
        publish_date,
        location_name,
        title: record.title.clone(),
        text: record.text.clone(),
        url: record.url.clone(),
        duration_hours: record.duration_hours,
        evidence: record.evidence.clone(),
        method: record.method.clone(),
        extras: record.extras.clone(),
        confidence: record.confidence,
        provenance: Provenance {
            url: record.url.clone(),
            dataset: None,
            date_source,
            date_is_weak,
            location_source,
            location_is_weak,
        },
    }
}

/// Collapse a canonical mention into the matching shape.
pub fn mention_to_canonical(mention: &MentionEvent) -> CanonicalEvent {
    let date = mention.event_date.or(mention.publish_date);

    let title = mention.title.as_deref().unwrap_or("").trim();
    let body = mention.text.as_deref().unwrap_or("").trim();
    let text = [title, body]
        .iter()
        .filter(|t| !t.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");

    CanonicalEvent {
        id: mention.id.clone(),
        kind: mention.kind.clone(),
        date_start: date,
        date_end: date,
        location_name: mention.location_name.clone(),
        country: None,
        lat: None,
        lon: None,
        text,
        meta: mention.provenance.clone(),
    }
}

/// Convert a consolidated event into the matching shape, for callers that
/// chain consolidation and validation in memory.
pub fn merged_to_canonical(merged: &MergedEvent) -> CanonicalEvent {
    let (date, date_source, date_is_weak) = match (merged.event_date, merged.publish_date) {
        (Some(d), _) => (Some(d), DateSource::ExtractedEventDate, false),
        (None, Some(d)) => (Some(d), DateSource::PublicationDateFallback, true),
        (None, None) => (None, DateSource::Missing, true),
    };

    let (location_source, location_is_weak) = if merged.location_name.is_some() {
        (LocationSource::ExtractedLocation, false)
    } else {
        (LocationSource::Missing, true)
    };

    CanonicalEvent {
        id: merged.event_id.clone(),
        kind: merged.disruption_type.clone(),
        date_start: date,
        date_end: date,
        location_name: merged.location_name.clone(),
        country: None,
        lat: None,
        lon: None,
        text: merged.source_title.clone().unwrap_or_default(),
        meta: Provenance {
            url: merged.urls.first().cloned(),
            dataset: None,
            date_source,
            date_is_weak,
            location_source,
            location_is_weak,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn record(event_date: Option<&str>, published: Option<&str>, location: Option<&str>) -> ExtractedRecord {
        ExtractedRecord {
            event_id: "e1".to_string(),
            disruption_type: "Flood".to_string(),
            event_date_raw: event_date.map(str::to_string),
            location_raw: location.map(str::to_string),
            title: Some("Jakarta floods".to_string()),
            text: Some("Heavy rain flooded the city".to_string()),
            published_at_raw: published.map(str::to_string),
            url: Some("https://example.com/a".to_string()),
            duration_hours: None,
            evidence: vec![],
            method: None,
            extras: HashMap::new(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(parse_date(Some("2024-03-01")), Some(expected));
        assert_eq!(parse_date(Some("2024/03/01")), Some(expected));
        assert_eq!(parse_date(Some("01-03-2024")), Some(expected));
        assert_eq!(parse_date(Some("2024-03-01T10:30:00")), Some(expected));
        assert_eq!(parse_date(Some("2024-03-01 10:30:00")), Some(expected));
        assert_eq!(parse_date(Some("2024-03-01T10:30:00.123456+07:00")), Some(expected));
    }

    #[test]
    fn test_parse_date_never_panics_on_garbage() {
        assert_eq!(parse_date(None), None);
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(Some("   ")), None);
        assert_eq!(parse_date(Some("not a date")), None);
        assert_eq!(parse_date(Some("2024-13-45")), None);
        assert_eq!(parse_date(Some("早稲田大学は東京都新宿区にある")), None);
    }

    #[test]
    fn test_event_date_preferred_over_publish_date() {
        let m = normalize_mention(&record(Some("2024-03-01"), Some("2024-03-05"), None));
        assert_eq!(m.event_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(m.provenance.date_source, DateSource::ExtractedEventDate);
        assert!(!m.provenance.date_is_weak);
    }

    #[test]
    fn test_publish_date_fallback_is_weak() {
        let m = normalize_mention(&record(Some("soon"), Some("2024-03-05"), None));
        assert_eq!(m.event_date, None);
        assert_eq!(m.publish_date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(m.provenance.date_source, DateSource::PublicationDateFallback);
        assert!(m.provenance.date_is_weak);
    }

    #[test]
    fn test_no_usable_date_tagged_missing() {
        let m = normalize_mention(&record(None, None, None));
        assert_eq!(m.provenance.date_source, DateSource::Missing);
        assert!(m.provenance.date_is_weak);
    }

    #[test]
    fn test_location_sentinels_treated_as_absent() {
        for sentinel in ["unknown", "N/A", "na", "None", "", "   "] {
            let m = normalize_mention(&record(None, None, Some(sentinel)));
            assert_eq!(m.location_name, None, "sentinel: {sentinel:?}");
            assert_eq!(m.provenance.location_source, LocationSource::Missing);
        }

        let m = normalize_mention(&record(None, None, Some("  Jakarta, Indonesia ")));
        assert_eq!(m.location_name, Some("Jakarta, Indonesia".to_string()));
        assert!(!m.provenance.location_is_weak);
    }

    #[test]
    fn test_kind_lowercased_and_defaulted() {
        let m = normalize_mention(&record(None, None, None));
        assert_eq!(m.kind, "flood");

        let mut r = record(None, None, None);
        r.disruption_type = "  ".to_string();
        assert_eq!(normalize_mention(&r).kind, "unknown");
    }

    #[test]
    fn test_canonical_text_joins_title_and_body() {
        let m = normalize_mention(&record(Some("2024-03-01"), None, Some("Jakarta")));
        let c = mention_to_canonical(&m);
        assert_eq!(c.text, "Jakarta floods Heavy rain flooded the city");
        assert_eq!(c.date_start, c.date_end);
        assert_eq!(c.kind, "flood");
    }
}
