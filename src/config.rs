use serde::{Deserialize, Serialize};

/// Tolerances for the deduplication clusterer. The allowed gap between two
/// mention dates depends on which temporal signals are being compared: an
/// explicit event date is trusted more than a publication-date proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupeConfig {
    /// Both sides carry an explicit event date.
    pub event_date_tolerance_days: i64,
    /// One side falls back to its publication date.
    pub mixed_date_tolerance_days: i64,
    /// Both sides fall back to publication dates.
    pub publish_date_tolerance_days: i64,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            event_date_tolerance_days: 1,
            mixed_date_tolerance_days: 2,
            publish_date_tolerance_days: 3,
        }
    }
}

/// Tunables for candidate generation and dual-gate validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Tolerance window when testing date-range overlap between an
    /// extracted and a reference event.
    pub max_days_apart: i64,
    /// Hard cap on reference candidates per extracted event.
    pub max_candidates_per_event: usize,
    /// Minimum combined score for a match to pass either gate.
    pub score_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_days_apart: 7,
            max_candidates_per_event: 200,
            score_threshold: 0.6,
        }
    }
}

/// Top-level configuration for a validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub matching: MatchingConfig,
    /// Restrict validation to these disruption types. `None` disables
    /// filtering.
    pub allowed_types: Option<Vec<String>>,
    /// Days added on either side of the extracted-event date span when
    /// computing the reference cache window.
    pub cache_buffer_days: i64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            matching: MatchingConfig::default(),
            allowed_types: Some(vec!["flood".to_string()]),
            cache_buffer_days: 14,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let dedupe = DedupeConfig::default();
        assert_eq!(dedupe.event_date_tolerance_days, 1);
        assert_eq!(dedupe.mixed_date_tolerance_days, 2);
        assert_eq!(dedupe.publish_date_tolerance_days, 3);

        let matching = MatchingConfig::default();
        assert_eq!(matching.max_days_apart, 7);
        assert_eq!(matching.max_candidates_per_event, 200);
        assert!((matching.score_threshold - 0.6).abs() < 1e-12);

        let validation = ValidationConfig::default();
        assert_eq!(validation.cache_buffer_days, 14);
        assert_eq!(
            validation.allowed_types,
            Some(vec!["flood".to_string()])
        );
    }
}
