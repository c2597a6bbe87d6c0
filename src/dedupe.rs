use crate::config::DedupeConfig;
use crate::models::{ExtraValue, MentionEvent, MergedEvent};
use chrono::NaiveDate;
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tracing::info;
use uuid::Uuid;

lazy_static! {
    static ref NON_LETTER: Regex = Regex::new(r"[^a-z\s]").unwrap();
}

/// Which temporal signal a mention contributes to date matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSignal {
    Event,
    Publish,
}

/// Convert a raw location string into a set of meaningful tokens.
///
/// "Sumatra (Aceh), Indonesia" -> {"sumatra", "aceh", "indonesia"}
///
/// Everything non-alphabetic (punctuation, digits, parenthesis markers)
/// becomes whitespace, and short tokens are dropped.
pub fn location_tokens(location: &str) -> HashSet<String> {
    if location.is_empty() {
        return HashSet::new();
    }

    let lowered = location.to_lowercase();
    let cleaned = NON_LETTER.replace_all(&lowered, " ");

    cleaned
        .split_whitespace()
        .filter(|t| t.len() > 2)
        .map(str::to_string)
        .collect()
}

/// Strongest available temporal signal for matching: the explicit event
/// date when present, else the publication-date proxy.
pub fn best_match_date(mention: &MentionEvent) -> Option<(NaiveDate, DateSignal)> {
    if let Some(d) = mention.event_date {
        return Some((d, DateSignal::Event));
    }
    mention.publish_date.map(|d| (d, DateSignal::Publish))
}

/// Allowed gap in days for a pair of temporal signals. Publication dates
/// are a weaker proxy, so comparisons involving them get more slack.
fn tolerance_days(a: DateSignal, b: DateSignal, config: &DedupeConfig) -> i64 {
    match (a, b) {
        (DateSignal::Event, DateSignal::Event) => config.event_date_tolerance_days,
        (DateSignal::Publish, DateSignal::Publish) => config.publish_date_tolerance_days,
        _ => config.mixed_date_tolerance_days,
    }
}

fn dates_close(d1: NaiveDate, d2: NaiveDate, tolerance: i64) -> bool {
    (d1 - d2).num_days().abs() <= tolerance
}

fn longest_non_empty<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut best: Option<&str> = None;
    for v in values {
        if v.is_empty() {
            continue;
        }
        // Strictly longer only, so ties resolve to the first occurrence.
        if best.map_or(true, |b| v.len() > b.len()) {
            best = Some(v);
        }
    }
    best.map(str::to_string)
}

fn is_empty_value(v: &Value) -> bool {
    v.is_null() || matches!(v, Value::String(s) if s.is_empty())
}

/// Merge a cluster of mentions referring to the same event into one record.
///
/// - type comes from the representative (first member)
/// - dates: earliest event date and earliest publish date, independently
/// - location and title: the longest non-empty string (first on ties)
/// - urls and methods: sorted, deduplicated
/// - extras: lossless per-key merge, scalar when one distinct value remains
/// - confidence: maximum across members
fn merge_cluster(cluster: &[MentionEvent]) -> MergedEvent {
    let mut extras_acc: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for mention in cluster {
        for (key, value) in &mention.extras {
            if is_empty_value(value) {
                continue;
            }
            let values = extras_acc.entry(key.clone()).or_default();
            if !values.contains(value) {
                values.push(value.clone());
            }
        }
    }

    let extras = extras_acc
        .into_iter()
        .map(|(key, mut values)| {
            let merged = if values.len() == 1 {
                ExtraValue::Scalar(values.remove(0))
            } else {
                ExtraValue::List(values)
            };
            (key, merged)
        })
        .collect();

    MergedEvent {
        event_id: Uuid::new_v4().to_string(),
        disruption_type: cluster[0].kind.clone(),
        event_date: cluster.iter().filter_map(|m| m.event_date).min(),
        publish_date: cluster.iter().filter_map(|m| m.publish_date).min(),
        location_name: longest_non_empty(cluster.iter().filter_map(|m| m.location_name.as_deref())),
        source_title: longest_non_empty(cluster.iter().filter_map(|m| m.title.as_deref())),
        urls: cluster
            .iter()
            .filter_map(|m| m.url.as_deref())
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .sorted()
            .dedup()
            .collect(),
        num_articles: cluster.len(),
        duration_hours: cluster.iter().find_map(|m| m.duration_hours),
        evidence: cluster.iter().flat_map(|m| m.evidence.iter().cloned()).collect(),
        method: cluster
            .iter()
            .filter_map(|m| m.method.as_deref())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .sorted()
            .dedup()
            .collect(),
        extras,
        confidence: cluster.iter().map(|m| m.confidence).fold(0.0, f64::max),
    }
}

/// Greedy single-pass clustering of mention events.
///
/// Each mention is compared against the representative (first member) of
/// every open cluster, in creation order, and joins the first cluster whose
/// representative matches on type, date proximity, and location-token
/// overlap. Mentions typed "unknown" are never merged and pass through as
/// singletons. The result is a function of input order.
pub fn dedupe_events(
    events: Vec<MentionEvent>,
    config: &DedupeConfig,
) -> (Vec<MergedEvent>, DedupeStats) {
    let mut before_by_type: BTreeMap<String, usize> = BTreeMap::new();
    for event in &events {
        *before_by_type.entry(event.kind.clone()).or_default() += 1;
    }
    let total_before = events.len();

    let mut clusters: Vec<Vec<MentionEvent>> = Vec::new();
    let mut passthrough: Vec<MentionEvent> = Vec::new();

    for event in events {
        if event.kind == "unknown" {
            passthrough.push(event);
            continue;
        }

        let event_tokens = location_tokens(event.location_name.as_deref().unwrap_or(""));
        let event_date = best_match_date(&event);

        let mut target: Option<usize> = None;
        for (idx, cluster) in clusters.iter().enumerate() {
            let rep = &cluster[0];

            if rep.kind != event.kind {
                continue;
            }

            let (Some((d, signal)), Some((rep_d, rep_signal))) = (event_date, best_match_date(rep))
            else {
                continue;
            };

            if !dates_close(d, rep_d, tolerance_days(signal, rep_signal, config)) {
                continue;
            }

            if event_tokens.is_disjoint(&location_tokens(
                rep.location_name.as_deref().unwrap_or(""),
            )) {
                continue;
            }

            target = Some(idx);
            break;
        }

        match target {
            Some(idx) => clusters[idx].push(event),
            None => clusters.push(vec![event]),
        }
    }

    let mut merged: Vec<MergedEvent> = clusters.iter().map(|c| merge_cluster(c)).collect();
    merged.extend(passthrough.iter().map(|p| merge_cluster(std::slice::from_ref(p))));

    let stats = DedupeStats::compute(total_before, &before_by_type, &merged);
    (merged, stats)
}

/// Per-type before/after counts for the consolidation summary.
#[derive(Debug, Clone, Serialize)]
pub struct TypeReduction {
    pub disruption_type: String,
    pub before: usize,
    pub after: usize,
    pub removed: usize,
    pub reduction_pct: f64,
}

/// Impact of one consolidation run.
#[derive(Debug, Clone, Serialize)]
pub struct DedupeStats {
    pub total_before: usize,
    pub total_after: usize,
    pub reduction_pct: f64,
    pub by_type: Vec<TypeReduction>,
    pub mean_articles_per_merged: f64,
    pub median_articles_per_merged: f64,
    pub max_articles_per_merged: usize,
}

impl DedupeStats {
    fn compute(
        total_before: usize,
        before_by_type: &BTreeMap<String, usize>,
        merged: &[MergedEvent],
    ) -> Self {
        let total_after = merged.len();
        let reduction_pct = if total_before > 0 {
            100.0 * (total_before - total_after) as f64 / total_before as f64
        } else {
            0.0
        };

        let mut after_by_type: BTreeMap<&str, usize> = BTreeMap::new();
        for event in merged {
            *after_by_type.entry(event.disruption_type.as_str()).or_default() += 1;
        }

        let by_type = before_by_type
            .iter()
            .filter(|(kind, before)| kind.as_str() != "unknown" && **before > 0)
            .map(|(kind, before)| {
                let after = after_by_type.get(kind.as_str()).copied().unwrap_or(0);
                let removed = before.saturating_sub(after);
                TypeReduction {
                    disruption_type: kind.clone(),
                    before: *before,
                    after,
                    removed,
                    reduction_pct: 100.0 * removed as f64 / *before as f64,
                }
            })
            .collect();

        let mut sizes: Vec<usize> = merged
            .iter()
            .map(|m| m.num_articles)
            .filter(|n| *n > 1)
            .collect();
        sizes.sort_unstable();

        let (mean, median, max) = if sizes.is_empty() {
            (0.0, 0.0, 0)
        } else {
            let sum: usize = sizes.iter().sum();
            let mid = sizes.len() / 2;
            let median = if sizes.len() % 2 == 0 {
                (sizes[mid - 1] + sizes[mid]) as f64 / 2.0
            } else {
                sizes[mid] as f64
            };
            (sum as f64 / sizes.len() as f64, median, sizes[sizes.len() - 1])
        };

        Self {
            total_before,
            total_after,
            reduction_pct,
            by_type,
            mean_articles_per_merged: mean,
            median_articles_per_merged: median,
            max_articles_per_merged: max,
        }
    }

    pub fn log(&self) {
        info!(
            "Consolidation: {} records -> {} events ({:.1}% reduction)",
            self.total_before, self.total_after, self.reduction_pct
        );
        for t in &self.by_type {
            info!(
                "  {}: {} -> {} ({} removed, {:.1}%)",
                t.disruption_type, t.before, t.after, t.removed, t.reduction_pct
            );
        }
        if self.max_articles_per_merged > 0 {
            info!(
                "  merge intensity: mean {:.2}, median {:.1}, max {} articles per event",
                self.mean_articles_per_merged,
                self.median_articles_per_merged,
                self.max_articles_per_merged
            );
        }
    }
}
