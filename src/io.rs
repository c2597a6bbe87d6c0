use crate::error::{Result, ValidationError};
use crate::models::{ExtractedRecord, MergedEvent};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

// ---- field access helpers shared with the reference loaders ----

pub(crate) fn string_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn first_string(row: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| row.get(*k).and_then(string_value))
}

/// Convert one raw row into an `ExtractedRecord`. Assumes minimal schema
/// consistency: ids are synthesised when absent and malformed optional
/// fields degrade to `None`.
fn row_to_record(row: &Map<String, Value>, idx: usize) -> ExtractedRecord {
    let disruption_type = first_string(row, &["disruption_type"])
        .map(|t| t.to_lowercase())
        .unwrap_or_else(|| "unknown".to_string());

    let evidence = match row.get("evidence") {
        Some(Value::Array(items)) => items.iter().filter_map(string_value).collect(),
        _ => Vec::new(),
    };

    let extras: HashMap<String, Value> = match row.get("extras") {
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        _ => HashMap::new(),
    };

    ExtractedRecord {
        event_id: first_string(row, &["event_id"]).unwrap_or_else(|| format!("extracted_{idx}")),
        disruption_type,
        event_date_raw: first_string(row, &["event_date"]),
        location_raw: first_string(row, &["location_name", "location"]),
        title: first_string(row, &["source_title", "title"]),
        text: first_string(row, &["text", "article_text"]),
        published_at_raw: first_string(row, &["published_at", "publication_date", "publish_date"]),
        url: first_string(row, &["url"]),
        duration_hours: row.get("duration_hours").and_then(number_value),
        evidence,
        method: first_string(row, &["method"]),
        extras,
        confidence: row.get("confidence").and_then(number_value).unwrap_or(0.0),
    }
}

fn load_jsonl(path: &Path) -> Result<Vec<ExtractedRecord>> {
    let file = File::open(path)?;
    let mut records = Vec::new();

    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(&line)?;
        let Value::Object(row) = value else {
            return Err(ValidationError::Schema(format!(
                "line {} of {} is not a JSON object",
                idx + 1,
                path.display()
            )));
        };
        records.push(row_to_record(&row, idx));
    }

    Ok(records)
}

fn load_csv(path: &Path) -> Result<Vec<ExtractedRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let mut row = Map::new();

        for (header, cell) in headers.iter().zip(record.iter()) {
            // The extras column is embedded JSON; everything else stays a
            // plain string.
            if header == "extras" {
                if let Ok(parsed) = serde_json::from_str::<Value>(cell) {
                    row.insert(header.to_string(), parsed);
                    continue;
                }
            }
            row.insert(header.to_string(), Value::String(cell.to_string()));
        }

        records.push(row_to_record(&row, idx));
    }

    Ok(records)
}

/// Load extracted disruption events from a JSONL or CSV file.
pub fn load_extracted_records(path: &Path) -> Result<Vec<ExtractedRecord>> {
    if !path.exists() {
        return Err(ValidationError::Config(format!(
            "extracted events file not found: {}",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "jsonl" => load_jsonl(path),
        "csv" => load_csv(path),
        other => Err(ValidationError::UnsupportedFormat(format!(
            ".{other} (expected .jsonl or .csv)"
        ))),
    }
}

// ---- output writers ----

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Write a value to disk as formatted JSON.
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    ensure_parent(path)?;
    let body = serde_json::to_string_pretty(data)?;
    fs::write(path, body)?;
    Ok(())
}

/// Write serialisable rows to disk as a CSV file. An empty row set yields
/// an empty file.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    if rows.is_empty() {
        fs::write(path, "")?;
        return Ok(());
    }

    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write serialisable rows to disk as line-delimited JSON.
pub fn write_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut file = File::create(path)?;
    for row in rows {
        let line = serde_json::to_string(row)?;
        writeln!(file, "{line}")?;
    }
    Ok(())
}

/// Flat row shape for the consolidated event table CSV. Nested fields are
/// serialised as embedded JSON so the table round-trips.
#[derive(Debug, Clone, Serialize)]
pub struct MergedRow {
    pub event_id: String,
    pub disruption_type: String,
    pub event_date: Option<String>,
    pub publish_date: Option<String>,
    pub location_name: Option<String>,
    pub source_title: Option<String>,
    pub urls: String,
    pub num_articles: usize,
    pub duration_hours: Option<f64>,
    pub evidence: String,
    pub method: String,
    pub extras: String,
    pub confidence: f64,
}

impl MergedRow {
    pub fn from_event(event: &MergedEvent) -> Result<Self> {
        Ok(Self {
            event_id: event.event_id.clone(),
            disruption_type: event.disruption_type.clone(),
            event_date: event.event_date.map(|d| d.to_string()),
            publish_date: event.publish_date.map(|d| d.to_string()),
            location_name: event.location_name.clone(),
            source_title: event.source_title.clone(),
            urls: serde_json::to_string(&event.urls)?,
            num_articles: event.num_articles,
            duration_hours: event.duration_hours,
            evidence: serde_json::to_string(&event.evidence)?,
            method: serde_json::to_string(&event.method)?,
            extras: serde_json::to_string(&event.extras)?,
            confidence: event.confidence,
        })
    }
}
