use crate::canonical::parse_date;
use crate::error::{Result, ValidationError};
use crate::io::{number_value, string_value};
use crate::models::RefEvent;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::info;

/// Read one cached reference dataset file: a JSON array of row objects.
/// A missing cache file is a configuration error (the caching step was
/// skipped or mispointed), not a data error.
fn read_cache(path: &Path, dataset: &str) -> Result<Vec<Map<String, Value>>> {
    if !path.exists() {
        return Err(ValidationError::Config(format!(
            "{dataset} reference cache not found: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;

    let Value::Array(rows) = value else {
        return Err(ValidationError::Schema(format!(
            "{dataset} cache is not a JSON array: {}",
            path.display()
        )));
    };

    rows.into_iter()
        .enumerate()
        .map(|(idx, row)| match row {
            Value::Object(map) => Ok(map),
            _ => Err(ValidationError::Schema(format!(
                "{dataset} cache row {idx} is not an object"
            ))),
        })
        .collect()
}

fn require_id(row: &Map<String, Value>, key: &str, dataset: &str, idx: usize) -> Result<String> {
    row.get(key).and_then(string_value).ok_or_else(|| {
        ValidationError::Schema(format!("{dataset} cache row {idx} is missing '{key}'"))
    })
}

fn date_field(row: &Map<String, Value>, key: &str) -> Option<NaiveDate> {
    parse_date(row.get(key).and_then(string_value).as_deref())
}

fn opt_string(row: &Map<String, Value>, key: &str) -> Option<String> {
    row.get(key).and_then(string_value)
}

fn opt_f64(row: &Map<String, Value>, key: &str) -> Option<f64> {
    row.get(key).and_then(number_value)
}

/// Flood-archive export (Dartmouth Flood Observatory).
pub fn load_dfo(cache_path: &Path) -> Result<Vec<RefEvent>> {
    read_cache(cache_path, "DFO")?
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let id = require_id(row, "id", "DFO", idx)?;
            Ok(RefEvent {
                ref_id: format!("DFO_{id}"),
                dataset: "DFO".to_string(),
                ref_type: "flood".to_string(),
                date_start: date_field(row, "start_date"),
                date_end: date_field(row, "end_date"),
                location_name: opt_string(row, "location"),
                country: opt_string(row, "country"),
                lat: opt_f64(row, "lat"),
                lon: opt_f64(row, "lon"),
                text: opt_string(row, "description"),
            })
        })
        .collect()
}

/// Disaster-alert feed (GDACS).
pub fn load_gdacs(cache_path: &Path) -> Result<Vec<RefEvent>> {
    read_cache(cache_path, "GDACS")?
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let id = require_id(row, "id", "GDACS", idx)?;
            Ok(RefEvent {
                ref_id: format!("GDACS_{id}"),
                dataset: "GDACS".to_string(),
                ref_type: "flood".to_string(),
                date_start: date_field(row, "fromdate"),
                date_end: date_field(row, "todate"),
                location_name: opt_string(row, "country"),
                country: opt_string(row, "country"),
                lat: opt_f64(row, "lat"),
                lon: opt_f64(row, "lon"),
                text: opt_string(row, "name"),
            })
        })
        .collect()
}

/// International-disaster database (EM-DAT).
pub fn load_emdat(cache_path: &Path) -> Result<Vec<RefEvent>> {
    read_cache(cache_path, "EM-DAT")?
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let id = require_id(row, "disaster_no", "EM-DAT", idx)?;
            Ok(RefEvent {
                ref_id: format!("EMDAT_{id}"),
                dataset: "EM-DAT".to_string(),
                ref_type: "flood".to_string(),
                date_start: date_field(row, "start_date"),
                date_end: date_field(row, "end_date"),
                location_name: opt_string(row, "location"),
                country: opt_string(row, "country"),
                lat: None,
                lon: None,
                text: opt_string(row, "event_name"),
            })
        })
        .collect()
}

/// Humanitarian-disaster registry (ReliefWeb).
pub fn load_reliefweb(cache_path: &Path) -> Result<Vec<RefEvent>> {
    read_cache(cache_path, "ReliefWeb")?
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let id = require_id(row, "id", "ReliefWeb", idx)?;
            Ok(RefEvent {
                ref_id: format!("RELIEFWEB_{id}"),
                dataset: "ReliefWeb".to_string(),
                ref_type: "flood".to_string(),
                date_start: date_field(row, "date"),
                date_end: None,
                location_name: opt_string(row, "country"),
                country: opt_string(row, "country"),
                lat: None,
                lon: None,
                text: opt_string(row, "name"),
            })
        })
        .collect()
}

/// Load and concatenate all flood reference datasets from a cache
/// directory using the fixed per-dataset file names.
pub fn load_all_flood_references(cache_dir: &Path) -> Result<Vec<RefEvent>> {
    let mut refs = Vec::new();
    refs.extend(load_dfo(&cache_dir.join("dfo.json"))?);
    refs.extend(load_gdacs(&cache_dir.join("gdacs.json"))?);
    refs.extend(load_emdat(&cache_dir.join("emdat.json"))?);
    refs.extend(load_reliefweb(&cache_dir.join("reliefweb.json"))?);

    info!("Loaded {} reference events from {}", refs.len(), cache_dir.display());
    Ok(refs)
}
