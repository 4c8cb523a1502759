//! Snapshot normalization boundary
//!
//! Converts untyped snapshot JSON into [`ScreenedPaper`] records. This is
//! the only place that tolerates absent or malformed fields: a missing or
//! unrecognized decision becomes `Unknown`, a missing confidence becomes
//! 0.0, and everything bibliographic that is not understood is carried
//! through in `extra`. A record is only rejected when it is not an
//! object at all.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::errors::{AppError, Result};
use crate::models::{Bibliography, Decision, ExternalId, ScreenedPaper};

/// Keys consumed into typed fields; everything else goes to `extra`
const CONSUMED_KEYS: &[&str] = &[
    "title",
    "doi",
    "openalex_id",
    "external_ids",
    "decision",
    "confidence",
    "reason",
    "source_query_id",
    "source_query_description",
    "screening_timestamp",
    "authors",
    "venue",
    "publication_year",
    "abstract",
    "citation_count",
];

/// Normalize a whole snapshot. Accepts either a bare array of records or
/// an object wrapping them under `papers` or `screening_results`.
pub fn screened_papers_from_json(value: &Value) -> Result<Vec<ScreenedPaper>> {
    let records = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => map
            .get("papers")
            .or_else(|| map.get("screening_results"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| AppError::InvalidFormat {
                message: "snapshot object has no papers array".into(),
            })?,
        _ => {
            return Err(AppError::InvalidFormat {
                message: "snapshot must be an array or object".into(),
            })
        }
    };

    let papers = records
        .iter()
        .map(screened_paper_from_value)
        .collect::<Result<Vec<_>>>()?;

    debug!(count = papers.len(), "Snapshot normalized");
    Ok(papers)
}

/// Normalize a single record
pub fn screened_paper_from_value(value: &Value) -> Result<ScreenedPaper> {
    let map = value.as_object().ok_or_else(|| AppError::InvalidFormat {
        message: "paper record must be a JSON object".into(),
    })?;

    let decision = map
        .get("decision")
        .and_then(Value::as_str)
        .map(Decision::normalize)
        .unwrap_or_default();

    let confidence = map
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);

    let mut extra = serde_json::Map::new();
    for (key, val) in map {
        if !CONSUMED_KEYS.contains(&key.as_str()) {
            extra.insert(key.clone(), val.clone());
        }
    }

    Ok(ScreenedPaper {
        title: str_field(map, "title"),
        external_ids: external_ids(map),
        decision,
        confidence,
        reason: str_field(map, "reason"),
        source_query_id: map
            .get("source_query_id")
            .and_then(Value::as_i64)
            .unwrap_or(0),
        source_query_description: str_field(map, "source_query_description"),
        screening_timestamp: map
            .get("screening_timestamp")
            .and_then(Value::as_str)
            .and_then(parse_timestamp),
        bibliography: Bibliography {
            authors: author_names(map.get("authors")),
            venue: venue_name(map.get("venue")),
            publication_year: map
                .get("publication_year")
                .and_then(Value::as_i64)
                .map(|y| y as i32),
            abstract_text: map
                .get("abstract")
                .and_then(Value::as_str)
                .map(str::to_string),
            citation_count: map.get("citation_count").and_then(Value::as_i64),
            extra,
        },
    })
}

fn str_field(map: &serde_json::Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Collect identifiers: an already-typed `external_ids` array when
/// present, then flat `doi` / `openalex_id` fields.
fn external_ids(map: &serde_json::Map<String, Value>) -> Vec<ExternalId> {
    let mut ids: Vec<ExternalId> = map
        .get("external_ids")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    if let Some(doi) = map.get("doi").and_then(Value::as_str) {
        if !doi.trim().is_empty() {
            ids.push(ExternalId::doi(doi.trim()));
        }
    }
    if let Some(oa) = map.get("openalex_id").and_then(Value::as_str) {
        if !oa.trim().is_empty() {
            ids.push(ExternalId::openalex(oa.trim()));
        }
    }
    ids
}

/// Authors arrive either as plain strings or as objects with a `name`
fn author_names(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(name) => Some(name.clone()),
            Value::Object(obj) => obj
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .collect()
}

/// Venue arrives either as a plain string or as an object with a `name`
fn venue_name(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(name)) => Some(name.clone()),
        Some(Value::Object(obj)) => obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// Timestamps arrive as RFC 3339 or as naive ISO-8601 (assumed UTC)
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
