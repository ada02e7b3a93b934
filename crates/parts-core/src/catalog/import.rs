//! Mapping raw JSON exports onto stored parts.
//!
//! Spreadsheet exports name their columns inconsistently, so the stored name and type
//! are picked from a short list of known column names. The whole object is kept as
//! the part's data.

use crate::error::{PartsError, Result};
use serde::Serialize;
use serde_json::{Map, Value};

const NAME_COLUMNS: [&str; 3] = ["Name", "Part Name", "Part No"];
const TYPE_COLUMNS: [&str; 2] = ["Part Type", "Type"];
const UNKNOWN_NAME: &str = "Unknown Part";
const DEFAULT_TYPE: &str = "misc";

/// A part ready to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PartDraft {
    pub name: String,
    pub part_type: String,
    pub data: Map<String, Value>,
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub count: usize,
    pub imported_at: String,
}

/// Non-empty text for a column value; empty strings, zero, false and null don't count.
fn present_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn first_present(object: &Map<String, Value>, columns: &[&str]) -> Option<String> {
    columns
        .iter()
        .filter_map(|c| object.get(*c))
        .find_map(present_text)
}

/// Map one element of a bulk import.
pub fn map_imported_part(value: &Value, position: usize) -> Result<PartDraft> {
    let object = value.as_object().ok_or_else(|| {
        PartsError::validation("parts", format!("Element {} is not a JSON object", position))
    })?;

    Ok(PartDraft {
        name: first_present(object, &NAME_COLUMNS).unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        part_type: first_present(object, &TYPE_COLUMNS).unwrap_or_else(|| DEFAULT_TYPE.to_string()),
        data: object.clone(),
    })
}

/// Map a single part added by hand: `Name` is required, `type` defaults to "misc",
/// every other field becomes data.
pub fn map_new_part(value: &Value) -> Result<PartDraft> {
    let object = value
        .as_object()
        .ok_or_else(|| PartsError::validation("part", "Expected a JSON object"))?;

    let name = object
        .get("Name")
        .and_then(present_text)
        .ok_or_else(|| PartsError::validation("Name", "Name is required"))?;
    let part_type = object
        .get("type")
        .and_then(present_text)
        .unwrap_or_else(|| DEFAULT_TYPE.to_string());

    let data = object
        .iter()
        .filter(|(k, _)| k.as_str() != "Name" && k.as_str() != "type")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(PartDraft {
        name,
        part_type,
        data,
    })
}

/// Map a whole import payload, rejecting it if it isn't an array of objects.
pub fn map_import_payload(payload: &Value) -> Result<Vec<PartDraft>> {
    let parts = payload
        .as_array()
        .ok_or_else(|| PartsError::validation("parts", "Expected an array of parts"))?;

    parts
        .iter()
        .enumerate()
        .map(|(i, part)| map_imported_part(part, i))
        .collect()
}
