//! Catalog records: an open bag of named scalar fields.
//!
//! Source spreadsheets disagree on which columns exist, so a record is a map rather
//! than a struct. Accessors never fail on a missing field; they report it as empty.

use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Field holding a record's display name.
pub const NAME_FIELD: &str = "Name";

/// A scalar field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    /// Convert an imported JSON value. Booleans become 0/1 and nested values keep their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Integer(i64::from(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => n.as_f64().map(FieldValue::Real).unwrap_or(FieldValue::Null),
            },
            serde_json::Value::String(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Render as text for substring matching. Null renders empty.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Null => Cow::Borrowed(""),
            FieldValue::Integer(i) => Cow::Owned(i.to_string()),
            FieldValue::Real(r) => Cow::Owned(r.to_string()),
            FieldValue::Text(s) => Cow::Borrowed(s),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Integer(_) | FieldValue::Real(_) => 1,
            FieldValue::Text(_) => 2,
        }
    }

    /// Compare the way SQLite compares mixed storage classes: NULL < numbers < text,
    /// numbers numerically, text bytewise.
    pub fn sql_cmp(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(b),
            (FieldValue::Integer(a), FieldValue::Real(b)) => (*a as f64).total_cmp(b),
            (FieldValue::Real(a), FieldValue::Integer(b)) => a.total_cmp(&(*b as f64)),
            (FieldValue::Real(a), FieldValue::Real(b)) => a.total_cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(r: f64) -> Self {
        FieldValue::Real(r)
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Null => ToSqlOutput::Owned(SqlValue::Null),
            FieldValue::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            FieldValue::Real(r) => ToSqlOutput::Owned(SqlValue::Real(*r)),
            FieldValue::Text(s) => ToSqlOutput::Borrowed(s.as_str().into()),
        })
    }
}

/// One catalog entry as returned by a record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Build a record from a stored name and its raw JSON object.
    ///
    /// The stored name replaces any `Name` in `data`. Stores sort and page on the
    /// name column, so the record must carry that exact value.
    pub fn from_stored(id: i64, name: &str, data: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut fields: BTreeMap<String, FieldValue> = data
            .iter()
            .map(|(key, value)| (key.clone(), FieldValue::from_json(value)))
            .collect();
        fields.insert(NAME_FIELD.to_string(), FieldValue::Text(name.to_string()));
        Self { id, fields }
    }

    /// Field value for ordering; absent fields order as NULL.
    pub fn sort_value(&self, field: &str) -> FieldValue {
        self.fields.get(field).cloned().unwrap_or(FieldValue::Null)
    }

    /// Field rendered as text; absent fields are empty.
    pub fn text(&self, field: &str) -> Cow<'_, str> {
        self.fields
            .get(field)
            .map(FieldValue::as_text)
            .unwrap_or(Cow::Borrowed(""))
    }

    pub fn name(&self) -> Cow<'_, str> {
        self.text(NAME_FIELD)
    }
}
