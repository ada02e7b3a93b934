//! Declarative search configuration for a part type.

use crate::catalog::Record;
use serde::{Deserialize, Serialize};

/// Case-insensitive substring test. An empty needle matches everything.
pub fn case_insensitive_contains(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Comparison operators the record store evaluates natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "=", alias = "==")]
    Eq,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
}

impl FilterOp {
    pub fn is_range(&self) -> bool {
        !matches!(self, FilterOp::Eq)
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
            FilterOp::Gt => ">",
            FilterOp::Lt => "<",
        }
    }
}

/// A predicate the store evaluates: `field op value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

impl ServerFilter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

/// Query shape for one part type.
///
/// `server_filters` are ANDed by the store. The keyword filter is evaluated after
/// retrieval: a record passes when `client_filter_field` contains any of
/// `client_filter_values`, ignoring case. Without a field the keyword filter is
/// vacuously true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    #[serde(default)]
    pub server_filters: Vec<ServerFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_filter_field: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub client_filter_values: Vec<String>,
}

impl SearchConfig {
    pub fn new(server_filters: Vec<ServerFilter>) -> Self {
        Self {
            server_filters,
            ..Default::default()
        }
    }

    pub fn with_keywords(mut self, field: impl Into<String>, values: &[&str]) -> Self {
        self.client_filter_field = Some(field.into());
        self.client_filter_values = values.iter().map(|v| v.to_string()).collect();
        self
    }

    /// First server filter using a range operator, if any.
    pub fn range_filter(&self) -> Option<&ServerFilter> {
        self.server_filters.iter().find(|f| f.op.is_range())
    }

    /// The keyword filter, present only when both a field and at least one value exist.
    pub fn keyword_filter(&self) -> Option<(&str, &[String])> {
        match &self.client_filter_field {
            Some(field) if !self.client_filter_values.is_empty() => {
                Some((field.as_str(), self.client_filter_values.as_slice()))
            }
            _ => None,
        }
    }

    /// Evaluate only the keyword filter against a record.
    pub fn keywords_match(&self, record: &Record) -> bool {
        match self.keyword_filter() {
            Some((field, values)) => {
                let text = record.text(field);
                values.iter().any(|v| case_insensitive_contains(&text, v))
            }
            None => true,
        }
    }
}
