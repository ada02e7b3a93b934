//! Split a search into what the store evaluates and what is checked locally.

use super::predicate::{case_insensitive_contains, SearchConfig, ServerFilter};
use crate::catalog::{Record, NAME_FIELD};
use serde::Serialize;

/// Ordering submitted to the store. Ascending on `field`, ties broken by record id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub field: String,
}

/// Filters and ordering the store evaluates natively.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerConstraints {
    pub filters: Vec<ServerFilter>,
    pub sort: SortSpec,
}

impl ServerConstraints {
    /// Fields compared with a range operator.
    pub fn range_fields(&self) -> impl Iterator<Item = &str> {
        self.filters
            .iter()
            .filter(|f| f.op.is_range())
            .map(|f| f.field.as_str())
    }
}

/// Post-retrieval predicate: free-text name match AND keyword filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientPredicate {
    term: String,
    keyword_field: Option<String>,
    keywords: Vec<String>,
}

impl ClientPredicate {
    pub fn matches(&self, record: &Record) -> bool {
        if !case_insensitive_contains(&record.name(), &self.term) {
            return false;
        }

        match &self.keyword_field {
            Some(field) => {
                let text = record.text(field);
                self.keywords.iter().any(|k| case_insensitive_contains(&text, k))
            }
            None => true,
        }
    }

    /// The folded free-text term.
    pub fn term(&self) -> &str {
        &self.term
    }
}

/// Output of [`plan`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedQuery {
    pub constraints: ServerConstraints,
    pub predicate: ClientPredicate,
}

/// Plan a search for `config` and the free-text `term`.
///
/// The store requires the sort key to match a range-filtered field, so the first
/// range filter decides the order; otherwise records are ordered by display name.
pub fn plan(config: &SearchConfig, term: &str) -> PlannedQuery {
    let sort_field = config
        .range_filter()
        .map(|f| f.field.clone())
        .unwrap_or_else(|| NAME_FIELD.to_string());

    let (keyword_field, keywords) = match config.keyword_filter() {
        Some((field, values)) => (
            Some(field.to_string()),
            values.iter().map(|v| v.to_lowercase()).collect(),
        ),
        None => (None, Vec::new()),
    };

    PlannedQuery {
        constraints: ServerConstraints {
            filters: config.server_filters.clone(),
            sort: SortSpec { field: sort_field },
        },
        predicate: ClientPredicate {
            term: term.trim().to_lowercase(),
            keyword_field,
            keywords,
        },
    }
}
