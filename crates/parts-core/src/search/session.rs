//! Result session: accumulated matches plus the continuation state behind them.
//!
//! A session runs at most one fetch at a time. Calls arriving while a fetch is in
//! flight are ignored and report [`IgnoreReason::Busy`]. Results are only replaced or
//! extended when a fetch succeeds. A failed `load_more` keeps its cursor so it can be
//! retried; a failed `search` still ends the previous query, so `load_more` has
//! nothing to continue until a search succeeds.

use super::fetch::{fetch_batch, FetchPosition};
use super::part_types::search_config_for;
use super::planner::{plan, PlannedQuery};
use super::predicate::SearchConfig;
use crate::catalog::{Record, RecordStore};
use crate::config::FetchLimits;
use crate::error::PartsError;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error};

/// Why a call had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Another search or load is still running.
    Busy,
    /// `load_more` was called before any successful search.
    NoActiveSearch,
}

/// Result of a `search` or `load_more` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Completed(SessionSnapshot),
    Ignored(IgnoreReason, SessionSnapshot),
}

impl SessionOutcome {
    pub fn snapshot(&self) -> &SessionSnapshot {
        match self {
            SessionOutcome::Completed(s) | SessionOutcome::Ignored(_, s) => s,
        }
    }

    pub fn ignored(&self) -> Option<IgnoreReason> {
        match self {
            SessionOutcome::Ignored(reason, _) => Some(*reason),
            SessionOutcome::Completed(_) => None,
        }
    }
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub results: Vec<Record>,
    pub loading: bool,
    pub error: Option<String>,
    /// A search is active and more store data may exist. Says nothing about whether
    /// it will match.
    pub has_more: bool,
    pub store_exhausted: bool,
    /// Matches added by the most recent successful call.
    pub last_batch_len: usize,
}

#[derive(Default)]
struct SessionState {
    query: Option<PlannedQuery>,
    results: Vec<Record>,
    position: FetchPosition,
    error: Option<String>,
    last_batch_len: usize,
}

/// Clears the loading flag when a call finishes, however it finishes.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One caller's progressive search over a record store.
pub struct SearchSession {
    store: Arc<dyn RecordStore>,
    limits: FetchLimits,
    loading: AtomicBool,
    state: Mutex<SessionState>,
}

impl SearchSession {
    pub fn new(store: Arc<dyn RecordStore>, limits: FetchLimits) -> Self {
        Self {
            store,
            limits,
            loading: AtomicBool::new(false),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn limits(&self) -> &FetchLimits {
        &self.limits
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> Option<LoadingGuard<'_>> {
        self.loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LoadingGuard(&self.loading))
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        // Writes are plain field assignments; a poisoned lock still holds valid state
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            results: state.results.clone(),
            loading: self.is_loading(),
            error: state.error.clone(),
            has_more: state.query.is_some() && !state.position.store_exhausted,
            store_exhausted: state.position.store_exhausted,
            last_batch_len: state.last_batch_len,
        }
    }

    fn fail(&self, err: &PartsError) {
        error!("Search failed: {}", err);
        self.state().error = Some(err.user_message());
    }

    /// Start a fresh search, replacing the current results on success. On failure the
    /// old results stay visible but the old query is dropped.
    pub async fn search(&self, config: &SearchConfig, term: &str) -> SessionOutcome {
        let Some(guard) = self.try_begin() else {
            debug!("Search ignored: session busy");
            return SessionOutcome::Ignored(IgnoreReason::Busy, self.snapshot());
        };

        let planned = plan(config, term);
        debug!(
            "Search: sort={:?} filters={} term={:?}",
            planned.constraints.sort.field,
            planned.constraints.filters.len(),
            planned.predicate.term()
        );

        let fetched = fetch_batch(
            self.store.as_ref(),
            &planned.constraints,
            |r: &Record| planned.predicate.matches(r),
            FetchPosition::default(),
            &self.limits,
        )
        .await;

        match fetched {
            Ok(batch) => {
                let mut state = self.state();
                state.last_batch_len = batch.records.len();
                state.results = batch.records;
                state.position = batch.position;
                state.query = Some(planned);
                state.error = None;
            }
            Err(e) => {
                self.fail(&e);
                let mut state = self.state();
                state.query = None;
                state.position = FetchPosition::default();
                state.last_batch_len = 0;
            }
        }

        drop(guard);
        SessionOutcome::Completed(self.snapshot())
    }

    /// Search a named part type. An unknown or empty key is reported through `error`
    /// without touching the store.
    pub async fn search_part_type(&self, part_type: &str, term: &str) -> SessionOutcome {
        match search_config_for(part_type) {
            Ok(config) => self.search(&config, term).await,
            Err(e) => {
                if self.is_loading() {
                    return SessionOutcome::Ignored(IgnoreReason::Busy, self.snapshot());
                }
                debug!("Search not started: {}", e);
                self.state().error = Some(e.user_message());
                SessionOutcome::Completed(self.snapshot())
            }
        }
    }

    /// Continue the active search, appending new matches on success.
    pub async fn load_more(&self) -> SessionOutcome {
        let Some(guard) = self.try_begin() else {
            debug!("Load more ignored: session busy");
            return SessionOutcome::Ignored(IgnoreReason::Busy, self.snapshot());
        };

        let active = {
            let state = self.state();
            state.query.clone().map(|q| (q, state.position.clone()))
        };
        let Some((planned, position)) = active else {
            drop(guard);
            return SessionOutcome::Ignored(IgnoreReason::NoActiveSearch, self.snapshot());
        };

        let fetched = fetch_batch(
            self.store.as_ref(),
            &planned.constraints,
            |r: &Record| planned.predicate.matches(r),
            position,
            &self.limits,
        )
        .await;

        match fetched {
            Ok(batch) => {
                let mut state = self.state();
                state.last_batch_len = batch.records.len();
                state.results.extend(batch.records);
                state.position = batch.position;
                state.error = None;
            }
            Err(e) => self.fail(&e),
        }

        drop(guard);
        SessionOutcome::Completed(self.snapshot())
    }
}
