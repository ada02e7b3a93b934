//! Search session handlers.

use super::{get_param, get_str_param, require_str_param};
use crate::server::AppState;
use parts_core::{PartsError, SearchConfig, SearchSession, SessionOutcome, SessionSnapshot};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

async fn session_for(state: &AppState, params: &Value) -> parts_core::Result<Arc<SearchSession>> {
    let session_id = require_str_param(params, "session_id", "sessionId")?;
    state
        .sessions
        .read()
        .await
        .get(&session_id)
        .cloned()
        .ok_or_else(|| PartsError::InvalidParams {
            message: format!("Unknown session: {}", session_id),
        })
}

fn snapshot_value(snapshot: &SessionSnapshot) -> parts_core::Result<Value> {
    let mut value = serde_json::to_value(snapshot)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("success".to_string(), json!(true));
    }
    Ok(value)
}

fn outcome_value(outcome: &SessionOutcome) -> parts_core::Result<Value> {
    let mut value = snapshot_value(outcome.snapshot())?;
    if let (Some(reason), Some(obj)) = (outcome.ignored(), value.as_object_mut()) {
        obj.insert("ignored".to_string(), serde_json::to_value(reason)?);
    }
    Ok(value)
}

pub async fn create_session(state: &AppState, _params: &Value) -> parts_core::Result<Value> {
    let session_id = uuid::Uuid::new_v4().to_string();
    let session = Arc::new(state.api.new_session());
    state
        .sessions
        .write()
        .await
        .insert(session_id.clone(), session);
    debug!("Created search session {}", session_id);
    Ok(json!(session_id))
}

pub async fn close_session(state: &AppState, params: &Value) -> parts_core::Result<Value> {
    let session_id = require_str_param(params, "session_id", "sessionId")?;
    let removed = state.sessions.write().await.remove(&session_id).is_some();
    debug!("Closed search session {} (existed={})", session_id, removed);
    Ok(json!(removed))
}

/// Start a fresh search. Either `part_type` names a configured part type, or
/// `config` supplies a search configuration directly.
pub async fn search(state: &AppState, params: &Value) -> parts_core::Result<Value> {
    let session = session_for(state, params).await?;
    let term = get_str_param(params, "search_name", "searchName").unwrap_or("");

    let outcome = match get_param(params, "config", "config") {
        Some(raw) => {
            let config: SearchConfig =
                serde_json::from_value(raw.clone()).map_err(|e| PartsError::InvalidParams {
                    message: format!("Invalid search config: {}", e),
                })?;
            session.search(&config, term).await
        }
        None => {
            let part_type = get_str_param(params, "part_type", "partType").unwrap_or("");
            session.search_part_type(part_type, term).await
        }
    };

    let snapshot = outcome.snapshot();
    info!(
        "Search returned {} result(s), has_more={}",
        snapshot.results.len(),
        snapshot.has_more
    );
    outcome_value(&outcome)
}

pub async fn load_more(state: &AppState, params: &Value) -> parts_core::Result<Value> {
    let session = session_for(state, params).await?;
    let outcome = session.load_more().await;
    outcome_value(&outcome)
}

pub async fn get_session(state: &AppState, params: &Value) -> parts_core::Result<Value> {
    let session = session_for(state, params).await?;
    snapshot_value(&session.snapshot())
}
