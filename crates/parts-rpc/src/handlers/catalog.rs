//! Catalog handlers: part types, import, part-number prefixes and calculator figures.

use super::{require_param, require_str_param};
use crate::server::AppState;
use parts_core::{CalculatorInputs, PartsError, PrefixInputs};
use serde_json::{json, Value};

pub async fn list_part_types(state: &AppState, _params: &Value) -> parts_core::Result<Value> {
    Ok(json!(state.api.part_type_keys()))
}

pub async fn get_search_config(state: &AppState, params: &Value) -> parts_core::Result<Value> {
    let part_type = require_str_param(params, "part_type", "partType")?;
    Ok(serde_json::to_value(state.api.search_config(&part_type)?)?)
}

pub async fn import_parts(state: &AppState, params: &Value) -> parts_core::Result<Value> {
    let parts = require_param(params, "parts", "parts")?;
    let summary = state.api.import_parts(parts.clone()).await?;
    Ok(serde_json::to_value(summary)?)
}

pub async fn add_part(state: &AppState, params: &Value) -> parts_core::Result<Value> {
    let part = require_param(params, "part", "part")?;
    let id = state.api.insert_part(part.clone()).await?;
    Ok(json!(id))
}

pub async fn count_parts(state: &AppState, _params: &Value) -> parts_core::Result<Value> {
    Ok(json!(state.api.count_parts().await?))
}

pub async fn clear_parts(state: &AppState, _params: &Value) -> parts_core::Result<Value> {
    state.api.clear_parts().await?;
    Ok(json!(true))
}

pub async fn create_field_index(state: &AppState, params: &Value) -> parts_core::Result<Value> {
    let field = require_str_param(params, "field", "field")?;
    state.api.create_field_index(&field).await?;
    Ok(json!(true))
}

pub async fn generate_prefix(state: &AppState, params: &Value) -> parts_core::Result<Value> {
    let inputs: PrefixInputs =
        serde_json::from_value(params.clone()).map_err(|e| PartsError::InvalidParams {
            message: format!("Invalid prefix inputs: {}", e),
        })?;
    Ok(json!(state.api.generate_prefix(&inputs)))
}

pub async fn calculate(state: &AppState, params: &Value) -> parts_core::Result<Value> {
    let inputs: CalculatorInputs =
        serde_json::from_value(params.clone()).map_err(|e| PartsError::InvalidParams {
            message: format!("Invalid calculator inputs: {}", e),
        })?;
    Ok(serde_json::to_value(state.api.calculate(&inputs)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parts_core::PartsApi;
    use tempfile::TempDir;

    async fn test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let api = PartsApi::new(temp_dir.path()).await.unwrap();
        (AppState::new(api), temp_dir)
    }

    #[tokio::test]
    async fn test_import_then_count() {
        let (state, _temp) = test_state().await;

        let summary = import_parts(&state, &json!({"parts": [{"Name": "a"}, {"Part No": "b"}]}))
            .await
            .unwrap();
        assert_eq!(summary["count"], json!(2));

        add_part(&state, &json!({"part": {"Name": "c", "type": "magnet"}}))
            .await
            .unwrap();
        assert_eq!(count_parts(&state, &json!({})).await.unwrap(), json!(3));
    }

    #[tokio::test]
    async fn test_add_part_without_name_is_validation_error() {
        let (state, _temp) = test_state().await;
        let err = add_part(&state, &json!({"part": {"type": "magnet"}}))
            .await
            .unwrap_err();
        assert_eq!(err.to_rpc_error_code(), -32005);
    }

    #[tokio::test]
    async fn test_generate_prefix_params() {
        let (state, _temp) = test_state().await;
        let prefix = generate_prefix(
            &state,
            &json!({"partGroup": "signs", "partType": "corrugated", "itemWidth": "18", "itemHeight": "24"}),
        )
        .await
        .unwrap();
        assert_eq!(prefix, json!("18x24"));
    }

    #[tokio::test]
    async fn test_clear_parts() {
        let (state, _temp) = test_state().await;
        import_parts(&state, &json!({"parts": [{"Name": "a"}, {"Name": "b"}]}))
            .await
            .unwrap();
        assert_eq!(clear_parts(&state, &json!({})).await.unwrap(), json!(true));
        assert_eq!(count_parts(&state, &json!({})).await.unwrap(), json!(0));
    }

    #[tokio::test]
    async fn test_calculate_params() {
        let (state, _temp) = test_state().await;
        let calc = calculate(
            &state,
            &json!({"partType": "acm_sign", "itemWidth": "24", "item_height": "18"}),
        )
        .await
        .unwrap();
        assert_eq!(calc["part_type"], json!("acm_sign"));
        assert_eq!(calc["lines"][0], json!({"key": "qty", "label": "# Up / Inverse Qty:", "value": 10}));

        let err = calculate(&state, &json!({"partType": "magnet", "itemWidth": "30", "itemHeight": "30"}))
            .await
            .unwrap_err();
        assert_eq!(err.to_rpc_error_code(), -32005);
        assert_eq!(err.user_message(), "Both dimensions exceed the roll width.");

        let err = calculate(&state, &json!({"includeBleed": "yes"})).await.unwrap_err();
        assert_eq!(err.to_rpc_error_code(), -32602);
    }

    #[tokio::test]
    async fn test_get_search_config() {
        let (state, _temp) = test_state().await;
        let config = get_search_config(&state, &json!({"partType": "magnet"}))
            .await
            .unwrap();
        assert_eq!(config["clientFilterField"], json!("Name"));

        let err = get_search_config(&state, &json!({"part_type": "hinge"}))
            .await
            .unwrap_err();
        assert_eq!(err.to_rpc_error_code(), -32005);
    }

    #[tokio::test]
    async fn test_list_part_types() {
        let (state, _temp) = test_state().await;
        let keys = list_part_types(&state, &json!({})).await.unwrap();
        assert_eq!(keys.as_array().unwrap().len(), 12);
    }
}
