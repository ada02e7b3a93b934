//! Response wrapping for frontend compatibility.
//!
//! The UI expects every result as an object of the form `{success: bool, ...data}`.
//! Handlers return the raw value; this module shapes it per method.

use serde_json::{json, Value};

/// Merge `success: true` into an object result.
fn with_success(result: Value) -> Value {
    match result {
        Value::Object(mut obj) => {
            obj.insert("success".to_string(), json!(true));
            Value::Object(obj)
        }
        other => json!({"success": true, "result": other}),
    }
}

/// Wrap API responses to match the frontend's expected format.
pub fn wrap_response(method: &str, result: Value) -> Value {
    match method {
        // List wrappers
        "list_part_types" => {
            json!({
                "success": true,
                "part_types": if result.is_null() { json!([]) } else { result }
            })
        }

        // Scalar wrappers
        "create_session" => json!({"success": true, "session_id": result}),
        "add_part" => json!({"success": true, "id": result}),
        "count_parts" => {
            json!({
                "success": true,
                "count": result.as_u64().unwrap_or(0)
            })
        }
        "generate_prefix" => {
            json!({
                "success": true,
                "prefix": result.as_str().unwrap_or("")
            })
        }

        "get_search_config" => json!({"success": true, "config": result}),

        // Bool methods
        "close_session" | "create_field_index" | "clear_parts" => {
            json!({
                "success": result.as_bool().unwrap_or(false)
            })
        }

        // Object results that only need the success flag
        "import_parts" | "calculate" => with_success(result),

        // Session methods (handler returns {success, ...state} directly)
        "search" | "load_more" | "get_session" => result,

        // Default: return as-is (for methods not explicitly handled)
        _ => result,
    }
}
