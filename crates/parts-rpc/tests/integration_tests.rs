//! Integration tests for the parts-rpc JSON-RPC server.
//!
//! These tests spawn the server binary against a temporary data root and verify
//! that responses have the shapes the UI expects.

use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncBufReadExt;

/// Make an RPC call to the server.
async fn rpc_call(port: u16, method: &str, params: Value) -> Result<Value, String> {
    let json = rpc_call_raw(port, method, params).await?;
    if let Some(error) = json.get("error") {
        return Err(error.to_string());
    }
    Ok(json.get("result").cloned().unwrap_or(Value::Null))
}

/// Make an RPC call and return the full JSON-RPC payload.
async fn rpc_call_raw(port: u16, method: &str, params: Value) -> Result<Value, String> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://127.0.0.1:{}/rpc", port))
        .json(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    response.json::<Value>().await.map_err(|e| e.to_string())
}

/// Check health endpoint.
async fn check_health(port: u16) -> bool {
    let client = reqwest::Client::new();
    if let Ok(response) = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
    {
        if let Ok(json) = response.json::<Value>().await {
            return json.get("status").and_then(|v| v.as_str()) == Some("ok");
        }
    }
    false
}

/// Wait for server to be ready.
async fn wait_for_server(port: u16, timeout_secs: u64) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_secs(timeout_secs) {
        if check_health(port).await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

struct RpcServerHandle {
    child: tokio::process::Child,
    port: u16,
    stdout_drain: Option<tokio::task::JoinHandle<()>>,
}

impl RpcServerHandle {
    async fn stop(mut self) {
        if let Some(drain) = self.stdout_drain.take() {
            drain.abort();
        }
        let _ = self.child.kill().await;
        let _ = self.child.wait().await;
    }
}

impl Drop for RpcServerHandle {
    fn drop(&mut self) {
        if let Some(drain) = self.stdout_drain.take() {
            drain.abort();
        }
        let _ = self.child.start_kill();
    }
}

/// Start the RPC binary with extra flags and wait until `/health` is ready.
async fn start_rpc_server(data_root: &std::path::Path, extra_args: &[&str]) -> Result<RpcServerHandle, String> {
    let binary = PathBuf::from(env!("CARGO_BIN_EXE_parts-rpc"));

    let mut child = tokio::process::Command::new(&binary)
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg("0")
        .arg("--data-root")
        .arg(data_root)
        .args(extra_args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("failed to spawn parts-rpc: {e}"))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| "failed to capture stdout".to_string())?;
    let mut lines = tokio::io::BufReader::new(stdout).lines();

    let mut discovered_port: Option<u16> = None;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
    while tokio::time::Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_millis(250), lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                if let Some(value) = line.strip_prefix("RPC_PORT=") {
                    let parsed = value
                        .trim()
                        .parse::<u16>()
                        .map_err(|e| format!("invalid RPC_PORT value '{value}': {e}"))?;
                    discovered_port = Some(parsed);
                    break;
                }
            }
            Ok(Ok(None)) => break,
            Ok(Err(err)) => return Err(format!("failed to read parts-rpc stdout: {err}")),
            Err(_) => continue,
        }
    }

    let port =
        discovered_port.ok_or_else(|| "RPC_PORT line not emitted by parts-rpc".to_string())?;
    if !wait_for_server(port, 15).await {
        return Err(format!("parts-rpc failed health check on port {port}"));
    }

    let stdout_drain =
        tokio::spawn(async move { while let Ok(Some(_)) = lines.next_line().await {} });

    Ok(RpcServerHandle {
        child,
        port,
        stdout_drain: Some(stdout_drain),
    })
}

fn sign_catalog() -> Value {
    let mut parts = Vec::new();
    for i in 0..30 {
        parts.push(json!({
            "Name": format!("3mmx{}x24 panel", 10 + i),
            "Part Group": "Signs",
            "Part Type": "Small Signs",
        }));
    }
    for i in 0..5 {
        parts.push(json!({
            "Part Name": format!("Coroplast 18x{}", 20 + i),
            "Part Group": "Signs",
            "Part Type": "Temporary Markings",
        }));
    }
    Value::Array(parts)
}

/// Validate the session state shape returned by search/load_more/get_session.
fn validate_session_response(response: &Value) -> Result<(), String> {
    if response.get("success").and_then(|v| v.as_bool()).is_none() {
        return Err("Missing 'success' field".into());
    }
    for field in ["results", "loading", "has_more", "store_exhausted", "last_batch_len"] {
        if response.get(field).is_none() {
            return Err(format!("Missing field: {}", field));
        }
    }
    if !response["results"].is_array() {
        return Err("'results' must be an array".into());
    }
    Ok(())
}

#[tokio::test]
async fn test_health_check() {
    let temp_dir = TempDir::new().unwrap();
    let server = start_rpc_server(temp_dir.path(), &[]).await.unwrap();

    assert!(check_health(server.port).await);
    let result = rpc_call(server.port, "health_check", json!({})).await.unwrap();
    assert_eq!(result["status"], json!("ok"));

    server.stop().await;
}

#[tokio::test]
async fn test_import_and_progressive_search() {
    let temp_dir = TempDir::new().unwrap();
    let server = start_rpc_server(
        temp_dir.path(),
        &["--target-count", "10", "--chunk-size", "10", "--max-chunks", "5"],
    )
    .await
    .unwrap();
    let port = server.port;

    let imported = rpc_call(port, "import_parts", json!({"parts": sign_catalog()}))
        .await
        .unwrap();
    assert_eq!(imported["success"], json!(true));
    assert_eq!(imported["count"], json!(35));

    let created = rpc_call(port, "create_session", json!({})).await.unwrap();
    let session_id = created["session_id"].as_str().unwrap().to_string();

    let first = rpc_call(
        port,
        "search",
        json!({"session_id": &session_id, "part_type": "acm_sign"}),
    )
    .await
    .unwrap();
    validate_session_response(&first).unwrap();
    assert_eq!(first["results"].as_array().unwrap().len(), 10);
    assert_eq!(first["has_more"], json!(true));

    let mut last = first;
    while last["store_exhausted"] == json!(false) {
        last = rpc_call(port, "load_more", json!({"sessionId": &session_id}))
            .await
            .unwrap();
        validate_session_response(&last).unwrap();
    }
    assert_eq!(last["results"].as_array().unwrap().len(), 30);
    assert_eq!(last["has_more"], json!(false));

    let state = rpc_call(port, "get_session", json!({"session_id": &session_id}))
        .await
        .unwrap();
    assert_eq!(state["results"].as_array().unwrap().len(), 30);

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_part_type_reports_message() {
    let temp_dir = TempDir::new().unwrap();
    let server = start_rpc_server(temp_dir.path(), &[]).await.unwrap();

    let created = rpc_call(server.port, "create_session", json!({})).await.unwrap();
    let result = rpc_call(
        server.port,
        "search",
        json!({"sessionId": created["session_id"], "partType": "vhbTape"}),
    )
    .await
    .unwrap();
    assert_eq!(result["error"], json!("No data available for this part type."));
    assert_eq!(result["results"], json!([]));

    server.stop().await;
}

#[tokio::test]
async fn test_error_handling() {
    let temp_dir = TempDir::new().unwrap();
    let server = start_rpc_server(temp_dir.path(), &[]).await.unwrap();
    let port = server.port;

    let unknown = rpc_call_raw(port, "no_such_method", json!({})).await.unwrap();
    assert_eq!(unknown["error"]["code"], json!(-32601));

    let bad_session = rpc_call_raw(port, "load_more", json!({"session_id": "nope"}))
        .await
        .unwrap();
    assert_eq!(bad_session["error"]["code"], json!(-32602));

    let bad_part = rpc_call_raw(port, "add_part", json!({"part": {"Width": 12}}))
        .await
        .unwrap();
    assert_eq!(bad_part["error"]["code"], json!(-32005));

    server.stop().await;
}

#[tokio::test]
async fn test_index_required_mode() {
    let temp_dir = TempDir::new().unwrap();
    let server = start_rpc_server(temp_dir.path(), &["--require-indexes"]).await.unwrap();
    let port = server.port;

    rpc_call(port, "import_parts", json!({"parts": sign_catalog()}))
        .await
        .unwrap();
    let created = rpc_call(port, "create_session", json!({})).await.unwrap();
    let config = json!({"serverFilters": [{"field": "Part Type", "op": ">=", "value": "T"}]});

    let result = rpc_call(
        port,
        "search",
        json!({"session_id": created["session_id"], "config": &config}),
    )
    .await
    .unwrap();
    let message = result["error"].as_str().unwrap();
    assert!(message.contains("create_field_index"));

    let indexed = rpc_call(port, "create_field_index", json!({"field": "Part Type"}))
        .await
        .unwrap();
    assert_eq!(indexed["success"], json!(true));

    let result = rpc_call(
        port,
        "search",
        json!({"session_id": created["session_id"], "config": &config}),
    )
    .await
    .unwrap();
    assert_eq!(result["error"], Value::Null);
    assert_eq!(result["results"].as_array().unwrap().len(), 5);

    server.stop().await;
}

#[tokio::test]
async fn test_parameter_variants() {
    let temp_dir = TempDir::new().unwrap();
    let server = start_rpc_server(temp_dir.path(), &[]).await.unwrap();

    let camel = rpc_call(
        server.port,
        "generate_prefix",
        json!({"partGroup": "signs", "partType": "acm_sign", "itemWidth": "12", "itemHeight": "18"}),
    )
    .await
    .unwrap();
    let snake = rpc_call(
        server.port,
        "generate_prefix",
        json!({"part_group": "signs", "part_type": "acm_sign", "item_width": "12", "item_height": "18"}),
    )
    .await
    .unwrap();
    assert_eq!(camel["prefix"], json!("3mmx12x18"));
    assert_eq!(camel, snake);

    let types = rpc_call(server.port, "list_part_types", json!({})).await.unwrap();
    assert!(types["part_types"]
        .as_array()
        .unwrap()
        .contains(&json!("screenDecal")));

    server.stop().await;
}

#[tokio::test]
async fn test_calculate_and_clear_parts() {
    let temp_dir = TempDir::new().unwrap();
    let server = start_rpc_server(temp_dir.path(), &[]).await.unwrap();
    let port = server.port;

    let banner = rpc_call(
        port,
        "calculate",
        json!({"partType": "banner", "itemWidth": "48", "itemHeight": "24"}),
    )
    .await
    .unwrap();
    assert_eq!(banner["success"], json!(true));
    assert_eq!(banner["lines"][2]["key"], json!("grommets"));
    assert_eq!(banner["lines"][2]["value"], json!(4));

    let too_wide = rpc_call_raw(
        port,
        "calculate",
        json!({"part_type": "digital_print", "item_width": "60", "item_height": "60"}),
    )
    .await
    .unwrap();
    assert_eq!(too_wide["error"]["code"], json!(-32005));

    rpc_call(port, "import_parts", json!({"parts": sign_catalog()}))
        .await
        .unwrap();
    let cleared = rpc_call(port, "clear_parts", json!({})).await.unwrap();
    assert_eq!(cleared["success"], json!(true));
    let counted = rpc_call(port, "count_parts", json!({})).await.unwrap();
    assert_eq!(counted["count"], json!(0));

    server.stop().await;
}
