//! Integration tests for MCP protocol handling.
//!
//! These tests drive the server loop end to end over in-memory input and
//! check what it writes back, one JSON object per line.

mod common;

use serde_json::{json, Value};

use admanager_mcp::error::ClientError;
use admanager_mcp::mcp::server::{McpServer, ServerState};
use admanager_mcp::mcp::Transport;

use common::FakeAdManager;

/// Feeds `input` to a server backed by a fake client and returns each output
/// line parsed as JSON.
async fn run_session(input: &str) -> Vec<Value> {
    let mut server = McpServer::new(Ok(Box::new(FakeAdManager::new())));
    run_with(&mut server, input).await
}

async fn run_with(server: &mut McpServer, input: &str) -> Vec<Value> {
    let mut transport = Transport::new(input.as_bytes(), Vec::new());
    server.serve(&mut transport).await.unwrap();
    assert_eq!(server.state(), ServerState::Terminated);

    let output = String::from_utf8(transport.into_writer()).unwrap();
    output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn tool_envelope(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_initialize_handshake() {
    let responses = run_session(concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test-client","version":"1.0.0"}}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
    ))
    .await;

    assert_eq!(responses.len(), 1, "notification must not be answered");
    let init = &responses[0];
    assert_eq!(init["jsonrpc"], "2.0");
    assert_eq!(init["id"], 1);
    assert_eq!(init["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(init["result"]["serverInfo"]["name"], "admanager-mcp");
    assert!(init["result"]["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn test_requests_work_without_initialize() {
    let responses = run_session("{\"id\":1,\"method\":\"tools/list\"}\n").await;
    assert_eq!(responses[0]["result"]["tools"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn test_ping() {
    let responses = run_session("{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n").await;
    assert_eq!(responses, [json!({"jsonrpc": "2.0", "id": 7, "result": {}})]);
}

#[tokio::test]
async fn test_empty_input_terminates() {
    assert!(run_session("").await.is_empty());
}

// =============================================================================
// Framing and ids
// =============================================================================

#[tokio::test]
async fn test_malformed_lines_are_skipped() {
    let responses = run_session(concat!(
        "this is not json\n",
        "[1,2,3]\n",
        "\n",
        "   \n",
        "{\"id\":2,\"method\":\"ping\"}\n",
    ))
    .await;

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], 2);
}

#[tokio::test]
async fn test_ids_are_echoed_verbatim() {
    let responses = run_session(concat!(
        "{\"id\":\"abc\",\"method\":\"ping\"}\n",
        "{\"id\":{\"seq\":3},\"method\":\"ping\"}\n",
        "{\"method\":\"ping\"}\n",
        "{\"id\":null,\"method\":\"ping\"}\n",
    ))
    .await;

    let ids: Vec<&Value> = responses.iter().map(|r| &r["id"]).collect();
    assert_eq!(ids, [&json!("abc"), &json!({"seq": 3}), &Value::Null, &Value::Null]);
}

#[tokio::test]
async fn test_crlf_lines_are_accepted() {
    let responses = run_session("{\"id\":1,\"method\":\"ping\"}\r\n").await;
    assert_eq!(responses.len(), 1);
}

// =============================================================================
// Dispatch
// =============================================================================

#[tokio::test]
async fn test_unknown_method_is_inline_result() {
    let responses = run_session("{\"id\":4,\"method\":\"prompts/list\"}\n").await;

    assert_eq!(responses[0]["result"], json!({"error": "Unknown method: prompts/list"}));
    assert!(responses[0].get("error").is_none());
}

#[tokio::test]
async fn test_unknown_tool_envelope() {
    let responses = run_session(
        "{\"id\":5,\"method\":\"tools/call\",\"params\":{\"name\":\"delete_everything\"}}\n",
    )
    .await;

    assert_eq!(responses[0]["result"]["isError"], true);
    let envelope = tool_envelope(&responses[0]);
    assert_eq!(
        envelope,
        json!({"success": false, "error": "Unknown tool: delete_everything"})
    );
}

#[tokio::test]
async fn test_undecodable_params_are_internal_error() {
    let responses = run_session(concat!(
        "{\"id\":6,\"method\":\"tools/call\",\"params\":{\"arguments\":{}}}\n",
        "{\"id\":7,\"method\":\"tools/call\"}\n",
    ))
    .await;

    for response in &responses {
        assert_eq!(response["error"]["code"], -32603);
        assert!(response.get("result").is_none());
    }
    assert_eq!(responses[0]["id"], 6);
}

#[tokio::test]
async fn test_tool_call_returns_pretty_envelope() {
    let responses = run_session(
        "{\"id\":8,\"method\":\"tools/call\",\"params\":{\"name\":\"manage_inventory\",\"arguments\":{\"action\":\"list\"}}}\n",
    )
    .await;

    let result = &responses[0]["result"];
    assert!(result.get("isError").is_none());
    assert_eq!(result["content"][0]["type"], "text");

    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.contains('\n'), "envelope text is pretty-printed");

    let envelope = tool_envelope(&responses[0]);
    assert_eq!(envelope["success"], true);
    assert_eq!(envelope["total"], 2);
}

#[tokio::test]
async fn test_get_help_via_tools_call() {
    let responses = run_session(
        "{\"id\":9,\"method\":\"tools/call\",\"params\":{\"name\":\"get_help\",\"arguments\":{}}}\n",
    )
    .await;

    let envelope = tool_envelope(&responses[0]);
    assert_eq!(envelope["tools"].as_array().unwrap().len(), 7);
    assert_eq!(envelope["total_functions"], 7);
}

#[tokio::test]
async fn test_handler_failure_keeps_loop_running() {
    let responses = run_session(concat!(
        "{\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"manage_orders\",\"arguments\":{\"action\":\"get\"}}}\n",
        "{\"id\":2,\"method\":\"ping\"}\n",
    ))
    .await;

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["result"]["isError"], true);
    assert_eq!(tool_envelope(&responses[0])["detail"], "missing required parameter: order_id");
    assert_eq!(responses[1]["result"], json!({}));
}

#[tokio::test]
async fn test_server_without_client_still_answers() {
    let mut server = McpServer::new(Err(ClientError::Init("no credentials".to_string())));
    let responses = run_with(
        &mut server,
        concat!(
            "{\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"manage_networks\"}}\n",
            "{\"id\":2,\"method\":\"tools/call\",\"params\":{\"name\":\"get_help\"}}\n",
        ),
    )
    .await;

    let failed = tool_envelope(&responses[0]);
    assert_eq!(failed["success"], false);
    assert!(failed["error"].as_str().unwrap().contains("no credentials"));

    let help = tool_envelope(&responses[1]);
    assert_eq!(help["client"]["status"], "unavailable");
}

#[tokio::test]
async fn test_calls_reach_the_client_in_order() {
    let fake = FakeAdManager::new();
    let log = fake.call_log();
    let mut server = McpServer::new(Ok(Box::new(fake)));

    run_with(
        &mut server,
        concat!(
            "{\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"manage_line_items\",\"arguments\":{\"order_id\":\"5\"}}}\n",
            "{\"id\":2,\"method\":\"tools/call\",\"params\":{\"name\":\"generate_report\",\"arguments\":{\"report_type\":\"creative\"}}}\n",
        ),
    )
    .await;

    let calls = log.lock().unwrap().clone();
    assert_eq!(
        calls,
        [r#"list_line_items Some("5")"#, "run_report CREATIVE_NAME"]
    );
}
