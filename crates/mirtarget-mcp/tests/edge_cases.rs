//! Edge case integration tests for mirtarget-mcp.
//!
//! Drives `ProtocolHandler` with raw JSON-RPC values against a scripted
//! results page, so no browser or network is needed.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::Mutex;

use mirtarget_engine::testing::{ScriptedFactory, ScriptedPage, TableFrame};
use mirtarget_engine::{EngineConfig, ExportOptions, QueryOrchestrator};
use mirtarget_mcp::protocol::ProtocolHandler;
use mirtarget_mcp::session::LookupSessionManager;
use mirtarget_mcp::transport::framing;
use mirtarget_mcp::types::*;

// ─────────────────────── helpers ───────────────────────

const INTERACTIONS: &str = "#interactionTable";
const NODES: &str = "#nodeTable";

fn interaction_rows(n: usize) -> Vec<Vec<String>> {
    (0..n)
        .map(|i| {
            vec![
                "hsa-miR-34a-5p".to_string(),
                format!("GENE{i}"),
                "Strong".to_string(),
                "miRTarBase".to_string(),
                "Western blot".to_string(),
                format!("{}", 17_000_000 + i),
            ]
        })
        .collect()
}

/// A results page whose interaction table reloads into `rows` after the apply trigger.
fn site(rows: usize) -> ScriptedPage {
    ScriptedPage::results_page()
        .with_table(INTERACTIONS, TableFrame::rows(interaction_rows(1)))
        .with_table(
            NODES,
            TableFrame::rows(vec![vec![
                "KEGG".into(),
                "pathways".into(),
                "p53 signaling pathway".into(),
                "gene".into(),
                "TP53".into(),
            ]]),
        )
        .reload_timeline(
            INTERACTIONS,
            vec![
                (Duration::from_millis(400), TableFrame::loading()),
                (Duration::from_secs(5), TableFrame::rows(interaction_rows(rows))),
            ],
        )
}

fn handler_with(config: EngineConfig, page: ScriptedPage) -> (ProtocolHandler, Arc<ScriptedFactory>) {
    let factory = Arc::new(ScriptedFactory::new(page));
    let orchestrator = QueryOrchestrator::new(config, factory.clone());
    let session = LookupSessionManager::new(orchestrator);
    (ProtocolHandler::new(Arc::new(Mutex::new(session))), factory)
}

fn handler(page: ScriptedPage) -> (ProtocolHandler, Arc<ScriptedFactory>) {
    handler_with(EngineConfig::default(), page)
}

fn mcp_request(id: i64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

fn init_request() -> Value {
    mcp_request(
        0,
        "initialize",
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "1.0" }
        }),
    )
}

fn tool_call(id: i64, name: &str, arguments: Value) -> Value {
    mcp_request(id, "tools/call", json!({ "name": name, "arguments": arguments }))
}

async fn send(handler: &ProtocolHandler, msg: Value) -> Option<Value> {
    let parsed: JsonRpcMessage = serde_json::from_value(msg).unwrap();
    handler.handle_message(parsed).await
}

async fn send_unwrap(handler: &ProtocolHandler, msg: Value) -> Value {
    send(handler, msg).await.expect("expected response")
}

/// The tool result's first text block, parsed as JSON.
fn tool_payload(resp: &Value) -> Value {
    let text = resp["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn is_tool_error(resp: &Value) -> bool {
    resp["result"]["isError"] == json!(true)
}

// ═══════════════════════════════════════════════════════
// PROTOCOL
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_01_initialize_advertises_server() {
    let (handler, _) = handler(site(3));
    let resp = send_unwrap(&handler, init_request()).await;

    assert_eq!(resp["id"], 0);
    assert_eq!(resp["result"]["serverInfo"]["name"], "miRTargetLink2_MCP");
    assert_eq!(resp["result"]["protocolVersion"], "2024-11-05");
    assert!(resp["result"]["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn test_02_malformed_json() {
    let err = framing::parse_message(r#"{"broken":"#).unwrap_err();
    assert_eq!(err.code(), -32700);
    assert!(framing::parse_message("").is_err());
    assert!(framing::parse_message(r#"{"jsonrpc":"2.0","id":1,"method":"#).is_err());
}

#[tokio::test]
async fn test_03_wrong_jsonrpc_version() {
    let (handler, _) = handler(site(3));
    let resp = send_unwrap(
        &handler,
        json!({ "jsonrpc": "1.0", "id": 3, "method": "ping" }),
    )
    .await;
    assert_eq!(resp["error"]["code"], -32600);
}

#[tokio::test]
async fn test_04_unknown_method_and_tool() {
    let (handler, _) = handler(site(3));
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(&handler, mcp_request(1, "prompts/list", json!({}))).await;
    assert_eq!(resp["error"]["code"], -32601);

    let resp = send_unwrap(&handler, tool_call(2, "capture_screenshot", json!({}))).await;
    assert_eq!(resp["error"]["code"], -32803);
}

#[tokio::test]
async fn test_05_notifications_get_no_response() {
    let (handler, _) = handler(site(3));
    send_unwrap(&handler, init_request()).await;
    let resp = send(
        &handler,
        json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
    )
    .await;
    assert!(resp.is_none());
}

#[tokio::test]
async fn test_06_tools_list() {
    let (handler, _) = handler(site(3));
    let resp = send_unwrap(&handler, mcp_request(1, "tools/list", json!({}))).await;

    let names: Vec<&str> = resp["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        ["run_mirtargetlink", "fetch_network_export", "get_breadcrumbs", "ping"]
    );

    let run = &resp["result"]["tools"][0]["inputSchema"];
    assert_eq!(run["required"], json!(["query"]));
    assert_eq!(
        run["properties"]["mode"]["enum"],
        json!(["validated", "predicted", "network"])
    );
}

#[tokio::test]
async fn test_07_ping_tool() {
    let (handler, _) = handler(site(3));
    let resp = send_unwrap(&handler, tool_call(1, "ping", json!({}))).await;
    assert_eq!(resp["result"]["content"][0]["text"], "pong: hello");

    let resp = send_unwrap(&handler, tool_call(2, "ping", json!({ "msg": "mirna" }))).await;
    assert_eq!(resp["result"]["content"][0]["text"], "pong: mirna");

    let resp = send_unwrap(&handler, tool_call(3, "ping", json!({ "msg": 42 }))).await;
    assert_eq!(resp["error"]["code"], -32602);
}

// ═══════════════════════════════════════════════════════
// LOOKUPS
// ═══════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_08_lookup_defaults_to_validated() {
    let (handler, factory) = handler(site(14));
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(&handler, tool_call(1, "run_mirtargetlink", json!({ "query": "TP53" }))).await;
    assert!(!is_tool_error(&resp), "unexpected failure: {resp}");

    let result = tool_payload(&resp);
    assert_eq!(result["success"], true);
    assert_eq!(result["query"], "TP53");
    assert_eq!(result["mode"], "validated");
    assert_eq!(
        result["message"],
        "miRTargetLink 2.0 analysis completed successfully for 'TP53' in mode 'validated'."
    );
    assert_eq!(result["interactions"].as_array().unwrap().len(), 10);
    assert_eq!(result["interactions"][0]["targetEntity"], "GENE0");
    assert_eq!(result["nodes"][0]["categorySet"], "pathways");
    assert_eq!(factory.opens(), 1);
    assert_eq!(factory.closes(), 1);
}

#[tokio::test]
async fn test_09_empty_query_never_opens_a_session() {
    let (handler, factory) = handler(site(3));
    send_unwrap(&handler, init_request()).await;

    for args in [json!({ "query": "" }), json!({ "query": "   ", "mode": "predicted" }), json!({})] {
        let resp = send_unwrap(&handler, tool_call(1, "run_mirtargetlink", args)).await;
        assert!(is_tool_error(&resp));
        let envelope = tool_payload(&resp);
        assert_eq!(envelope["success"], false);
        assert_eq!(envelope["kind"], "validation_error");
    }
    assert_eq!(factory.opens(), 0);
}

#[tokio::test]
async fn test_10_unknown_mode_is_validation_error() {
    let (handler, factory) = handler(site(3));
    let resp = send_unwrap(
        &handler,
        tool_call(1, "run_mirtargetlink", json!({ "query": "TP53", "mode": "strong" })),
    )
    .await;

    let envelope = tool_payload(&resp);
    assert_eq!(envelope["kind"], "validation_error");
    assert_eq!(envelope["mode"], "strong");
    assert!(envelope["message"].as_str().unwrap().contains("Unknown mode"));
    assert_eq!(factory.opens(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_11_results_page_timeout_is_structured() {
    let (handler, factory) = handler(site(3).redirect_to(None));
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(
        &handler,
        tool_call(1, "run_mirtargetlink", json!({ "query": "hsa-miR-21-5p" })),
    )
    .await;

    assert!(is_tool_error(&resp));
    let envelope = tool_payload(&resp);
    assert_eq!(envelope["kind"], "navigation_timeout");
    assert_eq!(envelope["query"], "hsa-miR-21-5p");
    assert_eq!(envelope["mode"], "validated");
    assert!(envelope.get("interactions").is_none());
    assert_eq!(factory.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_12_predicted_mode_with_no_rows() {
    let page = site(0).reload_timeline(
        INTERACTIONS,
        vec![
            (Duration::from_millis(400), TableFrame::loading()),
            (Duration::from_secs(4), TableFrame::empty()),
        ],
    );
    let (handler, factory) = handler(page);

    let resp = send_unwrap(
        &handler,
        tool_call(1, "run_mirtargetlink", json!({ "query": "hsa-miR-9500", "mode": "predicted" })),
    )
    .await;

    assert!(!is_tool_error(&resp));
    let result = tool_payload(&resp);
    assert_eq!(result["success"], true);
    assert_eq!(result["interactions"], json!([]));
    assert!(result["message"]
        .as_str()
        .unwrap()
        .contains("No interaction data available"));
    assert_eq!(factory.closes(), 1);
}

#[tokio::test]
async fn test_13_browser_launch_failure() {
    let factory = Arc::new(ScriptedFactory::failing());
    let orchestrator = QueryOrchestrator::new(EngineConfig::default(), factory.clone());
    let handler = ProtocolHandler::new(Arc::new(Mutex::new(LookupSessionManager::new(orchestrator))));

    let resp = send_unwrap(&handler, tool_call(1, "run_mirtargetlink", json!({ "query": "TP53" }))).await;
    assert!(resp.get("error").is_none(), "engine failures stay in-band: {resp}");
    assert!(is_tool_error(&resp));
    assert_eq!(tool_payload(&resp)["kind"], "session_failure");
    assert_eq!(factory.closes(), 0);
}

#[tokio::test]
async fn test_14_network_export_upstream_unavailable() {
    let mut config = EngineConfig::default();
    config.export = ExportOptions {
        url_template: "http://127.0.0.1:9/api/network/?query={query}".to_string(),
        timeout_ms: 1_000,
    };
    let (handler, factory) = handler_with(config, site(3));

    let resp = send_unwrap(&handler, tool_call(1, "fetch_network_export", json!({ "query": "TP53" }))).await;
    assert!(is_tool_error(&resp));
    assert_eq!(tool_payload(&resp)["kind"], "upstream_unavailable");

    let resp = send_unwrap(&handler, tool_call(2, "fetch_network_export", json!({ "query": "" }))).await;
    assert_eq!(tool_payload(&resp)["kind"], "validation_error");
    assert_eq!(factory.opens(), 0);
}

// ═══════════════════════════════════════════════════════
// BREADCRUMBS & RESOURCES
// ═══════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_15_breadcrumbs_follow_session_lifecycle() {
    let (handler, _) = handler(site(2));

    // Before initialize: served, not recorded.
    send_unwrap(&handler, tool_call(1, "run_mirtargetlink", json!({ "query": "" }))).await;
    let resp = send_unwrap(&handler, tool_call(2, "get_breadcrumbs", json!({}))).await;
    assert_eq!(tool_payload(&resp), json!([]));

    send_unwrap(&handler, init_request()).await;
    send_unwrap(&handler, tool_call(3, "run_mirtargetlink", json!({ "query": "TP53" }))).await;
    send_unwrap(&handler, tool_call(4, "ping", json!({}))).await;
    send_unwrap(&handler, tool_call(5, "run_mirtargetlink", json!({ "query": "" }))).await;

    let resp = send_unwrap(&handler, tool_call(6, "get_breadcrumbs", json!({}))).await;
    let crumbs = tool_payload(&resp);
    let crumbs = crumbs.as_array().unwrap();
    assert_eq!(crumbs.len(), 2);
    assert_eq!(crumbs[0]["tool"], "run_mirtargetlink");
    assert_eq!(crumbs[0]["input"]["query"], "TP53");
    assert_eq!(crumbs[0]["output"]["success"], true);
    assert_eq!(crumbs[1]["output"]["kind"], "validation_error");
    assert!(crumbs[0]["time"].as_str().unwrap().contains('T'));

    send_unwrap(&handler, mcp_request(7, "shutdown", json!({}))).await;
    let resp = send_unwrap(&handler, tool_call(8, "get_breadcrumbs", json!({}))).await;
    assert_eq!(tool_payload(&resp), json!([]));
}

#[tokio::test]
async fn test_16_reinitialize_starts_fresh_log() {
    let (handler, _) = handler(site(2));
    send_unwrap(&handler, init_request()).await;
    send_unwrap(&handler, tool_call(1, "fetch_network_export", json!({ "query": "" }))).await;
    assert_eq!(handler.session().lock().await.breadcrumbs().len(), 1);

    let first = handler.session().lock().await.current_session_id().map(str::to_string);
    send_unwrap(&handler, init_request()).await;
    let second = handler.session().lock().await.current_session_id().map(str::to_string);

    assert_ne!(first, second);
    assert!(handler.session().lock().await.breadcrumbs().is_empty());
}

#[tokio::test]
async fn test_17_resources() {
    let (handler, _) = handler(site(2));
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(&handler, mcp_request(1, "resources/list", json!({}))).await;
    let uris: Vec<&str> = resp["result"]["resources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["uri"].as_str().unwrap())
        .collect();
    assert_eq!(uris, ["mirtl://modes", "mirtl://breadcrumbs"]);

    let resp = send_unwrap(
        &handler,
        mcp_request(2, "resources/read", json!({ "uri": "mirtl://modes" })),
    )
    .await;
    let text = resp["result"]["contents"][0]["text"].as_str().unwrap();
    let modes: Value = serde_json::from_str(text).unwrap();
    assert_eq!(modes[0]["mode"], "validated");
    assert_eq!(modes[0]["default"], true);
    assert_eq!(modes[1]["settings"][2]["control"], "predicted-evidence");
    assert_eq!(modes[1]["settings"][2]["value"], true);
    assert_eq!(modes[2]["settings"][5]["value"], "euler");

    let resp = send_unwrap(
        &handler,
        mcp_request(3, "resources/read", json!({ "uri": "mirtl://breadcrumbs" })),
    )
    .await;
    let text = resp["result"]["contents"][0]["text"].as_str().unwrap();
    let log: Value = serde_json::from_str(text).unwrap();
    assert!(log["session"].is_string());
    assert_eq!(log["breadcrumbs"], json!([]));

    let resp = send_unwrap(
        &handler,
        mcp_request(4, "resources/read", json!({ "uri": "mirtl://stats" })),
    )
    .await;
    assert_eq!(resp["error"]["code"], -32802);
}

#[tokio::test]
async fn test_18_missing_params() {
    let (handler, _) = handler(site(2));
    let resp = send_unwrap(&handler, json!({ "jsonrpc": "2.0", "id": 9, "method": "tools/call" })).await;
    assert_eq!(resp["error"]["code"], -32602);

    let resp = send_unwrap(&handler, json!({ "jsonrpc": "2.0", "id": 10, "method": "initialize" })).await;
    assert_eq!(resp["error"]["code"], -32602);
}
