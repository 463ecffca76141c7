//! Shared helpers for end-to-end tests.
//!
//! The tests run a complete MCP session in-process: requests are fed to
//! [`McpServer`] through an in-memory transport, and the server talks to an
//! `httpmock` server that replays Azure DevOps responses from
//! `tests/fixtures/azure-devops/`.

use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use azdo_api::AzureDevOpsConnector;
use azdo_core::AzureDevOpsConfig;
use azdo_mcp::protocol::{JsonRpcResponse, ToolCallResult};
use azdo_mcp::transport::StdioTransport;
use azdo_mcp::McpServer;
use httpmock::prelude::*;
use serde_json::{json, Value};

pub const TOKEN: &str = "test-token";

/// Organization path on the mock server.
pub const ORG: &str = "/contoso";

/// Load a JSON fixture by file stem.
pub fn fixture(name: &str) -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("azure-devops")
        .join(format!("{}.json", name));
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", path.display(), e));
    serde_json::from_str(&content).unwrap()
}

/// Path of a pull request resource under the mock organization.
pub fn pr_path(project: &str, repository: &str, pull_request_id: i64, tail: &str) -> String {
    format!(
        "{}/{}/_apis/git/repositories/{}/pullRequests/{}{}",
        ORG, project, repository, pull_request_id, tail
    )
}

/// Accept the connection check every tool call performs.
pub fn mock_connection_check(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path(format!("{}/_apis/projects", ORG));
        then.status(200)
            .json_body(json!({"count": 1, "value": [{"name": "web"}]}));
    });
}

#[derive(Clone, Default)]
struct Output(Arc<Mutex<Vec<u8>>>);

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Feed `messages` to a fresh server connected to `server` and collect the
/// responses in order.
pub async fn run_session(server: &MockServer, messages: &[Value]) -> Vec<JsonRpcResponse> {
    let config = AzureDevOpsConfig::new(server.url(ORG)).with_token(TOKEN);
    let mut mcp = McpServer::new(Arc::new(AzureDevOpsConnector::new(config)));

    let input: String = messages.iter().map(|m| format!("{}\n", m)).collect();
    let output = Output::default();
    let mut transport = StdioTransport::new(Box::new(Cursor::new(input)), Box::new(output.clone()));

    mcp.serve(&mut transport).await.unwrap();

    let bytes = output.0.lock().unwrap().clone();
    String::from_utf8(bytes)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

/// `tools/call` request message.
pub fn tool_call(id: i64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    })
}

/// Decode the tool result carried by a response.
pub fn tool_result(response: &JsonRpcResponse) -> ToolCallResult {
    assert!(response.error.is_none(), "unexpected JSON-RPC error");
    serde_json::from_value(response.result.clone().unwrap()).unwrap()
}

/// Text of a tool result.
pub fn result_text(response: &JsonRpcResponse) -> String {
    tool_result(response).first_text().unwrap().to_string()
}
