//! MCP server implementation.
//!
//! The server handles the MCP protocol lifecycle:
//! 1. Initialize - exchange capabilities
//! 2. Handle tool calls - one at a time, each run to completion
//! 3. Shutdown - when the client closes stdin

use std::sync::Arc;

use azdo_core::Connector;
use serde_json::Value;

use crate::handlers::ToolHandler;
use crate::protocol::{
    InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId,
    ServerCapabilities, ServerInfo, ToolCallParams, ToolsCapability, ToolsListResult, MCP_VERSION,
};
use crate::transport::{IncomingMessage, StdioTransport};

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "azdo-mcp";

/// MCP server for Azure DevOps pull request tools.
pub struct McpServer {
    handler: ToolHandler,
    initialized: bool,
}

impl McpServer {
    /// Create a server whose tool calls connect through `connector`.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            handler: ToolHandler::new(connector),
            initialized: false,
        }
    }

    /// Run the MCP server on stdin/stdout.
    pub async fn run(&mut self) -> azdo_core::Result<()> {
        let mut transport = StdioTransport::stdio();
        self.serve(&mut transport).await
    }

    /// Serve messages from `transport` until the client disconnects.
    pub async fn serve(&mut self, transport: &mut StdioTransport) -> azdo_core::Result<()> {
        tracing::info!(
            "Starting MCP server with {} tools",
            self.handler.available_tools().len()
        );

        loop {
            match transport.read_message() {
                Ok(Some(msg)) => {
                    if let Some(resp) = self.handle_message(msg).await {
                        if let Err(e) = transport.write_response(&resp) {
                            tracing::error!("Failed to write response: {}", e);
                            break;
                        }
                    }
                }
                Ok(None) => {
                    tracing::info!("EOF received, shutting down");
                    break;
                }
                Err(e) => {
                    tracing::error!("Transport error: {}", e);
                    let error_resp = JsonRpcResponse::error(
                        RequestId::Null,
                        JsonRpcError::parse_error(&e.to_string()),
                    );
                    if let Err(e) = transport.write_response(&error_resp) {
                        tracing::error!("Failed to write response: {}", e);
                        break;
                    }
                }
            }
        }

        tracing::info!("MCP server stopped");
        Ok(())
    }

    /// Handle an incoming message.
    async fn handle_message(&mut self, msg: IncomingMessage) -> Option<JsonRpcResponse> {
        match msg {
            IncomingMessage::Request(req) => Some(self.handle_request(req).await),
            IncomingMessage::Notification(notif) => {
                self.handle_notification(&notif.method);
                None
            }
        }
    }

    /// Handle a JSON-RPC request.
    async fn handle_request(&mut self, req: JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!("Handling request: {} (id: {:?})", req.method, req.id);

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req.id, req.params),
            "tools/list" => self.handle_tools_list(req.id),
            "tools/call" => self.handle_tools_call(req.id, req.params).await,
            "ping" => JsonRpcResponse::success(req.id, serde_json::json!({})),
            method => {
                tracing::warn!("Unknown method: {}", method);
                JsonRpcResponse::error(req.id, JsonRpcError::method_not_found(method))
            }
        }
    }

    /// Handle notifications (no response).
    fn handle_notification(&mut self, method: &str) {
        match method {
            "initialized" | "notifications/initialized" => {
                tracing::info!("Client initialized");
            }
            "notifications/cancelled" => {
                tracing::debug!("Request cancelled by client");
            }
            _ => {
                tracing::debug!("Ignoring notification: {}", method);
            }
        }
    }

    fn handle_initialize(&mut self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        if self.initialized {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("Server already initialized"),
            );
        }

        if let Some(params) = params {
            match serde_json::from_value::<InitializeParams>(params) {
                Ok(init_params) => {
                    tracing::info!(
                        "Client: {} v{} (protocol: {})",
                        init_params.client_info.name,
                        init_params.client_info.version,
                        init_params.protocol_version
                    );
                }
                Err(e) => {
                    tracing::warn!("Failed to parse initialize params: {}", e);
                }
            }
        }

        self.initialized = true;

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        JsonRpcResponse::from_result(id, &result)
    }

    fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: self.handler.available_tools(),
        };
        JsonRpcResponse::from_result(id, &result)
    }

    /// Tool failures come back as a successful response carrying an error
    /// result; only malformed `tools/call` params are JSON-RPC errors.
    async fn handle_tools_call(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(&e.to_string()),
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params"));
            }
        };

        tracing::info!("Calling tool: {}", params.name);

        let result = self.handler.execute(&params.name, params.arguments).await;
        JsonRpcResponse::from_result(id, &result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockApi, StaticConnector};
    use crate::protocol::{ToolCallResult, JSONRPC_VERSION};
    use crate::transport::tests::SharedBuffer;
    use azdo_core::GitPullRequest;
    use serde_json::json;
    use std::io::Cursor;

    fn server_with(api: MockApi) -> McpServer {
        McpServer::new(Arc::new(StaticConnector::new(api)))
    }

    fn request(id: i64, method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: RequestId::Number(id),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn test_initialize_once() {
        let mut server = server_with(MockApi::new());

        let resp = server
            .handle_request(request(
                1,
                "initialize",
                Some(json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "1.0.0"}
                })),
            ))
            .await;
        let result = resp.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert!(server.initialized);

        let again = server.handle_request(request(2, "initialize", None)).await;
        assert_eq!(again.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_tools_list() {
        let mut server = server_with(MockApi::new());
        let resp = server.handle_request(request(1, "tools/list", None)).await;

        let result: ToolsListResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.tools.len(), 8);
        assert!(result.tools.iter().any(|t| t.name == "list_pr_comments"));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let mut server = server_with(MockApi::new());
        let resp = server.handle_request(request(1, "resources/list", None)).await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_call_missing_params() {
        let mut server = server_with(MockApi::new());
        let resp = server.handle_request(request(1, "tools/call", None)).await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tool_failure_is_not_a_jsonrpc_error() {
        let mut server = McpServer::new(Arc::new(StaticConnector::failing()));
        let resp = server
            .handle_request(request(
                7,
                "tools/call",
                Some(json!({"name": "get_pull_request", "arguments": {}})),
            ))
            .await;

        assert!(resp.error.is_none());
        let result: ToolCallResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(result
            .first_text()
            .unwrap()
            .starts_with("Authentication Failed: "));
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let mut server = server_with(MockApi::new());
        let msg = IncomingMessage::Notification(crate::protocol::JsonRpcNotification {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: "notifications/initialized".to_string(),
            params: None,
        });
        assert!(server.handle_message(msg).await.is_none());
    }

    #[tokio::test]
    async fn test_serve_session() {
        let mut api = MockApi::new();
        api.expect_get_pull_request().returning(|_, _, id| {
            Ok(Some(GitPullRequest {
                pull_request_id: Some(id),
                ..Default::default()
            }))
        });
        let mut server = server_with(api);

        let input = [
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "it", "version": "0"}
            }}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {
                "name": "get_pull_request",
                "arguments": {"repositoryId": "repo", "pullRequestId": 5, "projectId": "proj"}
            }}),
        ]
        .iter()
        .map(|v| v.to_string() + "\n")
        .collect::<String>()
            + "garbage\n";

        let output = SharedBuffer::default();
        let mut transport =
            StdioTransport::new(Box::new(Cursor::new(input)), Box::new(output.clone()));
        server.serve(&mut transport).await.unwrap();

        let responses: Vec<JsonRpcResponse> = output
            .contents()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].id, RequestId::Number(1));

        let call: ToolCallResult =
            serde_json::from_value(responses[1].result.clone().unwrap()).unwrap();
        assert!(call.is_error.is_none());
        let pr: Value = serde_json::from_str(call.first_text().unwrap()).unwrap();
        assert_eq!(pr["pullRequestId"], 5);

        assert_eq!(responses[2].id, RequestId::Null);
        assert_eq!(
            responses[2].error.as_ref().unwrap().code,
            JsonRpcError::PARSE_ERROR
        );
    }
}
