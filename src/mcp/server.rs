//! MCP server implementation for Google Ad Manager.
//!
//! This module implements the request loop:
//!
//! 1. **Idle**: waiting for the next input line
//! 2. **Processing**: one line is parsed, dispatched and answered
//! 3. **Terminated**: EOF or a shutdown signal was received
//!
//! Exactly one request is in flight at a time. Lines that are not JSON
//! objects are dropped, notifications are acknowledged silently, and every
//! other message gets exactly one response line.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::admanager::AdManagerApi;
use crate::error::ClientError;
use crate::handlers::{self, Tool};
use crate::mcp::protocol::{
    parse_message, IncomingMessage, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    OutgoingMessage, MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use crate::mcp::tools;
use crate::mcp::transport::{StdioTransport, Transport};

/// Server state in the request loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for input.
    Idle,
    /// Handling a line.
    Processing,
    /// Input ended or a shutdown signal arrived.
    Terminated,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolCapabilities>,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: Some(ToolCapabilities::default()),
        }
    }
}

/// Tool-specific capabilities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change during the session.
    #[serde(rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool, so we must take &bool here
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Wraps a handler envelope. `isError` mirrors `success: false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope cannot be rendered as JSON.
    pub fn from_envelope(envelope: &Value) -> serde_json::Result<Self> {
        let is_error = envelope.get("success").and_then(Value::as_bool) == Some(false);
        Ok(Self {
            content: vec![ToolContent::Text {
                text: serde_json::to_string_pretty(envelope)?,
            }],
            is_error,
        })
    }
}

/// The MCP server for Google Ad Manager.
pub struct McpServer {
    /// Current server state.
    state: ServerState,
    /// The client built at startup, or why it could not be built.
    client: Result<Box<dyn AdManagerApi>, ClientError>,
}

impl McpServer {
    /// Creates a server around the startup outcome of the Ad Manager client.
    #[must_use]
    pub fn new(client: Result<Box<dyn AdManagerApi>, ClientError>) -> Self {
        Self {
            state: ServerState::Idle,
            client,
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Runs the server over stdio until EOF or a shutdown signal.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> std::io::Result<()> {
        let mut transport = StdioTransport::stdio();
        self.run_with_shutdown(&mut transport).await
    }

    /// Serves `transport` until its input ends.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn serve<R, W>(&mut self, transport: &mut Transport<R, W>) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let line_result = transport.read_line().await;
            if self.handle_transport_result(transport, line_result).await? {
                return Ok(());
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown(&mut self, transport: &mut StdioTransport) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(std::io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(std::io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                    self.state = ServerState::Terminated;
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    self.state = ServerState::Terminated;
                    return Ok(());
                }

                line_result = transport.read_line() => {
                    if self.handle_transport_result(transport, line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown(&mut self, transport: &mut StdioTransport) -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                    self.state = ServerState::Terminated;
                    return Ok(());
                }

                line_result = transport.read_line() => {
                    if self.handle_transport_result(transport, line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result<R, W>(
        &mut self,
        transport: &mut Transport<R, W>,
        line_result: std::io::Result<Option<String>>,
    ) -> std::io::Result<bool>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let Some(line) = line_result? else {
            tracing::info!("Input closed, shutting down");
            self.state = ServerState::Terminated;
            return Ok(true);
        };

        if line.trim().is_empty() {
            return Ok(false);
        }

        self.state = ServerState::Processing;
        let outcome = match self.handle_line(&line).await {
            Some(message) => transport.write_message(&message).await,
            None => Ok(()),
        };
        if let Err(e) = outcome {
            tracing::error!(error = %e, "Failed to write response");
            self.state = ServerState::Terminated;
            return Err(e);
        }
        self.state = ServerState::Idle;

        Ok(false)
    }

    /// Handles a single line of input and returns the response to send, if
    /// any.
    pub async fn handle_line(&self, line: &str) -> Option<OutgoingMessage> {
        match parse_message(line) {
            Ok(IncomingMessage::Request(req)) => Some(self.handle_request(&req).await),
            Ok(IncomingMessage::Notification(notif)) => {
                tracing::debug!(method = %notif.method_name(), "Notification received");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "Discarding unparseable input line");
                None
            }
        }
    }

    /// Handles an incoming request.
    async fn handle_request(&self, req: &JsonRpcRequest) -> OutgoingMessage {
        let method = req.method_name();
        tracing::debug!(method = %method, id = %req.response_id(), "Request received");

        let response = match method.as_str() {
            "initialize" => Ok(Self::handle_initialize(req)),
            "tools/list" => Ok(Self::handle_tools_list(req)),
            "tools/call" => self.handle_tools_call(req).await,
            "ping" => Ok(JsonRpcResponse::success(req.response_id(), json!({}))),
            _ => {
                tracing::debug!(method = %method, "Unknown method");
                Ok(JsonRpcResponse::success(
                    req.response_id(),
                    json!({ "error": format!("Unknown method: {method}") }),
                ))
            }
        };

        match response {
            Ok(resp) => resp.into(),
            Err(error) => error.into(),
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(req: &JsonRpcRequest) -> JsonRpcResponse {
        let result = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::default(),
        });

        JsonRpcResponse::success(req.response_id(), result)
    }

    /// Handles the tools/list request.
    fn handle_tools_list(req: &JsonRpcRequest) -> JsonRpcResponse {
        let result = json!({
            "tools": tools::definitions(),
        });

        JsonRpcResponse::success(req.response_id(), result)
    }

    /// Handles the tools/call request.
    async fn handle_tools_call(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        let id = req.response_id();

        let params: ToolCallParams =
            serde_json::from_value(req.params.clone().unwrap_or(Value::Null)).map_err(|e| {
                tracing::debug!(error = %e, "Invalid tool call params");
                JsonRpcError::internal_error(id.clone(), format!("Invalid tool call params: {e}"))
            })?;

        let arguments = if params.arguments.is_null() {
            json!({})
        } else {
            params.arguments
        };

        let envelope = match Tool::from_name(&params.name) {
            Some(tool) => {
                let client = self.client.as_ref().map(|api| &**api);
                handlers::call_tool(tool, &arguments, client).await
            }
            None => {
                tracing::warn!(tool = %params.name, "Unknown tool");
                handlers::unknown_tool(&params.name)
            }
        };

        let result_value = ToolCallResult::from_envelope(&envelope)
            .and_then(|result| serde_json::to_value(&result))
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to serialise tool call result");
                JsonRpcError::internal_error(
                    id.clone(),
                    "Internal error: failed to serialise result",
                )
            })?;

        Ok(JsonRpcResponse::success(id, result_value))
    }
}
