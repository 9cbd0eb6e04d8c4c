//! JSON-RPC 2.0 message types for MCP protocol.
//!
//! Parsing is lenient: the `jsonrpc` field is optional and the request id may
//! be any JSON value. The id is echoed back verbatim, or as `null` when the
//! request had none.
//!
//! # Message Types
//!
//! - **Request**: anything with a method that is not a notification
//! - **Notification**: no `id` and a method under `notifications/`; no
//!   response is sent

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MessageError;

/// The MCP protocol version this implementation supports.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name for capability negotiation.
pub const SERVER_NAME: &str = "admanager-mcp";

/// Prefix of notification methods.
const NOTIFICATION_PREFIX: &str = "notifications/";

/// An incoming JSON-RPC message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol marker; accepted but not required.
    #[serde(default)]
    pub jsonrpc: Option<Value>,

    /// Request identifier; `None` when absent or `null`.
    #[serde(default)]
    pub id: Option<Value>,

    /// The method to invoke. Non-string values are kept for error messages.
    #[serde(default)]
    pub method: Value,

    /// Optional parameters for the method.
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// The method name, or its JSON rendering if it is not a string.
    #[must_use]
    pub fn method_name(&self) -> String {
        match &self.method {
            Value::String(method) => method.clone(),
            other => other.to_string(),
        }
    }

    /// The id to echo back.
    #[must_use]
    pub fn response_id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }
}

/// A parsed input line.
#[derive(Debug, Clone)]
pub enum IncomingMessage {
    /// A request expecting a response.
    Request(JsonRpcRequest),
    /// A notification (no response expected).
    Notification(JsonRpcRequest),
}

/// Parses one input line.
///
/// # Errors
///
/// Returns an error if the line is not JSON or not a JSON object. Such lines
/// are dropped without a response.
pub fn parse_message(line: &str) -> Result<IncomingMessage, MessageError> {
    let value: Value = serde_json::from_str(line)?;
    if !value.is_object() {
        return Err(MessageError::NotAnObject);
    }

    let request: JsonRpcRequest = serde_json::from_value(value)?;
    let is_notification = request.id.is_none()
        && request
            .method
            .as_str()
            .is_some_and(|m| m.starts_with(NOTIFICATION_PREFIX));

    if is_notification {
        Ok(IncomingMessage::Notification(request))
    } else {
        Ok(IncomingMessage::Request(request))
    }
}

/// A successful JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this response corresponds to.
    pub id: Value,

    /// The result of the method call.
    pub result: Value,
}

impl JsonRpcResponse {
    /// Creates a new success response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Value is not const-compatible
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result,
        }
    }
}

/// Standard JSON-RPC 2.0 error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Internal JSON-RPC error.
    InternalError,
}

impl ErrorCode {
    /// Returns the numeric code for this error.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::InternalError => -32603,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorData {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,
}

impl JsonRpcErrorData {
    /// Creates a new error with a custom message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
        }
    }
}

/// A JSON-RPC 2.0 error response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this error corresponds to (`null` if unknown).
    pub id: Value,

    /// The error details.
    pub error: JsonRpcErrorData,
}

impl JsonRpcError {
    /// Creates a new error response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // JsonRpcErrorData contains String
    pub fn new(id: Value, error: JsonRpcErrorData) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            error,
        }
    }

    /// Creates an internal error response.
    #[must_use]
    pub fn internal_error(id: Value, message: impl Into<String>) -> Self {
        Self::new(
            id,
            JsonRpcErrorData::with_message(ErrorCode::InternalError, message),
        )
    }
}

/// A message written to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    /// A success response.
    Response(JsonRpcResponse),
    /// An error response.
    Error(JsonRpcError),
}

impl From<JsonRpcResponse> for OutgoingMessage {
    fn from(response: JsonRpcResponse) -> Self {
        Self::Response(response)
    }
}

impl From<JsonRpcError> for OutgoingMessage {
    fn from(error: JsonRpcError) -> Self {
        Self::Error(error)
    }
}
