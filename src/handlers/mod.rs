//! Tool handlers.
//!
//! Each handler reads an `action` plus optional fields from the tool
//! arguments, calls the Ad Manager client and returns a JSON envelope:
//!
//! ```text
//! {"success": true,  "action": ..., <payload>}
//! {"success": false, "error": ..., "detail"?: ...}
//! ```
//!
//! Errors never escape a handler; they are folded into the failure envelope.

mod creatives;
mod help;
mod inventory;
mod line_items;
mod networks;
mod orders;
mod reports;

use serde_json::{json, Map, Value};

use crate::admanager::AdManagerApi;
use crate::error::{ClientError, ToolError};

/// The tools this server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    ManageNetworks,
    ManageInventory,
    ManageOrders,
    ManageLineItems,
    ManageCreatives,
    GenerateReport,
    GetHelp,
}

impl Tool {
    /// All tools, in catalog order.
    pub const ALL: [Self; 7] = [
        Self::ManageNetworks,
        Self::ManageInventory,
        Self::ManageOrders,
        Self::ManageLineItems,
        Self::ManageCreatives,
        Self::GenerateReport,
        Self::GetHelp,
    ];

    /// Looks up a tool by its wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    /// The wire name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ManageNetworks => "manage_networks",
            Self::ManageInventory => "manage_inventory",
            Self::ManageOrders => "manage_orders",
            Self::ManageLineItems => "manage_line_items",
            Self::ManageCreatives => "manage_creatives",
            Self::GenerateReport => "generate_report",
            Self::GetHelp => "get_help",
        }
    }

    /// One-line summary shown by `get_help`.
    #[must_use]
    pub const fn summary(self) -> &'static str {
        match self {
            Self::ManageNetworks => "Networks: current network, list all networks",
            Self::ManageInventory => "Inventory: list, get and create ad units",
            Self::ManageOrders => "Orders: list, get and create orders",
            Self::ManageLineItems => "Line items: list, get and create line items",
            Self::ManageCreatives => "Creatives: list and get creatives",
            Self::GenerateReport => "Reports: submit report jobs by report type",
            Self::GetHelp => "Help and usage information",
        }
    }
}

/// Runs `tool` and returns its envelope.
///
/// `client` is the outcome of client construction at startup; when it failed,
/// every tool except `get_help` reports that failure.
pub async fn call_tool(
    tool: Tool,
    arguments: &Value,
    client: Result<&dyn AdManagerApi, &ClientError>,
) -> Value {
    tracing::debug!(tool = tool.name(), "Calling tool");

    let outcome = match (tool, client) {
        (Tool::GetHelp, client) => Ok(help::describe(client.map(|api| api.kind()))),
        (_, Err(e)) => Err(ToolError::ClientUnavailable(e.to_string())),
        (Tool::ManageNetworks, Ok(api)) => networks::handle(api, arguments).await,
        (Tool::ManageInventory, Ok(api)) => inventory::handle(api, arguments).await,
        (Tool::ManageOrders, Ok(api)) => orders::handle(api, arguments).await,
        (Tool::ManageLineItems, Ok(api)) => line_items::handle(api, arguments).await,
        (Tool::ManageCreatives, Ok(api)) => creatives::handle(api, arguments).await,
        (Tool::GenerateReport, Ok(api)) => reports::handle(api, arguments).await,
    };

    outcome.unwrap_or_else(|e| {
        tracing::warn!(tool = tool.name(), error = %e, detail = ?e.detail(), "Tool call failed");
        failure(&e)
    })
}

/// Envelope for an unknown tool name.
#[must_use]
pub fn unknown_tool(name: &str) -> Value {
    json!({
        "success": false,
        "error": format!("Unknown tool: {name}"),
    })
}

/// Builds a success envelope from an object payload.
fn success(action: &str, payload: Value) -> Value {
    let mut envelope = Map::new();
    envelope.insert("success".to_string(), Value::Bool(true));
    envelope.insert("action".to_string(), Value::String(action.to_string()));
    if let Value::Object(fields) = payload {
        envelope.extend(fields);
    }
    Value::Object(envelope)
}

/// Builds a failure envelope.
fn failure(error: &ToolError) -> Value {
    let mut envelope = json!({
        "success": false,
        "error": error.to_string(),
    });
    if let Some(detail) = error.detail() {
        envelope["detail"] = Value::String(detail);
    }
    envelope
}

/// The requested action, or `default` when none is given.
fn action<'a>(arguments: &'a Value, default: &'a str) -> Result<&'a str, ToolError> {
    match arguments.get("action") {
        None | Some(Value::Null) => Ok(default),
        Some(Value::String(action)) => Ok(action.as_str()),
        Some(other) => Err(ToolError::UnsupportedAction(other.to_string())),
    }
}

/// An optional string argument. Numbers are accepted for ids; blank strings
/// count as absent.
fn string_arg(arguments: &Value, key: &str) -> Option<String> {
    match arguments.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_arg(arguments: &Value, key: &'static str) -> Result<String, ToolError> {
    string_arg(arguments, key).ok_or(ToolError::MissingArgument(key))
}
