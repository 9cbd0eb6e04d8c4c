//! `get_help`.

use chrono::Local;
use serde_json::{json, Value};

use super::Tool;
use crate::admanager::ClientKind;
use crate::auth::ENV_APPLICATION_CREDENTIALS;
use crate::config::{ENV_CLIENT, ENV_CREDENTIALS_PATH, ENV_NETWORK_CODE};
use crate::error::ClientError;
use crate::mcp::protocol::SERVER_NAME;

/// Builds the help envelope. `client` reports how startup went.
pub(super) fn describe(client: Result<ClientKind, &ClientError>) -> Value {
    let tools: Vec<Value> = Tool::ALL
        .iter()
        .map(|tool| json!({ "name": tool.name(), "description": tool.summary() }))
        .collect();

    let client = match client {
        Ok(kind) => json!({ "status": "ready", "kind": kind.as_str() }),
        Err(e) => json!({ "status": "unavailable", "error": e.to_string() }),
    };

    json!({
        "success": true,
        "action": "get_help",
        "message": "Ad Manager MCP server help",
        "server": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "total_functions": tools.len(),
        "tools": tools,
        "environment_variables": {
            ENV_NETWORK_CODE: "Ad Manager network code (required by the legacy client)",
            ENV_CREDENTIALS_PATH: "Path to a service-account key file (optional)",
            ENV_CLIENT: "Client preference: auto, rest or legacy (optional)",
            "RUST_LOG": "Additional tracing filter directives (optional)",
        },
        "authentication": {
            "method": format!("Service-account key file named by {ENV_CREDENTIALS_PATH}"),
            "environment_variable": ENV_CREDENTIALS_PATH,
            "example": format!("export {ENV_CREDENTIALS_PATH}=/path/to/service-account.json"),
            "fallback": format!(
                "Application default credentials: {ENV_APPLICATION_CREDENTIALS}, \
                 then the gcloud application_default_credentials.json, then the metadata server"
            ),
        },
        "client": client,
        "timestamp": Local::now().to_rfc3339(),
    })
}
