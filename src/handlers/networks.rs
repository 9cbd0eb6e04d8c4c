//! `manage_networks`.

use serde_json::{json, Value};

use super::{action, success};
use crate::admanager::AdManagerApi;
use crate::error::ToolError;

pub(super) async fn handle(api: &dyn AdManagerApi, arguments: &Value) -> Result<Value, ToolError> {
    match action(arguments, "get_current")? {
        "get_current" => {
            let network = api.current_network().await?;
            Ok(success("get_current", json!({ "network": network })))
        }
        "list_all" => {
            let networks = api.list_networks().await?;
            Ok(success(
                "list_all",
                json!({ "total": networks.len(), "networks": networks }),
            ))
        }
        other => Err(ToolError::UnsupportedAction(other.to_string())),
    }
}
