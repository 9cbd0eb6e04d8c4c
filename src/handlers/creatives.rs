//! `manage_creatives`.

use serde_json::{json, Value};

use super::{action, required_arg, success};
use crate::admanager::AdManagerApi;
use crate::error::ToolError;

pub(super) async fn handle(api: &dyn AdManagerApi, arguments: &Value) -> Result<Value, ToolError> {
    match action(arguments, "list")? {
        "list" => {
            let creatives = api.list_creatives().await?;
            Ok(success(
                "list",
                json!({ "total": creatives.len(), "creatives": creatives }),
            ))
        }
        "get" => {
            let id = required_arg(arguments, "creative_id")?;
            let creative = api.get_creative(&id).await?;
            Ok(success("get", json!({ "creative": creative })))
        }
        other => Err(ToolError::UnsupportedAction(other.to_string())),
    }
}
