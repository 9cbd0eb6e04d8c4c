//! `manage_inventory`: ad units.

use chrono::Local;
use serde_json::{json, Value};

use super::{action, required_arg, string_arg, success};
use crate::admanager::model::NewAdUnit;
use crate::admanager::AdManagerApi;
use crate::error::ToolError;

pub(super) async fn handle(api: &dyn AdManagerApi, arguments: &Value) -> Result<Value, ToolError> {
    match action(arguments, "list")? {
        "list" => {
            let parent_id = string_arg(arguments, "parent_id");
            let ad_units = api.list_ad_units(parent_id.as_deref()).await?;
            Ok(success(
                "list",
                json!({ "total": ad_units.len(), "ad_units": ad_units }),
            ))
        }
        "get" => {
            let id = required_arg(arguments, "ad_unit_id")?;
            let ad_unit = api.get_ad_unit(&id).await?;
            Ok(success("get", json!({ "ad_unit": ad_unit })))
        }
        "create" => {
            let new_ad_unit = NewAdUnit {
                name: required_arg(arguments, "ad_unit_name")?,
                parent_id: string_arg(arguments, "parent_id"),
                description: format!(
                    "Created via admanager-mcp at {}",
                    Local::now().format("%Y-%m-%d %H:%M:%S")
                ),
            };
            let ad_unit = api.create_ad_unit(&new_ad_unit).await?;
            tracing::info!(id = ad_unit.id.as_deref().unwrap_or("unknown"), "Created ad unit");
            Ok(success("create", json!({ "ad_unit": ad_unit })))
        }
        other => Err(ToolError::UnsupportedAction(other.to_string())),
    }
}
