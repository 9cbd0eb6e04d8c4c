//! `manage_line_items`.

use serde_json::{json, Value};

use super::{action, required_arg, string_arg, success};
use crate::admanager::model::NewLineItem;
use crate::admanager::AdManagerApi;
use crate::error::ToolError;

pub(super) async fn handle(api: &dyn AdManagerApi, arguments: &Value) -> Result<Value, ToolError> {
    match action(arguments, "list")? {
        "list" => {
            let order_id = string_arg(arguments, "order_id");
            let line_items = api.list_line_items(order_id.as_deref()).await?;
            Ok(success(
                "list",
                json!({ "total": line_items.len(), "line_items": line_items }),
            ))
        }
        "get" => {
            let id = required_arg(arguments, "line_item_id")?;
            let line_item = api.get_line_item(&id).await?;
            Ok(success("get", json!({ "line_item": line_item })))
        }
        "create" => {
            let new_line_item = NewLineItem {
                name: required_arg(arguments, "line_item_name")?,
                order_id: string_arg(arguments, "order_id"),
            };
            let line_item = api.create_line_item(&new_line_item).await?;
            tracing::info!(
                id = line_item.id.as_deref().unwrap_or("unknown"),
                "Created line item"
            );
            Ok(success("create", json!({ "line_item": line_item })))
        }
        other => Err(ToolError::UnsupportedAction(other.to_string())),
    }
}
