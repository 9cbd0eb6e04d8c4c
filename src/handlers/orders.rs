//! `manage_orders`.

use serde_json::{json, Value};

use super::{action, required_arg, success};
use crate::admanager::model::NewOrder;
use crate::admanager::AdManagerApi;
use crate::error::ToolError;

pub(super) async fn handle(api: &dyn AdManagerApi, arguments: &Value) -> Result<Value, ToolError> {
    match action(arguments, "list")? {
        "list" => {
            let orders = api.list_orders().await?;
            Ok(success("list", json!({ "total": orders.len(), "orders": orders })))
        }
        "get" => {
            let id = required_arg(arguments, "order_id")?;
            let order = api.get_order(&id).await?;
            Ok(success("get", json!({ "order": order })))
        }
        "create" => {
            let new_order = NewOrder {
                name: required_arg(arguments, "order_name")?,
                advertiser_id: required_arg(arguments, "advertiser_id")?,
            };
            let order = api.create_order(&new_order).await?;
            tracing::info!(id = order.id.as_deref().unwrap_or("unknown"), "Created order");
            Ok(success("create", json!({ "order": order })))
        }
        other => Err(ToolError::UnsupportedAction(other.to_string())),
    }
}
