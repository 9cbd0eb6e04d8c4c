//! Tool catalog for the `tools/list` response.

use serde::Serialize;
use serde_json::{json, Value};

use crate::handlers::Tool;

/// A tool definition for tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

impl ToolDefinition {
    fn new(tool: Tool, description: &str, input_schema: Value) -> Self {
        Self {
            name: tool.name().to_string(),
            description: Some(description.to_string()),
            input_schema,
        }
    }
}

/// Returns the definitions of every tool, in catalog order.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn definitions() -> Vec<ToolDefinition> {
    Tool::ALL
        .into_iter()
        .map(|tool| match tool {
            Tool::ManageNetworks => ToolDefinition::new(
                tool,
                "Manage Ad Manager networks: fetch the current network or list every \
                 network the credentials can access.",
                json!({
                    "type": "object",
                    "properties": {
                        "action": {
                            "type": "string",
                            "enum": ["get_current", "list_all"],
                            "description": "get_current (current network details), list_all (all accessible networks)",
                            "default": "get_current"
                        }
                    },
                    "required": ["action"]
                }),
            ),
            Tool::ManageInventory => ToolDefinition::new(
                tool,
                "Manage Ad Manager inventory. Use action='list' to find ad unit ids, \
                 action='get' with ad_unit_id for details, and action='create' with \
                 ad_unit_name to add an ad unit (parent_id optional).",
                json!({
                    "type": "object",
                    "properties": {
                        "action": {
                            "type": "string",
                            "enum": ["list", "get", "create"],
                            "description": "list (ad units, optionally under parent_id), get (requires ad_unit_id), create (requires ad_unit_name)",
                            "default": "list"
                        },
                        "parent_id": {
                            "type": "string",
                            "description": "Parent ad unit id: filters list, or sets the parent on create"
                        },
                        "ad_unit_id": {
                            "type": "string",
                            "description": "Ad unit id (required for get), as returned by list"
                        },
                        "ad_unit_name": {
                            "type": "string",
                            "description": "Ad unit name (required for create)"
                        }
                    },
                    "required": ["action"]
                }),
            ),
            Tool::ManageOrders => ToolDefinition::new(
                tool,
                "Manage Ad Manager orders: list orders, get order details, create an order.",
                json!({
                    "type": "object",
                    "properties": {
                        "action": {
                            "type": "string",
                            "enum": ["list", "get", "create"],
                            "description": "list (orders), get (requires order_id), create (requires order_name and advertiser_id)",
                            "default": "list"
                        },
                        "order_id": {
                            "type": "string",
                            "description": "Order id (required for get)"
                        },
                        "order_name": {
                            "type": "string",
                            "description": "Order name (required for create)"
                        },
                        "advertiser_id": {
                            "type": "string",
                            "description": "Advertiser company id (required for create)"
                        }
                    },
                    "required": ["action"]
                }),
            ),
            Tool::ManageLineItems => ToolDefinition::new(
                tool,
                "Manage Ad Manager line items: list line items, get line item details, \
                 create a line item.",
                json!({
                    "type": "object",
                    "properties": {
                        "action": {
                            "type": "string",
                            "enum": ["list", "get", "create"],
                            "description": "list (line items, optionally for order_id), get (requires line_item_id), create (requires line_item_name)",
                            "default": "list"
                        },
                        "order_id": {
                            "type": "string",
                            "description": "Order id: filters list, or sets the order on create"
                        },
                        "line_item_id": {
                            "type": "string",
                            "description": "Line item id (required for get)"
                        },
                        "line_item_name": {
                            "type": "string",
                            "description": "Line item name (required for create)"
                        }
                    },
                    "required": ["action"]
                }),
            ),
            Tool::ManageCreatives => ToolDefinition::new(
                tool,
                "Manage Ad Manager creatives: list creatives and get creative details.",
                json!({
                    "type": "object",
                    "properties": {
                        "action": {
                            "type": "string",
                            "enum": ["list", "get"],
                            "description": "list (creatives), get (requires creative_id)",
                            "default": "list"
                        },
                        "creative_id": {
                            "type": "string",
                            "description": "Creative id (required for get)"
                        }
                    },
                    "required": ["action"]
                }),
            ),
            Tool::GenerateReport => ToolDefinition::new(
                tool,
                "Submit an Ad Manager report job reporting impressions and clicks. \
                 Reports run asynchronously: the response carries the job, not rows. \
                 Without start_date and end_date the last 7 days are used.",
                json!({
                    "type": "object",
                    "properties": {
                        "report_type": {
                            "type": "string",
                            "enum": ["inventory", "order", "line_item", "creative", "ad_server"],
                            "description": "inventory (by AD_UNIT_NAME), order (by ORDER_NAME), line_item (by LINE_ITEM_NAME), creative (by CREATIVE_NAME), ad_server (by DATE)",
                            "default": "inventory"
                        },
                        "start_date": {
                            "type": "string",
                            "description": "Start date (YYYY-MM-DD); used together with end_date"
                        },
                        "end_date": {
                            "type": "string",
                            "description": "End date (YYYY-MM-DD); used together with start_date"
                        }
                    },
                    "required": ["report_type"]
                }),
            ),
            Tool::GetHelp => ToolDefinition::new(
                tool,
                "Show usage information, configuration and client status for this server.",
                json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                }),
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_every_tool_once() {
        let tools = definitions();
        assert_eq!(tools.len(), Tool::ALL.len());

        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "manage_networks",
                "manage_inventory",
                "manage_orders",
                "manage_line_items",
                "manage_creatives",
                "generate_report",
                "get_help",
            ]
        );
    }

    #[test]
    fn schemas_are_objects_with_required_lists() {
        for tool in definitions() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(tool.input_schema["required"].is_array(), "{}", tool.name);
            assert!(tool.description.is_some());
        }
    }

    #[test]
    fn action_enums_match_handler_actions() {
        let tools = definitions();
        let inventory = &tools[1].input_schema["properties"]["action"];
        assert_eq!(inventory["enum"], json!(["list", "get", "create"]));
        assert_eq!(inventory["default"], "list");

        let creatives = &tools[4].input_schema["properties"]["action"];
        assert_eq!(creatives["enum"], json!(["list", "get"]));
    }

    #[test]
    fn serialises_camel_case_schema_key() {
        let json = serde_json::to_value(&definitions()[6]).unwrap();
        assert!(json.get("inputSchema").is_some());
        assert!(json.get("input_schema").is_none());
    }
}
