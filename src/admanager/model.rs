//! Normalized Ad Manager entities.
//!
//! Both client implementations map their wire formats into these types, so
//! tool output has one schema regardless of which API answered. Keys are
//! camelCase; missing values serialize as `null`.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// An Ad Manager network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    /// Network code used in API scopes.
    pub network_code: Option<String>,
    /// Human-readable name.
    pub display_name: Option<String>,
    /// Test network code, when the API exposes one.
    pub network_code_for_test: Option<String>,
    /// IANA time zone of the network.
    pub time_zone: Option<String>,
    /// Primary ISO 4217 currency.
    pub currency_code: Option<String>,
    /// Whether this is a test network.
    pub is_test: Option<bool>,
    /// Id of the root of the inventory tree.
    pub effective_root_ad_unit_id: Option<String>,
}

/// A placement slot in the inventory hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdUnit {
    /// Numeric id.
    pub id: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// `BLANK` or `TOP`.
    pub target_window: Option<String>,
    /// `ACTIVE`, `INACTIVE` or `ARCHIVED`.
    pub status: Option<String>,
    /// Id of the parent ad unit.
    pub parent_id: Option<String>,
    /// Code used in ad tags.
    pub ad_unit_code: Option<String>,
}

/// An order placed by an advertiser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Numeric id.
    pub id: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Id of the advertiser company.
    pub advertiser_id: Option<String>,
    /// Workflow status, e.g. `DRAFT` or `APPROVED`.
    pub status: Option<String>,
    /// Currency the order is billed in.
    pub currency_code: Option<String>,
    /// Earliest line item start, ISO-8601.
    pub start_date_time: Option<String>,
    /// Latest line item end, ISO-8601.
    pub end_date_time: Option<String>,
}

/// An amount of money in micros of `currency_code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// ISO 4217 currency code.
    pub currency_code: Option<String>,
    /// Amount in millionths of the currency unit.
    pub micro_amount: i64,
}

/// A priced, scheduled unit of delivery within an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Numeric id.
    pub id: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Id of the owning order.
    pub order_id: Option<String>,
    /// Delivery status.
    pub status: Option<String>,
    /// Priority class, e.g. `PRICE_PRIORITY`.
    pub line_item_type: Option<String>,
    /// Pricing model, e.g. `CPM`.
    pub cost_type: Option<String>,
    /// Rate charged per `cost_type` unit.
    pub cost_per_unit: Option<Money>,
    /// Delivery start, ISO-8601.
    pub start_date_time: Option<String>,
    /// Delivery end, ISO-8601.
    pub end_date_time: Option<String>,
}

/// Creative dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Size {
    /// Width in pixels.
    pub width: i64,
    /// Height in pixels.
    pub height: i64,
}

/// A rendered ad asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Creative {
    /// Numeric id.
    pub id: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Id of the advertiser company.
    pub advertiser_id: Option<String>,
    /// Rendered size, when fixed.
    pub size: Option<Size>,
    /// Whether the creative can serve as native.
    pub is_native_eligible: Option<bool>,
}

/// Fields needed to create an ad unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdUnit {
    /// Display name.
    pub name: String,
    /// Parent ad unit; the network root when absent.
    pub parent_id: Option<String>,
    /// Free-form description.
    pub description: String,
}

/// Fields needed to create an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Display name.
    pub name: String,
    /// Id of the advertiser company.
    pub advertiser_id: String,
}

/// Fields needed to create a line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    /// Display name.
    pub name: String,
    /// Order to attach the line item to.
    pub order_id: Option<String>,
}

/// The report families `generate_report` accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    /// By ad unit.
    Inventory,
    /// By order.
    Order,
    /// By line item.
    LineItem,
    /// By creative.
    Creative,
    /// By day.
    AdServer,
}

impl ReportType {
    /// All report types, in catalog order.
    pub const ALL: [Self; 5] = [
        Self::Inventory,
        Self::Order,
        Self::LineItem,
        Self::Creative,
        Self::AdServer,
    ];

    /// Parses the tool argument value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    /// The tool argument value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Order => "order",
            Self::LineItem => "line_item",
            Self::Creative => "creative",
            Self::AdServer => "ad_server",
        }
    }

    /// The dimension the report is broken down by.
    #[must_use]
    pub const fn dimension(self) -> &'static str {
        match self {
            Self::Inventory => "AD_UNIT_NAME",
            Self::Order => "ORDER_NAME",
            Self::LineItem => "LINE_ITEM_NAME",
            Self::Creative => "CREATIVE_NAME",
            Self::AdServer => "DATE",
        }
    }
}

/// Metric columns every report carries.
pub const REPORT_COLUMNS: [&str; 2] = ["AD_SERVER_IMPRESSIONS", "AD_SERVER_CLICKS"];

/// A calendar date as sent to the APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Date {
    /// Four-digit year.
    pub year: i32,
    /// 1-based month.
    pub month: u32,
    /// Day of the month.
    pub day: u32,
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

/// The period a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum DateRange {
    /// The seven days before today.
    #[serde(rename = "LAST_7_DAYS")]
    Last7Days,
    /// An explicit inclusive range.
    #[serde(rename = "CUSTOM_DATE", rename_all = "camelCase")]
    Custom { start_date: Date, end_date: Date },
}

/// What a report job computes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    /// Breakdown dimensions.
    pub dimensions: Vec<String>,
    /// Metric columns.
    pub columns: Vec<String>,
    /// Period the report covers.
    pub date_range: DateRange,
}

impl ReportQuery {
    /// Builds the query for a report type over `date_range`.
    #[must_use]
    pub fn for_type(report_type: ReportType, date_range: DateRange) -> Self {
        Self {
            dimensions: vec![report_type.dimension().to_string()],
            columns: REPORT_COLUMNS.iter().map(ToString::to_string).collect(),
            date_range,
        }
    }
}

/// A submitted report job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportJob {
    /// Job id, or the long-running operation name on REST.
    pub id: Option<String>,
    /// Status as reported right after submission.
    pub status: Option<String>,
    /// The submitted query.
    pub query: ReportQuery,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn report_type_dimensions() {
        assert_eq!(ReportType::Inventory.dimension(), "AD_UNIT_NAME");
        assert_eq!(ReportType::Order.dimension(), "ORDER_NAME");
        assert_eq!(ReportType::LineItem.dimension(), "LINE_ITEM_NAME");
        assert_eq!(ReportType::Creative.dimension(), "CREATIVE_NAME");
        assert_eq!(ReportType::parse("line_item"), Some(ReportType::LineItem));
        assert_eq!(ReportType::parse("LINE_ITEM"), None);
    }

    #[test]
    fn date_range_serialization() {
        assert_eq!(
            serde_json::to_value(DateRange::Last7Days).unwrap(),
            json!({"type": "LAST_7_DAYS"})
        );

        let custom = DateRange::Custom {
            start_date: Date { year: 2024, month: 1, day: 5 },
            end_date: Date { year: 2024, month: 2, day: 29 },
        };
        assert_eq!(
            serde_json::to_value(custom).unwrap(),
            json!({
                "type": "CUSTOM_DATE",
                "startDate": {"year": 2024, "month": 1, "day": 5},
                "endDate": {"year": 2024, "month": 2, "day": 29}
            })
        );
    }

    #[test]
    fn entities_serialize_camel_case_with_nulls() {
        let unit = AdUnit {
            id: Some("1".to_string()),
            target_window: Some("BLANK".to_string()),
            ..AdUnit::default()
        };
        let value = serde_json::to_value(unit).unwrap();
        assert_eq!(value["targetWindow"], "BLANK");
        assert!(value["parentId"].is_null());
        assert!(value.get("target_window").is_none());
    }

    #[test]
    fn report_query_has_fixed_columns() {
        let query = ReportQuery::for_type(ReportType::Order, DateRange::Last7Days);
        assert_eq!(query.dimensions, vec!["ORDER_NAME"]);
        assert_eq!(
            query.columns,
            vec!["AD_SERVER_IMPRESSIONS", "AD_SERVER_CLICKS"]
        );
    }
}
