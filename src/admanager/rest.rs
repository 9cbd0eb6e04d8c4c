//! Client for the Ad Manager REST API (`v1`).
//!
//! Entities are addressed by resource names such as
//! `networks/{code}/adUnits/{id}`. Responses are decoded into lenient wire
//! structs and reduced to the normalized model; resource names become plain
//! ids.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use crate::admanager::http::{build_http_client, AuthorizedHttp};
use crate::admanager::model::{
    AdUnit, Creative, DateRange, LineItem, Money, Network, NewAdUnit, NewLineItem, NewOrder,
    Order, ReportJob, ReportQuery, Size,
};
use crate::admanager::{resource_id, AdManagerApi, ClientKind};
use crate::auth::{Credentials, TokenProvider, ADMANAGER_SCOPE};
use crate::config::Config;
use crate::error::{ApiError, ClientError};

const API_VERSION: &str = "v1";

/// Page size requested by list calls. Only the first page is read.
const PAGE_SIZE: &str = "500";

/// REST implementation of [`AdManagerApi`].
pub struct RestClient {
    http: AuthorizedHttp,
    base_url: String,
    network_code: Option<String>,
}

impl RestClient {
    /// Builds a client from configuration and resolved credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Init`] if the HTTP client cannot be built.
    pub fn connect(config: &Config, credentials: Credentials) -> Result<Self, ClientError> {
        let http = build_http_client(config.api.timeout_secs, &config.application_name)?;
        let tokens = TokenProvider::new(credentials, ADMANAGER_SCOPE, http.clone());

        let client = Self::new(
            AuthorizedHttp::new(http, tokens),
            &config.api.rest_endpoint,
            config.network_code.clone(),
        );
        tracing::info!(
            endpoint = %client.base_url,
            scope = client.http.scope(),
            network_code = client.network_code.as_deref().unwrap_or("unset"),
            "REST client ready"
        );
        Ok(client)
    }

    /// Builds a client against an explicit endpoint.
    #[must_use]
    pub fn new(http: AuthorizedHttp, endpoint: &str, network_code: Option<String>) -> Self {
        Self {
            http,
            base_url: format!("{}/{API_VERSION}", endpoint.trim_end_matches('/')),
            network_code,
        }
    }

    fn network(&self) -> Result<&str, ApiError> {
        self.network_code
            .as_deref()
            .ok_or(ApiError::MissingNetworkCode)
    }

    /// Resource name of an entity in the configured network.
    fn resource(&self, collection: &str, id: &str) -> Result<String, ApiError> {
        Ok(format!("networks/{}/{collection}/{id}", self.network()?))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = format!("{}/{path}", self.base_url);
        tracing::debug!(url = %url, "GET");
        let response = self.http.send(self.http.get(&url).query(query)).await?;
        read_json(response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, ApiError> {
        let url = format!("{}/{path}", self.base_url);
        tracing::debug!(url = %url, "POST");
        let response = self.http.send(self.http.post(&url).json(body)).await?;
        read_json(response).await
    }

    /// Fetches one entity, mapping HTTP 404 to [`ApiError::NotFound`].
    async fn get_entity<T: DeserializeOwned>(
        &self,
        collection: &str,
        kind: &'static str,
        field: &'static str,
        id: &str,
    ) -> Result<T, ApiError> {
        let path = self.resource(collection, check_id(field, id)?)?;
        match self.get_json(&path, &[]).await {
            Err(ApiError::Status { status: 404, .. }) => Err(ApiError::NotFound {
                kind,
                id: id.to_string(),
            }),
            other => other,
        }
    }

    async fn fetch_network(&self) -> Result<RestNetwork, ApiError> {
        if let Some(code) = &self.network_code {
            return self.get_json(&format!("networks/{code}"), &[]).await;
        }
        let list: NetworkList = self.get_json("networks", &[]).await?;
        list.networks
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Decode("no networks are accessible".to_string()))
    }

    async fn root_ad_unit(&self) -> Result<(String, Option<String>), ApiError> {
        let network = self.fetch_network().await?;
        let root = network
            .effective_root_ad_unit
            .ok_or_else(|| ApiError::Decode("network has no root ad unit".to_string()))?;
        Ok((root, network.currency_code))
    }
}

#[async_trait]
impl AdManagerApi for RestClient {
    fn kind(&self) -> ClientKind {
        ClientKind::Rest
    }

    async fn current_network(&self) -> Result<Network, ApiError> {
        Ok(self.fetch_network().await?.into())
    }

    async fn list_networks(&self) -> Result<Vec<Network>, ApiError> {
        let list: NetworkList = self.get_json("networks", &[]).await?;
        Ok(list.networks.into_iter().map(Network::from).collect())
    }

    async fn list_ad_units(&self, parent_id: Option<&str>) -> Result<Vec<AdUnit>, ApiError> {
        let path = format!("networks/{}/adUnits", self.network()?);
        let filter = parent_id
            .map(|id| {
                check_id("parent_id", id)
                    .and_then(|id| self.resource("adUnits", id))
                    .map(|parent| format!("parentAdUnit = \"{parent}\""))
            })
            .transpose()?;

        let mut query = vec![("pageSize", PAGE_SIZE)];
        if let Some(filter) = &filter {
            query.push(("filter", filter.as_str()));
        }
        let list: AdUnitList = self.get_json(&path, &query).await?;
        Ok(list.ad_units.into_iter().map(AdUnit::from).collect())
    }

    async fn get_ad_unit(&self, id: &str) -> Result<AdUnit, ApiError> {
        let unit: RestAdUnit = self.get_entity("adUnits", "ad unit", "ad_unit_id", id).await?;
        Ok(unit.into())
    }

    async fn create_ad_unit(&self, ad_unit: &NewAdUnit) -> Result<AdUnit, ApiError> {
        let parent = match &ad_unit.parent_id {
            Some(parent_id) => self.resource("adUnits", check_id("parent_id", parent_id)?)?,
            None => self.root_ad_unit().await?.0,
        };

        let body = json!({
            "displayName": ad_unit.name,
            "parentAdUnit": parent,
            "description": ad_unit.description,
            "appliedTargetWindow": "BLANK",
        });
        let path = format!("networks/{}/adUnits", self.network()?);
        let created: RestAdUnit = self.post_json(&path, &body).await?;
        Ok(created.into())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let path = format!("networks/{}/orders", self.network()?);
        let list: OrderList = self.get_json(&path, &[("pageSize", PAGE_SIZE)]).await?;
        Ok(list.orders.into_iter().map(Order::from).collect())
    }

    async fn get_order(&self, id: &str) -> Result<Order, ApiError> {
        let order: RestOrder = self.get_entity("orders", "order", "order_id", id).await?;
        Ok(order.into())
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        let advertiser = self.resource(
            "companies",
            check_id("advertiser_id", &order.advertiser_id)?,
        )?;
        let body = json!({
            "displayName": order.name,
            "advertiser": advertiser,
        });
        let path = format!("networks/{}/orders", self.network()?);
        let created: RestOrder = self.post_json(&path, &body).await?;
        Ok(created.into())
    }

    async fn list_line_items(&self, order_id: Option<&str>) -> Result<Vec<LineItem>, ApiError> {
        let path = format!("networks/{}/lineItems", self.network()?);
        let filter = order_id
            .map(|id| {
                check_id("order_id", id)
                    .and_then(|id| self.resource("orders", id))
                    .map(|order| format!("order = \"{order}\""))
            })
            .transpose()?;

        let mut query = vec![("pageSize", PAGE_SIZE)];
        if let Some(filter) = &filter {
            query.push(("filter", filter.as_str()));
        }
        let list: LineItemList = self.get_json(&path, &query).await?;
        Ok(list.line_items.into_iter().map(LineItem::from).collect())
    }

    async fn get_line_item(&self, id: &str) -> Result<LineItem, ApiError> {
        let item: RestLineItem = self
            .get_entity("lineItems", "line item", "line_item_id", id)
            .await?;
        Ok(item.into())
    }

    async fn create_line_item(&self, line_item: &NewLineItem) -> Result<LineItem, ApiError> {
        let order = line_item
            .order_id
            .as_deref()
            .map(|id| check_id("order_id", id).and_then(|id| self.resource("orders", id)))
            .transpose()?;
        let (root, currency) = self.root_ad_unit().await?;

        let mut body = json!({
            "displayName": line_item.name,
            "lineItemType": "PRICE_PRIORITY",
            "startTime": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "rateType": "CPM",
            "rate": {
                "currencyCode": currency.unwrap_or_else(|| "USD".to_string()),
                "units": "0",
            },
            "creativePlaceholders": [
                {"size": {"width": 300, "height": 250, "sizeType": "PIXEL"}}
            ],
            "goal": {"goalType": "NONE", "unitType": "IMPRESSIONS", "units": "-1"},
            "targeting": {
                "inventoryTargeting": {
                    "targetedAdUnits": [{"adUnit": root, "includeDescendants": true}]
                }
            },
        });
        if let Some(order) = order {
            body["order"] = Value::String(order);
        }

        let path = format!("networks/{}/lineItems", self.network()?);
        let created: RestLineItem = self.post_json(&path, &body).await?;
        Ok(created.into())
    }

    async fn list_creatives(&self) -> Result<Vec<Creative>, ApiError> {
        let path = format!("networks/{}/creatives", self.network()?);
        let list: CreativeList = self.get_json(&path, &[("pageSize", PAGE_SIZE)]).await?;
        Ok(list.creatives.into_iter().map(Creative::from).collect())
    }

    async fn get_creative(&self, id: &str) -> Result<Creative, ApiError> {
        let creative: RestCreative = self
            .get_entity("creatives", "creative", "creative_id", id)
            .await?;
        Ok(creative.into())
    }

    async fn run_report(&self, query: &ReportQuery) -> Result<ReportJob, ApiError> {
        let path = format!("networks/{}/reports", self.network()?);
        let report: RestReport = self.post_json(&path, &report_body(query)).await?;
        let report_name = report
            .name
            .ok_or_else(|| ApiError::Decode("created report has no name".to_string()))?;

        let operation: RestOperation = self
            .post_json(&format!("{report_name}:run"), &json!({}))
            .await?;
        tracing::info!(
            report = %report_name,
            operation = operation.name.as_deref().unwrap_or("unknown"),
            "Report run started"
        );

        Ok(ReportJob {
            status: Some(operation.status().to_string()),
            id: operation.name,
            query: query.clone(),
        })
    }
}

/// Request body creating a report for `query`.
fn report_body(query: &ReportQuery) -> Value {
    let date_range = match query.date_range {
        DateRange::Last7Days => json!({"relative": "LAST_7_DAYS"}),
        DateRange::Custom {
            start_date,
            end_date,
        } => json!({"fixed": {"startDate": start_date, "endDate": end_date}}),
    };
    json!({
        "displayName": format!("admanager-mcp {}", query.dimensions.join(", ")),
        "reportDefinition": {
            "dimensions": query.dimensions,
            "metrics": query.columns,
            "dateRange": date_range,
            "reportType": "HISTORICAL",
        },
    })
}

/// Rejects ids that are not plain numbers so they cannot alter the path.
fn check_id<'a>(field: &'static str, id: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = id.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        Ok(trimmed)
    } else {
        Err(ApiError::InvalidId {
            field,
            value: id.to_string(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .and_then(|e| e.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Accepts an int64 encoded either as a JSON string or a number.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(lenient_string(deserializer)?.and_then(|s| s.parse().ok()))
}

/// Id from an explicit id field, falling back to the resource name.
fn entity_id(explicit: Option<String>, name: Option<&str>) -> Option<String> {
    explicit.or_else(|| name.map(|n| resource_id(n).to_string()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct NetworkList {
    networks: Vec<RestNetwork>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RestNetwork {
    display_name: Option<String>,
    network_code: Option<String>,
    time_zone: Option<String>,
    currency_code: Option<String>,
    effective_root_ad_unit: Option<String>,
    test_network: Option<bool>,
}

impl From<RestNetwork> for Network {
    fn from(n: RestNetwork) -> Self {
        Self {
            network_code: n.network_code,
            display_name: n.display_name,
            network_code_for_test: None,
            time_zone: n.time_zone,
            currency_code: n.currency_code,
            is_test: n.test_network,
            effective_root_ad_unit_id: n
                .effective_root_ad_unit
                .as_deref()
                .map(|r| resource_id(r).to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AdUnitList {
    ad_units: Vec<RestAdUnit>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RestAdUnit {
    name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    ad_unit_id: Option<String>,
    parent_ad_unit: Option<String>,
    display_name: Option<String>,
    ad_unit_code: Option<String>,
    description: Option<String>,
    status: Option<String>,
    applied_target_window: Option<String>,
    effective_target_window: Option<String>,
}

impl From<RestAdUnit> for AdUnit {
    fn from(u: RestAdUnit) -> Self {
        Self {
            id: entity_id(u.ad_unit_id, u.name.as_deref()),
            name: u.display_name,
            description: u.description,
            target_window: u.applied_target_window.or(u.effective_target_window),
            status: u.status,
            parent_id: u.parent_ad_unit.as_deref().map(|p| resource_id(p).to_string()),
            ad_unit_code: u.ad_unit_code,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct OrderList {
    orders: Vec<RestOrder>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RestOrder {
    name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    order_id: Option<String>,
    display_name: Option<String>,
    advertiser: Option<String>,
    status: Option<String>,
    currency_code: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
}

impl From<RestOrder> for Order {
    fn from(o: RestOrder) -> Self {
        Self {
            id: entity_id(o.order_id, o.name.as_deref()),
            name: o.display_name,
            advertiser_id: o.advertiser.as_deref().map(|a| resource_id(a).to_string()),
            status: o.status,
            currency_code: o.currency_code,
            start_date_time: o.start_time,
            end_date_time: o.end_time,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LineItemList {
    line_items: Vec<RestLineItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RestMoney {
    currency_code: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    units: Option<i64>,
    nanos: Option<i64>,
}

impl RestMoney {
    /// Converts to micros, or `None` when the amount does not fit in an `i64`.
    fn into_money(self) -> Option<Money> {
        let micro_amount = self
            .units
            .unwrap_or(0)
            .checked_mul(1_000_000)?
            .checked_add(self.nanos.unwrap_or(0) / 1_000)?;
        Some(Money {
            currency_code: self.currency_code,
            micro_amount,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RestLineItem {
    name: Option<String>,
    display_name: Option<String>,
    order: Option<String>,
    status: Option<String>,
    line_item_type: Option<String>,
    rate_type: Option<String>,
    rate: Option<RestMoney>,
    start_time: Option<String>,
    end_time: Option<String>,
}

impl From<RestLineItem> for LineItem {
    fn from(l: RestLineItem) -> Self {
        Self {
            id: l.name.as_deref().map(|n| resource_id(n).to_string()),
            name: l.display_name,
            order_id: l.order.as_deref().map(|o| resource_id(o).to_string()),
            status: l.status,
            line_item_type: l.line_item_type,
            cost_type: l.rate_type,
            cost_per_unit: l.rate.and_then(RestMoney::into_money),
            start_date_time: l.start_time,
            end_date_time: l.end_time,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CreativeList {
    creatives: Vec<RestCreative>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RestSize {
    width: Option<i64>,
    height: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RestCreative {
    name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    creative_id: Option<String>,
    display_name: Option<String>,
    advertiser: Option<String>,
    size: Option<RestSize>,
    native_eligible: Option<bool>,
}

impl From<RestCreative> for Creative {
    fn from(c: RestCreative) -> Self {
        Self {
            id: entity_id(c.creative_id, c.name.as_deref()),
            name: c.display_name,
            advertiser_id: c.advertiser.as_deref().map(|a| resource_id(a).to_string()),
            size: c.size.and_then(|s| {
                Some(Size {
                    width: s.width?,
                    height: s.height?,
                })
            }),
            is_native_eligible: c.native_eligible,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RestReport {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RestOperation {
    name: Option<String>,
    done: bool,
    error: Option<Value>,
}

impl RestOperation {
    const fn status(&self) -> &'static str {
        match (self.done, &self.error) {
            (false, _) => "RUNNING",
            (true, Some(_)) => "FAILED",
            (true, None) => "COMPLETED",
        }
    }
}
