//! Client for the legacy Ad Manager SOAP API.
//!
//! Each call POSTs a SOAP 1.1 envelope to `{endpoint}/{version}/{Service}`.
//! The envelope header carries the network code and application name; the
//! body holds a single operation element. Responses are parsed into an
//! [`XmlElement`] tree and mapped onto the normalized model.
//!
//! Lookups by id go through the `get*ByStatement` operations with a
//! `WHERE id = :id LIMIT 1` statement.

pub mod statement;
pub mod xml;

use async_trait::async_trait;

use crate::admanager::http::{build_http_client, AuthorizedHttp};
use crate::admanager::model::{
    AdUnit, Creative, DateRange, LineItem, Money, Network, NewAdUnit, NewLineItem, NewOrder,
    Order, ReportJob, ReportQuery, Size,
};
use crate::admanager::{AdManagerApi, ClientKind};
use crate::auth::{Credentials, TokenProvider, DFP_SCOPE};
use crate::config::Config;
use crate::error::{ApiError, ClientError};

use statement::{BindValue, StatementBuilder};
use xml::XmlElement;

const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const PUBLISHER_NS_BASE: &str = "https://www.google.com/apis/ads/publisher";

const NETWORK_SERVICE: &str = "NetworkService";
const INVENTORY_SERVICE: &str = "InventoryService";
const ORDER_SERVICE: &str = "OrderService";
const LINE_ITEM_SERVICE: &str = "LineItemService";
const CREATIVE_SERVICE: &str = "CreativeService";
const REPORT_SERVICE: &str = "ReportService";
const USER_SERVICE: &str = "UserService";

/// Legacy SOAP implementation of [`AdManagerApi`].
pub struct SoapClient {
    http: AuthorizedHttp,
    base_url: String,
    namespace: String,
    network_code: String,
    application_name: String,
}

impl SoapClient {
    /// Builds a client from configuration and resolved credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Init`] if no network code is configured or the
    /// HTTP client cannot be built.
    pub fn connect(config: &Config, credentials: Credentials) -> Result<Self, ClientError> {
        let network_code = config
            .network_code
            .clone()
            .ok_or_else(|| ClientError::Init(ApiError::MissingNetworkCode.to_string()))?;

        let http = build_http_client(config.api.timeout_secs, &config.application_name)?;
        let tokens = TokenProvider::new(credentials, DFP_SCOPE, http.clone());

        let client = Self::new(
            AuthorizedHttp::new(http, tokens),
            &config.api.soap_endpoint,
            &config.api.soap_version,
            network_code,
            config.application_name.clone(),
        );
        tracing::info!(
            endpoint = %client.base_url,
            network_code = %client.network_code,
            "Legacy SOAP client ready"
        );
        Ok(client)
    }

    /// Builds a client against an explicit endpoint.
    #[must_use]
    pub fn new(
        http: AuthorizedHttp,
        endpoint: &str,
        version: &str,
        network_code: String,
        application_name: String,
    ) -> Self {
        Self {
            http,
            base_url: format!("{}/{version}", endpoint.trim_end_matches('/')),
            namespace: format!("{PUBLISHER_NS_BASE}/{version}"),
            network_code,
            application_name,
        }
    }

    /// Wraps an operation element in a SOAP envelope.
    fn envelope(&self, operation: XmlElement) -> String {
        let header = XmlElement::new("soapenv:Header").with_child(
            XmlElement::new("RequestHeader")
                .with_text_child("networkCode", self.network_code.as_str())
                .with_text_child("applicationName", self.application_name.as_str()),
        );

        let envelope = XmlElement::new("soapenv:Envelope")
            .with_attribute("xmlns:soapenv", SOAP_ENVELOPE_NS)
            .with_attribute("xmlns:xsi", XSI_NS)
            .with_attribute("xmlns", self.namespace.as_str())
            .with_child(header)
            .with_child(XmlElement::new("soapenv:Body").with_child(operation));

        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>{}",
            envelope.to_xml()
        )
    }

    /// Invokes `operation` on `service` and returns the `<operation>Response`
    /// element.
    async fn call(&self, service: &str, operation: XmlElement) -> Result<XmlElement, ApiError> {
        let operation_name = operation.name.clone();
        let url = format!("{}/{service}", self.base_url);
        tracing::debug!(service, operation = %operation_name, "Calling legacy API");

        let request = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", "\"\"")
            .body(self.envelope(operation));

        let response = self.http.send(request).await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        read_response(status, &body, &operation_name)
    }

    /// Runs a `get*ByStatement` operation and returns its `results`.
    async fn query(
        &self,
        service: &str,
        operation: &str,
        statement: &StatementBuilder,
    ) -> Result<Vec<XmlElement>, ApiError> {
        let response = self
            .call(
                service,
                XmlElement::new(operation).with_child(statement.to_element("filterStatement")),
            )
            .await?;

        Ok(response
            .child("rval")
            .map(|page| page.children_named("results").cloned().collect())
            .unwrap_or_default())
    }

    /// Looks up one entity by numeric id.
    async fn query_by_id(
        &self,
        service: &str,
        operation: &str,
        field: &'static str,
        kind: &'static str,
        id: &str,
    ) -> Result<XmlElement, ApiError> {
        let numeric = parse_id(field, id)?;
        let statement = StatementBuilder::new()
            .where_clause("id = :id")
            .with_bind_variable("id", BindValue::Number(numeric))
            .limit(1);

        self.query(service, operation, &statement)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound {
                kind,
                id: id.to_string(),
            })
    }

    async fn fetch_current_network(&self) -> Result<XmlElement, ApiError> {
        let response = self
            .call(NETWORK_SERVICE, XmlElement::new("getCurrentNetwork"))
            .await?;
        first_rval(&response, "getCurrentNetwork").cloned()
    }

    async fn current_user_id(&self) -> Result<String, ApiError> {
        let response = self
            .call(USER_SERVICE, XmlElement::new("getCurrentUser"))
            .await?;
        first_rval(&response, "getCurrentUser")?
            .child_text("id")
            .ok_or_else(|| ApiError::Decode("current user has no id".to_string()))
    }

    async fn report_job_status(&self, job_id: &str) -> Result<Option<String>, ApiError> {
        let response = self
            .call(
                REPORT_SERVICE,
                XmlElement::new("getReportJobStatus").with_text_child("reportJobId", job_id),
            )
            .await?;
        Ok(response.child_text("rval"))
    }
}

#[async_trait]
impl AdManagerApi for SoapClient {
    fn kind(&self) -> ClientKind {
        ClientKind::Legacy
    }

    async fn current_network(&self) -> Result<Network, ApiError> {
        Ok(network_from(&self.fetch_current_network().await?))
    }

    async fn list_networks(&self) -> Result<Vec<Network>, ApiError> {
        let response = self
            .call(NETWORK_SERVICE, XmlElement::new("getAllNetworks"))
            .await?;
        Ok(response.children_named("rval").map(network_from).collect())
    }

    async fn list_ad_units(&self, parent_id: Option<&str>) -> Result<Vec<AdUnit>, ApiError> {
        let mut statement = StatementBuilder::new();
        if let Some(parent_id) = parent_id {
            statement = statement
                .where_clause("parentId = :parent_id")
                .with_bind_variable("parent_id", BindValue::Number(parse_id("parent_id", parent_id)?));
        }

        let results = self
            .query(INVENTORY_SERVICE, "getAdUnitsByStatement", &statement)
            .await?;
        Ok(results.iter().map(ad_unit_from).collect())
    }

    async fn get_ad_unit(&self, id: &str) -> Result<AdUnit, ApiError> {
        let element = self
            .query_by_id(
                INVENTORY_SERVICE,
                "getAdUnitsByStatement",
                "ad_unit_id",
                "ad unit",
                id,
            )
            .await?;
        Ok(ad_unit_from(&element))
    }

    async fn create_ad_unit(&self, ad_unit: &NewAdUnit) -> Result<AdUnit, ApiError> {
        let parent_id = match &ad_unit.parent_id {
            Some(parent_id) => parse_id("parent_id", parent_id)?.to_string(),
            None => self
                .fetch_current_network()
                .await?
                .child_text("effectiveRootAdUnitId")
                .ok_or_else(|| ApiError::Decode("network has no root ad unit".to_string()))?,
        };

        let element = XmlElement::new("adUnits")
            .with_text_child("parentId", parent_id)
            .with_text_child("name", ad_unit.name.as_str())
            .with_text_child("description", ad_unit.description.as_str())
            .with_text_child("targetWindow", "BLANK");

        let response = self
            .call(
                INVENTORY_SERVICE,
                XmlElement::new("createAdUnits").with_child(element),
            )
            .await?;
        Ok(ad_unit_from(first_rval(&response, "createAdUnits")?))
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        let results = self
            .query(ORDER_SERVICE, "getOrdersByStatement", &StatementBuilder::new())
            .await?;
        Ok(results.iter().map(order_from).collect())
    }

    async fn get_order(&self, id: &str) -> Result<Order, ApiError> {
        let element = self
            .query_by_id(ORDER_SERVICE, "getOrdersByStatement", "order_id", "order", id)
            .await?;
        Ok(order_from(&element))
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        let advertiser_id = parse_id("advertiser_id", &order.advertiser_id)?;
        let trafficker_id = self.current_user_id().await?;

        let element = XmlElement::new("orders")
            .with_text_child("name", order.name.as_str())
            .with_text_child("advertiserId", advertiser_id.to_string())
            .with_text_child("traffickerId", trafficker_id);

        let response = self
            .call(ORDER_SERVICE, XmlElement::new("createOrders").with_child(element))
            .await?;
        Ok(order_from(first_rval(&response, "createOrders")?))
    }

    async fn list_line_items(&self, order_id: Option<&str>) -> Result<Vec<LineItem>, ApiError> {
        let mut statement = StatementBuilder::new();
        if let Some(order_id) = order_id {
            statement = statement
                .where_clause("orderId = :order_id")
                .with_bind_variable("order_id", BindValue::Number(parse_id("order_id", order_id)?));
        }

        let results = self
            .query(LINE_ITEM_SERVICE, "getLineItemsByStatement", &statement)
            .await?;
        Ok(results.iter().map(line_item_from).collect())
    }

    async fn get_line_item(&self, id: &str) -> Result<LineItem, ApiError> {
        let element = self
            .query_by_id(
                LINE_ITEM_SERVICE,
                "getLineItemsByStatement",
                "line_item_id",
                "line item",
                id,
            )
            .await?;
        Ok(line_item_from(&element))
    }

    async fn create_line_item(&self, line_item: &NewLineItem) -> Result<LineItem, ApiError> {
        let order_id = line_item
            .order_id
            .as_deref()
            .map(|id| parse_id("order_id", id))
            .transpose()?;

        let network = self.fetch_current_network().await?;
        let root_ad_unit = network
            .child_text("effectiveRootAdUnitId")
            .ok_or_else(|| ApiError::Decode("network has no root ad unit".to_string()))?;
        let currency = network
            .child_text("currencyCode")
            .unwrap_or_else(|| "USD".to_string());

        let element = XmlElement::new("lineItems")
            .with_optional_child("orderId", order_id.map(|id| id.to_string()).as_deref())
            .with_text_child("name", line_item.name.as_str())
            .with_text_child("startDateTimeType", "IMMEDIATELY")
            .with_text_child("unlimitedEndDateTime", "true")
            .with_text_child("creativeRotationType", "EVEN")
            .with_text_child("lineItemType", "PRICE_PRIORITY")
            .with_child(
                XmlElement::new("costPerUnit")
                    .with_text_child("currencyCode", currency)
                    .with_text_child("microAmount", "0"),
            )
            .with_text_child("costType", "CPM")
            .with_child(
                XmlElement::new("creativePlaceholders").with_child(
                    XmlElement::new("size")
                        .with_text_child("width", "300")
                        .with_text_child("height", "250")
                        .with_text_child("isAspectRatio", "false"),
                ),
            )
            .with_child(
                XmlElement::new("primaryGoal")
                    .with_text_child("goalType", "NONE")
                    .with_text_child("unitType", "IMPRESSIONS")
                    .with_text_child("units", "-1"),
            )
            .with_child(
                XmlElement::new("targeting").with_child(
                    XmlElement::new("inventoryTargeting").with_child(
                        XmlElement::new("targetedAdUnits")
                            .with_text_child("adUnitId", root_ad_unit)
                            .with_text_child("includeDescendants", "true"),
                    ),
                ),
            );

        let response = self
            .call(
                LINE_ITEM_SERVICE,
                XmlElement::new("createLineItems").with_child(element),
            )
            .await?;
        Ok(line_item_from(first_rval(&response, "createLineItems")?))
    }

    async fn list_creatives(&self) -> Result<Vec<Creative>, ApiError> {
        let results = self
            .query(CREATIVE_SERVICE, "getCreativesByStatement", &StatementBuilder::new())
            .await?;
        Ok(results.iter().map(creative_from).collect())
    }

    async fn get_creative(&self, id: &str) -> Result<Creative, ApiError> {
        let element = self
            .query_by_id(
                CREATIVE_SERVICE,
                "getCreativesByStatement",
                "creative_id",
                "creative",
                id,
            )
            .await?;
        Ok(creative_from(&element))
    }

    async fn run_report(&self, query: &ReportQuery) -> Result<ReportJob, ApiError> {
        let response = self
            .call(
                REPORT_SERVICE,
                XmlElement::new("runReportJob").with_child(
                    XmlElement::new("reportJob").with_child(report_query_element(query)),
                ),
            )
            .await?;

        let job = first_rval(&response, "runReportJob")?;
        let id = job.child_text("id");
        let status = match (job.child_text("reportJobStatus"), &id) {
            (Some(status), _) => Some(status),
            (None, Some(id)) => self.report_job_status(id).await?,
            (None, None) => None,
        };
        tracing::info!(job_id = id.as_deref().unwrap_or("unknown"), "Report job submitted");

        Ok(ReportJob {
            id,
            status,
            query: query.clone(),
        })
    }
}

/// Turns an HTTP response into the `<operation>Response` element, mapping
/// SOAP faults and HTTP failures to errors.
fn read_response(status: u16, body: &str, operation: &str) -> Result<XmlElement, ApiError> {
    let document = match xml::parse(body) {
        Ok(document) => document,
        Err(e) if (200..300).contains(&status) => return Err(e),
        Err(_) => {
            return Err(ApiError::Status {
                status,
                message: body.chars().take(200).collect(),
            })
        }
    };

    let soap_body = document
        .child("Body")
        .ok_or_else(|| ApiError::Decode("response has no SOAP body".to_string()))?;

    if let Some(fault) = soap_body.child("Fault") {
        let message = fault
            .child_text("faultstring")
            .unwrap_or_else(|| "unknown SOAP fault".to_string());
        return Err(ApiError::Fault(message));
    }

    if !(200..300).contains(&status) {
        return Err(ApiError::Status {
            status,
            message: "request failed without a SOAP fault".to_string(),
        });
    }

    let response_name = format!("{operation}Response");
    soap_body
        .child(&response_name)
        .cloned()
        .ok_or_else(|| ApiError::Decode(format!("missing {response_name} element")))
}

fn first_rval<'a>(response: &'a XmlElement, operation: &str) -> Result<&'a XmlElement, ApiError> {
    response
        .child("rval")
        .ok_or_else(|| ApiError::Decode(format!("{operation} returned no value")))
}

fn parse_id(field: &'static str, value: &str) -> Result<i64, ApiError> {
    value.trim().parse().map_err(|_| ApiError::InvalidId {
        field,
        value: value.to_string(),
    })
}

fn report_query_element(query: &ReportQuery) -> XmlElement {
    let mut element = XmlElement::new("reportQuery");
    for dimension in &query.dimensions {
        element = element.with_text_child("dimensions", dimension.as_str());
    }
    for column in &query.columns {
        element = element.with_text_child("columns", column.as_str());
    }

    match query.date_range {
        DateRange::Last7Days => element.with_text_child("dateRangeType", "LAST_7_DAYS"),
        DateRange::Custom {
            start_date,
            end_date,
        } => {
            let date = |name: &str, d: crate::admanager::model::Date| {
                XmlElement::new(name)
                    .with_text_child("year", d.year.to_string())
                    .with_text_child("month", d.month.to_string())
                    .with_text_child("day", d.day.to_string())
            };
            element
                .with_child(date("startDate", start_date))
                .with_child(date("endDate", end_date))
                .with_text_child("dateRangeType", "CUSTOM_DATE")
        }
    }
}

/// Renders a legacy `DateTime` as ISO-8601 with the zone id as a suffix.
fn format_date_time(element: &XmlElement) -> Option<String> {
    let date = element.child("date")?;
    let mut out = format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        date.child_i64("year")?,
        date.child_i64("month")?,
        date.child_i64("day")?,
        element.child_i64("hour").unwrap_or(0),
        element.child_i64("minute").unwrap_or(0),
        element.child_i64("second").unwrap_or(0),
    );
    if let Some(zone) = element.child_text("timeZoneId") {
        out.push('[');
        out.push_str(&zone);
        out.push(']');
    }
    Some(out)
}

fn child_date_time(element: &XmlElement, name: &str) -> Option<String> {
    element.child(name).and_then(format_date_time)
}

fn network_from(element: &XmlElement) -> Network {
    Network {
        network_code: element.child_text("networkCode"),
        display_name: element.child_text("displayName"),
        network_code_for_test: element.child_text("networkCodeForTest"),
        time_zone: element.child_text("timeZone"),
        currency_code: element.child_text("currencyCode"),
        is_test: element.child_bool("isTest"),
        effective_root_ad_unit_id: element.child_text("effectiveRootAdUnitId"),
    }
}

fn ad_unit_from(element: &XmlElement) -> AdUnit {
    AdUnit {
        id: element.child_text("id"),
        name: element.child_text("name"),
        description: element.child_text("description"),
        target_window: element.child_text("targetWindow"),
        status: element.child_text("status"),
        parent_id: element.child_text("parentId"),
        ad_unit_code: element.child_text("adUnitCode"),
    }
}

fn order_from(element: &XmlElement) -> Order {
    Order {
        id: element.child_text("id"),
        name: element.child_text("name"),
        advertiser_id: element.child_text("advertiserId"),
        status: element.child_text("status"),
        currency_code: element.child_text("currencyCode"),
        start_date_time: child_date_time(element, "startDateTime"),
        end_date_time: child_date_time(element, "endDateTime"),
    }
}

fn line_item_from(element: &XmlElement) -> LineItem {
    LineItem {
        id: element.child_text("id"),
        name: element.child_text("name"),
        order_id: element.child_text("orderId"),
        status: element.child_text("status"),
        line_item_type: element.child_text("lineItemType"),
        cost_type: element.child_text("costType"),
        cost_per_unit: element.child("costPerUnit").map(|money| Money {
            currency_code: money.child_text("currencyCode"),
            micro_amount: money.child_i64("microAmount").unwrap_or(0),
        }),
        start_date_time: child_date_time(element, "startDateTime"),
        end_date_time: child_date_time(element, "endDateTime"),
    }
}

fn creative_from(element: &XmlElement) -> Creative {
    Creative {
        id: element.child_text("id"),
        name: element.child_text("name"),
        advertiser_id: element.child_text("advertiserId"),
        size: element.child("size").and_then(|size| {
            Some(Size {
                width: size.child_i64("width")?,
                height: size.child_i64("height")?,
            })
        }),
        is_native_eligible: element.child_bool("isNativeEligible"),
    }
}
