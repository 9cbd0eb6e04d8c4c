//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use admanager_mcp::admanager::model::{
    AdUnit, Creative, LineItem, Money, Network, NewAdUnit, NewLineItem, NewOrder, Order,
    ReportJob, ReportQuery, Size,
};
use admanager_mcp::admanager::{AdManagerApi, ClientKind};
use admanager_mcp::error::ApiError;

/// An in-memory Ad Manager that records every call it receives.
#[derive(Default)]
pub struct FakeAdManager {
    calls: Arc<Mutex<Vec<String>>>,
    /// When set, every call fails with this SOAP fault message.
    pub fault: Option<String>,
}

impl FakeAdManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fault: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// The calls received so far, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// A handle on the call log that outlives moving the fake into a server.
    pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: String) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        match &self.fault {
            Some(message) => Err(ApiError::Fault(message.clone())),
            None => Ok(()),
        }
    }
}

pub fn network() -> Network {
    Network {
        network_code: Some("1234".to_string()),
        display_name: Some("Test Network".to_string()),
        time_zone: Some("America/New_York".to_string()),
        currency_code: Some("USD".to_string()),
        is_test: Some(false),
        effective_root_ad_unit_id: Some("100".to_string()),
        ..Network::default()
    }
}

pub fn ad_unit(id: &str, parent_id: Option<&str>) -> AdUnit {
    AdUnit {
        id: Some(id.to_string()),
        name: Some(format!("unit-{id}")),
        target_window: Some("BLANK".to_string()),
        status: Some("ACTIVE".to_string()),
        parent_id: parent_id.map(str::to_string),
        ..AdUnit::default()
    }
}

pub fn order(id: &str) -> Order {
    Order {
        id: Some(id.to_string()),
        name: Some(format!("order-{id}")),
        advertiser_id: Some("77".to_string()),
        status: Some("DRAFT".to_string()),
        currency_code: Some("USD".to_string()),
        ..Order::default()
    }
}

pub fn line_item(id: &str, order_id: Option<&str>) -> LineItem {
    LineItem {
        id: Some(id.to_string()),
        name: Some(format!("line-{id}")),
        order_id: order_id.map(str::to_string),
        line_item_type: Some("PRICE_PRIORITY".to_string()),
        cost_type: Some("CPM".to_string()),
        cost_per_unit: Some(Money {
            currency_code: Some("USD".to_string()),
            micro_amount: 0,
        }),
        ..LineItem::default()
    }
}

pub fn creative(id: &str) -> Creative {
    Creative {
        id: Some(id.to_string()),
        name: Some(format!("creative-{id}")),
        advertiser_id: Some("77".to_string()),
        size: Some(Size {
            width: 300,
            height: 250,
        }),
        is_native_eligible: Some(false),
    }
}

#[async_trait]
impl AdManagerApi for FakeAdManager {
    fn kind(&self) -> ClientKind {
        ClientKind::Rest
    }

    async fn current_network(&self) -> Result<Network, ApiError> {
        self.record("current_network".to_string())?;
        Ok(network())
    }

    async fn list_networks(&self) -> Result<Vec<Network>, ApiError> {
        self.record("list_networks".to_string())?;
        Ok(vec![network()])
    }

    async fn list_ad_units(&self, parent_id: Option<&str>) -> Result<Vec<AdUnit>, ApiError> {
        self.record(format!("list_ad_units {parent_id:?}"))?;
        Ok(vec![ad_unit("1", parent_id), ad_unit("2", parent_id)])
    }

    async fn get_ad_unit(&self, id: &str) -> Result<AdUnit, ApiError> {
        self.record(format!("get_ad_unit {id}"))?;
        Ok(ad_unit(id, Some("100")))
    }

    async fn create_ad_unit(&self, new_ad_unit: &NewAdUnit) -> Result<AdUnit, ApiError> {
        self.record(format!(
            "create_ad_unit {} {:?}",
            new_ad_unit.name, new_ad_unit.parent_id
        ))?;
        Ok(AdUnit {
            name: Some(new_ad_unit.name.clone()),
            description: Some(new_ad_unit.description.clone()),
            ..ad_unit("9", new_ad_unit.parent_id.as_deref().or(Some("100")))
        })
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.record("list_orders".to_string())?;
        Ok(vec![order("5")])
    }

    async fn get_order(&self, id: &str) -> Result<Order, ApiError> {
        self.record(format!("get_order {id}"))?;
        Ok(order(id))
    }

    async fn create_order(&self, new_order: &NewOrder) -> Result<Order, ApiError> {
        self.record(format!(
            "create_order {} {}",
            new_order.name, new_order.advertiser_id
        ))?;
        Ok(Order {
            name: Some(new_order.name.clone()),
            advertiser_id: Some(new_order.advertiser_id.clone()),
            ..order("6")
        })
    }

    async fn list_line_items(&self, order_id: Option<&str>) -> Result<Vec<LineItem>, ApiError> {
        self.record(format!("list_line_items {order_id:?}"))?;
        Ok(vec![line_item("8", order_id)])
    }

    async fn get_line_item(&self, id: &str) -> Result<LineItem, ApiError> {
        self.record(format!("get_line_item {id}"))?;
        Ok(line_item(id, Some("5")))
    }

    async fn create_line_item(&self, new_line_item: &NewLineItem) -> Result<LineItem, ApiError> {
        self.record(format!(
            "create_line_item {} {:?}",
            new_line_item.name, new_line_item.order_id
        ))?;
        Ok(LineItem {
            name: Some(new_line_item.name.clone()),
            ..line_item("81", new_line_item.order_id.as_deref())
        })
    }

    async fn list_creatives(&self) -> Result<Vec<Creative>, ApiError> {
        self.record("list_creatives".to_string())?;
        Ok(vec![creative("3"), creative("4")])
    }

    async fn get_creative(&self, id: &str) -> Result<Creative, ApiError> {
        self.record(format!("get_creative {id}"))?;
        Ok(creative(id))
    }

    async fn run_report(&self, query: &ReportQuery) -> Result<ReportJob, ApiError> {
        self.record(format!("run_report {}", query.dimensions.join(",")))?;
        Ok(ReportJob {
            id: Some("555".to_string()),
            status: Some("IN_PROGRESS".to_string()),
            query: query.clone(),
        })
    }
}
