//! Google Ad Manager API clients.
//!
//! Two implementations sit behind the [`AdManagerApi`] trait:
//!
//! - [`rest::RestClient`] for the Ad Manager REST API (`rest-client` feature)
//! - [`soap::SoapClient`] for the legacy SOAP API (`legacy-client` feature)
//!
//! [`connect`] picks one according to the configured [`ClientPreference`]
//! and builds it once at startup.

#[cfg(any(feature = "rest-client", feature = "legacy-client"))]
pub mod http;
pub mod model;
#[cfg(feature = "rest-client")]
pub mod rest;
#[cfg(feature = "legacy-client")]
pub mod soap;

use std::fmt;

use async_trait::async_trait;

use crate::admanager::model::{
    AdUnit, Creative, LineItem, Network, NewAdUnit, NewLineItem, NewOrder, Order, ReportJob,
    ReportQuery,
};
use crate::auth::CredentialResolver;
use crate::config::{ClientPreference, Config};
use crate::error::{ApiError, ClientError};

/// Operations the tool handlers need from Ad Manager.
///
/// List calls return the first page only.
#[async_trait]
pub trait AdManagerApi: Send + Sync {
    /// Which implementation this is.
    fn kind(&self) -> ClientKind;

    /// The network the credentials are scoped to.
    async fn current_network(&self) -> Result<Network, ApiError>;

    /// All networks the credentials can access.
    async fn list_networks(&self) -> Result<Vec<Network>, ApiError>;

    /// Ad units, optionally restricted to the children of `parent_id`.
    async fn list_ad_units(&self, parent_id: Option<&str>) -> Result<Vec<AdUnit>, ApiError>;

    /// Looks up one ad unit by id.
    async fn get_ad_unit(&self, id: &str) -> Result<AdUnit, ApiError>;

    /// Creates an ad unit and returns it as stored.
    async fn create_ad_unit(&self, ad_unit: &NewAdUnit) -> Result<AdUnit, ApiError>;

    /// Orders visible to the network.
    async fn list_orders(&self) -> Result<Vec<Order>, ApiError>;

    /// Looks up one order by id.
    async fn get_order(&self, id: &str) -> Result<Order, ApiError>;

    /// Creates a draft order.
    async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError>;

    /// Line items, optionally restricted to one order.
    async fn list_line_items(&self, order_id: Option<&str>) -> Result<Vec<LineItem>, ApiError>;

    /// Looks up one line item by id.
    async fn get_line_item(&self, id: &str) -> Result<LineItem, ApiError>;

    /// Creates a placeholder line item.
    async fn create_line_item(&self, line_item: &NewLineItem) -> Result<LineItem, ApiError>;

    /// Creatives visible to the network.
    async fn list_creatives(&self) -> Result<Vec<Creative>, ApiError>;

    /// Looks up one creative by id.
    async fn get_creative(&self, id: &str) -> Result<Creative, ApiError>;

    /// Submits a report job. Does not wait for it to finish.
    async fn run_report(&self, query: &ReportQuery) -> Result<ReportJob, ApiError>;
}

/// The client implementation in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    /// Ad Manager REST API.
    Rest,
    /// Legacy SOAP API.
    Legacy,
}

impl ClientKind {
    /// Name used in logs and help output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rest => "rest",
            Self::Legacy => "legacy",
        }
    }

    /// Whether this implementation is compiled into the binary.
    #[must_use]
    pub const fn is_compiled(self) -> bool {
        match self {
            Self::Rest => cfg!(feature = "rest-client"),
            Self::Legacy => cfg!(feature = "legacy-client"),
        }
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chooses the implementation to build for `preference`.
///
/// `Auto` prefers REST and falls back to legacy when REST is not compiled in.
///
/// # Errors
///
/// Returns [`ClientError::Unavailable`] if no permitted implementation is
/// compiled in.
pub fn select_kind(preference: ClientPreference) -> Result<ClientKind, ClientError> {
    let candidates: &[ClientKind] = match preference {
        ClientPreference::Auto => &[ClientKind::Rest, ClientKind::Legacy],
        ClientPreference::Rest => &[ClientKind::Rest],
        ClientPreference::Legacy => &[ClientKind::Legacy],
    };

    candidates
        .iter()
        .copied()
        .find(|kind| kind.is_compiled())
        .ok_or_else(|| {
            let wanted: Vec<&str> = candidates.iter().map(|k| k.as_str()).collect();
            ClientError::Unavailable(format!(
                "this build does not include the {} client",
                wanted.join(" or ")
            ))
        })
}

/// Resolves credentials and builds the client selected by `config.client`.
///
/// # Errors
///
/// Returns [`ClientError::Unavailable`] if no permitted implementation is
/// compiled in, or [`ClientError::Init`] if credentials cannot be resolved or
/// the client cannot be constructed.
pub async fn connect(
    config: &Config,
    resolver: &CredentialResolver,
) -> Result<Box<dyn AdManagerApi>, ClientError> {
    let kind = select_kind(config.client)?;
    tracing::debug!(client = %kind, preference = ?config.client, "Selected Ad Manager client");

    let resolved = resolver.resolve().await?;
    tracing::info!(
        credentials = %resolved.credentials.describe(),
        project = resolved.project_id.as_deref().unwrap_or("unknown"),
        "Resolved credentials"
    );

    match kind {
        #[cfg(feature = "rest-client")]
        ClientKind::Rest => {
            let client = rest::RestClient::connect(config, resolved.credentials)?;
            Ok(Box::new(client))
        }
        #[cfg(feature = "legacy-client")]
        ClientKind::Legacy => {
            let client = soap::SoapClient::connect(config, resolved.credentials)?;
            Ok(Box::new(client))
        }
        #[allow(unreachable_patterns)]
        other => Err(ClientError::Unavailable(format!(
            "this build does not include the {other} client"
        ))),
    }
}

/// Extracts the trailing id from a resource name such as
/// `networks/123/adUnits/456`. Plain ids are returned unchanged.
#[must_use]
pub fn resource_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
