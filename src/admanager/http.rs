//! Shared HTTP plumbing for both clients.
//!
//! Thin wrapper around `reqwest::Client` that attaches a bearer token to
//! every request.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};

use crate::auth::TokenProvider;
use crate::error::{ApiError, ClientError};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Builds the HTTP client used for API and token requests.
///
/// # Errors
///
/// Returns [`ClientError::Init`] if the TLS backend cannot be initialised.
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<Client, ClientError> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ClientError::Init(format!("failed to build HTTP client: {e}")))
}

/// HTTP client that authorizes requests with OAuth2 bearer tokens.
pub struct AuthorizedHttp {
    inner: Client,
    tokens: TokenProvider,
}

impl AuthorizedHttp {
    #[must_use]
    pub const fn new(inner: Client, tokens: TokenProvider) -> Self {
        Self { inner, tokens }
    }

    /// Starts a GET request.
    #[must_use]
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.inner.get(url)
    }

    /// Starts a POST request.
    #[must_use]
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.inner.post(url)
    }

    /// Adds the bearer token and sends the request.
    ///
    /// # Errors
    ///
    /// Returns an error if no token can be obtained or the request cannot be
    /// sent. HTTP error statuses are returned as responses, not errors.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let token = self.tokens.access_token().await?;
        Ok(request.bearer_auth(token).send().await?)
    }

    /// The scope tokens are minted for.
    #[must_use]
    pub fn scope(&self) -> &str {
        self.tokens.scope()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;

    #[test]
    fn client_builds_with_timeout() {
        assert!(build_http_client(5, "admanager-mcp/test").is_ok());
    }

    #[test]
    fn scope_comes_from_token_provider() {
        let http = build_http_client(5, "admanager-mcp/test").unwrap();
        let tokens = TokenProvider::new(
            Credentials::Metadata {
                host: "http://127.0.0.1:1".to_string(),
            },
            crate::auth::DFP_SCOPE,
            http.clone(),
        );
        let authorized = AuthorizedHttp::new(http, tokens);
        assert_eq!(authorized.scope(), crate::auth::DFP_SCOPE);
    }
}
