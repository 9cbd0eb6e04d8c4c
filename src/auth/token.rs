//! OAuth2 bearer tokens for Ad Manager requests.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::auth::keys::{AuthorizedUserKey, ServiceAccountKey};
use crate::auth::Credentials;
use crate::error::AuthError;

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Lifetime requested for service-account assertions.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

const fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Default, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Mints bearer tokens for one credential and one scope.
pub struct TokenProvider {
    credentials: Credentials,
    scope: String,
    http: reqwest::Client,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenProvider {
    /// Creates a provider. No request is made until a token is needed.
    #[must_use]
    pub fn new(credentials: Credentials, scope: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            credentials,
            scope: scope.into(),
            http,
            cached: Mutex::new(None),
        }
    }

    /// The OAuth2 scope tokens are requested for.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns a valid access token, minting a new one when needed.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails or the token endpoint rejects the
    /// request.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let now = Utc::now();
        if let Some(token) = self
            .cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|t| t.is_fresh(now))
        {
            return Ok(token.value.clone());
        }

        let token = match &self.credentials {
            Credentials::ServiceAccount(key) => self.mint_service_account(key, now).await?,
            Credentials::AuthorizedUser(key) => self.mint_authorized_user(key, now).await?,
            Credentials::Metadata { host } => self.mint_metadata(host, now).await?,
        };
        tracing::debug!(expires_at = %token.expires_at, "Minted access token");

        let value = token.value.clone();
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = Some(token);
        Ok(value)
    }

    async fn mint_service_account(
        &self,
        key: &ServiceAccountKey,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, AuthError> {
        let assertion = sign_assertion(key, &self.scope, now)?;
        let response = self
            .http
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        read_token_response(response, now).await
    }

    async fn mint_authorized_user(
        &self,
        key: &AuthorizedUserKey,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, AuthError> {
        let response = self
            .http
            .post(&key.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", key.client_id.as_str()),
                ("client_secret", key.client_secret.as_str()),
                ("refresh_token", key.refresh_token.as_str()),
            ])
            .send()
            .await?;
        read_token_response(response, now).await
    }

    async fn mint_metadata(&self, host: &str, now: DateTime<Utc>) -> Result<AccessToken, AuthError> {
        let url = format!("{host}/computeMetadata/v1/instance/service-accounts/default/token");
        let response = self
            .http
            .get(url)
            .query(&[("scopes", self.scope.as_str())])
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;
        read_token_response(response, now).await
    }
}

/// Builds the RS256-signed JWT assertion for a service account.
fn sign_assertion(
    key: &ServiceAccountKey,
    scope: &str,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid.clone_from(&key.private_key_id);

    let claims = AssertionClaims {
        iss: &key.client_email,
        scope,
        aud: &key.token_uri,
        iat: now.timestamp(),
        exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
    };

    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
    Ok(jsonwebtoken::encode(&header, &claims, &signing_key)?)
}

async fn read_token_response(
    response: reqwest::Response,
    now: DateTime<Utc>,
) -> Result<AccessToken, AuthError> {
    let status = response.status();
    if !status.is_success() {
        let body: TokenErrorResponse = response.json().await.unwrap_or_default();
        let message = body
            .error_description
            .or(body.error)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
        return Err(AuthError::TokenRejected {
            status: status.as_u16(),
            message,
        });
    }

    let token: TokenResponse = response.json().await?;
    Ok(AccessToken {
        value: token.access_token,
        expires_at: now + Duration::seconds(token.expires_in),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_freshness_respects_margin() {
        let now = Utc::now();
        let fresh = AccessToken {
            value: "a".to_string(),
            expires_at: now + Duration::seconds(3600),
        };
        let stale = AccessToken {
            value: "b".to_string(),
            expires_at: now + Duration::seconds(30),
        };
        assert!(fresh.is_fresh(now));
        assert!(!stale.is_fresh(now));
    }

    #[test]
    fn sign_assertion_rejects_garbage_key() {
        let key = ServiceAccountKey {
            client_email: "bot@example.iam.gserviceaccount.com".to_string(),
            private_key: "not a pem".to_string(),
            private_key_id: None,
            token_uri: crate::auth::keys::DEFAULT_TOKEN_URI.to_string(),
            project_id: None,
        };
        let err = sign_assertion(&key, "scope", Utc::now()).unwrap_err();
        assert!(matches!(err, AuthError::Signing(_)));
    }

    #[test]
    fn sign_assertion_produces_three_part_jwt() {
        let key = ServiceAccountKey {
            client_email: "bot@example.iam.gserviceaccount.com".to_string(),
            private_key: include_str!("../../tests/fixtures/test_service_account_key.pem")
                .to_string(),
            private_key_id: Some("kid-1".to_string()),
            token_uri: crate::auth::keys::DEFAULT_TOKEN_URI.to_string(),
            project_id: None,
        };
        let jwt = sign_assertion(&key, "https://www.googleapis.com/auth/dfp", Utc::now()).unwrap();
        assert_eq!(jwt.split('.').count(), 3);
        let header = jsonwebtoken::decode_header(&jwt).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("kid-1"));
    }
}
