//! Integration tests for credential resolution and token minting.

use std::path::{Path, PathBuf};

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use admanager_mcp::auth::{CredentialResolver, Credentials, TokenProvider, DFP_SCOPE};
use admanager_mcp::error::AuthError;

const TEST_KEY: &str = include_str!("fixtures/test_service_account_key.pem");

fn write_service_account(dir: &Path, token_uri: &str) -> PathBuf {
    let path = dir.join("service-account.json");
    let key = json!({
        "type": "service_account",
        "project_id": "ads-project",
        "private_key_id": "kid-1",
        "private_key": TEST_KEY,
        "client_email": "bot@ads-project.iam.gserviceaccount.com",
        "token_uri": token_uri
    });
    std::fs::write(&path, key.to_string()).unwrap();
    path
}

#[tokio::test]
async fn service_account_override_mints_jwt_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "sa-token",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let key_path = write_service_account(dir.path(), &format!("{}/token", server.uri()));

    let resolver = CredentialResolver::new(Some(key_path), None, None, None);
    let resolved = resolver.resolve().await.unwrap();
    assert!(matches!(resolved.credentials, Credentials::ServiceAccount(_)));
    assert!(resolved.project_id.is_none(), "override files carry no project");

    let http = reqwest::Client::new();
    let tokens = TokenProvider::new(resolved.credentials, DFP_SCOPE, http);
    assert_eq!(tokens.access_token().await.unwrap(), "sa-token");
    // The second call is served from the cached token.
    assert_eq!(tokens.access_token().await.unwrap(), "sa-token");
}

#[tokio::test]
async fn default_chain_reports_project_id() {
    let dir = tempfile::tempdir().unwrap();
    let key_path = write_service_account(dir.path(), "https://oauth2.googleapis.com/token");

    let resolver = CredentialResolver::new(
        Some(dir.path().join("missing.json")),
        Some(key_path),
        None,
        None,
    );
    let resolved = resolver.resolve().await.unwrap();
    assert_eq!(resolved.project_id.as_deref(), Some("ads-project"));
}

#[tokio::test]
async fn rejected_token_request_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid JWT signature."
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let key_path = write_service_account(dir.path(), &format!("{}/token", server.uri()));
    let resolved = CredentialResolver::new(Some(key_path), None, None, None)
        .resolve()
        .await
        .unwrap();

    let tokens = TokenProvider::new(resolved.credentials, DFP_SCOPE, reqwest::Client::new());
    match tokens.access_token().await.unwrap_err() {
        AuthError::TokenRejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid JWT signature.");
        }
        other => panic!("expected TokenRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn metadata_server_is_used_last() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/computeMetadata/v1/project/project-id"))
        .and(header("Metadata-Flavor", "Google"))
        .respond_with(ResponseTemplate::new(200).set_body_string("gce-project"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/computeMetadata/v1/instance/service-accounts/default/token",
        ))
        .and(header("Metadata-Flavor", "Google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "gce-token",
            "expires_in": 1800
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let resolver = CredentialResolver::new(
        None,
        None,
        Some(dir.path().join("application_default_credentials.json")),
        Some(server.uri()),
    );
    let resolved = resolver.resolve().await.unwrap();
    assert!(matches!(resolved.credentials, Credentials::Metadata { .. }));
    assert_eq!(resolved.project_id.as_deref(), Some("gce-project"));

    let tokens = TokenProvider::new(resolved.credentials, DFP_SCOPE, reqwest::Client::new());
    assert_eq!(tokens.access_token().await.unwrap(), "gce-token");
}

#[tokio::test]
async fn no_source_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = CredentialResolver::new(
        Some(dir.path().join("missing.json")),
        None,
        Some(dir.path().join("also-missing.json")),
        None,
    );
    let err = resolver.resolve().await.unwrap_err();
    assert!(matches!(err, AuthError::NoCredentials(_)));
}

#[tokio::test]
async fn broken_override_file_is_not_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("broken.json");
    std::fs::write(&key_path, r#"{"type": "external_account"}"#).unwrap();

    let err = CredentialResolver::new(Some(key_path), None, None, None)
        .resolve()
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidKeyFile { .. }));
}
