//! Credential resolution for the Ad Manager APIs.
//!
//! # Resolution Order
//!
//! 1. The override path (`GOOGLE_APPLICATION_CREDS` or `credentials_path` in
//!    the config file), if it names an existing file
//! 2. The default chain:
//!    - `GOOGLE_APPLICATION_CREDENTIALS`
//!    - the gcloud well-known file
//!      (`~/.config/gcloud/application_default_credentials.json`)
//!    - the GCE metadata server
//!
//! A credential loaded through the override path never carries a project id;
//! credentials from the default chain report the project recorded with them.

pub mod keys;
pub mod token;

pub use keys::{AuthorizedUserKey, KeyFile, ServiceAccountKey};
pub use token::TokenProvider;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AuthError;

/// OAuth2 scope of the legacy SOAP API.
pub const DFP_SCOPE: &str = "https://www.googleapis.com/auth/dfp";

/// OAuth2 scope of the REST API.
pub const ADMANAGER_SCOPE: &str = "https://www.googleapis.com/auth/admanager";

/// Standard ADC environment variable of the Google client libraries.
pub const ENV_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Overrides the metadata server host.
pub const ENV_METADATA_HOST: &str = "GCE_METADATA_HOST";

const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

const METADATA_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// A credential that can be turned into bearer tokens.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Service-account key.
    ServiceAccount(ServiceAccountKey),
    /// Refresh-token credential from gcloud.
    AuthorizedUser(AuthorizedUserKey),
    /// The GCE metadata server; `host` includes the scheme.
    Metadata {
        /// Base URL of the metadata server.
        host: String,
    },
}

impl From<KeyFile> for Credentials {
    fn from(key: KeyFile) -> Self {
        match key {
            KeyFile::ServiceAccount(key) => Self::ServiceAccount(key),
            KeyFile::AuthorizedUser(key) => Self::AuthorizedUser(key),
        }
    }
}

impl Credentials {
    /// Short description for logs, e.g. the service account e-mail.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::ServiceAccount(key) => format!("service account {}", key.client_email),
            Self::AuthorizedUser(_) => "authorized user".to_string(),
            Self::Metadata { host } => format!("metadata server {host}"),
        }
    }
}

/// Result of credential resolution.
#[derive(Debug, Clone)]
pub struct ResolvedCredentials {
    /// The credential itself.
    pub credentials: Credentials,
    /// Project associated with the credential, if known.
    pub project_id: Option<String>,
}

/// Locates credentials following the resolution order above.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    override_path: Option<PathBuf>,
    adc_path: Option<PathBuf>,
    well_known_path: Option<PathBuf>,
    metadata_host: Option<String>,
}

impl CredentialResolver {
    /// Builds a resolver from the process environment.
    #[must_use]
    pub fn from_env(override_path: Option<&Path>) -> Self {
        let metadata_host = std::env::var(ENV_METADATA_HOST)
            .ok()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string());

        Self {
            override_path: override_path.map(Path::to_path_buf),
            adc_path: std::env::var_os(ENV_APPLICATION_CREDENTIALS)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            well_known_path: well_known_credentials_path(),
            metadata_host: Some(format!("http://{metadata_host}")),
        }
    }

    /// Builds a resolver with explicit sources. `None` disables a source.
    #[must_use]
    pub const fn new(
        override_path: Option<PathBuf>,
        adc_path: Option<PathBuf>,
        well_known_path: Option<PathBuf>,
        metadata_host: Option<String>,
    ) -> Self {
        Self {
            override_path,
            adc_path,
            well_known_path,
            metadata_host,
        }
    }

    /// Resolves a credential.
    ///
    /// # Errors
    ///
    /// Returns an error if a chosen key file is unreadable or invalid, or if
    /// no source yields a credential.
    pub async fn resolve(&self) -> Result<ResolvedCredentials, AuthError> {
        if let Some(path) = &self.override_path {
            if path.exists() {
                tracing::info!(path = %path.display(), "Using credential file");
                let key = KeyFile::load(path)?;
                return Ok(ResolvedCredentials {
                    credentials: key.into(),
                    project_id: None,
                });
            }
            tracing::warn!(
                path = %path.display(),
                "Credential file does not exist, falling back to default credentials"
            );
        } else {
            tracing::info!("No credential file configured, using default credentials");
        }

        self.resolve_default().await
    }

    async fn resolve_default(&self) -> Result<ResolvedCredentials, AuthError> {
        if let Some(path) = &self.adc_path {
            // An explicit ADC path that is broken is an error, not a fallthrough.
            return Self::from_key_file(path);
        }

        if let Some(path) = self.well_known_path.as_ref().filter(|p| p.exists()) {
            return Self::from_key_file(path);
        }

        if let Some(host) = &self.metadata_host {
            if let Some(project_id) = probe_metadata(host).await {
                tracing::info!(host = %host, "Using metadata server credentials");
                return Ok(ResolvedCredentials {
                    credentials: Credentials::Metadata { host: host.clone() },
                    project_id,
                });
            }
        }

        Err(AuthError::NoCredentials(format!(
            "set {ENV_APPLICATION_CREDENTIALS} or run `gcloud auth application-default login`"
        )))
    }

    fn from_key_file(path: &Path) -> Result<ResolvedCredentials, AuthError> {
        tracing::info!(path = %path.display(), "Using application default credentials");
        let key = KeyFile::load(path)?;
        let project_id = key.project_id().map(str::to_string);
        Ok(ResolvedCredentials {
            credentials: key.into(),
            project_id,
        })
    }
}

/// Path of the gcloud application-default credentials file.
#[must_use]
pub fn well_known_credentials_path() -> Option<PathBuf> {
    let base = if cfg!(windows) {
        dirs::config_dir()
    } else {
        dirs::home_dir().map(|home| home.join(".config"))
    };
    base.map(|dir| {
        dir.join("gcloud")
            .join("application_default_credentials.json")
    })
}

/// Checks for a metadata server, returning `Some(project_id)` if one answers.
async fn probe_metadata(host: &str) -> Option<Option<String>> {
    let client = reqwest::Client::builder()
        .timeout(METADATA_PROBE_TIMEOUT)
        .build()
        .ok()?;
    let response = client
        .get(format!("{host}/computeMetadata/v1/project/project-id"))
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .ok()?;

    if !response.status().is_success() {
        return None;
    }
    let project_id = response.text().await.ok().filter(|p| !p.is_empty());
    Some(project_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_authorized_user(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(
            &path,
            r#"{
                "type": "authorized_user",
                "client_id": "id",
                "client_secret": "secret",
                "refresh_token": "refresh",
                "quota_project_id": "quota"
            }"#,
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn override_file_wins_and_has_no_project() {
        let dir = tempfile::tempdir().unwrap();
        let override_path = write_authorized_user(dir.path(), "override.json");
        let adc = write_authorized_user(dir.path(), "adc.json");

        let resolver = CredentialResolver::new(Some(override_path), Some(adc), None, None);
        let resolved = resolver.resolve().await.unwrap();
        assert!(matches!(resolved.credentials, Credentials::AuthorizedUser(_)));
        assert!(resolved.project_id.is_none());
    }

    #[tokio::test]
    async fn missing_override_falls_back_to_adc() {
        let dir = tempfile::tempdir().unwrap();
        let adc = write_authorized_user(dir.path(), "adc.json");

        let resolver = CredentialResolver::new(
            Some(dir.path().join("does-not-exist.json")),
            Some(adc),
            None,
            None,
        );
        let resolved = resolver.resolve().await.unwrap();
        assert_eq!(resolved.project_id.as_deref(), Some("quota"));
    }

    #[tokio::test]
    async fn well_known_file_is_used_when_nothing_else_is_set() {
        let dir = tempfile::tempdir().unwrap();
        let well_known = write_authorized_user(dir.path(), "application_default_credentials.json");

        let resolver = CredentialResolver::new(None, None, Some(well_known), None);
        let resolved = resolver.resolve().await.unwrap();
        assert!(matches!(resolved.credentials, Credentials::AuthorizedUser(_)));
    }

    #[tokio::test]
    async fn broken_adc_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let resolver =
            CredentialResolver::new(None, Some(dir.path().join("missing.json")), None, None);
        let err = resolver.resolve().await.unwrap_err();
        assert!(matches!(err, AuthError::Read { .. }));
    }

    #[tokio::test]
    async fn no_sources_is_an_error() {
        let resolver = CredentialResolver::new(None, None, None, None);
        let err = resolver.resolve().await.unwrap_err();
        assert!(matches!(err, AuthError::NoCredentials(_)));
    }

    #[test]
    fn well_known_path_points_at_gcloud() {
        let path = well_known_credentials_path().unwrap();
        assert!(path.ends_with("gcloud/application_default_credentials.json"));
    }
}
