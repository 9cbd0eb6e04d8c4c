//! Error types for admanager-mcp.
//!
//! # Security Note
//!
//! Error messages are carefully crafted to NEVER include credentials.
//! Token endpoint failures report the HTTP status and the OAuth2 error code
//! only, never the assertion or refresh token that was sent.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Credential resolution or token minting failed.
#[derive(Error, Debug)]
pub enum AuthError {
    /// A credential file could not be read.
    #[error("failed to read credential file: {path}")]
    Read {
        /// Path to the credential file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A credential file is not a recognised key file.
    #[error("invalid credential file {path}: {message}")]
    InvalidKeyFile {
        /// Path to the credential file.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// The service-account private key could not be used for signing.
    #[error("failed to sign service account assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// The token endpoint could not be reached.
    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The token endpoint rejected the request.
    #[error("token endpoint returned {status}: {message}")]
    TokenRejected {
        /// HTTP status code.
        status: u16,
        /// OAuth2 error code or status text.
        message: String,
    },

    /// No credential source in the default chain produced a credential.
    #[error("无法获取认证凭据: no credentials found ({0})")]
    NoCredentials(String),
}

/// The Ad Manager client could not be constructed.
#[derive(Error, Debug)]
pub enum ClientError {
    /// No permitted client implementation is compiled into this binary.
    #[error("Ad Manager client unavailable: {0}")]
    Unavailable(String),

    /// A client implementation was selected but failed to initialise.
    #[error("无法初始化Ad Manager客户端: {0}")]
    Init(String),
}

impl From<AuthError> for ClientError {
    fn from(err: AuthError) -> Self {
        Self::Init(err.to_string())
    }
}

/// A call to the remote Ad Manager API failed.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error("request to Ad Manager failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success HTTP status.
    #[error("Ad Manager returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },

    /// The legacy API answered with a SOAP fault.
    #[error("Ad Manager SOAP fault: {0}")]
    Fault(String),

    /// The response body did not have the expected shape.
    #[error("unexpected Ad Manager response: {0}")]
    Decode(String),

    /// The requested entity does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Entity kind, e.g. "ad unit".
        kind: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// The operation needs a network code and none is configured.
    #[error("需要设置 GOOGLE_ADMANAGER_NETWORK_CODE 环境变量")]
    MissingNetworkCode,

    /// An identifier was not the numeric id the API expects.
    #[error("invalid {field}: {value:?} is not a numeric id")]
    InvalidId {
        /// Argument name.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A bearer token could not be obtained.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// An input line that is not a usable JSON-RPC message.
#[derive(Error, Debug)]
pub enum MessageError {
    /// The line is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The line is valid JSON but not an object.
    #[error("message is not a JSON object")]
    NotAnObject,
}

/// Generic message for a missing argument or an unsupported action.
pub const MISSING_OR_UNSUPPORTED: &str = "缺少必需参数或操作不支持";

/// Errors raised by a tool handler, converted into a failure envelope.
#[derive(Error, Debug)]
pub enum ToolError {
    /// A field required by the requested action is absent.
    #[error("{}", MISSING_OR_UNSUPPORTED)]
    MissingArgument(&'static str),

    /// A field is present but malformed.
    #[error("{}", MISSING_OR_UNSUPPORTED)]
    InvalidArgument {
        /// Argument name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The action is not one the tool supports.
    #[error("{}", MISSING_OR_UNSUPPORTED)]
    UnsupportedAction(String),

    /// The client never came up at startup.
    #[error("{0}")]
    ClientUnavailable(String),

    /// The remote API call failed.
    #[error(transparent)]
    Remote(#[from] ApiError),
}

impl ToolError {
    /// English explanation attached to the generic envelope message.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::MissingArgument(field) => Some(format!("missing required parameter: {field}")),
            Self::InvalidArgument { field, reason } => Some(format!("invalid {field}: {reason}")),
            Self::UnsupportedAction(action) => Some(format!("unsupported action: {action}")),
            Self::ClientUnavailable(_) | Self::Remote(_) => None,
        }
    }
}
