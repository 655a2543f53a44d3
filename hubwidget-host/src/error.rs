//! Error types for the widget host.

use hubwidget_types::{HubConfigField, ServiceId};
use serde_json::{Value, json};
use thiserror::Error;

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;

/// A widget tried to join a page whose adopted Hub configuration differs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "widget '{widget}' has {field} '{candidate}' but the page already uses '{adopted}'; \
     all widgets on one page must share one Hub configuration"
)]
pub struct ConfigMismatchError {
    pub widget: String,
    pub field: HubConfigField,
    pub adopted: String,
    pub candidate: String,
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("configuration mismatch: {0}")]
    ConfigMismatch(#[from] ConfigMismatchError),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error(transparent)]
    InvalidProperties(#[from] hubwidget_types::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(
        "Could not find service with ID \"{0}\". Make sure it is requested in widget's manifest."
    )]
    ServiceNotFound(ServiceId),

    #[error("sandbox transport error: {0}")]
    Transport(String),

    #[error("widget '{0}' has no active refresh control")]
    RefreshUnavailable(String),

    #[error("lifecycle violation for widget '{widget}': {detail}")]
    Lifecycle { widget: String, detail: String },
}

/// Failure returned to the embedded widget by a capability call.
///
/// Faults are ordinary values on the wire; they never abort the widget or
/// the embedding page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityFault {
    #[error(
        "Could not find service with ID \"{service_id}\". Make sure it is requested in widget's manifest."
    )]
    ServiceNotFound { service_id: ServiceId },

    #[error("request failed: {message}")]
    Request {
        message: String,
        status: Option<u16>,
    },

    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("invalid arguments for '{operation}': {message}")]
    InvalidArguments { operation: String, message: String },
}

impl CapabilityFault {
    /// Stable error name the widget can switch on.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ServiceNotFound { .. } => "ServiceNotFoundError",
            Self::Request { .. } => "RequestError",
            Self::UnknownOperation(_) => "UnknownOperationError",
            Self::InvalidArguments { .. } => "InvalidArgumentsError",
        }
    }

    /// Wire form: `{name, message}` plus `status` for HTTP failures.
    pub fn to_wire(&self) -> Value {
        let mut wire = json!({
            "name": self.name(),
            "message": self.to_string(),
        });
        if let Self::Request {
            status: Some(status),
            ..
        } = self
        {
            wire["status"] = json!(status);
        }
        wire
    }

    pub(crate) fn invalid_arguments(operation: &str, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

impl From<HostError> for CapabilityFault {
    fn from(err: HostError) -> Self {
        match err {
            HostError::ServiceNotFound(service_id) => Self::ServiceNotFound { service_id },
            HostError::Status { status, .. } => Self::Request {
                message: err.to_string(),
                status: Some(status),
            },
            other => Self::Request {
                message: other.to_string(),
                status: None,
            },
        }
    }
}
