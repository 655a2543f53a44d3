//! Core type definitions for hubwidget.
//!
//! This crate defines the data shared between the host bridge and its
//! tooling:
//! - Installation properties and the Hub handshake configuration derived from them
//! - Service descriptors returned by the Hub service directory
//! - Widget manifests and the application/logo mapping
//! - Request parameters for proxied calls
//!
//! Nothing here performs I/O beyond reading a properties file.

mod installation;
mod manifest;
mod request;
mod service;

pub use installation::{
    ANONYMOUS_CLIENT_ID, DEFAULT_HEIGHT, DEFAULT_WIDTH, HubConfig, HubConfigField,
    InstallationProperties, RequestCredentials,
};
pub use manifest::{KnownApplication, Logo, WidgetCapabilities, WidgetManifest};
pub use request::RequestParams;
pub use service::{ServiceDescriptor, ServiceId, ServiceList};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or validating hubwidget types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid installation properties: {0}")]
    InvalidProperties(String),
}
