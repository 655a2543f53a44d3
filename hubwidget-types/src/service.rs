//! Service descriptors published by the Hub service directory.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a Hub service.
///
/// Hub ids are strings; numeric ids sent by widgets are accepted and
/// compared by their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ServiceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for ServiceId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for ServiceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Signed(n) => Self(n.to_string()),
            RawId::Unsigned(n) => Self(n.to_string()),
        })
    }
}

/// One backend service registered in the Hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    pub id: ServiceId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub application_name: Option<String>,
    /// Base URL of the service; absent or empty means unreachable.
    #[serde(default)]
    pub home_url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl ServiceDescriptor {
    /// Returns the base URL when the service can be reached.
    pub fn base_url(&self) -> Option<&str> {
        self.home_url.as_deref().filter(|url| !url.is_empty())
    }

    pub fn is_reachable(&self) -> bool {
        self.base_url().is_some()
    }

    /// Whether the service passes an optional application-name filter.
    pub fn matches_application(&self, filter: Option<&str>) -> bool {
        match filter {
            None | Some("") => true,
            Some(name) => self.application_name.as_deref() == Some(name),
        }
    }

    /// Joins `relative_url` onto the service base URL.
    pub fn resolve_url(&self, relative_url: &str) -> Option<String> {
        self.base_url().map(|base| {
            format!(
                "{}/{}",
                base.trim_end_matches('/'),
                relative_url.trim_start_matches('/')
            )
        })
    }
}

/// Body of the Hub `services` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceList {
    #[serde(default)]
    pub services: Vec<ServiceDescriptor>,
}
