//! Installation properties supplied by the embedding page, and the Hub
//! handshake configuration derived from them.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Client id used when the embedding page does not register its own.
pub const ANONYMOUS_CLIENT_ID: &str = "0-0-0-0-0";

/// Default widget container width in pixels.
pub const DEFAULT_WIDTH: u32 = 290;

/// Default widget body height in pixels.
pub const DEFAULT_HEIGHT: u32 = 265;

/// Widget identity and host environment for one embedded instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationProperties {
    /// Widget package name as registered in the Hub.
    pub widget_name: String,
    /// Base URL of the Hub (identity and service-directory server).
    pub hub_base_url: String,
    /// OAuth client id; the anonymous client is used when absent.
    #[serde(default)]
    pub auth_client_id: Option<String>,
    /// OAuth redirect URI; the embedding page location is used when absent.
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Selector of the element the widget container is mounted into.
    #[serde(default = "default_dom_container")]
    pub dom_container: String,
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_dom_container() -> String {
    "#widget".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

impl InstallationProperties {
    /// Creates properties with defaults for everything but the widget and Hub.
    pub fn new(widget_name: impl Into<String>, hub_base_url: impl Into<String>) -> Self {
        Self {
            widget_name: widget_name.into(),
            hub_base_url: hub_base_url.into(),
            auth_client_id: None,
            redirect_uri: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            dom_container: default_dom_container(),
            locale: default_locale(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let props: Self = serde_json::from_str(json)?;
        props.validate()?;
        Ok(props)
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let props: Self = toml::from_str(source)?;
        props.validate()?;
        Ok(props)
    }

    /// Loads properties from a `.toml` or `.json` file, chosen by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&contents),
            _ => Self::from_json_str(&contents),
        }
    }

    /// Checks the fields every instantiation depends on.
    pub fn validate(&self) -> Result<()> {
        if self.widget_name.trim().is_empty() {
            return Err(Error::InvalidProperties("widgetName is required".into()));
        }
        if self.widget_name.contains('/') {
            return Err(Error::InvalidProperties(format!(
                "widgetName '{}' must not contain '/'",
                self.widget_name
            )));
        }
        if !(self.hub_base_url.starts_with("http://") || self.hub_base_url.starts_with("https://"))
        {
            return Err(Error::InvalidProperties(format!(
                "hubBaseUrl '{}' must be an http(s) URL",
                self.hub_base_url
            )));
        }
        Ok(())
    }

    /// Hub base URL without a trailing slash.
    pub fn hub_root(&self) -> &str {
        self.hub_base_url.trim_end_matches('/')
    }
}

/// Credential mode passed to the identity handshake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestCredentials {
    /// Never prompt for credentials; fall back to an anonymous session.
    #[default]
    Skip,
    Default,
    Required,
}

/// Parameters of the identity handshake, derived from installation properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubConfig {
    pub server_uri: String,
    pub client_id: String,
    pub scope: Vec<String>,
    pub redirect_uri: String,
    pub request_credentials: RequestCredentials,
    pub reload_on_user_change: bool,
    pub embedded_login: bool,
}

impl HubConfig {
    /// Derives the handshake configuration for one widget instance.
    ///
    /// `page_location` is the embedding page's origin and path; it is the
    /// redirect target when the properties do not name one.
    pub fn derive(props: &InstallationProperties, page_location: &str) -> Self {
        let client_id = props
            .auth_client_id
            .clone()
            .unwrap_or_else(|| ANONYMOUS_CLIENT_ID.to_string());

        Self {
            server_uri: props.hub_base_url.clone(),
            scope: vec![client_id.clone()],
            client_id,
            redirect_uri: props
                .redirect_uri
                .clone()
                .unwrap_or_else(|| page_location.to_string()),
            request_credentials: RequestCredentials::Skip,
            reload_on_user_change: false,
            embedded_login: true,
        }
    }

    /// The single scope entry; empty when no scope is configured.
    pub fn primary_scope(&self) -> &str {
        self.scope.first().map(String::as_str).unwrap_or("")
    }

    /// Fields that must agree across every widget sharing one page, in
    /// comparison order.
    pub fn identity_fields(&self) -> [(HubConfigField, &str); 4] {
        [
            (HubConfigField::ServerUri, self.server_uri.as_str()),
            (HubConfigField::ClientId, self.client_id.as_str()),
            (HubConfigField::RedirectUri, self.redirect_uri.as_str()),
            (HubConfigField::Scope, self.primary_scope()),
        ]
    }

    pub fn is_anonymous_client(&self) -> bool {
        self.client_id == ANONYMOUS_CLIENT_ID
    }
}

/// Identity field of a [`HubConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HubConfigField {
    ServerUri,
    ClientId,
    RedirectUri,
    Scope,
}

impl HubConfigField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServerUri => "serverUri",
            Self::ClientId => "clientId",
            Self::RedirectUri => "redirectUri",
            Self::Scope => "scope[0]",
        }
    }
}

impl fmt::Display for HubConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
