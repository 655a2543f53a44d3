//! Widget manifest (`manifest.json` inside the widget archive).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata a widget declares about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Application that owns the widget (e.g. "YouTrack").
    #[serde(default)]
    pub application_name: Option<String>,
    /// Icon path relative to the widget archive root.
    #[serde(default)]
    pub icon_path: Option<String>,
    #[serde(default)]
    pub capabilities: WidgetCapabilities,
}

/// Sandbox capabilities a widget asks for. Anything not declared is denied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetCapabilities {
    /// Navigate the top-level browsing context.
    #[serde(default)]
    pub top_navigation: bool,
    /// Open popups that escape the sandbox.
    #[serde(default)]
    pub popups: bool,
}

impl WidgetManifest {
    pub fn known_application(&self) -> Option<KnownApplication> {
        self.application_name
            .as_deref()
            .and_then(KnownApplication::from_application_name)
    }

    /// Picks the widget logo: the manifest icon, else the built-in icon of
    /// the owning application, else none.
    ///
    /// `archive_root` is the URL of the widget archive the icon path is
    /// relative to.
    pub fn resolve_logo(&self, archive_root: &str) -> Option<Logo> {
        if let Some(icon) = self.icon_path.as_deref().filter(|p| !p.is_empty()) {
            return Some(Logo::Url(format!(
                "{}/{}",
                archive_root.trim_end_matches('/'),
                icon.trim_start_matches('/')
            )));
        }
        self.known_application().map(Logo::BuiltIn)
    }
}

/// Applications with a built-in icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownApplication {
    Hub,
    YouTrack,
    Upsource,
    TeamCity,
}

impl KnownApplication {
    pub fn from_application_name(name: &str) -> Option<Self> {
        match name {
            "Hub" => Some(Self::Hub),
            "YouTrack" => Some(Self::YouTrack),
            "Upsource" => Some(Self::Upsource),
            "TeamCity" => Some(Self::TeamCity),
            _ => None,
        }
    }

    pub fn application_name(&self) -> &'static str {
        match self {
            Self::Hub => "Hub",
            Self::YouTrack => "YouTrack",
            Self::Upsource => "Upsource",
            Self::TeamCity => "TeamCity",
        }
    }

    /// Bundled icon resource for this application.
    pub fn icon_resource(&self) -> &'static str {
        match self {
            Self::Hub => "logos/hub.svg",
            Self::YouTrack => "logos/youtrack.svg",
            Self::Upsource => "logos/upsource.svg",
            Self::TeamCity => "logos/teamcity.svg",
        }
    }
}

/// Logo shown in the widget chrome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum Logo {
    /// Icon served from the widget archive.
    Url(String),
    BuiltIn(KnownApplication),
}

impl Logo {
    pub fn resource(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::BuiltIn(app) => app.icon_resource(),
        }
    }
}

impl fmt::Display for Logo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource())
    }
}
