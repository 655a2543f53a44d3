//! Loads widget manifests from the Hub widget archive.

use crate::auth::HubClient;
use crate::endpoints;
use crate::error::HostResult;
use hubwidget_types::{Logo, WidgetCapabilities, WidgetManifest};
use tracing::info;

/// A manifest fetched from the Hub for one widget.
///
/// Only [`ManifestLoader`] produces these, so holding one proves the
/// manifest request completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedManifest {
    widget_name: String,
    manifest: WidgetManifest,
    logo: Option<Logo>,
}

impl LoadedManifest {
    pub fn widget_name(&self) -> &str {
        &self.widget_name
    }

    pub fn manifest(&self) -> &WidgetManifest {
        &self.manifest
    }

    pub fn capabilities(&self) -> &WidgetCapabilities {
        &self.manifest.capabilities
    }

    pub fn application_name(&self) -> Option<&str> {
        self.manifest.application_name.as_deref()
    }

    /// Logo for the widget chrome, already resolved against the archive.
    pub fn logo(&self) -> Option<&Logo> {
        self.logo.as_ref()
    }
}

pub struct ManifestLoader<'a> {
    hub: &'a HubClient,
}

impl<'a> ManifestLoader<'a> {
    pub fn new(hub: &'a HubClient) -> Self {
        Self { hub }
    }

    /// Fetches `manifest.json` of `widget_name` and resolves its logo.
    pub async fn load_manifest(&self, widget_name: &str) -> HostResult<LoadedManifest> {
        let url = endpoints::manifest_url(self.hub.server_uri(), widget_name);
        let manifest: WidgetManifest = self.hub.get_json(&url).await?;

        info!(
            widget = %widget_name,
            application = ?manifest.application_name,
            top_navigation = manifest.capabilities.top_navigation,
            popups = manifest.capabilities.popups,
            "Loaded widget manifest"
        );

        let logo = manifest.resolve_logo(&endpoints::widget_archive_url(
            self.hub.server_uri(),
            widget_name,
        ));
        Ok(LoadedManifest {
            widget_name: widget_name.to_string(),
            manifest,
            logo,
        })
    }
}
