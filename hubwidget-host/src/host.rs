//! Widget instantiation.
//!
//! Owns the ordering every embedded widget goes through:
//!
//! 1. validate properties and the page-wide Hub configuration (synchronous)
//! 2. identity handshake
//! 3. manifest fetch, then chrome render
//! 4. sandbox creation with manifest-derived permissions
//! 5. wiring of widget-exposed callbacks once the widget is ready
//!
//! A failure at any step ends the instantiation; nothing is retried and no
//! partially built bridge is returned.

use crate::auth::{AuthSession, IdentityHandshake};
use crate::context::HostContext;
use crate::error::HostResult;
use crate::lifecycle::{Chrome, LifecycleController};
use crate::manifest::{LoadedManifest, ManifestLoader};
use crate::permissions::SandboxPolicy;
use crate::sandbox::{FrameSpec, REFRESH_OPERATION, RemoteWidget, SandboxBridge, SandboxTransport};
use crate::surface::CapabilitySurface;
use hubwidget_types::{HubConfig, InstallationProperties, WidgetManifest};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Embeds widgets into one page.
#[derive(Clone)]
pub struct WidgetHost {
    context: Arc<HostContext>,
    handshake: Arc<dyn IdentityHandshake>,
    transport: Arc<dyn SandboxTransport>,
}

impl WidgetHost {
    pub fn new(
        context: Arc<HostContext>,
        handshake: Arc<dyn IdentityHandshake>,
        transport: Arc<dyn SandboxTransport>,
    ) -> Self {
        Self {
            context,
            handshake,
            transport,
        }
    }

    pub fn context(&self) -> &Arc<HostContext> {
        &self.context
    }

    /// Synchronous part of instantiation: property validation and the
    /// page-wide configuration check. Runs before any I/O.
    pub fn prepare(
        &self,
        props: InstallationProperties,
        config: Value,
    ) -> HostResult<PendingWidget> {
        props.validate()?;

        let hub_config = HubConfig::derive(&props, self.context.page_location());
        self.context
            .registry()
            .validate_or_adopt(&props.widget_name, &hub_config)?;

        let lifecycle = Arc::new(LifecycleController::new(props.widget_name.clone()));
        Ok(PendingWidget {
            host: self.clone(),
            props,
            config,
            hub_config,
            lifecycle,
        })
    }

    /// Full instantiation: [`prepare`](Self::prepare) then
    /// [`PendingWidget::launch`].
    pub async fn embed(
        &self,
        props: InstallationProperties,
        config: Value,
    ) -> HostResult<EmbeddedWidget> {
        self.prepare(props, config)?.launch().await
    }
}

/// A widget whose configuration was accepted but which has not touched the
/// network yet.
pub struct PendingWidget {
    host: WidgetHost,
    props: InstallationProperties,
    config: Value,
    hub_config: HubConfig,
    lifecycle: Arc<LifecycleController>,
}

impl PendingWidget {
    pub fn lifecycle(&self) -> &Arc<LifecycleController> {
        &self.lifecycle
    }

    pub fn hub_config(&self) -> &HubConfig {
        &self.hub_config
    }

    pub async fn launch(self) -> HostResult<EmbeddedWidget> {
        let Self {
            host,
            props,
            config,
            hub_config,
            lifecycle,
        } = self;
        let widget = props.widget_name.clone();

        lifecycle.begin_auth()?;
        let session = AuthSession::init(host.handshake.as_ref(), hub_config)
            .await
            .inspect_err(|e| warn!(widget = %widget, error = %e, "Identity handshake failed"))?;
        lifecycle.auth_ready()?;

        let manifest = ManifestLoader::new(session.client())
            .load_manifest(&widget)
            .await
            .inspect_err(|e| warn!(widget = %widget, error = %e, "Manifest fetch failed"))?;
        lifecycle.render(manifest.logo().cloned(), props.width, props.height)?;

        let surface = Arc::new(CapabilitySurface::new(
            &session,
            &manifest,
            Arc::clone(&host.context),
            Arc::clone(&lifecycle),
            config,
        ));
        let handle =
            SandboxBridge::create(host.transport.as_ref(), &props, &manifest, Arc::clone(&surface))
                .await?;

        let remote = handle.ready().await?;
        lifecycle.wire_refresh(remote.exposes(REFRESH_OPERATION))?;

        info!(widget = %widget, sandbox = %remote.frame().policy(), "Widget embedded");
        Ok(EmbeddedWidget {
            props,
            manifest,
            lifecycle,
            surface,
            remote,
        })
    }
}

/// A live embedded widget.
pub struct EmbeddedWidget {
    props: InstallationProperties,
    manifest: LoadedManifest,
    lifecycle: Arc<LifecycleController>,
    surface: Arc<CapabilitySurface>,
    remote: RemoteWidget,
}

impl EmbeddedWidget {
    pub fn properties(&self) -> &InstallationProperties {
        &self.props
    }

    pub fn manifest(&self) -> &WidgetManifest {
        self.manifest.manifest()
    }

    pub fn policy(&self) -> &SandboxPolicy {
        self.remote.frame().policy()
    }

    pub fn frame(&self) -> &FrameSpec {
        self.remote.frame()
    }

    pub fn lifecycle(&self) -> &Arc<LifecycleController> {
        &self.lifecycle
    }

    pub fn surface(&self) -> &Arc<CapabilitySurface> {
        &self.surface
    }

    pub fn remote(&self) -> &RemoteWidget {
        &self.remote
    }

    pub fn chrome(&self) -> Option<Chrome> {
        self.lifecycle.chrome()
    }

    /// Host click on the refresh control.
    ///
    /// The control stays loading until the widget turns its loading
    /// animation off.
    pub async fn click_refresh(&self) -> HostResult<()> {
        self.lifecycle.begin_refresh()?;
        match self.remote.invoke(REFRESH_OPERATION, Value::Null).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(widget = %self.props.widget_name, error = %e, "Refresh callback failed");
                self.lifecycle.refresh_failed();
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for EmbeddedWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedWidget")
            .field("widget", &self.props.widget_name)
            .field("policy", self.policy())
            .finish_non_exhaustive()
    }
}
