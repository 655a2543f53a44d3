//! Sandbox bridge: instantiates the widget frame through an injected
//! transport and installs the capability surface as its only host object.
//!
//! The transport owns the cross-context channel and the handshake. The
//! bridge only decides what the frame is allowed to do and hands over the
//! surface. Host-to-widget calls are possible only through a
//! [`RemoteWidget`], which exists only after the embedded side reported
//! ready.

use crate::endpoints;
use crate::error::{HostError, HostResult};
use crate::manifest::LoadedManifest;
use crate::permissions::SandboxPolicy;
use crate::surface::CapabilitySurface;
use async_trait::async_trait;
use hubwidget_types::{InstallationProperties, WidgetCapabilities};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info};

/// Operation a widget exports to receive host refresh clicks.
pub const REFRESH_OPERATION: &str = "onRefresh";

/// Everything the transport needs to create the widget frame.
///
/// Built only from declared capabilities, so the `sandbox` attribute never
/// grants more than the manifest asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameSpec {
    widget_name: String,
    src: String,
    mount: String,
    width: u32,
    height: u32,
    sandbox: String,
    #[serde(skip)]
    policy: SandboxPolicy,
}

impl FrameSpec {
    pub fn for_widget(props: &InstallationProperties, capabilities: &WidgetCapabilities) -> Self {
        let policy = SandboxPolicy::from_capabilities(capabilities);
        Self {
            widget_name: props.widget_name.clone(),
            src: endpoints::widget_document_url(props.hub_root(), &props.widget_name, &props.locale),
            mount: props.dom_container.clone(),
            width: props.width,
            height: props.height,
            sandbox: policy.attribute_string(),
            policy,
        }
    }

    pub fn widget_name(&self) -> &str {
        &self.widget_name
    }

    /// Document loaded into the frame.
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Selector of the element the widget container is mounted into.
    pub fn mount(&self) -> &str {
        &self.mount
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Value of the frame's `sandbox` attribute.
    pub fn sandbox(&self) -> &str {
        &self.sandbox
    }

    pub fn policy(&self) -> &SandboxPolicy {
        &self.policy
    }
}

/// Operations the embedded widget exposes back to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteExports {
    pub operations: BTreeSet<String>,
}

impl RemoteExports {
    pub fn new<I, S>(operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operations: operations.into_iter().map(Into::into).collect(),
        }
    }
}

/// Host-to-widget half of the cross-context channel.
#[async_trait]
pub trait RemoteChannel: Send + Sync {
    async fn send(&self, operation: &str, args: Value) -> HostResult<Value>;
}

/// An opened frame: the channel plus the one-shot "remote ready" signal.
pub struct SandboxConnection {
    pub channel: Arc<dyn RemoteChannel>,
    pub ready: oneshot::Receiver<RemoteExports>,
}

/// Cross-context transport (frame creation, message passing, handshake).
#[async_trait]
pub trait SandboxTransport: Send + Sync {
    /// Creates the frame described by `frame` and exposes `surface` to it.
    /// Resolves once the frame is loaded and the handshake has started.
    async fn open(
        &self,
        frame: &FrameSpec,
        surface: Arc<CapabilitySurface>,
    ) -> HostResult<SandboxConnection>;
}

pub struct SandboxBridge;

impl SandboxBridge {
    /// Instantiates the sandboxed widget with exactly the permissions its
    /// manifest declares.
    pub async fn create(
        transport: &dyn SandboxTransport,
        props: &InstallationProperties,
        manifest: &LoadedManifest,
        surface: Arc<CapabilitySurface>,
    ) -> HostResult<SandboxHandle> {
        if manifest.widget_name() != props.widget_name || surface.widget() != props.widget_name {
            return Err(HostError::Lifecycle {
                widget: props.widget_name.clone(),
                detail: format!(
                    "manifest of '{}' and surface of '{}' do not belong to this widget",
                    manifest.widget_name(),
                    surface.widget()
                ),
            });
        }

        let frame = FrameSpec::for_widget(props, manifest.capabilities());
        info!(
            widget = %frame.widget_name,
            src = %frame.src,
            sandbox = %frame.sandbox,
            "Creating widget sandbox"
        );
        let connection = transport.open(&frame, surface).await?;

        Ok(SandboxHandle {
            frame,
            channel: connection.channel,
            ready: connection.ready,
        })
    }
}

/// Live connection to an embedded widget whose own operations may not be
/// callable yet.
pub struct SandboxHandle {
    frame: FrameSpec,
    channel: Arc<dyn RemoteChannel>,
    ready: oneshot::Receiver<RemoteExports>,
}

impl SandboxHandle {
    pub fn frame(&self) -> &FrameSpec {
        &self.frame
    }

    /// Waits until the embedded side's exported operations are callable.
    pub async fn ready(self) -> HostResult<RemoteWidget> {
        let exports = self.ready.await.map_err(|_| {
            HostError::Transport(format!(
                "widget '{}' closed before becoming ready",
                self.frame.widget_name
            ))
        })?;

        debug!(
            widget = %self.frame.widget_name,
            exports = ?exports.operations,
            "Embedded widget ready"
        );
        Ok(RemoteWidget {
            frame: self.frame,
            channel: self.channel,
            exports,
        })
    }
}

/// A ready embedded widget.
pub struct RemoteWidget {
    frame: FrameSpec,
    channel: Arc<dyn RemoteChannel>,
    exports: RemoteExports,
}

impl RemoteWidget {
    pub fn frame(&self) -> &FrameSpec {
        &self.frame
    }

    pub fn exports(&self) -> &RemoteExports {
        &self.exports
    }

    pub fn exposes(&self, operation: &str) -> bool {
        self.exports.operations.contains(operation)
    }

    /// Calls an operation the widget exported.
    pub async fn invoke(&self, operation: &str, args: Value) -> HostResult<Value> {
        if !self.exposes(operation) {
            return Err(HostError::Transport(format!(
                "widget '{}' does not export '{operation}'",
                self.frame.widget_name
            )));
        }
        self.channel.send(operation, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_spec_from_properties() {
        let mut props = InstallationProperties::new("issues", "https://hub/");
        props.locale = "fr".into();
        props.width = 500;
        let frame = FrameSpec::for_widget(
            &props,
            &WidgetCapabilities {
                top_navigation: true,
                popups: false,
            },
        );

        assert_eq!(
            frame.src(),
            "https://hub/api/rest/widgets/issues/archive/index.html?locale=fr&editable=false"
        );
        assert_eq!(frame.sandbox(), "allow-pointer-lock allow-top-navigation");
        assert_eq!(frame.sandbox(), frame.policy().attribute_string());
        assert_eq!(frame.mount(), "#widget");
        assert_eq!((frame.width(), frame.height()), (500, 265));
    }

    #[test]
    fn undeclared_frame_gets_pointer_lock_only() {
        let frame = FrameSpec::for_widget(
            &InstallationProperties::new("issues", "https://hub"),
            &WidgetCapabilities::default(),
        );
        assert_eq!(frame.sandbox(), "allow-pointer-lock");
        assert_eq!(frame.policy(), &SandboxPolicy::minimal());
    }

    #[test]
    fn remote_exports_collects_names() {
        let exports = RemoteExports::new(["onRefresh", "onConfigure"]);
        assert!(exports.operations.contains(REFRESH_OPERATION));
        assert_eq!(exports.operations.len(), 2);
    }
}
