//! Host-side bridge for sandboxed Hub dashboard widgets.
//!
//! Embeds untrusted widget documents in a sandboxed frame, authenticates
//! against the Hub on their behalf, and exposes a fixed capability surface
//! as the widget's only way to reach the network or the host page.
//!
//! Every widget on a page shares one [`HostContext`]: the adopted Hub
//! configuration, the service-list cache and the notification sink.
//! The OAuth handshake and the cross-context transport are injected
//! through [`IdentityHandshake`] and [`SandboxTransport`].

mod auth;
mod context;
mod directory;
pub mod endpoints;
mod error;
mod host;
mod lifecycle;
mod manifest;
mod notify;
mod permissions;
mod registry;
mod sandbox;
mod surface;

pub use auth::{
    AnonymousHandshake, AuthSession, AuthState, HubClient, IdentityHandshake,
    StaticTokenHandshake,
};
pub use context::HostContext;
pub use directory::ServiceDirectory;
pub use error::{CapabilityFault, ConfigMismatchError, HostError, HostResult};
pub use host::{EmbeddedWidget, PendingWidget, WidgetHost};
pub use lifecycle::{Chrome, LifecycleController, LifecyclePhase, RefreshControl, Title};
pub use manifest::{LoadedManifest, ManifestLoader};
pub use notify::{
    AlertKind, DEFAULT_ALERT_TIMEOUT, Notification, NotificationPhase, NotificationSink,
};
pub use permissions::{GrantBasis, SandboxPermission, SandboxPolicy};
pub use registry::ConfigRegistry;
pub use sandbox::{
    FrameSpec, REFRESH_OPERATION, RemoteChannel, RemoteExports, RemoteWidget, SandboxBridge,
    SandboxConnection, SandboxHandle, SandboxTransport,
};
pub use surface::{
    CapabilityCall, CapabilityReply, CapabilitySurface, OPERATIONS, RejectedOperation,
    error_message,
};
