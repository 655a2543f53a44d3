//! Shared fixtures: a mock Hub (wiremock) and an in-memory sandbox transport.

#![allow(dead_code)]

use async_trait::async_trait;
use hubwidget_host::*;
use hubwidget_types::{HubConfig, InstallationProperties};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PAGE: &str = "https://dashboard.example.com/page";
pub const TOKEN: &str = "test-token";
pub const WIDGET: &str = "sample-widget";

pub fn props(server: &MockServer) -> InstallationProperties {
    InstallationProperties::new(WIDGET, server.uri())
}

pub async fn session(server: &MockServer) -> AuthSession {
    let config = HubConfig::derive(&props(server), PAGE);
    AuthSession::init(&StaticTokenHandshake::new(TOKEN), config)
        .await
        .expect("static token handshake")
}

pub fn rendered_lifecycle(widget: &str) -> Arc<LifecycleController> {
    let lifecycle = Arc::new(LifecycleController::new(widget));
    lifecycle.begin_auth().unwrap();
    lifecycle.auth_ready().unwrap();
    lifecycle.render(None, 290, 265).unwrap();
    lifecycle
}

/// Runs the manifest request against the mock Hub.
pub async fn loaded_manifest(server: &MockServer, session: &AuthSession) -> LoadedManifest {
    mount_manifest(server, WIDGET, json!({"name": WIDGET, "applicationName": "YouTrack"})).await;
    ManifestLoader::new(session.client())
        .load_manifest(WIDGET)
        .await
        .expect("manifest")
}

pub async fn surface(
    server: &MockServer,
    context: Arc<HostContext>,
    config: Value,
) -> (Arc<CapabilitySurface>, Arc<LifecycleController>) {
    let session = session(server).await;
    let manifest = loaded_manifest(server, &session).await;
    let lifecycle = rendered_lifecycle(WIDGET);
    let surface = CapabilitySurface::new(
        &session,
        &manifest,
        context,
        Arc::clone(&lifecycle),
        config,
    );
    (Arc::new(surface), lifecycle)
}

/// The three-service directory used across tests.
pub fn sample_services(server: &MockServer) -> Value {
    json!({
        "services": [
            {"id": "1", "name": "YouTrack", "applicationName": "A", "homeUrl": format!("{}/youtrack", server.uri())},
            {"id": "2", "name": "Broken", "applicationName": "A", "homeUrl": ""},
            {"id": "3", "name": "TeamCity", "applicationName": "B", "homeUrl": format!("{}/teamcity", server.uri())},
        ]
    })
}

pub async fn mount_services(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/api/rest/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_manifest(server: &MockServer, widget: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/rest/widgets/{widget}/archive/manifest.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Records host-to-widget calls.
#[derive(Default)]
pub struct RecordingChannel {
    pub calls: Mutex<Vec<(String, Value)>>,
    pub fail: bool,
}

#[async_trait]
impl RemoteChannel for RecordingChannel {
    async fn send(&self, operation: &str, args: Value) -> HostResult<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((operation.to_string(), args));
        if self.fail {
            return Err(HostError::Transport("frame detached".into()));
        }
        Ok(Value::Null)
    }
}

/// In-memory transport: records opened frames and reports ready with a
/// fixed export list (or never, when `exports` is `None`).
pub struct MockTransport {
    pub exports: Option<Vec<String>>,
    pub channel: Arc<RecordingChannel>,
    pub opened: Mutex<Vec<FrameSpec>>,
    pub surfaces: Mutex<Vec<Arc<CapabilitySurface>>>,
}

impl MockTransport {
    pub fn with_exports(exports: &[&str]) -> Arc<Self> {
        Self::build(Some(exports.iter().map(|s| s.to_string()).collect()), false)
    }

    pub fn never_ready() -> Arc<Self> {
        Self::build(None, false)
    }

    pub fn failing_channel(exports: &[&str]) -> Arc<Self> {
        Self::build(Some(exports.iter().map(|s| s.to_string()).collect()), true)
    }

    fn build(exports: Option<Vec<String>>, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            exports,
            channel: Arc::new(RecordingChannel {
                calls: Mutex::new(Vec::new()),
                fail,
            }),
            opened: Mutex::new(Vec::new()),
            surfaces: Mutex::new(Vec::new()),
        })
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    pub fn last_frame(&self) -> FrameSpec {
        self.opened.lock().unwrap().last().cloned().expect("no frame")
    }

    pub fn last_surface(&self) -> Arc<CapabilitySurface> {
        Arc::clone(self.surfaces.lock().unwrap().last().expect("no surface"))
    }
}

#[async_trait]
impl SandboxTransport for MockTransport {
    async fn open(
        &self,
        frame: &FrameSpec,
        surface: Arc<CapabilitySurface>,
    ) -> HostResult<SandboxConnection> {
        self.opened.lock().unwrap().push(frame.clone());
        self.surfaces.lock().unwrap().push(surface);

        let (tx, rx) = oneshot::channel();
        if let Some(exports) = &self.exports {
            let _ = tx.send(RemoteExports::new(exports.clone()));
        }

        Ok(SandboxConnection {
            channel: Arc::clone(&self.channel) as Arc<dyn RemoteChannel>,
            ready: rx,
        })
    }
}

/// Handshake that always fails.
pub struct RejectingHandshake;

#[async_trait]
impl IdentityHandshake for RejectingHandshake {
    async fn init(&self, _config: &HubConfig) -> HostResult<AuthState> {
        Err(HostError::Auth("user denied access".into()))
    }
}

pub fn host(
    context: Arc<HostContext>,
    transport: Arc<MockTransport>,
) -> WidgetHost {
    WidgetHost::new(
        context,
        Arc::new(StaticTokenHandshake::new(TOKEN)),
        transport,
    )
}
