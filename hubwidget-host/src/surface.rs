//! The capability surface: the only host object reachable from inside the
//! widget sandbox.
//!
//! Widgets run in read-only mode. Operations that would persist state or
//! change the dashboard are rejected with a visible warning and a
//! [`CapabilityReply::Rejected`] value; they never fail into the widget.
//! Network operations go through the authenticated [`HubClient`] and the
//! page's [`ServiceDirectory`](crate::ServiceDirectory).

use crate::auth::{AuthSession, HubClient};
use crate::context::HostContext;
use crate::endpoints;
use crate::error::CapabilityFault;
use crate::lifecycle::LifecycleController;
use crate::notify::AlertKind;
use crate::manifest::LoadedManifest;
use hubwidget_types::{RequestParams, ServiceDescriptor, ServiceId};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Wire names of every capability operation.
pub const OPERATIONS: [&str; 15] = [
    "setTitle",
    "setLoadingAnimationEnabled",
    "enterConfigMode",
    "exitConfigMode",
    "setError",
    "clearError",
    "readCache",
    "storeCache",
    "readConfig",
    "storeConfig",
    "fetch",
    "fetchHub",
    "loadServices",
    "alert",
    "removeWidget",
];

/// One call into the capability surface, with its typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityCall {
    SetTitle {
        text: String,
        url: Option<String>,
    },
    SetLoadingAnimationEnabled(bool),
    EnterConfigMode,
    ExitConfigMode,
    SetError(Value),
    ClearError,
    ReadCache,
    StoreCache(Value),
    ReadConfig,
    StoreConfig(Value),
    Fetch {
        service_id: ServiceId,
        relative_url: String,
        params: RequestParams,
    },
    FetchHub {
        relative_url: String,
        params: RequestParams,
    },
    LoadServices {
        application_name: Option<String>,
    },
    Alert {
        text: String,
        kind: AlertKind,
        timeout_ms: Option<u64>,
    },
    RemoveWidget,
}

/// Operations the read-only host refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectedOperation {
    EnterConfigMode,
    ExitConfigMode,
    StoreCache,
    StoreConfig,
    RemoveWidget,
}

impl RejectedOperation {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::EnterConfigMode => "enterConfigMode",
            Self::ExitConfigMode => "exitConfigMode",
            Self::StoreCache => "storeCache",
            Self::StoreConfig => "storeConfig",
            Self::RemoveWidget => "removeWidget",
        }
    }

    /// User-visible warning text.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::EnterConfigMode => {
                "EnterConfigMode: Cannot manipulate with settings for widget in read-only mode"
            }
            Self::ExitConfigMode => {
                "ExitConfigMode: Cannot manipulate with settings for widget in read-only mode"
            }
            Self::StoreCache => "StoreCache: Cannot store cache for widget in read-only mode",
            Self::StoreConfig => "StoreConfig: Cannot store config for widget in read-only mode",
            Self::RemoveWidget => "RemoveWidget: Cannot remove widget in read-only mode",
        }
    }
}

/// Successful outcome of a capability call.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityReply {
    Done,
    Rejected(RejectedOperation),
    Json(Value),
    Services(Vec<ServiceDescriptor>),
}

impl CapabilityReply {
    pub fn into_wire(self) -> Value {
        match self {
            Self::Done => Value::Null,
            Self::Rejected(op) => json!({
                "rejected": true,
                "operation": op.operation(),
                "reason": op.reason(),
            }),
            Self::Json(value) => value,
            Self::Services(services) => json!(services),
        }
    }
}

impl CapabilityCall {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::SetTitle { .. } => "setTitle",
            Self::SetLoadingAnimationEnabled(_) => "setLoadingAnimationEnabled",
            Self::EnterConfigMode => "enterConfigMode",
            Self::ExitConfigMode => "exitConfigMode",
            Self::SetError(_) => "setError",
            Self::ClearError => "clearError",
            Self::ReadCache => "readCache",
            Self::StoreCache(_) => "storeCache",
            Self::ReadConfig => "readConfig",
            Self::StoreConfig(_) => "storeConfig",
            Self::Fetch { .. } => "fetch",
            Self::FetchHub { .. } => "fetchHub",
            Self::LoadServices { .. } => "loadServices",
            Self::Alert { .. } => "alert",
            Self::RemoveWidget => "removeWidget",
        }
    }

    /// Decodes a wire call: an operation name and a positional argument array.
    ///
    /// A non-array `args` is treated as a single argument; `null` as none.
    pub fn decode(operation: &str, args: Value) -> Result<Self, CapabilityFault> {
        let args = Args::new(operation, args);

        Ok(match operation {
            "setTitle" => Self::SetTitle {
                text: args.string(0)?.unwrap_or_default(),
                url: args.string(1)?,
            },
            "setLoadingAnimationEnabled" => Self::SetLoadingAnimationEnabled(args.flag(0)?),
            "enterConfigMode" => Self::EnterConfigMode,
            "exitConfigMode" => Self::ExitConfigMode,
            "setError" => Self::SetError(args.value(0)),
            "clearError" => Self::ClearError,
            "readCache" => Self::ReadCache,
            "storeCache" => Self::StoreCache(args.value(0)),
            "readConfig" => Self::ReadConfig,
            "storeConfig" => Self::StoreConfig(args.value(0)),
            "fetch" => Self::Fetch {
                service_id: args.required::<ServiceId>(0, "serviceId")?,
                relative_url: args.string(1)?.unwrap_or_default(),
                params: args.optional::<RequestParams>(2)?.unwrap_or_default(),
            },
            "fetchHub" => Self::FetchHub {
                relative_url: args.string(0)?.unwrap_or_default(),
                params: args.optional::<RequestParams>(1)?.unwrap_or_default(),
            },
            "loadServices" => Self::LoadServices {
                application_name: args.string(0)?,
            },
            "alert" => Self::Alert {
                text: args.string(0)?.unwrap_or_default(),
                kind: args.string(1)?.map(|k| AlertKind::parse(&k)).unwrap_or_default(),
                timeout_ms: args.millis(2)?,
            },
            "removeWidget" => Self::RemoveWidget,
            other => return Err(CapabilityFault::UnknownOperation(other.to_string())),
        })
    }
}

/// Positional wire arguments of one call.
struct Args<'a> {
    operation: &'a str,
    values: Vec<Value>,
}

impl<'a> Args<'a> {
    fn new(operation: &'a str, args: Value) -> Self {
        let values = match args {
            Value::Null => Vec::new(),
            Value::Array(values) => values,
            single => vec![single],
        };
        Self { operation, values }
    }

    fn value(&self, index: usize) -> Value {
        self.values.get(index).cloned().unwrap_or(Value::Null)
    }

    fn optional<T: serde::de::DeserializeOwned>(&self, index: usize) -> Result<Option<T>, CapabilityFault> {
        match self.values.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| {
                    CapabilityFault::invalid_arguments(
                        self.operation,
                        format!("argument {index}: {e}"),
                    )
                }),
        }
    }

    fn required<T: serde::de::DeserializeOwned>(
        &self,
        index: usize,
        name: &str,
    ) -> Result<T, CapabilityFault> {
        self.optional(index)?.ok_or_else(|| {
            CapabilityFault::invalid_arguments(self.operation, format!("{name} is required"))
        })
    }

    fn string(&self, index: usize) -> Result<Option<String>, CapabilityFault> {
        self.optional(index)
    }

    /// A duration in milliseconds. Any JSON number is accepted: fractions
    /// round, negatives clamp to zero.
    fn millis(&self, index: usize) -> Result<Option<u64>, CapabilityFault> {
        match self.values.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_u64().or_else(|| {
                n.as_f64().map(|f| f.round().max(0.0) as u64)
            })),
            Some(other) => Err(CapabilityFault::invalid_arguments(
                self.operation,
                format!("argument {index}: expected a number of milliseconds, got {other}"),
            )),
        }
    }

    /// Loose truthiness, the way widgets pass flags.
    fn flag(&self, index: usize) -> Result<bool, CapabilityFault> {
        Ok(match self.values.get(index) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        })
    }
}

/// Picks the message shown by `setError`: structured error data first,
/// then the message text, then nothing.
pub fn error_message(err: &Value) -> String {
    if let Some(data) = err.get("data").filter(|d| !d.is_null()) {
        let described = ["error_description", "description", "message"]
            .iter()
            .find_map(|key| data.get(key).and_then(Value::as_str));
        match (described, data) {
            (Some(text), _) => return text.to_string(),
            (None, Value::String(text)) if !text.is_empty() => return text.clone(),
            (None, Value::String(_)) => {}
            (None, other) => return other.to_string(),
        }
    }
    if let Some(message) = err.get("message").and_then(Value::as_str) {
        return message.to_string();
    }
    match err {
        Value::String(text) => text.clone(),
        _ => String::new(),
    }
}

/// Host implementation of the capability operations for one widget.
pub struct CapabilitySurface {
    widget: String,
    application: Option<String>,
    hub: HubClient,
    context: Arc<HostContext>,
    lifecycle: Arc<LifecycleController>,
    config: Value,
}

impl std::fmt::Debug for CapabilitySurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilitySurface")
            .field("widget", &self.widget)
            .field("application", &self.application)
            .field("hub", &self.hub)
            .finish_non_exhaustive()
    }
}

impl CapabilitySurface {
    /// Builds the surface for a widget whose identity handshake and
    /// manifest have both completed. Both can only be obtained by running
    /// them.
    pub fn new(
        session: &AuthSession,
        manifest: &LoadedManifest,
        context: Arc<HostContext>,
        lifecycle: Arc<LifecycleController>,
        config: Value,
    ) -> Self {
        let widget = manifest.widget_name().to_string();
        debug!(
            widget = %widget,
            application = ?manifest.application_name(),
            anonymous = session.is_anonymous(),
            "Capability surface ready"
        );
        Self {
            widget,
            application: manifest.application_name().map(str::to_string),
            hub: session.client().clone(),
            context,
            lifecycle,
            config,
        }
    }

    pub fn widget(&self) -> &str {
        &self.widget
    }

    /// Application that owns the widget, from its manifest.
    pub fn application_name(&self) -> Option<&str> {
        self.application.as_deref()
    }

    /// Executes one capability call. Never panics; failures are values.
    pub async fn call(&self, call: CapabilityCall) -> Result<CapabilityReply, CapabilityFault> {
        debug!(widget = %self.widget, operation = call.operation(), "Capability call");

        match call {
            CapabilityCall::SetTitle { text, url } => {
                self.lifecycle.set_title(text, url);
                Ok(CapabilityReply::Done)
            }
            CapabilityCall::SetLoadingAnimationEnabled(loading) => {
                self.lifecycle.set_loading(loading);
                Ok(CapabilityReply::Done)
            }
            CapabilityCall::SetError(err) => {
                self.lifecycle.set_error(error_message(&err));
                Ok(CapabilityReply::Done)
            }
            CapabilityCall::ClearError => {
                self.lifecycle.clear_error();
                Ok(CapabilityReply::Done)
            }
            CapabilityCall::EnterConfigMode => Ok(self.reject(RejectedOperation::EnterConfigMode)),
            CapabilityCall::ExitConfigMode => Ok(self.reject(RejectedOperation::ExitConfigMode)),
            CapabilityCall::StoreCache(_) => Ok(self.reject(RejectedOperation::StoreCache)),
            CapabilityCall::StoreConfig(_) => Ok(self.reject(RejectedOperation::StoreConfig)),
            CapabilityCall::RemoveWidget => Ok(self.reject(RejectedOperation::RemoveWidget)),
            CapabilityCall::ReadCache => Ok(CapabilityReply::Json(Value::Null)),
            CapabilityCall::ReadConfig => Ok(CapabilityReply::Json(self.config.clone())),
            CapabilityCall::Fetch {
                service_id,
                relative_url,
                params,
            } => {
                let body = self
                    .context
                    .directory()
                    .fetch_by_service(&self.hub, &service_id, &relative_url, &params)
                    .await?;
                Ok(CapabilityReply::Json(body))
            }
            CapabilityCall::FetchHub {
                relative_url,
                params,
            } => {
                let url = endpoints::hub_relative_url(self.hub.server_uri(), &relative_url);
                let body = self.hub.request(&url, &params).await?;
                Ok(CapabilityReply::Json(body))
            }
            CapabilityCall::LoadServices { application_name } => {
                let services = self
                    .context
                    .directory()
                    .resolve_services(&self.hub, application_name.as_deref())
                    .await?;
                Ok(CapabilityReply::Services(services))
            }
            CapabilityCall::Alert {
                text,
                kind,
                timeout_ms,
            } => {
                self.context
                    .notifications()
                    .push(text, kind, timeout_ms.map(Duration::from_millis));
                Ok(CapabilityReply::Done)
            }
        }
    }

    /// Wire entry point for sandbox transports.
    ///
    /// Returns the JSON result, or the fault in its wire form.
    pub async fn dispatch(&self, operation: &str, args: Value) -> Result<Value, Value> {
        let call = match CapabilityCall::decode(operation, args) {
            Ok(call) => call,
            Err(fault) => {
                warn!(widget = %self.widget, operation, error = %fault, "Rejected malformed capability call");
                return Err(fault.to_wire());
            }
        };

        match self.call(call).await {
            Ok(reply) => Ok(reply.into_wire()),
            Err(fault) => {
                debug!(widget = %self.widget, operation, error = %fault, "Capability call failed");
                Err(fault.to_wire())
            }
        }
    }

    fn reject(&self, operation: RejectedOperation) -> CapabilityReply {
        warn!(widget = %self.widget, operation = operation.operation(), "Operation rejected in read-only mode");
        self.context.notifications().warn(operation.reason());
        CapabilityReply::Rejected(operation)
    }
}
