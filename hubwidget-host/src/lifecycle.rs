//! Widget chrome lifecycle.
//!
//! ```text
//! Created -> AwaitingAuth -> AwaitingManifest -> Rendered(chrome)
//! ```
//!
//! Once rendered, capability calls edit the chrome in place. The refresh
//! control starts `Inactive`, becomes `Active` when the embedded widget
//! exposes a refresh operation (or `Absent` when it does not), and is
//! `ActiveLoading` between a click and the widget switching its loading
//! animation off.
//!
//! Renderers observe changes through [`LifecycleController::subscribe`].

use crate::error::{HostError, HostResult};
use hubwidget_types::Logo;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Title {
    pub text: String,
    /// When set, the title renders as a link opening in a new context.
    pub url: Option<String>,
}

impl Title {
    pub fn is_link(&self) -> bool {
        self.url.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RefreshControl {
    Absent,
    Inactive,
    Active,
    ActiveLoading,
}

/// Host-rendered chrome around the widget frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chrome {
    pub loading: bool,
    pub error: Option<String>,
    pub title: Option<Title>,
    pub refresh: RefreshControl,
    pub logo: Option<Logo>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LifecyclePhase {
    Created,
    AwaitingAuth,
    AwaitingManifest,
    Rendered(Chrome),
}

impl LifecyclePhase {
    fn name(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::AwaitingAuth => "AwaitingAuth",
            Self::AwaitingManifest => "AwaitingManifest",
            Self::Rendered(_) => "Rendered",
        }
    }
}

pub struct LifecycleController {
    widget: String,
    state: watch::Sender<LifecyclePhase>,
}

impl LifecycleController {
    pub fn new(widget: impl Into<String>) -> Self {
        let (state, _) = watch::channel(LifecyclePhase::Created);
        Self {
            widget: widget.into(),
            state,
        }
    }

    pub fn widget(&self) -> &str {
        &self.widget
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.state.borrow().clone()
    }

    /// Current chrome, once rendered.
    pub fn chrome(&self) -> Option<Chrome> {
        match &*self.state.borrow() {
            LifecyclePhase::Rendered(chrome) => Some(chrome.clone()),
            _ => None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecyclePhase> {
        self.state.subscribe()
    }

    pub fn begin_auth(&self) -> HostResult<()> {
        self.advance(|phase| match phase {
            LifecyclePhase::Created => Some(LifecyclePhase::AwaitingAuth),
            _ => None,
        })
    }

    pub fn auth_ready(&self) -> HostResult<()> {
        self.advance(|phase| match phase {
            LifecyclePhase::AwaitingAuth => Some(LifecyclePhase::AwaitingManifest),
            _ => None,
        })
    }

    /// Renders the chrome after the manifest arrived.
    pub fn render(&self, logo: Option<Logo>, width: u32, height: u32) -> HostResult<()> {
        self.advance(|phase| match phase {
            LifecyclePhase::AwaitingManifest => Some(LifecyclePhase::Rendered(Chrome {
                loading: false,
                error: None,
                title: None,
                refresh: RefreshControl::Inactive,
                logo,
                width,
                height,
            })),
            _ => None,
        })
    }

    pub fn set_title(&self, text: impl Into<String>, url: Option<String>) -> bool {
        let title = Title {
            text: text.into(),
            url: url.filter(|u| !u.is_empty()),
        };
        self.edit_chrome("setTitle", |chrome| chrome.title = Some(title))
    }

    /// Toggles the loading animation on the container and on an active
    /// refresh control.
    pub fn set_loading(&self, loading: bool) -> bool {
        self.edit_chrome("setLoadingAnimationEnabled", |chrome| {
            chrome.loading = loading;
            chrome.refresh = match (chrome.refresh, loading) {
                (RefreshControl::Active, true) => RefreshControl::ActiveLoading,
                (RefreshControl::ActiveLoading, false) => RefreshControl::Active,
                (other, _) => other,
            };
        })
    }

    pub fn set_error(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        self.edit_chrome("setError", |chrome| chrome.error = Some(message))
    }

    pub fn clear_error(&self) -> bool {
        self.edit_chrome("clearError", |chrome| chrome.error = None)
    }

    /// Wires the refresh control once the embedded side is ready.
    pub fn wire_refresh(&self, exposed: bool) -> HostResult<()> {
        let mut wired = false;
        self.state.send_if_modified(|phase| match phase {
            LifecyclePhase::Rendered(chrome) if chrome.refresh == RefreshControl::Inactive => {
                chrome.refresh = if exposed {
                    RefreshControl::Active
                } else {
                    RefreshControl::Absent
                };
                wired = true;
                true
            }
            _ => false,
        });

        if wired {
            debug!(widget = %self.widget, exposed, "Refresh control wired");
            Ok(())
        } else {
            Err(self.violation("refresh control is not awaiting wiring"))
        }
    }

    /// Handles a click on the refresh control: `Active -> ActiveLoading`.
    pub fn begin_refresh(&self) -> HostResult<()> {
        let started = self.state.send_if_modified(|phase| match phase {
            LifecyclePhase::Rendered(chrome) if chrome.refresh == RefreshControl::Active => {
                chrome.refresh = RefreshControl::ActiveLoading;
                true
            }
            _ => false,
        });

        if started {
            Ok(())
        } else {
            Err(HostError::RefreshUnavailable(self.widget.clone()))
        }
    }

    /// Returns the control to `Active` after a refresh that never ran.
    pub fn refresh_failed(&self) {
        self.state.send_if_modified(|phase| match phase {
            LifecyclePhase::Rendered(chrome) if chrome.refresh == RefreshControl::ActiveLoading => {
                chrome.refresh = RefreshControl::Active;
                true
            }
            _ => false,
        });
    }

    fn advance(&self, next: impl FnOnce(&LifecyclePhase) -> Option<LifecyclePhase>) -> HostResult<()> {
        let mut from = "";
        let moved = self.state.send_if_modified(|phase| {
            from = phase.name();
            match next(phase) {
                Some(new_phase) => {
                    *phase = new_phase;
                    true
                }
                None => false,
            }
        });

        if moved {
            debug!(widget = %self.widget, from, to = self.state.borrow().name(), "Lifecycle transition");
            Ok(())
        } else {
            Err(self.violation(format!("unexpected transition from {from}")))
        }
    }

    fn edit_chrome(&self, operation: &str, edit: impl FnOnce(&mut Chrome)) -> bool {
        let edited = self.state.send_if_modified(|phase| match phase {
            LifecyclePhase::Rendered(chrome) => {
                edit(chrome);
                true
            }
            _ => false,
        });
        if !edited {
            warn!(widget = %self.widget, operation, "Chrome is not rendered; call ignored");
        }
        edited
    }

    fn violation(&self, detail: impl Into<String>) -> HostError {
        HostError::Lifecycle {
            widget: self.widget.clone(),
            detail: detail.into(),
        }
    }
}
