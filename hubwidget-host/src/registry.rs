//! Page-wide Hub configuration registry.
//!
//! Every widget embedded in one page authenticates against the same Hub
//! with the same client. The first widget's configuration is adopted;
//! later widgets must match it on the identity fields.

use crate::error::ConfigMismatchError;
use hubwidget_types::HubConfig;
use std::sync::OnceLock;
use tracing::{debug, info};

/// First-writer-wins holder of the page's [`HubConfig`].
#[derive(Debug, Default)]
pub struct ConfigRegistry {
    adopted: OnceLock<HubConfig>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopts `candidate` if nothing is adopted yet, otherwise checks it
    /// against the adopted configuration.
    pub fn validate_or_adopt(
        &self,
        widget: &str,
        candidate: &HubConfig,
    ) -> Result<(), ConfigMismatchError> {
        let mut adopted_now = false;
        let adopted = self.adopted.get_or_init(|| {
            adopted_now = true;
            candidate.clone()
        });

        if adopted_now {
            info!(
                widget = %widget,
                server_uri = %candidate.server_uri,
                client_id = %candidate.client_id,
                "Adopted Hub configuration for page"
            );
            return Ok(());
        }

        for ((field, expected), (_, actual)) in adopted
            .identity_fields()
            .into_iter()
            .zip(candidate.identity_fields())
        {
            if expected != actual {
                return Err(ConfigMismatchError {
                    widget: widget.to_string(),
                    field,
                    adopted: expected.to_string(),
                    candidate: actual.to_string(),
                });
            }
        }

        debug!(widget = %widget, "Hub configuration matches adopted one");
        Ok(())
    }

    /// The adopted configuration, if any widget has been validated.
    pub fn adopted(&self) -> Option<&HubConfig> {
        self.adopted.get()
    }
}
