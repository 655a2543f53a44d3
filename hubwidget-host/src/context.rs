//! Page-wide state shared by every widget embedded in one page.

use crate::directory::ServiceDirectory;
use crate::notify::NotificationSink;
use crate::registry::ConfigRegistry;
use std::sync::Arc;

/// Owns the page-lifetime registry, service cache and notification sink.
///
/// Construct one per page and hand clones of the `Arc` to every
/// [`WidgetHost`](crate::WidgetHost).
#[derive(Debug)]
pub struct HostContext {
    page_location: String,
    registry: ConfigRegistry,
    directory: ServiceDirectory,
    notifications: NotificationSink,
}

impl HostContext {
    /// `page_location` is the embedding page's origin and path, the default
    /// OAuth redirect target.
    pub fn new(page_location: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            page_location: page_location.into(),
            registry: ConfigRegistry::new(),
            directory: ServiceDirectory::new(),
            notifications: NotificationSink::new(),
        })
    }

    pub fn page_location(&self) -> &str {
        &self.page_location
    }

    pub fn registry(&self) -> &ConfigRegistry {
        &self.registry
    }

    pub fn directory(&self) -> &ServiceDirectory {
        &self.directory
    }

    pub fn notifications(&self) -> &NotificationSink {
        &self.notifications
    }
}
