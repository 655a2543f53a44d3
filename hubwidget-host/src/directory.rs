//! Hub service directory with a page-lifetime cache.
//!
//! The full service list is fetched once per [`HostContext`](crate::HostContext)
//! and kept for its whole lifetime. Concurrent first callers share one
//! in-flight request.

use crate::auth::HubClient;
use crate::endpoints;
use crate::error::{HostError, HostResult};
use hubwidget_types::{RequestParams, ServiceDescriptor, ServiceId, ServiceList};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::OnceCell;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct ServiceDirectory {
    services: OnceCell<Arc<[ServiceDescriptor]>>,
    fetches: AtomicUsize,
}

impl ServiceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reachable services, optionally restricted to one application.
    pub async fn resolve_services(
        &self,
        hub: &HubClient,
        application_name: Option<&str>,
    ) -> HostResult<Vec<ServiceDescriptor>> {
        let services = self.all_services(hub).await?;
        Ok(services
            .iter()
            .filter(|s| s.matches_application(application_name) && s.is_reachable())
            .cloned()
            .collect())
    }

    /// Proxies an authenticated request to `{homeUrl}/{relative_url}` of
    /// the service with `service_id`.
    pub async fn fetch_by_service(
        &self,
        hub: &HubClient,
        service_id: &ServiceId,
        relative_url: &str,
        params: &RequestParams,
    ) -> HostResult<Value> {
        let url = {
            let services = self.all_services(hub).await?;
            services
                .iter()
                .find(|s| &s.id == service_id)
                .and_then(|s| s.resolve_url(relative_url))
                .ok_or_else(|| HostError::ServiceNotFound(service_id.clone()))?
        };

        debug!(service_id = %service_id, url = %url, "Proxying service request");
        hub.request(&url, params).await
    }

    /// Number of service-list requests issued so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn is_loaded(&self) -> bool {
        self.services.initialized()
    }

    async fn all_services(&self, hub: &HubClient) -> HostResult<&Arc<[ServiceDescriptor]>> {
        self.services
            .get_or_try_init(|| async {
                self.fetches.fetch_add(1, Ordering::SeqCst);
                let list: ServiceList = hub
                    .get_json(&endpoints::services_url(hub.server_uri()))
                    .await?;
                info!(count = list.services.len(), "Loaded Hub service list");
                Ok::<_, HostError>(Arc::from(list.services))
            })
            .await
    }
}
