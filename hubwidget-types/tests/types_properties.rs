//! Property-based tests for configuration derivation and service lookup.

use hubwidget_types::{
    ANONYMOUS_CLIENT_ID, HubConfig, InstallationProperties, ServiceDescriptor, ServiceId,
};
use proptest::prelude::*;

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9-]{0,20}").unwrap()
}

fn url_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("https://[a-z]{1,10}\\.example\\.com/?").unwrap()
}

// =============================================================================
// HUB CONFIG DERIVATION
// =============================================================================

proptest! {
    /// Scope always mirrors the client id, explicit or anonymous.
    #[test]
    fn scope_is_the_client_id(
        name in name_strategy(),
        hub in url_strategy(),
        client in prop::option::of(name_strategy()),
        page in url_strategy(),
    ) {
        let mut props = InstallationProperties::new(name, hub.clone());
        props.auth_client_id = client.clone();
        let config = HubConfig::derive(&props, &page);

        prop_assert_eq!(config.scope.len(), 1);
        prop_assert_eq!(config.primary_scope(), config.client_id.as_str());
        prop_assert_eq!(config.server_uri, hub);
        prop_assert_eq!(config.redirect_uri, page);
        prop_assert_eq!(
            config.client_id,
            client.unwrap_or_else(|| ANONYMOUS_CLIENT_ID.to_string())
        );
    }

    /// Generated properties always validate.
    #[test]
    fn generated_properties_validate(name in name_strategy(), hub in url_strategy()) {
        prop_assert!(InstallationProperties::new(name, hub).validate().is_ok());
    }

    /// Numeric and string ids deserialize to the same identifier.
    #[test]
    fn numeric_service_ids_match_strings(id in 0u64..1_000_000) {
        let from_number: ServiceId = serde_json::from_value(serde_json::json!(id)).unwrap();
        let from_string: ServiceId =
            serde_json::from_value(serde_json::json!(id.to_string())).unwrap();
        prop_assert_eq!(from_number, from_string);
    }

    /// Relative URLs resolve below the service home, with exactly one slash.
    #[test]
    fn resolved_urls_stay_below_home(
        home in url_strategy(),
        rel in prop::string::string_regex("/?[a-z/]{0,20}").unwrap(),
    ) {
        let service: ServiceDescriptor = serde_json::from_value(serde_json::json!({
            "id": "1",
            "homeUrl": home,
        }))
        .unwrap();
        let url = service.resolve_url(&rel).unwrap();
        let base = home.trim_end_matches('/');
        let prefix = format!("{base}/");
        prop_assert!(url.starts_with(&prefix));
        prop_assert!(!url[base.len() + 1..].starts_with('/'));
    }
}
