//! Hub REST endpoints used by the bridge.

/// Fields requested from the service directory.
pub const SERVICE_FIELDS: &str = "id,name,applicationName,homeUrl,version";

/// Header pinning the Hub REST API version.
pub const HUB_API_VERSION_HEADER: &str = "Hub-API-Version";
pub const HUB_API_VERSION: &str = "3";

pub fn services_url(hub_root: &str) -> String {
    format!(
        "{}/api/rest/services?fields={}",
        hub_root.trim_end_matches('/'),
        SERVICE_FIELDS
    )
}

/// Root of a widget's archive; manifest, document and icons live below it.
pub fn widget_archive_url(hub_root: &str, widget_name: &str) -> String {
    format!(
        "{}/api/rest/widgets/{}/archive",
        hub_root.trim_end_matches('/'),
        urlencoding::encode(widget_name)
    )
}

pub fn manifest_url(hub_root: &str, widget_name: &str) -> String {
    format!("{}/manifest.json", widget_archive_url(hub_root, widget_name))
}

/// Document loaded into the sandbox. Widgets are always embedded read-only.
pub fn widget_document_url(hub_root: &str, widget_name: &str, locale: &str) -> String {
    format!(
        "{}/index.html?locale={}&editable=false",
        widget_archive_url(hub_root, widget_name),
        urlencoding::encode(locale)
    )
}

/// Joins a widget-supplied relative URL onto the Hub root.
pub fn hub_relative_url(hub_root: &str, relative_url: &str) -> String {
    format!(
        "{}/{}",
        hub_root.trim_end_matches('/'),
        relative_url.trim_start_matches('/')
    )
}
