//! Caller-supplied parameters for proxied requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Method, query, headers and body of a proxied request.
///
/// Widgets send this object as the last argument of `fetch` and
/// `fetchHub`; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParams {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<Value>,
}

impl RequestParams {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, method: impl Into<String>, body: Value) -> Self {
        self.method = Some(method.into());
        self.body = Some(body);
        self
    }

    /// Upper-cased method name; `GET` when none was given.
    pub fn method_name(&self) -> String {
        self.method
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or("GET")
            .to_ascii_uppercase()
    }
}
