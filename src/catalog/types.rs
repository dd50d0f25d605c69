//! Catalog data model
//!
//! Only the fields the link checker needs are modelled; the raw document
//! is kept alongside as `serde_json::Value` so it can be persisted verbatim.

use serde::Deserialize;
use serde_json::Value;

/// A dataset ("package") as returned by `package_show`
#[derive(Debug, Clone, Deserialize)]
pub struct Package {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub maintainer: Option<String>,
    /// Resource count as declared by the catalog
    #[serde(default)]
    pub num_resources: Option<u64>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Package {
    /// Maintainer, or an empty string when the catalog has none
    pub fn maintainer(&self) -> &str {
        self.maintainer.as_deref().unwrap_or("")
    }
}

/// A single link attached to a dataset
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

impl Resource {
    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }

    pub fn format(&self) -> &str {
        self.format.as_deref().unwrap_or("")
    }
}

/// Response of `package_list`
#[derive(Debug, Clone)]
pub struct DatasetList {
    /// Dataset names in catalog order
    pub names: Vec<String>,
    /// The full response envelope
    pub document: Value,
}

/// Result of fetching one dataset
#[derive(Debug, Clone)]
pub enum DatasetFetch {
    /// The catalog returned the dataset
    Found {
        package: Package,
        /// The `result` member of the response
        document: Value,
    },

    /// The catalog answered with an error, or the dataset could not be fetched
    Failed {
        /// Error body to persist in place of the dataset document
        document: Value,
        reason: String,
    },
}

/// Extracts `(__type, message)` from a CKAN error envelope
///
/// CKAN 2.x nests these under `error`; older deployments put them at the
/// top level. Both layouts are accepted.
pub fn error_details(envelope: &Value) -> (String, String) {
    let source = envelope
        .get("error")
        .filter(|e| e.is_object())
        .unwrap_or(envelope);

    let kind = source
        .get("__type")
        .and_then(Value::as_str)
        .unwrap_or("Unknown Error")
        .to_string();
    let message = match source.get("message") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    (kind, message)
}

/// Returns true if `body` is the discovery document of a version 3 API
pub fn is_version_3_body(body: &str) -> bool {
    if body.trim() == r#"{"version": 3}"# {
        return true;
    }

    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("version").and_then(Value::as_u64))
        == Some(3)
}
