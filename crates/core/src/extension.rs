//! Registered SDK extensions, as announced by the event hub.
//!
//! The hub publishes its shared state as an untyped JSON object. This module
//! turns that object into a typed registry, validating every entry at the
//! boundary so downstream code never has to second-guess the shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// One registered extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionInfo {
    /// Registry key, e.g. `com.adobe.module.analytics`.
    #[serde(skip)]
    pub id: String,

    /// Human-readable name, e.g. `Analytics`. Falls back to the id.
    pub friendly_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    /// Remaining fields published by the hub.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExtensionInfo {
    /// Validate one hub entry. Returns `None` when the entry is not an object.
    fn from_entry(id: &str, entry: &Value) -> Option<Self> {
        let obj = entry.as_object()?;

        let friendly_name = obj
            .get("friendlyName")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(id)
            .to_string();

        let version = obj.get("version").and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        let metadata = obj.get("metadata").cloned();

        let extra = obj
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "friendlyName" | "version" | "metadata"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Some(Self {
            id: id.to_string(),
            friendly_name,
            version,
            metadata,
            extra,
        })
    }
}

/// Extension id → extension info, iterated in id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionRegistry {
    extensions: BTreeMap<String, ExtensionInfo>,
}

impl ExtensionRegistry {
    /// Build a registry from the hub's `extensions` object.
    ///
    /// Returns `None` if the value is not an object at all. Individual
    /// entries that are not objects are dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let mut extensions = BTreeMap::new();
        for (id, entry) in obj {
            match ExtensionInfo::from_entry(id, entry) {
                Some(info) => {
                    extensions.insert(id.clone(), info);
                }
                None => debug!(extension = %id, "Ignoring malformed registry entry"),
            }
        }
        Some(Self { extensions })
    }

    pub fn get(&self, id: &str) -> Option<&ExtensionInfo> {
        self.extensions.get(id)
    }

    /// Find an extension by friendly name (case-insensitive).
    pub fn find_by_name(&self, friendly_name: &str) -> Option<&ExtensionInfo> {
        self.extensions
            .values()
            .find(|e| e.friendly_name.eq_ignore_ascii_case(friendly_name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtensionInfo> {
        self.extensions.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.extensions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}
