//! # Built-in option defaults.
//!
//! [`Defaults`] is the fixed record every instance starts from before caller
//! options are overlaid. Defaults hold data only; callbacks always come from
//! the caller.

use std::collections::BTreeMap;

use serde_json::{Value, json};

/// Interfaces enabled when the caller does not choose any.
pub const DEFAULT_INTERFACES: &[&str] = &[
    "panel",
    "update",
    "submit",
    "skip",
    "controls",
    "infobar",
    "topbar",
    "instruction",
    "annotations:history",
    "annotations:tabs",
    "annotations:menu",
    "annotations:current",
    "predictions:tabs",
    "predictions:menu",
    "edit-history",
];

/// Default option values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Defaults {
    entries: BTreeMap<String, Value>,
}

impl Defaults {
    /// No defaults at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Stock defaults:
    ///
    /// - `interfaces` = [`DEFAULT_INTERFACES`]
    /// - `config` = `""`, `instruction` = `""`
    /// - `task` = `null`, `keymap` = `null`, `panels` = `null`
    /// - `user` = anonymous stub
    /// - `debug` = `false`
    pub fn builtin() -> Self {
        Self::empty()
            .with("interfaces", json!(DEFAULT_INTERFACES))
            .with("config", "")
            .with("instruction", "")
            .with("task", Value::Null)
            .with("keymap", Value::Null)
            .with("panels", Value::Null)
            .with("user", json!({ "id": 1, "firstName": "", "lastName": "" }))
            .with("debug", false)
    }

    /// Adds or replaces one default.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Looks up a default.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Iterates `(key, value)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Number of defaults.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no defaults.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<serde_json::Map<String, Value>> for Defaults {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self {
            entries: map.into_iter().collect(),
        }
    }
}
