//! # Legacy callback options bridged onto the event bus.
//!
//! Hosts historically passed callbacks as options (`onSubmitAnnotation: fn`)
//! instead of calling `on(...)`. [`subscribe_legacy`] scans the merged config
//! against a [`LegacyCatalog`] and subscribes every defined value under its
//! canonical event name.
//!
//! ## Rules
//! - Runs once per instance, before materialization starts, so events fired
//!   while the store is being built already reach legacy listeners.
//! - Values are subscribed as-is: plain data becomes [`Listener::Inert`] and is
//!   reported when invoked.
//! - `null` values count as "not supplied" and are skipped.

use serde_json::Value;
use tracing::debug;

use crate::config::{Config, OptionValue};

use super::{EventBus, Listener};

/// One row of the catalog: option key and the event it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyEvent {
    /// Option key, e.g. `onSubmitAnnotation`.
    pub key: String,
    /// Canonical event name, e.g. `submitAnnotation`.
    pub event: String,
}

/// Built-in `(key, event)` pairs.
const BUILTIN: &[(&str, &str)] = &[
    ("onSubmitAnnotation", "submitAnnotation"),
    ("onUpdateAnnotation", "updateAnnotation"),
    ("onDeleteAnnotation", "deleteAnnotation"),
    ("onSkipTask", "skipTask"),
    ("onUnskipTask", "unskipTask"),
    ("onGroundTruth", "groundTruth"),
    ("onEntityCreate", "entityCreate"),
    ("onEntityDelete", "entityDelete"),
    ("onLabelStudioLoad", "labelStudioLoad"),
    ("onTaskLoad", "taskLoad"),
    ("onStorageInitialized", "storageInitialized"),
    ("onSubmitDraft", "submitDraft"),
    ("onSelectAnnotation", "selectAnnotation"),
    ("onAcceptAnnotation", "acceptAnnotation"),
    ("onRejectAnnotation", "rejectAnnotation"),
    ("onNextTask", "nextTask"),
    ("onPrevTask", "prevTask"),
];

/// Declarative table of recognized legacy option keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyCatalog {
    entries: Vec<LegacyEvent>,
}

impl LegacyCatalog {
    /// Empty catalog (no legacy options recognized).
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Catalog from explicit `(key, event)` pairs.
    pub fn from_pairs<K, E>(pairs: impl IntoIterator<Item = (K, E)>) -> Self
    where
        K: Into<String>,
        E: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(key, event)| LegacyEvent {
                    key: key.into(),
                    event: event.into(),
                })
                .collect(),
        }
    }

    /// Catalog from option keys, deriving event names with [`normalize_legacy_key`].
    pub fn from_keys<K: AsRef<str>>(keys: impl IntoIterator<Item = K>) -> Self {
        Self::from_pairs(
            keys.into_iter()
                .map(|k| (k.as_ref().to_string(), normalize_legacy_key(k.as_ref()))),
        )
    }

    /// Adds one mapping.
    pub fn with(mut self, key: impl Into<String>, event: impl Into<String>) -> Self {
        self.entries.push(LegacyEvent {
            key: key.into(),
            event: event.into(),
        });
        self
    }

    /// Canonical event for `key`, if recognized.
    pub fn event_for(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.event.as_str())
    }

    /// Iterates over all mappings in table order.
    pub fn iter(&self) -> impl Iterator<Item = &LegacyEvent> {
        self.entries.iter()
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the catalog has no mappings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LegacyCatalog {
    /// The built-in table.
    fn default() -> Self {
        Self::from_pairs(BUILTIN.iter().copied())
    }
}

/// Derives an event name from a legacy key: strip a leading `on`, then lower-camel-case.
///
/// Separators (`_`, `-`, space) start a new capitalized word.
///
/// # Example
/// ```
/// use studiovisor::normalize_legacy_key;
///
/// assert_eq!(normalize_legacy_key("onLabelStudioLoad"), "labelStudioLoad");
/// assert_eq!(normalize_legacy_key("on_task_load"), "taskLoad");
/// ```
pub fn normalize_legacy_key(key: &str) -> String {
    let rest = key.strip_prefix("on").unwrap_or(key);
    let mut out = String::with_capacity(rest.len());
    let mut upper_next = false;

    for ch in rest.chars() {
        if matches!(ch, '_' | '-' | ' ') {
            upper_next = !out.is_empty();
            continue;
        }
        if out.is_empty() {
            out.extend(ch.to_lowercase());
        } else if upper_next {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        upper_next = false;
    }
    out
}

/// Subscribes every catalog key defined in `config` onto `bus`.
///
/// Returns the number of subscriptions made.
pub fn subscribe_legacy(catalog: &LegacyCatalog, config: &Config, bus: &EventBus) -> usize {
    let mut count = 0;
    for entry in catalog.iter() {
        let listener = match config.get(&entry.key) {
            None | Some(OptionValue::Value(Value::Null)) => continue,
            Some(OptionValue::Callback(cb)) => Listener::Callable(cb.clone()),
            Some(OptionValue::Value(v)) => Listener::Inert(v.clone()),
        };
        debug!(key = %entry.key, event = %entry.event, "legacy listener subscribed");
        bus.subscribe(entry.event.clone(), listener);
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Defaults, Options, merge};
    use crate::events::callback;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_builtin_table_follows_naming_rule() {
        for entry in LegacyCatalog::default().iter() {
            assert_eq!(
                normalize_legacy_key(&entry.key),
                entry.event,
                "row {} drifted from the naming rule",
                entry.key
            );
        }
    }

    #[test]
    fn test_normalize_without_prefix() {
        assert_eq!(normalize_legacy_key("Submit"), "submit");
        assert_eq!(normalize_legacy_key("on"), "");
        assert_eq!(normalize_legacy_key("onX"), "x");
        assert_eq!(normalize_legacy_key("on-ground-truth"), "groundTruth");
    }

    #[test]
    fn test_subscribes_defined_values_only() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_cb = Arc::clone(&hits);
        let opts = Options::new()
            .callback("onLabelStudioLoad", move |_| {
                hits_cb.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .set("onTaskLoad", Value::Null)
            .set("onSkipTask", "not a function")
            .callback("onUnknownThing", |_| Ok(()));

        let config = merge(&Defaults::empty(), Some(opts));
        let bus = EventBus::new();

        assert_eq!(subscribe_legacy(&LegacyCatalog::default(), &config, &bus), 2);
        assert_eq!(bus.listener_count("taskLoad"), 0);
        assert_eq!(bus.listener_count("unknownThing"), 0);

        let report = bus.emit("labelStudioLoad", &Value::Null);
        assert_eq!(report.delivered, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let report = bus.emit("skipTask", &Value::Null);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_custom_catalog() {
        let catalog = LegacyCatalog::from_keys(["onRegionFinishedDrawing"]).with("onBoom", "kaboom");
        assert_eq!(catalog.event_for("onRegionFinishedDrawing"), Some("regionFinishedDrawing"));
        assert_eq!(catalog.event_for("onBoom"), Some("kaboom"));
        assert_eq!(catalog.len(), 2);

        let opts = Options::new().with_callback("onBoom", callback(|_| Ok(())));
        let bus = EventBus::new();
        subscribe_legacy(&catalog, &merge(&Defaults::empty(), Some(opts)), &bus);
        assert_eq!(bus.listener_count("kaboom"), 1);
    }
}
