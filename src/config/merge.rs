//! # Configuration merge.
//!
//! [`merge`] overlays caller [`Options`] onto [`Defaults`] and freezes the
//! result into a [`Config`] snapshot.
//!
//! ## Rules
//! - Absent options (`None`) behave like an empty record.
//! - The merge is shallow: a caller key replaces the default wholesale, including
//!   with an explicit `null`.
//! - Default values are deep-copied, so no two snapshots share structure.
//! - A snapshot is never mutated after construction.

use std::collections::BTreeMap;

use serde_json::Value;

use super::{Defaults, OptionValue, Options, is_truthy};

/// Immutable merged configuration of one instance.
#[derive(Clone, Debug, Default)]
pub struct Config {
    entries: BTreeMap<String, OptionValue>,
}

impl Config {
    /// Looks up an option.
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    /// Data value for `key` (`None` for missing keys and callbacks).
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(OptionValue::as_value)
    }

    /// Keymap override, when one is set to a truthy value.
    pub fn keymap(&self) -> Option<&Value> {
        self.value("keymap").filter(|v| is_truthy(v))
    }

    /// Panel-list override (`None` when absent or `null`).
    pub fn panels(&self) -> Option<&Value> {
        self.value("panels").filter(|v| !v.is_null())
    }

    /// True if `key` is present (even as `null`).
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Option names in key order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates `(key, value)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Data entries as a JSON object; callbacks are omitted.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .filter_map(|(k, v)| v.as_value().map(|v| (k.clone(), v.clone())))
                .collect(),
        )
    }
}

/// Produces a fresh snapshot: `defaults` overlaid by `options`.
pub fn merge(defaults: &Defaults, options: Option<Options>) -> Config {
    let mut entries: BTreeMap<String, OptionValue> = defaults
        .iter()
        .map(|(k, v)| (k.clone(), OptionValue::Value(v.clone())))
        .collect();

    if let Some(options) = options {
        entries.extend(options.into_entries());
    }

    Config { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> Defaults {
        Defaults::empty()
            .with("interfaces", json!(["panel", "submit"]))
            .with("debug", false)
            .with("user", json!({ "id": 1 }))
    }

    #[test]
    fn test_absent_options_yield_defaults() {
        let cfg = merge(&defaults(), None);
        assert_eq!(cfg.keys().collect::<Vec<_>>(), vec!["debug", "interfaces", "user"]);
        assert_eq!(cfg.value("debug"), Some(&json!(false)));
    }

    #[test]
    fn test_caller_overrides_top_level_only() {
        let d = defaults();
        let cfg = merge(
            &d,
            Some(Options::new().set("user", json!({ "name": "x" })).set("extra", 3)),
        );

        assert_eq!(cfg.value("user"), Some(&json!({ "name": "x" })));
        assert_eq!(cfg.value("extra"), Some(&json!(3)));
        assert_eq!(cfg.value("interfaces"), Some(&json!(["panel", "submit"])));
        assert_eq!(d.get("user"), Some(&json!({ "id": 1 })));
    }

    #[test]
    fn test_explicit_null_overrides_default() {
        let cfg = merge(&defaults(), Some(Options::new().set("debug", Value::Null)));
        assert!(cfg.contains("debug"));
        assert_eq!(cfg.value("debug"), Some(&Value::Null));
    }

    #[test]
    fn test_snapshots_are_independent() {
        let d = defaults();
        let a = merge(&d, None);
        let b = merge(&d, None);
        assert_eq!(a.to_json(), b.to_json());
        assert!(!std::ptr::eq(
            a.value("interfaces").unwrap(),
            b.value("interfaces").unwrap()
        ));
    }

    #[test]
    fn test_keymap_and_panels_accessors() {
        let cfg = merge(&Defaults::builtin(), None);
        assert!(cfg.keymap().is_none());
        assert!(cfg.panels().is_none());

        let cfg = merge(
            &Defaults::builtin(),
            Some(
                Options::new()
                    .set("keymap", json!({ "undo": "ctrl+z" }))
                    .set("panels", json!(["outliner"])),
            ),
        );
        assert_eq!(cfg.keymap(), Some(&json!({ "undo": "ctrl+z" })));
        assert_eq!(cfg.panels(), Some(&json!(["outliner"])));

        let cfg = merge(&Defaults::builtin(), Some(Options::new().set("keymap", false)));
        assert!(cfg.keymap().is_none());
    }

    #[test]
    fn test_to_json_skips_callbacks() {
        let opts = Options::new().callback("onTaskLoad", |_| Ok(())).set("a", 1);
        let cfg = merge(&Defaults::empty(), Some(opts));
        assert_eq!(cfg.to_json(), json!({ "a": 1 }));
    }
}
