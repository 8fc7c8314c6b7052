//! # Caller-supplied options.
//!
//! [`Options`] is the flat record a host passes at construction. Each entry is
//! either plain data ([`OptionValue::Value`]) or a callback
//! ([`OptionValue::Callback`]), the latter being how legacy `on…` hooks arrive.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use studiovisor::{OptionValue, Options};
//!
//! let opts = Options::new()
//!     .set("keymap", json!({ "undo": { "key": "ctrl+z" } }))
//!     .callback("onSubmitAnnotation", |_| Ok(()));
//!
//! assert!(matches!(opts.get("keymap"), Some(OptionValue::Value(_))));
//! assert!(matches!(opts.get("onSubmitAnnotation"), Some(OptionValue::Callback(_))));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use tracing::warn;

use crate::events::{Callback, callback};

/// One option value.
#[derive(Clone)]
pub enum OptionValue {
    /// Plain data.
    Value(Value),
    /// A callable hook.
    Callback(Callback),
}

impl OptionValue {
    /// Data payload, if this is not a callback.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            OptionValue::Value(v) => Some(v),
            OptionValue::Callback(_) => None,
        }
    }

    /// Callback, if this is one.
    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            OptionValue::Callback(cb) => Some(cb),
            OptionValue::Value(_) => None,
        }
    }

    /// True for `null` data.
    pub fn is_null(&self) -> bool {
        matches!(self, OptionValue::Value(Value::Null))
    }
}

impl fmt::Debug for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            OptionValue::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl From<Value> for OptionValue {
    fn from(v: Value) -> Self {
        OptionValue::Value(v)
    }
}

impl From<Callback> for OptionValue {
    fn from(cb: Callback) -> Self {
        OptionValue::Callback(cb)
    }
}

/// Caller options: option name → value.
#[derive(Clone, Debug, Default)]
pub struct Options {
    entries: BTreeMap<String, OptionValue>,
}

impl Options {
    /// Creates an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds options from a JSON value.
    ///
    /// `null` is treated as "no options". A non-object is not a valid options record;
    /// it is logged and treated the same way.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                entries: map
                    .into_iter()
                    .map(|(k, v)| (k, OptionValue::Value(v)))
                    .collect(),
            },
            Value::Null => Self::default(),
            other => {
                warn!(kind = json_kind(&other), "options must be an object; ignoring");
                Self::default()
            }
        }
    }

    /// Sets a data option.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries
            .insert(key.into(), OptionValue::Value(value.into()));
        self
    }

    /// Sets a callback option from a closure.
    pub fn callback<F>(self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.with_callback(key, callback(f))
    }

    /// Sets a callback option from an existing [`Callback`] (keeps its identity).
    pub fn with_callback(mut self, key: impl Into<String>, cb: Callback) -> Self {
        self.entries.insert(key.into(), OptionValue::Callback(cb));
        self
    }

    /// Inserts any option value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Looks up an option.
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    /// Number of options set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no option is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> BTreeMap<String, OptionValue> {
        self.entries
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JavaScript-style truthiness for option data.
///
/// `null`, `false`, `0` and `""` are falsy; everything else,
/// including empty arrays and objects, is truthy.
pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
