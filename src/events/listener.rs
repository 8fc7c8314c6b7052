//! # Event listeners.
//!
//! A [`Listener`] is what the [`EventBus`](crate::EventBus) stores per event name.
//! Most listeners are [`Callback`]s; legacy options may also carry plain data,
//! which is subscribed as-is and reported as [`ListenerError::NotCallable`]
//! when invoked.
//!
//! ## Identity
//! Callbacks are compared by allocation (`Arc` data pointer), so `off(event, &cb)`
//! removes exactly the registrations made with clones of `cb`.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ListenerError;

/// Shared event callback.
///
/// Receives the emitted payload; errors are reported by the bus, never propagated.
pub type Callback = Arc<dyn Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static>;

/// Wraps a closure into a [`Callback`].
///
/// # Example
/// ```
/// use studiovisor::callback;
///
/// let cb = callback(|payload| {
///     assert!(payload.is_null());
///     Ok(())
/// });
/// assert!(cb(&serde_json::Value::Null).is_ok());
/// ```
pub fn callback<F>(f: F) -> Callback
where
    F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Compares two callbacks by allocation, ignoring vtable pointers.
pub(crate) fn same_callback(a: &Callback, b: &Callback) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// A registration stored on the bus.
#[derive(Clone)]
pub enum Listener {
    /// Invocable callback.
    Callable(Callback),
    /// Plain value subscribed without validation (legacy options).
    Inert(Value),
}

impl Listener {
    /// Invokes the listener for `event`.
    pub(crate) fn invoke(&self, event: &str, payload: &Value) -> Result<(), ListenerError> {
        match self {
            Listener::Callable(cb) => cb(payload).map_err(|e| ListenerError::Failed {
                event: event.to_string(),
                error: format!("{e:#}"),
            }),
            Listener::Inert(_) => Err(ListenerError::NotCallable {
                event: event.to_string(),
            }),
        }
    }

    /// True if this registration was made with `cb`.
    pub(crate) fn is(&self, cb: &Callback) -> bool {
        match self {
            Listener::Callable(own) => same_callback(own, cb),
            Listener::Inert(_) => false,
        }
    }
}

impl From<Callback> for Listener {
    fn from(cb: Callback) -> Self {
        Listener::Callable(cb)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listener::Callable(cb) => write!(f, "Callable({:p})", Arc::as_ptr(cb)),
            Listener::Inert(v) => f.debug_tuple("Inert").field(v).finish(),
        }
    }
}
