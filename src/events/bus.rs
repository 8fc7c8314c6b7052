//! # Event bus for instance-scoped publish/subscribe.
//!
//! [`EventBus`] maps event names to ordered listener lists. Each instance owns
//! one; clones share the same table so the store can emit into it.
//!
//! ## Architecture
//! ```text
//! Host:   on("submitAnnotation", cb) ──┐
//! Legacy: onSubmitAnnotation option  ──┼──► EventBus ◄── emit(event, payload) ── Store
//!                                      │   (name → [L1, L2, ...])
//!                                      ▼
//!                           L1(payload), L2(payload), ...   (registration order)
//! ```
//!
//! ## Rules
//! - **Order**: listeners run in registration order; duplicates are kept and all run.
//! - **Isolation**: a failing or panicking listener is logged and skipped; siblings still run
//!   and the emitter never sees the error.
//! - **Snapshot**: `emit` iterates a snapshot, so listeners may call `on`/`off` re-entrantly.
//!   Changes take effect from the next emission.
//! - **No global namespace**: there is no bus shared across instances.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tracing::warn;

use crate::error::{ListenerError, panic_info};

use super::listener::{Callback, Listener};

/// Outcome of one emission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Listeners that completed successfully.
    pub delivered: usize,
    /// Listeners that failed, panicked, or were not callable.
    pub failed: usize,
}

impl EmitReport {
    /// Total listeners invoked.
    pub fn total(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Instance-scoped listener table.
///
/// ### Properties
/// - **Synchronous**: `emit()` runs every listener before returning.
/// - **Cloneable**: cheap to clone (`Arc`-backed table).
#[derive(Clone, Default)]
pub struct EventBus {
    table: Arc<Mutex<HashMap<String, Vec<Listener>>>>,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Listener>>> {
        // Listeners never run under this lock, so a poisoned table is still consistent.
        self.table.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Registers `callback` under `event`.
    pub fn on(&self, event: impl Into<String>, callback: Callback) {
        self.subscribe(event, Listener::Callable(callback));
    }

    /// Registers any listener (callable or inert) under `event`.
    pub fn subscribe(&self, event: impl Into<String>, listener: Listener) {
        self.lock().entry(event.into()).or_default().push(listener);
    }

    /// Removes listeners from `event`.
    ///
    /// - `Some(cb)` removes every registration made with `cb` (by identity).
    /// - `None` removes all listeners of `event`.
    pub fn off(&self, event: &str, callback: Option<&Callback>) {
        match callback {
            Some(cb) => {
                let mut table = self.lock();
                if let Some(list) = table.get_mut(event) {
                    list.retain(|l| !l.is(cb));
                    if list.is_empty() {
                        table.remove(event);
                    }
                }
            }
            None => self.remove_all(event),
        }
    }

    /// Removes every listener registered under `event`.
    pub fn remove_all(&self, event: &str) {
        self.lock().remove(event);
    }

    /// Number of listeners registered under `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.lock().get(event).map_or(0, Vec::len)
    }

    /// True if no event has listeners.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Invokes every listener of `event` in registration order.
    ///
    /// Failures are logged with their label and counted; they never propagate.
    pub fn emit(&self, event: &str, payload: &Value) -> EmitReport {
        let listeners: Vec<Listener> = match self.lock().get(event) {
            Some(list) => list.clone(),
            None => return EmitReport::default(),
        };

        let mut report = EmitReport::default();
        for listener in &listeners {
            let outcome = catch_unwind(AssertUnwindSafe(|| listener.invoke(event, payload)))
                .unwrap_or_else(|panic| {
                    Err(ListenerError::Panicked {
                        event: event.to_string(),
                        info: panic_info(&*panic),
                    })
                });

            match outcome {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    warn!(event, label = err.as_label(), "{}", err.as_message());
                    report.failed += 1;
                }
            }
        }
        report
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.lock();
        let mut names: Vec<&String> = table.keys().collect();
        names.sort_unstable();
        f.debug_struct("EventBus").field("events", &names).finish()
    }
}
