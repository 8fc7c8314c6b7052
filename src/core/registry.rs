//! # Instance registry - process-wide set of live instances.
//!
//! Every instance joins a [`Registry`] at construction. The [`Full`](crate::Teardown::Full)
//! teardown removes it again; the [`Legacy`](crate::Teardown::Legacy) teardown does not,
//! which leaves [`Registry::destroy_all`] as the only guaranteed cleanup path.
//!
//! ## Architecture
//! ```text
//! LabelStudio::build() ──► Registry.add(instance)
//! destroy() [Full]     ──► Registry.remove(id)
//! destroy_all()        ──► snapshot ─► instance.destroy() (each, isolated) ─► clear
//! ```
//!
//! ## Rules
//! - Keyed by [`InstanceId`]; no ordering guarantee beyond sorted `ids()`.
//! - Instances are destroyed outside the registry lock, so their teardown may
//!   call back into the registry.
//! - A panicking teardown never stops the rest of a bulk teardown.
//! - [`Registry::global`] is shared by the whole process; tests should use
//!   [`Registry::new`] or [`Registry::reset`] for isolation.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use tracing::{debug, error, info};

use crate::error::panic_info;

use super::instance::{InstanceId, LabelStudio};

static GLOBAL: LazyLock<Arc<Registry>> = LazyLock::new(Registry::new);

/// Set of live instances.
#[derive(Default)]
pub struct Registry {
    instances: Mutex<HashMap<InstanceId, LabelStudio>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Process-wide registry used when a builder is not given one.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<InstanceId, LabelStudio>> {
        self.instances.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Tracks `instance`.
    pub fn add(&self, instance: &LabelStudio) {
        self.lock().insert(instance.id(), instance.clone());
        debug!(instance = %instance.id(), "registered");
    }

    /// Stops tracking `id`. Returns `true` if it was tracked.
    pub fn remove(&self, id: InstanceId) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            debug!(instance = %id, "unregistered");
        }
        removed
    }

    /// True if `id` is tracked.
    pub fn contains(&self, id: InstanceId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Number of tracked instances.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns sorted list of tracked ids.
    pub fn ids(&self) -> Vec<InstanceId> {
        let mut ids: Vec<InstanceId> = self.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Calls `f` on a snapshot of the tracked instances (outside the lock).
    pub fn for_each(&self, mut f: impl FnMut(&LabelStudio)) {
        for instance in self.snapshot() {
            f(&instance);
        }
    }

    /// Destroys every tracked instance, then clears the registry.
    ///
    /// The registry ends empty whatever each instance's teardown strategy does.
    pub fn destroy_all(&self) {
        let instances = self.snapshot();
        let total = instances.len();

        for instance in &instances {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| instance.destroy())) {
                error!(
                    instance = %instance.id(),
                    "destroy panicked during bulk teardown: {}",
                    panic_info(&*panic)
                );
            }
        }

        self.lock().clear();
        info!(total, "all instances destroyed");
    }

    /// Forgets every instance without destroying it.
    pub fn reset(&self) {
        self.lock().clear();
    }

    fn snapshot(&self) -> Vec<LabelStudio> {
        let guard = self.lock();
        let mut instances: Vec<LabelStudio> = guard.values().cloned().collect();
        instances.sort_unstable_by_key(LabelStudio::id);
        instances
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("ids", &self.ids()).finish()
    }
}
