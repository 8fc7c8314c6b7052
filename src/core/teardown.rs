//! # Teardown strategies.
//!
//! [`Teardown`] determines which steps `destroy()` runs and in what order.
//! A strategy is picked once per instance at construction (from
//! [`Settings::teardown`](crate::Settings::teardown) or the
//! [`FF_MEMORY_LEAK_FIX`](crate::FF_MEMORY_LEAK_FIX) flag) and never re-evaluated.
//!
//! ```text
//! Teardown::Full    → Unmount → SharedChoices → SelfDestroy → DestroyStore → Release
//! Teardown::Legacy  →           SharedChoices →               DestroyStore
//! ```
//!
//! **Full** clears the host root, eagerly destroys sub-stores, then drops every
//! reference and unregisters the instance. Repeated `destroy()` is a no-op.
//!
//! **Legacy** leaves the tree mounted and the instance registered; only
//! [`Registry::destroy_all`](crate::Registry::destroy_all) removes it.

use serde::{Deserialize, Serialize};

/// One teardown action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TeardownStep {
    /// Unmount the tree and clean renderer markers from the host root.
    Unmount,
    /// Tear down shared choice-group state.
    SharedChoices,
    /// Ask the store to destroy its sub-stores.
    SelfDestroy,
    /// Tear down the store's own reactive state.
    DestroyStore,
    /// Drop store/mount references and leave the registry.
    Release,
}

impl TeardownStep {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(self) -> &'static str {
        match self {
            TeardownStep::Unmount => "unmount",
            TeardownStep::SharedChoices => "shared_choices",
            TeardownStep::SelfDestroy => "self_destroy",
            TeardownStep::DestroyStore => "destroy_store",
            TeardownStep::Release => "release",
        }
    }
}

/// Named teardown strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Teardown {
    /// Eager, leak-avoiding teardown (flag on).
    Full,
    /// Minimal teardown (flag off).
    Legacy,
}

impl Teardown {
    /// Ordered steps of this strategy.
    pub fn steps(self) -> &'static [TeardownStep] {
        use TeardownStep::*;
        match self {
            Teardown::Full => &[Unmount, SharedChoices, SelfDestroy, DestroyStore, Release],
            Teardown::Legacy => &[SharedChoices, DestroyStore],
        }
    }

    /// True if the instance ends unregistered and inert.
    pub fn releases(self) -> bool {
        self.steps().contains(&TeardownStep::Release)
    }
}
