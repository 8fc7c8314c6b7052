//! # Runtime settings.
//!
//! Provides [`Settings`]: knobs that shape lifecycle behavior rather than the
//! store configuration itself.
//!
//! Settings are used in two places:
//! 1. **Destroy before mount**: [`Settings::early_destroy`] decides what a `destroy()`
//!    issued during materialization does.
//! 2. **Teardown selection**: [`Settings::teardown`] pins a strategy; when unset the
//!    feature flag [`FF_MEMORY_LEAK_FIX`](crate::FF_MEMORY_LEAK_FIX) decides.
//!
//! Settings deserialize from JSON/TOML-shaped data via `serde`:
//! ```rust
//! use studiovisor::{EarlyDestroy, Settings, Teardown};
//!
//! let s: Settings = serde_json::from_str(r#"{ "early_destroy": "discard", "teardown": "full" }"#).unwrap();
//! assert_eq!(s.early_destroy, EarlyDestroy::Discard);
//! assert_eq!(s.teardown, Some(Teardown::Full));
//! ```

use serde::{Deserialize, Serialize};

use crate::core::Teardown;

/// What `destroy()` does while the store is still materializing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarlyDestroy {
    /// Remember the request and tear down as soon as the store resolves,
    /// without mounting (default).
    #[default]
    Defer,
    /// Ignore the request; the instance mounts normally afterwards.
    Discard,
}

/// Lifecycle settings of one instance.
///
/// ## Field semantics
/// - `early_destroy`: handling of `destroy()` before materialization completes
/// - `teardown`: forced teardown strategy (`None` = select by feature flag)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Handling of `destroy()` issued before the store resolves.
    pub early_destroy: EarlyDestroy,

    /// Teardown strategy override.
    ///
    /// - `None` → [`Teardown::Full`] when the memory-leak flag is on, [`Teardown::Legacy`] otherwise
    /// - `Some(t)` → always `t`
    pub teardown: Option<Teardown>,
}

impl Settings {
    /// Returns the strategy to use given the current flag state.
    #[inline]
    pub fn resolve_teardown(&self, flag_enabled: bool) -> Teardown {
        self.teardown.unwrap_or(if flag_enabled {
            Teardown::Full
        } else {
            Teardown::Legacy
        })
    }
}
