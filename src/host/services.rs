//! # Host services consumed by an instance.
//!
//! [`Services`] bundles every collaborator behind `Arc<dyn …>`. Only the
//! [`Renderer`] and [`StoreFactory`] are mandatory; the rest default to no-op
//! implementations.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use super::{Panel, Renderer, StoreFactory};

/// Feature flag selecting the eager, leak-avoiding teardown.
pub const FF_MEMORY_LEAK_FIX: &str = "fflag_fix_front_lsdv_4620_memory_leaks_100723_short";

/// Resolves the panel list for a render.
pub trait PanelRegistry: Send + Sync + 'static {
    /// Panels to show, given the caller's `panels` override (if any).
    fn register(&self, panels: Option<&Value>) -> Vec<Panel>;
}

/// Process-wide hotkey service.
pub trait Hotkeys: Send + Sync + 'static {
    /// Replaces the active keymap.
    fn set_keymap(&self, keymap: &Value);
}

/// Shared cross-instance choice-group state.
pub trait SharedChoices: Send + Sync + 'static {
    /// Tears down shared choice groups owned by the instance being destroyed.
    fn destroy(&self);
}

/// Feature-flag lookup.
pub trait FeatureFlags: Send + Sync + 'static {
    /// True if `flag` is enabled.
    fn is_enabled(&self, flag: &str) -> bool;
}

/// Panel registry with no panels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPanels;

impl PanelRegistry for NoPanels {
    fn register(&self, _panels: Option<&Value>) -> Vec<Panel> {
        Vec::new()
    }
}

/// Hotkey service that ignores keymaps.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHotkeys;

impl Hotkeys for NoHotkeys {
    fn set_keymap(&self, _keymap: &Value) {}
}

/// No shared choice state.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSharedChoices;

impl SharedChoices for NoSharedChoices {
    fn destroy(&self) {}
}

/// Fixed set of enabled flags.
#[derive(Debug, Default, Clone)]
pub struct StaticFlags {
    enabled: HashSet<String>,
}

impl StaticFlags {
    /// Flags from a list of enabled names.
    pub fn new<S: Into<String>>(enabled: impl IntoIterator<Item = S>) -> Self {
        Self {
            enabled: enabled.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds an enabled flag.
    pub fn enable(mut self, flag: impl Into<String>) -> Self {
        self.enabled.insert(flag.into());
        self
    }
}

impl FeatureFlags for StaticFlags {
    fn is_enabled(&self, flag: &str) -> bool {
        self.enabled.contains(flag)
    }
}

/// Collaborators of one instance.
#[derive(Clone)]
pub struct Services {
    /// Rendering engine.
    pub renderer: Arc<dyn Renderer>,
    /// Store factory.
    pub factory: Arc<dyn StoreFactory>,
    /// Panel registry (default: [`NoPanels`]).
    pub panels: Arc<dyn PanelRegistry>,
    /// Hotkey service (default: [`NoHotkeys`]).
    pub hotkeys: Arc<dyn Hotkeys>,
    /// Shared choice-group teardown (default: [`NoSharedChoices`]).
    pub shared_choices: Arc<dyn SharedChoices>,
    /// Feature flags (default: nothing enabled).
    pub flags: Arc<dyn FeatureFlags>,
}

impl Services {
    /// Services with the mandatory collaborators and no-op defaults elsewhere.
    pub fn new(renderer: Arc<dyn Renderer>, factory: Arc<dyn StoreFactory>) -> Self {
        Self {
            renderer,
            factory,
            panels: Arc::new(NoPanels),
            hotkeys: Arc::new(NoHotkeys),
            shared_choices: Arc::new(NoSharedChoices),
            flags: Arc::new(StaticFlags::default()),
        }
    }

    /// Sets the panel registry.
    pub fn with_panels(mut self, panels: Arc<dyn PanelRegistry>) -> Self {
        self.panels = panels;
        self
    }

    /// Sets the hotkey service.
    pub fn with_hotkeys(mut self, hotkeys: Arc<dyn Hotkeys>) -> Self {
        self.hotkeys = hotkeys;
        self
    }

    /// Sets the shared choice-group teardown.
    pub fn with_shared_choices(mut self, shared: Arc<dyn SharedChoices>) -> Self {
        self.shared_choices = shared;
        self
    }

    /// Sets the feature-flag lookup.
    pub fn with_flags(mut self, flags: Arc<dyn FeatureFlags>) -> Self {
        self.flags = flags;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_flags() {
        let flags = StaticFlags::new(["a"]).enable(FF_MEMORY_LEAK_FIX);
        assert!(flags.is_enabled("a"));
        assert!(flags.is_enabled(FF_MEMORY_LEAK_FIX));
        assert!(!flags.is_enabled("b"));
        assert!(!StaticFlags::default().is_enabled(FF_MEMORY_LEAK_FIX));
    }
}
