use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::debug;

use crate::{
    config::{Defaults, Options, Settings, merge},
    error::LifecycleError,
    events::{EventBus, LegacyCatalog, subscribe_legacy},
    host::{FF_MEMORY_LEAK_FIX, RootHandle, Services},
};

use super::{
    instance::{LabelStudio, Parts},
    registry::Registry,
};

/// Builder for constructing a [`LabelStudio`] instance.
pub struct LabelStudioBuilder {
    root: RootHandle,
    services: Services,
    options: Option<Options>,
    defaults: Defaults,
    catalog: LegacyCatalog,
    settings: Settings,
    registry: Option<Arc<Registry>>,
}

impl LabelStudioBuilder {
    /// Creates a new builder for `root` with stock defaults and settings.
    pub fn new(root: RootHandle, services: Services) -> Self {
        Self {
            root,
            services,
            options: None,
            defaults: Defaults::builtin(),
            catalog: LegacyCatalog::default(),
            settings: Settings::default(),
            registry: None,
        }
    }

    /// Sets caller options.
    pub fn options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Sets caller options; `None` behaves like an empty record.
    pub fn maybe_options(mut self, options: Option<Options>) -> Self {
        self.options = options;
        self
    }

    /// Replaces the default record options are merged onto.
    pub fn defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Replaces the legacy callback catalog.
    pub fn legacy_catalog(mut self, catalog: LegacyCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Sets lifecycle settings.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Registers the instance in `registry` instead of [`Registry::global`].
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Builds the instance and schedules materialization.
    ///
    /// Must be called from within a tokio runtime. Runs, in order:
    /// - config merge
    /// - keymap forwarding to the hotkey service
    /// - event bus creation and legacy callback subscription
    /// - teardown strategy selection
    /// - registration, then materialization on the current runtime
    pub fn build(self) -> Result<LabelStudio, LifecycleError> {
        let runtime = Handle::try_current().map_err(|_| LifecycleError::NoRuntime)?;

        let config = Arc::new(merge(&self.defaults, self.options));
        if let Some(keymap) = config.keymap() {
            self.services.hotkeys.set_keymap(keymap);
        }

        let bus = EventBus::new();
        let legacy = subscribe_legacy(&self.catalog, &config, &bus);

        let flag = self.services.flags.is_enabled(FF_MEMORY_LEAK_FIX);
        let teardown = self.settings.resolve_teardown(flag);
        let registry = self.registry.unwrap_or_else(Registry::global);

        let instance = LabelStudio::from_parts(Parts {
            root: self.root,
            config,
            bus,
            services: self.services,
            settings: self.settings,
            teardown,
            registry: Arc::downgrade(&registry),
        });
        debug!(
            instance = %instance.id(),
            root = %instance.root(),
            legacy,
            ?teardown,
            "instance constructed"
        );

        registry.add(&instance);
        instance.begin_materialize(&runtime);
        Ok(instance)
    }
}
