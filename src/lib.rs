//! # studiovisor
//!
//! **Studiovisor** is the lifecycle controller for an embedded, single-root
//! annotation-tool widget living inside a host page.
//!
//! It owns the full life of one embedded instance: merging caller options onto
//! defaults, bridging legacy `on…` callback options onto an instance event bus,
//! materializing the reactive store asynchronously, rendering into the host root,
//! handing the store a small mount control surface, and running an ordered,
//! strategy-driven teardown.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   host page ──► LabelStudio::builder(root, services).options(..).build()
//!                        │
//!                        ├─► merge(Defaults, Options) ─► Config (immutable, Arc)
//!                        ├─► Hotkeys::set_keymap(config.keymap)        (if truthy)
//!                        ├─► EventBus::new()
//!                        ├─► subscribe_legacy(LegacyCatalog, Config, EventBus)
//!                        ├─► Teardown = Settings.teardown ∨ flag(FF_MEMORY_LEAK_FIX)
//!                        ├─► Registry.add(instance)
//!                        └─► spawn materialize()
//!                                  │
//!                                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │ StoreFactory::configure(Config, EventBus).await ─► Materialized    │
//! │   ├─ destroy queued? ─► Teardown steps (no Unmount) ─► end        │
//! │   └─ Mount::render() into get_root(root)                          │
//! │      Store::set_app_controls(AppControls { is_rendered, render,   │
//! │                                            clear })               │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! Uninitialized ─► Materializing ─► Mounted ⇄ Cleared ─► Destroyed (Full)
//!                        │                             └► Released  (Legacy)
//!                        └─► Failed
//! ```
//!
//! ### Teardown
//! ```text
//! Full   : Unmount → SharedChoices → SelfDestroy → DestroyStore → Release
//! Legacy :           SharedChoices →               DestroyStore
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types                                 |
//! |-------------------|------------------------------------------------------------------|-------------------------------------------|
//! | **Instances**     | Build, observe, and destroy embedded sessions.                   | [`LabelStudio`], [`Phase`]                |
//! | **Registry**      | Process-wide tracking and bulk teardown.                         | [`Registry`]                              |
//! | **Events**        | Ordered per-instance pub/sub and the legacy option bridge.       | [`EventBus`], [`LegacyCatalog`]           |
//! | **Configuration** | Defaults + options merge, lifecycle settings.                    | [`Config`], [`Options`], [`Settings`]     |
//! | **Teardown**      | Named strategies selected once per instance.                     | [`Teardown`], [`TeardownStep`]            |
//! | **Host**          | Collaborator contracts (renderer, store, flags, hotkeys, ...).   | [`Services`], [`Renderer`], [`Store`]     |
//! | **Errors**        | Typed lifecycle and listener errors.                             | [`LifecycleError`], [`ListenerError`]     |
//!
//! ## Logging
//! All diagnostics go through [`tracing`]; install a subscriber in the host to see them.

mod config;
mod core;
mod error;
mod events;
mod host;

// ---- Public re-exports ----

pub use config::{
    Config, DEFAULT_INTERFACES, Defaults, EarlyDestroy, OptionValue, Options, Settings, is_truthy,
    merge,
};
pub use self::core::{
    AppControls, InstanceId, LabelStudio, LabelStudioBuilder, Phase, Registry, Teardown,
    TeardownStep,
};
pub use error::{LifecycleError, ListenerError};
pub use events::{
    Callback, EmitReport, EventBus, LegacyCatalog, LegacyEvent, Listener, callback,
    normalize_legacy_key, subscribe_legacy,
};
pub use host::{
    AppTree, FF_MEMORY_LEAK_FIX, FactoryFn, FeatureFlags, Hotkeys, Materialized, NoHotkeys,
    NoPanels, NoSharedChoices, Panel, PanelRegistry, Renderer, RootHandle, Services,
    SharedChoices, StaticFlags, Store, StoreFactory, TreeKey,
};
