//! Host collaborators: contracts the lifecycle consumes but does not implement.
//!
//! ## Contents
//! - [`Renderer`], [`RootHandle`], [`AppTree`] rendering engine primitives
//! - [`Store`], [`StoreFactory`], [`Materialized`] asynchronous store construction
//! - [`PanelRegistry`], [`Hotkeys`], [`SharedChoices`], [`FeatureFlags`] side services
//! - [`Services`] the bundle handed to the instance builder

mod render;
mod services;
mod store;

pub use render::{AppTree, Panel, Renderer, RootHandle, TreeKey};
pub use services::{
    FF_MEMORY_LEAK_FIX, FeatureFlags, Hotkeys, NoHotkeys, NoPanels, NoSharedChoices,
    PanelRegistry, Services, SharedChoices, StaticFlags,
};
pub use store::{FactoryFn, Materialized, Store, StoreFactory};
