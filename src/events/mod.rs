//! Instance events: listeners, the bus, and the legacy option bridge.
//!
//! ## Contents
//! - [`Listener`], [`Callback`] what the bus stores per event name
//! - [`EventBus`] ordered, instance-scoped publish/subscribe
//! - [`LegacyCatalog`], [`subscribe_legacy`] bridge `on…` options onto the bus
//!
//! ## Quick reference
//! - **Publishers**: the store (through the bus handed to it at materialization).
//! - **Subscribers**: host code via `LabelStudio::on`, legacy options at construction.

mod bus;
mod legacy;
mod listener;

pub use bus::{EmitReport, EventBus};
pub use legacy::{LegacyCatalog, LegacyEvent, normalize_legacy_key, subscribe_legacy};
pub use listener::{Callback, Listener, callback};
