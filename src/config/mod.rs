//! Configuration: caller options, defaults, the merged snapshot, and runtime settings.
//!
//! ## Contents
//! - [`Options`], [`OptionValue`] caller-supplied record
//! - [`Defaults`] fixed default record
//! - [`merge`], [`Config`] per-instance immutable snapshot
//! - [`Settings`], [`EarlyDestroy`] lifecycle knobs

mod defaults;
mod merge;
mod options;
mod settings;

pub use defaults::{DEFAULT_INTERFACES, Defaults};
pub use merge::{Config, merge};
pub use options::{OptionValue, Options, is_truthy};
pub use settings::{EarlyDestroy, Settings};
