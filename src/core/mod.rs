//! Lifecycle core: instances, their registry, mounting, and teardown.
//!
//! The only entry point is [`LabelStudio`] (built through [`LabelStudioBuilder`]);
//! everything else here supports its lifecycle.
//!
//! Internal modules:
//! - [`instance`]: instance state machine, materialization, destroy dispatch;
//! - [`builder`]: construction sequence;
//! - [`registry`]: process-wide set of live instances;
//! - [`mount`]: render/clear of the tree and the [`AppControls`] surface;
//! - [`teardown`]: named teardown strategies.

mod builder;
mod instance;
mod mount;
mod registry;
mod teardown;

pub use builder::LabelStudioBuilder;
pub use instance::{InstanceId, LabelStudio, Phase};
pub use mount::AppControls;
pub use registry::Registry;
pub use teardown::{Teardown, TeardownStep};
