//! # Rendering contract.
//!
//! The crate never touches the host document directly. It drives a
//! [`Renderer`] with an opaque [`RootHandle`] and an [`AppTree`] describing
//! what to show.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::Store;

/// Opaque handle to a node in the host document.
///
/// Two handles are equal when they name the same node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RootHandle(Arc<str>);

impl RootHandle {
    /// Creates a handle from a host-side identifier.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Host-side identifier.
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RootHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RootHandle {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A panel resolved by the [`PanelRegistry`](super::PanelRegistry).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Panel {
    /// Panel name.
    pub name: String,
    /// Panel-specific properties.
    pub props: Value,
}

impl Panel {
    /// Panel with no properties.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            props: Value::Null,
        }
    }
}

/// The component tree handed to the renderer.
#[derive(Clone)]
pub struct AppTree {
    /// Store the tree renders.
    pub store: Arc<dyn Store>,
    /// Panels registered for this render.
    pub panels: Vec<Panel>,
}

impl fmt::Debug for AppTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppTree")
            .field("panels", &self.panels)
            .finish_non_exhaustive()
    }
}

/// Identifies the renderer-internal markers left on host nodes by one mounted tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TreeKey(pub String);

/// Rendering engine primitives.
///
/// Calls arrive from the instance and from [`AppControls`](crate::AppControls);
/// implementations must be callable from any thread.
pub trait Renderer: Send + Sync + 'static {
    /// Renders `tree` into `target`.
    fn render(&self, target: &RootHandle, tree: AppTree);

    /// True if `target` currently has child nodes.
    fn has_children(&self, target: &RootHandle) -> bool;

    /// Marker key of the tree mounted in `target`, read from its first child.
    fn tree_key(&self, target: &RootHandle) -> Option<TreeKey>;

    /// Unmounts whatever is mounted in `target`. Returns `true` if a tree was removed.
    fn unmount(&self, target: &RootHandle) -> bool;

    /// Removes markers carrying `key` from `target` and the nodes it used to hold.
    ///
    /// Unmount alone does not release them.
    fn clean_markers(&self, target: &RootHandle, key: &TreeKey);
}
