//! # Mount and the control surface handed to the store.
//!
//! A [`Mount`] binds one store to one concrete mount point. The store never
//! owns it: it only receives [`AppControls`], a weak capability that can query
//! and re-render the tree but cannot keep the host root alive.
//!
//! ## Rules
//! - `render()` clears any previous tree first, so repeated renders leave exactly one tree.
//! - `clear()` unmounts and then removes leftover renderer markers; on an empty
//!   root it is a no-op.
//! - After teardown drops the mount, every control is a no-op and
//!   `is_rendered()` reports `false`.
//! - The rendered flag is only locked to read or write it; renderer and panel
//!   calls run unlocked, so the tree may call back into [`AppControls`].

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde_json::Value;
use tracing::debug;

use crate::host::{AppTree, PanelRegistry, Renderer, RootHandle, Store};

/// Store's tree mounted into a concrete host node.
pub(crate) struct Mount {
    renderer: Arc<dyn Renderer>,
    panels: Arc<dyn PanelRegistry>,
    panels_override: Option<Value>,
    store: Arc<dyn Store>,
    target: RootHandle,
    rendered: Mutex<bool>,
}

impl Mount {
    pub(crate) fn new(
        renderer: Arc<dyn Renderer>,
        panels: Arc<dyn PanelRegistry>,
        panels_override: Option<Value>,
        store: Arc<dyn Store>,
        target: RootHandle,
    ) -> Arc<Self> {
        Arc::new(Self {
            renderer,
            panels,
            panels_override,
            store,
            target,
            rendered: Mutex::new(false),
        })
    }

    fn state(&self) -> MutexGuard<'_, bool> {
        self.rendered.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Mount point the tree renders into.
    pub(crate) fn target(&self) -> &RootHandle {
        &self.target
    }

    pub(crate) fn is_rendered(&self) -> bool {
        *self.state()
    }

    /// Unmounts any previous tree and renders a fresh one.
    pub(crate) fn render(&self) {
        self.clear();

        let tree = AppTree {
            store: Arc::clone(&self.store),
            panels: self.panels.register(self.panels_override.as_ref()),
        };
        self.renderer.render(&self.target, tree);
        *self.state() = true;
        debug!(root = %self.target, "tree rendered");
    }

    /// Unmounts the tree without rendering a new one.
    pub(crate) fn clear(&self) {
        if !self.renderer.has_children(&self.target) {
            *self.state() = false;
            return;
        }

        // Read before unmounting: the key lives on the first child.
        let key = self.renderer.tree_key(&self.target);
        self.renderer.unmount(&self.target);
        if let Some(key) = key {
            self.renderer.clean_markers(&self.target, &key);
        }
        *self.state() = false;
        debug!(root = %self.target, "tree cleared");
    }

    pub(crate) fn controls(self: &Arc<Self>) -> AppControls {
        AppControls {
            mount: Arc::downgrade(self),
        }
    }
}

/// Mount control surface handed to the store.
///
/// Lets store-side UI (e.g. a "re-render" action) drive the tree without
/// owning the host root.
#[derive(Clone)]
pub struct AppControls {
    mount: Weak<Mount>,
}

impl AppControls {
    /// True if a tree is currently rendered.
    pub fn is_rendered(&self) -> bool {
        self.mount.upgrade().is_some_and(|m| m.is_rendered())
    }

    /// Re-renders the tree (unmounting the previous one first).
    pub fn render(&self) {
        if let Some(m) = self.mount.upgrade() {
            m.render();
        }
    }

    /// Unmounts the tree. Safe to call repeatedly.
    pub fn clear(&self) {
        if let Some(m) = self.mount.upgrade() {
            m.clear();
        }
    }

    /// False once the owning instance has released its mount.
    pub fn is_attached(&self) -> bool {
        self.mount.strong_count() > 0
    }
}

impl std::fmt::Debug for AppControls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppControls")
            .field("attached", &self.is_attached())
            .field("rendered", &self.is_rendered())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{NoPanels, Panel, TreeKey};
    use std::collections::HashMap;
    use std::sync::mpsc;
    use std::time::Duration;

    /// One root, children are tree generations; markers are keys left behind.
    #[derive(Default)]
    struct Dom {
        children: Mutex<Vec<u32>>,
        markers: Mutex<Vec<u32>>,
        generation: Mutex<u32>,
        panels_seen: Mutex<Vec<Vec<Panel>>>,
    }

    impl Renderer for Dom {
        fn render(&self, _target: &RootHandle, tree: AppTree) {
            let mut g = self.generation.lock().unwrap();
            *g += 1;
            self.children.lock().unwrap().push(*g);
            self.markers.lock().unwrap().push(*g);
            self.panels_seen.lock().unwrap().push(tree.panels);
        }
        fn has_children(&self, _target: &RootHandle) -> bool {
            !self.children.lock().unwrap().is_empty()
        }
        fn tree_key(&self, _target: &RootHandle) -> Option<TreeKey> {
            self.children.lock().unwrap().first().map(|g| TreeKey(g.to_string()))
        }
        fn unmount(&self, _target: &RootHandle) -> bool {
            let mut c = self.children.lock().unwrap();
            let had = !c.is_empty();
            c.clear();
            had
        }
        fn clean_markers(&self, _target: &RootHandle, key: &TreeKey) {
            self.markers.lock().unwrap().retain(|g| g.to_string() != key.0);
        }
    }

    /// Tree that queries the control surface while it is being rendered.
    #[derive(Default)]
    struct QueryingDom {
        dom: Dom,
        controls: Mutex<Option<AppControls>>,
        seen: Mutex<Vec<bool>>,
    }

    impl Renderer for QueryingDom {
        fn render(&self, target: &RootHandle, tree: AppTree) {
            self.dom.render(target, tree);
            let controls = self.controls.lock().unwrap().clone();
            if let Some(controls) = controls {
                self.seen.lock().unwrap().push(controls.is_rendered());
            }
        }
        fn has_children(&self, target: &RootHandle) -> bool {
            self.dom.has_children(target)
        }
        fn tree_key(&self, target: &RootHandle) -> Option<TreeKey> {
            self.dom.tree_key(target)
        }
        fn unmount(&self, target: &RootHandle) -> bool {
            self.dom.unmount(target)
        }
        fn clean_markers(&self, target: &RootHandle, key: &TreeKey) {
            self.dom.clean_markers(target, key)
        }
    }

    struct NullStore;
    impl Store for NullStore {
        fn set_app_controls(&self, _controls: AppControls) {}
        fn self_destroy(&self) {}
        fn destroy(&self) {}
    }

    struct CountingPanels(Mutex<HashMap<String, usize>>);
    impl PanelRegistry for CountingPanels {
        fn register(&self, panels: Option<&Value>) -> Vec<Panel> {
            let name = panels.map_or("none".to_string(), |v| v.to_string());
            *self.0.lock().unwrap().entry(name.clone()).or_default() += 1;
            vec![Panel::named(name)]
        }
    }

    fn mount(dom: &Arc<Dom>) -> Arc<Mount> {
        Mount::new(
            dom.clone(),
            Arc::new(NoPanels),
            None,
            Arc::new(NullStore),
            RootHandle::new("root"),
        )
    }

    #[test]
    fn test_render_twice_leaves_one_tree_and_no_stale_markers() {
        let dom = Arc::new(Dom::default());
        let m = mount(&dom);
        m.render();
        m.render();

        assert_eq!(*dom.children.lock().unwrap(), vec![2]);
        assert_eq!(*dom.markers.lock().unwrap(), vec![2]);
        assert!(m.is_rendered());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dom = Arc::new(Dom::default());
        let m = mount(&dom);
        m.clear();
        assert!(!m.is_rendered());

        m.render();
        m.clear();
        m.clear();
        assert!(dom.children.lock().unwrap().is_empty());
        assert!(dom.markers.lock().unwrap().is_empty());
        assert!(!m.is_rendered());
    }

    #[test]
    fn test_controls_go_inert_when_mount_dropped() {
        let dom = Arc::new(Dom::default());
        let m = mount(&dom);
        let controls = m.controls();
        controls.render();
        assert!(controls.is_rendered());
        assert!(controls.is_attached());

        drop(m);
        assert!(!controls.is_attached());
        assert!(!controls.is_rendered());
        controls.render();
        controls.clear();
        assert_eq!(*dom.children.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_panels_resolved_on_every_render() {
        let dom = Arc::new(Dom::default());
        let registry = Arc::new(CountingPanels(Mutex::new(HashMap::new())));
        let m = Mount::new(
            dom.clone(),
            registry.clone(),
            Some(serde_json::json!(["outliner"])),
            Arc::new(NullStore),
            RootHandle::new("root"),
        );
        m.render();
        m.render();

        assert_eq!(registry.0.lock().unwrap().get(r#"["outliner"]"#), Some(&2));
        assert_eq!(dom.panels_seen.lock().unwrap().len(), 2);
        assert_eq!(m.target(), &RootHandle::new("root"));
    }

    #[test]
    fn test_renderer_may_query_controls_while_rendering() {
        let renderer = Arc::new(QueryingDom::default());
        let m = Mount::new(
            renderer.clone(),
            Arc::new(NoPanels),
            None,
            Arc::new(NullStore),
            RootHandle::new("root"),
        );
        *renderer.controls.lock().unwrap() = Some(m.controls());

        let (tx, rx) = mpsc::channel();
        let controls = m.controls();
        std::thread::spawn(move || {
            controls.render();
            controls.render();
            let _ = tx.send(());
        });

        rx.recv_timeout(Duration::from_secs(3))
            .expect("render blocked on the rendered flag");
        assert_eq!(*renderer.seen.lock().unwrap(), vec![false, false]);
        assert_eq!(*renderer.dom.children.lock().unwrap(), vec![2]);
        assert!(m.is_rendered());
    }
}
