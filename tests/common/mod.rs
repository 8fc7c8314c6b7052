//! In-memory collaborators shared by the lifecycle tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

use studiovisor::{
    AppControls, AppTree, Config, EventBus, FF_MEMORY_LEAK_FIX, Hotkeys, Materialized, Panel,
    PanelRegistry, Registry, Renderer, RootHandle, Services, SharedChoices, StaticFlags, Store,
    StoreFactory, TreeKey,
};

/// Ordered record of collaborator calls.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Entries without renderer bookkeeping.
    pub fn teardown_entries(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| !e.starts_with("render") && !e.starts_with("panels"))
            .collect()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

#[derive(Default, Debug, Clone)]
pub struct Node {
    /// Mounted tree generations (one per render that was not unmounted).
    pub children: Vec<u32>,
    /// Renderer markers still attached to the node graph.
    pub markers: Vec<u32>,
}

/// Host document keyed by root id.
pub struct FakeDom {
    nodes: Mutex<HashMap<RootHandle, Node>>,
    generation: Mutex<u32>,
    journal: Journal,
}

impl FakeDom {
    pub fn new(journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            nodes: Mutex::new(HashMap::new()),
            generation: Mutex::new(0),
            journal,
        })
    }

    pub fn node(&self, root: &RootHandle) -> Node {
        self.nodes.lock().unwrap().get(root).cloned().unwrap_or_default()
    }
}

impl Renderer for FakeDom {
    fn render(&self, target: &RootHandle, tree: AppTree) {
        let mut generation = self.generation.lock().unwrap();
        *generation += 1;
        let mut nodes = self.nodes.lock().unwrap();
        let node = nodes.entry(target.clone()).or_default();
        node.children.push(*generation);
        node.markers.push(*generation);
        self.journal.push(format!("render:{target}"));
        self.journal.push(format!("panels:{}", tree.panels.len()));
    }

    fn has_children(&self, target: &RootHandle) -> bool {
        self.nodes
            .lock()
            .unwrap()
            .get(target)
            .is_some_and(|n| !n.children.is_empty())
    }

    fn tree_key(&self, target: &RootHandle) -> Option<TreeKey> {
        self.nodes
            .lock()
            .unwrap()
            .get(target)
            .and_then(|n| n.children.first())
            .map(|g| TreeKey(g.to_string()))
    }

    fn unmount(&self, target: &RootHandle) -> bool {
        self.journal.push("unmount");
        let mut nodes = self.nodes.lock().unwrap();
        match nodes.get_mut(target) {
            Some(node) if !node.children.is_empty() => {
                node.children.clear();
                true
            }
            _ => false,
        }
    }

    fn clean_markers(&self, target: &RootHandle, key: &TreeKey) {
        self.journal.push(format!("clean:{}", key.0));
        if let Some(node) = self.nodes.lock().unwrap().get_mut(target) {
            node.markers.retain(|g| g.to_string() != key.0);
        }
    }
}

/// Store that journals its teardown calls and keeps the controls it receives.
pub struct FakeStore {
    journal: Journal,
    controls: Mutex<Option<AppControls>>,
}

impl FakeStore {
    pub fn new(journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            journal,
            controls: Mutex::new(None),
        })
    }

    pub fn controls(&self) -> Option<AppControls> {
        self.controls.lock().unwrap().clone()
    }
}

impl Store for FakeStore {
    fn set_app_controls(&self, controls: AppControls) {
        self.journal.push("store.set_app_controls");
        *self.controls.lock().unwrap() = Some(controls);
    }

    fn self_destroy(&self) {
        self.journal.push("store.self_destroy");
    }

    fn destroy(&self) {
        self.journal.push("store.destroy");
    }
}

/// Factory that waits on an optional gate, optionally emits an event, then resolves.
pub struct GatedFactory {
    store: Arc<FakeStore>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    emit_on_configure: Option<String>,
    root_suffix: Option<String>,
    fail: bool,
}

impl GatedFactory {
    pub fn open(store: Arc<FakeStore>) -> Self {
        Self {
            store,
            gate: Mutex::new(None),
            emit_on_configure: None,
            root_suffix: None,
            fail: false,
        }
    }

    pub fn gated(store: Arc<FakeStore>) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let factory = Self::open(store);
        *factory.gate.lock().unwrap() = Some(rx);
        (factory, tx)
    }

    pub fn emitting(mut self, event: &str) -> Self {
        self.emit_on_configure = Some(event.to_string());
        self
    }

    pub fn mounting_under(mut self, suffix: &str) -> Self {
        self.root_suffix = Some(suffix.to_string());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl StoreFactory for GatedFactory {
    fn name(&self) -> &str {
        "gated"
    }

    async fn configure(&self, _config: Arc<Config>, bus: EventBus) -> anyhow::Result<Materialized> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(event) = &self.emit_on_configure {
            bus.emit(event, &Value::Null);
        }
        if self.fail {
            anyhow::bail!("store config rejected");
        }

        let store: Arc<dyn Store> = self.store.clone();
        let materialized = Materialized::new(store);
        Ok(match &self.root_suffix {
            Some(suffix) => {
                let suffix = suffix.clone();
                materialized.with_root(move |root| RootHandle::new(format!("{root}{suffix}")))
            }
            None => materialized,
        })
    }
}

pub struct RecordingHotkeys(pub Journal);

impl Hotkeys for RecordingHotkeys {
    fn set_keymap(&self, keymap: &Value) {
        self.0.push(format!("keymap:{keymap}"));
    }
}

pub struct RecordingShared(pub Journal);

impl SharedChoices for RecordingShared {
    fn destroy(&self) {
        self.0.push("shared_choices.destroy");
    }
}

pub struct PanicShared;

impl SharedChoices for PanicShared {
    fn destroy(&self) {
        panic!("shared choices already gone");
    }
}

pub struct ListPanels;

impl PanelRegistry for ListPanels {
    fn register(&self, panels: Option<&Value>) -> Vec<Panel> {
        panels
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(Panel::named)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Everything one test needs.
pub struct Harness {
    pub journal: Journal,
    pub dom: Arc<FakeDom>,
    pub store: Arc<FakeStore>,
    pub registry: Arc<Registry>,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Journal::default();
        Self {
            dom: FakeDom::new(journal.clone()),
            store: FakeStore::new(journal.clone()),
            registry: Registry::new(),
            journal,
        }
    }

    /// Services around `factory`, with the memory-leak flag set to `flag_on`.
    pub fn services(&self, factory: GatedFactory, flag_on: bool) -> Services {
        let flags = if flag_on {
            StaticFlags::new([FF_MEMORY_LEAK_FIX])
        } else {
            StaticFlags::default()
        };
        Services::new(self.dom.clone(), Arc::new(factory))
            .with_hotkeys(Arc::new(RecordingHotkeys(self.journal.clone())))
            .with_shared_choices(Arc::new(RecordingShared(self.journal.clone())))
            .with_panels(Arc::new(ListPanels))
            .with_flags(Arc::new(flags))
    }

    pub fn open_services(&self, flag_on: bool) -> Services {
        self.services(GatedFactory::open(self.store.clone()), flag_on)
    }
}
