//! # Embedded instance and its lifecycle.
//!
//! [`LabelStudio`] is one embedded session bound to one host root. Construction
//! is synchronous; the store is materialized on the tokio runtime afterwards.
//!
//! ## Lifecycle
//! ```text
//! build() ──► Uninitialized ──► Materializing ──(factory resolves)──► Mounted ⇄ Cleared
//!                                   │   │                               │
//!                                   │   └─(factory fails)──► Failed      │ destroy()
//!                                   │                                    ▼
//!                 destroy() [Defer] └──(on resolve, no mount)──► Destroyed (Full)
//!                                                                Released  (Legacy)
//! ```
//!
//! ## Rules
//! - `destroy()` dispatches on the current [`Phase`]; it never panics and never returns an error.
//! - During `Materializing`, `destroy()` is deferred or discarded per
//!   [`EarlyDestroy`](crate::EarlyDestroy).
//! - `Released` (Legacy teardown) is inert: further `destroy()` calls are no-ops, the tree
//!   stays mounted and the instance stays registered.
//! - A destroy queued behind a failing materialization is applied as `destroy()` on a
//!   `Failed` instance would be.
//! - `Destroyed` is terminal.
//! - Collaborators are never called while the instance state lock is held.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use futures::FutureExt;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::{Config, EarlyDestroy, Options, Settings};
use crate::error::{LifecycleError, panic_info};
use crate::events::{Callback, EventBus};
use crate::host::{Materialized, RootHandle, Services, Store};

use super::builder::LabelStudioBuilder;
use super::mount::Mount;
use super::registry::Registry;
use super::teardown::{Teardown, TeardownStep};

/// Global counter for instance ids.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique instance identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InstanceId(u64);

impl InstanceId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ls-{}", self.0)
    }
}

/// Observable lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Constructed, materialization not yet scheduled.
    Uninitialized,
    /// Store is being built.
    Materializing,
    /// Tree is rendered into the host root.
    Mounted,
    /// Store is live but the tree has been cleared.
    Cleared,
    /// Legacy teardown ran; inert but still registered.
    Released,
    /// Full teardown ran; terminal.
    Destroyed,
    /// Materialization failed.
    Failed,
}

impl Phase {
    /// True once materialization has settled (successfully or not).
    pub fn is_settled(self) -> bool {
        !matches!(self, Phase::Uninitialized | Phase::Materializing)
    }
}

enum State {
    Uninitialized { destroy_requested: bool },
    Materializing { destroy_requested: bool },
    Mounted {
        store: Arc<dyn Store>,
        mount: Arc<Mount>,
    },
    Released {
        store: Arc<dyn Store>,
        // Keeps the store's `AppControls` working after a Legacy teardown.
        _mount: Option<Arc<Mount>>,
    },
    Destroyed,
    Failed,
}

/// What `destroy()` decided while holding the state lock.
enum Work {
    Nothing,
    Teardown {
        store: Arc<dyn Store>,
        mount: Option<Arc<Mount>>,
    },
    Unregister,
}

pub(crate) struct Parts {
    pub(crate) root: RootHandle,
    pub(crate) config: Arc<Config>,
    pub(crate) bus: EventBus,
    pub(crate) services: Services,
    pub(crate) settings: Settings,
    pub(crate) teardown: Teardown,
    pub(crate) registry: Weak<Registry>,
}

struct Inner {
    id: InstanceId,
    root: RootHandle,
    config: Arc<Config>,
    bus: EventBus,
    services: Services,
    settings: Settings,
    teardown: Teardown,
    registry: Weak<Registry>,
    state: Mutex<State>,
    settled: watch::Sender<bool>,
}

/// One embedded annotation-tool session.
///
/// Cheap to clone; clones refer to the same instance.
///
/// ## Example
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use studiovisor::*;
/// # async fn demo(renderer: Arc<dyn Renderer>, factory: Arc<dyn StoreFactory>) -> Result<(), LifecycleError> {
/// let ls = LabelStudio::builder("#label-studio", Services::new(renderer, factory))
///     .options(Options::new().callback("onLabelStudioLoad", |_| Ok(())))
///     .build()?;
///
/// ls.on("submitAnnotation", callback(|payload| {
///     println!("submitted: {payload}");
///     Ok(())
/// }));
///
/// ls.ready().await;
/// ls.destroy();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LabelStudio {
    inner: Arc<Inner>,
}

impl LabelStudio {
    /// Starts building an instance bound to `root`.
    pub fn builder(root: impl Into<RootHandle>, services: Services) -> LabelStudioBuilder {
        LabelStudioBuilder::new(root.into(), services)
    }

    /// Builds an instance with stock defaults and settings, registered globally.
    ///
    /// `None` options behave like an empty record.
    pub fn new(
        root: impl Into<RootHandle>,
        options: Option<Options>,
        services: Services,
    ) -> Result<Self, LifecycleError> {
        Self::builder(root, services).maybe_options(options).build()
    }

    /// Destroys every instance in the global registry and clears it.
    pub fn destroy_all() {
        Registry::global().destroy_all();
    }

    pub(crate) fn from_parts(parts: Parts) -> Self {
        let (settled, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                id: InstanceId::next(),
                root: parts.root,
                config: parts.config,
                bus: parts.bus,
                services: parts.services,
                settings: parts.settings,
                teardown: parts.teardown,
                registry: parts.registry,
                state: Mutex::new(State::Uninitialized {
                    destroy_requested: false,
                }),
                settled,
            }),
        }
    }

    /// Schedules materialization on `runtime`.
    pub(crate) fn begin_materialize(&self, runtime: &Handle) {
        {
            let mut state = self.inner.lock();
            if let State::Uninitialized { destroy_requested } = *state {
                *state = State::Materializing { destroy_requested };
            }
        }
        debug!(instance = %self.inner.id, factory = self.inner.services.factory.name(), "materializing");
        runtime.spawn(Arc::clone(&self.inner).materialize());
    }

    /// Process-unique id.
    pub fn id(&self) -> InstanceId {
        self.inner.id
    }

    /// Host root this instance is bound to.
    pub fn root(&self) -> &RootHandle {
        &self.inner.root
    }

    /// Merged configuration snapshot.
    pub fn config(&self) -> &Arc<Config> {
        &self.inner.config
    }

    /// Instance event bus.
    pub fn events(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Teardown strategy selected at construction.
    pub fn teardown(&self) -> Teardown {
        self.inner.teardown
    }

    /// Materialized store, while the instance holds one.
    pub fn store(&self) -> Option<Arc<dyn Store>> {
        match &*self.inner.lock() {
            State::Mounted { store, .. } | State::Released { store, .. } => Some(Arc::clone(store)),
            _ => None,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        let mount = match &*self.inner.lock() {
            State::Uninitialized { .. } => return Phase::Uninitialized,
            State::Materializing { .. } => return Phase::Materializing,
            State::Released { .. } => return Phase::Released,
            State::Destroyed => return Phase::Destroyed,
            State::Failed => return Phase::Failed,
            State::Mounted { mount, .. } => Arc::clone(mount),
        };
        if mount.is_rendered() {
            Phase::Mounted
        } else {
            Phase::Cleared
        }
    }

    /// True if a `destroy()` is queued behind materialization.
    pub fn destroy_pending(&self) -> bool {
        matches!(
            *self.inner.lock(),
            State::Uninitialized {
                destroy_requested: true
            } | State::Materializing {
                destroy_requested: true
            }
        )
    }

    /// True if the registry this instance joined still tracks it.
    pub fn is_registered(&self) -> bool {
        self.inner
            .registry
            .upgrade()
            .is_some_and(|r| r.contains(self.inner.id))
    }

    /// Waits until materialization has settled and returns the phase at that point.
    pub async fn ready(&self) -> Phase {
        let mut rx = self.inner.settled.subscribe();
        let _ = rx.wait_for(|done| *done).await;
        self.phase()
    }

    /// Subscribes `callback` to `event`.
    pub fn on(&self, event: impl Into<String>, callback: Callback) {
        self.inner.bus.on(event, callback);
    }

    /// Unsubscribes `callback` from `event`, or every listener of `event` when `None`.
    pub fn off(&self, event: &str, callback: Option<&Callback>) {
        self.inner.bus.off(event, callback);
    }

    /// Tears the instance down according to its phase and strategy.
    pub fn destroy(&self) {
        let inner = &self.inner;
        let work = {
            let mut state = inner.lock();
            let (next, work) = match std::mem::replace(&mut *state, State::Destroyed) {
                early @ (State::Uninitialized { .. } | State::Materializing { .. })
                    if inner.settings.early_destroy == EarlyDestroy::Discard =>
                {
                    debug!(instance = %inner.id, "destroy before materialization ignored");
                    (early, Work::Nothing)
                }
                State::Uninitialized { .. } => {
                    debug!(instance = %inner.id, "destroy queued until materialization");
                    (
                        State::Uninitialized {
                            destroy_requested: true,
                        },
                        Work::Nothing,
                    )
                }
                State::Materializing { .. } => {
                    debug!(instance = %inner.id, "destroy queued until materialization");
                    (
                        State::Materializing {
                            destroy_requested: true,
                        },
                        Work::Nothing,
                    )
                }
                State::Mounted { store, mount } => {
                    let next = inner.after_teardown(&store, Some(&mount));
                    (
                        next,
                        Work::Teardown {
                            store,
                            mount: Some(mount),
                        },
                    )
                }
                released @ State::Released { .. } => {
                    debug!(instance = %inner.id, "already released; destroy ignored");
                    (released, Work::Nothing)
                }
                State::Destroyed => (State::Destroyed, Work::Nothing),
                State::Failed if inner.teardown.releases() => (State::Destroyed, Work::Unregister),
                State::Failed => (State::Failed, Work::Nothing),
            };
            *state = next;
            work
        };

        match work {
            Work::Nothing => {}
            Work::Teardown { store, mount } => inner.run_teardown(store, mount),
            Work::Unregister => inner.unregister(),
        }
    }
}

impl fmt::Debug for LabelStudio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelStudio")
            .field("id", &self.inner.id)
            .field("root", &self.inner.root)
            .field("phase", &self.phase())
            .field("teardown", &self.inner.teardown)
            .finish()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Runs the factory once, then mounts or applies a queued destroy.
    async fn materialize(self: Arc<Self>) {
        let fut = self
            .services
            .factory
            .configure(Arc::clone(&self.config), self.bus.clone());

        let result = match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(materialized)) => Ok(materialized),
            Ok(Err(e)) => Err(LifecycleError::Materialize {
                error: format!("{e:#}"),
            }),
            Err(panic) => Err(LifecycleError::MaterializePanicked {
                info: panic_info(&*panic),
            }),
        };

        let result = result.and_then(|materialized| {
            catch_unwind(AssertUnwindSafe(|| self.on_materialized(materialized))).map_err(
                |panic| LifecycleError::MaterializePanicked {
                    info: panic_info(&*panic),
                },
            )
        });

        if let Err(err) = result {
            error!(instance = %self.id, label = err.as_label(), "{err}");
            if self.fail() {
                info!(instance = %self.id, "destroy was requested during materialization; released");
                self.unregister();
            }
        }
        self.settled.send_replace(true);
    }

    /// Moves a still-materializing instance to `Failed`, or straight to `Destroyed`
    /// when a queued destroy and a releasing strategy allow it.
    ///
    /// Returns `true` if the instance must leave the registry.
    fn fail(&self) -> bool {
        let mut state = self.lock();
        match *state {
            State::Materializing {
                destroy_requested: true,
            } if self.teardown.releases() => {
                *state = State::Destroyed;
                true
            }
            State::Uninitialized { .. } | State::Materializing { .. } => {
                *state = State::Failed;
                false
            }
            _ => false,
        }
    }

    fn on_materialized(&self, materialized: Materialized) {
        let target = materialized.get_root(&self.root);
        let (store, _) = materialized.into_parts();

        if self.take_pending_destroy(&store) {
            info!(instance = %self.id, "destroy was requested during materialization; skipping mount");
            self.run_teardown(store, None);
            return;
        }

        let mount = Mount::new(
            Arc::clone(&self.services.renderer),
            Arc::clone(&self.services.panels),
            self.config.panels().cloned(),
            Arc::clone(&store),
            target,
        );
        mount.render();
        store.set_app_controls(mount.controls());
        info!(instance = %self.id, root = %mount.target(), "mounted");

        let (work_store, work_mount) = (Arc::clone(&store), Arc::clone(&mount));
        let pending = {
            let mut state = self.lock();
            let pending = matches!(
                *state,
                State::Materializing {
                    destroy_requested: true
                }
            );
            *state = if pending {
                self.after_teardown(&work_store, Some(&work_mount))
            } else {
                State::Mounted { store, mount }
            };
            pending
        };

        if pending {
            self.run_teardown(work_store, Some(work_mount));
        }
    }

    /// Clears a queued destroy and reports whether there was one.
    ///
    /// On `true` the state already holds the post-teardown value.
    fn take_pending_destroy(&self, store: &Arc<dyn Store>) -> bool {
        let mut state = self.lock();
        if !matches!(
            *state,
            State::Materializing {
                destroy_requested: true
            }
        ) {
            return false;
        }
        *state = self.after_teardown(store, None);
        true
    }

    /// State an instance ends in once `self.teardown` has run on a mounted store.
    fn after_teardown(&self, store: &Arc<dyn Store>, mount: Option<&Arc<Mount>>) -> State {
        if self.teardown.releases() {
            State::Destroyed
        } else {
            State::Released {
                store: Arc::clone(store),
                _mount: mount.cloned(),
            }
        }
    }

    fn run_teardown(&self, store: Arc<dyn Store>, mount: Option<Arc<Mount>>) {
        for &step in self.teardown.steps() {
            self.guarded(step, || match step {
                TeardownStep::Unmount => {
                    if let Some(m) = &mount {
                        m.clear();
                    }
                }
                TeardownStep::SharedChoices => self.services.shared_choices.destroy(),
                TeardownStep::SelfDestroy => store.self_destroy(),
                TeardownStep::DestroyStore => store.destroy(),
                TeardownStep::Release => self.unregister(),
            });
        }
        info!(instance = %self.id, strategy = ?self.teardown, "destroyed");
    }

    fn guarded(&self, step: TeardownStep, f: impl FnOnce()) {
        if let Err(panic) = catch_unwind(AssertUnwindSafe(f)) {
            error!(
                instance = %self.id,
                step = step.as_label(),
                "teardown step panicked: {}",
                panic_info(&*panic)
            );
        }
    }

    fn unregister(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}
