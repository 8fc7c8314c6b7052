//! # Store contract.
//!
//! The reactive store is built asynchronously by a [`StoreFactory`] from the
//! merged [`Config`] and the instance [`EventBus`]. The result, [`Materialized`],
//! also knows how to resolve the concrete mount point inside the host root.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::core::AppControls;
use crate::events::EventBus;

use super::RootHandle;

/// Reactive state store owned by one instance.
pub trait Store: Send + Sync + 'static {
    /// Receives the mount control surface once the first render is done.
    fn set_app_controls(&self, controls: AppControls);

    /// Destroys owned sub-stores ahead of the store itself.
    fn self_destroy(&self);

    /// Tears down the store's own reactive state.
    fn destroy(&self);
}

type RootResolver = Box<dyn Fn(&RootHandle) -> RootHandle + Send + Sync>;

/// Outcome of materialization: the store plus root resolution.
pub struct Materialized {
    store: Arc<dyn Store>,
    resolver: Option<RootResolver>,
}

impl Materialized {
    /// Store that mounts directly into the host root.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            resolver: None,
        }
    }

    /// Sets how the concrete mount point is derived from the host root.
    pub fn with_root<F>(mut self, f: F) -> Self
    where
        F: Fn(&RootHandle) -> RootHandle + Send + Sync + 'static,
    {
        self.resolver = Some(Box::new(f));
        self
    }

    /// Materialized store.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Concrete mount point for `root`.
    pub fn get_root(&self, root: &RootHandle) -> RootHandle {
        match &self.resolver {
            Some(f) => f(root),
            None => root.clone(),
        }
    }

    pub(crate) fn into_parts(self) -> (Arc<dyn Store>, Option<RootResolver>) {
        (self.store, self.resolver)
    }
}

impl fmt::Debug for Materialized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Materialized")
            .field("custom_root", &self.resolver.is_some())
            .finish_non_exhaustive()
    }
}

/// Builds the store for an instance.
///
/// Awaited exactly once per instance. Errors are logged and leave the
/// instance in [`Phase::Failed`](crate::Phase::Failed).
#[async_trait]
pub trait StoreFactory: Send + Sync + 'static {
    /// Returns a stable, human-readable factory name.
    fn name(&self) -> &str {
        "store"
    }

    /// Materializes the store.
    async fn configure(&self, config: Arc<Config>, bus: EventBus) -> anyhow::Result<Materialized>;
}

/// Function-backed store factory.
///
/// Wraps a closure that creates a new future per call.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use studiovisor::{Config, EventBus, FactoryFn, Materialized, StoreFactory};
///
/// let factory = FactoryFn::arc("never", |_cfg: Arc<Config>, _bus: EventBus| async {
///     Err::<Materialized, _>(anyhow::anyhow!("not today"))
/// });
/// assert_eq!(factory.name(), "never");
/// ```
pub struct FactoryFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> FactoryFn<F> {
    /// Creates a new function-backed factory.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the factory and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> StoreFactory for FactoryFn<F>
where
    F: Fn(Arc<Config>, EventBus) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Materialized>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn configure(&self, config: Arc<Config>, bus: EventBus) -> anyhow::Result<Materialized> {
        (self.f)(config, bus).await
    }
}
