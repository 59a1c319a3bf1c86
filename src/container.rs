//! Container facade
//!
//! Owns the three tables (definitions, singleton cache, advice table) plus
//! the dispose bag, and orchestrates the fixed bootstrap pipeline:
//! locate -> register -> eager singletons -> collect advice -> apply
//! interceptors. Applications then use [`Container::get_bean`] and
//! [`Container::shutdown`].

use crate::aspect::{self, AdviceTable};
use crate::descriptor::{unerase, AnyInstance, BeanKey, SCOPE_PROTOTYPE, SCOPE_SINGLETON};
use crate::error::{DiError, DiResult};
use crate::lifecycle::{self, DisposeBag};
use crate::locator::ComponentLocator;
use crate::registry::{BeanDefinition, DefinitionRegistry};
use crate::resolver::{self, ResolveGuard};
use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, error, info, trace};

/// The inversion-of-control container.
///
/// Built once over a locator's discovered descriptors; singletons are
/// instantiated eagerly during construction (with lazy fallback), advice is
/// collected from aspect components, and matched singletons are wrapped by
/// intercepting proxies. Not reusable after [`Container::shutdown`].
///
/// # Examples
///
/// ```rust
/// use wirebox::{ComponentDescriptor, Container, ManifestLocator};
///
/// struct Greeter;
///
/// impl Greeter {
///     fn greet(&self) -> &'static str {
///         "hello"
///     }
/// }
///
/// fn greeter_descriptor() -> ComponentDescriptor {
///     ComponentDescriptor::component::<Greeter>()
///         .constructor(|| Greeter)
///         .build()
/// }
///
/// let locator = ManifestLocator::new().entry("app", greeter_descriptor);
/// let container = Container::construct("app", &locator);
///
/// let greeter = container.get_bean::<Greeter>().unwrap();
/// assert_eq!(greeter.greet(), "hello");
/// container.shutdown();
/// ```
pub struct Container {
    registry: DefinitionRegistry,
    singletons: DashMap<TypeId, AnyInstance, RandomState>,
    advice: AdviceTable,
    disposals: DisposeBag,
}

impl Container {
    /// Run the locator over a namespace root and bootstrap the container.
    ///
    /// Any failure during the pipeline is caught and logged; the container
    /// is returned partially initialized rather than crashing, and callers
    /// observe whatever did not come up as `BeanNotFound` or the original
    /// resolution error.
    pub fn construct(namespace_root: &str, locator: &dyn ComponentLocator) -> Self {
        let container = Self::empty();

        #[cfg(feature = "logging")]
        info!(
            target: "wirebox",
            namespace = namespace_root,
            "constructing container"
        );

        if let Err(_err) = container.bootstrap(namespace_root, locator) {
            #[cfg(feature = "logging")]
            error!(
                target: "wirebox",
                error = %_err,
                "bootstrap failed, container left partially initialized"
            );
        }

        container
    }

    fn empty() -> Self {
        Self {
            registry: DefinitionRegistry::new(),
            singletons: DashMap::with_hasher(RandomState::new()),
            advice: AdviceTable::new(),
            disposals: DisposeBag::new(),
        }
    }

    fn bootstrap(&self, namespace_root: &str, locator: &dyn ComponentLocator) -> DiResult<()> {
        for descriptor in locator.locate(namespace_root) {
            #[cfg(feature = "logging")]
            debug!(
                target: "wirebox",
                component = descriptor.type_name(),
                key = descriptor.key().name(),
                scope = descriptor.scope(),
                "registered bean definition"
            );
            self.registry.register(descriptor);
        }

        // Eager pass: every singleton is constructed, injected, and
        // initialized before advice collection.
        for key in self.registry.keys_in_order() {
            let Some(def) = self.registry.lookup(&key) else {
                continue;
            };
            if def.scope() == SCOPE_SINGLETON {
                self.resolve_key(&key)?;
            }
        }

        self.advice.collect(&self.registry);
        aspect::apply_interceptors(&self.registry, &self.singletons, &self.advice);

        #[cfg(feature = "logging")]
        info!(
            target: "wirebox",
            definitions = self.registry.len(),
            singletons = self.singletons.len(),
            pointcuts = self.advice.len(),
            "container ready"
        );

        Ok(())
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve a bean by its declared identity: a concrete component type,
    /// or the capability trait a component is surfaced as.
    ///
    /// Singleton scope returns the cached (possibly proxied) instance,
    /// constructing it lazily if the eager pass did not; prototype scope
    /// builds, injects, and initializes a fresh instance per call and never
    /// proxies it.
    pub fn get_bean<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let key = BeanKey::of::<T>();
        let payload = self.resolve_key(&key)?;
        unerase::<T>(&payload).ok_or_else(|| {
            DiError::Internal(format!(
                "cached instance for {} has unexpected shape",
                key.name()
            ))
        })
    }

    /// Resolve a bean, returning `None` on any failure.
    pub fn try_get_bean<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.get_bean::<T>().ok()
    }

    /// Shared resolution path: scope dispatch over the raw declared scope
    /// string. Recursive constructor/field resolution re-enters here, so
    /// scope semantics hold at every depth.
    pub(crate) fn resolve_key(&self, key: &BeanKey) -> DiResult<AnyInstance> {
        let def = self
            .registry
            .lookup(key)
            .ok_or_else(|| DiError::not_found(key.name()))?;

        match def.scope() {
            SCOPE_SINGLETON => {
                if let Some(cached) = self.singletons.get(&key.id()) {
                    #[cfg(feature = "logging")]
                    trace!(target: "wirebox", component = key.name(), "singleton cache hit");
                    return Ok(cached.clone());
                }
                self.create_singleton(key, &def)
            }
            SCOPE_PROTOTYPE => self.create_prototype(&def),
            other => Err(DiError::UnsupportedScope {
                type_name: def.type_name(),
                scope: other.to_string(),
            }),
        }
    }

    fn create_singleton(&self, key: &BeanKey, def: &Arc<BeanDefinition>) -> DiResult<AnyInstance> {
        let concrete = {
            let _guard = ResolveGuard::enter(*key)?;
            resolver::instantiate(self, def)?
        };
        let exposed = def.descriptor.expose_payload(concrete.clone())?;

        // Cached before field injection, matching the source ordering: a
        // field-level cycle between singletons resolves against the cache
        // entry instead of recursing.
        let cached = match self.singletons.entry(key.id()) {
            Entry::Occupied(existing) => return Ok(existing.get().clone()),
            Entry::Vacant(slot) => {
                slot.insert(exposed.clone());
                exposed
            }
        };

        resolver::inject_fields(self, def, &concrete)?;
        self.disposals.track(def, &concrete);
        lifecycle::run_init_hooks(def, &concrete);

        #[cfg(feature = "logging")]
        debug!(
            target: "wirebox",
            component = key.name(),
            "singleton constructed and cached"
        );

        Ok(cached)
    }

    fn create_prototype(&self, def: &Arc<BeanDefinition>) -> DiResult<AnyInstance> {
        // The guard spans construction and injection: a prototype reaching
        // itself through either recurses forever otherwise.
        let concrete = {
            let _guard = ResolveGuard::enter(def.key())?;
            let concrete = resolver::instantiate(self, def)?;
            resolver::inject_fields(self, def, &concrete)?;
            concrete
        };
        lifecycle::run_init_hooks(def, &concrete);

        #[cfg(feature = "logging")]
        trace!(
            target: "wirebox",
            component = def.type_name(),
            "prototype instance produced"
        );

        def.descriptor.expose_payload(concrete)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether an identity has a registered definition.
    pub fn contains<T: ?Sized + Send + Sync + 'static>(&self) -> bool {
        self.registry.contains(&BeanKey::of::<T>())
    }

    /// Number of registered definitions.
    pub fn definition_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of cached singleton instances.
    pub fn cached_count(&self) -> usize {
        self.singletons.len()
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Run every tracked teardown hook (LIFO, best effort), then clear the
    /// definition, singleton, and advice tables together. The container is
    /// not reusable afterwards; every subsequent `get_bean` fails with
    /// `BeanNotFound`.
    pub fn shutdown(&self) {
        #[cfg(feature = "logging")]
        info!(
            target: "wirebox",
            tracked = self.disposals.len(),
            "shutting down container"
        );

        self.disposals.dispose_all();
        self.singletons.clear();
        self.advice.clear();
        self.registry.clear();

        #[cfg(feature = "logging")]
        info!(target: "wirebox", "container shut down");
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("definitions", &self.registry.len())
            .field("singletons", &self.singletons.len())
            .field("pointcuts", &self.advice.len())
            .finish()
    }
}
