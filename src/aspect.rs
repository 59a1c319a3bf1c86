//! Advice registry and interception pass
//!
//! Aspect components declare before advice against exact
//! `(owner-type, method-name)` pointcuts. After the eager singleton pass the
//! container runs a single interception pass over the singleton cache: any
//! cached component with a method matching the advice table is replaced by a
//! wrapper built from its descriptor's interceptor closure. The pass runs
//! exactly once and is not idempotent; it is never re-run.

use crate::descriptor::AnyInstance;
use crate::registry::DefinitionRegistry;
use ahash::RandomState;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Failure raised by a before advice. An intercepting wrapper propagates
/// this to the caller of the matched method, aborting delegation.
#[derive(Error, Debug, Clone)]
#[error("before advice failed: {message}")]
pub struct AdviceError {
    message: String,
}

impl AdviceError {
    /// Create an advice failure with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A before-advice callable: receives the intercepted call's arguments and
/// no receiver.
pub(crate) type AdviceFn =
    Arc<dyn Fn(&[&dyn Any]) -> Result<(), AdviceError> + Send + Sync>;

/// Exact `(owner-type, method-name)` pair an advice targets.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pointcut {
    owner: &'static str,
    method: &'static str,
}

impl Pointcut {
    /// Build a pointcut from its parts.
    #[inline]
    pub fn new(owner: &'static str, method: &'static str) -> Self {
        Self { owner, method }
    }

    /// Parse a `"<owner-type>.<method>"` expression, splitting at the last
    /// dot. Returns `None` when either side is empty or the dot is missing.
    pub fn parse(expr: &'static str) -> Option<Self> {
        let (owner, method) = expr.rsplit_once('.')?;
        if owner.is_empty() || method.is_empty() {
            return None;
        }
        Some(Self { owner, method })
    }

    /// The owner type name.
    #[inline]
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    /// The method name.
    #[inline]
    pub fn method(&self) -> &'static str {
        self.method
    }
}

impl fmt::Debug for Pointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pointcut({}.{})", self.owner, self.method)
    }
}

impl fmt::Display for Pointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.method)
    }
}

/// The advice table: exactly one callable per pointcut, later registrations
/// overwriting earlier ones.
pub struct AdviceTable {
    entries: DashMap<Pointcut, AdviceFn, RandomState>,
}

impl AdviceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Walk registered descriptors in discovery order and collect every
    /// before advice declared by aspect components. Malformed pointcut
    /// expressions are reported and skipped; a pointcut registered twice
    /// keeps the last callable.
    pub(crate) fn collect(&self, registry: &DefinitionRegistry) {
        for key in registry.keys_in_order() {
            let Some(def) = registry.lookup(&key) else {
                continue;
            };
            for spec in &def.descriptor.advice {
                match Pointcut::parse(spec.pointcut) {
                    Some(pointcut) => {
                        let replaced = self
                            .entries
                            .insert(pointcut, Arc::clone(&spec.callable))
                            .is_some();
                        #[cfg(feature = "logging")]
                        if replaced {
                            debug!(
                                target: "wirebox",
                                pointcut = %pointcut,
                                aspect = def.type_name(),
                                "advice pointcut re-registered, last callable wins"
                            );
                        } else {
                            debug!(
                                target: "wirebox",
                                pointcut = %pointcut,
                                aspect = def.type_name(),
                                "registered before advice"
                            );
                        }
                        #[cfg(not(feature = "logging"))]
                        let _ = replaced;
                    }
                    None => {
                        #[cfg(feature = "logging")]
                        warn!(
                            target: "wirebox",
                            expression = spec.pointcut,
                            aspect = def.type_name(),
                            "malformed pointcut expression, ignoring advice"
                        );
                    }
                }
            }
        }
    }

    /// The callable registered for an exact `(owner, method)` pair.
    pub(crate) fn lookup(&self, owner: &'static str, method: &'static str) -> Option<AdviceFn> {
        self.entries
            .get(&Pointcut::new(owner, method))
            .map(|entry| Arc::clone(&entry))
    }

    /// Number of registered pointcuts.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for AdviceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AdviceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdviceTable")
            .field("pointcuts", &self.len())
            .finish()
    }
}

/// The advice matched against one intercepted component, keyed by method
/// name. Intercepting wrappers hold this and call [`MethodAdvice::before`]
/// ahead of delegation.
pub struct MethodAdvice {
    entries: HashMap<&'static str, AdviceFn>,
}

impl MethodAdvice {
    pub(crate) fn new(entries: HashMap<&'static str, AdviceFn>) -> Self {
        Self { entries }
    }

    /// Run the advice matched for `method`, if any, with the call's
    /// arguments. A method with no matched advice is a no-op.
    pub fn before(&self, method: &str, args: &[&dyn Any]) -> Result<(), AdviceError> {
        match self.entries.get(method) {
            Some(advice) => (advice.as_ref())(args),
            None => Ok(()),
        }
    }

    /// Whether advice was matched for `method`.
    #[inline]
    pub fn matched(&self, method: &str) -> bool {
        self.entries.contains_key(method)
    }

    /// Number of matched methods.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no methods matched.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MethodAdvice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodAdvice")
            .field("methods", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The interception pass: for every cached singleton whose declared methods
/// match the advice table, replace the cache entry with the wrapper built by
/// its descriptor's interceptor closure.
pub(crate) fn apply_interceptors(
    registry: &DefinitionRegistry,
    singletons: &DashMap<TypeId, AnyInstance, RandomState>,
    table: &AdviceTable,
) {
    for key in registry.keys_in_order() {
        let Some(def) = registry.lookup(&key) else {
            continue;
        };
        let current = match singletons.get(&key.id()) {
            Some(entry) => entry.clone(),
            None => continue,
        };

        let owner = def.descriptor.pointcut_owner();
        let mut matched = HashMap::new();
        for &method in def.descriptor.methods {
            if let Some(advice) = table.lookup(owner, method) {
                matched.insert(method, advice);
            }
        }
        if matched.is_empty() {
            continue;
        }

        match &def.descriptor.intercept {
            Some(intercept) => match intercept(current, MethodAdvice::new(matched)) {
                Ok(proxy) => {
                    singletons.insert(key.id(), proxy);
                    #[cfg(feature = "logging")]
                    debug!(
                        target: "wirebox",
                        component = key.name(),
                        owner = owner,
                        "cached singleton replaced by intercepting wrapper"
                    );
                }
                Err(_err) => {
                    #[cfg(feature = "logging")]
                    warn!(
                        target: "wirebox",
                        component = key.name(),
                        error = %_err,
                        "interceptor construction failed, instance left unwrapped"
                    );
                }
            },
            None => {
                #[cfg(feature = "logging")]
                warn!(
                    target: "wirebox",
                    component = key.name(),
                    owner = owner,
                    "advice matched but component supplies no interceptor"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{erase, unerase, ComponentDescriptor};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_pointcut_parse_splits_at_last_dot() {
        let pointcut = Pointcut::parse("demo.user.UserApi.process_data").unwrap();
        assert_eq!(pointcut.owner(), "demo.user.UserApi");
        assert_eq!(pointcut.method(), "process_data");
    }

    #[test]
    fn test_pointcut_parse_rejects_malformed_expressions() {
        assert!(Pointcut::parse("no_dot_here").is_none());
        assert!(Pointcut::parse(".method").is_none());
        assert!(Pointcut::parse("Owner.").is_none());
    }

    #[test]
    fn test_method_advice_unmatched_method_is_noop() {
        let advice = MethodAdvice::new(HashMap::new());
        assert!(advice.before("anything", &[]).is_ok());
        assert!(!advice.matched("anything"));
    }

    #[test]
    fn test_collect_last_registration_wins() {
        static FIRST: AtomicUsize = AtomicUsize::new(0);
        static SECOND: AtomicUsize = AtomicUsize::new(0);

        struct EarlyAspect;
        struct LateAspect;

        let registry = DefinitionRegistry::new();
        registry.register(
            ComponentDescriptor::component::<EarlyAspect>()
                .before_advice("demo.Target.run", |_args| {
                    FIRST.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .build(),
        );
        registry.register(
            ComponentDescriptor::component::<LateAspect>()
                .before_advice("demo.Target.run", |_args| {
                    SECOND.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .build(),
        );

        let table = AdviceTable::new();
        table.collect(&registry);
        assert_eq!(table.len(), 1);

        let advice = table.lookup("demo.Target", "run").unwrap();
        (advice.as_ref())(&[]).unwrap();
        assert_eq!(FIRST.load(Ordering::SeqCst), 0);
        assert_eq!(SECOND.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_collect_skips_malformed_pointcuts() {
        struct BrokenAspect;

        let registry = DefinitionRegistry::new();
        registry.register(
            ComponentDescriptor::component::<BrokenAspect>()
                .before_advice("not-a-pointcut", |_args| Ok(()))
                .build(),
        );

        let table = AdviceTable::new();
        table.collect(&registry);
        assert!(table.is_empty());
    }

    #[test]
    fn test_each_method_is_matched_independently() {
        static OPEN_CALLS: AtomicUsize = AtomicUsize::new(0);
        static CLOSE_CALLS: AtomicUsize = AtomicUsize::new(0);

        trait Valve: Send + Sync {
            fn open(&self) -> Result<(), AdviceError>;
            fn close(&self) -> Result<(), AdviceError>;
        }

        struct Pipe;
        impl Valve for Pipe {
            fn open(&self) -> Result<(), AdviceError> {
                Ok(())
            }
            fn close(&self) -> Result<(), AdviceError> {
                Ok(())
            }
        }

        struct ValveProxy {
            inner: Arc<dyn Valve>,
            advice: MethodAdvice,
        }
        impl Valve for ValveProxy {
            fn open(&self) -> Result<(), AdviceError> {
                self.advice.before("open", &[])?;
                self.inner.open()
            }
            fn close(&self) -> Result<(), AdviceError> {
                self.advice.before("close", &[])?;
                self.inner.close()
            }
        }

        struct ValveAspect;

        let registry = DefinitionRegistry::new();
        registry.register(
            ComponentDescriptor::component::<Pipe>()
                .constructor(|| Pipe)
                .surface::<dyn Valve, _>(|pipe| pipe)
                .methods(&["open", "close"])
                .matched_as("demo.Valve")
                .intercept::<dyn Valve, _>(|inner, advice| Arc::new(ValveProxy { inner, advice }))
                .build(),
        );
        registry.register(
            ComponentDescriptor::component::<ValveAspect>()
                .before_advice("demo.Valve.open", |_args| {
                    OPEN_CALLS.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .before_advice("demo.Valve.close", |_args| {
                    CLOSE_CALLS.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .build(),
        );

        let singletons: DashMap<TypeId, AnyInstance, RandomState> =
            DashMap::with_hasher(RandomState::new());
        let valve: Arc<dyn Valve> = Arc::new(Pipe);
        singletons.insert(TypeId::of::<dyn Valve>(), erase(valve));

        let table = AdviceTable::new();
        table.collect(&registry);
        assert_eq!(table.len(), 2);
        apply_interceptors(&registry, &singletons, &table);

        let cached = singletons.get(&TypeId::of::<dyn Valve>()).unwrap().clone();
        let proxied = unerase::<dyn Valve>(&cached).unwrap();

        proxied.open().unwrap();
        assert_eq!(OPEN_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(CLOSE_CALLS.load(Ordering::SeqCst), 0);

        proxied.close().unwrap();
        assert_eq!(OPEN_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(CLOSE_CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_apply_interceptors_replaces_matched_singletons_only() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        trait Greeter: Send + Sync {
            fn greet(&self) -> Result<String, AdviceError>;
        }

        struct Plain;
        impl Greeter for Plain {
            fn greet(&self) -> Result<String, AdviceError> {
                Ok("hello".to_string())
            }
        }

        struct Wrapped {
            inner: Arc<dyn Greeter>,
            advice: MethodAdvice,
        }
        impl Greeter for Wrapped {
            fn greet(&self) -> Result<String, AdviceError> {
                self.advice.before("greet", &[])?;
                self.inner.greet()
            }
        }

        struct Bystander;
        struct TraceAspect;

        let registry = DefinitionRegistry::new();
        registry.register(
            ComponentDescriptor::component::<Plain>()
                .constructor(|| Plain)
                .surface::<dyn Greeter, _>(|plain| plain)
                .methods(&["greet"])
                .matched_as("demo.Greeter")
                .intercept::<dyn Greeter, _>(|inner, advice| {
                    Arc::new(Wrapped { inner, advice })
                })
                .build(),
        );
        registry.register(
            ComponentDescriptor::component::<Bystander>()
                .constructor(|| Bystander)
                .methods(&["greet"])
                .build(),
        );
        registry.register(
            ComponentDescriptor::component::<TraceAspect>()
                .before_advice("demo.Greeter.greet", |_args| {
                    CALLS.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .build(),
        );

        let singletons: DashMap<TypeId, AnyInstance, RandomState> =
            DashMap::with_hasher(RandomState::new());
        let greeter: Arc<dyn Greeter> = Arc::new(Plain);
        singletons.insert(TypeId::of::<dyn Greeter>(), erase(greeter));
        singletons.insert(TypeId::of::<Bystander>(), erase(Arc::new(Bystander)));

        let table = AdviceTable::new();
        table.collect(&registry);
        apply_interceptors(&registry, &singletons, &table);

        // The matched singleton was replaced and runs advice before delegating.
        let cached = singletons.get(&TypeId::of::<dyn Greeter>()).unwrap().clone();
        let proxied = unerase::<dyn Greeter>(&cached).unwrap();
        assert_eq!(proxied.greet().unwrap(), "hello");
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);

        // The bystander (no matching owner) is untouched.
        let untouched = singletons.get(&TypeId::of::<Bystander>()).unwrap().clone();
        assert!(unerase::<Bystander>(&untouched).is_some());
    }
}
