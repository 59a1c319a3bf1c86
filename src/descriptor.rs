//! Component descriptors and the data model behind bean definitions
//!
//! A [`ComponentDescriptor`] is the boundary object handed over by the
//! component locator: one immutable record per discovered type carrying its
//! declared scope, injection points, lifecycle hooks, and advice metadata.
//! Descriptors are built through a typed [`DescriptorBuilder`] and fully
//! type-erased once built, so the container core never needs to know the
//! concrete component types it manages.

use crate::aspect::{AdviceError, AdviceFn, MethodAdvice};
use crate::error::{DiError, DiResult};
use once_cell::sync::OnceCell;
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Scope string for one shared instance per container.
pub const SCOPE_SINGLETON: &str = "singleton";

/// Scope string for a fresh instance per request.
pub const SCOPE_PROTOTYPE: &str = "prototype";

// =============================================================================
// Type identity and instance erasure
// =============================================================================

/// Type-erased handle to a managed instance.
///
/// The payload is uniformly `Arc<T>` boxed into the `Any`, for both sized
/// component types and `dyn Trait` surfaces. The double indirection buys a
/// single downcast recipe for every identity the container can hold.
pub(crate) type AnyInstance = Arc<dyn Any + Send + Sync>;

/// Erase an `Arc<T>` into the container's instance currency.
#[inline]
pub(crate) fn erase<T: ?Sized + Send + Sync + 'static>(instance: Arc<T>) -> AnyInstance {
    Arc::new(instance)
}

/// Recover an `Arc<T>` from an erased instance, if the payload matches.
#[inline]
pub(crate) fn unerase<T: ?Sized + Send + Sync + 'static>(any: &AnyInstance) -> Option<Arc<T>> {
    any.downcast_ref::<Arc<T>>().cloned()
}

/// Identity of a bean: the `TypeId` it is registered and resolved under.
///
/// Works for concrete component types and for capability-trait surfaces
/// (`dyn Trait`), since any `'static` type has a `TypeId`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BeanKey {
    id: TypeId,
    name: &'static str,
}

impl BeanKey {
    /// Key for a type identity.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The raw `TypeId`.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Human-readable type name for diagnostics.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for BeanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BeanKey({})", self.name)
    }
}

impl fmt::Display for BeanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// =============================================================================
// Injection point and hook specs (type-erased)
// =============================================================================

/// Outcome of a lifecycle hook invocation.
pub type HookResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub(crate) type BuildFn = Box<dyn Fn(Vec<AnyInstance>) -> DiResult<AnyInstance> + Send + Sync>;
pub(crate) type AssignFn = Box<dyn Fn(&AnyInstance, AnyInstance) -> DiResult<()> + Send + Sync>;
pub(crate) type HookFn = Arc<dyn Fn(&AnyInstance) -> HookResult + Send + Sync>;
pub(crate) type ExposeFn = Box<dyn Fn(AnyInstance) -> DiResult<AnyInstance> + Send + Sync>;
pub(crate) type InterceptFn =
    Box<dyn Fn(AnyInstance, MethodAdvice) -> DiResult<AnyInstance> + Send + Sync>;

/// One declared constructor: its injection-marker flag, the declared
/// parameter types in order, and the build closure consuming them.
pub(crate) struct ConstructorSpec {
    pub(crate) injected: bool,
    pub(crate) params: Vec<BeanKey>,
    pub(crate) build: BuildFn,
}

/// One injection-marked field: resolved by exact declared type and assigned
/// through the component's late-bound slot.
pub(crate) struct FieldSpec {
    pub(crate) name: &'static str,
    pub(crate) dependency: BeanKey,
    pub(crate) assign: AssignFn,
}

/// One lifecycle hook (init or teardown), invoked with no parameters.
pub(crate) struct HookSpec {
    pub(crate) name: &'static str,
    pub(crate) invoke: HookFn,
}

/// One before-advice declaration on an aspect component.
pub(crate) struct AdviceSpec {
    pub(crate) pointcut: &'static str,
    pub(crate) callable: AdviceFn,
}

// =============================================================================
// ComponentDescriptor
// =============================================================================

/// Declared metadata for one discovered component. Immutable once built.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use wirebox::ComponentDescriptor;
///
/// struct Clock;
/// struct Scheduler { clock: Arc<Clock> }
///
/// let descriptor = ComponentDescriptor::component::<Scheduler>()
///     .injected_constructor::<Arc<Clock>, _>(|clock| Scheduler { clock })
///     .build();
///
/// assert_eq!(descriptor.scope(), "singleton");
/// ```
pub struct ComponentDescriptor {
    pub(crate) key: BeanKey,
    pub(crate) type_name: &'static str,
    pub(crate) scope: String,
    pub(crate) constructors: Vec<ConstructorSpec>,
    pub(crate) fields: Vec<FieldSpec>,
    pub(crate) init_hooks: Vec<HookSpec>,
    pub(crate) teardown_hooks: Vec<HookSpec>,
    pub(crate) advice: Vec<AdviceSpec>,
    pub(crate) methods: &'static [&'static str],
    pub(crate) matched_as: Option<&'static str>,
    pub(crate) expose: Option<ExposeFn>,
    pub(crate) intercept: Option<InterceptFn>,
}

impl ComponentDescriptor {
    /// Start describing a component of concrete type `T`.
    #[inline]
    pub fn component<T: Send + Sync + 'static>() -> DescriptorBuilder<T> {
        DescriptorBuilder::new()
    }

    /// The identity this component is registered and resolved under.
    #[inline]
    pub fn key(&self) -> BeanKey {
        self.key
    }

    /// The concrete component type name (diagnostics).
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The declared scope string, exactly as the locator produced it.
    #[inline]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Whether this component declares any before advice.
    #[inline]
    pub fn is_aspect(&self) -> bool {
        !self.advice.is_empty()
    }

    /// The owner name under which this component's methods are matched
    /// against pointcuts.
    #[inline]
    pub(crate) fn pointcut_owner(&self) -> &'static str {
        self.matched_as.unwrap_or(self.key.name())
    }

    /// Convert a freshly constructed concrete payload into the payload
    /// cached and handed to callers (identity unless a surface is declared).
    pub(crate) fn expose_payload(&self, instance: AnyInstance) -> DiResult<AnyInstance> {
        match &self.expose {
            Some(expose) => expose(instance),
            None => Ok(instance),
        }
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("key", &self.key)
            .field("type_name", &self.type_name)
            .field("scope", &self.scope)
            .field("constructors", &self.constructors.len())
            .field("fields", &self.fields.len())
            .field("init_hooks", &self.init_hooks.len())
            .field("teardown_hooks", &self.teardown_hooks.len())
            .field("advice", &self.advice.len())
            .finish()
    }
}

// =============================================================================
// DescriptorBuilder
// =============================================================================

/// Typed builder for [`ComponentDescriptor`].
///
/// `T` is the concrete component type; every closure is erased on the way in
/// so the finished descriptor carries no type parameters.
pub struct DescriptorBuilder<T> {
    key: BeanKey,
    type_name: &'static str,
    scope: String,
    constructors: Vec<ConstructorSpec>,
    fields: Vec<FieldSpec>,
    init_hooks: Vec<HookSpec>,
    teardown_hooks: Vec<HookSpec>,
    advice: Vec<AdviceSpec>,
    methods: &'static [&'static str],
    matched_as: Option<&'static str>,
    expose: Option<ExposeFn>,
    intercept: Option<InterceptFn>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> DescriptorBuilder<T> {
    fn new() -> Self {
        Self {
            key: BeanKey::of::<T>(),
            type_name: std::any::type_name::<T>(),
            scope: SCOPE_SINGLETON.to_string(),
            constructors: Vec::new(),
            fields: Vec::new(),
            init_hooks: Vec::new(),
            teardown_hooks: Vec::new(),
            advice: Vec::new(),
            methods: &[],
            matched_as: None,
            expose: None,
            intercept: None,
            _marker: PhantomData,
        }
    }

    /// Declare the scope string. The value is kept verbatim; anything outside
    /// `{singleton, prototype}` fails with `UnsupportedScope` when the bean
    /// is first requested, not here.
    pub fn scope(mut self, scope: &str) -> Self {
        self.scope = scope.to_string();
        self
    }

    /// Shorthand for `.scope("prototype")`.
    pub fn prototype(self) -> Self {
        self.scope(SCOPE_PROTOTYPE)
    }

    /// Declare the argless fallback constructor.
    pub fn constructor<F>(mut self, build: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.constructors.push(ConstructorSpec {
            injected: false,
            params: Vec::new(),
            build: Box::new(move |_resolved| Ok(erase(Arc::new(build())))),
        });
        self
    }

    /// Declare an injection-marked constructor. `D` is the dependency shape:
    /// `()`, `Arc<Dep>`, or a tuple of `Arc`s, each resolved by exact
    /// declared type through the container before `build` runs.
    pub fn injected_constructor<D, F>(mut self, build: F) -> Self
    where
        D: DependencySet,
        F: Fn(D) -> T + Send + Sync + 'static,
    {
        self.constructors.push(ConstructorSpec {
            injected: true,
            params: D::keys(),
            build: Box::new(move |resolved| {
                let deps = D::assemble(resolved)?;
                Ok(erase(Arc::new(build(deps))))
            }),
        });
        self
    }

    /// Declare an injection-marked field. The assign closure receives the
    /// constructed component and the resolved dependency; components keep an
    /// [`Injected`] slot for exactly this.
    pub fn field<D, F>(mut self, name: &'static str, assign: F) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
        F: Fn(&T, Arc<D>) + Send + Sync + 'static,
    {
        self.fields.push(FieldSpec {
            name,
            dependency: BeanKey::of::<D>(),
            assign: Box::new(move |instance, dep| {
                let target = unerase::<T>(instance).ok_or_else(|| {
                    DiError::Internal(format!(
                        "injection target for field `{}` has unexpected shape",
                        name
                    ))
                })?;
                let dep = unerase::<D>(&dep).ok_or_else(|| {
                    DiError::Internal(format!(
                        "resolved dependency for field `{}` has unexpected shape",
                        name
                    ))
                })?;
                assign(&target, dep);
                Ok(())
            }),
        });
        self
    }

    /// Declare an init hook, run once per instance right after field
    /// injection completes.
    pub fn init_hook<F>(mut self, name: &'static str, hook: F) -> Self
    where
        F: Fn(&T) -> HookResult + Send + Sync + 'static,
    {
        self.init_hooks.push(Self::hook_spec(name, hook));
        self
    }

    /// Declare a teardown hook, run at container shutdown for every tracked
    /// instance.
    pub fn teardown_hook<F>(mut self, name: &'static str, hook: F) -> Self
    where
        F: Fn(&T) -> HookResult + Send + Sync + 'static,
    {
        self.teardown_hooks.push(Self::hook_spec(name, hook));
        self
    }

    fn hook_spec<F>(name: &'static str, hook: F) -> HookSpec
    where
        F: Fn(&T) -> HookResult + Send + Sync + 'static,
    {
        HookSpec {
            name,
            invoke: Arc::new(move |instance| match unerase::<T>(instance) {
                Some(target) => hook(&target),
                None => Err(format!("hook `{}` target has unexpected shape", name).into()),
            }),
        }
    }

    /// Declare a before advice, marking this component as an aspect. The
    /// pointcut names an exact `"<owner-type>.<method>"` pair; the callable
    /// receives the intercepted call's arguments and no receiver.
    pub fn before_advice<F>(mut self, pointcut: &'static str, callable: F) -> Self
    where
        F: Fn(&[&dyn Any]) -> std::result::Result<(), AdviceError> + Send + Sync + 'static,
    {
        self.advice.push(AdviceSpec {
            pointcut,
            callable: Arc::new(callable),
        });
        self
    }

    /// Declare the component's method names, checked against the advice
    /// table during the proxy pass.
    pub fn methods(mut self, methods: &'static [&'static str]) -> Self {
        self.methods = methods;
        self
    }

    /// Declare the owner name under which this component's methods match
    /// pointcuts (defaults to the registered type name).
    pub fn matched_as(mut self, owner: &'static str) -> Self {
        self.matched_as = Some(owner);
        self
    }

    /// Register and resolve this component through a capability-trait
    /// surface instead of its concrete type. Construction and injection
    /// still happen on the concrete type; the cached payload and everything
    /// callers see is `Arc<S>`.
    pub fn surface<S, F>(mut self, cast: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<S> + Send + Sync + 'static,
    {
        self.key = BeanKey::of::<S>();
        self.expose = Some(Box::new(move |instance| {
            let concrete = unerase::<T>(&instance).ok_or_else(|| {
                DiError::Internal(format!(
                    "surface source for {} has unexpected shape",
                    std::any::type_name::<T>()
                ))
            })?;
            Ok(erase(cast(concrete)))
        }));
        self
    }

    /// Supply the interceptor constructor: given the current cached `Arc<S>`
    /// and the matched advice, build the wrapper that replaces it. Without
    /// this, matching advice leaves the component unwrapped.
    pub fn intercept<S, F>(mut self, wrap: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<S>, MethodAdvice) -> Arc<S> + Send + Sync + 'static,
    {
        self.intercept = Some(Box::new(move |instance, advice| {
            let current = unerase::<S>(&instance).ok_or_else(|| {
                DiError::Internal(format!(
                    "interception target for {} has unexpected shape",
                    std::any::type_name::<S>()
                ))
            })?;
            Ok(erase(wrap(current, advice)))
        }));
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> ComponentDescriptor {
        ComponentDescriptor {
            key: self.key,
            type_name: self.type_name,
            scope: self.scope,
            constructors: self.constructors,
            fields: self.fields,
            init_hooks: self.init_hooks,
            teardown_hooks: self.teardown_hooks,
            advice: self.advice,
            methods: self.methods,
            matched_as: self.matched_as,
            expose: self.expose,
            intercept: self.intercept,
        }
    }
}

// =============================================================================
// DependencySet - declared constructor parameter shapes
// =============================================================================

/// The dependency shape of an injection-marked constructor.
///
/// Implemented for `()` (no dependencies), `Arc<T>` (one), and tuples of
/// `Arc`s up to eight elements. `keys` lists the declared parameter types in
/// order; `assemble` rebuilds the shape from instances the container
/// resolved by exactly those keys.
pub trait DependencySet: Sized + 'static {
    /// Declared parameter identities, in constructor order.
    fn keys() -> Vec<BeanKey>;

    /// Reassemble the shape from resolved instances (same order as `keys`).
    fn assemble(resolved: Vec<AnyInstance>) -> DiResult<Self>;
}

impl DependencySet for () {
    fn keys() -> Vec<BeanKey> {
        Vec::new()
    }

    fn assemble(_resolved: Vec<AnyInstance>) -> DiResult<Self> {
        Ok(())
    }
}

fn take_one<A: ?Sized + Send + Sync + 'static>(
    iter: &mut std::vec::IntoIter<AnyInstance>,
) -> DiResult<Arc<A>> {
    let any = iter
        .next()
        .ok_or_else(|| DiError::Internal("constructor parameter count mismatch".into()))?;
    unerase::<A>(&any).ok_or_else(|| {
        DiError::Internal(format!(
            "resolved parameter {} has unexpected shape",
            std::any::type_name::<A>()
        ))
    })
}

impl<A: ?Sized + Send + Sync + 'static> DependencySet for Arc<A> {
    fn keys() -> Vec<BeanKey> {
        vec![BeanKey::of::<A>()]
    }

    fn assemble(resolved: Vec<AnyInstance>) -> DiResult<Self> {
        let mut iter = resolved.into_iter();
        take_one::<A>(&mut iter)
    }
}

macro_rules! tuple_dependency_set {
    ($($name:ident),+) => {
        impl<$($name: ?Sized + Send + Sync + 'static),+> DependencySet for ($(Arc<$name>,)+) {
            fn keys() -> Vec<BeanKey> {
                vec![$(BeanKey::of::<$name>()),+]
            }

            fn assemble(resolved: Vec<AnyInstance>) -> DiResult<Self> {
                let mut iter = resolved.into_iter();
                Ok(($(take_one::<$name>(&mut iter)?,)+))
            }
        }
    };
}

tuple_dependency_set!(A, B);
tuple_dependency_set!(A, B, C);
tuple_dependency_set!(A, B, C, D);
tuple_dependency_set!(A, B, C, D, E);
tuple_dependency_set!(A, B, C, D, E, F);
tuple_dependency_set!(A, B, C, D, E, F, G);
tuple_dependency_set!(A, B, C, D, E, F, G, H);

// =============================================================================
// Injected - late-bound field slot
// =============================================================================

/// Write-once slot for an injection-marked field.
///
/// Components declare injected fields as `Injected<Dep>` and read them with
/// [`Injected::get`]; the field injector fills the slot after construction.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use wirebox::Injected;
///
/// struct Logger;
/// struct Audit { logger: Injected<Logger> }
///
/// let audit = Audit { logger: Injected::empty() };
/// assert!(audit.logger.get().is_none());
/// audit.logger.set(Arc::new(Logger));
/// assert!(audit.logger.get().is_some());
/// ```
pub struct Injected<T: ?Sized> {
    slot: OnceCell<Arc<T>>,
}

impl<T: ?Sized> Injected<T> {
    /// An unfilled slot.
    #[inline]
    pub fn empty() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }

    /// Fill the slot. Returns `false` if it was already filled (the first
    /// assignment wins).
    #[inline]
    pub fn set(&self, value: Arc<T>) -> bool {
        self.slot.set(value).is_ok()
    }

    /// The injected dependency, if the slot has been filled.
    #[inline]
    pub fn get(&self) -> Option<&Arc<T>> {
        self.slot.get()
    }

    /// Whether the slot has been filled.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.slot.get().is_some()
    }
}

impl<T: ?Sized> Default for Injected<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> fmt::Debug for Injected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injected")
            .field("set", &self.is_set())
            .finish()
    }
}
