//! Dependency resolution and instantiation
//!
//! Selects the injection point for a definition (the single
//! injection-marked constructor, or the argless fallback), resolves each
//! declared parameter by re-entering the container's full resolution path,
//! and assigns injection-marked fields after construction. Constructor
//! recursion is tracked on a thread-local stack so cycles fail fast with the
//! complete path instead of exhausting the stack.

use crate::container::Container;
use crate::descriptor::{AnyInstance, BeanKey};
use crate::error::{DiError, DiResult};
use crate::registry::BeanDefinition;
use std::cell::RefCell;

#[cfg(feature = "logging")]
use tracing::trace;

thread_local! {
    static RESOLVING: RefCell<Vec<BeanKey>> = const { RefCell::new(Vec::new()) };
}

/// RAII frame on the in-progress resolution stack.
///
/// Entering a key already on the stack is a cycle; the error carries the
/// full path including the re-entered key.
pub(crate) struct ResolveGuard {
    key: BeanKey,
}

impl ResolveGuard {
    pub(crate) fn enter(key: BeanKey) -> DiResult<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|frame| frame.id() == key.id()) {
                let mut path: Vec<&'static str> =
                    stack.iter().map(|frame| frame.name()).collect();
                path.push(key.name());
                return Err(DiError::CyclicDependency { path });
            }
            stack.push(key);
            Ok(())
        })?;
        Ok(Self { key })
    }
}

impl Drop for ResolveGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(last) = stack.pop() {
                debug_assert_eq!(last.id(), self.key.id());
            }
        });
    }
}

/// Produce a new concrete instance for a definition.
///
/// Exactly one injection-marked constructor: resolve each parameter through
/// the container (full scope semantics, not a private bypass) and build.
/// More than one marked: `AmbiguousInjectionPoint`. None marked: fall back
/// to the argless constructor, or fail with `NoUsableConstructor`.
pub(crate) fn instantiate(container: &Container, def: &BeanDefinition) -> DiResult<AnyInstance> {
    let descriptor = &def.descriptor;

    let mut marked = descriptor.constructors.iter().filter(|ctor| ctor.injected);
    let injection_point = marked.next();
    if marked.next().is_some() {
        return Err(DiError::AmbiguousInjectionPoint {
            type_name: descriptor.type_name(),
        });
    }

    if let Some(ctor) = injection_point {
        let mut resolved = Vec::with_capacity(ctor.params.len());
        for param in &ctor.params {
            let dep = container.resolve_key(param).map_err(|err| match err {
                DiError::BeanNotFound { .. } => {
                    DiError::unresolved_parameter(descriptor.type_name(), param.name())
                }
                other => other,
            })?;
            resolved.push(dep);
        }

        #[cfg(feature = "logging")]
        trace!(
            target: "wirebox",
            component = descriptor.type_name(),
            parameters = ctor.params.len(),
            "constructing through injection-marked constructor"
        );

        return (ctor.build)(resolved);
    }

    match descriptor
        .constructors
        .iter()
        .find(|ctor| !ctor.injected && ctor.params.is_empty())
    {
        Some(ctor) => {
            #[cfg(feature = "logging")]
            trace!(
                target: "wirebox",
                component = descriptor.type_name(),
                "constructing through argless constructor"
            );
            (ctor.build)(Vec::new())
        }
        None => Err(DiError::NoUsableConstructor {
            type_name: descriptor.type_name(),
        }),
    }
}

/// Resolve and assign every injection-marked field on a constructed
/// instance. Runs for singletons and for every prototype construction; a
/// dependency the container cannot satisfy fails the whole operation naming
/// the field.
pub(crate) fn inject_fields(
    container: &Container,
    def: &BeanDefinition,
    instance: &AnyInstance,
) -> DiResult<()> {
    for field in &def.descriptor.fields {
        let dep = container.resolve_key(&field.dependency).map_err(|err| match err {
            DiError::BeanNotFound { .. } => DiError::unresolved_field(
                def.type_name(),
                field.name,
                field.dependency.name(),
            ),
            other => other,
        })?;
        (field.assign)(instance, dep)?;

        #[cfg(feature = "logging")]
        trace!(
            target: "wirebox",
            component = def.type_name(),
            field = field.name,
            dependency = field.dependency.name(),
            "injected field"
        );
    }
    Ok(())
}
