//! Lifecycle hook sequencing
//!
//! Init hooks run exactly once per instance, immediately after field
//! injection. Teardown hooks are tracked per cached instance in a
//! [`DisposeBag`] and drained in LIFO order at shutdown. Hook failures are
//! reported and never abort the surrounding operation.

use crate::descriptor::{AnyInstance, HookResult};
use crate::error::{DiError, HookKind};
use crate::registry::BeanDefinition;
use std::sync::{Arc, Mutex};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Run every init hook declared for the definition against a freshly
/// injected instance. A failing hook is reported and the rest still run.
pub(crate) fn run_init_hooks(def: &BeanDefinition, instance: &AnyInstance) {
    for hook in &def.descriptor.init_hooks {
        match (hook.invoke.as_ref())(instance) {
            Ok(()) => {
                #[cfg(feature = "logging")]
                debug!(
                    target: "wirebox",
                    component = def.type_name(),
                    hook = hook.name,
                    "init hook completed"
                );
            }
            Err(err) => {
                let report = DiError::LifecycleHook {
                    type_name: def.type_name(),
                    hook: hook.name,
                    kind: HookKind::Init,
                    message: err.to_string(),
                };
                #[cfg(feature = "logging")]
                warn!(target: "wirebox", error = %report, "init hook failed, continuing");
                #[cfg(not(feature = "logging"))]
                let _ = report;
            }
        }
    }
}

/// One tracked teardown invocation, bound to its instance at creation time.
struct Disposal {
    component: &'static str,
    hook: &'static str,
    run: Box<dyn FnOnce() -> HookResult + Send>,
}

/// Teardown hooks over every instance the container still holds a reference
/// to, drained in LIFO order at shutdown.
pub(crate) struct DisposeBag {
    entries: Mutex<Vec<Disposal>>,
}

impl DisposeBag {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Bind the definition's teardown hooks to a newly cached instance.
    pub(crate) fn track(&self, def: &BeanDefinition, instance: &AnyInstance) {
        if def.descriptor.teardown_hooks.is_empty() {
            return;
        }
        let mut entries = self.entries.lock().unwrap();
        for hook in &def.descriptor.teardown_hooks {
            let invoke = Arc::clone(&hook.invoke);
            let payload = instance.clone();
            entries.push(Disposal {
                component: def.type_name(),
                hook: hook.name,
                run: Box::new(move || (invoke.as_ref())(&payload)),
            });
        }
    }

    /// Drain every tracked teardown hook, newest first. Failures are
    /// reported and remaining hooks still execute.
    pub(crate) fn dispose_all(&self) {
        let mut entries = std::mem::take(&mut *self.entries.lock().unwrap());
        while let Some(disposal) = entries.pop() {
            match (disposal.run)() {
                Ok(()) => {
                    #[cfg(feature = "logging")]
                    debug!(
                        target: "wirebox",
                        component = disposal.component,
                        hook = disposal.hook,
                        "teardown hook completed"
                    );
                }
                Err(err) => {
                    let report = DiError::LifecycleHook {
                        type_name: disposal.component,
                        hook: disposal.hook,
                        kind: HookKind::Teardown,
                        message: err.to_string(),
                    };
                    #[cfg(feature = "logging")]
                    warn!(target: "wirebox", error = %report, "teardown hook failed, continuing");
                    #[cfg(not(feature = "logging"))]
                    let _ = report;
                }
            }
        }
    }

    /// Number of tracked teardown invocations.
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}
