//! # Wirebox - Descriptor-Driven Inversion of Control
//!
//! A container runtime that takes component descriptors discovered by an
//! external locator, builds the dependency graph, instantiates components in
//! order, injects collaborators, runs lifecycle hooks, and wraps matched
//! components in interception proxies that run cross-cutting before advice.
//!
//! ## Features
//!
//! - **Descriptor-driven** - components are described by a declarative
//!   metadata table, never by runtime scanning
//! - **Scope-aware caching** - `singleton` beans are shared and cached,
//!   `prototype` beans are rebuilt (and re-injected) per request
//! - **Constructor and field injection** - resolved strictly by declared
//!   type, recursively through the container
//! - **Lifecycle hooks** - init hooks after injection, LIFO teardown hooks
//!   at shutdown, both best-effort
//! - **Before advice** - exact `(owner-type, method)` pointcuts, applied by
//!   a one-shot interception pass over the singleton cache
//! - **Cycle detection** - constructor cycles fail fast with the full path
//! - **Observable** - structured `tracing` events under the `wirebox` target
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use wirebox::{ComponentDescriptor, Container, ManifestLocator};
//!
//! struct Clock;
//!
//! impl Clock {
//!     fn now(&self) -> u64 {
//!         42
//!     }
//! }
//!
//! struct Scheduler {
//!     clock: Arc<Clock>,
//! }
//!
//! fn clock_descriptor() -> ComponentDescriptor {
//!     ComponentDescriptor::component::<Clock>()
//!         .constructor(|| Clock)
//!         .build()
//! }
//!
//! fn scheduler_descriptor() -> ComponentDescriptor {
//!     ComponentDescriptor::component::<Scheduler>()
//!         .injected_constructor::<Arc<Clock>, _>(|clock| Scheduler { clock })
//!         .build()
//! }
//!
//! let locator = ManifestLocator::new()
//!     .entry("app.time", clock_descriptor)
//!     .entry("app.jobs", scheduler_descriptor);
//!
//! let container = Container::construct("app", &locator);
//!
//! let scheduler = container.get_bean::<Scheduler>().unwrap();
//! assert_eq!(scheduler.clock.now(), 42);
//!
//! container.shutdown();
//! ```
//!
//! ## Scopes
//!
//! A descriptor's scope is a plain string fixed at discovery time:
//! `"singleton"` beans are constructed during bootstrap (or lazily on first
//! request) and cached until shutdown; `"prototype"` beans are constructed,
//! injected, and initialized freshly on every request and are never proxied.
//! Anything else fails with `UnsupportedScope` at first use.

mod aspect;
mod container;
mod descriptor;
mod error;
mod lifecycle;
mod locator;
#[cfg(feature = "logging")]
pub mod logging;
mod registry;
mod resolver;

pub use aspect::{AdviceError, AdviceTable, MethodAdvice, Pointcut};
pub use container::Container;
pub use descriptor::{
    BeanKey, ComponentDescriptor, DependencySet, DescriptorBuilder, HookResult, Injected,
    SCOPE_PROTOTYPE, SCOPE_SINGLETON,
};
pub use error::{DiError, DiResult, HookKind, InjectionSite};
pub use locator::{ComponentLocator, DescriptorFn, ManifestLocator};
pub use registry::{BeanDefinition, DefinitionRegistry};

/// Descriptor derive macro (requires the `derive` feature).
#[cfg(feature = "derive")]
pub use wirebox_derive::Component;

// Re-export tracing macros for convenience when logging is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AdviceError, ComponentDescriptor, ComponentLocator, Container, DiError, DiResult,
        Injected, ManifestLocator, MethodAdvice,
    };
    pub use std::sync::Arc;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // Demo component set mirroring the showcase harness: a logger with
    // lifecycle hooks, a repository, a user service surfaced as a trait and
    // intercepted by a tracing aspect.

    static EVENTS: Mutex<Vec<String>> = Mutex::new(Vec::new());
    static ADVICE_RUNS: AtomicUsize = AtomicUsize::new(0);

    fn record(event: impl Into<String>) {
        EVENTS.lock().unwrap().push(event.into());
    }

    #[derive(Debug)]
    struct LoggerService;

    impl LoggerService {
        fn log(&self, message: &str) {
            record(format!("LOG: {message}"));
        }

        fn initialize(&self) {
            record("initialized");
        }
    }

    #[derive(Debug)]
    struct UserRepository;

    impl UserRepository {
        fn get_data(&self, id: &str) -> String {
            format!("Data from UserRepository{id}")
        }
    }

    trait UserApi: Send + Sync + std::fmt::Debug {
        fn process_data(&self) -> Result<String, AdviceError>;
        fn describe(&self) -> Result<String, AdviceError>;
    }

    #[derive(Debug)]
    struct UserService {
        repository: Arc<UserRepository>,
        logger: Arc<LoggerService>,
    }

    impl UserApi for UserService {
        fn process_data(&self) -> Result<String, AdviceError> {
            let data = self.repository.get_data("1");
            self.logger.log(&format!("Data processed: {data}"));
            Ok(format!("UserService processing: {data}"))
        }

        fn describe(&self) -> Result<String, AdviceError> {
            Ok("user service".to_string())
        }
    }

    #[derive(Debug)]
    struct UserApiProxy {
        inner: Arc<dyn UserApi>,
        advice: MethodAdvice,
    }

    impl UserApi for UserApiProxy {
        fn process_data(&self) -> Result<String, AdviceError> {
            self.advice.before("process_data", &[])?;
            self.inner.process_data()
        }

        fn describe(&self) -> Result<String, AdviceError> {
            self.advice.before("describe", &[])?;
            self.inner.describe()
        }
    }

    struct TraceAspect;

    #[derive(Debug)]
    struct AuditService {
        logger: Injected<LoggerService>,
    }

    fn logger_descriptor() -> ComponentDescriptor {
        ComponentDescriptor::component::<LoggerService>()
            .constructor(|| LoggerService)
            .init_hook("initialize", |logger| {
                logger.initialize();
                Ok(())
            })
            .teardown_hook("shutdown_logger", |_logger| {
                record("shutdown");
                Ok(())
            })
            .build()
    }

    fn repository_descriptor() -> ComponentDescriptor {
        ComponentDescriptor::component::<UserRepository>()
            .constructor(|| UserRepository)
            .build()
    }

    fn user_service_descriptor() -> ComponentDescriptor {
        ComponentDescriptor::component::<UserService>()
            .injected_constructor::<(Arc<UserRepository>, Arc<LoggerService>), _>(
                |(repository, logger)| UserService { repository, logger },
            )
            .surface::<dyn UserApi, _>(|service| service)
            .methods(&["process_data", "describe"])
            .matched_as("demo.user.UserApi")
            .intercept::<dyn UserApi, _>(|inner, advice| Arc::new(UserApiProxy { inner, advice }))
            .build()
    }

    fn aspect_descriptor() -> ComponentDescriptor {
        ComponentDescriptor::component::<TraceAspect>()
            .before_advice("demo.user.UserApi.process_data", |_args| {
                ADVICE_RUNS.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build()
    }

    fn audit_descriptor() -> ComponentDescriptor {
        ComponentDescriptor::component::<AuditService>()
            .constructor(|| AuditService {
                logger: Injected::empty(),
            })
            .field::<LoggerService, _>("logger", |audit, logger| {
                audit.logger.set(logger);
            })
            .build()
    }

    #[test]
    fn test_user_service_scenario() {
        let locator = ManifestLocator::new()
            .entry("demo.infra", logger_descriptor)
            .entry("demo.user", repository_descriptor)
            .entry("demo.user", user_service_descriptor)
            .entry("demo.aspect", aspect_descriptor);
        let container = Container::construct("demo", &locator);

        // Bootstrap already ran the logger's init hook.
        assert!(EVENTS.lock().unwrap().iter().any(|e| e == "initialized"));

        let before = ADVICE_RUNS.load(Ordering::SeqCst);
        let service = container.get_bean::<dyn UserApi>().unwrap();

        let result = service.process_data().unwrap();
        assert_eq!(result, "UserService processing: Data from UserRepository1");
        assert_eq!(ADVICE_RUNS.load(Ordering::SeqCst), before + 1);

        // A method with no matching pointcut is never intercepted.
        assert_eq!(service.describe().unwrap(), "user service");
        assert_eq!(ADVICE_RUNS.load(Ordering::SeqCst), before + 1);

        container.shutdown();
        assert!(EVENTS.lock().unwrap().iter().any(|e| e == "shutdown"));
        assert!(matches!(
            container.get_bean::<dyn UserApi>().unwrap_err(),
            DiError::BeanNotFound { .. }
        ));
    }

    #[test]
    fn test_singleton_identity_through_the_surface() {
        let locator = ManifestLocator::new()
            .entry("ident.infra", logger_descriptor)
            .entry("ident.user", repository_descriptor)
            .entry("ident.user", user_service_descriptor);
        let container = Container::construct("ident", &locator);

        let first = container.get_bean::<dyn UserApi>().unwrap();
        let second = container.get_bean::<dyn UserApi>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_field_injection_fills_the_slot() {
        let locator = ManifestLocator::new()
            .entry("audit.infra", logger_descriptor)
            .entry("audit.svc", audit_descriptor);
        let container = Container::construct("audit", &locator);

        let audit = container.get_bean::<AuditService>().unwrap();
        let injected = audit.logger.get().expect("field injected during bootstrap");

        // The injected logger is the shared singleton.
        let logger = container.get_bean::<LoggerService>().unwrap();
        assert!(Arc::ptr_eq(injected, &logger));
    }

    #[test]
    fn test_field_injection_failure_names_the_field() {
        // Audit service without its logger registered, as a prototype so the
        // failure surfaces on request rather than in bootstrap.
        fn orphan_audit_descriptor() -> ComponentDescriptor {
            ComponentDescriptor::component::<AuditService>()
                .prototype()
                .constructor(|| AuditService {
                    logger: Injected::empty(),
                })
                .field::<LoggerService, _>("logger", |audit, logger| {
                    audit.logger.set(logger);
                })
                .build()
        }

        let locator = ManifestLocator::new().entry("orphan", orphan_audit_descriptor);
        let container = Container::construct("orphan", &locator);

        match container.get_bean::<AuditService>().unwrap_err() {
            DiError::UnresolvedDependency { site, .. } => {
                assert_eq!(site, InjectionSite::Field("logger"));
            }
            other => panic!("expected UnresolvedDependency, got {other:?}"),
        }
    }

    #[test]
    fn test_failing_advice_aborts_delegation() {
        static DELEGATED: AtomicUsize = AtomicUsize::new(0);

        trait Job: Send + Sync {
            fn run(&self) -> Result<(), AdviceError>;
        }

        struct Runner;
        impl Job for Runner {
            fn run(&self) -> Result<(), AdviceError> {
                DELEGATED.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        struct JobProxy {
            inner: Arc<dyn Job>,
            advice: MethodAdvice,
        }
        impl Job for JobProxy {
            fn run(&self) -> Result<(), AdviceError> {
                self.advice.before("run", &[])?;
                self.inner.run()
            }
        }

        struct GateAspect;

        fn runner_descriptor() -> ComponentDescriptor {
            ComponentDescriptor::component::<Runner>()
                .constructor(|| Runner)
                .surface::<dyn Job, _>(|runner| runner)
                .methods(&["run"])
                .matched_as("jobs.Job")
                .intercept::<dyn Job, _>(|inner, advice| Arc::new(JobProxy { inner, advice }))
                .build()
        }

        fn gate_descriptor() -> ComponentDescriptor {
            ComponentDescriptor::component::<GateAspect>()
                .before_advice("jobs.Job.run", |_args| Err(AdviceError::new("gate closed")))
                .build()
        }

        let locator = ManifestLocator::new()
            .entry("jobs", runner_descriptor)
            .entry("jobs", gate_descriptor);
        let container = Container::construct("jobs", &locator);

        let job = container.get_bean::<dyn Job>().unwrap();
        let err = job.run().unwrap_err();
        assert!(err.to_string().contains("gate closed"));
        assert_eq!(DELEGATED.load(Ordering::SeqCst), 0);
    }
}
