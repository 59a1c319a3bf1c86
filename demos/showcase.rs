//! End-to-end demonstration harness
//!
//! Builds a manifest of demo components (a logger with lifecycle hooks, a
//! repository, a user service surfaced as a trait, and a logging aspect),
//! constructs the container over it, calls the user service through its
//! surface, and shuts down.
//!
//! Run with:
//!   cargo run --example showcase

use std::sync::Arc;
use wirebox::{AdviceError, ComponentDescriptor, Container, Injected, ManifestLocator, MethodAdvice};

// =============================================================================
// Demo components
// =============================================================================

struct LoggerService;

impl LoggerService {
    fn log(&self, message: &str) {
        println!("LOG: {message}");
    }

    fn initialize(&self) {
        println!("LoggerService initialized.");
    }

    fn close(&self) {
        println!("LoggerService shutting down.");
    }
}

struct UserRepository;

impl UserRepository {
    fn get_data(&self, id: &str) -> String {
        format!("Data from UserRepository{id}")
    }
}

/// Capability surface of the user service; the interception proxy
/// implements the same trait.
trait UserApi: Send + Sync {
    fn process_data(&self) -> Result<String, AdviceError>;
}

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
}

/// Decorator replacing the cached user service when advice matches.
struct UserApiProxy {
    inner: Arc<dyn UserApi>,
    advice: MethodAdvice,
}

impl UserApi for UserApiProxy {
    fn process_data(&self) -> Result<String, AdviceError> {
        self.advice.before("process_data", &[])?;
        self.inner.process_data()
    }
}

/// Aspect contributing a before advice against the user service surface.
struct LoggingAspect;

/// Field-injected collaborator: gets the shared logger after construction.
struct AuditService {
    logger: Injected<LoggerService>,
}

impl AuditService {
    fn audit(&self, message: &str) {
        if let Some(logger) = self.logger.get() {
            logger.log(&format!("AUDIT: {message}"));
        }
    }
}

// =============================================================================
// Descriptor table
// =============================================================================

fn logger_descriptor() -> ComponentDescriptor {
    ComponentDescriptor::component::<LoggerService>()
        .constructor(|| LoggerService)
        .init_hook("initialize", |logger| {
            logger.initialize();
            Ok(())
        })
        .teardown_hook("close", |logger| {
            logger.close();
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
            |(repository, logger)| {
                logger.log("UserService created.");
                UserService { repository, logger }
            },
        )
        .surface::<dyn UserApi, _>(|service| service)
        .methods(&["process_data"])
        .matched_as("demo.user.UserApi")
        .intercept::<dyn UserApi, _>(|inner, advice| Arc::new(UserApiProxy { inner, advice }))
        .build()
}

fn logging_aspect_descriptor() -> ComponentDescriptor {
    ComponentDescriptor::component::<LoggingAspect>()
        .before_advice("demo.user.UserApi.process_data", |_args| {
            println!("Before UserService.process_data() is called.");
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

fn main() {
    let locator = ManifestLocator::new()
        .entry("demo.infra", logger_descriptor)
        .entry("demo.user", repository_descriptor)
        .entry("demo.user", user_service_descriptor)
        .entry("demo.aspect", logging_aspect_descriptor)
        .entry("demo.audit", audit_descriptor);

    let container = Container::construct("demo", &locator);

    match container.get_bean::<dyn UserApi>() {
        Ok(user_service) => match user_service.process_data() {
            Ok(result) => println!("{result}"),
            Err(err) => println!("processing aborted: {err}"),
        },
        Err(err) => println!("UserService not found in the container: {err}"),
    }

    if let Some(audit) = container.try_get_bean::<AuditService>() {
        audit.audit("demo run complete");
    }

    container.shutdown();
}
