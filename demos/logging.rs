//! Example demonstrating container event logging
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```

use wirebox::{ComponentDescriptor, Container, ManifestLocator};

struct Database;

struct ReportService {
    db: std::sync::Arc<Database>,
}

fn database_descriptor() -> ComponentDescriptor {
    ComponentDescriptor::component::<Database>()
        .constructor(|| Database)
        .teardown_hook("disconnect", |_db| Ok(()))
        .build()
}

fn report_descriptor() -> ComponentDescriptor {
    ComponentDescriptor::component::<ReportService>()
        .prototype()
        .injected_constructor::<std::sync::Arc<Database>, _>(|db| ReportService { db })
        .build()
}

fn main() {
    // Install the subscriber - pretty or JSON depending on features
    wirebox::logging::init();

    println!("=== Wirebox Logging Demo ===\n");

    // Construction logs registration, eager singleton creation, advice
    // collection, and the ready banner
    let locator = ManifestLocator::new()
        .entry("app.storage", database_descriptor)
        .entry("app.reports", report_descriptor);
    let container = Container::construct("app", &locator);

    // Cache hit for the singleton, fresh construction per prototype request
    let _db = container.get_bean::<Database>().unwrap();
    let report = container.get_bean::<ReportService>().unwrap();
    let _ = &report.db;

    // Teardown hook + table clearing
    container.shutdown();

    println!("\n=== Demo complete ===");
}
