//! Example demonstrating the #[derive(Component)] macro
//!
//! Run with:
//!   cargo run --example derive --features derive

use std::sync::Arc;
use wirebox::{Component, Container, ManifestLocator};

#[derive(Component)]
struct Database;

#[derive(Component)]
#[component(scope = "singleton", init = "connect", teardown = "disconnect")]
struct Repository {
    #[inject]
    db: Arc<Database>,
    // Non-injected field uses Default
    hits: u64,
}

impl Repository {
    fn connect(&self) {
        println!("repository connected");
    }

    fn disconnect(&self) {
        println!("repository disconnected");
    }

    fn describe(&self) -> String {
        let _ = &self.db;
        format!("repository ready (hits: {})", self.hits)
    }
}

fn main() {
    let locator = ManifestLocator::new()
        .entry("app.storage", Database::descriptor)
        .entry("app.storage", Repository::descriptor);

    let container = Container::construct("app", &locator);

    let repository = container.get_bean::<Repository>().unwrap();
    println!("{}", repository.describe());

    container.shutdown();
}
