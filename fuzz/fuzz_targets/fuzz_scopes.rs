#![no_main]

//! Fuzz target for arbitrary declared scope strings
//!
//! Scope values are metadata strings validated only at first use; any value
//! outside {singleton, prototype} must surface as an error, never a panic.

use libfuzzer_sys::fuzz_target;
use wirebox::{ComponentDescriptor, ComponentLocator, Container, DiError};

struct Scoped;

struct ScopeLocator {
    scope: String,
}

impl ComponentLocator for ScopeLocator {
    fn locate(&self, _namespace_root: &str) -> Vec<ComponentDescriptor> {
        vec![
            ComponentDescriptor::component::<Scoped>()
                .scope(&self.scope)
                .constructor(|| Scoped)
                .build(),
        ]
    }
}

fuzz_target!(|scope: String| {
    let locator = ScopeLocator {
        scope: scope.clone(),
    };
    let container = Container::construct("fuzz", &locator);

    // Registration must have accepted the scope verbatim.
    assert_eq!(container.definition_count(), 1);

    match container.get_bean::<Scoped>() {
        Ok(_) => assert!(scope == "singleton" || scope == "prototype"),
        Err(DiError::UnsupportedScope { scope: declared, .. }) => {
            assert_eq!(declared, scope);
            assert!(scope != "singleton" && scope != "prototype");
        }
        Err(other) => panic!("unexpected error: {other}"),
    }

    container.shutdown();
    container.shutdown();
});
