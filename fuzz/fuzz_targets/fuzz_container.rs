#![no_main]

//! Fuzz target for container operation sequences
//!
//! Applies arbitrary operation sequences to a container built over a small
//! fixed manifest and checks the scope invariants hold at every step.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;
use wirebox::{ComponentDescriptor, Container, ManifestLocator};

struct Shared;

struct PerRequest;

struct Dependent {
    shared: Arc<Shared>,
}

struct Unregistered;

fn shared_descriptor() -> ComponentDescriptor {
    ComponentDescriptor::component::<Shared>()
        .constructor(|| Shared)
        .teardown_hook("close", |_shared| Ok(()))
        .build()
}

fn per_request_descriptor() -> ComponentDescriptor {
    ComponentDescriptor::component::<PerRequest>()
        .prototype()
        .constructor(|| PerRequest)
        .build()
}

fn dependent_descriptor() -> ComponentDescriptor {
    ComponentDescriptor::component::<Dependent>()
        .injected_constructor::<Arc<Shared>, _>(|shared| Dependent { shared })
        .build()
}

/// Operations to perform on the container
#[derive(Debug, Arbitrary)]
enum ContainerOp {
    GetShared,
    GetPerRequest,
    GetDependent,
    GetUnregistered,
    TryGetShared,
    Contains,
    Counts,
    Shutdown,
}

fuzz_target!(|ops: Vec<ContainerOp>| {
    let locator = ManifestLocator::new()
        .entry("fuzz.infra", shared_descriptor)
        .entry("fuzz.infra", per_request_descriptor)
        .entry("fuzz.app", dependent_descriptor);
    let container = Container::construct("fuzz", &locator);

    let mut shut_down = false;

    for op in ops {
        match op {
            ContainerOp::GetShared => {
                let result = container.get_bean::<Shared>();
                if shut_down {
                    assert!(result.is_err());
                } else {
                    let first = result.unwrap();
                    let second = container.get_bean::<Shared>().unwrap();
                    assert!(Arc::ptr_eq(&first, &second));
                }
            }
            ContainerOp::GetPerRequest => {
                if !shut_down {
                    let first = container.get_bean::<PerRequest>().unwrap();
                    let second = container.get_bean::<PerRequest>().unwrap();
                    assert!(!Arc::ptr_eq(&first, &second));
                }
            }
            ContainerOp::GetDependent => {
                if !shut_down {
                    let dependent = container.get_bean::<Dependent>().unwrap();
                    let shared = container.get_bean::<Shared>().unwrap();
                    assert!(Arc::ptr_eq(&dependent.shared, &shared));
                }
            }
            ContainerOp::GetUnregistered => {
                assert!(container.get_bean::<Unregistered>().is_err());
            }
            ContainerOp::TryGetShared => {
                let found = container.try_get_bean::<Shared>().is_some();
                assert_eq!(found, !shut_down);
            }
            ContainerOp::Contains => {
                assert_eq!(container.contains::<Shared>(), !shut_down);
                assert!(!container.contains::<Unregistered>());
            }
            ContainerOp::Counts => {
                if shut_down {
                    assert_eq!(container.definition_count(), 0);
                    assert_eq!(container.cached_count(), 0);
                } else {
                    assert_eq!(container.definition_count(), 3);
                }
            }
            ContainerOp::Shutdown => {
                container.shutdown();
                shut_down = true;
            }
        }
    }
});
