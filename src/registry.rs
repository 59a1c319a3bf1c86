//! Bean definition registry
//!
//! Holds one [`BeanDefinition`] per discovered type identity, keyed by
//! `TypeId`. Definitions are kept behind `Arc` so lookups never hold a map
//! guard across recursive resolution.

use crate::descriptor::{BeanKey, ComponentDescriptor};
use ahash::RandomState;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::{Arc, Mutex};

/// A registered component: its descriptor, under the identity the locator
/// discovered it with. The singleton cache lives on the container, not here.
pub struct BeanDefinition {
    pub(crate) descriptor: ComponentDescriptor,
}

impl BeanDefinition {
    /// The identity this definition is registered under.
    #[inline]
    pub fn key(&self) -> BeanKey {
        self.descriptor.key()
    }

    /// The declared scope string, verbatim.
    #[inline]
    pub fn scope(&self) -> &str {
        self.descriptor.scope()
    }

    /// The concrete component type name (diagnostics).
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.descriptor.type_name()
    }
}

/// Registry of bean definitions with insert/overwrite semantics.
///
/// Keeps the locator's discovery order so the eager singleton pass and the
/// advice/proxy passes iterate deterministically. Re-registering a type
/// overwrites its definition and keeps its original position.
pub struct DefinitionRegistry {
    definitions: DashMap<TypeId, Arc<BeanDefinition>, RandomState>,
    order: Mutex<Vec<BeanKey>>,
}

impl DefinitionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            definitions: DashMap::with_hasher(RandomState::new()),
            order: Mutex::new(Vec::new()),
        }
    }

    /// Insert or overwrite the definition for the descriptor's type identity.
    pub fn register(&self, descriptor: ComponentDescriptor) {
        let key = descriptor.key();
        let previous = self
            .definitions
            .insert(key.id(), Arc::new(BeanDefinition { descriptor }));
        if previous.is_none() {
            self.order.lock().unwrap().push(key);
        }
    }

    /// Look up a definition by identity.
    #[inline]
    pub fn lookup(&self, key: &BeanKey) -> Option<Arc<BeanDefinition>> {
        self.definitions.get(&key.id()).map(|entry| entry.clone())
    }

    /// Whether an identity has a definition.
    #[inline]
    pub fn contains(&self, key: &BeanKey) -> bool {
        self.definitions.contains_key(&key.id())
    }

    /// All registered identities in discovery order.
    pub fn keys_in_order(&self) -> Vec<BeanKey> {
        self.order.lock().unwrap().clone()
    }

    /// Number of registered definitions.
    #[inline]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the registry is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Drop every definition and the discovery order.
    pub fn clear(&self) {
        self.definitions.clear();
        self.order.lock().unwrap().clear();
    }
}

impl Default for DefinitionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DefinitionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionRegistry")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct First;
    struct Second;

    fn descriptor_for_first(scope: &str) -> ComponentDescriptor {
        ComponentDescriptor::component::<First>()
            .scope(scope)
            .constructor(|| First)
            .build()
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = DefinitionRegistry::new();
        registry.register(descriptor_for_first("singleton"));

        let def = registry.lookup(&BeanKey::of::<First>()).unwrap();
        assert_eq!(def.scope(), "singleton");
        assert!(registry.lookup(&BeanKey::of::<Second>()).is_none());
    }

    #[test]
    fn test_reregistration_overwrites_in_place() {
        let registry = DefinitionRegistry::new();
        registry.register(descriptor_for_first("singleton"));
        registry.register(
            ComponentDescriptor::component::<Second>()
                .constructor(|| Second)
                .build(),
        );
        registry.register(descriptor_for_first("prototype"));

        // Overwrite took effect...
        let def = registry.lookup(&BeanKey::of::<First>()).unwrap();
        assert_eq!(def.scope(), "prototype");

        // ...and the discovery order kept First ahead of Second.
        assert_eq!(registry.len(), 2);
        let order = registry.keys_in_order();
        assert_eq!(order, vec![BeanKey::of::<First>(), BeanKey::of::<Second>()]);
    }

    #[test]
    fn test_clear_drops_definitions_and_order() {
        let registry = DefinitionRegistry::new();
        registry.register(descriptor_for_first("singleton"));
        registry.clear();

        assert!(registry.is_empty());
        assert!(registry.keys_in_order().is_empty());
        assert!(!registry.contains(&BeanKey::of::<First>()));
    }
}
