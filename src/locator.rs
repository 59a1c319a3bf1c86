//! Component locator boundary
//!
//! The container never scans anything itself: an external locator turns a
//! namespace root into an ordered sequence of component descriptors. The
//! bundled [`ManifestLocator`] is a declarative descriptor table, the
//! stand-in for build-time generated discovery.

use crate::descriptor::ComponentDescriptor;

/// Turns a namespace root into an ordered sequence of discovered component
/// descriptors.
pub trait ComponentLocator {
    /// Every descriptor discovered under the namespace root, in discovery
    /// order.
    fn locate(&self, namespace_root: &str) -> Vec<ComponentDescriptor>;
}

/// A descriptor table entry: a function producing one component's metadata.
pub type DescriptorFn = fn() -> ComponentDescriptor;

/// Declarative locator backed by a `(namespace, descriptor)` table.
///
/// `locate` yields the entries whose namespace equals the requested root or
/// sits beneath it (dot-separated segments), preserving table order.
///
/// # Examples
///
/// ```rust
/// use wirebox::{ComponentDescriptor, ComponentLocator, ManifestLocator};
///
/// struct Cache;
///
/// fn cache_descriptor() -> ComponentDescriptor {
///     ComponentDescriptor::component::<Cache>()
///         .constructor(|| Cache)
///         .build()
/// }
///
/// let locator = ManifestLocator::new().entry("app.storage", cache_descriptor);
/// assert_eq!(locator.locate("app").len(), 1);
/// assert_eq!(locator.locate("app.storage").len(), 1);
/// assert!(locator.locate("app.web").is_empty());
/// ```
pub struct ManifestLocator {
    entries: Vec<ManifestEntry>,
}

struct ManifestEntry {
    namespace: &'static str,
    descriptor: DescriptorFn,
}

impl ManifestLocator {
    /// An empty manifest.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a descriptor under a namespace.
    pub fn entry(mut self, namespace: &'static str, descriptor: DescriptorFn) -> Self {
        self.entries.push(ManifestEntry {
            namespace,
            descriptor,
        });
        self
    }

    /// Number of table entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ManifestLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentLocator for ManifestLocator {
    fn locate(&self, namespace_root: &str) -> Vec<ComponentDescriptor> {
        self.entries
            .iter()
            .filter(|entry| in_namespace(entry.namespace, namespace_root))
            .map(|entry| (entry.descriptor)())
            .collect()
    }
}

fn in_namespace(namespace: &str, root: &str) -> bool {
    namespace == root
        || namespace
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('.'))
}
