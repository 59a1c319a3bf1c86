//! Error types for container operations

use std::fmt;
use thiserror::Error;

/// Where a dependency was declared on its owning component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionSite {
    /// A parameter of the injection-marked constructor
    Constructor,
    /// A named injection-marked field
    Field(&'static str),
}

impl fmt::Display for InjectionSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjectionSite::Constructor => write!(f, "constructor"),
            InjectionSite::Field(name) => write!(f, "field `{}`", name),
        }
    }
}

/// Errors that can occur while registering, resolving, or tearing down beans
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// Requested type was never discovered by the locator
    #[error("no bean definition for type: {type_name}")]
    BeanNotFound { type_name: &'static str },

    /// More than one constructor on the type carries the injection marker
    #[error("multiple injection-marked constructors on {type_name}")]
    AmbiguousInjectionPoint { type_name: &'static str },

    /// No injection-marked constructor and no argless fallback
    #[error("no usable constructor for {type_name}")]
    NoUsableConstructor { type_name: &'static str },

    /// A constructor parameter or field type could not be satisfied
    #[error("unresolved dependency {dependency} for {site} of {owner}")]
    UnresolvedDependency {
        owner: &'static str,
        dependency: &'static str,
        site: InjectionSite,
    },

    /// The definition declares a scope outside {singleton, prototype}
    #[error("unsupported scope `{scope}` declared by {type_name}")]
    UnsupportedScope { type_name: &'static str, scope: String },

    /// Constructor resolution re-entered a type already being resolved
    #[error("cyclic dependency: {}", .path.join(" -> "))]
    CyclicDependency { path: Vec<&'static str> },

    /// An init or teardown hook raised (reported, never propagated past the
    /// lifecycle manager)
    #[error("{kind} hook `{hook}` failed on {type_name}: {message}")]
    LifecycleHook {
        type_name: &'static str,
        hook: &'static str,
        kind: HookKind,
        message: String,
    },

    /// Erasure invariant breach (a cached payload had an unexpected shape)
    #[error("internal container error: {0}")]
    Internal(String),
}

/// The two lifecycle hook kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Init,
    Teardown,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKind::Init => write!(f, "init"),
            HookKind::Teardown => write!(f, "teardown"),
        }
    }
}

impl DiError {
    /// Create a BeanNotFound error for a type
    #[inline]
    pub fn not_found(type_name: &'static str) -> Self {
        Self::BeanNotFound { type_name }
    }

    /// Create an UnresolvedDependency error for a constructor parameter
    #[inline]
    pub fn unresolved_parameter(owner: &'static str, dependency: &'static str) -> Self {
        Self::UnresolvedDependency {
            owner,
            dependency,
            site: InjectionSite::Constructor,
        }
    }

    /// Create an UnresolvedDependency error for a field
    #[inline]
    pub fn unresolved_field(
        owner: &'static str,
        field: &'static str,
        dependency: &'static str,
    ) -> Self {
        Self::UnresolvedDependency {
            owner,
            dependency,
            site: InjectionSite::Field(field),
        }
    }
}

/// Result type alias for container operations
pub type DiResult<T> = std::result::Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_includes_path() {
        let err = DiError::CyclicDependency {
            path: vec!["A", "B", "A"],
        };
        assert_eq!(err.to_string(), "cyclic dependency: A -> B -> A");
    }

    #[test]
    fn test_unresolved_field_message_names_field() {
        let err = DiError::unresolved_field("AuditService", "logger", "LoggerService");
        assert_eq!(
            err.to_string(),
            "unresolved dependency LoggerService for field `logger` of AuditService"
        );
    }

    #[test]
    fn test_hook_error_message() {
        let err = DiError::LifecycleHook {
            type_name: "LoggerService",
            hook: "initialize",
            kind: HookKind::Init,
            message: "boom".into(),
        };
        assert_eq!(
            err.to_string(),
            "init hook `initialize` failed on LoggerService: boom"
        );
    }
}
