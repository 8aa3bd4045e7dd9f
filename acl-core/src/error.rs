//! Error types for ACL operations
//!
//! This module defines the errors raised while building the role graph,
//! registering roles and resources, and resolving access. Lookup misses
//! are deliberately absent: a missing role or resource is a deny, not an
//! error.

use thiserror::Error;

/// ACL error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AclError {
    /// Role registration input was neither a name nor a role record
    #[error("Role must be a role record or a name, got: {0}")]
    InvalidRoleType(String),

    /// Resource registration input was neither a name nor a resource record
    #[error("Resource must be a resource record or a name, got: {0}")]
    InvalidResourceType(String),

    /// A role was given itself as parent
    #[error("Role '{0}' can't be the parent of itself")]
    SelfParent(String),

    /// Record-based role construction without a name
    #[error("A role record needs a name")]
    MissingName,

    /// Rule change requested for a role the registry does not hold
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// The parent graph loops back on itself
    #[error("Cyclic role graph: {}", path.join(" -> "))]
    CyclicRoleGraph {
        /// Role names along the cycle, starting and ending with the same role.
        path: Vec<String>,
    },

    /// Inheritance chain deeper than the configured limit
    #[error("Role hierarchy deeper than {0} levels")]
    MaxDepthExceeded(usize),

    /// Record (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for ACL operations.
pub type AclResult<T> = Result<T, AclError>;

impl AclError {
    /// Check if this error describes the shape of the role graph
    /// rather than a bad argument.
    pub fn is_graph_error(&self) -> bool {
        matches!(
            self,
            AclError::CyclicRoleGraph { .. } | AclError::MaxDepthExceeded(_)
        )
    }

    /// Get a stable error code for callers that report errors outward.
    pub fn error_code(&self) -> &'static str {
        match self {
            AclError::InvalidRoleType(_) => "INVALID_ROLE_TYPE",
            AclError::InvalidResourceType(_) => "INVALID_RESOURCE_TYPE",
            AclError::SelfParent(_) => "SELF_PARENT",
            AclError::MissingName => "MISSING_NAME",
            AclError::UnknownRole(_) => "UNKNOWN_ROLE",
            AclError::CyclicRoleGraph { .. } => "CYCLIC_ROLE_GRAPH",
            AclError::MaxDepthExceeded(_) => "MAX_DEPTH_EXCEEDED",
            AclError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for AclError {
    fn from(err: serde_json::Error) -> Self {
        AclError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_path() {
        let err = AclError::CyclicRoleGraph {
            path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "Cyclic role graph: a -> b -> a");
        assert!(err.is_graph_error());
        assert_eq!(err.error_code(), "CYCLIC_ROLE_GRAPH");
    }

    #[test]
    fn test_argument_errors_are_not_graph_errors() {
        assert!(!AclError::SelfParent("admin".to_string()).is_graph_error());
        assert!(!AclError::MissingName.is_graph_error());
        assert!(AclError::MaxDepthExceeded(8).is_graph_error());
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let acl: AclError = err.into();
        assert_eq!(acl.error_code(), "SERIALIZATION_ERROR");
    }
}
