//! # ACL Registry
//!
//! Owns roles and resources and resolves access decisions across the role
//! hierarchy.
//!
//! ## Overview
//!
//! The acl-registry crate handles:
//! - **Registration**: Idempotent, first-write-wins registration of roles
//!   and scoped resources
//! - **Resolution**: Direct rules first, then parents in declaration order,
//!   failing closed on anything unknown
//! - **Graph checks**: Cycle and depth limits on the parent graph
//! - **Snapshots**: Whole-registry records for an external store
//!
//! ## Usage
//!
//! ```rust
//! use acl_core::{Resource, Role};
//! use acl_registry::Registry;
//!
//! let mut registry = Registry::new();
//! registry.add_roles(["guest"]);
//! registry.add_role(Role::with_parents("admin", ["guest"]));
//!
//! let dashboard = registry.add_resource("dashboard").clone();
//! let reports = registry.add_resource(Resource::scoped("reports", "billing")).clone();
//!
//! registry.allow("guest", &dashboard).unwrap();
//! registry.allow("admin", &reports).unwrap();
//!
//! assert!(registry.is_allowed("admin", &dashboard).unwrap());
//! assert!(registry.is_allowed_in("admin", "reports", "billing").unwrap());
//! assert!(!registry.is_allowed("guest", &reports).unwrap());
//!
//! // Bare names are looked up in the global scope
//! assert!(!registry.is_allowed("admin", "reports").unwrap());
//! ```
//!
//! ## Logging
//!
//! Registration and rule changes are logged at `debug`, decisions at
//! `trace`, and graph errors at `warn`, through `tracing`. No subscriber is
//! installed here.

pub mod config;
pub mod registry;
pub mod snapshot;

// Re-export main types for convenience
pub use config::{ConfigError, RegistryConfig};
pub use registry::{Registry, ResourceMap};
pub use snapshot::RegistrySnapshot;
