//! # ACL Core
//!
//! Data model for the scoped access-control list: roles, resources and the
//! direct allow/deny rules that link them.
//!
//! ## Overview
//!
//! The acl-core crate handles:
//! - **Resources**: Protected objects identified by `(scope, name)`
//! - **Roles**: Named subjects with parent roles and direct rules
//! - **Records**: Plain structured forms for external stores
//! - **Resolution seam**: The [`AccessResolver`] trait that role and
//!   resource checks delegate to
//!
//! ## Architecture
//!
//! ```text
//! Role ──parents (names only)──→ Role names
//!   └─ access: scope → resource name → allow/deny
//!
//! Resource = (scope, name)          scope defaults to "global"
//! ```
//!
//! The resolution algorithm itself lives in `acl-registry`, which owns the
//! roles and resources and implements [`AccessResolver`].
//!
//! ## Usage
//!
//! ```rust
//! use acl_core::{Resource, Role, RoleRecord};
//!
//! let dashboard = Resource::new("dashboard");
//! let reports = Resource::scoped("reports", "billing");
//!
//! let mut admin = Role::with_parents("admin", ["guest"]);
//! admin.allow(&reports).deny(&dashboard);
//!
//! // Records round-trip through an external store
//! let json = admin.to_record().to_json().unwrap();
//! let restored = Role::from_record(RoleRecord::from_json(&json).unwrap(), None).unwrap();
//! assert_eq!(restored, admin);
//! ```

pub mod error;
pub mod resolver;
pub mod resource;
pub mod role;

// Re-export main types for convenience
pub use error::{AclError, AclResult};
pub use resolver::AccessResolver;
pub use resource::{Resource, ResourceEntry, ResourceRecord, ResourceRef, DEFAULT_SCOPE};
pub use role::{AccessTable, Role, RoleEntry, RoleRecord, RoleRef};
