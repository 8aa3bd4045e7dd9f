//! Resolution seam between roles/resources and whatever owns the role graph.

use crate::error::AclResult;
use crate::resource::ResourceRef;
use crate::role::RoleRef;

/// Something that can decide whether a role may access a resource.
///
/// [`Role::is_allowed`](crate::Role::is_allowed) and
/// [`Resource::is_allowed_for`](crate::Resource::is_allowed_for) take a
/// resolver explicitly instead of reaching for a process-wide instance.
/// Implementations must fail closed: an unknown role or resource is a
/// deny (`Ok(false)`), never an error.
pub trait AccessResolver {
    /// Resolve the effective decision for `role` on `resource`.
    fn resolve(&self, role: RoleRef<'_>, resource: ResourceRef<'_>) -> AclResult<bool>;
}
