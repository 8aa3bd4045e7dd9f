//! # Resources
//!
//! A resource is a protected object identified by `(scope, name)`.
//! Scopes partition the resource namespace: `reports` in scope `billing`
//! and `reports` in scope `global` are different resources.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{AclError, AclResult};
use crate::resolver::AccessResolver;
use crate::role::{Role, RoleRef};

/// Scope used whenever a resource is named without one.
pub const DEFAULT_SCOPE: &str = "global";

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

/// A named, scoped protected object.
///
/// Resources are immutable once created. Two resources with the same
/// scope and name are interchangeable for permission purposes.
///
/// # Example
///
/// ```
/// use acl_core::{Resource, Role};
///
/// let dashboard = Resource::new("dashboard");
/// assert_eq!(dashboard.scope(), "global");
///
/// let mut guest = Role::new("guest");
/// dashboard.allow_for(&mut guest);
/// assert_eq!(guest.rule_for(&dashboard), Some(true));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resource {
    scope: String,
    name: String,
}

impl Resource {
    /// Create a resource in the default `global` scope.
    pub fn new(name: impl Into<String>) -> Self {
        Self::scoped(name, DEFAULT_SCOPE)
    }

    /// Create a resource in the given scope.
    pub fn scoped(name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
        }
    }

    /// Get the resource's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the resource's scope.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Allow `role` on this resource (sets the role's direct rule).
    pub fn allow_for(&self, role: &mut Role) -> &Self {
        role.allow(self);
        self
    }

    /// Deny `role` on this resource (sets the role's direct rule).
    pub fn deny_for(&self, role: &mut Role) -> &Self {
        role.deny(self);
        self
    }

    /// Check whether `role` may access this resource, as decided by `resolver`.
    pub fn is_allowed_for<R>(&self, resolver: &R, role: &Role) -> AclResult<bool>
    where
        R: AccessResolver + ?Sized,
    {
        resolver.resolve(RoleRef::Role(role), ResourceRef::Resource(self))
    }

    /// Get the resource as a plain record for an external store.
    pub fn to_record(&self) -> ResourceRecord {
        ResourceRecord {
            name: self.name.clone(),
            scope: self.scope.clone(),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<ResourceRecord> for Resource {
    fn from(record: ResourceRecord) -> Self {
        Self::scoped(record.name, record.scope)
    }
}

/// Plain structured form of a [`Resource`].
///
/// `scope` defaults to `global` when a record is read without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Resource name.
    pub name: String,
    /// Scope the resource lives in.
    #[serde(default = "default_scope")]
    pub scope: String,
}

/// A resource given either by name or by reference, for lookups.
///
/// A bare `&str` converts to a name in the `global` scope; use
/// [`ResourceRef::scoped`] for any other scope.
#[derive(Debug, Clone, Copy)]
pub enum ResourceRef<'a> {
    /// Resolve through the registry by `(scope, name)`.
    Named {
        /// Resource name.
        name: &'a str,
        /// Scope to look the name up in.
        scope: &'a str,
    },
    /// Use this resource as-is, registered or not.
    Resource(&'a Resource),
}

impl<'a> ResourceRef<'a> {
    /// Refer to a resource by name within `scope`.
    pub fn scoped(name: &'a str, scope: &'a str) -> Self {
        ResourceRef::Named { name, scope }
    }
}

impl<'a> From<&'a str> for ResourceRef<'a> {
    fn from(name: &'a str) -> Self {
        ResourceRef::Named {
            name,
            scope: DEFAULT_SCOPE,
        }
    }
}

impl<'a> From<&'a String> for ResourceRef<'a> {
    fn from(name: &'a String) -> Self {
        ResourceRef::from(name.as_str())
    }
}

impl<'a> From<&'a Resource> for ResourceRef<'a> {
    fn from(resource: &'a Resource) -> Self {
        ResourceRef::Resource(resource)
    }
}

/// A resource to register: a bare name (global scope) or a full resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEntry {
    /// Register a `global` resource with this name.
    Name(String),
    /// Register this resource.
    Resource(Resource),
}

impl ResourceEntry {
    /// Turn the entry into the resource it describes.
    pub fn into_resource(self) -> Resource {
        match self {
            ResourceEntry::Name(name) => Resource::new(name),
            ResourceEntry::Resource(resource) => resource,
        }
    }
}

impl From<&str> for ResourceEntry {
    fn from(name: &str) -> Self {
        ResourceEntry::Name(name.to_string())
    }
}

impl From<String> for ResourceEntry {
    fn from(name: String) -> Self {
        ResourceEntry::Name(name)
    }
}

impl From<Resource> for ResourceEntry {
    fn from(resource: Resource) -> Self {
        ResourceEntry::Resource(resource)
    }
}

impl From<ResourceRecord> for ResourceEntry {
    fn from(record: ResourceRecord) -> Self {
        ResourceEntry::Resource(record.into())
    }
}

impl TryFrom<Value> for ResourceEntry {
    type Error = AclError;

    /// A JSON string is a resource name; a JSON object is a resource record.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(name) => Ok(ResourceEntry::Name(name)),
            Value::Object(map) => serde_json::from_value::<ResourceRecord>(Value::Object(map))
                .map(ResourceEntry::from)
                .map_err(|e| AclError::InvalidResourceType(format!("malformed record: {e}"))),
            other => Err(AclError::InvalidResourceType(value_kind(&other).to_string())),
        }
    }
}

/// Short name of a JSON value's type, for error messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
