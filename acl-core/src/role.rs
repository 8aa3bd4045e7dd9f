//! # Roles
//!
//! A role is a named subject with an ordered list of parent role names and
//! a table of direct allow/deny rules keyed by `(scope, resource name)`.
//!
//! Parents are held by name only. A role never owns or points at its
//! parent roles, so the ownership graph stays acyclic even when the
//! logical parent relation loops; the registry resolves names on demand.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{AclError, AclResult};
use crate::resolver::AccessResolver;
use crate::resource::{value_kind, Resource, ResourceRef};

/// Direct rules of a role: scope → resource name → allowed.
pub type AccessTable = BTreeMap<String, BTreeMap<String, bool>>;

/// A named subject in the access-control graph.
///
/// # Example
///
/// ```
/// use acl_core::{Resource, Role};
///
/// let guest = Role::new("guest");
/// let mut admin = Role::with_parents("admin", [&guest]);
/// assert_eq!(admin.parents(), ["guest"]);
///
/// let dashboard = Resource::new("dashboard");
/// admin.deny(&dashboard);
/// assert_eq!(admin.rule_for(&dashboard), Some(false));
///
/// // A role can't inherit from itself
/// assert!(admin.add_parent("admin").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    name: String,
    parents: Vec<String>,
    access: AccessTable,
}

impl Role {
    /// Create a role without parents or rules.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            access: AccessTable::new(),
        }
    }

    /// Create a role with initial parents.
    ///
    /// Parents may be names or roles; either way only the name is kept.
    /// Entries naming the role itself and repeated entries are skipped,
    /// matching what [`Role::add_parent`] allows.
    ///
    /// # Arguments
    ///
    /// * `name` - The role's name
    /// * `parents` - Parent names or roles, in resolution order
    pub fn with_parents<I, P>(name: impl Into<String>, parents: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut role = Self::new(name);
        for parent in parents {
            // Only self-parenting can fail here, and it is skipped.
            let _ = role.add_parent(parent);
        }
        role
    }

    /// Get the role's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the parent role names, in declaration order.
    ///
    /// Resolve them to roles through the registry when needed.
    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    /// Check if `parent` is linked as a parent of this role.
    pub fn has_parent(&self, parent: impl AsRef<str>) -> bool {
        let parent = parent.as_ref();
        self.parents.iter().any(|p| p == parent)
    }

    /// Add a parent by name or role.
    ///
    /// Adding a parent that is already linked is a no-op. The parent does
    /// not need to exist anywhere yet.
    ///
    /// # Errors
    ///
    /// [`AclError::SelfParent`] if `parent` names this role; the parent
    /// list is left unchanged.
    pub fn add_parent(&mut self, parent: impl AsRef<str>) -> AclResult<&mut Self> {
        let parent = parent.as_ref();
        if parent == self.name {
            return Err(AclError::SelfParent(self.name.clone()));
        }
        if !self.has_parent(parent) {
            self.parents.push(parent.to_string());
        }
        Ok(self)
    }

    /// Remove a parent link by name or role.
    ///
    /// Only the link is removed; the parent role itself is untouched.
    /// Removing a parent that isn't linked is a no-op.
    pub fn remove_parent(&mut self, parent: impl AsRef<str>) -> &mut Self {
        let parent = parent.as_ref();
        if let Some(index) = self.parents.iter().position(|p| p == parent) {
            self.parents.remove(index);
        }
        self
    }

    /// Allow this role on `resource`, replacing any previous rule.
    pub fn allow(&mut self, resource: &Resource) -> &mut Self {
        self.set_rule(resource, true)
    }

    /// Deny this role on `resource`, replacing any previous rule.
    pub fn deny(&mut self, resource: &Resource) -> &mut Self {
        self.set_rule(resource, false)
    }

    /// Get the direct rule for `resource`, if one is set.
    ///
    /// Inherited rules are not considered; use a resolver for that.
    pub fn rule_for(&self, resource: &Resource) -> Option<bool> {
        self.rule(resource.scope(), resource.name())
    }

    /// Get the direct rule for a resource given by scope and name.
    pub fn rule(&self, scope: &str, name: &str) -> Option<bool> {
        self.access.get(scope)?.get(name).copied()
    }

    /// Check whether this role may access `resource`, as decided by `resolver`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let allowed = role.is_allowed(&registry, "dashboard")?;
    /// ```
    pub fn is_allowed<'a, R>(&self, resolver: &R, resource: impl Into<ResourceRef<'a>>) -> AclResult<bool>
    where
        R: AccessResolver + ?Sized,
    {
        resolver.resolve(RoleRef::Role(self), resource.into())
    }

    /// Get every direct rule of this role.
    ///
    /// Intended for resolvers and stores. Application code should ask a
    /// resolver instead, since this ignores inherited rules.
    pub fn access(&self) -> &AccessTable {
        &self.access
    }

    /// Get the role as a plain record for an external store.
    ///
    /// Empty parents and access are omitted from the record.
    pub fn to_record(&self) -> RoleRecord {
        RoleRecord {
            name: Some(self.name.clone()),
            parents: self.parents.clone(),
            access: self.access.clone(),
        }
    }

    /// Build a role from a record.
    ///
    /// # Arguments
    ///
    /// * `record` - The role's stored information
    /// * `name` - Name overriding the one in the record
    ///
    /// # Errors
    ///
    /// [`AclError::MissingName`] if neither `name` nor `record.name` is set.
    pub fn from_record(record: RoleRecord, name: Option<&str>) -> AclResult<Self> {
        let name = match (name, record.name) {
            (Some(name), _) => name.to_string(),
            (None, Some(name)) => name,
            (None, None) => return Err(AclError::MissingName),
        };

        let mut role = Self::with_parents(name, record.parents);
        role.access = record.access;
        Ok(role)
    }

    fn set_rule(&mut self, resource: &Resource, allowed: bool) -> &mut Self {
        self.access
            .entry(resource.scope().to_string())
            .or_default()
            .insert(resource.name().to_string(), allowed);
        self
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

/// Plain structured form of a [`Role`].
///
/// ```json
/// { "name": "admin", "parents": ["guest"], "access": { "global": { "dashboard": true } } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    /// Role name; may be supplied separately to [`Role::from_record`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Parent role names, in resolution order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    /// Direct rules.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub access: AccessTable,
}

impl RoleRecord {
    /// Serialize the record to JSON.
    pub fn to_json(&self) -> AclResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a record from JSON.
    pub fn from_json(json: &str) -> AclResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A role given either by name or by reference, for lookups.
#[derive(Debug, Clone, Copy)]
pub enum RoleRef<'a> {
    /// Resolve through the registry by name.
    Name(&'a str),
    /// Use this role as-is, registered or not.
    Role(&'a Role),
}

impl RoleRef<'_> {
    /// Get the referenced role's name.
    pub fn name(&self) -> &str {
        match *self {
            RoleRef::Name(name) => name,
            RoleRef::Role(role) => role.name(),
        }
    }
}

impl AsRef<str> for RoleRef<'_> {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

impl<'a> From<&'a str> for RoleRef<'a> {
    fn from(name: &'a str) -> Self {
        RoleRef::Name(name)
    }
}

impl<'a> From<&'a String> for RoleRef<'a> {
    fn from(name: &'a String) -> Self {
        RoleRef::Name(name)
    }
}

impl<'a> From<&'a Role> for RoleRef<'a> {
    fn from(role: &'a Role) -> Self {
        RoleRef::Role(role)
    }
}

/// A role to register: a bare name or a full role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleEntry {
    /// Register a new empty role with this name.
    Name(String),
    /// Register this role.
    Role(Role),
}

impl RoleEntry {
    /// Get the name the entry registers under.
    pub fn name(&self) -> &str {
        match self {
            RoleEntry::Name(name) => name.as_str(),
            RoleEntry::Role(role) => role.name(),
        }
    }

    /// Turn the entry into the role it describes.
    pub fn into_role(self) -> Role {
        match self {
            RoleEntry::Name(name) => Role::new(name),
            RoleEntry::Role(role) => role,
        }
    }
}

impl From<&str> for RoleEntry {
    fn from(name: &str) -> Self {
        RoleEntry::Name(name.to_string())
    }
}

impl From<String> for RoleEntry {
    fn from(name: String) -> Self {
        RoleEntry::Name(name)
    }
}

impl From<Role> for RoleEntry {
    fn from(role: Role) -> Self {
        RoleEntry::Role(role)
    }
}

impl TryFrom<Value> for RoleEntry {
    type Error = AclError;

    /// A JSON string is a role name; a JSON object is a role record.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(name) => Ok(RoleEntry::Name(name)),
            Value::Object(map) => {
                let record: RoleRecord = serde_json::from_value(Value::Object(map))
                    .map_err(|e| AclError::InvalidRoleType(format!("malformed record: {e}")))?;
                Ok(RoleEntry::Role(Role::from_record(record, None)?))
            }
            other => Err(AclError::InvalidRoleType(value_kind(&other).to_string())),
        }
    }
}
