//! Registry-wide record form, for handing the whole ACL to an external store.

use serde::{Deserialize, Serialize};

use acl_core::{AclResult, Resource, ResourceRecord, Role, RoleRecord};

use crate::registry::Registry;

/// Every role and resource of a registry, as plain records.
///
/// Roles are ordered by name and resources by scope then name, so two
/// snapshots of equal registries serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Role records.
    #[serde(default)]
    pub roles: Vec<RoleRecord>,
    /// Resource records.
    #[serde(default)]
    pub resources: Vec<ResourceRecord>,
}

impl RegistrySnapshot {
    /// Serialize the snapshot to JSON.
    pub fn to_json(&self) -> AclResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize the snapshot to indented JSON.
    pub fn to_json_pretty(&self) -> AclResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot from JSON.
    pub fn from_json(json: &str) -> AclResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Registry {
    /// Capture every role and resource as records.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut roles: Vec<&Role> = self.roles().values().collect();
        roles.sort_unstable_by(|a, b| a.name().cmp(b.name()));

        let mut resources: Vec<&Resource> = self
            .resources()
            .values()
            .flat_map(|scoped| scoped.values())
            .collect();
        resources.sort_unstable();

        RegistrySnapshot {
            roles: roles.into_iter().map(Role::to_record).collect(),
            resources: resources.into_iter().map(Resource::to_record).collect(),
        }
    }

    /// Rebuild a registry with default configuration from a snapshot.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::load_snapshot`].
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> AclResult<Self> {
        let mut registry = Registry::new();
        registry.load_snapshot(snapshot)?;
        Ok(registry)
    }

    /// Register every record of a snapshot into this registry.
    ///
    /// Records are registered in order and existing entries win, so a
    /// duplicate name keeps the first record. Use this on a registry built
    /// with [`Registry::with_config`] to restore under custom limits.
    ///
    /// # Errors
    ///
    /// [`AclError::MissingName`](acl_core::AclError::MissingName) if a role
    /// record has no name. Roles before it stay registered.
    pub fn load_snapshot(&mut self, snapshot: RegistrySnapshot) -> AclResult<&mut Self> {
        for record in snapshot.roles {
            self.add_role(Role::from_record(record, None)?);
        }
        self.add_resources(snapshot.resources.into_iter().map(Resource::from));
        Ok(self)
    }
}
