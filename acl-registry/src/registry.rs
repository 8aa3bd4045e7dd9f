//! Role and resource registry with permission resolution.
//!
//! The registry owns every role and resource it holds and is the single
//! place where the resolution algorithm runs:
//!
//! 1. Look up the role and the resource (references are used as-is).
//! 2. Unknown role or resource: deny.
//! 3. A direct rule on the role for `(scope, name)` is final, allow or deny.
//! 4. Otherwise the first parent, in declaration order, that resolves to
//!    allow grants access.
//! 5. Nothing found: deny.
//!
//! Parent links are plain names, so a chain like `a -> b -> a` can be built.
//! Resolution keeps the current ancestor path and reports such loops as
//! [`AclError::CyclicRoleGraph`] instead of recursing forever.
//! A parent reached again through another path after it already came up
//! empty is skipped, so shared ancestors are resolved once per query.

use serde_json::Value;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace, warn};

use acl_core::{
    AccessResolver, AclError, AclResult, Resource, ResourceEntry, ResourceRef, Role, RoleEntry,
    RoleRef, DEFAULT_SCOPE,
};

use crate::config::{ConfigError, RegistryConfig};

/// Resources by scope, then by name.
pub type ResourceMap = HashMap<String, HashMap<String, Resource>>;

/// Owner of all roles and resources, and resolver of access decisions.
///
/// Registration is idempotent: the first role registered under a name and
/// the first resource registered under a `(scope, name)` win, later
/// registrations return the stored entry untouched.
///
/// The registry holds no locks. Wrap it in a `RwLock` when sharing it
/// between threads.
///
/// # Example
///
/// ```
/// use acl_core::Resource;
/// use acl_registry::Registry;
///
/// let mut registry = Registry::new();
/// registry.add_role("guest");
/// registry.add_role("admin").add_parent("guest").unwrap();
///
/// let dashboard = registry.add_resource("dashboard").clone();
/// registry.allow("guest", &dashboard).unwrap();
///
/// assert!(registry.is_allowed("admin", &dashboard).unwrap());
/// assert!(!registry.is_allowed("nobody", &dashboard).unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    config: RegistryConfig,
    roles: HashMap<String, Role>,
    resources: ResourceMap,
}

impl Registry {
    /// Create an empty registry with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with the given configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] if the configuration doesn't validate.
    pub fn with_config(config: RegistryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Get the registry's configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a role given by name or as a full role.
    ///
    /// If a role with the same name is already registered, it is kept as
    /// is (rules included) and the new entry is dropped.
    ///
    /// # Returns
    ///
    /// The stored role
    pub fn add_role(&mut self, role: impl Into<RoleEntry>) -> &mut Role {
        let entry = role.into();
        match self.roles.entry(entry.name().to_string()) {
            Entry::Occupied(existing) => {
                trace!(role = %existing.key(), "Role already registered");
                existing.into_mut()
            }
            Entry::Vacant(slot) => {
                debug!(role = %slot.key(), "Role registered");
                slot.insert(entry.into_role())
            }
        }
    }

    /// Register a role from untyped JSON: a name string or a role record.
    ///
    /// # Errors
    ///
    /// [`AclError::InvalidRoleType`] for any other JSON value, and
    /// [`AclError::MissingName`] for a record without a name.
    pub fn add_role_value(&mut self, value: Value) -> AclResult<&mut Role> {
        let entry = RoleEntry::try_from(value)?;
        Ok(self.add_role(entry))
    }

    /// Register several roles, in order.
    pub fn add_roles<I>(&mut self, roles: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<RoleEntry>,
    {
        for role in roles {
            self.add_role(role);
        }
        self
    }

    /// Remove a role and unlink it from every remaining role's parents.
    ///
    /// # Returns
    ///
    /// The removed role, or `None` if no role had that name
    pub fn remove_role(&mut self, name: &str) -> Option<Role> {
        let removed = self.roles.remove(name)?;
        for role in self.roles.values_mut() {
            role.remove_parent(name);
        }
        debug!(role = name, "Role removed");
        Some(removed)
    }

    /// Get a role by name.
    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    /// Get a role by name for modification.
    pub fn role_mut(&mut self, name: &str) -> Option<&mut Role> {
        self.roles.get_mut(name)
    }

    /// Get all roles, keyed by name.
    pub fn roles(&self) -> &HashMap<String, Role> {
        &self.roles
    }

    /// Register a resource given by name (global scope) or as a full resource.
    ///
    /// If a resource with the same scope and name is already registered,
    /// it is kept and the new one is dropped.
    ///
    /// # Returns
    ///
    /// The stored resource
    pub fn add_resource(&mut self, resource: impl Into<ResourceEntry>) -> &Resource {
        let resource = resource.into().into_resource();
        let scoped = self.resources.entry(resource.scope().to_string()).or_default();
        match scoped.entry(resource.name().to_string()) {
            Entry::Occupied(existing) => existing.into_mut(),
            Entry::Vacant(slot) => {
                debug!(
                    resource = resource.name(),
                    scope = resource.scope(),
                    "Resource registered"
                );
                slot.insert(resource)
            }
        }
    }

    /// Register a resource from untyped JSON: a name string or a resource record.
    ///
    /// # Errors
    ///
    /// [`AclError::InvalidResourceType`] for any other JSON value.
    pub fn add_resource_value(&mut self, value: Value) -> AclResult<&Resource> {
        let entry = ResourceEntry::try_from(value)?;
        Ok(self.add_resource(entry))
    }

    /// Register several resources, in order.
    pub fn add_resources<I>(&mut self, resources: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<ResourceEntry>,
    {
        for resource in resources {
            self.add_resource(resource);
        }
        self
    }

    /// Get a resource by name within `scope`.
    pub fn resource(&self, name: &str, scope: &str) -> Option<&Resource> {
        self.resources.get(scope)?.get(name)
    }

    /// Get a resource by name within the global scope.
    pub fn global_resource(&self, name: &str) -> Option<&Resource> {
        self.resource(name, DEFAULT_SCOPE)
    }

    /// Get all resources, keyed by scope then name.
    pub fn resources(&self) -> &ResourceMap {
        &self.resources
    }

    /// Allow a registered role on `resource`.
    ///
    /// # Errors
    ///
    /// [`AclError::UnknownRole`] if no role is registered under that name.
    pub fn allow(&mut self, role: impl AsRef<str>, resource: &Resource) -> AclResult<&mut Self> {
        self.set_rule(role.as_ref(), resource, true)
    }

    /// Deny a registered role on `resource`.
    ///
    /// # Errors
    ///
    /// [`AclError::UnknownRole`] if no role is registered under that name.
    pub fn deny(&mut self, role: impl AsRef<str>, resource: &Resource) -> AclResult<&mut Self> {
        self.set_rule(role.as_ref(), resource, false)
    }

    /// Decide whether `role` may access `resource`.
    ///
    /// Names are looked up in the registry; references are used as given,
    /// registered or not. A bare resource name is looked up in the global
    /// scope, see [`Registry::is_allowed_in`] for other scopes.
    ///
    /// # Returns
    ///
    /// `Ok(false)` for an unknown role or resource.
    ///
    /// # Errors
    ///
    /// [`AclError::CyclicRoleGraph`] if the walk re-enters a role on the
    /// current ancestor path before any parent granted access, and
    /// [`AclError::MaxDepthExceeded`] if it goes deeper than configured.
    pub fn is_allowed<'r, 's>(
        &self,
        role: impl Into<RoleRef<'r>>,
        resource: impl Into<ResourceRef<'s>>,
    ) -> AclResult<bool> {
        let role_ref = role.into();
        let resource_ref = resource.into();
        let role = match role_ref {
            RoleRef::Name(name) => self.role(name),
            RoleRef::Role(role) => Some(role),
        };
        let resource = match resource_ref {
            ResourceRef::Named { name, scope } => self.resource(name, scope),
            ResourceRef::Resource(resource) => Some(resource),
        };

        let (Some(role), Some(resource)) = (role, resource) else {
            let (name, scope) = match resource_ref {
                ResourceRef::Named { name, scope } => (name, scope),
                ResourceRef::Resource(resource) => (resource.name(), resource.scope()),
            };
            trace!(
                role = role_ref.as_ref(),
                resource = name,
                scope,
                allowed = false,
                "Unknown role or resource, access denied"
            );
            return Ok(false);
        };

        let mut path = Vec::new();
        let mut denied = HashSet::new();
        let result = self.walk(role, resource, &mut path, &mut denied);
        match &result {
            Ok(allowed) => trace!(
                role = role.name(),
                resource = resource.name(),
                scope = resource.scope(),
                allowed,
                "Access resolved"
            ),
            Err(e) => warn!(
                role = role.name(),
                resource = resource.name(),
                scope = resource.scope(),
                error = %e,
                "Access resolution failed"
            ),
        }
        result
    }

    /// Decide whether `role` may access the resource `name` in `scope`.
    pub fn is_allowed_in<'r>(
        &self,
        role: impl Into<RoleRef<'r>>,
        name: &str,
        scope: &str,
    ) -> AclResult<bool> {
        self.is_allowed(role, ResourceRef::scoped(name, scope))
    }

    /// Find a parent cycle among the registered roles.
    ///
    /// Roles are visited in name order so the reported cycle is stable.
    /// Parents that aren't registered end a branch.
    ///
    /// # Returns
    ///
    /// The role names along the first cycle found, starting and ending with
    /// the same role, or `None` if the graph is acyclic
    pub fn detect_cycle(&self) -> Option<Vec<String>> {
        let mut names: Vec<&str> = self.roles.keys().map(String::as_str).collect();
        names.sort_unstable();

        let mut done = HashSet::new();
        let mut path = Vec::new();
        names
            .into_iter()
            .find_map(|name| self.find_cycle_from(name, &mut path, &mut done))
    }

    /// Check that the registered roles form no parent cycle.
    ///
    /// Useful after loading roles in bulk, before serving checks.
    pub fn validate(&self) -> AclResult<()> {
        match self.detect_cycle() {
            Some(path) => {
                warn!(cycle = %path.join(" -> "), "Role graph has a cycle");
                Err(AclError::CyclicRoleGraph { path })
            }
            None => Ok(()),
        }
    }

    fn set_rule(&mut self, role: &str, resource: &Resource, allowed: bool) -> AclResult<&mut Self> {
        let stored = self
            .roles
            .get_mut(role)
            .ok_or_else(|| AclError::UnknownRole(role.to_string()))?;
        if allowed {
            stored.allow(resource);
        } else {
            stored.deny(resource);
        }
        debug!(
            role,
            resource = resource.name(),
            scope = resource.scope(),
            allowed,
            "Rule set"
        );
        Ok(self)
    }

    /// Resolve `role` on `resource`; `path` holds the roles above it.
    ///
    /// `denied` collects parents whose whole subtree already resolved to
    /// no grant during this query, so shared ancestors are walked once.
    fn walk<'p>(
        &'p self,
        role: &'p Role,
        resource: &Resource,
        path: &mut Vec<&'p str>,
        denied: &mut HashSet<&'p str>,
    ) -> AclResult<bool> {
        if let Some(allowed) = role.rule_for(resource) {
            trace!(
                via = role.name(),
                resource = resource.name(),
                scope = resource.scope(),
                allowed,
                "Direct rule applied"
            );
            return Ok(allowed);
        }
        if role.parents().is_empty() {
            return Ok(false);
        }
        if path.len() >= self.config.max_depth {
            return Err(AclError::MaxDepthExceeded(self.config.max_depth));
        }

        path.push(role.name());
        for parent in role.parents() {
            // Missing parents contribute nothing.
            let Some(parent_role) = self.role(parent) else {
                continue;
            };
            if self.config.detect_cycles {
                if let Some(start) = path.iter().position(|name| *name == parent.as_str()) {
                    return Err(cycle_error(&path[start..], parent));
                }
            }
            if denied.contains(parent.as_str()) {
                continue;
            }
            if self.walk(parent_role, resource, path, denied)? {
                path.pop();
                return Ok(true);
            }
            denied.insert(parent_role.name());
        }
        path.pop();

        Ok(false)
    }

    fn find_cycle_from<'p>(
        &'p self,
        name: &'p str,
        path: &mut Vec<&'p str>,
        done: &mut HashSet<&'p str>,
    ) -> Option<Vec<String>> {
        if let Some(start) = path.iter().position(|n| *n == name) {
            return Some(cycle_path(&path[start..], name));
        }
        if done.contains(name) {
            return None;
        }
        let Some(role) = self.roles.get(name) else {
            return None;
        };

        path.push(name);
        for parent in role.parents() {
            if let Some(cycle) = self.find_cycle_from(parent, path, done) {
                return Some(cycle);
            }
        }
        path.pop();
        done.insert(name);

        None
    }
}

impl AccessResolver for Registry {
    fn resolve(&self, role: RoleRef<'_>, resource: ResourceRef<'_>) -> AclResult<bool> {
        self.is_allowed(role, resource)
    }
}

fn cycle_path(path: &[&str], back_to: &str) -> Vec<String> {
    path.iter()
        .map(|name| name.to_string())
        .chain(std::iter::once(back_to.to_string()))
        .collect()
}

fn cycle_error(path: &[&str], back_to: &str) -> AclError {
    AclError::CyclicRoleGraph {
        path: cycle_path(path, back_to),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn guest_admin() -> (Registry, Resource) {
        let mut registry = Registry::new();
        registry.add_role("guest");
        registry.add_role(Role::with_parents("admin", ["guest"]));
        let dashboard = registry.add_resource("dashboard").clone();
        (registry, dashboard)
    }

    #[test]
    fn test_add_role_is_idempotent() {
        let mut registry = Registry::new();
        let dashboard = Resource::new("dashboard");
        registry.add_role("admin").allow(&dashboard);
        registry.add_role("admin");
        registry.add_role(Role::with_parents("admin", ["guest"]));

        assert_eq!(registry.roles().len(), 1);
        let admin = registry.role("admin").unwrap();
        assert_eq!(admin.rule_for(&dashboard), Some(true));
        assert!(admin.parents().is_empty());
    }

    #[test]
    fn test_add_roles_in_order() {
        let mut registry = Registry::new();
        registry
            .add_roles(["guest", "staff"])
            .add_roles([Role::with_parents("admin", ["staff"])]);
        assert_eq!(registry.roles().len(), 3);
        assert_eq!(registry.role("admin").unwrap().parents(), ["staff"]);
    }

    #[test]
    fn test_add_role_value_rejects_other_types() {
        let mut registry = Registry::new();
        registry.add_role_value(json!("guest")).unwrap();
        registry
            .add_role_value(json!({"name": "admin", "parents": ["guest"]}))
            .unwrap();

        let err = registry.add_role_value(json!(3)).unwrap_err();
        assert_eq!(err, AclError::InvalidRoleType("number".to_string()));
        let err = registry.add_role_value(json!(["guest"])).unwrap_err();
        assert_eq!(err, AclError::InvalidRoleType("array".to_string()));
        assert_eq!(registry.roles().len(), 2);
    }

    #[test]
    fn test_remove_role_prunes_parent_links() {
        let mut registry = Registry::new();
        registry.add_roles(["guest", "staff"]);
        registry.add_role(Role::with_parents("admin", ["guest", "staff"]));

        let removed = registry.remove_role("guest").unwrap();
        assert_eq!(removed.name(), "guest");
        assert!(registry.role("guest").is_none());
        assert_eq!(registry.role("admin").unwrap().parents(), ["staff"]);

        assert!(registry.remove_role("guest").is_none());
    }

    #[test]
    fn test_add_resource_is_idempotent_per_scope() {
        let mut registry = Registry::new();
        registry.add_resources(["reports"]);
        registry.add_resource(Resource::scoped("reports", "billing"));
        registry.add_resource(Resource::new("reports"));

        assert_eq!(registry.resources().len(), 2);
        assert_eq!(registry.resources()["global"].len(), 1);
        assert!(registry.global_resource("reports").is_some());
        assert!(registry.resource("reports", "billing").is_some());
    }

    #[test]
    fn test_add_resource_value_rejects_other_types() {
        let mut registry = Registry::new();
        let stored = registry
            .add_resource_value(json!({"name": "reports", "scope": "billing"}))
            .unwrap();
        assert_eq!(stored.scope(), "billing");

        let err = registry.add_resource_value(json!(null)).unwrap_err();
        assert_eq!(err, AclError::InvalidResourceType("null".to_string()));
    }

    #[test]
    fn test_allow_unknown_role() {
        let (mut registry, dashboard) = guest_admin();
        let err = registry.allow("ghost", &dashboard).unwrap_err();
        assert_eq!(err, AclError::UnknownRole("ghost".to_string()));
    }

    #[test]
    fn test_inherited_allow() {
        let (mut registry, dashboard) = guest_admin();
        registry.allow("guest", &dashboard).unwrap();

        assert!(registry.is_allowed("guest", &dashboard).unwrap());
        assert!(registry.is_allowed("admin", &dashboard).unwrap());
        assert!(registry.is_allowed("admin", "dashboard").unwrap());
    }

    #[test]
    fn test_direct_deny_is_final() {
        let (mut registry, dashboard) = guest_admin();
        registry
            .allow("guest", &dashboard)
            .unwrap()
            .deny("admin", &dashboard)
            .unwrap();

        assert!(!registry.is_allowed("admin", &dashboard).unwrap());
        assert!(registry.is_allowed("guest", &dashboard).unwrap());
    }

    #[test]
    fn test_unregistered_role_instance_uses_registry_parents() {
        let (mut registry, dashboard) = guest_admin();
        registry.allow("guest", &dashboard).unwrap();

        let visitor = Role::with_parents("visitor", ["guest"]);
        assert!(registry.is_allowed(&visitor, &dashboard).unwrap());
        assert!(visitor.is_allowed(&registry, &dashboard).unwrap());
        assert!(dashboard.is_allowed_for(&registry, &visitor).unwrap());
    }

    #[test]
    fn test_missing_parent_contributes_nothing() {
        let mut registry = Registry::new();
        registry.add_role(Role::with_parents("admin", ["ghost", "guest"]));
        registry.add_role("guest");
        let dashboard = registry.add_resource("dashboard").clone();

        assert!(!registry.is_allowed("admin", &dashboard).unwrap());
        registry.allow("guest", &dashboard).unwrap();
        assert!(registry.is_allowed("admin", &dashboard).unwrap());
    }

    #[test]
    fn test_two_role_cycle_reported() {
        let mut registry = Registry::new();
        registry.add_role(Role::with_parents("a", ["b"]));
        registry.add_role(Role::with_parents("b", ["a"]));
        let dashboard = registry.add_resource("dashboard").clone();

        let err = registry.is_allowed("a", &dashboard).unwrap_err();
        assert_eq!(
            err,
            AclError::CyclicRoleGraph {
                path: vec!["a".to_string(), "b".to_string(), "a".to_string()]
            }
        );
    }

    #[test]
    fn test_cycle_behind_direct_rule_is_not_walked() {
        let mut registry = Registry::new();
        registry.add_role(Role::with_parents("a", ["b"]));
        registry.add_role(Role::with_parents("b", ["a"]));
        let dashboard = registry.add_resource("dashboard").clone();
        registry.deny("a", &dashboard).unwrap();

        assert!(!registry.is_allowed("a", &dashboard).unwrap());
        assert!(!registry.is_allowed("b", &dashboard).unwrap());
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let mut registry = Registry::new();
        registry.add_role("base");
        registry.add_role(Role::with_parents("left", ["base"]));
        registry.add_role(Role::with_parents("right", ["base"]));
        registry.add_role(Role::with_parents("top", ["left", "right"]));
        let dashboard = registry.add_resource("dashboard").clone();

        assert!(!registry.is_allowed("top", &dashboard).unwrap());
        assert!(registry.detect_cycle().is_none());
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn test_max_depth() {
        let mut registry = Registry::with_config(RegistryConfig::default().with_max_depth(2)).unwrap();
        registry.add_role("c");
        registry.add_role(Role::with_parents("b", ["c"]));
        registry.add_role(Role::with_parents("a", ["b"]));
        registry.add_role(Role::with_parents("root", ["a"]));
        let dashboard = registry.add_resource("dashboard").clone();
        registry.allow("c", &dashboard).unwrap();

        assert!(registry.is_allowed("a", &dashboard).unwrap());
        let err = registry.is_allowed("root", &dashboard).unwrap_err();
        assert_eq!(err, AclError::MaxDepthExceeded(2));
    }

    #[test]
    fn test_cycle_without_detection_hits_depth_limit() {
        let config = RegistryConfig::default()
            .with_max_depth(8)
            .with_cycle_detection(false);
        let mut registry = Registry::with_config(config).unwrap();
        registry.add_role(Role::with_parents("a", ["b"]));
        registry.add_role(Role::with_parents("b", ["a"]));
        let dashboard = registry.add_resource("dashboard").clone();

        let err = registry.is_allowed("a", &dashboard).unwrap_err();
        assert_eq!(err, AclError::MaxDepthExceeded(8));
    }

    #[test]
    fn test_validate_reports_cycle() {
        let mut registry = Registry::new();
        registry.add_role("guest");
        registry.add_role(Role::with_parents("a", ["guest", "c"]));
        registry.add_role(Role::with_parents("b", ["a"]));
        registry.add_role(Role::with_parents("c", ["b"]));

        assert_eq!(
            registry.detect_cycle(),
            Some(vec![
                "a".to_string(),
                "c".to_string(),
                "b".to_string(),
                "a".to_string()
            ])
        );
        assert!(registry.validate().unwrap_err().is_graph_error());

        registry.role_mut("c").unwrap().remove_parent("b");
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn test_with_config_rejects_zero_depth() {
        let err = Registry::with_config(RegistryConfig::default().with_max_depth(0)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "max_depth"));

        let registry = Registry::with_config(RegistryConfig::default().with_max_depth(1)).unwrap();
        assert_eq!(registry.config().max_depth, 1);
    }

    #[test]
    fn test_layered_diamonds_resolve_quickly() {
        // Every role in layer i has both roles of layer i + 1 as parents:
        // 2^40 ancestor paths, 80 distinct roles.
        const LAYERS: usize = 40;
        let mut registry = Registry::new();
        registry.add_roles([format!("a{LAYERS}"), format!("b{LAYERS}")]);
        for i in (0..LAYERS).rev() {
            let parents = [format!("a{}", i + 1), format!("b{}", i + 1)];
            registry.add_role(Role::with_parents(format!("a{i}"), parents.clone()));
            registry.add_role(Role::with_parents(format!("b{i}"), parents));
        }
        let dashboard = registry.add_resource("dashboard").clone();

        assert!(!registry.is_allowed("a0", &dashboard).unwrap());

        registry.allow(&format!("b{LAYERS}"), &dashboard).unwrap();
        assert!(registry.is_allowed("a0", &dashboard).unwrap());

        registry.deny("b1", &dashboard).unwrap();
        registry.deny("a1", &dashboard).unwrap();
        assert!(!registry.is_allowed("a0", &dashboard).unwrap());
    }
}
