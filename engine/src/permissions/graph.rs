//! Role graph snapshot and the ordered role set produced by traversal.
//!
//! Roles are held in an arena keyed by id; descendant edges refer to roles by
//! id only, so cycles cost nothing to represent.

use std::collections::{HashMap, HashSet};

use rolegraph_common::Role;
use uuid::Uuid;

/// Read-only snapshot of roles and their descendant edges.
#[derive(Debug, Clone, Default)]
pub struct RoleGraph {
    roles: HashMap<Uuid, Role>,
    descendants: HashMap<Uuid, Vec<Uuid>>,
    by_name: HashMap<String, Uuid>,
}

impl RoleGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a role, replacing any role with the same id.
    pub fn insert_role(&mut self, role: Role) {
        if let Some(previous) = self.roles.get(&role.id) {
            if self.by_name.get(&previous.name) == Some(&role.id) {
                self.by_name.remove(&previous.name);
            }
        }
        self.by_name.insert(role.name.clone(), role.id);
        self.roles.insert(role.id, role);
    }

    /// Declare that `role_id` inherits from `descendant_id`.
    ///
    /// Duplicate edges are ignored. Cycles are allowed.
    pub fn add_descendant(&mut self, role_id: Uuid, descendant_id: Uuid) {
        let edges = self.descendants.entry(role_id).or_default();
        if !edges.contains(&descendant_id) {
            edges.push(descendant_id);
        }
    }

    pub fn role(&self, id: Uuid) -> Option<&Role> {
        self.roles.get(&id)
    }

    pub fn role_by_name(&self, name: &str) -> Option<&Role> {
        self.by_name.get(name).and_then(|id| self.roles.get(id))
    }

    /// Direct descendants of a role.
    ///
    /// Edges pointing at roles missing from the snapshot are skipped.
    pub fn descendants(&self, id: Uuid) -> impl Iterator<Item = &Role> + '_ {
        self.descendant_ids(id).iter().filter_map(move |child| {
            let role = self.roles.get(child);
            if role.is_none() {
                tracing::warn!(
                    role_id = %id,
                    descendant_id = %child,
                    "Descendant missing from role graph"
                );
            }
            role
        })
    }

    pub(crate) fn descendant_ids(&self, id: Uuid) -> &[Uuid] {
        self.descendants.get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Ordered, deduplicated collection of roles.
///
/// Order is first discovery during traversal and carries no meaning;
/// membership is by role id.
#[derive(Debug, Clone, Default)]
pub struct RoleSet<'g> {
    roles: Vec<&'g Role>,
    index: HashSet<Uuid>,
}

impl<'g> RoleSet<'g> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role. Returns `false` if it was already present.
    pub fn insert(&mut self, role: &'g Role) -> bool {
        if !self.index.insert(role.id) {
            return false;
        }
        self.roles.push(role);
        true
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.index.contains(&id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'g Role> + '_ {
        self.roles.iter().copied()
    }

    pub fn ids(&self) -> HashSet<Uuid> {
        self.index.clone()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl<'a, 'g> IntoIterator for &'a RoleSet<'g> {
    type Item = &'g Role;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, &'g Role>>;

    fn into_iter(self) -> Self::IntoIter {
        self.roles.iter().copied()
    }
}
