//! Permission aggregation over a resolved role set.
//!
//! Name-based checks consult both the legacy inline list and the structured
//! permissions of each role. Id-based operations only ever consult the
//! structured permissions; the legacy list carries names only. Callers must
//! pass a subject snapshot that reflects the latest role assignments.

use std::collections::{BTreeSet, HashSet};

use rolegraph_common::Subject;
use uuid::Uuid;

use super::graph::{RoleGraph, RoleSet};
use super::resolver::resolve_effective_roles;

/// Check whether any effective role grants `name`, from either source.
pub fn has_permission(graph: &RoleGraph, subject: &Subject, name: &str) -> bool {
    roles_grant_name(&resolve_effective_roles(graph, subject), name)
}

/// Check whether any effective role's structured permissions carry `id`.
///
/// The legacy inline list is never consulted here.
pub fn has_permission_by_id(graph: &RoleGraph, subject: &Subject, id: Uuid) -> bool {
    resolve_effective_roles(graph, subject)
        .iter()
        .any(|role| role.perms_grant_id(id))
}

/// Ids of every structured permission reachable from the subject.
pub fn collect_permission_ids(graph: &RoleGraph, subject: &Subject) -> HashSet<Uuid> {
    resolve_effective_roles(graph, subject)
        .iter()
        .flat_map(|role| role.perms.iter().map(|p| p.id))
        .collect()
}

/// Names of every permission reachable from the subject, from both sources.
pub fn collect_permission_names(graph: &RoleGraph, subject: &Subject) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for role in &resolve_effective_roles(graph, subject) {
        if let Some(legacy) = &role.permissions {
            names.extend(legacy.iter().cloned());
        }
        names.extend(role.perms.iter().map(|p| p.name.clone()));
    }
    names
}

pub(crate) fn roles_grant_name(roles: &RoleSet<'_>, name: &str) -> bool {
    roles
        .iter()
        .any(|role| role.legacy_grants(name) || role.perms_grant_name(name))
}
