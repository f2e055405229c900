//! Role resolution logic.
//!
//! Expands a subject's directly owned roles through descendant edges.

use std::collections::VecDeque;

use rolegraph_common::Subject;
use uuid::Uuid;

use super::graph::{RoleGraph, RoleSet};

/// Every role the subject effectively holds.
///
/// Owned roles plus everything transitively reachable from them. A role
/// already in the result is never expanded again, which keeps cyclic graphs
/// finite.
#[tracing::instrument(skip(graph, subject), fields(subject_id = %subject.id))]
pub fn resolve_effective_roles<'g>(graph: &'g RoleGraph, subject: &Subject) -> RoleSet<'g> {
    let queue: VecDeque<Uuid> = subject.role_ids.iter().copied().collect();
    expand(graph, queue)
}

/// Only the roles reached through a descendant edge.
///
/// The queue starts from the descendants of each owned role rather than the
/// owned roles themselves. An owned role still shows up here when another
/// owned role inherits from it.
#[tracing::instrument(skip(graph, subject), fields(subject_id = %subject.id))]
pub fn resolve_inherited_roles<'g>(graph: &'g RoleGraph, subject: &Subject) -> RoleSet<'g> {
    let queue: VecDeque<Uuid> = subject
        .role_ids
        .iter()
        .flat_map(|id| graph.descendant_ids(*id).iter().copied())
        .collect();
    expand(graph, queue)
}

/// Check whether the subject effectively holds a role by name.
pub fn has_role(graph: &RoleGraph, subject: &Subject, name: &str) -> bool {
    resolve_effective_roles(graph, subject).contains_name(name)
}

fn expand(graph: &RoleGraph, mut queue: VecDeque<Uuid>) -> RoleSet<'_> {
    let mut roles = RoleSet::new();

    while let Some(id) = queue.pop_front() {
        if roles.contains(id) {
            continue;
        }
        let Some(role) = graph.role(id) else {
            tracing::warn!(role_id = %id, "Role missing from role graph, skipping");
            continue;
        };
        roles.insert(role);
        queue.extend(graph.descendant_ids(id).iter().copied());
    }

    tracing::trace!(resolved = roles.len(), "Role expansion complete");
    roles
}
