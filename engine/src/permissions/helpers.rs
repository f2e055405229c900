//! Permission helper functions for callers holding a database pool.
//!
//! Provides convenience functions to load a fresh snapshot and check it in a
//! single operation.

use std::collections::HashSet;

use rolegraph_common::Subject;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use super::ability::{ability, AbilityDecision, AbilityOptions, Requirements};
use super::aggregator::{collect_permission_ids, has_permission, has_permission_by_id};
use super::error::PermissionError;
use super::graph::{RoleGraph, RoleSet};
use super::queries::{load_role_graph, load_subject};
use super::resolver::{has_role, resolve_effective_roles, resolve_inherited_roles};

/// A role graph and one subject, loaded together.
///
/// All checks run against this snapshot. Load a new one after attaching or
/// detaching roles; an old snapshot keeps answering with the old assignments.
#[derive(Debug, Clone)]
pub struct AuthorizationSnapshot {
    pub graph: RoleGraph,
    pub subject: Subject,
}

impl AuthorizationSnapshot {
    #[must_use]
    pub const fn new(graph: RoleGraph, subject: Subject) -> Self {
        Self { graph, subject }
    }

    pub fn effective_roles(&self) -> RoleSet<'_> {
        resolve_effective_roles(&self.graph, &self.subject)
    }

    pub fn inherited_roles(&self) -> RoleSet<'_> {
        resolve_inherited_roles(&self.graph, &self.subject)
    }

    pub fn has_role(&self, name: &str) -> bool {
        has_role(&self.graph, &self.subject, name)
    }

    pub fn has_permission(&self, name: &str) -> bool {
        has_permission(&self.graph, &self.subject, name)
    }

    pub fn has_permission_by_id(&self, id: Uuid) -> bool {
        has_permission_by_id(&self.graph, &self.subject, id)
    }

    pub fn permission_ids(&self) -> HashSet<Uuid> {
        collect_permission_ids(&self.graph, &self.subject)
    }

    pub fn ability(
        &self,
        roles: impl Into<Requirements>,
        permissions: impl Into<Requirements>,
        options: AbilityOptions,
    ) -> AbilityDecision {
        ability(&self.graph, &self.subject, roles, permissions, options)
    }

    /// Require that the subject holds the named permission.
    pub fn require_permission(&self, name: &str) -> Result<(), PermissionError> {
        if self.has_permission(name) {
            Ok(())
        } else {
            Err(PermissionError::MissingPermission(name.to_string()))
        }
    }
}

/// Load the full role graph and a subject's current assignments.
#[tracing::instrument(skip(pool))]
pub async fn load_snapshot(pool: &PgPool, user_id: Uuid) -> sqlx::Result<AuthorizationSnapshot> {
    let graph = load_role_graph(pool).await?;
    let subject = load_subject(pool, user_id).await?;
    Ok(AuthorizationSnapshot::new(graph, subject))
}

/// Validate ability options, load a fresh snapshot, and evaluate.
///
/// Invalid options fail before anything is read from the database.
///
/// # Example
///
/// ```ignore
/// let decision = check_ability(
///     &pool,
///     user_id,
///     "admin,editor",
///     "publish",
///     &json!({ "validate_all": true }),
/// )
/// .await?;
/// ```
#[tracing::instrument(skip(pool, roles, permissions, options))]
pub async fn check_ability(
    pool: &PgPool,
    user_id: Uuid,
    roles: impl Into<Requirements>,
    permissions: impl Into<Requirements>,
    options: &Value,
) -> Result<AbilityDecision, PermissionError> {
    let options = AbilityOptions::from_json(options)?;
    let snapshot = load_snapshot(pool, user_id).await?;
    Ok(snapshot.ability(roles, permissions, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::ReturnType;
    use rolegraph_common::{Permission, Role};
    use serde_json::json;

    fn snapshot() -> (AuthorizationSnapshot, Permission) {
        let publish = Permission::new("publish");
        let admin = Role::new("admin");
        let editor = Role::new("editor").with_perm(publish.clone());

        let mut graph = RoleGraph::new();
        graph.add_descendant(admin.id, editor.id);
        let subject = Subject::with_roles(Uuid::new_v4(), [&admin]);
        graph.insert_role(admin);
        graph.insert_role(editor);

        (AuthorizationSnapshot::new(graph, subject), publish)
    }

    #[test]
    fn test_snapshot_checks() {
        let (snapshot, publish) = snapshot();

        assert_eq!(snapshot.effective_roles().len(), 2);
        assert_eq!(snapshot.inherited_roles().len(), 1);
        assert!(snapshot.has_role("editor"));
        assert!(snapshot.has_permission("publish"));
        assert!(snapshot.has_permission_by_id(publish.id));
        assert_eq!(snapshot.permission_ids(), HashSet::from([publish.id]));
    }

    #[test]
    fn test_require_permission() {
        let (snapshot, _) = snapshot();
        assert!(snapshot.require_permission("publish").is_ok());

        let result = snapshot.require_permission("delete");
        assert!(matches!(result, Err(PermissionError::MissingPermission(p)) if p == "delete"));
    }

    #[test]
    fn test_snapshot_ability() {
        let (snapshot, _) = snapshot();
        let options = AbilityOptions::default()
            .validate_all(true)
            .return_type(ReturnType::Both);

        let decision = snapshot.ability("admin,editor", "publish", options);
        assert_eq!(decision.granted(), Some(true));
    }

    #[sqlx::test]
    #[ignore] // Requires PostgreSQL
    async fn test_check_ability_rejects_options_first(pool: PgPool) {
        let result = check_ability(
            &pool,
            Uuid::new_v4(),
            "admin",
            "publish",
            &json!({ "validate_all": "true" }),
        )
        .await;
        assert!(matches!(
            result,
            Err(PermissionError::InvalidConfiguration { option: "validate_all", .. })
        ));
    }
}
