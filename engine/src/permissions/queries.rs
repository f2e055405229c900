//! Database queries for the role graph.
//!
//! Provides async functions for:
//! - Loading a role graph snapshot and a subject's current role assignments
//! - Attaching and detaching roles to subjects
//! - Authoring roles, permissions and inheritance edges

use std::collections::HashMap;

use rolegraph_common::{Permission, Role, RoleRef, Subject};
use sqlx::PgPool;
use uuid::Uuid;

use super::error::PermissionError;
use super::graph::RoleGraph;
use super::models::{PermissionRow, RoleAssignment, RoleDescendant, RolePermissionRow, RoleRow};

// ============================================================================
// Snapshot Queries
// ============================================================================

/// Load every role, its structured permissions and all inheritance edges.
#[tracing::instrument(skip(pool))]
pub async fn load_role_graph(pool: &PgPool) -> sqlx::Result<RoleGraph> {
    let roles: Vec<RoleRow> = sqlx::query_as(
        r"
        SELECT id, name, permissions, created_at, updated_at
        FROM roles
        ",
    )
    .fetch_all(pool)
    .await?;

    let role_perms: Vec<RolePermissionRow> = sqlx::query_as(
        r"
        SELECT pr.role_id, p.id, p.name, p.display_name, p.description
        FROM permission_role pr
        INNER JOIN permissions p ON p.id = pr.permission_id
        ORDER BY p.name ASC
        ",
    )
    .fetch_all(pool)
    .await?;

    let edges: Vec<RoleDescendant> = sqlx::query_as(
        r"
        SELECT role_id, descendant_id
        FROM role_descendants
        ",
    )
    .fetch_all(pool)
    .await?;

    let mut perms_by_role: HashMap<Uuid, Vec<Permission>> = HashMap::new();
    for row in role_perms {
        perms_by_role
            .entry(row.role_id)
            .or_default()
            .push(row.permission.into());
    }

    let mut graph = RoleGraph::new();
    for row in roles {
        let perms = perms_by_role.remove(&row.id).unwrap_or_default();
        graph.insert_role(row.into_role(perms));
    }
    for edge in &edges {
        graph.add_descendant(edge.role_id, edge.descendant_id);
    }

    tracing::debug!(roles = graph.len(), edges = edges.len(), "Loaded role graph");
    Ok(graph)
}

/// List a subject's role assignments, oldest first.
#[tracing::instrument(skip(pool))]
pub async fn list_role_assignments(
    pool: &PgPool,
    user_id: Uuid,
) -> sqlx::Result<Vec<RoleAssignment>> {
    sqlx::query_as::<_, RoleAssignment>(
        r"
        SELECT user_id, role_id, assigned_at
        FROM assigned_roles
        WHERE user_id = $1
        ORDER BY assigned_at ASC, role_id ASC
        ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Load a subject with its current directly owned roles.
///
/// Always reads fresh assignment state; nothing is cached between calls.
#[tracing::instrument(skip(pool))]
pub async fn load_subject(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Subject> {
    let role_ids = list_role_assignments(pool, user_id)
        .await?
        .into_iter()
        .map(|a| a.role_id)
        .collect();
    Ok(Subject::new(user_id, role_ids))
}

// ============================================================================
// Assignment Queries
// ============================================================================

/// Assign a role to a subject. Assigning a held role again is a no-op.
#[tracing::instrument(skip(pool, role))]
pub async fn attach_role(
    pool: &PgPool,
    user_id: Uuid,
    role: impl Into<RoleRef>,
) -> Result<(), PermissionError> {
    let role_id = role.into().role_id()?;

    sqlx::query(
        r"
        INSERT INTO assigned_roles (user_id, role_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, role_id) DO NOTHING
        ",
    )
    .bind(user_id)
    .bind(role_id)
    .execute(pool)
    .await
    .map_err(|e| not_found_on_fk(e, role_id))?;

    tracing::info!(%user_id, %role_id, "Role attached");
    Ok(())
}

/// Remove a role from a subject.
///
/// Returns `true` if the role was assigned, `false` otherwise.
#[tracing::instrument(skip(pool, role))]
pub async fn detach_role(
    pool: &PgPool,
    user_id: Uuid,
    role: impl Into<RoleRef>,
) -> Result<bool, PermissionError> {
    let role_id = role.into().role_id()?;

    let result = sqlx::query("DELETE FROM assigned_roles WHERE user_id = $1 AND role_id = $2")
        .bind(user_id)
        .bind(role_id)
        .execute(pool)
        .await?;

    let removed = result.rows_affected() > 0;
    tracing::info!(%user_id, %role_id, removed, "Role detached");
    Ok(removed)
}

/// Assign several roles in one transaction.
///
/// Every reference is normalized before anything is written, so a malformed
/// reference leaves assignments untouched.
#[tracing::instrument(skip(pool, roles))]
pub async fn attach_roles<I, R>(
    pool: &PgPool,
    user_id: Uuid,
    roles: I,
) -> Result<(), PermissionError>
where
    I: IntoIterator<Item = R>,
    R: Into<RoleRef>,
{
    let role_ids = normalize_all(roles)?;
    let mut tx = pool.begin().await?;

    for role_id in &role_ids {
        sqlx::query(
            r"
            INSERT INTO assigned_roles (user_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, role_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| not_found_on_fk(e, *role_id))?;
    }

    tx.commit().await?;
    tracing::info!(%user_id, count = role_ids.len(), "Roles attached");
    Ok(())
}

/// Remove several roles in one transaction.
///
/// Returns the number of assignments actually removed.
#[tracing::instrument(skip(pool, roles))]
pub async fn detach_roles<I, R>(
    pool: &PgPool,
    user_id: Uuid,
    roles: I,
) -> Result<u64, PermissionError>
where
    I: IntoIterator<Item = R>,
    R: Into<RoleRef>,
{
    let role_ids = normalize_all(roles)?;
    let mut tx = pool.begin().await?;
    let mut removed = 0;

    for role_id in &role_ids {
        removed += sqlx::query("DELETE FROM assigned_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }

    tx.commit().await?;
    tracing::info!(%user_id, removed, "Roles detached");
    Ok(removed)
}

fn normalize_all<I, R>(roles: I) -> Result<Vec<Uuid>, PermissionError>
where
    I: IntoIterator<Item = R>,
    R: Into<RoleRef>,
{
    roles
        .into_iter()
        .map(|r| r.into().role_id().map_err(PermissionError::from))
        .collect()
}

fn not_found_on_fk(err: sqlx::Error, role_id: Uuid) -> PermissionError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_foreign_key_violation() {
            return PermissionError::RoleNotFound(role_id);
        }
    }
    PermissionError::Database(err)
}

// ============================================================================
// Authoring Queries
// ============================================================================

/// Create a role, optionally with a legacy inline permission list.
#[tracing::instrument(skip(pool))]
pub async fn create_role(
    pool: &PgPool,
    name: &str,
    legacy_permissions: Option<&[String]>,
) -> sqlx::Result<Role> {
    let row: RoleRow = sqlx::query_as(
        r"
        INSERT INTO roles (id, name, permissions)
        VALUES ($1, $2, $3)
        RETURNING id, name, permissions, created_at, updated_at
        ",
    )
    .bind(Uuid::now_v7())
    .bind(name)
    .bind(legacy_permissions.map(<[String]>::to_vec))
    .fetch_one(pool)
    .await?;

    Ok(row.into_role(Vec::new()))
}

/// Create a structured permission.
#[tracing::instrument(skip(pool))]
pub async fn create_permission(
    pool: &PgPool,
    name: &str,
    display_name: Option<&str>,
    description: Option<&str>,
) -> sqlx::Result<Permission> {
    let row: PermissionRow = sqlx::query_as(
        r"
        INSERT INTO permissions (id, name, display_name, description)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, display_name, description
        ",
    )
    .bind(Uuid::now_v7())
    .bind(name)
    .bind(display_name)
    .bind(description)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

/// Grant a structured permission to a role. Idempotent.
#[tracing::instrument(skip(pool))]
pub async fn grant_permission_to_role(
    pool: &PgPool,
    role_id: Uuid,
    permission_id: Uuid,
) -> sqlx::Result<()> {
    sqlx::query(
        r"
        INSERT INTO permission_role (role_id, permission_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(role_id)
    .bind(permission_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Make `role_id` inherit from `descendant_id`. Idempotent.
#[tracing::instrument(skip(pool))]
pub async fn add_role_descendant(
    pool: &PgPool,
    role_id: Uuid,
    descendant_id: Uuid,
) -> sqlx::Result<()> {
    sqlx::query(
        r"
        INSERT INTO role_descendants (role_id, descendant_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(role_id)
    .bind(descendant_id)
    .execute(pool)
    .await?;

    Ok(())
}
