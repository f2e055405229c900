//! Database models for the role graph.

use chrono::{DateTime, Utc};
use rolegraph_common::{Permission, Role};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Row of the `roles` table.
#[derive(Debug, Clone, FromRow)]
pub struct RoleRow {
    pub id: Uuid,
    pub name: String,
    pub permissions: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoleRow {
    pub fn into_role(self, perms: Vec<Permission>) -> Role {
        Role {
            id: self.id,
            name: self.name,
            permissions: self.permissions,
            perms,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Row of the `permissions` table.
#[derive(Debug, Clone, FromRow)]
pub struct PermissionRow {
    pub id: Uuid,
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

impl From<PermissionRow> for Permission {
    fn from(row: PermissionRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            display_name: row.display_name,
            description: row.description,
        }
    }
}

/// A structured permission joined with the role that holds it.
#[derive(Debug, Clone, FromRow)]
pub struct RolePermissionRow {
    pub role_id: Uuid,
    #[sqlx(flatten)]
    pub permission: PermissionRow,
}

/// Inheritance edge: `role_id` inherits from `descendant_id`.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct RoleDescendant {
    pub role_id: Uuid,
    pub descendant_id: Uuid,
}

/// Subject role assignment.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RoleAssignment {
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}
