//! Role and Permission Types

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named, identified capability granted to roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Permission ID.
    pub id: Uuid,
    /// Permission name (unique).
    pub name: String,
    /// Human-readable name.
    pub display_name: Option<String>,
    /// Longer description.
    pub description: Option<String>,
}

impl Permission {
    /// Create a permission with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            display_name: None,
            description: None,
        }
    }
}

/// A named unit of authority.
///
/// A role grants permissions from two sources: the structured `perms`
/// collection and the legacy inline `permissions` name list. Descendant
/// edges live in the role graph, not on the role itself.
///
/// Equality and hashing use `id` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Role ID.
    pub id: Uuid,
    /// Role name (unique).
    pub name: String,
    /// Legacy inline permission names. Has no id concept.
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
    /// Structured permissions.
    #[serde(default)]
    pub perms: Vec<Permission>,
    /// When the role was created.
    pub created_at: DateTime<Utc>,
    /// When the role was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Create an empty role with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            permissions: None,
            perms: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the legacy inline permission list.
    #[must_use]
    pub fn with_legacy_permissions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Add a structured permission.
    #[must_use]
    pub fn with_perm(mut self, perm: Permission) -> Self {
        self.perms.push(perm);
        self
    }

    /// Check the legacy inline list for `name`.
    ///
    /// An absent or empty list never matches.
    pub fn legacy_grants(&self, name: &str) -> bool {
        self.permissions
            .as_deref()
            .is_some_and(|list| !list.is_empty() && list.iter().any(|p| p == name))
    }

    /// Check the structured permissions for a matching name.
    pub fn perms_grant_name(&self, name: &str) -> bool {
        self.perms.iter().any(|p| p.name == name)
    }

    /// Check the structured permissions for a matching id.
    pub fn perms_grant_id(&self, id: Uuid) -> bool {
        self.perms.iter().any(|p| p.id == id)
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Role {}

impl Hash for Role {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
