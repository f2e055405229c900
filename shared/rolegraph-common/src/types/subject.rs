//! Subject and Role Reference Types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::role::Role;
use crate::error::{Error, Result};

/// An entity that directly owns roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Subject ID.
    pub id: Uuid,
    /// Directly owned role ids, in assignment order. May contain duplicates.
    pub role_ids: Vec<Uuid>,
}

impl Subject {
    #[must_use]
    pub const fn new(id: Uuid, role_ids: Vec<Uuid>) -> Self {
        Self { id, role_ids }
    }

    /// Subject owning the given roles.
    #[must_use]
    pub fn with_roles<'a>(id: Uuid, roles: impl IntoIterator<Item = &'a Role>) -> Self {
        Self {
            id,
            role_ids: roles.into_iter().map(|r| r.id).collect(),
        }
    }
}

/// Any of the accepted ways to point at a role when assigning it.
#[derive(Debug, Clone)]
pub enum RoleRef {
    /// A raw role id.
    ById(Uuid),
    /// A full role value.
    ByValue(Role),
    /// A loose mapping carrying an `id` key.
    ByMap(Map<String, Value>),
}

impl RoleRef {
    /// Normalize to the canonical role id.
    pub fn role_id(&self) -> Result<Uuid> {
        match self {
            Self::ById(id) => Ok(*id),
            Self::ByValue(role) => Ok(role.id),
            Self::ByMap(map) => {
                let raw = map
                    .get("id")
                    .ok_or_else(|| Error::MalformedRoleRef("mapping has no `id` key".into()))?;
                id_from_value(raw)
            }
        }
    }
}

fn id_from_value(value: &Value) -> Result<Uuid> {
    let Some(raw) = value.as_str() else {
        return Err(Error::MalformedRoleRef(format!(
            "`id` must be a UUID string, got {value}"
        )));
    };
    Uuid::parse_str(raw).map_err(|e| Error::MalformedRoleRef(format!("`{raw}`: {e}")))
}

impl From<Uuid> for RoleRef {
    fn from(id: Uuid) -> Self {
        Self::ById(id)
    }
}

impl From<Role> for RoleRef {
    fn from(role: Role) -> Self {
        Self::ByValue(role)
    }
}

impl From<&Role> for RoleRef {
    fn from(role: &Role) -> Self {
        Self::ById(role.id)
    }
}

impl From<Map<String, Value>> for RoleRef {
    fn from(map: Map<String, Value>) -> Self {
        Self::ByMap(map)
    }
}

impl TryFrom<Value> for RoleRef {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::ByMap(map)),
            Value::String(_) => id_from_value(&value).map(Self::ById),
            other => Err(Error::MalformedRoleRef(format!(
                "expected a role id or an object with `id`, got {other}"
            ))),
        }
    }
}
