//! Permission Error Types

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PermissionError {
    /// An ability option had a value outside its allowed set.
    #[error("Invalid configuration: `{option}` cannot be {value}")]
    InvalidConfiguration { option: &'static str, value: String },

    #[error(transparent)]
    MalformedRoleRef(#[from] rolegraph_common::Error),

    #[error("Role not found: {0}")]
    RoleNotFound(Uuid),

    /// Subject failed a required permission check.
    #[error("Missing permission: {0}")]
    MissingPermission(String),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl PermissionError {
    pub(crate) fn invalid(option: &'static str, value: impl std::fmt::Display) -> Self {
        Self::InvalidConfiguration {
            option,
            value: value.to_string(),
        }
    }
}
