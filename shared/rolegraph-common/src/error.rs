//! Common Error Types

use thiserror::Error;

/// Errors raised while handling shared role data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A role reference could not be normalized to a role id.
    #[error("Malformed role reference: {0}")]
    MalformedRoleRef(String),
}

pub type Result<T> = std::result::Result<T, Error>;
