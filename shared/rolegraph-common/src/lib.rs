//! Rolegraph Common Library
//!
//! Shared role, permission and subject types used by the engine and by
//! anything that feeds it role data.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
