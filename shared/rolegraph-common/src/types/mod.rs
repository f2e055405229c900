//! Shared Types

pub mod role;
pub mod subject;

pub use role::*;
pub use subject::*;
