//! Rolegraph Engine
//!
//! Resolves the roles a subject effectively holds through role inheritance,
//! aggregates the permissions those roles grant, and answers composite
//! role/permission `ability` checks.

pub mod config;
pub mod db;
pub mod observability;
pub mod permissions;

pub use rolegraph_common::{Permission, Role, RoleRef, Subject};
