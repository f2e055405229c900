//! Role graph authorization.
//!
//! - Graph: arena snapshot of roles and descendant edges
//! - Resolver: effective and inherited role sets
//! - Aggregator: permission checks over a resolved role set
//! - Ability: batched role/permission decisions
//! - Queries: Postgres-backed loading and role assignment

pub mod ability;
pub mod aggregator;
pub mod error;
pub mod graph;
pub mod helpers;
pub mod models;
pub mod queries;
pub mod resolver;

pub use ability::{
    ability, ability_from_json, AbilityChecks, AbilityDecision, AbilityOptions, Requirements,
    ReturnType,
};
pub use aggregator::{
    collect_permission_ids, collect_permission_names, has_permission, has_permission_by_id,
};
pub use error::PermissionError;
pub use graph::{RoleGraph, RoleSet};
pub use helpers::{check_ability, load_snapshot, AuthorizationSnapshot};
pub use models::*;
pub use queries::*;
pub use resolver::{has_role, resolve_effective_roles, resolve_inherited_roles};
