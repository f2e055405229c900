//! Composite role and permission checks.
//!
//! `ability` evaluates a batch of required role names and permission names
//! against a subject and combines the results with an all-of or any-of
//! policy.

use std::str::FromStr;

use indexmap::IndexMap;
use rolegraph_common::Subject;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::aggregator::roles_grant_name;
use super::error::PermissionError;
use super::graph::RoleGraph;
use super::resolver::resolve_effective_roles;

/// A list of required role or permission names.
///
/// Built from a sequence of names, or from one comma-delimited string. Empty
/// segments are kept as entries and never match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements(Vec<String>);

impl Requirements {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.into_iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Requirements {
    type Item = &'a str;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, String>, fn(&'a String) -> &'a str>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().map(String::as_str as fn(&'a String) -> &'a str)
    }
}

impl From<&str> for Requirements {
    fn from(csv: &str) -> Self {
        Self(csv.split(',').map(String::from).collect())
    }
}

impl From<String> for Requirements {
    fn from(csv: String) -> Self {
        Self::from(csv.as_str())
    }
}

impl From<Vec<String>> for Requirements {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<Vec<&str>> for Requirements {
    fn from(names: Vec<&str>) -> Self {
        Self(names.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for Requirements {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|n| (*n).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Requirements {
    fn from(names: [&str; N]) -> Self {
        Self(names.iter().map(|n| (*n).to_string()).collect())
    }
}

/// Shape of the value returned by [`ability`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    /// Only the composite decision.
    #[default]
    Boolean,
    /// Only the per-name results.
    Array,
    /// The composite decision and the per-name results.
    Both,
}

impl ReturnType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Both => "both",
        }
    }
}

impl FromStr for ReturnType {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boolean" => Ok(Self::Boolean),
            "array" => Ok(Self::Array),
            "both" => Ok(Self::Both),
            other => Err(PermissionError::invalid("return_type", format!("{other:?}"))),
        }
    }
}

/// Options for [`ability`].
///
/// Deserializing goes through [`AbilityOptions::from_json`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct AbilityOptions {
    /// Require every listed role and permission instead of at least one.
    pub validate_all: bool,
    pub return_type: ReturnType,
}

impl AbilityOptions {
    #[must_use]
    pub const fn validate_all(mut self, validate_all: bool) -> Self {
        self.validate_all = validate_all;
        self
    }

    #[must_use]
    pub const fn return_type(mut self, return_type: ReturnType) -> Self {
        self.return_type = return_type;
        self
    }

    /// Parse a loose option bag such as `{"validate_all": true, "return_type": "both"}`.
    ///
    /// Missing keys and `null` take their defaults. `validate_all` must be a
    /// JSON boolean and `return_type` one of `"boolean"`, `"array"`, `"both"`.
    pub fn from_json(options: &Value) -> Result<Self, PermissionError> {
        let map = match options {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => return Err(PermissionError::invalid("options", other)),
        };

        let mut parsed = Self::default();

        match map.get("validate_all") {
            None | Some(Value::Null) => {}
            Some(Value::Bool(b)) => parsed.validate_all = *b,
            Some(other) => return Err(PermissionError::invalid("validate_all", other)),
        }

        match map.get("return_type") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => parsed.return_type = s.parse()?,
            Some(other) => return Err(PermissionError::invalid("return_type", other)),
        }

        Ok(parsed)
    }
}

impl TryFrom<Value> for AbilityOptions {
    type Error = PermissionError;

    fn try_from(options: Value) -> Result<Self, Self::Error> {
        Self::from_json(&options)
    }
}

/// Per-name results of an ability check.
///
/// A name listed twice keeps its first position and its last result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AbilityChecks {
    pub roles: IndexMap<String, bool>,
    pub permissions: IndexMap<String, bool>,
}

impl AbilityChecks {
    fn results(&self) -> impl Iterator<Item = bool> + '_ {
        self.roles.values().chain(self.permissions.values()).copied()
    }
}

/// Result of an ability check, shaped by [`ReturnType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AbilityDecision {
    Boolean(bool),
    Array(AbilityChecks),
    Both(bool, AbilityChecks),
}

impl AbilityDecision {
    /// The composite decision, when the shape carries one.
    pub const fn granted(&self) -> Option<bool> {
        match self {
            Self::Boolean(granted) | Self::Both(granted, _) => Some(*granted),
            Self::Array(_) => None,
        }
    }

    pub const fn checks(&self) -> Option<&AbilityChecks> {
        match self {
            Self::Array(checks) | Self::Both(_, checks) => Some(checks),
            Self::Boolean(_) => None,
        }
    }
}

/// Check a batch of roles and permissions in one decision.
///
/// With `validate_all`, the composite is true when no check failed, so an
/// empty batch passes. Without it, the composite is true when some check
/// passed, so an empty batch fails.
#[tracing::instrument(skip_all, fields(subject_id = %subject.id))]
pub fn ability(
    graph: &RoleGraph,
    subject: &Subject,
    roles: impl Into<Requirements>,
    permissions: impl Into<Requirements>,
    options: AbilityOptions,
) -> AbilityDecision {
    let roles = roles.into();
    let permissions = permissions.into();

    let effective = resolve_effective_roles(graph, subject);

    let mut checks = AbilityChecks::default();
    for name in roles.iter() {
        checks
            .roles
            .insert(name.to_string(), effective.contains_name(name));
    }
    for name in permissions.iter() {
        checks
            .permissions
            .insert(name.to_string(), roles_grant_name(&effective, name));
    }

    let granted = if options.validate_all {
        checks.results().all(|passed| passed)
    } else {
        checks.results().any(|passed| passed)
    };

    tracing::debug!(
        granted,
        validate_all = options.validate_all,
        return_type = options.return_type.as_str(),
        roles = checks.roles.len(),
        permissions = checks.permissions.len(),
        "Ability evaluated"
    );

    match options.return_type {
        ReturnType::Boolean => AbilityDecision::Boolean(granted),
        ReturnType::Array => AbilityDecision::Array(checks),
        ReturnType::Both => AbilityDecision::Both(granted, checks),
    }
}

/// [`ability`] with options given as a loose JSON option bag.
///
/// Options are validated before any role or permission is looked at.
pub fn ability_from_json(
    graph: &RoleGraph,
    subject: &Subject,
    roles: impl Into<Requirements>,
    permissions: impl Into<Requirements>,
    options: &Value,
) -> Result<AbilityDecision, PermissionError> {
    let options = AbilityOptions::from_json(options)?;
    Ok(ability(graph, subject, roles, permissions, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolegraph_common::{Permission, Role};
    use serde_json::json;
    use uuid::Uuid;

    /// Subject owns "editor"; "editor" inherits "viewer".
    /// "editor" grants "publish" (structured), "viewer" grants "read" (legacy).
    fn setup() -> (RoleGraph, Subject) {
        let editor = Role::new("editor").with_perm(Permission::new("publish"));
        let viewer = Role::new("viewer").with_legacy_permissions(["read"]);
        let admin = Role::new("admin").with_perm(Permission::new("delete"));

        let mut graph = RoleGraph::new();
        graph.add_descendant(editor.id, viewer.id);
        let subject = Subject::with_roles(Uuid::new_v4(), [&editor]);
        graph.insert_role(editor);
        graph.insert_role(viewer);
        graph.insert_role(admin);
        (graph, subject)
    }

    #[test]
    fn test_requirements_split_comma_string() {
        let req = Requirements::from("admin,editor");
        assert_eq!(req.iter().collect::<Vec<_>>(), vec!["admin", "editor"]);

        let req = Requirements::from("admin,,editor,");
        assert_eq!(req.iter().collect::<Vec<_>>(), vec!["admin", "", "editor", ""]);

        let req = Requirements::from(vec!["a,b"]);
        assert_eq!(req.len(), 1);
    }

    #[test]
    fn test_any_of_roles_or_permissions() {
        let (graph, subject) = setup();
        let options = AbilityOptions::default();

        let decision = ability(&graph, &subject, ["admin", "editor"], ["publish"], options);
        assert_eq!(decision, AbilityDecision::Boolean(true));

        let decision = ability(&graph, &subject, ["admin"], ["publish"], options);
        assert_eq!(decision.granted(), Some(true));

        let decision = ability(&graph, &subject, ["admin", "owner"], ["delete"], options);
        assert_eq!(decision.granted(), Some(false));
    }

    #[test]
    fn test_all_of_roles_and_permissions() {
        let options = AbilityOptions::default().validate_all(true);
        let (graph, subject) = setup();

        let decision = ability(
            &graph,
            &subject,
            ["editor", "viewer"],
            ["publish", "read"],
            options,
        );
        assert_eq!(decision.granted(), Some(true));

        let decision = ability(&graph, &subject, ["editor", "admin"], ["publish"], options);
        assert_eq!(decision.granted(), Some(false));

        let decision = ability(&graph, &subject, ["editor"], ["publish", "delete"], options);
        assert_eq!(decision.granted(), Some(false));
    }

    #[test]
    fn test_empty_requirements_are_vacuous() {
        let (graph, subject) = setup();
        let all = AbilityOptions::default().validate_all(true);
        let any = AbilityOptions::default();

        let none = Requirements::default;

        let decision = ability(&graph, &subject, none(), none(), all);
        assert_eq!(decision, AbilityDecision::Boolean(true));

        let decision = ability(&graph, &subject, none(), none(), any);
        assert_eq!(decision, AbilityDecision::Boolean(false));
    }

    #[test]
    fn test_empty_segment_is_a_failing_entry() {
        let (graph, subject) = setup();
        let all = AbilityOptions::default()
            .validate_all(true)
            .return_type(ReturnType::Both);

        let decision = ability(&graph, &subject, "editor,", Requirements::default(), all);
        let AbilityDecision::Both(granted, checks) = decision else {
            panic!("expected both");
        };
        assert!(!granted);
        assert_eq!(checks.roles.get(""), Some(&false));
        assert_eq!(checks.roles.get("editor"), Some(&true));
    }

    #[test]
    fn test_array_return_shape() {
        let (graph, subject) = setup();
        let options = AbilityOptions::default().return_type(ReturnType::Array);

        let decision = ability(&graph, &subject, "admin,editor", "publish", options);
        assert_eq!(decision.granted(), None);

        let checks = decision.checks().expect("array carries checks");
        assert_eq!(checks.roles.get("admin"), Some(&false));
        assert_eq!(checks.roles.get("editor"), Some(&true));
        assert_eq!(checks.permissions.get("publish"), Some(&true));

        let value = serde_json::to_value(&decision).expect("serializes");
        assert_eq!(
            value,
            json!({
                "roles": { "admin": false, "editor": true },
                "permissions": { "publish": true },
            })
        );
    }

    #[test]
    fn test_both_return_shape_serializes_as_pair() {
        let (graph, subject) = setup();
        let options = AbilityOptions::default().return_type(ReturnType::Both);

        let decision = ability(&graph, &subject, ["viewer"], ["read"], options);
        let value = serde_json::to_value(&decision).expect("serializes");
        assert_eq!(
            value,
            json!([true, { "roles": { "viewer": true }, "permissions": { "read": true } }])
        );
    }

    #[test]
    fn test_duplicate_names_keep_single_key() {
        let (graph, subject) = setup();
        let options = AbilityOptions::default().return_type(ReturnType::Array);

        let roles = ["editor", "admin", "editor"];
        let decision = ability(&graph, &subject, roles, Requirements::default(), options);
        let checks = decision.checks().expect("checks");
        assert_eq!(checks.roles.len(), 2);
        assert_eq!(
            checks.roles.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["editor", "admin"]
        );
    }

    #[test]
    fn test_options_from_json_defaults() {
        let defaults = AbilityOptions::default();
        assert_eq!(AbilityOptions::from_json(&json!({})).unwrap(), defaults);
        assert_eq!(AbilityOptions::from_json(&Value::Null).unwrap(), defaults);

        let parsed = AbilityOptions::from_json(&json!({
            "validate_all": true,
            "return_type": "both",
        }))
        .unwrap();
        assert!(parsed.validate_all);
        assert_eq!(parsed.return_type, ReturnType::Both);
    }

    #[test]
    fn test_options_from_json_rejects_bad_values() {
        for bad in [
            json!({ "return_type": "invalid" }),
            json!({ "return_type": 1 }),
            json!({ "validate_all": "yes" }),
            json!({ "validate_all": 1 }),
            json!("boolean"),
        ] {
            let result = AbilityOptions::from_json(&bad);
            assert!(
                matches!(result, Err(PermissionError::InvalidConfiguration { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_options_deserialize_shares_validation() {
        let parsed: AbilityOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(parsed, AbilityOptions::default());

        let bag = json!({ "validate_all": true });
        let parsed: AbilityOptions = serde_json::from_value(bag).unwrap();
        assert!(parsed.validate_all);
        assert_eq!(parsed.return_type, ReturnType::Boolean);

        let err = serde_json::from_value::<AbilityOptions>(json!({ "validate_all": 1 }))
            .expect_err("integer flag");
        assert!(err.to_string().contains("validate_all"), "{err}");

        let err = serde_json::from_value::<AbilityOptions>(json!({ "return_type": "invalid" }))
            .expect_err("unknown return type");
        assert!(err.to_string().contains("return_type"), "{err}");
    }

    #[test]
    fn test_options_serialize_round_trips_through_validator() {
        let options = AbilityOptions::default()
            .validate_all(true)
            .return_type(ReturnType::Array);
        let value = serde_json::to_value(options).unwrap();
        assert_eq!(value, json!({ "validate_all": true, "return_type": "array" }));
        assert_eq!(serde_json::from_value::<AbilityOptions>(value).unwrap(), options);
    }

    #[test]
    fn test_requirements_iterate_by_reference() {
        let req = Requirements::from("admin,editor");
        let mut seen = Vec::new();
        for name in &req {
            seen.push(name);
        }
        assert_eq!(seen, vec!["admin", "editor"]);
        assert_eq!(req.iter().count(), req.len());
    }

    #[test]
    fn test_ability_from_json_fails_before_evaluating() {
        let (graph, subject) = setup();
        let result = ability_from_json(
            &graph,
            &subject,
            "editor",
            "publish",
            &json!({ "return_type": "invalid" }),
        );
        assert!(matches!(
            result,
            Err(PermissionError::InvalidConfiguration { option: "return_type", .. })
        ));
    }

    #[test]
    fn test_return_type_from_str() {
        assert_eq!("boolean".parse::<ReturnType>().unwrap(), ReturnType::Boolean);
        assert_eq!("array".parse::<ReturnType>().unwrap(), ReturnType::Array);
        assert_eq!("both".parse::<ReturnType>().unwrap(), ReturnType::Both);
        assert!("Boolean".parse::<ReturnType>().is_err());
    }
}
