//! Raw resource config types as they appear in the resources JSON file.

use crate::store::SortKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    Include,
    Exclude,
}

/// Built-in lifecycle policies selectable from config. Code can still attach its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    Default,
    OwnerScoped,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

/// Declared kind of a field. Drives request validation and form widgets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    LongText,
    Number,
    Boolean,
    Date,
    Select {
        options: Vec<String>,
    },
    MultiSelect {
        options: Vec<String>,
    },
    /// Reference to documents of another resource by id.
    Relation {
        resource: String,
        #[serde(default)]
        multiple: bool,
    },
    Object {
        fields: Vec<FieldSpec>,
    },
    /// `{ "lat": f64, "lng": f64 }`
    GeoPoint,
    /// List of http(s) video URLs.
    VideoLinks,
    StringList,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub rules: ValidationRule,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub name: String,
    /// URL segment; defaults to `name`.
    #[serde(default)]
    pub path_segment: Option<String>,
    /// Backing collection; defaults to `name`.
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default = "default_true")]
    pub requires_auth: bool,
    #[serde(default)]
    pub allowed_roles: Vec<String>,
    /// Apply the authorization check to list and get-one too.
    #[serde(default)]
    pub protect_reads: bool,
    #[serde(default)]
    pub projection: BTreeMap<String, ProjectionMode>,
    #[serde(default)]
    pub sort_order: Option<Vec<SortKey>>,
    #[serde(default)]
    pub expose_internal_call: bool,
    #[serde(default = "default_true")]
    pub timestamps: bool,
    #[serde(default)]
    pub max_list_limit: Option<u32>,
    #[serde(default)]
    pub policy: PolicyKind,
    /// Required by the `owner_scoped` policy.
    #[serde(default)]
    pub owner_field: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

fn default_true() -> bool {
    true
}

impl ResourceConfig {
    pub fn path_segment(&self) -> &str {
        self.path_segment.as_deref().unwrap_or(&self.name)
    }

    pub fn collection(&self) -> &str {
        self.collection.as_deref().unwrap_or(&self.name)
    }
}

/// All resources in one struct for in-memory loading.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FullConfig {
    pub resources: Vec<ResourceConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_resource_gets_defaults() {
        let r: ResourceConfig = serde_json::from_value(json!({ "name": "events" })).unwrap();
        assert!(r.requires_auth);
        assert!(r.timestamps);
        assert!(!r.protect_reads);
        assert!(!r.expose_internal_call);
        assert_eq!(r.policy, PolicyKind::Default);
        assert_eq!(r.path_segment(), "events");
        assert_eq!(r.collection(), "events");
    }

    #[test]
    fn field_kinds_are_tagged() {
        let f: FieldSpec = serde_json::from_value(json!({
            "name": "type",
            "kind": { "type": "select", "options": ["festival", "social"] },
            "required": true
        }))
        .unwrap();
        assert_eq!(
            f.kind,
            FieldKind::Select {
                options: vec!["festival".into(), "social".into()]
            }
        );

        let f: FieldSpec = serde_json::from_value(json!({
            "name": "organizerId",
            "kind": { "type": "relation", "resource": "users" }
        }))
        .unwrap();
        assert_eq!(
            f.kind,
            FieldKind::Relation {
                resource: "users".into(),
                multiple: false
            }
        );
    }
}
