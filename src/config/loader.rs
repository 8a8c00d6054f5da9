//! Load resource config from a JSON file or string and resolve it.

use crate::auth::AccessRule;
use crate::config::resolved::{ResolvedModel, ResolvedResource, CREATED_AT_FIELD};
use crate::config::{validate, FullConfig, PolicyKind, ResourceConfig};
use crate::error::ConfigError;
use crate::policy::{DefaultPolicy, OwnerScopedPolicy, ResourcePolicy};
use crate::projection::Projection;
use crate::store::SortKey;
use std::path::Path;
use std::sync::Arc;

/// Build resolved model from full config (validates first).
pub fn resolve(config: &FullConfig) -> Result<ResolvedModel, ConfigError> {
    validate(config)?;
    let resources = config
        .resources
        .iter()
        .map(resolve_resource)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ResolvedModel::new(resources))
}

fn resolve_resource(r: &ResourceConfig) -> Result<ResolvedResource, ConfigError> {
    let policy: Arc<dyn ResourcePolicy> = match r.policy {
        PolicyKind::Default => Arc::new(DefaultPolicy),
        PolicyKind::OwnerScoped => {
            let field = r.owner_field.clone().ok_or_else(|| {
                ConfigError::Validation(format!("{}: owner_scoped policy requires owner_field", r.name))
            })?;
            Arc::new(OwnerScopedPolicy::new(field))
        }
    };
    let projection = Projection::from_config(&r.projection)
        .map_err(|e| ConfigError::Validation(format!("{}: {}", r.name, e)))?;
    let sort_order = r
        .sort_order
        .clone()
        .unwrap_or_else(|| vec![SortKey::desc(CREATED_AT_FIELD)]);

    Ok(ResolvedResource {
        name: r.name.clone(),
        path_segment: r.path_segment().to_string(),
        collection: r.collection().to_string(),
        access: AccessRule {
            requires_auth: r.requires_auth,
            allowed_roles: r.allowed_roles.iter().cloned().collect(),
            protect_reads: r.protect_reads,
            expose_internal_call: r.expose_internal_call,
        },
        projection,
        sort_order,
        timestamps: r.timestamps,
        max_list_limit: r.max_list_limit,
        fields: r.fields.clone(),
        policy,
    })
}

/// Accepts either `{ "resources": [...] }` or a bare array of resources.
pub fn load_from_str(s: &str) -> Result<FullConfig, ConfigError> {
    let value: serde_json::Value = serde_json::from_str(s).map_err(|e| ConfigError::Load(e.to_string()))?;
    let config = if value.is_array() {
        FullConfig {
            resources: serde_json::from_value(value).map_err(|e| ConfigError::Load(e.to_string()))?,
        }
    } else {
        serde_json::from_value(value).map_err(|e| ConfigError::Load(e.to_string()))?
    };
    Ok(config)
}

pub async fn load_from_path(path: impl AsRef<Path>) -> Result<FullConfig, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let config = load_from_str(&raw)?;
    tracing::info!(path = %path.display(), resources = config.resources.len(), "resource config loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SortDirection;

    const SAMPLE: &str = r#"{
        "resources": [
            { "name": "users", "projection": { "passwordHash": "exclude" }, "allowed_roles": ["admin"] },
            { "name": "events", "path_segment": "events", "collection": "dance_events",
              "policy": "owner_scoped", "owner_field": "organizerId",
              "sort_order": [{ "field": "startDate", "direction": "asc" }] }
        ]
    }"#;

    #[test]
    fn resolves_defaults_and_overrides() {
        let model = resolve(&load_from_str(SAMPLE).unwrap()).unwrap();

        let users = model.resource_by_path("users").unwrap();
        assert_eq!(users.collection, "users");
        assert_eq!(users.sort_order, vec![SortKey::desc("createdAt")]);
        assert!(users.access.allowed_roles.contains("admin"));
        assert_eq!(users.policy.name(), "default");

        let events = model.resource_by_path("events").unwrap();
        assert_eq!(events.collection, "dance_events");
        assert_eq!(events.sort_order[0].direction, SortDirection::Asc);
        assert_eq!(events.policy.name(), "owner_scoped");
        assert_eq!(model.collections(), vec!["dance_events", "users"]);
    }

    #[test]
    fn accepts_bare_array() {
        let c = load_from_str(r#"[{ "name": "posts" }]"#).unwrap();
        assert_eq!(c.resources.len(), 1);
    }

    #[test]
    fn with_policy_requires_known_resource() {
        let model = resolve(&load_from_str(SAMPLE).unwrap()).unwrap();
        assert!(model.clone().with_policy("venues", Arc::new(DefaultPolicy)).is_err());
        let model = model.with_policy("users", Arc::new(OwnerScopedPolicy::new("id"))).unwrap();
        assert_eq!(model.resource_by_name("users").unwrap().policy.name(), "owner_scoped");
    }

    #[test]
    fn malformed_json_is_load_error() {
        assert!(matches!(load_from_str("{"), Err(ConfigError::Load(_))));
    }
}
