//! Config validation: identifiers, references and per-resource consistency.

use crate::config::{FieldKind, FieldSpec, FullConfig, PolicyKind, ProjectionMode};
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("static regex"))
}

/// Collection names become table names, so they are restricted to lowercase SQL identifiers.
fn collection_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").expect("static regex"))
}

pub fn validate(config: &FullConfig) -> Result<(), ConfigError> {
    let names: HashSet<&str> = config.resources.iter().map(|r| r.name.as_str()).collect();
    if names.len() != config.resources.len() {
        let mut seen = HashSet::new();
        for r in &config.resources {
            if !seen.insert(r.name.as_str()) {
                return Err(ConfigError::Validation(format!("duplicate resource name: {}", r.name)));
            }
        }
    }

    let mut path_segments = HashSet::new();
    for r in &config.resources {
        if !segment_re().is_match(&r.name) {
            return Err(ConfigError::InvalidIdentifier {
                kind: "resource",
                name: r.name.clone(),
            });
        }
        if !segment_re().is_match(r.path_segment()) {
            return Err(ConfigError::InvalidIdentifier {
                kind: "path segment",
                name: r.path_segment().to_string(),
            });
        }
        if !collection_re().is_match(r.collection()) {
            return Err(ConfigError::InvalidIdentifier {
                kind: "collection",
                name: r.collection().to_string(),
            });
        }
        if !path_segments.insert(r.path_segment()) {
            return Err(ConfigError::DuplicatePathSegment(r.path_segment().to_string()));
        }

        let modes: HashSet<ProjectionMode> = r
            .projection
            .iter()
            .filter(|(field, _)| field.as_str() != "id")
            .map(|(_, mode)| *mode)
            .collect();
        if modes.len() > 1 {
            return Err(ConfigError::Validation(format!(
                "{}: projection cannot mix include and exclude",
                r.name
            )));
        }

        if let Some(sort) = &r.sort_order {
            if sort.iter().any(|k| k.field.trim().is_empty()) {
                return Err(ConfigError::Validation(format!("{}: empty sort field", r.name)));
            }
        }

        if r.policy == PolicyKind::OwnerScoped && r.owner_field.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::Validation(format!(
                "{}: owner_scoped policy requires owner_field",
                r.name
            )));
        }

        if r.max_list_limit == Some(0) {
            return Err(ConfigError::Validation(format!("{}: max_list_limit must be positive", r.name)));
        }

        validate_fields(&r.name, &r.fields, &names)?;
    }

    Ok(())
}

fn validate_fields(resource: &str, fields: &[FieldSpec], names: &HashSet<&str>) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for f in fields {
        if f.name.trim().is_empty() || f.name == "id" || f.name == "_id" {
            return Err(ConfigError::Validation(format!(
                "{}: invalid field name '{}'",
                resource, f.name
            )));
        }
        if !seen.insert(f.name.as_str()) {
            return Err(ConfigError::Validation(format!("{}: duplicate field '{}'", resource, f.name)));
        }
        if let Some(pattern) = &f.rules.pattern {
            Regex::new(pattern).map_err(|e| {
                ConfigError::Validation(format!("{}.{}: invalid pattern: {}", resource, f.name, e))
            })?;
        }
        match &f.kind {
            FieldKind::Relation { resource: target, .. } if !names.contains(target.as_str()) => {
                return Err(ConfigError::MissingReference {
                    kind: "resource",
                    id: target.clone(),
                });
            }
            FieldKind::Object { fields: nested } => {
                validate_fields(&format!("{}.{}", resource, f.name), nested, names)?;
            }
            _ => {}
        }
    }
    Ok(())
}
