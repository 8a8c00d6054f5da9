//! Field projection: stored document -> public shape. The identity is always emitted as `id`.

use crate::config::ProjectionMode;
use crate::error::ConfigError;
use crate::store::Document;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Public name of the identity field.
pub const ID_FIELD: &str = "id";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    PassThrough,
    /// Only these fields (plus `id`).
    Include(BTreeSet<String>),
    /// Every field except these.
    Exclude(BTreeSet<String>),
}

impl Projection {
    pub fn from_config(map: &BTreeMap<String, ProjectionMode>) -> Result<Self, ConfigError> {
        let mut include = BTreeSet::new();
        let mut exclude = BTreeSet::new();
        for (field, mode) in map {
            if field == ID_FIELD {
                continue;
            }
            match mode {
                ProjectionMode::Include => include.insert(field.clone()),
                ProjectionMode::Exclude => exclude.insert(field.clone()),
            };
        }
        match (include.is_empty(), exclude.is_empty()) {
            (true, true) => Ok(Projection::PassThrough),
            (false, true) => Ok(Projection::Include(include)),
            (true, false) => Ok(Projection::Exclude(exclude)),
            (false, false) => Err(ConfigError::Validation(
                "projection cannot mix include and exclude".into(),
            )),
        }
    }

    pub fn apply(&self, doc: Document) -> Value {
        let mut out = serde_json::Map::with_capacity(doc.fields.len() + 1);
        out.insert(ID_FIELD.to_string(), Value::String(doc.id.to_string()));
        for (k, v) in doc.fields {
            if k == ID_FIELD || k == "_id" {
                continue;
            }
            let keep = match self {
                Projection::PassThrough => true,
                Projection::Include(fields) => fields.contains(&k),
                Projection::Exclude(fields) => !fields.contains(&k),
            };
            if keep {
                out.insert(k, v);
            }
        }
        Value::Object(out)
    }
}
