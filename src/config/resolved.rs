//! Resolved resource model: config validated and flattened for runtime use.

use crate::auth::AccessRule;
use crate::config::FieldSpec;
use crate::error::ConfigError;
use crate::policy::ResourcePolicy;
use crate::projection::Projection;
use crate::store::SortKey;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Field stamped on create when timestamps are enabled; also the default sort key.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Field stamped on create and update when timestamps are enabled.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

#[derive(Clone)]
pub struct ResolvedResource {
    pub name: String,
    pub path_segment: String,
    pub collection: String,
    pub access: AccessRule,
    pub projection: Projection,
    pub sort_order: Vec<SortKey>,
    pub timestamps: bool,
    /// `None` leaves list reads unbounded.
    pub max_list_limit: Option<u32>,
    pub fields: Vec<FieldSpec>,
    pub policy: Arc<dyn ResourcePolicy>,
}

impl fmt::Debug for ResolvedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedResource")
            .field("name", &self.name)
            .field("path_segment", &self.path_segment)
            .field("collection", &self.collection)
            .field("access", &self.access)
            .field("projection", &self.projection)
            .field("sort_order", &self.sort_order)
            .field("timestamps", &self.timestamps)
            .field("max_list_limit", &self.max_list_limit)
            .field("fields", &self.fields.len())
            .field("policy", &self.policy.name())
            .finish()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedModel {
    pub resources: Vec<ResolvedResource>,
    by_path: HashMap<String, usize>,
}

impl ResolvedModel {
    pub fn new(resources: Vec<ResolvedResource>) -> Self {
        let by_path = resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.path_segment.clone(), i))
            .collect();
        ResolvedModel { resources, by_path }
    }

    pub fn resource_by_path(&self, path: &str) -> Option<&ResolvedResource> {
        self.by_path.get(path).map(|&i| &self.resources[i])
    }

    pub fn resource_by_name(&self, name: &str) -> Option<&ResolvedResource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Replace the lifecycle policy of one resource with application code.
    pub fn with_policy(mut self, name: &str, policy: Arc<dyn ResourcePolicy>) -> Result<Self, ConfigError> {
        let resource = self
            .resources
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| ConfigError::MissingReference {
                kind: "resource",
                id: name.to_string(),
            })?;
        resource.policy = policy;
        Ok(self)
    }

    /// Distinct backing collections.
    pub fn collections(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.resources.iter().map(|r| r.collection.as_str()).collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}
