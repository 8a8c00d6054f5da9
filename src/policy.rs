//! Per-resource lifecycle policy: list filter and before/after hooks around each mutation.
//!
//! Every method has a pass-through default, so a policy only overrides what it needs. Hooks run
//! inside the request; their errors become the operation's error.

use crate::auth::CallerIdentity;
use crate::config::ResolvedResource;
use crate::error::AppError;
use crate::store::{DocumentId, DocumentStore, Fields, Filter};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// What a hook can see about the current request.
pub struct HookContext<'a> {
    pub resource: &'a ResolvedResource,
    pub caller: Option<&'a CallerIdentity>,
    pub store: &'a dyn DocumentStore,
}

#[async_trait]
pub trait ResourcePolicy: Send + Sync {
    fn name(&self) -> &str {
        "default"
    }

    /// Filter applied to list queries. Default matches everything.
    async fn list_filter(
        &self,
        _ctx: &HookContext<'_>,
        _query: &HashMap<String, String>,
    ) -> Result<Filter, AppError> {
        Ok(Filter::match_all())
    }

    /// May transform the payload before insert.
    async fn before_create(&self, _ctx: &HookContext<'_>, body: Fields) -> Result<Fields, AppError> {
        Ok(body)
    }

    /// Receives the data actually inserted.
    async fn after_create(&self, _ctx: &HookContext<'_>, _id: DocumentId, _data: &Fields) -> Result<(), AppError> {
        Ok(())
    }

    async fn before_update(
        &self,
        _ctx: &HookContext<'_>,
        _id: DocumentId,
        body: Fields,
    ) -> Result<Fields, AppError> {
        Ok(body)
    }

    async fn after_update(&self, _ctx: &HookContext<'_>, _id: DocumentId, _data: &Fields) -> Result<(), AppError> {
        Ok(())
    }

    /// `false` denies the delete before the store is touched.
    async fn before_delete(&self, _ctx: &HookContext<'_>, _id: DocumentId) -> Result<bool, AppError> {
        Ok(true)
    }

    async fn after_delete(&self, _ctx: &HookContext<'_>, _id: DocumentId) -> Result<(), AppError> {
        Ok(())
    }
}

/// No filter, no hooks.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultPolicy;

impl ResourcePolicy for DefaultPolicy {}

/// Documents belong to the caller whose id is stored in `owner_field`.
///
/// Lists are scoped to the caller's documents, create stamps the owner, and only the owner may
/// update or delete. The owner field itself cannot be changed through update.
#[derive(Clone, Debug)]
pub struct OwnerScopedPolicy {
    owner_field: String,
}

impl OwnerScopedPolicy {
    pub fn new(owner_field: impl Into<String>) -> Self {
        OwnerScopedPolicy {
            owner_field: owner_field.into(),
        }
    }

    pub fn owner_field(&self) -> &str {
        &self.owner_field
    }

    /// `None` when the document does not exist; the operation itself reports not-found.
    async fn owned_by_caller(&self, ctx: &HookContext<'_>, id: DocumentId) -> Result<Option<bool>, AppError> {
        let Some(doc) = ctx.store.find_by_id(&ctx.resource.collection, id).await? else {
            return Ok(None);
        };
        let owner = doc.fields.get(&self.owner_field).and_then(Value::as_str);
        Ok(Some(match (owner, ctx.caller) {
            (Some(owner), Some(caller)) => owner == caller.id,
            _ => false,
        }))
    }
}

#[async_trait]
impl ResourcePolicy for OwnerScopedPolicy {
    fn name(&self) -> &str {
        "owner_scoped"
    }

    async fn list_filter(
        &self,
        ctx: &HookContext<'_>,
        _query: &HashMap<String, String>,
    ) -> Result<Filter, AppError> {
        let caller = ctx
            .caller
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".into()))?;
        Ok(Filter::match_all().eq(self.owner_field.clone(), caller.id.clone()))
    }

    async fn before_create(&self, ctx: &HookContext<'_>, mut body: Fields) -> Result<Fields, AppError> {
        if let Some(caller) = ctx.caller {
            body.insert(self.owner_field.clone(), Value::String(caller.id.clone()));
        }
        Ok(body)
    }

    async fn before_update(
        &self,
        ctx: &HookContext<'_>,
        id: DocumentId,
        mut body: Fields,
    ) -> Result<Fields, AppError> {
        if self.owned_by_caller(ctx, id).await? == Some(false) {
            return Err(AppError::Forbidden("Cannot update this document".into()));
        }
        body.remove(&self.owner_field);
        Ok(body)
    }

    async fn before_delete(&self, ctx: &HookContext<'_>, id: DocumentId) -> Result<bool, AppError> {
        Ok(self.owned_by_caller(ctx, id).await? != Some(false))
    }
}
