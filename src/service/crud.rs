//! Generic resource operations: authorization, hooks, store access and projection.
//!
//! There is no transaction around hook + store + hook. When an after-hook fails the mutation
//! stays in the store and the operation still reports the hook's error.

use crate::auth::{authorize, Caller, Operation};
use crate::config::{ResolvedResource, CREATED_AT_FIELD, UPDATED_AT_FIELD};
use crate::error::{AppError, DELETE_DENIED_MESSAGE};
use crate::policy::HookContext;
use crate::service::RequestValidator;
use crate::store::{DocumentId, DocumentStore, Fields, FindOptions};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// Query string of a list call. `limit` and `offset` are also left in `params` for the list filter.
#[derive(Clone, Debug, Default)]
pub struct ListQuery {
    pub params: HashMap<String, String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListQuery {
    pub fn from_params(params: HashMap<String, String>) -> Result<Self, AppError> {
        let parse = |key: &str| -> Result<Option<u32>, AppError> {
            params
                .get(key)
                .map(|v| {
                    v.parse::<u32>()
                        .map_err(|_| AppError::InvalidInput(format!("{} must be a non-negative integer", key)))
                })
                .transpose()
        };
        let limit = parse("limit")?;
        let offset = parse("offset")?;
        Ok(ListQuery { params, limit, offset })
    }
}

fn body_to_fields(value: Value) -> Result<Fields, AppError> {
    match value {
        Value::Object(mut m) => {
            // The identity is store-assigned and never part of the payload.
            m.remove("id");
            m.remove("_id");
            Ok(m)
        }
        _ => Err(AppError::InvalidInput("body must be a JSON object".into())),
    }
}

fn now_timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn hook_context<'a>(
    store: &'a dyn DocumentStore,
    resource: &'a ResolvedResource,
    caller: &'a Caller,
) -> HookContext<'a> {
    HookContext {
        resource,
        caller: caller.identity.as_ref(),
        store,
    }
}

fn effective_limit(requested: Option<u32>, max: Option<u32>) -> Option<u32> {
    match (requested, max) {
        (Some(l), Some(max)) => Some(l.min(max)),
        (None, Some(max)) => Some(max),
        (l, None) => l,
    }
}

pub struct ResourceService;

impl ResourceService {
    /// Filtered, sorted, projected documents. Unbounded unless `limit` or `max_list_limit` applies.
    pub async fn list(
        store: &dyn DocumentStore,
        resource: &ResolvedResource,
        caller: &Caller,
        query: &ListQuery,
    ) -> Result<Vec<Value>, AppError> {
        authorize(&resource.access, Operation::List, caller)?;
        let ctx = hook_context(store, resource, caller);
        let filter = resource.policy.list_filter(&ctx, &query.params).await?;
        let options = FindOptions {
            sort: resource.sort_order.clone(),
            limit: effective_limit(query.limit, resource.max_list_limit),
            offset: query.offset,
        };
        let docs = store.find(&resource.collection, &filter, &options).await?;
        tracing::debug!(resource = %resource.name, count = docs.len(), "list");
        Ok(docs.into_iter().map(|d| resource.projection.apply(d)).collect())
    }

    pub async fn get(
        store: &dyn DocumentStore,
        resource: &ResolvedResource,
        caller: &Caller,
        id_str: &str,
    ) -> Result<Value, AppError> {
        authorize(&resource.access, Operation::Get, caller)?;
        let id: DocumentId = id_str.parse()?;
        let doc = store
            .find_by_id(&resource.collection, id)
            .await?
            .ok_or_else(AppError::not_found)?;
        Ok(resource.projection.apply(doc))
    }

    /// Returns only the new id, not the stored document.
    pub async fn create(
        store: &dyn DocumentStore,
        resource: &ResolvedResource,
        caller: &Caller,
        body: Value,
    ) -> Result<DocumentId, AppError> {
        authorize(&resource.access, Operation::Create, caller)?;
        let body = body_to_fields(body)?;
        RequestValidator::validate(&body, &resource.fields)?;

        let ctx = hook_context(store, resource, caller);
        let mut data = resource.policy.before_create(&ctx, body).await?;
        if resource.timestamps {
            let now = now_timestamp();
            data.insert(CREATED_AT_FIELD.to_string(), now.clone());
            data.insert(UPDATED_AT_FIELD.to_string(), now);
        }

        let id = store.insert(&resource.collection, data.clone()).await?;
        tracing::info!(resource = %resource.name, id = %id, "document created");

        if let Err(e) = resource.policy.after_create(&ctx, id, &data).await {
            tracing::warn!(resource = %resource.name, id = %id, error = %e, "after_create failed; document kept");
            return Err(e);
        }
        Ok(id)
    }

    /// Shallow merge of the supplied top-level fields.
    pub async fn update(
        store: &dyn DocumentStore,
        resource: &ResolvedResource,
        caller: &Caller,
        id_str: &str,
        body: Value,
    ) -> Result<DocumentId, AppError> {
        authorize(&resource.access, Operation::Update, caller)?;
        let id: DocumentId = id_str.parse()?;
        let body = body_to_fields(body)?;
        RequestValidator::validate_partial(&body, &resource.fields)?;

        let ctx = hook_context(store, resource, caller);
        let mut data = resource.policy.before_update(&ctx, id, body).await?;
        if resource.timestamps {
            // The creation stamp is server-owned and fixed after insert.
            data.remove(CREATED_AT_FIELD);
            data.insert(UPDATED_AT_FIELD.to_string(), now_timestamp());
        }

        if !store.update(&resource.collection, id, data.clone()).await? {
            return Err(AppError::not_found());
        }
        tracing::info!(resource = %resource.name, id = %id, fields = data.len(), "document updated");

        if let Err(e) = resource.policy.after_update(&ctx, id, &data).await {
            tracing::warn!(resource = %resource.name, id = %id, error = %e, "after_update failed; update kept");
            return Err(e);
        }
        Ok(id)
    }

    pub async fn delete(
        store: &dyn DocumentStore,
        resource: &ResolvedResource,
        caller: &Caller,
        id_str: &str,
    ) -> Result<DocumentId, AppError> {
        authorize(&resource.access, Operation::Delete, caller)?;
        let id: DocumentId = id_str.parse()?;

        let ctx = hook_context(store, resource, caller);
        if !resource.policy.before_delete(&ctx, id).await? {
            return Err(AppError::Forbidden(DELETE_DENIED_MESSAGE.into()));
        }
        if !store.delete(&resource.collection, id).await? {
            return Err(AppError::not_found());
        }
        tracing::info!(resource = %resource.name, id = %id, "document deleted");

        if let Err(e) = resource.policy.after_delete(&ctx, id).await {
            tracing::warn!(resource = %resource.name, id = %id, error = %e, "after_delete failed; delete kept");
            return Err(e);
        }
        Ok(id)
    }
}
