//! Resource CRUD handlers: list, read, create, update, delete.

use crate::auth::Caller;
use crate::config::ResolvedResource;
use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::response::{success_created, success_many, success_ok, IdBody};
use crate::service::{ListQuery, ResourceService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::Value;
use std::collections::HashMap;

pub(crate) fn resource_for<'a>(state: &'a AppState, path_segment: &str) -> Result<&'a ResolvedResource, AppError> {
    state
        .model
        .resource_by_path(path_segment)
        .ok_or_else(|| AppError::NotFound(format!("unknown resource: {}", path_segment)))
}

pub async fn list(
    caller: Caller,
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let resource = resource_for(&state, &path_segment)?;
    let query = ListQuery::from_params(params)?;
    let docs = ResourceService::list(state.store.as_ref(), resource, &caller, &query).await?;
    Ok(success_many(docs))
}

pub async fn read(
    caller: Caller,
    State(state): State<AppState>,
    Path((path_segment, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = resource_for(&state, &path_segment)?;
    let doc = ResourceService::get(state.store.as_ref(), resource, &caller, &id).await?;
    Ok(success_ok(doc))
}

pub async fn create(
    caller: Caller,
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, AppError> {
    let resource = resource_for(&state, &path_segment)?;
    let id = ResourceService::create(state.store.as_ref(), resource, &caller, body).await?;
    Ok(success_created(IdBody { id }))
}

pub async fn update(
    caller: Caller,
    State(state): State<AppState>,
    Path((path_segment, id)): Path<(String, String)>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, AppError> {
    let resource = resource_for(&state, &path_segment)?;
    let id = ResourceService::update(state.store.as_ref(), resource, &caller, &id, body).await?;
    Ok(success_ok(IdBody { id }))
}

pub async fn delete(
    caller: Caller,
    State(state): State<AppState>,
    Path((path_segment, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = resource_for(&state, &path_segment)?;
    let id = ResourceService::delete(state.store.as_ref(), resource, &caller, &id).await?;
    Ok(success_ok(IdBody { id }))
}
