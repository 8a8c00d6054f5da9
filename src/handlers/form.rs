//! Form handlers: describe a resource as a form, accept a form submission.

use super::resource::resource_for;
use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::form::{describe, FormSubmission, PreparedSubmission, WidgetOverrides};
use crate::response::{success_created, success_ok, IdBody};
use crate::service::ResourceService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormQuery {
    pub multi_select: Option<String>,
    pub select: Option<String>,
    pub text_area: Option<String>,
    pub hidden: Option<String>,
}

impl FormQuery {
    fn overrides(&self) -> WidgetOverrides {
        WidgetOverrides::from_lists(
            self.multi_select.as_deref(),
            self.select.as_deref(),
            self.text_area.as_deref(),
            self.hidden.as_deref(),
        )
    }
}

pub async fn describe_form(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Query(query): Query<FormQuery>,
) -> Result<impl IntoResponse, AppError> {
    let resource = resource_for(&state, &path_segment)?;
    Ok(success_ok(describe(resource, &query.overrides())))
}

/// Dispatches to the same create/update path as the resource routes.
pub async fn submit_form(
    caller: Caller,
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    JsonBody(submission): JsonBody<FormSubmission>,
) -> Result<axum::response::Response, AppError> {
    let resource = resource_for(&state, &path_segment)?;
    let store = state.store.as_ref();
    match submission.prepare()? {
        PreparedSubmission::Create { body } => {
            let id = ResourceService::create(store, resource, &caller, Value::Object(body)).await?;
            Ok(success_created(IdBody { id }).into_response())
        }
        PreparedSubmission::Update { id, body } => {
            let id = ResourceService::update(store, resource, &caller, &id, Value::Object(body)).await?;
            Ok(success_ok(IdBody { id }).into_response())
        }
    }
}
