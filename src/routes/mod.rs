//! Router assembly.

mod common;
mod form;
mod resource;

pub use common::common_routes;
pub use form::form_routes;
pub use resource::resource_routes;

use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;

pub const API_PREFIX: &str = "/api/v1";
pub const FORMS_PREFIX: &str = "/forms";

/// Full application: probes at the root, resources under `/api/v1`, forms under `/forms`.
/// The body limit is enforced by the JSON extractor so an oversized body still gets the envelope.
pub fn app(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest(API_PREFIX, resource_routes(state.clone()))
        .nest(FORMS_PREFIX, form_routes(state))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(TraceLayer::new_for_http())
}
