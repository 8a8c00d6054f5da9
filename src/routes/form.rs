//! Form routes: descriptor and submission.

use crate::handlers::form::{describe_form, submit_form};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn form_routes(state: AppState) -> Router {
    Router::new()
        .route("/:path_segment", get(describe_form))
        .route("/:path_segment/submit", post(submit_form))
        .with_state(state)
}
