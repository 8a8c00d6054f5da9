//! Extract the caller (identity + internal-call marker) from request headers.

use crate::auth::{internal_marker, Caller, InternalCall};
use crate::error::AppError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = state.identity.resolve(parts).await?;
        let internal_call = InternalCall::from_marker(internal_marker(parts), state.internal_call_token.as_deref());
        Ok(Caller {
            identity,
            internal_call,
        })
    }
}
