//! Caller identity and the per-resource authorization check.
//!
//! Identity is resolved by an external collaborator behind [`IdentityResolver`]; this module only
//! decides whether a resolved (or absent) identity may run an operation on a resource.

mod check;

pub use check::{authorize, AccessRule, Operation};

use crate::error::AppError;
use async_trait::async_trait;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

/// Header carrying the authenticated user id, set by a trusted upstream.
pub const USER_ID_HEADER: &str = "X-User-Id";
/// Header carrying the authenticated user's role. Defaults to [`DEFAULT_ROLE`] when absent.
pub const USER_ROLE_HEADER: &str = "X-User-Role";
/// Internal service-call marker; its value must equal the configured token.
pub const INTERNAL_CALL_HEADER: &str = "X-Internal-Call";

pub const DEFAULT_ROLE: &str = "user";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub id: String,
    pub role: String,
}

impl CallerIdentity {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        CallerIdentity {
            id: id.into(),
            role: role.into(),
        }
    }
}

/// State of the internal-call marker on a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InternalCall {
    #[default]
    Absent,
    /// Marker present and matches the configured token.
    Trusted,
    /// Marker present but wrong, or no token configured.
    Rejected,
}

impl InternalCall {
    pub fn from_marker(marker: Option<&str>, token: Option<&str>) -> Self {
        match (marker, token) {
            (None, _) => InternalCall::Absent,
            (Some(m), Some(t)) if !t.is_empty() && m == t => InternalCall::Trusted,
            (Some(_), _) => InternalCall::Rejected,
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, InternalCall::Absent)
    }
}

/// Everything the authorization check knows about who is calling.
#[derive(Clone, Debug, Default)]
pub struct Caller {
    pub identity: Option<CallerIdentity>,
    pub internal_call: InternalCall,
}

impl Caller {
    pub fn anonymous() -> Self {
        Caller::default()
    }

    pub fn user(identity: CallerIdentity) -> Self {
        Caller {
            identity: Some(identity),
            internal_call: InternalCall::Absent,
        }
    }
}

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `Ok(None)` means no identity could be resolved; errors are infrastructure failures.
    async fn resolve(&self, parts: &Parts) -> Result<Option<CallerIdentity>, AppError>;
}

/// Trusts `X-User-Id` / `X-User-Role` set by an authenticating proxy in front of this service.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderIdentityResolver;

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl IdentityResolver for HeaderIdentityResolver {
    async fn resolve(&self, parts: &Parts) -> Result<Option<CallerIdentity>, AppError> {
        Ok(header_str(parts, USER_ID_HEADER).map(|id| {
            let role = header_str(parts, USER_ROLE_HEADER).unwrap_or(DEFAULT_ROLE);
            CallerIdentity::new(id, role)
        }))
    }
}

pub(crate) fn internal_marker(parts: &Parts) -> Option<&str> {
    header_str(parts, INTERNAL_CALL_HEADER)
}
