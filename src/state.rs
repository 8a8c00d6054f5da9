//! Shared application state for all routes.

use crate::auth::{HeaderIdentityResolver, IdentityResolver};
use crate::config::ResolvedModel;
use crate::store::DocumentStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub model: Arc<ResolvedModel>,
    pub identity: Arc<dyn IdentityResolver>,
    /// Expected value of the internal-call header. `None` disables internal calls.
    pub internal_call_token: Option<Arc<str>>,
}

impl AppState {
    /// Header-based identity, internal calls disabled.
    pub fn new(store: Arc<dyn DocumentStore>, model: ResolvedModel) -> Self {
        AppState {
            store,
            model: Arc::new(model),
            identity: Arc::new(HeaderIdentityResolver),
            internal_call_token: None,
        }
    }

    pub fn with_identity_resolver(mut self, identity: Arc<dyn IdentityResolver>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_internal_call_token(mut self, token: Option<String>) -> Self {
        self.internal_call_token = token.filter(|t| !t.is_empty()).map(Arc::from);
        self
    }
}
