//! Dancefloor API: configuration-driven resource CRUD over a document store, plus form rendering.

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod form;
pub mod handlers;
pub mod policy;
pub mod projection;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod state;
pub mod store;

pub use auth::{Caller, CallerIdentity, HeaderIdentityResolver, IdentityResolver};
pub use config::{load_from_path, load_from_str, resolve, FullConfig, ResolvedModel, ResolvedResource};
pub use error::{AppError, ConfigError, StoreError};
pub use policy::{DefaultPolicy, HookContext, OwnerScopedPolicy, ResourcePolicy};
pub use response::{success_created, success_many, success_ok, Envelope, IdBody};
pub use routes::{app, common_routes, form_routes, resource_routes};
pub use service::{ListQuery, ResourceService};
pub use settings::{init_tracing, Settings, StoreBackend};
pub use state::AppState;
pub use store::{
    ensure_collections, ensure_database_exists, DocumentStore, MemoryDocumentStore, PgDocumentStore,
};
