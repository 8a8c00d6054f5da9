//! Demo server: loads resource definitions and serves them.
//!
//! Run from repo root: `cargo run -p demo-server`
//! Set `DOCUMENT_STORE=memory` to run without PostgreSQL.

use dancefloor_api::{
    app, ensure_collections, ensure_database_exists, init_tracing, load_from_path, resolve, AppState,
    DocumentStore, MemoryDocumentStore, PgDocumentStore, Settings, StoreBackend,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_tracing("dancefloor_api=info,demo_server=info,tower_http=info");

    let config = load_from_path(&settings.resources_path).await?;
    let model = resolve(&config)?;

    let store: Arc<dyn DocumentStore> = match settings.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("using in-memory document store; data is lost on exit");
            Arc::new(MemoryDocumentStore::new())
        }
        StoreBackend::Postgres => {
            ensure_database_exists(&settings.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(&settings.database_url)
                .await?;
            ensure_collections(&pool, &settings.docstore_schema, model.collections()).await?;
            Arc::new(PgDocumentStore::new(pool, settings.docstore_schema.clone()))
        }
    };

    let state = AppState::new(store, model).with_internal_call_token(settings.internal_call_token.clone());
    let router = app(state, settings.body_limit_bytes);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
