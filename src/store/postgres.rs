//! PostgreSQL document collections: one JSONB table per collection inside a dedicated schema.
//! Collection names come from config only.

use super::{Condition, Document, DocumentId, DocumentStore, Fields, Filter, FindOptions, SortDirection};
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{ConnectOptions, PgPool, Postgres, Row};
use std::str::FromStr;
use uuid::Uuid;

fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified_table(schema: &str, collection: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(collection))
}

/// Create the schema and one table per collection if missing.
pub async fn ensure_collections<'a, I>(pool: &PgPool, schema: &str, collections: I) -> Result<(), StoreError>
where
    I: IntoIterator<Item = &'a str>,
{
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
        .execute(pool)
        .await?;
    for collection in collections {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                payload JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            qualified_table(schema, collection)
        );
        sqlx::query(&ddl).execute(pool).await?;
        tracing::debug!(schema = %schema, collection = %collection, "collection ready");
    }
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), StoreError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| StoreError::Connection(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), StoreError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| StoreError::Connection("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

/// A bindable parameter for the dynamically built find query.
#[derive(Clone, Debug)]
enum PgParam {
    Text(String),
    Json(Value),
    BigInt(i64),
}

struct QueryBuf {
    sql: String,
    params: Vec<PgParam>,
}

impl QueryBuf {
    fn new(sql: String) -> Self {
        QueryBuf { sql, params: Vec::new() }
    }

    fn push_param(&mut self, p: PgParam) -> usize {
        self.params.push(p);
        self.params.len()
    }
}

fn bind_all<'q>(mut query: Query<'q, Postgres, PgArguments>, params: Vec<PgParam>) -> Query<'q, Postgres, PgArguments> {
    for p in params {
        query = match p {
            PgParam::Text(s) => query.bind(s),
            PgParam::Json(v) => query.bind(v),
            PgParam::BigInt(n) => query.bind(n),
        };
    }
    query
}

/// SELECT with filter conditions, ordering and window. Field names and values are bound, never inlined.
fn build_find(table: &str, filter: &Filter, options: &FindOptions) -> QueryBuf {
    let mut q = QueryBuf::new(format!("SELECT id, payload FROM {}", table));

    let mut clauses = Vec::new();
    for c in filter.conditions() {
        match c {
            Condition::Eq { field, value } => {
                let k = q.push_param(PgParam::Text(field.clone()));
                let v = q.push_param(PgParam::Json(value.clone()));
                clauses.push(format!("COALESCE(payload -> ${}::text, 'null'::jsonb) = ${}::jsonb", k, v));
            }
            Condition::In { field, values } => {
                let k = q.push_param(PgParam::Text(field.clone()));
                let v = q.push_param(PgParam::Json(Value::Array(values.clone())));
                clauses.push(format!(
                    "${}::jsonb @> jsonb_build_array(COALESCE(payload -> ${}::text, 'null'::jsonb))",
                    v, k
                ));
            }
        }
    }
    if !clauses.is_empty() {
        q.sql.push_str(" WHERE ");
        q.sql.push_str(&clauses.join(" AND "));
    }

    let mut order = Vec::new();
    for key in &options.sort {
        let k = q.push_param(PgParam::Text(key.field.clone()));
        let dir = match key.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        order.push(format!("NULLIF(payload -> ${}::text, 'null'::jsonb) {} NULLS LAST", k, dir));
    }
    order.push(match options.insertion_order() {
        SortDirection::Asc => "created_at ASC".into(),
        SortDirection::Desc => "created_at DESC".into(),
    });
    q.sql.push_str(" ORDER BY ");
    q.sql.push_str(&order.join(", "));

    if let Some(limit) = options.limit {
        let n = q.push_param(PgParam::BigInt(limit as i64));
        q.sql.push_str(&format!(" LIMIT ${}", n));
    }
    if let Some(offset) = options.offset {
        let n = q.push_param(PgParam::BigInt(offset as i64));
        q.sql.push_str(&format!(" OFFSET ${}", n));
    }
    q
}

fn row_to_document(row: &PgRow) -> Result<Document, StoreError> {
    let id: Uuid = row.try_get("id")?;
    let payload: Value = row.try_get("payload")?;
    match payload {
        Value::Object(fields) => Ok(Document { id: id.into(), fields }),
        other => Err(StoreError::Corrupt {
            id: id.to_string(),
            reason: format!("payload is not an object: {}", other),
        }),
    }
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    schema: String,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgDocumentStore {
            pool,
            schema: schema.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn table(&self, collection: &str) -> String {
        qualified_table(&self.schema, collection)
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let QueryBuf { sql, params } = build_find(&self.table(collection), filter, options);
        tracing::debug!(sql = %sql, params = ?params, "find");
        let rows = bind_all(sqlx::query(&sql), params).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_document).collect()
    }

    async fn find_by_id(&self, collection: &str, id: DocumentId) -> Result<Option<Document>, StoreError> {
        let sql = format!("SELECT id, payload FROM {} WHERE id = $1", self.table(collection));
        tracing::debug!(sql = %sql, id = %id, "find_by_id");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_document).transpose()
    }

    async fn insert(&self, collection: &str, fields: Fields) -> Result<DocumentId, StoreError> {
        let id = DocumentId::generate();
        let sql = format!(
            "INSERT INTO {} (id, payload, created_at, updated_at) VALUES ($1, $2, NOW(), NOW())",
            self.table(collection)
        );
        tracing::debug!(sql = %sql, id = %id, "insert");
        sqlx::query(&sql)
            .bind(*id.as_uuid())
            .bind(Value::Object(fields))
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn update(&self, collection: &str, id: DocumentId, set: Fields) -> Result<bool, StoreError> {
        // jsonb || replaces top-level keys only, which is the merge contract.
        let sql = format!(
            "UPDATE {} SET payload = payload || $2, updated_at = NOW() WHERE id = $1",
            self.table(collection)
        );
        tracing::debug!(sql = %sql, id = %id, "update");
        let result = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .bind(Value::Object(set))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, collection: &str, id: DocumentId) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table(collection));
        tracing::debug!(sql = %sql, id = %id, "delete");
        let result = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SortKey;
    use serde_json::json;

    #[test]
    fn find_without_filter_orders_by_insertion() {
        let q = build_find("\"docstore\".\"events\"", &Filter::match_all(), &FindOptions::default());
        assert_eq!(q.sql, "SELECT id, payload FROM \"docstore\".\"events\" ORDER BY created_at ASC");
        assert!(q.params.is_empty());
    }

    #[test]
    fn find_binds_fields_and_values() {
        let filter = Filter::match_all()
            .eq("organizerId", "u1")
            .is_in("type", vec![json!("social"), json!("festival")]);
        let options = FindOptions {
            sort: vec![SortKey::desc("createdAt")],
            limit: Some(10),
            offset: Some(20),
        };
        let q = build_find("t", &filter, &options);
        assert_eq!(
            q.sql,
            "SELECT id, payload FROM t WHERE COALESCE(payload -> $1::text, 'null'::jsonb) = $2::jsonb \
             AND $4::jsonb @> jsonb_build_array(COALESCE(payload -> $3::text, 'null'::jsonb)) \
             ORDER BY NULLIF(payload -> $5::text, 'null'::jsonb) DESC NULLS LAST, created_at DESC LIMIT $6 OFFSET $7"
        );
        assert_eq!(q.params.len(), 7);
    }

    #[test]
    fn ascending_sort_breaks_ties_oldest_first() {
        let options = FindOptions {
            sort: vec![SortKey::asc("startDate")],
            ..Default::default()
        };
        let q = build_find("t", &Filter::match_all(), &options);
        assert!(q.sql.ends_with("ASC NULLS LAST, created_at ASC"), "{}", q.sql);
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(qualified_table("docstore", "we\"ird"), "\"docstore\".\"we\"\"ird\"");
    }

    #[test]
    fn admin_url_targets_postgres_db() {
        let (admin, name) = parse_db_name_from_url("postgres://u:p@localhost:5432/dancefloor?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres");
        assert_eq!(name, "dancefloor");
    }
}
