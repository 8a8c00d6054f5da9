//! Document store accessor: named collections of JSON documents keyed by a store-assigned id.

mod memory;
mod postgres;

pub use memory::MemoryDocumentStore;
pub use postgres::{ensure_collections, ensure_database_exists, PgDocumentStore};

use crate::error::{AppError, StoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Top-level fields of a document. The identity is kept outside the map.
pub type Fields = serde_json::Map<String, Value>;

/// Store-assigned document identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn generate() -> Self {
        DocumentId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for DocumentId {
    fn from(u: Uuid) -> Self {
        DocumentId(u)
    }
}

impl FromStr for DocumentId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(DocumentId)
            .map_err(|e| AppError::InvalidInput(format!("invalid document id '{}': {}", s, e)))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
}

/// One predicate over a top-level field. A missing field compares as `null`.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Eq { field: String, value: Value },
    In { field: String, values: Vec<Value> },
}

/// Conjunction of conditions. Empty matches every document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn match_all() -> Self {
        Filter::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn is_in(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.conditions.push(Condition::In {
            field: field.into(),
            values,
        });
        self
    }

    pub fn and(mut self, other: Filter) -> Self {
        self.conditions.extend(other.conditions);
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_match_all(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        self.conditions.iter().all(|c| match c {
            Condition::Eq { field, value } => values_equal(fields.get(field).unwrap_or(&Value::Null), value),
            Condition::In { field, values } => {
                let v = fields.get(field).unwrap_or(&Value::Null);
                values.iter().any(|candidate| values_equal(v, candidate))
            }
        })
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(alias = "ascending")]
    #[default]
    Asc,
    #[serde(alias = "descending")]
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortKey {
    pub fn desc(field: impl Into<String>) -> Self {
        SortKey {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        SortKey {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }
}

/// Sort and window for a find. Missing sort fields order last in either direction.
#[derive(Clone, Debug, Default)]
pub struct FindOptions {
    pub sort: Vec<SortKey>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl FindOptions {
    /// Order among documents equal on every sort key: insertion order, following the leading key.
    pub fn insertion_order(&self) -> SortDirection {
        self.sort.first().map(|k| k.direction).unwrap_or_default()
    }
}

/// Access to document collections. Single-document writes are atomic; nothing else is coordinated.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn find_by_id(&self, collection: &str, id: DocumentId) -> Result<Option<Document>, StoreError>;

    /// Insert and return the newly generated identity.
    async fn insert(&self, collection: &str, fields: Fields) -> Result<DocumentId, StoreError>;

    /// Shallow merge: each supplied top-level field replaces the stored one. Returns whether a document matched.
    async fn update(&self, collection: &str, id: DocumentId, set: Fields) -> Result<bool, StoreError>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: DocumentId) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(v: Value) -> Fields {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::match_all().matches(&fields(json!({ "a": 1 }))));
        assert!(Filter::match_all().matches(&Fields::new()));
    }

    #[test]
    fn eq_treats_missing_as_null() {
        let f = Filter::match_all().eq("organizerId", Value::Null);
        assert!(f.matches(&fields(json!({ "title": "x" }))));
        assert!(!f.matches(&fields(json!({ "organizerId": "u1" }))));
    }

    #[test]
    fn numbers_compare_by_value() {
        let f = Filter::match_all().eq("price", json!(10.0));
        assert!(f.matches(&fields(json!({ "price": 10 }))));
    }

    #[test]
    fn conditions_are_conjunctive() {
        let f = Filter::match_all()
            .eq("type", "social")
            .is_in("city", vec![json!("Berlin"), json!("Paris")]);
        assert!(f.matches(&fields(json!({ "type": "social", "city": "Paris" }))));
        assert!(!f.matches(&fields(json!({ "type": "festival", "city": "Paris" }))));
        assert!(!f.matches(&fields(json!({ "type": "social", "city": "Rome" }))));
    }

    #[test]
    fn malformed_id_is_invalid_input() {
        let err = "abc".parse::<DocumentId>().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn id_round_trips_through_display() {
        let id = DocumentId::generate();
        assert_eq!(id.to_string().parse::<DocumentId>().unwrap(), id);
    }

    #[test]
    fn sort_direction_accepts_long_names() {
        let k: SortKey = serde_json::from_value(json!({ "field": "createdAt", "direction": "descending" })).unwrap();
        assert_eq!(k, SortKey::desc("createdAt"));
    }
}
