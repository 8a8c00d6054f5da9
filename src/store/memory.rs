//! In-process document store for tests and local development.

use super::{Document, DocumentId, DocumentStore, Fields, Filter, FindOptions, SortDirection};
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Collections kept in insertion order, behind one lock.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Poisoned(e.to_string())
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().map_err(poisoned)?;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(&d.fields)).cloned().collect())
            .unwrap_or_default();
        drop(collections);

        if !options.sort.is_empty() {
            // Stable sort keeps the pre-sort order for ties.
            if options.insertion_order() == SortDirection::Desc {
                docs.reverse();
            }
            docs.sort_by(|a, b| {
                for key in &options.sort {
                    let ord = compare_fields(a.fields.get(&key.field), b.fields.get(&key.field), key.direction);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        let offset = options.offset.unwrap_or(0) as usize;
        let iter = docs.into_iter().skip(offset);
        Ok(match options.limit {
            Some(limit) => iter.take(limit as usize).collect(),
            None => iter.collect(),
        })
    }

    async fn find_by_id(&self, collection: &str, id: DocumentId) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned())
    }

    async fn insert(&self, collection: &str, fields: Fields) -> Result<DocumentId, StoreError> {
        let id = DocumentId::generate();
        let mut collections = self.collections.write().map_err(poisoned)?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(Document { id, fields });
        Ok(id)
    }

    async fn update(&self, collection: &str, id: DocumentId, set: Fields) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
        else {
            return Ok(false);
        };
        for (k, v) in set {
            doc.fields.insert(k, v);
        }
        Ok(true)
    }

    async fn delete(&self, collection: &str, id: DocumentId) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| d.id != id);
        Ok(docs.len() != before)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.collections.read().map(|_| ()).map_err(poisoned)
    }
}

/// Missing (or null) values order last regardless of direction.
fn compare_fields(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = compare_values(a, b);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::String(_) => 1,
        Value::Number(_) => 2,
        Value::Bool(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x.len().cmp(&y.len()),
        (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
