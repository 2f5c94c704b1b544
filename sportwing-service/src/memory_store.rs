use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::store::{
    Collection, DeleteResult, Document, DocumentId, DocumentStore, Filter, InsertOneResult,
    SortDesc, StoreResult, UpdateResult, ID_FIELD,
};

/// Process-local document store used by tests and by runs without `DATABASE_URL`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<Collection, Vec<(DocumentId, Document)>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, collection: Collection) -> usize {
        let guard = self.inner.read().expect("rwlock poisoned");
        guard.get(&collection).map(Vec::len).unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, collection: Collection, mut doc: Document) -> StoreResult<InsertOneResult> {
        let id = DocumentId::new();
        doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        let mut guard = self.inner.write().expect("rwlock poisoned");
        guard.entry(collection).or_default().push((id, doc));
        Ok(InsertOneResult {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<SortDesc>,
    ) -> StoreResult<Vec<Document>> {
        let guard = self.inner.read().expect("rwlock poisoned");
        let mut docs: Vec<Document> = guard
            .get(&collection)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(_, doc)| filter.matches(doc))
                    .map(|(_, doc)| doc.clone())
                    .collect()
            })
            .unwrap_or_default();

        if let Some(SortDesc(field)) = sort {
            // Stable, so ties keep insertion order.
            docs.sort_by(|a, b| compare_desc(a.get(field), b.get(field)));
        }
        Ok(docs)
    }

    async fn find_one(&self, collection: Collection, filter: &Filter) -> StoreResult<Option<Document>> {
        let guard = self.inner.read().expect("rwlock poisoned");
        Ok(guard
            .get(&collection)
            .and_then(|entries| entries.iter().find(|(_, doc)| filter.matches(doc)))
            .map(|(_, doc)| doc.clone()))
    }

    async fn update_by_id(&self, collection: Collection, id: &str, set: Document) -> StoreResult<UpdateResult> {
        let id: DocumentId = id.parse()?;
        let mut guard = self.inner.write().expect("rwlock poisoned");
        let Some((_, doc)) = guard
            .get_mut(&collection)
            .and_then(|entries| entries.iter_mut().find(|(entry_id, _)| *entry_id == id))
        else {
            return Ok(UpdateResult::new(0, 0));
        };

        let mut modified = false;
        for (field, value) in set {
            if field == ID_FIELD {
                continue;
            }
            if doc.get(&field) != Some(&value) {
                doc.insert(field, value);
                modified = true;
            }
        }
        Ok(UpdateResult::new(1, u64::from(modified)))
    }

    async fn delete_by_id(&self, collection: Collection, id: &str) -> StoreResult<DeleteResult> {
        let id: DocumentId = id.parse()?;
        let mut guard = self.inner.write().expect("rwlock poisoned");
        let deleted_count = match guard.get_mut(&collection) {
            Some(entries) => {
                let before = entries.len();
                entries.retain(|(entry_id, _)| *entry_id != id);
                (before - entries.len()) as u64
            }
            None => 0,
        };
        Ok(DeleteResult {
            acknowledged: true,
            deleted_count,
        })
    }
}

fn compare_desc(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => compare_values(b, a),
    }
}

// Mirrors Postgres jsonb ordering closely enough for the fields we sort on:
// null < string < number < bool, values of the same kind compare naturally.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::String(_) => 1,
            Value::Number(_) => 2,
            Value::Bool(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => rank(a).cmp(&rank(b)),
    }
}
