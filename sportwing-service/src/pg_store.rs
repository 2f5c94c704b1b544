use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::info;

use crate::store::{
    Collection, DeleteResult, Document, DocumentId, DocumentStore, Filter, InsertOneResult,
    SortDesc, StoreResult, UpdateResult, ID_FIELD,
};

/// Documents live in one JSONB table keyed by `(collection, id)`, listed in
/// insertion order (`seq`).
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("document store migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// `@>` narrows through the GIN index; the `->` equality that follows keeps
// array and object values from matching by containment.
fn containment(key: &str, value: &Value) -> Document {
    let mut pattern = Document::new();
    pattern.insert(key.to_string(), value.clone());
    pattern
}

fn rows_to_documents(rows: Vec<sqlx::postgres::PgRow>) -> StoreResult<Vec<Document>> {
    rows.into_iter()
        .map(|row| -> StoreResult<Document> {
            let Json(doc): Json<Document> = row.try_get("doc")?;
            Ok(doc)
        })
        .collect()
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert_one(&self, collection: Collection, mut doc: Document) -> StoreResult<InsertOneResult> {
        let id = DocumentId::new();
        doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));

        sqlx::query("INSERT INTO documents (collection, id, doc) VALUES ($1, $2, $3)")
            .bind(collection.name())
            .bind(id.as_uuid())
            .bind(Json(&doc))
            .execute(&self.pool)
            .await?;

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
        let rows = match (filter, sort) {
            (Filter::All, None) => {
                sqlx::query("SELECT doc FROM documents WHERE collection = $1 ORDER BY seq")
                    .bind(collection.name())
                    .fetch_all(&self.pool)
                    .await?
            }
            (Filter::All, Some(SortDesc(field))) => {
                sqlx::query(
                    "SELECT doc FROM documents WHERE collection = $1
                     ORDER BY doc -> $2 DESC NULLS LAST, seq",
                )
                .bind(collection.name())
                .bind(field)
                .fetch_all(&self.pool)
                .await?
            }
            (Filter::Eq(key, value), None) => {
                sqlx::query(
                    "SELECT doc FROM documents
                     WHERE collection = $1 AND doc @> $2 AND doc -> $3 = $4
                     ORDER BY seq",
                )
                .bind(collection.name())
                .bind(Json(containment(key, value)))
                .bind(*key)
                .bind(Json(value))
                .fetch_all(&self.pool)
                .await?
            }
            (Filter::Eq(key, value), Some(SortDesc(field))) => {
                sqlx::query(
                    "SELECT doc FROM documents
                     WHERE collection = $1 AND doc @> $3 AND doc -> $4 = $5
                     ORDER BY doc -> $2 DESC NULLS LAST, seq",
                )
                .bind(collection.name())
                .bind(field)
                .bind(Json(containment(key, value)))
                .bind(*key)
                .bind(Json(value))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows_to_documents(rows)
    }

    async fn find_one(&self, collection: Collection, filter: &Filter) -> StoreResult<Option<Document>> {
        let row = match filter {
            Filter::All => {
                sqlx::query("SELECT doc FROM documents WHERE collection = $1 ORDER BY seq LIMIT 1")
                    .bind(collection.name())
                    .fetch_optional(&self.pool)
                    .await?
            }
            Filter::Eq(key, value) => {
                sqlx::query(
                    "SELECT doc FROM documents
                     WHERE collection = $1 AND doc @> $2 AND doc -> $3 = $4
                     ORDER BY seq LIMIT 1",
                )
                .bind(collection.name())
                .bind(Json(containment(key, value)))
                .bind(*key)
                .bind(Json(value))
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(rows_to_documents(row.into_iter().collect())?.pop())
    }

    async fn update_by_id(&self, collection: Collection, id: &str, mut set: Document) -> StoreResult<UpdateResult> {
        let id: DocumentId = id.parse()?;
        set.remove(ID_FIELD);

        // `@>` on a flat patch of scalars is field equality, so an unchanged
        // document is matched but not modified.
        let row = sqlx::query(
            r#"WITH target AS (
                   SELECT id, doc FROM documents
                   WHERE collection = $1 AND id = $2
                   FOR UPDATE
               ),
               updated AS (
                   UPDATE documents d
                   SET doc = d.doc || $3
                   FROM target t
                   WHERE d.collection = $1 AND d.id = t.id AND NOT (t.doc @> $3)
                   RETURNING d.id
               )
               SELECT (SELECT count(*) FROM target) AS matched,
                      (SELECT count(*) FROM updated) AS modified"#,
        )
        .bind(collection.name())
        .bind(id.as_uuid())
        .bind(Json(&set))
        .fetch_one(&self.pool)
        .await?;

        let matched: i64 = row.try_get("matched")?;
        let modified: i64 = row.try_get("modified")?;
        Ok(UpdateResult::new(matched as u64, modified as u64))
    }

    async fn delete_by_id(&self, collection: Collection, id: &str) -> StoreResult<DeleteResult> {
        let id: DocumentId = id.parse()?;
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.name())
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: result.rows_affected(),
        })
    }
}
