//! Behaviour every `DocumentStore` must share. Each case runs against the
//! in-memory store, and against Postgres when `TEST_DATABASE_URL` is set.

use serde_json::{json, Value};
use sportwing_service::pg_store::PgDocumentStore;
use sportwing_service::store::{
    Collection, Document, DocumentId, DocumentStore, Filter, SortDesc, StoreError,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use uuid::Uuid;

fn doc(value: Value) -> Document {
    value.as_object().cloned().expect("object")
}

async fn insert(store: &dyn DocumentStore, collection: Collection, value: Value) -> String {
    store
        .insert_one(collection, doc(value))
        .await
        .unwrap()
        .inserted_id
        .to_string()
}

async fn insert_assigns_id_and_replaces_client_id(store: &dyn DocumentStore) {
    let result = store
        .insert_one(Collection::Classes, doc(json!({ "_id": "mine", "title": "Yoga" })))
        .await
        .unwrap();
    assert!(result.acknowledged);

    let stored = store
        .find_one(Collection::Classes, &Filter::eq("title", "Yoga"))
        .await
        .unwrap()
        .expect("stored");
    assert_eq!(stored["_id"], json!(result.inserted_id.to_string()));
    assert!(store
        .find_one(Collection::Users, &Filter::All)
        .await
        .unwrap()
        .is_none());
}

async fn update_reports_matched_and_modified(store: &dyn DocumentStore) {
    let id = insert(store, Collection::Classes, json!({ "status": "pending", "title": "Box" })).await;

    let first = store
        .update_by_id(Collection::Classes, &id, doc(json!({ "status": "approved" })))
        .await
        .unwrap();
    assert_eq!((first.matched_count, first.modified_count), (1, 1));

    let again = store
        .update_by_id(Collection::Classes, &id, doc(json!({ "status": "approved" })))
        .await
        .unwrap();
    assert_eq!((again.matched_count, again.modified_count), (1, 0));

    let missing = store
        .update_by_id(Collection::Classes, &DocumentId::new().to_string(), doc(json!({ "status": "x" })))
        .await
        .unwrap();
    assert_eq!((missing.matched_count, missing.modified_count), (0, 0));

    let stored = store
        .find_one(Collection::Classes, &Filter::All)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["status"], "approved");
    assert_eq!(stored["title"], "Box");
    assert_eq!(stored["_id"], json!(id));
}

async fn update_cannot_move_id(store: &dyn DocumentStore) {
    let id = insert(store, Collection::Users, json!({ "email": "a@x.com" })).await;
    let result = store
        .update_by_id(Collection::Users, &id, doc(json!({ "_id": "other", "role": "admin" })))
        .await
        .unwrap();
    assert_eq!(result.modified_count, 1);

    let stored = store
        .find_one(Collection::Users, &Filter::eq("email", "a@x.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["_id"], json!(id));
    assert_eq!(stored["role"], "admin");
}

async fn malformed_ids_fail(store: &dyn DocumentStore) {
    let err = store
        .delete_by_id(Collection::BookedClasses, "not-an-id")
        .await
        .expect_err("invalid id");
    assert!(matches!(err, StoreError::InvalidId(_)));

    let err = store
        .update_by_id(Collection::Users, "42", Document::new())
        .await
        .expect_err("invalid id");
    assert!(matches!(err, StoreError::InvalidId(_)));
}

async fn delete_removes_only_the_target(store: &dyn DocumentStore) {
    let keep = insert(store, Collection::BookedClasses, json!({ "email": "a@x.com" })).await;
    let drop = insert(store, Collection::BookedClasses, json!({ "email": "a@x.com" })).await;

    let result = store.delete_by_id(Collection::BookedClasses, &drop).await.unwrap();
    assert!(result.acknowledged);
    assert_eq!(result.deleted_count, 1);

    let left = store
        .find(Collection::BookedClasses, &Filter::eq("email", "a@x.com"), None)
        .await
        .unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0]["_id"], json!(keep));

    let again = store.delete_by_id(Collection::BookedClasses, &drop).await.unwrap();
    assert_eq!(again.deleted_count, 0);

    // Same id, other collection.
    let other = store.delete_by_id(Collection::Payments, &keep).await.unwrap();
    assert_eq!(other.deleted_count, 0);
}

async fn eq_filter_matches_top_level_value_exactly(store: &dyn DocumentStore) {
    for value in [
        json!({ "email": "a@x.com", "n": 1 }),
        json!({ "email": 42, "n": 2 }),
        json!({ "email": ["a@x.com", "b@x.com"], "n": 3 }),
        json!({ "nested": { "email": "a@x.com" }, "n": 4 }),
        json!({ "email": "a@x.com", "n": 5 }),
    ] {
        insert(store, Collection::BookedClasses, value).await;
    }

    let found = store
        .find(Collection::BookedClasses, &Filter::eq("email", "a@x.com"), None)
        .await
        .unwrap();
    let ns: Vec<&Value> = found.iter().map(|d| &d["n"]).collect();
    assert_eq!(ns, vec![&json!(1), &json!(5)]);

    let numeric = store
        .find(Collection::BookedClasses, &Filter::eq("email", 42), None)
        .await
        .unwrap();
    assert_eq!(numeric.len(), 1);
    assert_eq!(numeric[0]["n"], 2);

    let array = store
        .find(Collection::BookedClasses, &Filter::eq("email", json!(["a@x.com"])), None)
        .await
        .unwrap();
    assert!(array.is_empty(), "containment is not equality");
}

async fn unfiltered_find_keeps_insertion_order(store: &dyn DocumentStore) {
    for n in 0..5 {
        insert(store, Collection::Classes, json!({ "n": n })).await;
    }
    let docs = store.find(Collection::Classes, &Filter::All, None).await.unwrap();
    let ns: Vec<i64> = docs.iter().map(|d| d["n"].as_i64().unwrap()).collect();
    assert_eq!(ns, vec![0, 1, 2, 3, 4]);
}

async fn sort_desc_puts_null_then_missing_last(store: &dyn DocumentStore) {
    for value in [
        json!({ "date": "2024-01-02", "n": 1 }),
        json!({ "n": 2 }),
        json!({ "date": null, "n": 3 }),
        json!({ "date": "2024-03-01", "n": 4 }),
        json!({ "date": "2024-01-02", "n": 5 }),
    ] {
        insert(store, Collection::Payments, value).await;
    }

    let docs = store
        .find(Collection::Payments, &Filter::All, Some(SortDesc("date")))
        .await
        .unwrap();
    let ns: Vec<i64> = docs.iter().map(|d| d["n"].as_i64().unwrap()).collect();
    assert_eq!(ns, vec![4, 1, 5, 3, 2]);
    assert!(docs[3].contains_key("date"), "explicit null is kept");
    assert!(!docs[4].contains_key("date"));
}

async fn filtered_sort_combines_both(store: &dyn DocumentStore) {
    for value in [
        json!({ "email": "a@x.com", "date": "2024-01-01" }),
        json!({ "email": "b@x.com", "date": "2024-06-01" }),
        json!({ "email": "a@x.com", "date": "2024-02-01" }),
    ] {
        insert(store, Collection::Payments, value).await;
    }

    let docs = store
        .find(Collection::Payments, &Filter::eq("email", "a@x.com"), Some(SortDesc("date")))
        .await
        .unwrap();
    let dates: Vec<&Value> = docs.iter().map(|d| &d["date"]).collect();
    assert_eq!(dates, vec![&json!("2024-02-01"), &json!("2024-01-01")]);
}

/// One throwaway schema per test, migrated from scratch.
struct TestDb {
    admin: PgPool,
    schema: String,
    store: PgDocumentStore,
}

impl TestDb {
    async fn start() -> Option<Self> {
        let url = match std::env::var("TEST_DATABASE_URL") {
            Ok(v) => v,
            Err(_) => {
                eprintln!("SKIP pg store contract: TEST_DATABASE_URL not set");
                return None;
            }
        };
        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .expect("connect test db");
        let schema = format!("sportwing_test_{}", Uuid::new_v4().simple());
        sqlx::query(&format!("CREATE SCHEMA {schema}"))
            .execute(&admin)
            .await
            .expect("create schema");

        let search_path = format!("SET search_path TO {schema}");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .after_connect(move |conn, _meta| {
                let search_path = search_path.clone();
                Box::pin(async move {
                    conn.execute(search_path.as_str()).await?;
                    Ok(())
                })
            })
            .connect(&url)
            .await
            .expect("connect test schema");

        let store = PgDocumentStore::new(pool);
        store.migrate().await.expect("migrate");
        Some(Self { admin, schema, store })
    }

    async fn finish(self) {
        self.store.pool().close().await;
        let _ = sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await;
    }
}

macro_rules! store_contract {
    ($($case:ident),* $(,)?) => {
        mod memory {
            $(
                #[tokio::test]
                async fn $case() {
                    let store = sportwing_service::memory_store::MemoryStore::new();
                    super::$case(&store).await;
                }
            )*
        }

        mod postgres {
            $(
                #[tokio::test]
                async fn $case() {
                    let Some(db) = super::TestDb::start().await else { return };
                    super::$case(&db.store).await;
                    db.finish().await;
                }
            )*
        }
    };
}

store_contract!(
    insert_assigns_id_and_replaces_client_id,
    update_reports_matched_and_modified,
    update_cannot_move_id,
    malformed_ids_fail,
    delete_removes_only_the_target,
    eq_filter_matches_top_level_value_exactly,
    unfiltered_find_keeps_insertion_order,
    sort_desc_puts_null_then_missing_last,
    filtered_sort_combines_both,
);
