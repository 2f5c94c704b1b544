use common_auth::Role;
use serde_json::Value;

use crate::models::{from_document, User};
use crate::store::{
    Collection, DeleteResult, Document, DocumentStore, Filter, InsertOneResult, SortDesc,
    StoreResult, UpdateResult,
};

/// Payment history is ordered on this field, newest first.
pub const PAYMENT_SORT_FIELD: &str = "date";

fn set_one(field: &str, value: Value) -> Document {
    let mut set = Document::new();
    set.insert(field.to_string(), value);
    set
}

pub async fn find_user_by_email(
    store: &dyn DocumentStore,
    email: impl Into<Value>,
) -> StoreResult<Option<User>> {
    store
        .find_one(Collection::Users, &Filter::eq("email", email))
        .await?
        .map(from_document::<User>)
        .transpose()
}

pub async fn list_users(store: &dyn DocumentStore) -> StoreResult<Vec<Document>> {
    store.find(Collection::Users, &Filter::All, None).await
}

pub async fn insert_user(store: &dyn DocumentStore, user: Document) -> StoreResult<InsertOneResult> {
    store.insert_one(Collection::Users, user).await
}

pub async fn set_user_role(store: &dyn DocumentStore, id: &str, role: Role) -> StoreResult<UpdateResult> {
    store
        .update_by_id(Collection::Users, id, set_one("role", Value::from(role.as_str())))
        .await
}

pub async fn insert_class(store: &dyn DocumentStore, class: Document) -> StoreResult<InsertOneResult> {
    store.insert_one(Collection::Classes, class).await
}

pub async fn list_classes(store: &dyn DocumentStore) -> StoreResult<Vec<Document>> {
    store.find(Collection::Classes, &Filter::All, None).await
}

pub async fn set_class_status(store: &dyn DocumentStore, id: &str, status: Value) -> StoreResult<UpdateResult> {
    store
        .update_by_id(Collection::Classes, id, set_one("status", status))
        .await
}

pub async fn set_class_feedback(store: &dyn DocumentStore, id: &str, feedback: Value) -> StoreResult<UpdateResult> {
    store
        .update_by_id(Collection::Classes, id, set_one("feedback", feedback))
        .await
}

pub async fn insert_booking(store: &dyn DocumentStore, booking: Document) -> StoreResult<InsertOneResult> {
    store.insert_one(Collection::BookedClasses, booking).await
}

pub async fn bookings_for_email(store: &dyn DocumentStore, email: &str) -> StoreResult<Vec<Document>> {
    store
        .find(Collection::BookedClasses, &Filter::eq("email", email), None)
        .await
}

pub async fn delete_booking(store: &dyn DocumentStore, id: &str) -> StoreResult<DeleteResult> {
    store.delete_by_id(Collection::BookedClasses, id).await
}

pub async fn insert_payment(store: &dyn DocumentStore, payment: Document) -> StoreResult<InsertOneResult> {
    store.insert_one(Collection::Payments, payment).await
}

pub async fn list_payments(store: &dyn DocumentStore) -> StoreResult<Vec<Document>> {
    store
        .find(Collection::Payments, &Filter::All, Some(SortDesc(PAYMENT_SORT_FIELD)))
        .await
}
