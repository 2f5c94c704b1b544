use axum::{
    extract::{Path, Query, State},
    Json,
};
use common_http_errors::{ApiError, ApiJson, ApiResult};
use serde::Deserialize;
use tracing::error;

use crate::repo;
use crate::store::{DeleteResult, Document, InsertOneResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BookingQuery {
    pub email: Option<String>,
}

pub async fn create_booking(
    State(state): State<AppState>,
    ApiJson(booking): ApiJson<Document>,
) -> ApiResult<Json<InsertOneResult>> {
    let result = repo::insert_booking(state.store.as_ref(), booking)
        .await
        .map_err(|err| {
            error!(error = %err, "Error booking class");
            ApiError::internal("Failed to book class")
        })?;
    Ok(Json(result))
}

/// Bookings for `?email=`; no email means no bookings.
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let Some(email) = query.email.filter(|email| !email.is_empty()) else {
        return Ok(Json(Vec::new()));
    };

    let bookings = repo::bookings_for_email(state.store.as_ref(), &email)
        .await
        .map_err(|err| {
            error!(error = %err, email = %email, "Error retrieving booked classes");
            ApiError::internal("Failed to retrieve booked classes")
        })?;
    Ok(Json(bookings))
}

pub async fn delete_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResult>> {
    let result = repo::delete_booking(state.store.as_ref(), &id)
        .await
        .map_err(|err| {
            error!(error = %err, id = %id, "Error deleting booked class");
            ApiError::internal("Failed to delete booked class")
        })?;
    Ok(Json(result))
}
