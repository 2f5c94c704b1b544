use axum::{
    extract::{Path, State},
    Json,
};
use common_auth::AuthContext;
use common_http_errors::{ApiError, ApiJson, ApiResult};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::guards::require_admin;
use crate::repo;
use crate::store::{Document, InsertOneResult, UpdateResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    #[serde(default)]
    pub class_id: Value,
    #[serde(default)]
    pub feedback: Value,
}

/// A class id as the store will see it; non-string ids never parse.
fn class_id_text(id: &Value) -> String {
    match id {
        Value::String(id) => id.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub async fn create_class(
    State(state): State<AppState>,
    ApiJson(class): ApiJson<Document>,
) -> ApiResult<Json<InsertOneResult>> {
    let result = repo::insert_class(state.store.as_ref(), class)
        .await
        .map_err(|err| {
            error!(error = %err, "Error creating class");
            ApiError::internal("Failed to create class")
        })?;
    Ok(Json(result))
}

pub async fn list_classes(State(state): State<AppState>) -> ApiResult<Json<Vec<Document>>> {
    let classes = repo::list_classes(state.store.as_ref()).await.map_err(|err| {
        error!(error = %err, "Error listing classes");
        ApiError::internal("Failed to retrieve classes")
    })?;
    Ok(Json(classes))
}

/// `PATCH /classes/:id`, admins only.
pub async fn update_class_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> ApiResult<Json<UpdateResult>> {
    require_admin(state.store.as_ref(), &auth).await?;

    let status = update.status;
    let result = repo::set_class_status(state.store.as_ref(), &id, status.clone())
        .await
        .map_err(|err| {
            error!(error = %err, id = %id, "Error updating class status");
            ApiError::internal("Failed to update class status")
        })?;
    info!(id = %id, %status, modified = result.modified_count, "class status updated");
    Ok(Json(result))
}

pub async fn submit_feedback(
    State(state): State<AppState>,
    _auth: AuthContext,
    ApiJson(request): ApiJson<FeedbackRequest>,
) -> ApiResult<Json<UpdateResult>> {
    // A missing classId is left for the store to reject like any malformed id.
    let class_id = class_id_text(&request.class_id);
    let result = repo::set_class_feedback(state.store.as_ref(), &class_id, request.feedback)
        .await
        .map_err(|err| {
            error!(error = %err, class_id = %class_id, "Error submitting feedback");
            ApiError::internal("Failed to submit feedback")
        })?;
    Ok(Json(result))
}
