use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use common_auth::{AuthContext, Role};
use common_http_errors::{ApiError, ApiJson, ApiResult};
use serde::Serialize;
use tracing::{error, info};

use crate::repo;
use crate::store::{Document, UpdateResult, ID_FIELD};
use crate::AppState;

pub const USER_EXISTS_MESSAGE: &str = "User Already Exists";

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AdminCheck {
    pub admin: bool,
}

#[derive(Debug, Serialize)]
pub struct InstructorCheck {
    pub instructor: bool,
}

#[derive(Debug, Serialize)]
pub struct StudentCheck {
    pub student: bool,
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<Document>>> {
    let users = repo::list_users(state.store.as_ref()).await.map_err(|err| {
        error!(error = %err, "Error listing users");
        ApiError::internal("Failed to retrieve users")
    })?;
    Ok(Json(users))
}

/// Inserts the user unless one with the same email exists. New users never
/// carry a role; roles are granted through the promotion routes only.
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(mut user): ApiJson<Document>,
) -> ApiResult<Response> {
    let store = state.store.as_ref();

    if let Some(email) = user.get("email").cloned() {
        let existing = repo::find_user_by_email(store, email.clone()).await.map_err(|err| {
            error!(error = %err, %email, "Error looking up user");
            ApiError::internal("Failed to create user")
        })?;
        if existing.is_some() {
            return Ok(Json(MessageResponse {
                message: USER_EXISTS_MESSAGE,
            })
            .into_response());
        }
    }

    user.remove(ID_FIELD);
    user.remove("role");
    let result = repo::insert_user(store, user).await.map_err(|err| {
        error!(error = %err, "Error creating user");
        ApiError::internal("Failed to create user")
    })?;
    info!(user_id = %result.inserted_id, "created user");
    Ok(Json(result).into_response())
}

/// Whether the user behind `email` holds `role`. Asking about anyone other
/// than the token's own email is answered `false` without a lookup.
async fn has_role(state: &AppState, auth: &AuthContext, email: &str, role: Role) -> ApiResult<bool> {
    if !auth.is_for(email) {
        return Ok(false);
    }

    let user = repo::find_user_by_email(state.store.as_ref(), email)
        .await
        .map_err(|err| {
            error!(error = %err, email, %role, "Error checking role");
            ApiError::internal("Failed to check role")
        })?;
    Ok(user.is_some_and(|user| user.has_role(role)))
}

pub async fn check_admin(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(email): Path<String>,
) -> ApiResult<Json<AdminCheck>> {
    let admin = has_role(&state, &auth, &email, Role::Admin).await?;
    Ok(Json(AdminCheck { admin }))
}

pub async fn check_instructor(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(email): Path<String>,
) -> ApiResult<Json<InstructorCheck>> {
    let instructor = has_role(&state, &auth, &email, Role::Instructor).await?;
    Ok(Json(InstructorCheck { instructor }))
}

pub async fn check_student(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(email): Path<String>,
) -> ApiResult<Json<StudentCheck>> {
    let student = has_role(&state, &auth, &email, Role::Student).await?;
    Ok(Json(StudentCheck { student }))
}

// Unguarded: any caller can promote any user id.
async fn promote(state: &AppState, id: &str, role: Role) -> ApiResult<Json<UpdateResult>> {
    let result = repo::set_user_role(state.store.as_ref(), id, role)
        .await
        .map_err(|err| {
            error!(error = %err, id, %role, "Error promoting user");
            ApiError::internal("Failed to update user role")
        })?;
    info!(id, %role, matched = result.matched_count, "user role updated");
    Ok(Json(result))
}

pub async fn make_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<UpdateResult>> {
    promote(&state, &id, Role::Admin).await
}

pub async fn make_instructor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<UpdateResult>> {
    promote(&state, &id, Role::Instructor).await
}
