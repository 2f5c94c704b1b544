use axum::{extract::State, Json};
use common_http_errors::{ApiError, ApiJson, ApiResult};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// `POST /jwt`: signs whatever claims the client sends (normally `{email}`).
pub async fn issue_token(
    State(state): State<AppState>,
    ApiJson(claims): ApiJson<Map<String, Value>>,
) -> ApiResult<Json<TokenResponse>> {
    let email = claims.get("email").and_then(Value::as_str).map(str::to_owned);
    let token = state.token_issuer.issue(claims).map_err(|err| {
        error!(error = %err, "failed to sign token");
        ApiError::from(err)
    })?;
    info!(email = ?email, "issued access token");
    Ok(Json(TokenResponse { token }))
}
