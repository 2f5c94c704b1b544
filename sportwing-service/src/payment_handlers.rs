use axum::{extract::State, Json};
use common_auth::AuthContext;
use common_http_errors::{ApiError, ApiJson, ApiResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::gateway::{minor_units, IntentRequest};
use crate::repo;
use crate::store::{Document, InsertOneResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct IntentBody {
    #[serde(default)]
    pub price: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    pub client_secret: String,
}

/// Creates a card payment intent for `price` major units in the configured currency.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    _auth: AuthContext,
    ApiJson(body): ApiJson<IntentBody>,
) -> ApiResult<Json<IntentResponse>> {
    let Some(amount_minor) = minor_units(&body.price) else {
        warn!(price = %body.price, "payment intent requested with non-numeric price");
        state.metrics.payment_intent("invalid_price");
        return Err(ApiError::internal("Failed to create payment intent"));
    };

    let request = IntentRequest {
        amount_minor,
        currency: state.currency.clone(),
    };
    let intent = state
        .payments
        .create_card_intent(&request)
        .await
        .map_err(|err| {
            error!(error = %err, amount_minor, "Error creating payment intent");
            state.metrics.payment_intent("processor_error");
            ApiError::internal("Failed to create payment intent")
        })?;

    state.metrics.payment_intent("created");
    info!(intent_id = %intent.id, amount_minor, currency = %request.currency, "payment intent created");
    Ok(Json(IntentResponse {
        client_secret: intent.client_secret,
    }))
}

/// Stores the client's payment record as sent. Nothing here ties it to a
/// confirmed charge at the processor.
pub async fn record_payment(
    State(state): State<AppState>,
    _auth: AuthContext,
    ApiJson(payment): ApiJson<Document>,
) -> ApiResult<Json<InsertOneResult>> {
    let result = repo::insert_payment(state.store.as_ref(), payment)
        .await
        .map_err(|err| {
            error!(error = %err, "Error recording payment");
            ApiError::internal("Failed to record payment")
        })?;
    Ok(Json(result))
}

pub async fn list_payments(
    State(state): State<AppState>,
    _auth: AuthContext,
) -> ApiResult<Json<Vec<Document>>> {
    let payments = repo::list_payments(state.store.as_ref()).await.map_err(|err| {
        error!(error = %err, "Error retrieving payment history");
        ApiError::internal("Failed to retrieve payment history")
    })?;
    Ok(Json(payments))
}
