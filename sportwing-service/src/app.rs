use std::sync::Arc;

use axum::extract::FromRef;
use axum::http::{header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE}, HeaderValue, Method};
use axum::routing::{delete, get, patch, post};
use axum::{middleware, Router};
use common_auth::{JwtConfig, JwtVerifier, TokenIssuer};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::booking_handlers::{create_booking, delete_booking, list_bookings};
use crate::class_handlers::{create_class, list_classes, submit_feedback, update_class_status};
use crate::gateway::PaymentProcessor;
use crate::metrics::{render_metrics, track_http_errors, ServiceMetrics};
use crate::payment_handlers::{create_payment_intent, list_payments, record_payment};
use crate::store::DocumentStore;
use crate::token_handlers::issue_token;
use crate::user_handlers::{
    check_admin, check_instructor, check_student, create_user, list_users, make_admin,
    make_instructor,
};

pub const LIVENESS_MESSAGE: &str = "SportWing is Running";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub jwt_verifier: Arc<JwtVerifier>,
    pub token_issuer: Arc<TokenIssuer>,
    pub payments: Arc<dyn PaymentProcessor>,
    pub currency: String,
    pub metrics: ServiceMetrics,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        jwt_config: JwtConfig,
        payments: Arc<dyn PaymentProcessor>,
        currency: impl Into<String>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            store,
            jwt_verifier: Arc::new(JwtVerifier::new(jwt_config.clone())),
            token_issuer: Arc::new(TokenIssuer::new(jwt_config)),
            payments,
            currency: currency.into(),
            metrics: ServiceMetrics::new()?,
        })
    }
}

impl FromRef<AppState> for Arc<JwtVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_verifier.clone()
    }
}

impl FromRef<AppState> for ServiceMetrics {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

impl FromRef<AppState> for Arc<TokenIssuer> {
    fn from_ref(state: &AppState) -> Self {
        state.token_issuer.clone()
    }
}

async fn liveness() -> &'static str {
    LIVENESS_MESSAGE
}

/// Every route of the service. Auth requirements live in each handler's extractors.
pub fn router(state: AppState) -> Router {
    let metrics = state.metrics.clone();
    Router::new()
        .route("/", get(liveness))
        .route("/metrics", get(render_metrics))
        .route("/jwt", post(issue_token))
        .route("/bookedClass", post(create_booking).get(list_bookings))
        .route("/bookedClass/:id", delete(delete_booking))
        .route("/users", get(list_users).post(create_user))
        .route("/users/admin/:key", get(check_admin).patch(make_admin))
        .route("/users/instructor/:key", get(check_instructor).patch(make_instructor))
        .route("/users/student/:email", get(check_student))
        .route("/classes", post(create_class).get(list_classes))
        .route("/classes/:id", patch(update_class_status))
        .route("/feedback", post(submit_feedback))
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/payments", post(record_payment).get(list_payments))
        .with_state(state)
        .layer(middleware::from_fn_with_state(metrics, track_http_errors))
}

pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE, AUTHORIZATION]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    cors.allow_origin(AllowOrigin::list(
        allowed_origins
            .iter()
            .filter_map(|origin| origin.parse::<HeaderValue>().ok())
            .collect::<Vec<_>>(),
    ))
}
