use anyhow::Result;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use common_http_errors::{ApiError, ERROR_CODE_HEADER};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::warn;

pub const SERVICE_NAME: &str = "sportwing-service";

/// Counters owned by one router instance, exposed at `GET /metrics`.
#[derive(Clone)]
pub struct ServiceMetrics {
    registry: Registry,
    http_errors: IntCounterVec,
    payment_intents: IntCounterVec,
}

impl ServiceMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_errors = IntCounterVec::new(
            Opts::new(
                "http_errors_total",
                "Count of HTTP error responses emitted (status >= 400)",
            ),
            &["service", "code", "status"],
        )?;
        registry.register(Box::new(http_errors.clone()))?;

        let payment_intents = IntCounterVec::new(
            Opts::new(
                "payment_intents_total",
                "Payment intent requests grouped by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(payment_intents.clone()))?;

        Ok(Self {
            registry,
            http_errors,
            payment_intents,
        })
    }

    /// Records an error response; `code` is the `X-Error-Code` it carried.
    pub fn http_error(&self, status: StatusCode, code: &str) {
        self.http_errors
            .with_label_values(&[SERVICE_NAME, code, status.as_str()])
            .inc();
    }

    /// `created`, `invalid_price` or `processor_error`.
    pub fn payment_intent(&self, outcome: &str) {
        self.payment_intents.with_label_values(&[outcome]).inc();
    }

    pub fn render(&self) -> Result<Response> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )
            .body(Body::from(buffer))?;
        Ok(response)
    }
}

/// Counts every response with status >= 400, keyed by its error code.
/// Responses that bypassed `ApiError` are counted as `unknown`.
pub async fn track_http_errors(
    State(metrics): State<ServiceMetrics>,
    req: Request,
    next: Next,
) -> Response {
    let resp = next.run(req).await;
    let status = resp.status();
    if status.is_client_error() || status.is_server_error() {
        let code = resp
            .headers()
            .get(ERROR_CODE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        metrics.http_error(status, code);
    }
    resp
}

pub async fn render_metrics(State(metrics): State<ServiceMetrics>) -> Response {
    match metrics.render() {
        Ok(resp) => resp,
        Err(err) => {
            warn!(error = %err, "failed to encode metrics");
            ApiError::internal("Failed to render metrics").into_response()
        }
    }
}
