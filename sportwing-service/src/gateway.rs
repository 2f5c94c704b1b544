use std::str::FromStr;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use bigdecimal::{BigDecimal, ToPrimitive};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRequest {
    pub amount_minor: i64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIntent {
    pub id: String,
    pub client_secret: String,
}

#[async_trait::async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Creates a card payment intent and returns its client confirmation secret.
    async fn create_card_intent(&self, request: &IntentRequest) -> Result<CreatedIntent>;
}

/// Converts a major-unit price into minor units (×100, rounded to the nearest unit).
/// Anything that is not a JSON number or numeric string has no amount.
pub fn minor_units(price: &Value) -> Option<i64> {
    let decimal = match price {
        Value::Number(number) => BigDecimal::from_str(&number.to_string()).ok()?,
        Value::String(raw) => BigDecimal::from_str(raw.trim()).ok()?,
        _ => return None,
    };
    (decimal * BigDecimal::from(100i64)).round(0).to_i64()
}

pub struct StripeProcessor {
    client: Client,
    secret_key: String,
    base_url: String,
}

impl StripeProcessor {
    pub fn with_base_url(client: Client, secret_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            secret_key: secret_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize)]
struct StripeIntent {
    id: String,
    client_secret: Option<String>,
}

#[async_trait::async_trait]
impl PaymentProcessor for StripeProcessor {
    async fn create_card_intent(&self, request: &IntentRequest) -> Result<CreatedIntent> {
        let url = format!("{}/v1/payment_intents", self.base_url);
        let form = [
            ("amount", request.amount_minor.to_string()),
            ("currency", request.currency.clone()),
            ("payment_method_types[]", "card".to_string()),
        ];

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .context("payment intent request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("payment processor returned HTTP {status}: {body}"));
        }

        let intent: StripeIntent = response
            .json()
            .await
            .context("failed to decode payment intent")?;
        let client_secret = intent
            .client_secret
            .ok_or_else(|| anyhow!("payment intent {} has no client_secret", intent.id))?;

        Ok(CreatedIntent {
            id: intent.id,
            client_secret,
        })
    }
}

/// Records every request and answers with a deterministic secret.
#[derive(Default)]
pub struct StubProcessor {
    requests: Mutex<Vec<IntentRequest>>,
}

impl StubProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<IntentRequest> {
        self.requests.lock().expect("mutex poisoned").clone()
    }
}

#[async_trait::async_trait]
impl PaymentProcessor for StubProcessor {
    async fn create_card_intent(&self, request: &IntentRequest) -> Result<CreatedIntent> {
        let mut requests = self.requests.lock().expect("mutex poisoned");
        requests.push(request.clone());
        let id = format!("pi_stub_{}", requests.len());
        Ok(CreatedIntent {
            client_secret: format!("{id}_secret_{}", request.amount_minor),
            id,
        })
    }
}
