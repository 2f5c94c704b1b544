use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{Map, Value};

use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};

/// Signs client-supplied claim payloads into HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    config: JwtConfig,
    encoding_key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
        }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub fn issue(&self, claims: Map<String, Value>) -> AuthResult<String> {
        self.issue_at(claims, Utc::now())
    }

    /// Signs `claims` as if issued at `now`. Any `iat`/`exp` in the payload is replaced.
    pub fn issue_at(&self, mut claims: Map<String, Value>, now: DateTime<Utc>) -> AuthResult<String> {
        let expires_at = now + Duration::seconds(self.config.ttl_seconds);
        claims.insert("iat".to_string(), Value::from(now.timestamp()));
        claims.insert("exp".to_string(), Value::from(expires_at.timestamp()));

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Signing(err.to_string()))
    }
}
