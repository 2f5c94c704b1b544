use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use tracing::debug;

use crate::claims::Claims;
use crate::config::JwtConfig;
use crate::error::AuthResult;

#[derive(Clone)]
pub struct JwtVerifier {
    config: JwtConfig,
    decoding_key: DecodingKey,
}

impl JwtVerifier {
    pub fn new(config: JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            decoding_key,
        }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.config.leeway_seconds.into();
        // Tokens carry whatever the client asked for, audience included.
        validation.validate_aud = false;

        let token_data = decode::<Value>(token, &self.decoding_key, &validation)?;
        let claims = Claims::try_from(token_data.claims)?;
        debug!(email = ?claims.email, "verified JWT successfully");
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::issuer::TokenIssuer;
    use chrono::{Duration, Utc};
    use serde_json::{json, Map};

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object payload")
    }

    fn pair(secret: &str) -> (TokenIssuer, JwtVerifier) {
        let config = JwtConfig::new(secret);
        (TokenIssuer::new(config.clone()), JwtVerifier::new(config))
    }

    #[test]
    fn issued_token_round_trips_email() {
        let (issuer, verifier) = pair("test-secret");
        let token = issuer.issue(payload(json!({ "email": "a@x.com" }))).expect("token");
        let claims = verifier.verify(&token).expect("verification succeeds");

        assert_eq!(claims.email.as_deref(), Some("a@x.com"));
        let issued_at = claims.issued_at.expect("iat");
        assert_eq!((claims.expires_at - issued_at).num_seconds(), 5 * 60 * 60);
    }

    #[test]
    fn token_is_valid_just_inside_the_window() {
        let (issuer, verifier) = pair("test-secret");
        let issued = Utc::now() - Duration::hours(5) + Duration::minutes(1);
        let token = issuer
            .issue_at(payload(json!({ "email": "a@x.com" })), issued)
            .expect("token");
        assert!(verifier.verify(&token).is_ok());
    }

    #[test]
    fn token_expires_after_five_hours() {
        let (issuer, verifier) = pair("test-secret");
        let issued = Utc::now() - Duration::hours(5) - Duration::minutes(5);
        let token = issuer
            .issue_at(payload(json!({ "email": "a@x.com" })), issued)
            .expect("token");
        let err = verifier.verify(&token).expect_err("expired token");
        assert!(matches!(err, AuthError::Verification(_)));
    }

    #[test]
    fn token_is_rejected_seconds_after_expiry() {
        let (issuer, verifier) = pair("test-secret");
        let issued = Utc::now() - Duration::hours(5) - Duration::seconds(5);
        let token = issuer
            .issue_at(payload(json!({ "email": "a@x.com" })), issued)
            .expect("token");
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::Verification(_))
        ));
    }

    #[test]
    fn leeway_is_opt_in() {
        let config = JwtConfig::new("test-secret");
        assert_eq!(config.leeway_seconds, 0);

        let issuer = TokenIssuer::new(config.clone());
        let lenient = JwtVerifier::new(config.with_leeway(60));
        let issued = Utc::now() - Duration::hours(5) - Duration::seconds(20);
        let token = issuer
            .issue_at(payload(json!({ "email": "a@x.com" })), issued)
            .expect("token");
        assert!(lenient.verify(&token).is_ok());
    }

    #[test]
    fn client_supplied_exp_is_overridden() {
        let (issuer, verifier) = pair("test-secret");
        let token = issuer
            .issue(payload(json!({ "email": "a@x.com", "exp": 1 })))
            .expect("token");
        let claims = verifier.verify(&token).expect("fresh exp wins");
        assert!(claims.expires_at > Utc::now());
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let (issuer, _) = pair("one-secret");
        let (_, verifier) = pair("another-secret");
        let token = issuer.issue(payload(json!({ "email": "a@x.com" }))).expect("token");
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::Verification(_))
        ));
    }

    #[test]
    fn rejects_garbage() {
        let (_, verifier) = pair("test-secret");
        assert!(verifier.verify("not-a-token").is_err());
        assert!(verifier.verify("").is_err());
    }
}
