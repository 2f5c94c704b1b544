use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};

use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};
use crate::verifier::JwtVerifier;

/// Verified caller. Naming it in a handler's arguments is what makes the
/// route require a token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub claims: Claims,
}

impl AuthContext {
    pub fn email(&self) -> Option<&str> {
        self.claims.email.as_deref()
    }

    /// True when the caller's token was issued for `email`.
    pub fn is_for(&self, email: &str) -> bool {
        self.claims.is_for(email)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = Arc::<JwtVerifier>::from_ref(state).verify(token)?;
        Ok(Self { claims })
    }
}

/// `Authorization: <scheme> <token>` with a case-insensitive `bearer` scheme
/// and exactly one non-empty token.
fn bearer_token(headers: &HeaderMap) -> AuthResult<&str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthorization)?;

    let (scheme, token) = value
        .to_str()
        .ok()
        .and_then(|raw| raw.trim().split_once(' '))
        .ok_or(AuthError::InvalidAuthorization)?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return Err(AuthError::InvalidAuthorization);
    }
    Ok(token)
}
