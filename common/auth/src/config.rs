use std::fmt;

/// Default token lifetime: five hours.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 5 * 60 * 60;

/// Runtime configuration shared by the token issuer and verifier.
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC secret used to sign and verify tokens.
    pub secret: String,
    /// Lifetime stamped into `exp` at issue time.
    pub ttl_seconds: i64,
    /// Allowable clock skew in seconds when validating exp. Zero unless opted in.
    pub leeway_seconds: u32,
}

impl JwtConfig {
    /// Five hour lifetime, no leeway: a token is dead the second `exp` passes.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            leeway_seconds: 0,
        }
    }

    pub fn with_ttl(mut self, seconds: i64) -> Self {
        self.ttl_seconds = seconds;
        self
    }

    /// Adjust the allowed leeway.
    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds;
        self
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("ttl_seconds", &self.ttl_seconds)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}
