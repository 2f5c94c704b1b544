use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use anyhow::{bail, Context, Result};
use common_auth::{JwtConfig, DEFAULT_TOKEN_TTL_SECONDS};

use crate::gateway::DEFAULT_STRIPE_API_BASE;

#[derive(Clone)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub access_token_secret: String,
    pub token_ttl_seconds: i64,
    pub jwt_leeway_seconds: u32,
    pub payment_secret_key: Option<String>,
    pub payment_api_base: String,
    pub payment_currency: String,
    pub cors_allowed_origins: Vec<String>,
    /// Permits the in-memory store and the stub payment processor.
    pub dev_mode: bool,
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Without `SPORTWING_DEV_MODE`, both real backends must be configured.
    pub fn ensure_backends(&self) -> Result<()> {
        if self.dev_mode {
            return Ok(());
        }
        if self.database_url.is_none() {
            bail!("DATABASE_URL must be set (or SPORTWING_DEV_MODE=1 for the in-memory store)");
        }
        if self.payment_secret_key.is_none() {
            bail!("PAYMENT_SECRET_KEY must be set (or SPORTWING_DEV_MODE=1 for stubbed payments)");
        }
        Ok(())
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::new(self.access_token_secret.clone())
            .with_ttl(self.token_ttl_seconds)
            .with_leeway(self.jwt_leeway_seconds)
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_configured", &self.database_url.is_some())
            .field("database_max_connections", &self.database_max_connections)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("jwt_leeway_seconds", &self.jwt_leeway_seconds)
            .field("payment_configured", &self.payment_secret_key.is_some())
            .field("payment_api_base", &self.payment_api_base)
            .field("payment_currency", &self.payment_currency)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("dev_mode", &self.dev_mode)
            .finish()
    }
}

pub fn load_service_config() -> Result<ServiceConfig> {
    let host = env::var("HOST")
        .unwrap_or_else(|_| "0.0.0.0".to_string())
        .parse::<IpAddr>()
        .context("HOST must be an IP address")?;
    let port = parse_from_env("PORT", 5000u16)?;

    let database_url = env::var("DATABASE_URL")
        .ok()
        .and_then(|value| normalize_optional(&value));
    let database_max_connections = parse_from_env("DATABASE_MAX_CONNECTIONS", 5u32)?;

    let access_token_secret = env::var("ACCESS_TOKEN_SECRET")
        .ok()
        .and_then(|value| normalize_optional(&value))
        .context("ACCESS_TOKEN_SECRET must be set")?;
    let token_ttl_seconds = parse_from_env("ACCESS_TOKEN_TTL_SECONDS", DEFAULT_TOKEN_TTL_SECONDS)?;
    let jwt_leeway_seconds = parse_from_env("JWT_LEEWAY_SECONDS", 0u32)?;

    let payment_secret_key = env::var("PAYMENT_SECRET_KEY")
        .ok()
        .and_then(|value| normalize_optional(&value));
    let payment_api_base =
        env::var("PAYMENT_API_BASE").unwrap_or_else(|_| DEFAULT_STRIPE_API_BASE.to_string());
    let payment_currency = env::var("PAYMENT_CURRENCY")
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_else(|_| "usd".to_string());

    let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
        .map(|value| parse_list(&value))
        .unwrap_or_default();
    let dev_mode = bool_from_env("SPORTWING_DEV_MODE").unwrap_or(false);

    let config = ServiceConfig {
        host,
        port,
        database_url,
        database_max_connections,
        access_token_secret,
        token_ttl_seconds,
        jwt_leeway_seconds,
        payment_secret_key,
        payment_api_base,
        payment_currency,
        cors_allowed_origins,
        dev_mode,
    };
    config.ensure_backends()?;
    Ok(config)
}

fn parse_from_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("Failed to parse {key}='{value}'")),
        Err(_) => Ok(default),
    }
}

fn bool_from_env(key: &str) -> Option<bool> {
    env::var(key).ok().map(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(|c| c == ',' || c == ';' || c == ' ')
        .filter_map(normalize_optional)
        .collect()
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
