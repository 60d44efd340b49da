//! Environment configuration

use std::time::Duration;
use crate::payments::signature::DEFAULT_TOLERANCE_SECS;
use crate::payments::stripe::DEFAULT_API_BASE;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    /// Host the platform serves production deployments from, without scheme.
    pub platform_host: Option<String>,
    pub public_base_url: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub nats_url: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub stripe_api_base: String,
    pub gateway_timeout: Duration,
    pub checkout_currency: String,
    pub webhook_tolerance_secs: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            platform_host: None,
            public_base_url: "http://localhost:3000".to_string(),
            port: 8083,
            database_url: None,
            database_max_connections: 10,
            nats_url: None,
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            stripe_api_base: DEFAULT_API_BASE.to_string(),
            gateway_timeout: Duration::from_secs(30),
            checkout_currency: "usd".to_string(),
            webhook_tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let environment = match var("APP_ENV").as_deref() {
            Some("production") => Environment::Production,
            Some("development") | Some("test") | None => Environment::Development,
            Some(other) => return Err(ConfigError::Invalid { name: "APP_ENV", value: other.to_string() }),
        };
        let platform_host = var("PLATFORM_HOST").or_else(|| var("VERCEL_URL"));
        if environment == Environment::Production && platform_host.is_none() {
            return Err(ConfigError::Missing("PLATFORM_HOST"));
        }

        Ok(Self {
            environment,
            platform_host,
            public_base_url: var("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url),
            port: parse(&var, "PORT")?.unwrap_or(defaults.port),
            database_url: var("DATABASE_URL"),
            database_max_connections: parse(&var, "DATABASE_MAX_CONNECTIONS")?.unwrap_or(defaults.database_max_connections),
            nats_url: var("NATS_URL"),
            stripe_secret_key: var("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: var("STRIPE_WEBHOOK_SECRET"),
            stripe_api_base: var("STRIPE_API_BASE").unwrap_or(defaults.stripe_api_base),
            gateway_timeout: parse(&var, "GATEWAY_TIMEOUT_SECS")?.map(Duration::from_secs).unwrap_or(defaults.gateway_timeout),
            checkout_currency: var("CHECKOUT_CURRENCY").map(|c| c.to_lowercase()).unwrap_or(defaults.checkout_currency),
            webhook_tolerance_secs: parse(&var, "WEBHOOK_TOLERANCE_SECS")?.unwrap_or(defaults.webhook_tolerance_secs),
        })
    }

    /// Base URL for redirect targets: the platform host in production,
    /// the configured public URL elsewhere.
    pub fn base_url(&self) -> String {
        match (self.environment, &self.platform_host) {
            (Environment::Production, Some(host)) => format!("https://{}", host.trim_end_matches('/')),
            _ => self.public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn parse<T: std::str::FromStr>(var: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<T>, ConfigError> {
    var(name).map(|v| v.trim().parse::<T>().map_err(|_| ConfigError::Invalid { name, value: v })).transpose()
}
