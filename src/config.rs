use anyhow::{bail, Context, Result};
use std::fmt;

const DEFAULT_ORDER_TTL_SECS: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Gateway credential pair. Only the secret half signs; the client key is
/// public and echoed to the browser.
#[derive(Clone)]
pub struct GatewayCredentials {
    pub client_key: String,
    pub secret_key: String,
}

impl fmt::Debug for GatewayCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayCredentials")
            .field("client_key", &self.client_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // NICEPAY
    pub gateway: GatewayCredentials,

    // Order state
    pub redis_url: Option<String>,
    pub order_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Self::parse_environment(var("ENVIRONMENT"))?;

        let config = Self {
            environment,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("Invalid PORT")?,

            gateway: GatewayCredentials {
                client_key: var("NICEPAY_CLIENT_KEY").context("NICEPAY_CLIENT_KEY required")?,
                secret_key: var("NICEPAY_SECRET_KEY").context("NICEPAY_SECRET_KEY required")?,
            },

            redis_url: var("REDIS_URL").filter(|url| !url.trim().is_empty()),
            order_ttl_secs: match var("ORDER_TTL_SECS") {
                Some(raw) => raw.parse().context("Invalid ORDER_TTL_SECS")?,
                None => DEFAULT_ORDER_TTL_SECS,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_environment(raw: Option<String>) -> Result<Environment> {
        let env = raw.unwrap_or_else(|| "development".to_string());

        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.gateway.client_key.trim().is_empty() {
            bail!("NICEPAY_CLIENT_KEY must not be empty");
        }
        if self.gateway.secret_key.trim().is_empty() {
            bail!("NICEPAY_SECRET_KEY must not be empty");
        }

        if let Some(url) = &self.redis_url {
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                bail!("REDIS_URL must be a redis:// or rediss:// URL");
            }
        }

        if self.order_ttl_secs == 0 {
            bail!("ORDER_TTL_SECS must be greater than zero");
        }

        if self.environment == Environment::Production && self.redis_url.is_none() {
            tracing::warn!("No REDIS_URL in production; order state is kept per process");
        }

        tracing::info!(
            "Configuration validated for {:?} environment",
            self.environment
        );

        Ok(())
    }
}
