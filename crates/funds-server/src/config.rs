use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::Duration;
use rust_decimal::Decimal;

use funds_core::Terms;

/// A hundred years. Longer windows would overflow date arithmetic.
const MAX_MATURITY_DAYS: i64 = 36_500;

/// Runtime settings, read from the environment (and `.env`) at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub db_path: String,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub terms: Terms,
    pub admin_username: String,
    pub admin_password: String,
    pub admin_email: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Missing keys fall back to defaults;
    /// present but malformed values are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let token_minutes: i64 =
            parse(&get("FUNDS_TOKEN_TTL_MINUTES", "1440"), "FUNDS_TOKEN_TTL_MINUTES")?;
        let monthly_rate: Decimal =
            parse(&get("FUNDS_MONTHLY_RATE", "0.04"), "FUNDS_MONTHLY_RATE")?;
        let maturity_days: i64 =
            parse(&get("FUNDS_MATURITY_DAYS", "90"), "FUNDS_MATURITY_DAYS")?;

        let token_ttl = Duration::try_minutes(token_minutes)
            .filter(|ttl| *ttl > Duration::zero())
            .context("FUNDS_TOKEN_TTL_MINUTES out of range")?;
        if monthly_rate.is_sign_negative() {
            bail!("FUNDS_MONTHLY_RATE must not be negative");
        }
        if !(0..=MAX_MATURITY_DAYS).contains(&maturity_days) {
            bail!("FUNDS_MATURITY_DAYS must be between 0 and {}", MAX_MATURITY_DAYS);
        }

        let cors_origins = get("FUNDS_CORS_ORIGINS", "http://localhost:5173,http://localhost:3000")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            jwt_secret: get("FUNDS_JWT_SECRET", "dev-secret-change-me"),
            token_ttl,
            db_path: get("FUNDS_DB_PATH", "funds.db"),
            host: get("FUNDS_HOST", "0.0.0.0"),
            port: parse(&get("FUNDS_PORT", "8000"), "FUNDS_PORT")?,
            cors_origins,
            terms: Terms {
                monthly_rate,
                maturity_days,
            },
            admin_username: get("FUNDS_ADMIN_USERNAME", "admin"),
            admin_password: get("FUNDS_ADMIN_PASSWORD", "admin123"),
            admin_email: get("FUNDS_ADMIN_EMAIL", "admin@fundsmanagement.com"),
        })
    }
}

fn parse<T>(value: &str, key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {}: '{}'", key, value))
}
