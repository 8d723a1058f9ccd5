use std::env;
use anyhow::{Context, Result};

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The TCP port the server binds to.
    pub port: u16,
    /// The lifetime of an access token in minutes.
    pub access_token_ttl_minutes: i64,
    /// The lifetime of a refresh token in days.
    pub refresh_token_ttl_days: i64,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let access_token_ttl_minutes: i64 = env::var("ACCESS_TOKEN_TTL_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .context("Invalid ACCESS_TOKEN_TTL_MINUTES")?;

        let refresh_token_ttl_days: i64 = env::var("REFRESH_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()
            .context("Invalid REFRESH_TOKEN_TTL_DAYS")?;

        if access_token_ttl_minutes <= 0 || refresh_token_ttl_days <= 0 {
            anyhow::bail!("Token lifetimes must be positive");
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid PORT")?,
            access_token_ttl_minutes,
            refresh_token_ttl_days,
        })
    }
}
