use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::AppError;
use crate::services::txn::RetryPolicy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub txn: RetryPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://coursehub.db".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|_| AppError::Validation("BIND_ADDR is not a valid socket address".to_string()))?;

        let defaults = RetryPolicy::default();
        let max_attempts = match env::var("TXN_MAX_ATTEMPTS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| AppError::Validation("TXN_MAX_ATTEMPTS must be a positive integer".to_string()))?,
            Err(_) => defaults.max_attempts,
        };
        let base_backoff = match env::var("TXN_BASE_BACKOFF_MS") {
            Ok(raw) => Duration::from_millis(
                raw.parse()
                    .map_err(|_| AppError::Validation("TXN_BASE_BACKOFF_MS must be an integer".to_string()))?,
            ),
            Err(_) => defaults.base_backoff,
        };

        Ok(Self {
            database_url,
            bind_addr,
            txn: RetryPolicy {
                max_attempts,
                base_backoff,
            },
        })
    }
}
