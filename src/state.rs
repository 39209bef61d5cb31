use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::token::TokenKeys;
use crate::config::Config;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub keys: Arc<TokenKeys>,
}

impl AppState {
    /// Build state, deriving token keys from the configured secret or
    /// generating a per-process one.
    pub fn new(db: DbPool, config: Config) -> Self {
        let keys = match config.auth.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => {
                TokenKeys::from_secret(secret.as_bytes(), config.auth.token_hours)
            }
            _ => {
                tracing::warn!(
                    "No JWT secret configured; using a random secret, logins will not survive a restart"
                );
                TokenKeys::ephemeral(config.auth.token_hours)
            }
        };
        Self {
            db,
            config,
            keys: Arc::new(keys),
        }
    }
}
