use std::sync::Arc;

use deadpool_postgres::Pool;

use crate::config::Config;
use crate::error::Result;
use crate::repositories::{key_store::PgKeyStoreRepository, shop::PgShopRepository};
use crate::services::{access::AccessService, token::TokenSigner};

/// The engine wired to its production repositories.
pub type Engine = AccessService<PgShopRepository, PgKeyStoreRepository>;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The application's configuration.
    pub config: Config,
    /// The session rotation engine.
    pub access: Arc<Engine>,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL pool initialized with deadpool-postgres");

        crate::db::init_schema(&db).await?;

        let shops = Arc::new(PgShopRepository::new(db.clone()));
        let key_stores = Arc::new(PgKeyStoreRepository::new(db.clone()));
        let signer = TokenSigner::new(
            config.access_token_ttl_minutes,
            config.refresh_token_ttl_days,
        );

        let access = Arc::new(AccessService::new(shops, key_stores, signer));
        tracing::info!("✅ Session rotation engine initialized");

        Ok(AppState {
            db,
            config: config.clone(),
            access,
        })
    }
}
