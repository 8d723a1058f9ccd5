use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::key_store::{KeyStore, NewKeyStore},
};

/// Persistence contract for session records (the key-pair store).
///
/// All mutation of rotation state goes through `set_current_refresh_token`,
/// the single compare-and-swap primitive: concurrent refresh attempts on
/// one session serialize on it, and at most one of them observes `expected`
/// as the current value. Every read here hits the authoritative store;
/// sessions are never cached in-process, since staleness there would be a
/// security hole rather than a performance problem.
#[async_trait]
pub trait KeyStoreRepository: Send + Sync + 'static {
    /// Allocates a session row with no current refresh token and an empty
    /// used set. The caller sets the first token immediately afterwards.
    async fn create(&self, record: NewKeyStore) -> Result<KeyStore>;

    async fn find_by_id(&self, session_id: Uuid) -> Result<Option<KeyStore>>;

    /// All sessions owned by a shop. A principal that logs in twice holds
    /// two independent rows.
    async fn find_by_owner(&self, shop_id: Uuid) -> Result<Vec<KeyStore>>;

    /// The session currently holding `token` as its valid refresh token.
    async fn find_by_current_token(&self, token: &str) -> Result<Option<KeyStore>>;

    /// The session that issued `token` at some point and has since
    /// superseded it.
    async fn find_by_used_token(&self, token: &str) -> Result<Option<KeyStore>>;

    /// Atomically swaps the current refresh token from `expected` to
    /// `new_token`, appending the superseded value to the used set.
    /// Returns `false` when another request rotated first (the stored
    /// current token no longer equals `expected`).
    async fn set_current_refresh_token(
        &self,
        session_id: Uuid,
        expected: Option<&str>,
        new_token: &str,
    ) -> Result<bool>;

    /// Hard-deletes one session. Idempotent; returns the rows removed.
    async fn destroy(&self, session_id: Uuid) -> Result<u64>;

    /// Hard-deletes every session of a shop. Idempotent; returns the rows
    /// removed.
    async fn destroy_by_shop(&self, shop_id: Uuid) -> Result<u64>;
}

/// A helper function to map a `tokio_postgres::Row` to a `KeyStore`.
fn row_to_key_store(row: &Row) -> Result<KeyStore> {
    Ok(KeyStore {
        id: row.try_get("id").map_err(AppError::from)?,
        shop_id: row.try_get("shop_id").map_err(AppError::from)?,
        public_key: row.try_get("public_key").map_err(AppError::from)?,
        private_key: row.try_get("private_key").map_err(AppError::from)?,
        current_refresh_token: row
            .try_get("current_refresh_token")
            .map_err(AppError::from)?,
        used_refresh_tokens: row
            .try_get("used_refresh_tokens")
            .map_err(AppError::from)?,
        created_at: row.try_get("created_at").map_err(AppError::from)?,
        updated_at: row.try_get("updated_at").map_err(AppError::from)?,
    })
}

/// PostgreSQL-backed key store repository.
#[derive(Clone)]
pub struct PgKeyStoreRepository {
    pool: Pool,
}

impl PgKeyStoreRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyStoreRepository for PgKeyStoreRepository {
    async fn create(&self, record: NewKeyStore) -> Result<KeyStore> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO key_stores (id, shop_id, public_key, private_key)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
                &[
                    &record.id,
                    &record.shop_id,
                    &record.public_key,
                    &record.private_key,
                ],
            )
            .await?;
        row_to_key_store(&row)
    }

    async fn find_by_id(&self, session_id: Uuid) -> Result<Option<KeyStore>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT *
                FROM key_stores
                WHERE id = $1
                "#,
                &[&session_id],
            )
            .await?;
        row.map(|r| row_to_key_store(&r)).transpose()
    }

    async fn find_by_owner(&self, shop_id: Uuid) -> Result<Vec<KeyStore>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"
                SELECT *
                FROM key_stores
                WHERE shop_id = $1
                ORDER BY created_at DESC
                "#,
                &[&shop_id],
            )
            .await?;
        rows.iter().map(row_to_key_store).collect()
    }

    async fn find_by_current_token(&self, token: &str) -> Result<Option<KeyStore>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT *
                FROM key_stores
                WHERE current_refresh_token = $1
                "#,
                &[&token],
            )
            .await?;
        row.map(|r| row_to_key_store(&r)).transpose()
    }

    async fn find_by_used_token(&self, token: &str) -> Result<Option<KeyStore>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT *
                FROM key_stores
                WHERE $1 = ANY(used_refresh_tokens)
                "#,
                &[&token],
            )
            .await?;
        row.map(|r| row_to_key_store(&r)).transpose()
    }

    async fn set_current_refresh_token(
        &self,
        session_id: Uuid,
        expected: Option<&str>,
        new_token: &str,
    ) -> Result<bool> {
        let client = self.pool.get().await?;

        // One conditional UPDATE, keyed on the old current value. Two
        // racing refreshes cannot both match the WHERE clause.
        let affected = match expected {
            Some(expected) => {
                client
                    .execute(
                        r#"
                        UPDATE key_stores
                        SET current_refresh_token = $3,
                            used_refresh_tokens = array_append(used_refresh_tokens, current_refresh_token),
                            updated_at = NOW()
                        WHERE id = $1 AND current_refresh_token = $2
                        "#,
                        &[&session_id, &expected, &new_token],
                    )
                    .await?
            }
            None => {
                client
                    .execute(
                        r#"
                        UPDATE key_stores
                        SET current_refresh_token = $2,
                            updated_at = NOW()
                        WHERE id = $1 AND current_refresh_token IS NULL
                        "#,
                        &[&session_id, &new_token],
                    )
                    .await?
            }
        };

        Ok(affected == 1)
    }

    async fn destroy(&self, session_id: Uuid) -> Result<u64> {
        let client = self.pool.get().await?;
        let affected = client
            .execute(
                r#"
                DELETE FROM key_stores
                WHERE id = $1
                "#,
                &[&session_id],
            )
            .await?;
        Ok(affected)
    }

    async fn destroy_by_shop(&self, shop_id: Uuid) -> Result<u64> {
        let client = self.pool.get().await?;
        let affected = client
            .execute(
                r#"
                DELETE FROM key_stores
                WHERE shop_id = $1
                "#,
                &[&shop_id],
            )
            .await?;
        Ok(affected)
    }
}
