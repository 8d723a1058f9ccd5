use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::shop::Shop,
};

/// Persistence contract for shop records.
///
/// The engine only ever needs point lookups and creation; credential
/// fields are opaque to everything but the password helpers.
#[async_trait]
pub trait ShopRepository: Send + Sync + 'static {
    async fn create(&self, shop: Shop) -> Result<Shop>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Shop>>;
    async fn find_by_id(&self, shop_id: Uuid) -> Result<Option<Shop>>;
}

/// A helper function to map a `tokio_postgres::Row` to a `Shop`.
fn row_to_shop(row: &Row) -> Result<Shop> {
    Ok(Shop {
        id: row.try_get("id").map_err(AppError::from)?,
        name: row.try_get("name").map_err(AppError::from)?,
        email: row.try_get("email").map_err(AppError::from)?,
        password: row.try_get("password").map_err(AppError::from)?,
        roles: row.try_get("roles").map_err(AppError::from)?,
        is_active: row.try_get("is_active").map_err(AppError::from)?,
        created_at: row.try_get("created_at").map_err(AppError::from)?,
        updated_at: row.try_get("updated_at").map_err(AppError::from)?,
    })
}

/// PostgreSQL-backed shop repository.
#[derive(Clone)]
pub struct PgShopRepository {
    pool: Pool,
}

impl PgShopRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShopRepository for PgShopRepository {
    async fn create(&self, shop: Shop) -> Result<Shop> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO shops (id, name, email, password, roles)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
                &[&shop.id, &shop.name, &shop.email, &shop.password, &shop.roles],
            )
            .await?;
        row_to_shop(&row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Shop>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT *
                FROM shops
                WHERE email = $1 AND is_active = true
                "#,
                &[&email],
            )
            .await?;
        row.map(|r| row_to_shop(&r)).transpose()
    }

    async fn find_by_id(&self, shop_id: Uuid) -> Result<Option<Shop>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT *
                FROM shops
                WHERE id = $1
                "#,
                &[&shop_id],
            )
            .await?;
        row.map(|r| row_to_shop(&r)).transpose()
    }
}
