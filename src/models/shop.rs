use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// The default role granted to a newly registered shop.
pub const ROLE_SHOP: &str = "SHOP";

/// Represents a registered shop (the authenticated principal).
#[derive(Clone, Debug)]
pub struct Shop {
    /// The unique identifier for the shop.
    pub id: Uuid,
    /// The shop's display name.
    pub name: String,
    /// The shop's email address.
    pub email: String,
    /// The shop's password hash (argon2id, PHC string).
    pub password: String,
    /// The shop's roles.
    pub roles: Vec<String>,
    /// Whether the shop is active.
    pub is_active: bool,
    /// The timestamp when the shop was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the shop was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The public projection of a shop returned by login/signup responses.
///
/// Never carries the password hash.
#[derive(Clone, Debug, Serialize)]
pub struct ShopSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&Shop> for ShopSummary {
    fn from(shop: &Shop) -> Self {
        Self {
            id: shop.id,
            name: shop.name.clone(),
            email: shop.email.clone(),
        }
    }
}
