use std::sync::Arc;
use uuid::Uuid;

use crate::{error::Result, repositories::key_store::KeyStoreRepository};

/// Forces a principal back through login by destroying session state.
///
/// Deletes *every* session row the shop owns, not just the one implicated:
/// a credential that leaked once may have spawned any number of sessions.
/// After `revoke` returns, no refresh token previously issued to the shop
/// can succeed a refresh.
#[derive(Clone)]
pub struct RevocationGuard<K: KeyStoreRepository> {
    key_stores: Arc<K>,
}

impl<K: KeyStoreRepository> RevocationGuard<K> {
    pub fn new(key_stores: Arc<K>) -> Self {
        Self { key_stores }
    }

    /// Destroys all sessions of a shop. Returns the number of rows
    /// removed; revoking a shop with no sessions is a no-op, not an error.
    pub async fn revoke(&self, shop_id: Uuid) -> Result<u64> {
        let destroyed = self.key_stores.destroy_by_shop(shop_id).await?;
        tracing::warn!(
            "🚫 Revoked {} session(s) for shop {}, relogin required",
            destroyed,
            shop_id
        );
        Ok(destroyed)
    }
}
