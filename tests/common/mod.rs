//! In-memory repositories for exercising the rotation engine without a
//! database.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use gatehouse::error::Result;
use gatehouse::models::key_store::{KeyStore, NewKeyStore};
use gatehouse::models::shop::Shop;
use gatehouse::repositories::key_store::KeyStoreRepository;
use gatehouse::repositories::shop::ShopRepository;
use gatehouse::services::access::AccessService;
use gatehouse::services::token::TokenSigner;

/// In-memory shop repository.
#[derive(Default, Clone)]
pub struct MockShopRepository {
    shops: Arc<DashMap<Uuid, Shop>>,
    by_email: Arc<DashMap<String, Uuid>>,
}

impl MockShopRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShopRepository for MockShopRepository {
    async fn create(&self, shop: Shop) -> Result<Shop> {
        self.by_email.insert(shop.email.clone(), shop.id);
        self.shops.insert(shop.id, shop.clone());
        Ok(shop)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Shop>> {
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.shops.get(id.value()).map(|r| r.value().clone())))
    }

    async fn find_by_id(&self, shop_id: Uuid) -> Result<Option<Shop>> {
        Ok(self.shops.get(&shop_id).map(|r| r.value().clone()))
    }
}

/// In-memory key store repository.
///
/// `set_current_refresh_token` mutates under the entry's write lock, so it
/// is as atomic as the SQL conditional update it stands in for.
#[derive(Default, Clone)]
pub struct MockKeyStoreRepository {
    sessions: Arc<DashMap<Uuid, KeyStore>>,
}

impl MockKeyStoreRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions, across all shops.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl KeyStoreRepository for MockKeyStoreRepository {
    async fn create(&self, record: NewKeyStore) -> Result<KeyStore> {
        let row = KeyStore {
            id: record.id,
            shop_id: record.shop_id,
            public_key: record.public_key,
            private_key: record.private_key,
            current_refresh_token: None,
            used_refresh_tokens: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.sessions.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, session_id: Uuid) -> Result<Option<KeyStore>> {
        Ok(self.sessions.get(&session_id).map(|r| r.value().clone()))
    }

    async fn find_by_owner(&self, shop_id: Uuid) -> Result<Vec<KeyStore>> {
        Ok(self
            .sessions
            .iter()
            .filter(|r| r.value().shop_id == shop_id)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn find_by_current_token(&self, token: &str) -> Result<Option<KeyStore>> {
        Ok(self
            .sessions
            .iter()
            .find(|r| r.value().current_refresh_token.as_deref() == Some(token))
            .map(|r| r.value().clone()))
    }

    async fn find_by_used_token(&self, token: &str) -> Result<Option<KeyStore>> {
        Ok(self
            .sessions
            .iter()
            .find(|r| r.value().used_refresh_tokens.iter().any(|t| t == token))
            .map(|r| r.value().clone()))
    }

    async fn set_current_refresh_token(
        &self,
        session_id: Uuid,
        expected: Option<&str>,
        new_token: &str,
    ) -> Result<bool> {
        let Some(mut entry) = self.sessions.get_mut(&session_id) else {
            return Ok(false);
        };

        if entry.current_refresh_token.as_deref() != expected {
            return Ok(false);
        }

        if let Some(old) = entry.current_refresh_token.take() {
            entry.used_refresh_tokens.push(old);
        }
        entry.current_refresh_token = Some(new_token.to_string());
        entry.updated_at = Utc::now();
        Ok(true)
    }

    async fn destroy(&self, session_id: Uuid) -> Result<u64> {
        Ok(u64::from(self.sessions.remove(&session_id).is_some()))
    }

    async fn destroy_by_shop(&self, shop_id: Uuid) -> Result<u64> {
        let ids: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|r| r.value().shop_id == shop_id)
            .map(|r| r.id)
            .collect();
        let mut destroyed = 0;
        for id in ids {
            if self.sessions.remove(&id).is_some() {
                destroyed += 1;
            }
        }
        Ok(destroyed)
    }
}

/// An engine over fresh in-memory repositories.
pub fn test_engine() -> (
    AccessService<MockShopRepository, MockKeyStoreRepository>,
    Arc<MockShopRepository>,
    Arc<MockKeyStoreRepository>,
) {
    let shops = Arc::new(MockShopRepository::new());
    let key_stores = Arc::new(MockKeyStoreRepository::new());
    let engine = AccessService::new(
        Arc::clone(&shops),
        Arc::clone(&key_stores),
        TokenSigner::new(15, 7),
    );
    (engine, shops, key_stores)
}
