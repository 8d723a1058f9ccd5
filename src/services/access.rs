use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder,
};
use rand::rngs::OsRng;
use uuid::Uuid;
use zeroize::Zeroize;

use crate::{
    crypto::digest::{token_eq, token_fingerprint},
    crypto::keys::SessionKeyPair,
    error::{AppError, Result},
    models::key_store::{KeyStore, NewKeyStore},
    models::shop::{Shop, ShopSummary, ROLE_SHOP},
    models::token::TokenPair,
    repositories::{key_store::KeyStoreRepository, shop::ShopRepository},
    services::revocation::RevocationGuard,
    services::token::TokenSigner,
};

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 6;

/// Hashes a password using Argon2id.
pub fn hash_password(password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();

    let salt = SaltString::generate(&mut OsRng);

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?,
    );

    let password_hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Internal(format!("Argon2 hash error: {}", e)))?
        .to_string();

    password_bytes.zeroize();
    Ok(password_hash)
}

/// Verifies a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Hash parse error: {}", e)))?;
    let result = Argon2::default()
        .verify_password(&password_bytes, &parsed_hash)
        .is_ok();

    password_bytes.zeroize();
    Ok(result)
}

/// The session rotation engine.
///
/// Owns the session lifecycle: login mints a key pair and the first token
/// pair, refresh validates and rotates the refresh token against the
/// store's compare-and-swap primitive, and reuse of a superseded token
/// revokes the shop's sessions outright.
///
/// Constructed with injected repositories so tests run it against
/// in-memory doubles.
pub struct AccessService<S: ShopRepository, K: KeyStoreRepository> {
    shops: Arc<S>,
    key_stores: Arc<K>,
    signer: TokenSigner,
    revocation: RevocationGuard<K>,
}

impl<S: ShopRepository, K: KeyStoreRepository> AccessService<S, K> {
    pub fn new(shops: Arc<S>, key_stores: Arc<K>, signer: TokenSigner) -> Self {
        let revocation = RevocationGuard::new(Arc::clone(&key_stores));
        Self {
            shops,
            key_stores,
            signer,
            revocation,
        }
    }

    /// The signer used for this engine's tokens.
    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// The guard used for reuse-detected and administrative revocation.
    pub fn revocation(&self) -> &RevocationGuard<K> {
        &self.revocation
    }

    /// Registers a new shop and opens its first session.
    ///
    /// Fails with `Conflict` if the email is already registered.
    pub async fn signup(
        &self,
        name: String,
        email: String,
        password: String,
    ) -> Result<(ShopSummary, TokenPair)> {
        if self.shops.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Shop already registered".to_string()));
        }

        let shop = self
            .shops
            .create(Shop {
                id: Uuid::new_v4(),
                name,
                email,
                password: hash_password(&password)?,
                roles: vec![ROLE_SHOP.to_string()],
                is_active: true,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            })
            .await?;

        tracing::info!("✅ Shop registered: {}", shop.id);

        let tokens = self.open_session(&shop).await?;
        Ok((ShopSummary::from(&shop), tokens))
    }

    /// Authenticates a shop and opens a new session.
    ///
    /// Each login creates an independent session with its own key pair and
    /// rotation chain; earlier sessions stay valid.
    pub async fn login(&self, email: String, password: String) -> Result<(ShopSummary, TokenPair)> {
        let shop = self
            .shops
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::Authentication("Shop not registered".to_string()))?;

        if !verify_password(&password, &shop.password)? {
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        tracing::info!("🔐 Shop logged in: {}", shop.id);

        let tokens = self.open_session(&shop).await?;
        Ok((ShopSummary::from(&shop), tokens))
    }

    /// Creates the session record and its first token pair.
    ///
    /// The row is allocated without a current refresh token, then the
    /// first token is installed through the same conditional update that
    /// rotation uses.
    async fn open_session(&self, shop: &Shop) -> Result<TokenPair> {
        let keys = SessionKeyPair::generate()?;
        let session_id = Uuid::new_v4();

        let record = self
            .key_stores
            .create(NewKeyStore {
                id: session_id,
                shop_id: shop.id,
                public_key: keys.public_key().to_vec(),
                private_key: keys.private_key().to_vec(),
            })
            .await?;

        let tokens = self
            .signer
            .issue(shop.id, &shop.email, record.id, keys.private_key())?;

        let installed = self
            .key_stores
            .set_current_refresh_token(record.id, None, &tokens.refresh_token)
            .await?;
        if !installed {
            return Err(AppError::Internal(
                "Freshly created session already held a token".to_string(),
            ));
        }

        tracing::debug!(
            "🔑 Session {} opened for shop {} (refresh {})",
            record.id,
            shop.id,
            token_fingerprint(&tokens.refresh_token)
        );

        Ok(tokens)
    }

    /// Resolves a session by its id, for callers holding a verified access
    /// token. Absent session means the caller must log in again.
    pub async fn resolve_session(&self, session_id: Uuid) -> Result<KeyStore> {
        self.key_stores
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::Authentication("Session not found".to_string()))
    }

    /// Resolves the session a presented refresh token belongs to, looking
    /// at current tokens first and superseded ones second.
    ///
    /// A token matching neither is simply unknown: that is an
    /// authentication failure, never a revocation trigger, because reuse
    /// detection requires positive historical evidence.
    pub async fn resolve_refresh_session(&self, presented: &str) -> Result<KeyStore> {
        if let Some(holder) = self.key_stores.find_by_current_token(presented).await? {
            return Ok(holder);
        }
        if let Some(holder) = self.key_stores.find_by_used_token(presented).await? {
            return Ok(holder);
        }
        Err(AppError::Authentication("Token not registered".to_string()))
    }

    /// Refreshes a session: validates the presented refresh token and
    /// rotates it, or punishes reuse.
    ///
    /// * A token in the session's used set revokes the owner wholesale and
    ///   fails `Forbidden`. A superseded token coming back means either a
    ///   client retrying a stale token or an attacker replaying a stolen
    ///   one; the two are indistinguishable, so both cost the shop its
    ///   sessions.
    /// * A token equal to the current one has its signature verified
    ///   against the session's public key, then a new pair is minted with
    ///   the *same* key pair and swapped in via the store's conditional
    ///   update. Losing that swap to a concurrent refresh fails
    ///   `Authentication`; the loser's token is in the used set by then,
    ///   so a retry lands in the reuse branch.
    /// * Anything else fails `Authentication`.
    pub async fn refresh(&self, presented: &str, session: KeyStore) -> Result<TokenPair> {
        let reused = session
            .used_refresh_tokens
            .iter()
            .any(|used| token_eq(used, presented));
        if reused {
            tracing::warn!(
                "⚠️ Superseded refresh token {} presented for session {}",
                token_fingerprint(presented),
                session.id
            );
            self.revocation.revoke(session.shop_id).await?;
            return Err(AppError::Forbidden);
        }

        let is_current = session
            .current_refresh_token
            .as_deref()
            .is_some_and(|current| token_eq(current, presented));
        if !is_current {
            return Err(AppError::Authentication("Token not registered".to_string()));
        }

        let claims = self
            .signer
            .verify(presented, &session.public_key)
            .map_err(|e| match e {
                AppError::TokenExpired => {
                    AppError::Authentication("Refresh token expired".to_string())
                }
                other => other,
            })?;
        if claims.sid != session.id {
            return Err(AppError::InvalidToken);
        }

        let shop = self
            .shops
            .find_by_email(&claims.email)
            .await?
            .ok_or_else(|| AppError::Authentication("Shop not registered".to_string()))?;

        // Rotation re-uses the session's key pair; only the token moves.
        let tokens = self
            .signer
            .issue(shop.id, &shop.email, session.id, &session.private_key)?;

        let rotated = self
            .key_stores
            .set_current_refresh_token(session.id, Some(presented), &tokens.refresh_token)
            .await?;
        if !rotated {
            return Err(AppError::Authentication("Token is stale".to_string()));
        }

        tracing::debug!(
            "🔄 Session {} rotated {} -> {}",
            session.id,
            token_fingerprint(presented),
            token_fingerprint(&tokens.refresh_token)
        );

        Ok(tokens)
    }

    /// Resolves and refreshes in one step, for callers that only hold the
    /// presented token.
    pub async fn handle_refresh(&self, presented: &str) -> Result<TokenPair> {
        let session = self.resolve_refresh_session(presented).await?;
        self.refresh(presented, session).await
    }

    /// Destroys one session. Idempotent: logging out an already-destroyed
    /// session acks with a zero count.
    pub async fn logout(&self, session: &KeyStore) -> Result<u64> {
        let destroyed = self.key_stores.destroy(session.id).await?;
        tracing::info!("👋 Shop {} logged out session {}", session.shop_id, session.id);
        Ok(destroyed)
    }
}
