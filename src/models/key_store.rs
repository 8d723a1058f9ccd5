use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One authenticated session: a shop bound to an Ed25519 key pair and a
/// single currently-valid refresh token.
///
/// The key material is generated once at session creation and never
/// changes; rotation only replaces `current_refresh_token` and appends the
/// superseded value to `used_refresh_tokens`. The used set is append-only
/// for the life of the row: a token that lands there stays there until
/// the session is destroyed.
#[derive(Clone, Debug)]
pub struct KeyStore {
    /// The stable identity of the session record.
    pub id: Uuid,
    /// The shop that owns this session.
    pub shop_id: Uuid,
    /// Raw Ed25519 public key (32 bytes), used to verify tokens.
    pub public_key: Vec<u8>,
    /// PKCS#8 DER Ed25519 private key, used to sign tokens.
    pub private_key: Vec<u8>,
    /// The one refresh token currently accepted for this session.
    /// `None` only in the window between row creation and the first
    /// `set_current_refresh_token` of the same login.
    pub current_refresh_token: Option<String>,
    /// Every refresh token this session has issued and since superseded.
    pub used_refresh_tokens: Vec<String>,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp of the last rotation.
    pub updated_at: DateTime<Utc>,
}

/// The fields needed to allocate a new session row.
#[derive(Clone, Debug)]
pub struct NewKeyStore {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub public_key: Vec<u8>,
    pub private_key: Vec<u8>,
}
