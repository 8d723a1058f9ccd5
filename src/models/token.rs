use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An access/refresh token pair, both signed with the session's private
/// key. Transient: only the refresh token's value is tracked server-side.
#[derive(Clone, Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// The signed claims carried by both tokens.
///
/// `sid` names the owning session so a presented token can be matched to
/// its key pair; `jti` is a fresh UUID per mint so two tokens issued within
/// the same second are never byte-identical (rotation depends on the new
/// refresh token differing from the one it supersedes).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    /// The shop id (subject).
    pub sub: Uuid,
    /// The shop's email.
    pub email: String,
    /// The session (key store) id this token is bound to.
    pub sid: Uuid,
    /// Unique id of this token.
    pub jti: Uuid,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}
