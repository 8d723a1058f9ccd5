use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::token::{TokenClaims, TokenPair},
};

/// Issues and verifies the signed token pairs of a session.
///
/// Both tokens are JWTs signed `EdDSA` with the session's private key and
/// verified with its stored public key; the signer itself holds no key
/// material, only lifetimes.
#[derive(Clone, Debug)]
pub struct TokenSigner {
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenSigner {
    /// Creates a signer with the given token lifetimes.
    pub fn new(access_ttl_minutes: i64, refresh_ttl_days: i64) -> Self {
        Self {
            access_ttl: Duration::minutes(access_ttl_minutes),
            refresh_ttl: Duration::days(refresh_ttl_days),
        }
    }

    /// Mints an access/refresh pair for a shop, bound to a session.
    ///
    /// # Arguments
    ///
    /// * `shop_id` - The subject of the tokens.
    /// * `email` - The shop's email, carried in the claims.
    /// * `session_id` - The session the pair is bound to.
    /// * `private_key` - The session's PKCS#8 DER private key.
    pub fn issue(
        &self,
        shop_id: Uuid,
        email: &str,
        session_id: Uuid,
        private_key: &[u8],
    ) -> Result<TokenPair> {
        let key = EncodingKey::from_ed_der(private_key);
        let header = Header::new(Algorithm::EdDSA);
        let now = Utc::now();

        let access_claims = TokenClaims {
            sub: shop_id,
            email: email.to_string(),
            sid: session_id,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        let access_token = encode(&header, &access_claims, &key)
            .map_err(|e| AppError::Internal(format!("Token signing error: {}", e)))?;

        let refresh_claims = TokenClaims {
            sub: shop_id,
            email: email.to_string(),
            sid: session_id,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };
        let refresh_token = encode(&header, &refresh_claims, &key)
            .map_err(|e| AppError::Internal(format!("Token signing error: {}", e)))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Verifies a token against a session's raw Ed25519 public key.
    ///
    /// Fails with `TokenExpired` for a valid-but-stale token and
    /// `InvalidToken` for anything whose signature does not check out.
    /// Callers branch on the two: an expired access token legitimately
    /// starts a refresh flow, a forged one never does.
    pub fn verify(&self, token: &str, public_key: &[u8]) -> Result<TokenClaims> {
        let key = DecodingKey::from_ed_der(public_key);
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.leeway = 0;

        let data = decode::<TokenClaims>(token, &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })?;

        Ok(data.claims)
    }
}
