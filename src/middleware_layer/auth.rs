use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{key_store::KeyStore, token::TokenClaims},
    state::AppState,
};

/// The shop id the caller claims to be.
pub const HEADER_CLIENT_ID: &str = "x-client-id";
/// Access token, presented for logout.
pub const HEADER_AUTHORIZATION: &str = "authorization";
/// Refresh token, presented for the refresh flow.
pub const HEADER_REFRESH_TOKEN: &str = "x-rtoken-id";

/// The authenticated context attached to protected requests.
#[derive(Clone, Debug)]
pub struct AuthContext {
    /// The caller's resolved session record.
    pub key_store: KeyStore,
    /// The verified claims of the presented token.
    pub claims: TokenClaims,
    /// The refresh token as presented, when this is a refresh request.
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct ClaimsPeek {
    sid: Uuid,
}

/// Reads the unverified `sid` claim out of a token so the claimed session
/// can be loaded. Nothing is trusted until the signature checks out
/// against that session's stored public key.
fn peek_session_id(token: &str) -> Result<Uuid> {
    let payload = token.split('.').nth(1).ok_or(AppError::InvalidToken)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| AppError::InvalidToken)?;
    let peek: ClaimsPeek = sonic_rs::from_slice(&bytes).map_err(|_| AppError::InvalidToken)?;
    Ok(peek.sid)
}

fn header_value(request: &Request<Body>, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start_matches("Bearer ").to_string())
}

/// Resolves and verifies the caller's claimed session, then attaches an
/// `AuthContext` for the handler.
///
/// Refresh requests carry the refresh token in `x-rtoken-id`; the session
/// is resolved by that token (current first, superseded second) so that a
/// replayed old token still reaches the engine's reuse branch. Everything
/// else authenticates with the access token in `authorization`, resolved
/// through its `sid` claim.
pub async fn authentication(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    let client_id = header_value(&request, HEADER_CLIENT_ID)
        .and_then(|v| Uuid::parse_str(&v).ok())
        .ok_or_else(|| AppError::Authentication("Missing client id".to_string()))?;

    let context = if let Some(presented) = header_value(&request, HEADER_REFRESH_TOKEN) {
        let key_store = state.access.resolve_refresh_session(&presented).await?;
        let claims = state
            .access
            .signer()
            .verify(&presented, &key_store.public_key)
            .map_err(|e| match e {
                // An expired refresh token is just stale credentials.
                AppError::TokenExpired => {
                    AppError::Authentication("Refresh token expired".to_string())
                }
                other => other,
            })?;

        if claims.sub != client_id || key_store.shop_id != client_id {
            return Err(AppError::Authentication("Client mismatch".to_string()));
        }

        AuthContext {
            key_store,
            claims,
            refresh_token: Some(presented),
        }
    } else {
        let token = header_value(&request, HEADER_AUTHORIZATION)
            .ok_or_else(|| AppError::Authentication("Missing access token".to_string()))?;

        let session_id = peek_session_id(&token)?;
        let key_store = state.access.resolve_session(session_id).await?;
        let claims = state
            .access
            .signer()
            .verify(&token, &key_store.public_key)?;

        if claims.sub != client_id || key_store.shop_id != client_id {
            return Err(AppError::Authentication("Client mismatch".to_string()));
        }

        AuthContext {
            key_store,
            claims,
            refresh_token: None,
        }
    };

    tracing::debug!("✅ Authenticated shop {} on session {}", client_id, context.key_store.id);
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_reads_the_sid_claim() {
        let sid = Uuid::new_v4();
        let payload = sonic_rs::to_string(&sonic_rs::json!({
            "sub": Uuid::new_v4().to_string(),
            "sid": sid.to_string(),
        }))
        .unwrap();
        let token = format!(
            "header.{}.signature",
            URL_SAFE_NO_PAD.encode(payload.as_bytes())
        );
        assert_eq!(peek_session_id(&token).unwrap(), sid);
    }

    #[test]
    fn peek_rejects_garbage() {
        assert!(peek_session_id("no-dots-here").is_err());
        assert!(peek_session_id("a.!!!.c").is_err());

        let not_json = URL_SAFE_NO_PAD.encode(b"not json");
        assert!(peek_session_id(&format!("a.{}.c", not_json)).is_err());
    }
}
