use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    middleware_layer::auth::AuthContext,
    models::shop::ShopSummary,
    models::token::TokenPair,
    state::AppState,
    validation::access::*,
};

/// The request payload for shop registration.
#[derive(Deserialize, Debug)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// The request payload for shop login.
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The response payload for signup and login.
#[derive(Serialize)]
pub struct AuthResponse {
    pub shop: ShopSummary,
    pub tokens: TokenPair,
}

/// The response payload for a successful refresh.
#[derive(Serialize)]
pub struct RefreshResponse {
    pub tokens: TokenPair,
}

/// The response payload for logout.
#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub destroyed: u64,
}

/// Handles shop registration.
#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse> {
    tracing::info!("📝 Signup attempt for {}", payload.email);
    validate_name(&payload.name)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;

    let (shop, tokens) = state
        .access
        .signup(payload.name, payload.email, payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(AuthResponse { shop, tokens })).into_response())
}

/// Handles shop login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Login attempt for {}", payload.email);
    validate_email(&payload.email)?;

    let (shop, tokens) = state.access.login(payload.email, payload.password).await?;

    Ok((StatusCode::OK, Json(AuthResponse { shop, tokens })).into_response())
}

/// Handles refresh-token rotation.
///
/// The middleware resolved the caller's session from the presented
/// refresh token and verified its signature; the engine decides between
/// rotation, rejection, and revocation.
#[axum::debug_handler]
pub async fn refresh(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Response> {
    let presented = ctx
        .refresh_token
        .ok_or_else(|| AppError::Authentication("Missing refresh token".to_string()))?;

    let tokens = state.access.refresh(&presented, ctx.key_store).await?;

    Ok((StatusCode::OK, Json(RefreshResponse { tokens })).into_response())
}

/// Handles shop logout.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Response> {
    let destroyed = state.access.logout(&ctx.key_store).await?;

    Ok((
        StatusCode::OK,
        Json(LogoutResponse {
            success: true,
            destroyed,
        }),
    )
        .into_response())
}
