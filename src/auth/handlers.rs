use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{Ack, LoginRequest, ProfileView, RegisterRequest, TokenResponse, VerifyRequest},
        extractors::AuthUser,
        repo_types::ProfileFields,
    },
    error::AccountError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/verify", post(verify))
        .route("/logout", post(logout))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(put_profile))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Ack>), AccountError> {
    state.accounts.register(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(Ack::ok("User registered successfully.")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AccountError> {
    let token = state
        .accounts
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileView>, AccountError> {
    Ok(Json(state.accounts.profile(user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn put_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ProfileFields>,
) -> Result<Json<ProfileView>, AccountError> {
    Ok(Json(state.accounts.update_profile(user_id, payload).await?))
}

#[instrument(skip(state, payload))]
pub async fn verify(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<Ack>, AccountError> {
    state
        .accounts
        .verify_email(&payload.email, &payload.verification_code)
        .await?;
    Ok(Json(Ack::ok("Account activated.")))
}

#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Json<Ack> {
    state.accounts.logout(user_id);
    Json(Ack::ok("Logged out."))
}
