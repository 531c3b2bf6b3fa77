use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::{auth::services::AccountService, error::AccountError};

/// Authenticated account id, resolved from the bearer token.
pub struct AuthUser(pub Uuid);

/// Accepts `Bearer <token>`, `bearer <token>` or the bare token.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = raw
        .strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))
        .unwrap_or(raw)
        .trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AccountService: FromRef<S>,
{
    type Rejection = AccountError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AccountError::Unauthenticated)?;
        let accounts = AccountService::from_ref(state);
        let user_id = accounts.authenticate(token)?;
        Ok(AuthUser(user_id))
    }
}
