use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("email already registered")]
    DuplicateAccount,
    #[error("unknown account")]
    UnknownAccount,
    #[error("bad credential")]
    BadCredential,
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("profile not found")]
    ProfileNotFound,
    #[error("invalid format: {0}")]
    InvalidFormat(&'static str),
    #[error("invalid verification code")]
    InvalidCode,
    #[error("store unavailable")]
    StoreUnavailable(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl AccountError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::DuplicateAccount => StatusCode::CONFLICT,
            Self::UnknownAccount | Self::BadCredential | Self::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            Self::ProfileNotFound => StatusCode::NOT_FOUND,
            Self::InvalidFormat(_) | Self::InvalidCode => StatusCode::BAD_REQUEST,
            Self::StoreUnavailable(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::DuplicateAccount => "Email already registered".into(),
            Self::UnknownAccount | Self::BadCredential => "Invalid credentials".into(),
            Self::Unauthenticated => "Invalid or expired token".into(),
            Self::ProfileNotFound => "User profile not found".into(),
            Self::InvalidFormat(what) => format!("Invalid {what}"),
            Self::InvalidCode => "Invalid verification code".into(),
            Self::StoreUnavailable(_) | Self::Internal(_) => "Internal server error".into(),
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::StoreUnavailable(e) | Self::Internal(e) = &self {
            error!(error = ?e, kind = %self, "request failed");
        }
        let body = Json(json!({ "success": false, "message": self.public_message() }));
        (status, body).into_response()
    }
}
