use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Optional profile fields, shared by registration, update and the stored row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    #[serde(rename = "dniNie")]
    pub national_id: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub phone: Option<String>,
}

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String, // argon2 PHC string
    #[sqlx(flatten)]
    pub profile: ProfileFields,
    pub verification_code: Option<String>,
    pub verification_expires_at: Option<OffsetDateTime>,
    pub is_confirmed: bool,
}

/// Insert payload; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub profile: ProfileFields,
}

/// A freshly issued verification challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationChallenge {
    pub code: String,
    pub expires_at: OffsetDateTime,
}
