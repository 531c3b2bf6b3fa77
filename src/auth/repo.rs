use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, ProfileFields, User, VerificationChallenge};

const USER_COLUMNS: &str = r#"
    id, email, password_hash,
    name, last_name, address, city, postal_code, national_id, gender, date_of_birth, phone,
    verification_code, verification_expires_at, is_confirmed
"#;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    Duplicate,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistence contract for user records, keyed by email with a stable id.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Applies the present profile fields and stores the new verification
    /// challenge in one write. `None` when no record has this id.
    async fn update_profile(
        &self,
        id: Uuid,
        fields: &ProfileFields,
        challenge: &VerificationChallenge,
    ) -> anyhow::Result<Option<User>>;

    /// Marks the account confirmed and consumes the code, only if `code` is
    /// still the stored one. Returns whether a row changed.
    async fn confirm(&self, id: Uuid, code: &str) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let p = &user.profile;
        let res = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, name, last_name, address, city,
                               postal_code, national_id, gender, date_of_birth, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&p.name)
        .bind(&p.last_name)
        .bind(&p.address)
        .bind(&p.city)
        .bind(&p.postal_code)
        .bind(&p.national_id)
        .bind(&p.gender)
        .bind(&p.date_of_birth)
        .bind(&p.phone)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(u) => Ok(u),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::Duplicate),
            Err(e) => Err(StoreError::Backend(anyhow::Error::new(e).context("insert user"))),
        }
    }

    async fn update_profile(
        &self,
        id: Uuid,
        fields: &ProfileFields,
        challenge: &VerificationChallenge,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                name          = COALESCE($2, name),
                last_name     = COALESCE($3, last_name),
                address       = COALESCE($4, address),
                city          = COALESCE($5, city),
                postal_code   = COALESCE($6, postal_code),
                national_id   = COALESCE($7, national_id),
                gender        = COALESCE($8, gender),
                date_of_birth = COALESCE($9, date_of_birth),
                phone         = COALESCE($10, phone),
                verification_code       = $11,
                verification_expires_at = $12,
                updated_at    = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.last_name)
        .bind(&fields.address)
        .bind(&fields.city)
        .bind(&fields.postal_code)
        .bind(&fields.national_id)
        .bind(&fields.gender)
        .bind(&fields.date_of_birth)
        .bind(&fields.phone)
        .bind(&challenge.code)
        .bind(challenge.expires_at)
        .fetch_optional(&self.db)
        .await
        .context("update user profile")?;
        Ok(user)
    }

    async fn confirm(&self, id: Uuid, code: &str) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET is_confirmed = TRUE,
                   verification_code = NULL,
                   verification_expires_at = NULL,
                   updated_at = now()
             WHERE id = $1 AND verification_code = $2
            "#,
        )
        .bind(id)
        .bind(code)
        .execute(&self.db)
        .await
        .context("confirm user")?;
        Ok(res.rows_affected() == 1)
    }
}
