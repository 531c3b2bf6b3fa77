use std::sync::Arc;

use rand::Rng;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{ProfileView, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::{StoreError, UserStore},
        repo_types::{NewUser, ProfileFields, VerificationChallenge},
        validation::{is_valid_email, is_valid_national_id, normalize_email},
    },
    error::AccountError,
    notify::Notifier,
};

fn store_err(e: anyhow::Error) -> AccountError {
    AccountError::StoreUnavailable(e)
}

fn generate_verification_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
}

/// Account lifecycle: registration, login, profile, email verification, logout.
/// Holds no state of its own beyond injected collaborators.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    keys: JwtKeys,
    notifier: Notifier,
    code_ttl: TimeDuration,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn UserStore>,
        keys: JwtKeys,
        notifier: Notifier,
        code_ttl_minutes: i64,
    ) -> Self {
        Self {
            store,
            keys,
            notifier,
            code_ttl: TimeDuration::minutes(code_ttl_minutes),
        }
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn register(&self, req: RegisterRequest) -> Result<(), AccountError> {
        let email = normalize_email(&req.email);
        if !is_valid_email(&email) {
            return Err(AccountError::InvalidFormat("email"));
        }
        if req.password.is_empty() {
            return Err(AccountError::InvalidFormat("password"));
        }

        if self.store.find_by_email(&email).await.map_err(store_err)?.is_some() {
            warn!(%email, "email already registered");
            return Err(AccountError::DuplicateAccount);
        }

        let password_hash = hash_password(&req.password).map_err(AccountError::Internal)?;
        let user = self
            .store
            .insert(NewUser {
                email,
                password_hash,
                profile: req.profile,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate => AccountError::DuplicateAccount,
                StoreError::Backend(e) => store_err(e),
            })?;

        self.notifier
            .welcome_email(&user.email, user.profile.name.as_deref());
        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(())
    }

    /// Returns a signed bearer token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AccountError> {
        let email = normalize_email(email);
        let user = self
            .store
            .find_by_email(&email)
            .await
            .map_err(store_err)?
            .ok_or_else(|| {
                warn!(%email, "login unknown email");
                AccountError::UnknownAccount
            })?;

        if !verify_password(password, &user.password_hash).map_err(AccountError::Internal)? {
            warn!(%email, user_id = %user.id, "login invalid password");
            return Err(AccountError::BadCredential);
        }

        let token = self
            .keys
            .sign(user.id)
            .map_err(AccountError::Internal)?;
        info!(user_id = %user.id, "user logged in");
        Ok(token)
    }

    /// Resolves a bearer token to an account id. Any token with a valid
    /// signature that has not expired is accepted, even one whose account has
    /// since been deleted; handlers report the missing profile.
    pub fn authenticate(&self, token: &str) -> Result<Uuid, AccountError> {
        let claims = self.keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AccountError::Unauthenticated
        })?;
        Ok(claims.sub)
    }

    #[instrument(skip(self))]
    pub async fn profile(&self, user_id: Uuid) -> Result<ProfileView, AccountError> {
        let user = self
            .store
            .find_by_id(user_id)
            .await
            .map_err(store_err)?
            .ok_or(AccountError::ProfileNotFound)?;
        Ok(ProfileView::from(&user))
    }

    /// Writes the profile and a fresh verification code together, then mails
    /// the code and sends a welcome SMS in the background.
    #[instrument(skip(self, fields))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        fields: ProfileFields,
    ) -> Result<ProfileView, AccountError> {
        if let Some(id) = fields.national_id.as_deref().filter(|s| !s.is_empty()) {
            if !is_valid_national_id(id) {
                warn!(%user_id, "invalid national id format");
                return Err(AccountError::InvalidFormat("DNI/NIE format"));
            }
        }

        let challenge = VerificationChallenge {
            code: generate_verification_code(),
            expires_at: OffsetDateTime::now_utc() + self.code_ttl,
        };
        let user = self
            .store
            .update_profile(user_id, &fields, &challenge)
            .await
            .map_err(store_err)?
            .ok_or(AccountError::ProfileNotFound)?;

        self.notifier.confirmation_email(&user.email, &challenge.code);
        match user.profile.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(phone) => {
                self.notifier.welcome_sms(
                    phone,
                    user.profile.name.as_deref(),
                    user.profile.last_name.as_deref(),
                );
            }
            None => warn!(user_id = %user.id, "no phone on profile; welcome sms skipped"),
        }

        info!(user_id = %user.id, "profile updated");
        Ok(ProfileView::from(&user))
    }

    /// Confirms the account when `code` is the current, unexpired code.
    /// Codes are single-use.
    #[instrument(skip(self, code))]
    pub async fn verify_email(&self, email: &str, code: &str) -> Result<(), AccountError> {
        let email = normalize_email(email);
        let user = self
            .store
            .find_by_email(&email)
            .await
            .map_err(store_err)?
            .ok_or(AccountError::ProfileNotFound)?;

        let now = OffsetDateTime::now_utc();
        let live = match (&user.verification_code, user.verification_expires_at) {
            (Some(stored), Some(expires_at)) => stored == code && now < expires_at,
            _ => false,
        };
        if !live || !self.store.confirm(user.id, code).await.map_err(store_err)? {
            warn!(user_id = %user.id, "verification code rejected");
            return Err(AccountError::InvalidCode);
        }

        info!(user_id = %user.id, "account confirmed");
        Ok(())
    }

    /// Acknowledges the end of a session. Tokens are stateless, so nothing is
    /// written and the token stays valid until it expires.
    #[instrument(skip(self))]
    pub fn logout(&self, user_id: Uuid) {
        info!(%user_id, "user logged out");
    }
}
