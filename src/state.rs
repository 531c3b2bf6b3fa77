use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::postgres::PgPoolOptions;

use crate::{
    auth::{jwt::JwtKeys, repo::PgUserStore, services::AccountService},
    config::AppConfig,
    notify::{HttpEmailSender, Notifier, TwilioSmsSender},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: AccountService,
}

impl FromRef<AppState> for AccountService {
    fn from_ref(state: &AppState) -> Self {
        state.accounts.clone()
    }
}

impl AppState {
    /// Connects to Postgres, applies migrations and wires the collaborators.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build http client")?;

        let notifier = Notifier::new(
            Arc::new(HttpEmailSender::new(http.clone(), &config.email)),
            Arc::new(TwilioSmsSender::new(http, &config.sms)),
            config.notify,
            config.app_name.clone(),
        );

        let accounts = AccountService::new(
            Arc::new(PgUserStore::new(db)),
            JwtKeys::from_config(&config.jwt),
            notifier,
            config.verification_ttl_minutes,
        );

        Ok(Self::from_parts(config, accounts))
    }

    pub fn from_parts(config: Arc<AppConfig>, accounts: AccountService) -> Self {
        Self { config, accounts }
    }
}
