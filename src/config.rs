use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub api_base: String,
}

/// Retry schedule for outbound notifications.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NotifyConfig {
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl NotifyConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms.max(self.backoff_base_ms))
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base_ms: 500,
            backoff_max_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub email: EmailConfig,
    pub sms: SmsConfig,
    pub notify: NotifyConfig,
    pub verification_ttl_minutes: i64,
    pub app_name: String,
    pub cors_origin: String,
}

fn required(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var {key}"))
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = required("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "accountd".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "accountd-users".into()),
            ttl_minutes: parsed_or("JWT_TTL_MINUTES", 60),
        };
        let email = EmailConfig {
            api_url: required("EMAIL_API_URL")?,
            api_key: required("EMAIL_API_KEY")?,
            from: required("EMAIL_FROM")?,
        };
        let sms = SmsConfig {
            account_sid: required("TWILIO_ACCOUNT_SID")?,
            auth_token: required("TWILIO_AUTH_TOKEN")?,
            from_number: required("TWILIO_FROM_NUMBER")?,
            api_base: std::env::var("TWILIO_API_BASE")
                .unwrap_or_else(|_| "https://api.twilio.com".into()),
        };
        let defaults = NotifyConfig::default();
        let notify = NotifyConfig {
            max_attempts: parsed_or("NOTIFY_MAX_ATTEMPTS", defaults.max_attempts).max(1),
            backoff_base_ms: parsed_or("NOTIFY_BACKOFF_BASE_MS", defaults.backoff_base_ms),
            backoff_max_ms: parsed_or("NOTIFY_BACKOFF_MAX_MS", defaults.backoff_max_ms),
        };
        Ok(Self {
            database_url,
            jwt,
            email,
            sms,
            notify,
            verification_ttl_minutes: parsed_or("VERIFICATION_TTL_MINUTES", 15),
            app_name: std::env::var("APP_NAME").unwrap_or_else(|_| "Miraklee".into()),
            cors_origin: std::env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:4200".into()),
        })
    }
}
