//! Outbound user notifications.
//!
//! Every message is handed to a background task and retried with exponential
//! backoff and jitter until it is delivered or `max_attempts` is reached.
//! Delivery outcome never reaches the request that triggered it; exhausted
//! deliveries are logged as notification failures.

pub mod email;
pub mod sms;

use std::{sync::Arc, time::Duration};

use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::NotifyConfig;

pub use email::{EmailMessage, EmailSender, HttpEmailSender};
pub use sms::{SmsMessage, SmsSender, TwilioSmsSender};

#[derive(Clone, Debug)]
enum Notification {
    Email(EmailMessage),
    Sms(SmsMessage),
}

impl Notification {
    fn channel(&self) -> &'static str {
        match self {
            Self::Email(_) => "email",
            Self::Sms(_) => "sms",
        }
    }

    fn recipient(&self) -> &str {
        match self {
            Self::Email(m) => &m.to,
            Self::Sms(m) => &m.to,
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    email: Arc<dyn EmailSender>,
    sms: Arc<dyn SmsSender>,
    retry: NotifyConfig,
    app_name: String,
}

impl Notifier {
    pub fn new(
        email: Arc<dyn EmailSender>,
        sms: Arc<dyn SmsSender>,
        retry: NotifyConfig,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            email,
            sms,
            retry,
            app_name: app_name.into(),
        }
    }

    pub fn welcome_email(&self, to: &str, name: Option<&str>) -> JoinHandle<()> {
        let greeting = match name {
            Some(n) if !n.trim().is_empty() => format!("Welcome, {}!", n.trim()),
            _ => "Welcome!".to_string(),
        };
        self.dispatch(Notification::Email(EmailMessage {
            to: to.to_string(),
            subject: "Welcome to the application".into(),
            body: format!("{greeting} Thanks for signing up."),
        }))
    }

    pub fn confirmation_email(&self, to: &str, code: &str) -> JoinHandle<()> {
        self.dispatch(Notification::Email(EmailMessage {
            to: to.to_string(),
            subject: "Email confirmation".into(),
            body: format!("Your verification code is: {code}"),
        }))
    }

    pub fn welcome_sms(
        &self,
        to: &str,
        name: Option<&str>,
        last_name: Option<&str>,
    ) -> JoinHandle<()> {
        let full_name = [name, last_name]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let body = if full_name.is_empty() {
            format!("Welcome to {}! Thanks for signing up.", self.app_name)
        } else {
            format!("Welcome to {}, {full_name}! Thanks for signing up.", self.app_name)
        };
        self.dispatch(Notification::Sms(SmsMessage {
            to: to.to_string(),
            body,
        }))
    }

    fn dispatch(&self, notification: Notification) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.deliver(notification).await })
    }

    async fn deliver(&self, notification: Notification) {
        let max_attempts = self.retry.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let result = match &notification {
                Notification::Email(m) => self.email.send(m).await,
                Notification::Sms(m) => self.sms.send(m).await,
            };
            match result {
                Ok(()) => {
                    info!(
                        channel = notification.channel(),
                        to = %notification.recipient(),
                        attempt,
                        "notification delivered"
                    );
                    return;
                }
                Err(e) if attempt < max_attempts => {
                    let delay =
                        backoff_delay(attempt, self.retry.backoff_base(), self.retry.backoff_max());
                    warn!(
                        channel = notification.channel(),
                        to = %notification.recipient(),
                        attempt,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "notification attempt failed"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        channel = notification.channel(),
                        to = %notification.recipient(),
                        attempt,
                        error = %e,
                        "notification failure; giving up"
                    );
                }
            }
        }
    }
}

fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let shift = attempt.saturating_sub(1).min(31);
    let delay = base.checked_mul(1u32 << shift).unwrap_or(max);
    jitter_delay(delay.min(max))
}

fn jitter_delay(delay: Duration) -> Duration {
    let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    if delay_ms < 2 {
        return delay;
    }
    let half = delay_ms / 2;
    Duration::from_millis(half + rand::thread_rng().gen_range(0..=half))
}
