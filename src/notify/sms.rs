use anyhow::Context;
use async_trait::async_trait;

use crate::config::SmsConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmsMessage {
    pub to: String,
    pub body: String,
}

#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, message: &SmsMessage) -> anyhow::Result<()>;
}

/// Twilio Messages API client.
#[derive(Clone)]
pub struct TwilioSmsSender {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    api_base: String,
}

impl TwilioSmsSender {
    pub fn new(client: reqwest::Client, cfg: &SmsConfig) -> Self {
        Self {
            client,
            account_sid: cfg.account_sid.clone(),
            auth_token: cfg.auth_token.clone(),
            from_number: cfg.from_number.clone(),
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }
}

#[async_trait]
impl SmsSender for TwilioSmsSender {
    async fn send(&self, message: &SmsMessage) -> anyhow::Result<()> {
        self.client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", message.to.as_str()),
                ("From", self.from_number.as_str()),
                ("Body", message.body.as_str()),
            ])
            .send()
            .await
            .context("twilio request")?
            .error_for_status()
            .context("twilio rejected message")?;
        Ok(())
    }
}
