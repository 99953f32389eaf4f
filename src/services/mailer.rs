use anyhow::Context;
use async_trait::async_trait;
use tracing::{info, warn};

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        text: &str,
    ) -> anyhow::Result<()>;
}

pub struct MailgunMailer {
    client: reqwest::Client,
    api_key: String,
    domain: String,
}

impl MailgunMailer {
    pub fn new(
        client: reqwest::Client,
        api_key: String,
        domain: String,
    ) -> Self {
        Self {
            client,
            api_key,
            domain,
        }
    }
}

#[async_trait]
impl Mailer for MailgunMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        text: &str,
    ) -> anyhow::Result<()> {
        let url = format!("https://api.mailgun.net/v3/{}/messages", self.domain);
        let from = format!("Stride Places <no-reply@{}>", self.domain);

        let response = self
            .client
            .post(&url)
            .basic_auth("api", Some(&self.api_key))
            .form(&[("from", from.as_str()), ("to", to), ("subject", subject), ("text", text)])
            .send()
            .await
            .context("Failed to reach Mailgun")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Mailgun refused message to {} with status {}: {}", to, status, body);
            anyhow::bail!("Mailgun returned HTTP {}", status);
        }

        info!("Sent \"{}\" to {}", subject, to);
        Ok(())
    }
}

/// Used when no mail provider is configured; the message only reaches the logs.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        text: &str,
    ) -> anyhow::Result<()> {
        warn!("Mail provider not configured, would have sent \"{}\" to {}:\n{}", subject, to, text);
        Ok(())
    }
}
