use async_trait::async_trait;
use html_escape::{encode_double_quoted_attribute, encode_text};
use log::{error, info};
use mockall::automock;
use reqwest::Client;

use crate::{
    env_config::MailConfig,
    error::{AppError, Res},
};

#[automock]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_mail(&self, to: &str, subject: &str, html_body: &str) -> Res<()>;
}

/// Sends mail through an HTTP mail API (`{from, to, subject, html}` JSON).
pub struct HttpMailer {
    client: Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Self {
        HttpMailer {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_mail(&self, to: &str, subject: &str, html_body: &str) -> Res<()> {
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&serde_json::json!({
                "from": format!("{} <{}>", self.config.sender_name, self.config.sender),
                "to": [to],
                "subject": subject,
                "html": html_body,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            error!("Could not send email to {}: {}", to, status);
            return Err(AppError::Internal(format!(
                "Mail API returned error status: {}",
                status
            )));
        }

        info!("Email sent to {}", to);
        Ok(())
    }
}

pub fn verification_subject(sender_name: &str) -> String {
    format!("Welcome to {} - Verify Your Email", sender_name)
}

/// Every interpolated value is HTML-escaped; the address is user input.
pub fn verification_email(sender_name: &str, verification_link: &str, email: &str) -> String {
    let sender_name = encode_text(sender_name);
    let email = encode_text(email);
    let link_href = encode_double_quoted_attribute(verification_link);
    let link_text = encode_text(verification_link);
    format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; color: #1f2937;">
    <h2>Welcome to {sender_name}!</h2>
    <p>Thanks for signing up with <strong>{email}</strong>.</p>
    <p>Please confirm your email address to activate your workspace:</p>
    <p>
      <a href="{link_href}"
         style="display: inline-block; padding: 10px 20px; background: #2563eb; color: #ffffff; text-decoration: none; border-radius: 6px;">
        Verify my account
      </a>
    </p>
    <p>If the button does not work, paste this link into your browser:</p>
    <p>{link_text}</p>
  </body>
</html>
"#
    )
}
