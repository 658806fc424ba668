use common::EmailConfig;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::{error, info};

use crate::error::EmailError;

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const TEST_SUBJECT: &str = "Portfolio Monitor - Test Email";

const TEST_BODY: &str = "This is a test email from your Portfolio Monitor.

If you're receiving this, your email configuration is working correctly!

You should start receiving weekly portfolio digests on Monday mornings.

---
Portfolio Monitor";

/// Sends plain-text mail through an authenticated STARTTLS submission port.
pub struct EmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    relay: String,
}

impl EmailSender {
    pub fn new(config: &EmailConfig, username: &str, password: &str) -> Result<Self, EmailError> {
        let host = config
            .smtp_host
            .clone()
            .unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string());
        let port = config.smtp_port.unwrap_or(DEFAULT_SMTP_PORT);
        let timeout = Duration::from_secs(config.timeout_seconds.unwrap_or(10));

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
            .map_err(EmailError::Transport)?
            .port(port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            transport,
            from: username.to_string(),
            relay: format!("{}:{}", host, port),
        })
    }

    pub async fn send_digest(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        let message = build_message(&self.from, recipient, subject, body)?;

        info!("Connecting to SMTP server: {}", self.relay);
        info!("Sending email to: {}", recipient);
        match self.transport.send(message).await {
            Ok(_) => {
                info!("Email sent successfully!");
                Ok(())
            }
            Err(e) if is_auth_failure(&e) => {
                error!("SMTP Authentication failed: {}", e);
                error!("Make sure you're using a Gmail App Password, not your regular password");
                error!("See: https://support.google.com/accounts/answer/185833");
                Err(EmailError::Authentication(e))
            }
            Err(e) => {
                error!("Failed to send email: {}", e);
                Err(EmailError::Transport(e))
            }
        }
    }

    /// Fixed message that only proves the credentials and relay work.
    pub async fn send_test_email(&self, recipient: &str) -> Result<(), EmailError> {
        info!("Sending test email...");
        self.send_digest(recipient, TEST_SUBJECT, TEST_BODY).await
    }
}

fn mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address.parse::<Mailbox>().map_err(|source| EmailError::Address {
        address: address.to_string(),
        source,
    })
}

/// Single-part `text/plain` message.
pub fn build_message(
    from: &str,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<Message, EmailError> {
    let message = Message::builder()
        .from(mailbox(from)?)
        .to(mailbox(to)?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())?;
    Ok(message)
}

/// 530/534/535 replies mean the server rejected the login.
fn is_auth_failure(e: &lettre::transport::smtp::Error) -> bool {
    e.status()
        .map(|code| matches!(code.to_string().as_str(), "530" | "534" | "535"))
        .unwrap_or(false)
}
