//! Email notifications for workflow events.
//!
//! Uses `lettre` for SMTP transport. Notification delivery is best-effort:
//! callers log failures and move on, a failed send never rolls back an
//! already-committed approval.

use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use crate::config::EmailConfig;

/// Email service errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for workflow notifications.
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Creates an SMTP transport.
    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| EmailError::SendError(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build();

        Ok(transport)
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(
                self.config
                    .from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.config.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| EmailError::BuildError(e.to_string()))?;

        let transport = self.create_transport()?;
        transport
            .send(message)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        Ok(())
    }

    /// Notifies the assignees of a stage that a request awaits their action.
    ///
    /// # Errors
    ///
    /// Returns an error if any email cannot be sent.
    pub async fn notify_stage_assignees(
        &self,
        recipients: &[String],
        code: &str,
        stage: &str,
    ) -> Result<(), EmailError> {
        for to in recipients {
            self.send(
                to,
                &format!("[Kintai] Request {code} awaits your approval"),
                format!("Request {code} is pending at stage {stage}. Please review it."),
            )
            .await?;
        }
        Ok(())
    }

    /// Notifies the applicant that their request was rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn notify_rejected(
        &self,
        to: &str,
        code: &str,
        reason: &str,
    ) -> Result<(), EmailError> {
        self.send(
            to,
            &format!("[Kintai] Request {code} was rejected"),
            format!("Your request {code} was rejected. Reason: {reason}"),
        )
        .await
    }

    /// Notifies the applicant that their request completed all stages.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn notify_completed(&self, to: &str, code: &str) -> Result<(), EmailError> {
        self.send(
            to,
            &format!("[Kintai] Request {code} approved"),
            format!("Your request {code} has been fully approved."),
        )
        .await
    }

    /// Notifies the applicant that their request was cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the email cannot be sent.
    pub async fn notify_cancelled(
        &self,
        to: &str,
        code: &str,
        reason: &str,
    ) -> Result<(), EmailError> {
        self.send(
            to,
            &format!("[Kintai] Request {code} cancelled"),
            format!("Your request {code} has been cancelled. Reason: {reason}"),
        )
        .await
    }
}
