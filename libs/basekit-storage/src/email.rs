//! Email sender contract and fire-and-forget dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use basekit_errors::{Problem, catalog};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info};

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email has no recipient")]
    MissingRecipient,

    #[error("email needs a body or an html body")]
    MissingBody,

    #[error("email transport failed: {0}")]
    Transport(String),
}

impl EmailError {
    pub fn to_problem(&self) -> Problem {
        let def = match self {
            EmailError::MissingRecipient | EmailError::MissingBody => catalog::INVALID_VALUE,
            EmailError::Transport(_) => catalog::INTERNAL,
        };
        def.as_problem(self.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailMessage {
    pub recipient: String,
    pub subject: String,
    pub body: Option<String>,
    pub html_body: Option<String>,
}

impl EmailMessage {
    pub fn new(recipient: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_html_body(mut self, html: impl Into<String>) -> Self {
        self.html_body = Some(html.into());
        self
    }

    /// Plain text wins over HTML when both are set.
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.body.is_none() && self.html_body.is_some()
    }

    /// # Errors
    /// `MissingRecipient` or `MissingBody`.
    pub fn validate(&self) -> Result<(), EmailError> {
        if self.recipient.trim().is_empty() {
            return Err(EmailError::MissingRecipient);
        }
        let has = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.is_empty());
        if !has(&self.body) && !has(&self.html_body) {
            return Err(EmailError::MissingBody);
        }
        Ok(())
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// Sender that only logs; for development and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl EmailSender for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        message.validate()?;
        info!(
            recipient = %message.recipient,
            subject = %message.subject,
            html = message.is_html(),
            "email sent"
        );
        Ok(())
    }
}

/// Send `message` in the background. Failures are logged, never returned.
///
/// The task runs in the caller's current span.
pub fn dispatch(sender: Arc<dyn EmailSender>, message: EmailMessage) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            if let Err(e) = sender.send(&message).await {
                error!(recipient = %message.recipient, error = %e, "email delivery failed");
            }
        }
        .in_current_span(),
    )
}
