//! Best-effort email sent when a task is created.
//!
//! Delivery runs on a spawned task and every failure ends in a log line. Nothing here
//! can fail or delay the request that created the task.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::MailConfig;
use crate::models::User;

pub const TASK_CREATED_SUBJECT: &str = "New To-Do Created";

#[derive(Debug)]
pub enum NotifyError {
    /// No mail credentials were configured.
    NotConfigured,
    /// The recipient or sender address could not be parsed.
    Address(String),
    /// Building or sending the message failed.
    Transport(String),
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NotifyError::NotConfigured => write!(f, "mail transport is not configured"),
            NotifyError::Address(msg) => write!(f, "invalid address: {}", msg),
            NotifyError::Transport(msg) => write!(f, "mail transport error: {}", msg),
        }
    }
}

impl std::error::Error for NotifyError {}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_task_created(&self, user: &User, title: &str) -> Result<(), NotifyError>;
}

pub fn task_created_body(user: &User, title: &str) -> String {
    format!(
        "Hello {},\n\nA new to-do item with the title '{}' has been created in your account.",
        user.email, title
    )
}

/// Fire-and-forget delivery on the current actix runtime.
pub fn dispatch_task_created(notifier: Arc<dyn Notifier>, user: User, title: String) {
    actix_web::rt::spawn(async move {
        match notifier.notify_task_created(&user, &title).await {
            Ok(()) => log::debug!("Sent task-created email to user {}", user.id),
            Err(e) => log::warn!("Error sending email to user {}: {}", user.id, e),
        }
    });
}

/// Sends mail through an SMTP relay over implicit TLS.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &MailConfig) -> Result<Self, NotifyError> {
        let sender = config
            .username
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Address(e.to_string()))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self { transport, sender })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify_task_created(&self, user: &User, title: &str) -> Result<(), NotifyError> {
        let recipient = user
            .email
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Address(e.to_string()))?;
        let message = Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(TASK_CREATED_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(task_created_body(user, title))
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Installed when no mail credentials are configured.
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify_task_created(&self, _user: &User, _title: &str) -> Result<(), NotifyError> {
        Err(NotifyError::NotConfigured)
    }
}

/// Picks the SMTP notifier when credentials exist, otherwise the disabled one.
pub fn from_config(mail: Option<&MailConfig>) -> Arc<dyn Notifier> {
    match mail.map(SmtpNotifier::new) {
        Some(Ok(smtp)) => Arc::new(smtp),
        Some(Err(e)) => {
            log::warn!("Mail disabled: {}", e);
            Arc::new(DisabledNotifier)
        }
        None => {
            log::info!("MAIL_USERNAME/MAIL_PASSWORD not set; task emails disabled");
            Arc::new(DisabledNotifier)
        }
    }
}
