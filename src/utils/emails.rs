use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        PoolConfig,
    },
    Message, SmtpTransport, Transport,
};

use crate::{
    entities::user,
    settings::{EmailBackend, EmailSettings, Settings},
    use_cases::registration::types::SiteContext,
};

const SUBJECT_TEMPLATE: &str = "activation_email_subject.txt";
const TEXT_TEMPLATE: &str = "activation_email.txt";
const HTML_TEMPLATE: &str = "activation_email.html";

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Could not render email: {0}")]
    Render(#[from] minijinja::Error),
    #[error("Invalid mailbox: {0}")]
    Address(String),
    #[error("Could not send email: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait ActivationMailer: Send + Sync {
    async fn send_activation_email(
        &self,
        user: &user::Model,
        activation_key: &str,
        site: &SiteContext,
    ) -> Result<(), EmailError>;
}

/// Renders the subject, plain text and html bodies of an activation email.
/// The subject is always collapsed to a single line.
pub fn render_activation_email(
    user: &user::Model,
    activation_key: &str,
    site: &SiteContext,
) -> Result<RenderedEmail, EmailError> {
    let ctx = minijinja::context! {
        user => user,
        activation_key => activation_key,
        activation_link => site.activation_link(activation_key),
        expiration_days => site.activation_days,
        site => site,
    };

    let subject = crate::ENV.get_template(SUBJECT_TEMPLATE)?.render(&ctx)?;
    let subject = subject
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let text = crate::ENV.get_template(TEXT_TEMPLATE)?.render(&ctx)?;
    let html = crate::ENV.get_template(HTML_TEMPLATE)?.render(&ctx)?;

    Ok(RenderedEmail {
        subject,
        text,
        html,
    })
}

pub struct SmtpMailer {
    sender: Mailbox,
    transport: SmtpTransport,
}

impl SmtpMailer {
    pub fn new(settings: &EmailSettings) -> Result<Self, EmailError> {
        let sender = settings
            .sender
            .parse()
            .map_err(|e: lettre::address::AddressError| EmailError::Address(e.to_string()))?;
        let credentials = Credentials::new(
            settings.host_user.clone(),
            settings.host_user_password.clone(),
        );
        let transport = SmtpTransport::starttls_relay(&settings.host)
            .map_err(|e| EmailError::Transport(e.to_string()))?
            .credentials(credentials)
            .authentication(vec![Mechanism::Plain])
            .pool_config(PoolConfig::new().max_size(20))
            .build();
        Ok(Self { sender, transport })
    }
}

#[async_trait]
impl ActivationMailer for SmtpMailer {
    #[tracing::instrument(
        name = "Sending activation email.",
        skip(self, user, activation_key, site),
        fields(recipient_username = %user.username, recipient_email = %user.email)
    )]
    async fn send_activation_email(
        &self,
        user: &user::Model,
        activation_key: &str,
        site: &SiteContext,
    ) -> Result<(), EmailError> {
        let rendered = render_activation_email(user, activation_key, site)?;
        let recipient: Mailbox = format!("{} <{}>", user.username, user.email)
            .parse()
            .map_err(|e: lettre::address::AddressError| EmailError::Address(e.to_string()))?;

        let email = Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(rendered.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(rendered.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(rendered.html),
                    ),
            )
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        let transport = self.transport.clone();
        let res = actix_web::rt::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;
        match res {
            Ok(_) => {
                tracing::event!(target: "backend", tracing::Level::INFO, "Email successfully sent!");
                Ok(())
            }
            Err(e) => {
                tracing::event!(target: "backend", tracing::Level::ERROR, "Could not send email: {:#?}", e);
                Err(EmailError::Transport(e.to_string()))
            }
        }
    }
}

/// Keeps every message in an outbox instead of delivering it.
#[derive(Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<SentEmail>>,
    failing: bool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            outbox: Mutex::new(vec![]),
            failing: true,
        }
    }

    pub fn outbox(&self) -> Vec<SentEmail> {
        match self.outbox.lock() {
            Ok(outbox) => outbox.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl ActivationMailer for MemoryMailer {
    async fn send_activation_email(
        &self,
        user: &user::Model,
        activation_key: &str,
        site: &SiteContext,
    ) -> Result<(), EmailError> {
        if self.failing {
            return Err(EmailError::Transport("Connection refused".to_string()));
        }
        let rendered = render_activation_email(user, activation_key, site)?;
        let email = SentEmail {
            to: user.email.clone(),
            subject: rendered.subject,
            text: rendered.text,
            html: rendered.html,
        };
        match self.outbox.lock() {
            Ok(mut outbox) => outbox.push(email),
            Err(poisoned) => poisoned.into_inner().push(email),
        }
        Ok(())
    }
}

pub fn build_mailer(settings: &Settings) -> Result<Arc<dyn ActivationMailer>, EmailError> {
    match settings.email.backend {
        EmailBackend::Smtp => Ok(Arc::new(SmtpMailer::new(&settings.email)?)),
        EmailBackend::Memory => Ok(Arc::new(MemoryMailer::new())),
    }
}
