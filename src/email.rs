//! Email transport + addressing + sending.

use std::{fs, time::Duration};

use anyhow::Context;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header},
    transport::{file::AsyncFileTransport, stub::AsyncStubTransport},
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    compose::{OutboundMessage, Recipient},
    config::{ApiConfig, TransportKind},
};

/// Transport selected at runtime (SMTP for prod, FILE or STUB for local dev and tests).
#[derive(Clone)]
pub enum Mailer {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
    Stub(AsyncStubTransport),
}

impl Mailer {
    /// Unified `send` so callers don't care which transport we're using.
    /// Errors are normalized to String to avoid mixing different transport error types.
    pub async fn send(&self, email: Message) -> Result<(), String> {
        match self {
            Mailer::Smtp(m) => m.send(email).await.map(|_| ()).map_err(|e| e.to_string()),
            Mailer::File(f) => f.send(email).await.map(|_| ()).map_err(|e| e.to_string()),
            Mailer::Stub(s) => s.send(email).await.map_err(|e| e.to_string()),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Mailer::Smtp(_) => "smtp",
            Mailer::File(_) => "file",
            Mailer::Stub(_) => "stub",
        }
    }
}

/// Domain errors we surface to the handler layer.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("render error: {0}")]
    RenderError(String),
    #[error("invalid address `{0}`")]
    InvalidAddress(String),
    #[error("message build error: {0}")]
    Build(String),
    #[error("smtp error: {0}")]
    SmtpError(String),
    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}

/// App-wide email state (transport + addressing), immutable after start-up.
#[derive(Clone)]
pub struct EmailState {
    pub mailer: Mailer,
    pub from: Mailbox,
    pub internal_to: Mailbox,
    pub send_timeout: Duration,
}

impl EmailState {
    pub fn new(
        mailer: Mailer,
        from: Mailbox,
        internal_to: Mailbox,
        send_timeout: Duration,
    ) -> Self {
        Self {
            mailer,
            from,
            internal_to,
            send_timeout,
        }
    }

    /// Build state from the loaded configuration.
    pub fn from_config(cfg: &ApiConfig) -> anyhow::Result<Self> {
        let from: Mailbox = cfg
            .mail_from
            .parse()
            .with_context(|| format!("invalid MAIL_FROM `{}`", cfg.mail_from))?;
        let internal_to: Mailbox = cfg
            .mail_to
            .parse()
            .with_context(|| format!("invalid MAIL_TO `{}`", cfg.mail_to))?;

        let mailer = match cfg.transport {
            TransportKind::Smtp => build_smtp_mailer(cfg)?,
            TransportKind::File => build_file_mailer(cfg)?,
            TransportKind::Stub => Mailer::Stub(AsyncStubTransport::new_ok()),
        };
        info!(
            transport = mailer.name(),
            from = %from,
            to = %internal_to,
            "Mail dispatcher ready"
        );
        Ok(Self::new(mailer, from, internal_to, cfg.smtp_timeout))
    }

    /// Probe the SMTP server once. Other transports have nothing to check.
    pub async fn verify(&self) {
        if let Mailer::Smtp(m) = &self.mailer {
            match m.test_connection().await {
                Ok(true) => info!("SMTP server reachable"),
                Ok(false) => warn!("SMTP server did not accept the test connection"),
                Err(e) => warn!(error = %e, "SMTP connection test failed"),
            }
        }
    }

    /// Build the message and send it exactly once, bounded by `send_timeout`.
    pub async fn dispatch(&self, message: OutboundMessage) -> Result<(), EmailError> {
        let email = self.build(message)?;
        match tokio::time::timeout(self.send_timeout, self.mailer.send(email)).await {
            Ok(result) => result.map_err(EmailError::SmtpError),
            Err(_) => Err(EmailError::Timeout(self.send_timeout)),
        }
    }

    /// Turn an `OutboundMessage` into a lettre `Message`: plain text only, or
    /// multipart/alternative (plaintext + html) when an HTML body is present.
    fn build(&self, message: OutboundMessage) -> Result<Message, EmailError> {
        let to = match &message.to {
            Recipient::Internal => self.internal_to.clone(),
            Recipient::Address(addr) => addr
                .trim()
                .parse::<Mailbox>()
                .map_err(|_| EmailError::InvalidAddress(addr.clone()))?,
        };

        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject);
        if let Some(reply_to) = &message.reply_to {
            match reply_to.trim().parse::<Mailbox>() {
                Ok(mb) => builder = builder.reply_to(mb),
                Err(e) => warn!(reply_to = %reply_to, error = %e, "Dropping unparseable reply-to"),
            }
        }

        let email = match message.html {
            Some(html) => builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(message.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html),
                    ),
            ),
            None => builder
                .header(header::ContentType::TEXT_PLAIN)
                .body(message.text),
        };
        email.map_err(|e| EmailError::Build(e.to_string()))
    }
}

/// Build an SMTP transport with creds and a bounded timeout.
/// `smtp_secure` selects implicit TLS, otherwise STARTTLS.
fn build_smtp_mailer(cfg: &ApiConfig) -> anyhow::Result<Mailer> {
    use lettre::transport::smtp::authentication::Credentials;

    let builder = if cfg.smtp_secure {
        AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)?
    };
    let creds = Credentials::new(cfg.smtp_username.clone(), cfg.smtp_password.clone());
    debug!(
        host = %cfg.smtp_host,
        port = cfg.smtp_port,
        secure = cfg.smtp_secure,
        "Building SMTP transport"
    );
    Ok(Mailer::Smtp(
        builder
            .port(cfg.smtp_port)
            .credentials(creds)
            .timeout(Some(cfg.smtp_timeout))
            .build(),
    ))
}

/// Build a file transport (writes `.eml` files), used for local/dev.
fn build_file_mailer(cfg: &ApiConfig) -> anyhow::Result<Mailer> {
    fs::create_dir_all(&cfg.outbox_dir)
        .with_context(|| format!("cannot create outbox {}", cfg.outbox_dir.display()))?;
    Ok(Mailer::File(AsyncFileTransport::new(cfg.outbox_dir.clone())))
}
