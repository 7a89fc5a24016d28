//! Outbound email: SMTP transport, a no-op fallback, and the order templates.
//!
//! Email is a side channel. Failures are logged by the caller and never
//! reach the order flow.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, warn};

use dadaba_core::defaults::CURRENCY_LABEL;
use dadaba_core::{Error, Mailer, OrderEvent, OrderEventKind, OutgoingEmail, Recipient, Result};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// SMTP settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl SmtpConfig {
    /// Read `SMTP_HOST`, `SMTP_PORT`, `SMTP_USER`, `SMTP_PASS` and
    /// `EMAIL_FROM`. Returns `None` unless all are set.
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Some(Self {
            host: var("SMTP_HOST")?,
            port: var("SMTP_PORT")?.parse().ok()?,
            username: var("SMTP_USER")?,
            password: var("SMTP_PASS")?,
            from: var("EMAIL_FROM")?,
        })
    }

    /// Port 465 speaks implicit TLS; anything else upgrades with STARTTLS.
    pub fn implicit_tls(&self) -> bool {
        self.port == 465
    }
}

// =============================================================================
// TRANSPORTS
// =============================================================================

/// Sends mail through an SMTP relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let builder = if config.implicit_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| Error::Config(format!("SMTP relay configuration error: {}", e)))?;

        let from = config
            .from
            .parse()
            .map_err(|e| Error::Config(format!("Invalid EMAIL_FROM: {}", e)))?;

        Ok(Self {
            transport: builder.port(config.port).credentials(credentials).build(),
            from,
        })
    }

    fn build_message(&self, email: &OutgoingEmail) -> Result<Message> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| Error::Mail(format!("Invalid recipient address: {}", e)))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html.clone()),
                    ),
            )
            .map_err(|e| Error::Mail(format!("Failed to build email: {}", e)))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        let message = self.build_message(&email)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| Error::Mail(e.to_string()))?;
        debug!(
            subsystem = "notify",
            component = "mailer",
            op = "send",
            code = %response.code(),
            "Email sent"
        );
        Ok(())
    }
}

/// Discards every email. Used when SMTP is not configured.
#[derive(Debug, Clone, Default)]
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        debug!(
            subsystem = "notify",
            component = "mailer",
            subject = %email.subject,
            "SMTP not configured, email skipped"
        );
        Ok(())
    }
}

/// SMTP mailer when fully configured, otherwise the no-op mailer.
pub fn mailer_from_env() -> Arc<dyn Mailer> {
    match SmtpConfig::from_env() {
        Some(config) => match SmtpMailer::new(&config) {
            Ok(mailer) => Arc::new(mailer),
            Err(e) => {
                warn!(
                    subsystem = "notify",
                    component = "mailer",
                    error = %e,
                    "SMTP configuration rejected, emails will not be sent"
                );
                Arc::new(NoopMailer)
            }
        },
        None => {
            warn!(
                subsystem = "notify",
                component = "mailer",
                "SMTP not configured (SMTP_HOST, SMTP_PORT, SMTP_USER, SMTP_PASS, EMAIL_FROM), emails will not be sent"
            );
            Arc::new(NoopMailer)
        }
    }
}

// =============================================================================
// TEMPLATES
// =============================================================================

/// Escape text interpolated into the HTML part.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render the administrator email for an order event.
///
/// Customer-supplied values are escaped in the HTML part; the text part
/// carries them verbatim.
pub fn order_email(event: &OrderEvent, recipient: &Recipient, frontend_url: &str) -> OutgoingEmail {
    let code = &event.secret_code;
    let customer = &event.customer_name;
    let code_html = html_escape(code);
    let customer_html = html_escape(customer);
    let link = format!(
        "{}/admin/orders/{}",
        frontend_url.trim_end_matches('/'),
        event.order_id
    );

    let (subject, headline_text, headline_html) = match event.kind {
        OrderEventKind::Created => (
            format!("Nouvelle commande {}", code),
            format!("Nouvelle commande {} par {}", code, customer),
            format!(
                "Nouvelle commande <strong>{}</strong> par <strong>{}</strong>",
                code_html, customer_html
            ),
        ),
        OrderEventKind::Confirmed => (
            format!("Commande confirmée {}", code),
            format!("La commande {} a été confirmée par {}.", code, customer),
            format!(
                "La commande <strong>{}</strong> a été confirmée par <strong>{}</strong>",
                code_html, customer_html
            ),
        ),
    };

    OutgoingEmail {
        to: recipient.email.clone(),
        subject,
        text: format!(
            "{}\nTotal: {} {}\nVoir la commande: {}",
            headline_text, event.total, CURRENCY_LABEL, link
        ),
        html: format!(
            "<p>{}</p>\n<p>Total: <strong>{} {}</strong></p>\n<p><a href=\"{}\">Voir la commande</a></p>",
            headline_html,
            event.total,
            CURRENCY_LABEL,
            html_escape(&link)
        ),
    }
}
