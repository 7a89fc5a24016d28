//! Notification fan-out: one order event becomes one persisted notification
//! and one push attempt per administrator, plus a best-effort email each.
//!
//! For every recipient the notification row is written before any push is
//! attempted for it. A failure for one recipient is logged and the loop moves
//! on to the next. Nothing here ever fails the order flow that triggered it.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use dadaba_core::{
    Error, Mailer, NewNotification, NotificationRepository, OrderEvent, PushMessage, Recipient,
    Result, UserDirectory, ADMINS_GROUP,
};

use crate::gateway::{DeliveryReport, PushSink};
use crate::mailer::order_email;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Which live connections receive each persisted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PushTargeting {
    /// Every row is broadcast to the whole "admins" group, so each admin
    /// connection receives one frame per recipient row.
    #[default]
    Group,
    /// Every row goes only to its own recipient's connections.
    Recipient,
}

impl FromStr for PushTargeting {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "group" => Ok(PushTargeting::Group),
            "recipient" => Ok(PushTargeting::Recipient),
            other => Err(Error::Config(format!(
                "PUSH_TARGETING must be 'group' or 'recipient', got '{}'",
                other
            ))),
        }
    }
}

/// Fan-out configuration.
#[derive(Debug, Clone)]
pub struct FanoutConfig {
    pub targeting: PushTargeting,
    /// Base URL used for links in emails.
    pub frontend_url: String,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            targeting: PushTargeting::default(),
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

impl FanoutConfig {
    /// Read `PUSH_TARGETING` and `FRONTEND_URL`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let targeting = match std::env::var("PUSH_TARGETING") {
            Ok(v) if !v.is_empty() => v.parse()?,
            _ => defaults.targeting,
        };
        Ok(Self {
            targeting,
            frontend_url: std::env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
        })
    }

    pub fn with_targeting(mut self, targeting: PushTargeting) -> Self {
        self.targeting = targeting;
        self
    }
}

// =============================================================================
// REPORT
// =============================================================================

/// What one fan-out did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    /// Administrators resolved for the event.
    pub recipients: usize,
    /// Notification rows written.
    pub persisted: usize,
    /// Recipients whose row could not be written.
    pub persist_failures: usize,
    /// Push deliveries attempted (one per persisted row).
    pub push_attempts: usize,
    /// Frames enqueued on live connections across all attempts.
    pub frames_enqueued: usize,
}

// =============================================================================
// EMITTER
// =============================================================================

/// Fan-out orchestrator. Cheap to clone.
#[derive(Clone)]
pub struct FanoutEmitter {
    notifications: Arc<dyn NotificationRepository>,
    users: Arc<dyn UserDirectory>,
    push: Arc<dyn PushSink>,
    mailer: Arc<dyn Mailer>,
    config: FanoutConfig,
}

impl std::fmt::Debug for FanoutEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutEmitter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FanoutEmitter {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        users: Arc<dyn UserDirectory>,
        push: Arc<dyn PushSink>,
        mailer: Arc<dyn Mailer>,
        config: FanoutConfig,
    ) -> Self {
        Self {
            notifications,
            users,
            push,
            mailer,
            config,
        }
    }

    pub fn config(&self) -> &FanoutConfig {
        &self.config
    }

    /// Run the fan-out on a detached task. Callers may drop the handle.
    pub fn spawn(&self, event: OrderEvent) -> JoinHandle<FanoutReport> {
        let emitter = self.clone();
        tokio::spawn(async move { emitter.fan_out(&event).await })
    }

    /// Persist and push one notification per administrator.
    pub async fn fan_out(&self, event: &OrderEvent) -> FanoutReport {
        let start = Instant::now();
        let mut report = FanoutReport::default();

        let recipients = match self.users.list_administrators().await {
            Ok(recipients) => recipients,
            Err(e) => {
                error!(
                    subsystem = "notify",
                    component = "fanout",
                    op = "resolve_recipients",
                    order_id = %event.order_id,
                    error = %e,
                    "Could not resolve administrators, fan-out skipped"
                );
                return report;
            }
        };
        report.recipients = recipients.len();

        if recipients.is_empty() {
            debug!(
                subsystem = "notify",
                component = "fanout",
                order_id = %event.order_id,
                event = event.kind.as_str(),
                "No administrators, nothing to fan out"
            );
            return report;
        }

        debug!(
            subsystem = "notify",
            component = "fanout",
            order_id = %event.order_id,
            event = event.kind.as_str(),
            recipient_count = recipients.len(),
            targeting = ?self.config.targeting,
            "Fanning out order event"
        );

        for recipient in &recipients {
            let created = self
                .notifications
                .create(NewNotification {
                    recipient_id: recipient.id,
                    kind: event.kind.notification_type(),
                    title: event.title().to_string(),
                    message: event.message(),
                    related_order_id: Some(event.order_id),
                })
                .await;

            let notification = match created {
                Ok(n) => n,
                Err(e) => {
                    report.persist_failures += 1;
                    warn!(
                        subsystem = "notify",
                        component = "fanout",
                        op = "persist",
                        order_id = %event.order_id,
                        recipient_id = %recipient.id,
                        error = %e,
                        "Failed to persist notification, continuing with next recipient"
                    );
                    continue;
                }
            };
            report.persisted += 1;

            let delivery = self.push(recipient.id, PushMessage::Notification(notification));
            report.push_attempts += 1;
            report.frames_enqueued += delivery.enqueued;
        }

        self.spawn_emails(event.clone(), recipients);

        info!(
            subsystem = "notify",
            component = "fanout",
            op = "fan_out",
            order_id = %event.order_id,
            event = event.kind.as_str(),
            recipient_count = report.recipients,
            persisted = report.persisted,
            persist_failures = report.persist_failures,
            delivered = report.frames_enqueued,
            duration_ms = start.elapsed().as_millis() as u64,
            "Fan-out completed"
        );
        report
    }

    fn push(&self, recipient_id: Uuid, message: PushMessage) -> DeliveryReport {
        match self.config.targeting {
            PushTargeting::Group => self.push.deliver_to_group(ADMINS_GROUP, &message),
            PushTargeting::Recipient => self.push.deliver_to_user(recipient_id, &message),
        }
    }

    fn spawn_emails(&self, event: OrderEvent, recipients: Vec<Recipient>) {
        let mailer = self.mailer.clone();
        let frontend_url = self.config.frontend_url.clone();
        tokio::spawn(async move {
            for recipient in &recipients {
                let email = order_email(&event, recipient, &frontend_url);
                if let Err(e) = mailer.send(email).await {
                    warn!(
                        subsystem = "notify",
                        component = "mailer",
                        order_id = %event.order_id,
                        recipient_id = %recipient.id,
                        error = %e,
                        "Failed to email administrator"
                    );
                }
            }
        });
    }
}
