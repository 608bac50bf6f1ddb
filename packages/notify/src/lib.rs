#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Alert delivery for geofence entry events.
//!
//! Fire-and-report from the core's perspective: a delivery failure is
//! surfaced to the caller as an error to log, never retried here, and
//! never allowed to block the tracking loop. Delivery goes through an
//! HTTP transactional-mail API; when the mail environment is not
//! configured, [`notifier_from_env`] falls back to a log-only notifier
//! so local development needs no mail account.

use async_trait::async_trait;

/// Errors from alert delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The mail API rejected the message.
    #[error("mail API rejected the message: status {status}")]
    Rejected {
        /// The HTTP status returned.
        status: u16,
    },
}

/// An alert to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    /// Mail subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

impl AlertMessage {
    /// The standard geofence-entry alert for a user and fence.
    #[must_use]
    pub fn fence_entry(user_id: &str, fence_name: &str) -> Self {
        Self {
            subject: format!("Geofence alert: {fence_name}"),
            body: format!(
                "User {user_id} entered the active geofence \"{fence_name}\". \
                 Check the hazard map for current advisories."
            ),
        }
    }
}

/// Trait all alert delivery backends implement.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// Delivers one alert. No retries; the caller owns failure policy.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if delivery fails.
    async fn send_alert(&self, message: &AlertMessage) -> Result<(), NotifyError>;
}

/// Notifier that posts to a transactional-mail HTTP API
/// (Mailgun-style `messages` endpoint with form fields).
pub struct MailApiNotifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
    to: String,
}

impl MailApiNotifier {
    /// Creates a notifier for the given endpoint and addresses.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            from: from.into(),
            to: to.into(),
        }
    }
}

#[async_trait]
impl AlertNotifier for MailApiNotifier {
    async fn send_alert(&self, message: &AlertMessage) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .basic_auth("api", Some(&self.api_key))
            .form(&[
                ("from", self.from.as_str()),
                ("to", self.to.as_str()),
                ("subject", message.subject.as_str()),
                ("text", message.body.as_str()),
            ])
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Rejected {
                status: resp.status().as_u16(),
            })
        }
    }
}

/// Notifier that only logs; delivery always succeeds.
pub struct LogNotifier;

#[async_trait]
impl AlertNotifier for LogNotifier {
    async fn send_alert(&self, message: &AlertMessage) -> Result<(), NotifyError> {
        log::info!("[alert] {}: {}", message.subject, message.body);
        Ok(())
    }
}

/// Builds a notifier from `ALERT_MAIL_ENDPOINT`, `ALERT_MAIL_API_KEY`,
/// `ALERT_MAIL_FROM`, and `ALERT_MAIL_TO`. When any of them is unset,
/// returns a [`LogNotifier`] so alerts still show up somewhere.
#[must_use]
pub fn notifier_from_env() -> Box<dyn AlertNotifier> {
    let vars = [
        std::env::var("ALERT_MAIL_ENDPOINT"),
        std::env::var("ALERT_MAIL_API_KEY"),
        std::env::var("ALERT_MAIL_FROM"),
        std::env::var("ALERT_MAIL_TO"),
    ];

    match vars {
        [Ok(endpoint), Ok(api_key), Ok(from), Ok(to)] => {
            Box::new(MailApiNotifier::new(endpoint, api_key, from, to))
        }
        _ => {
            log::warn!("ALERT_MAIL_* not fully configured; alerts will only be logged");
            Box::new(LogNotifier)
        }
    }
}
