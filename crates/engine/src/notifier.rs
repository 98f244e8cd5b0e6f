//! Outbound invite notifications.
//!
//! Delivery is best effort: the engine calls the notifier after the invite is
//! committed and only logs a failure.

use std::{fmt, future::Future, pin::Pin};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::FamilyRole;

pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InviteNotice {
    pub invited_email: String,
    pub family_name: String,
    pub inviter_name: String,
    pub role: FamilyRole,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Sends invite emails. Returns `true` when the message was handed off.
pub trait InviteNotifier: Send + Sync + fmt::Debug {
    fn notify_invite<'a>(&'a self, notice: &'a InviteNotice) -> NotifyFuture<'a>;
}

/// Logs invites instead of sending them.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl InviteNotifier for LogNotifier {
    fn notify_invite<'a>(&'a self, notice: &'a InviteNotice) -> NotifyFuture<'a> {
        Box::pin(async move {
            tracing::info!(
                email = %notice.invited_email,
                family = %notice.family_name,
                "invite created, no mail relay configured"
            );
            true
        })
    }
}

/// Posts the invite as JSON to a mail relay.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    app_url: Option<String>,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    #[serde(flatten)]
    notice: &'a InviteNotice,
    accept_url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            app_url: None,
        }
    }

    /// Base URL of the web app; adds an `accept_url` to every payload.
    pub fn with_app_url(mut self, app_url: impl Into<String>) -> Self {
        self.app_url = Some(app_url.into());
        self
    }

    fn accept_url(&self, token: &str) -> Option<String> {
        self.app_url
            .as_deref()
            .map(|base| format!("{}/invites/{token}", base.trim_end_matches('/')))
    }
}

impl InviteNotifier for WebhookNotifier {
    fn notify_invite<'a>(&'a self, notice: &'a InviteNotice) -> NotifyFuture<'a> {
        Box::pin(async move {
            let sent = self
                .client
                .post(&self.url)
                .json(&WebhookPayload {
                    notice,
                    accept_url: self.accept_url(&notice.token),
                })
                .send()
                .await
                .and_then(reqwest::Response::error_for_status);
            match sent {
                Ok(_) => true,
                Err(err) => {
                    tracing::warn!("invite relay failed for {}: {err}", notice.invited_email);
                    false
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_url_joins_base_and_token() {
        let notifier = WebhookNotifier::new("http://relay.local/send")
            .with_app_url("https://famledger.example/");
        assert_eq!(
            notifier.accept_url("abc").as_deref(),
            Some("https://famledger.example/invites/abc")
        );
        assert_eq!(WebhookNotifier::new("http://relay.local").accept_url("abc"), None);
    }
}
