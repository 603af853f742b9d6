// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

//! Outbound mail via an HTTP mail relay.
//!
//! The relay is configured from the environment (see `config.rs`). When no
//! relay is configured the mailer runs disabled: sends are logged and
//! reported as successful, which keeps development setups and tests free of
//! network dependencies.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tracing::info;

use crate::config::MailConfig;

const RELAY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("mail relay client could not be built: {0}")]
    Client(String),

    #[error("mail relay request failed: {0}")]
    Request(String),

    #[error("mail relay rejected message: {0}")]
    Rejected(String),
}

#[derive(Clone)]
struct Relay {
    url: String,
    api_key: Option<String>,
    from: String,
    http: Client,
}

/// Mail relay client.
#[derive(Clone)]
pub struct Mailer {
    relay: Option<Relay>,
}

impl Mailer {
    /// Build a mailer against the configured relay.
    pub fn new(config: MailConfig) -> Result<Self, MailerError> {
        let http = Client::builder()
            .timeout(RELAY_TIMEOUT)
            .build()
            .map_err(|e| MailerError::Client(e.to_string()))?;

        Ok(Self {
            relay: Some(Relay {
                url: config.relay_url,
                api_key: config.api_key,
                from: config.from,
                http,
            }),
        })
    }

    /// A mailer that logs instead of sending.
    pub fn disabled() -> Self {
        Self { relay: None }
    }

    /// Send the password-reset link to a user.
    pub async fn send_reset_link(
        &self,
        to: &str,
        name: &str,
        reset_url: &str,
    ) -> Result<(), MailerError> {
        let first = first_name(name);
        let body = format!(
            "Hi {first},\n\n\
             A password reset was requested for your DailyBudget account.\n\
             Follow this link within the next hour to choose a new password:\n\n\
             {reset_url}\n\n\
             If you did not request this, you can ignore this message."
        );
        self.send(to, "Reset your password for DailyBudget!", &body)
            .await
    }

    /// Confirm a completed password reset.
    pub async fn send_reset_confirmation(&self, to: &str, name: &str) -> Result<(), MailerError> {
        let first = first_name(name);
        let body = format!(
            "Hi {first},\n\n\
             The password for your DailyBudget account has been changed.\n\
             If this wasn't you, request a new reset link immediately."
        );
        self.send(to, "DailyBudget Password Reset Confirmation", &body)
            .await
    }

    async fn send(&self, to: &str, subject: &str, text: &str) -> Result<(), MailerError> {
        let Some(relay) = &self.relay else {
            info!(%to, %subject, "mail relay not configured, skipping send");
            return Ok(());
        };

        let payload = json!({
            "from": relay.from,
            "to": to,
            "subject": subject,
            "text": text,
        });

        let mut request = relay.http.post(&relay.url).json(&payload);
        if let Some(key) = &relay.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailerError::Request(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(MailerError::Rejected(response.status().to_string()))
        }
    }
}

fn first_name(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_mailer_reports_success() {
        let mailer = Mailer::disabled();
        mailer
            .send_reset_link("a@example.com", "Test Person", "http://x/reset_password?token=t")
            .await
            .unwrap();
        mailer
            .send_reset_confirmation("a@example.com", "Test Person")
            .await
            .unwrap();
    }

    #[test]
    fn first_name_takes_leading_word() {
        assert_eq!(first_name("Ada Lovelace"), "Ada");
        assert_eq!(first_name("Plato"), "Plato");
        assert_eq!(first_name(""), "");
    }
}
