//! Typed payloads for known message kinds
//!
//! Kinds outside [`EmailKind`] stay opaque JSON; kinds inside it must carry an
//! [`EmailNotification`]. The check runs when a transport builds its envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::ContractError;

/// Destination used for email notifications
pub const EMAIL_NOTIFICATIONS: &str = "emailNotifications";

/// Email notification kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailKind {
    OtpEmail,
    WelcomeEmail,
    PasswordReset,
    NotificationEmail,
}

impl EmailKind {
    pub const ALL: [EmailKind; 4] = [
        Self::OtpEmail,
        Self::WelcomeEmail,
        Self::PasswordReset,
        Self::NotificationEmail,
    ];

    /// Kind tag as carried by [`crate::Message::kind`]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OtpEmail => "OTP_EMAIL",
            Self::WelcomeEmail => "WELCOME_EMAIL",
            Self::PasswordReset => "PASSWORD_RESET",
            Self::NotificationEmail => "NOTIFICATION_EMAIL",
        }
    }

    /// Look up a kind tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == tag)
    }
}

impl fmt::Display for EmailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendered email handed to the email worker behind the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailNotification {
    #[serde(rename = "type")]
    pub kind: EmailKind,
    pub email: String,
    pub subject: String,
    pub html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl EmailNotification {
    pub fn new(
        kind: EmailKind,
        email: impl Into<String>,
        subject: impl Into<String>,
        html: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            email: email.into(),
            subject: subject.into(),
            html: html.into(),
            text: None,
        }
    }

    /// Attach a plain-text alternative
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    fn check(&self) -> Result<(), ContractError> {
        if !self.email.contains('@') {
            return Err(ContractError::invalid_payload(
                self.kind.as_str(),
                format!("'{}' is not an email address", self.email),
            ));
        }
        if self.subject.trim().is_empty() {
            return Err(ContractError::invalid_payload(
                self.kind.as_str(),
                "subject cannot be empty",
            ));
        }
        Ok(())
    }
}

/// Check `payload` against the schema registered for `kind`.
///
/// Unknown kinds pass through untouched.
pub fn validate_payload(kind: &str, payload: &Value) -> Result<(), ContractError> {
    let Some(email_kind) = EmailKind::from_tag(kind) else {
        return Ok(());
    };

    let email = EmailNotification::deserialize(payload)
        .map_err(|e| ContractError::invalid_payload(kind, e.to_string()))?;

    if email.kind != email_kind {
        return Err(ContractError::invalid_payload(
            kind,
            format!("payload type '{}' does not match message kind", email.kind),
        ));
    }

    email.check()
}
