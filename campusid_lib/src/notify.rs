//! Transient user-facing messages (what the web client shows as toasts).

use campusid_api::types::ValidationErrors;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }

    /// One error notification per field message.
    pub fn from_validation(errors: &ValidationErrors) -> Vec<Notification> {
        let notifications: Vec<Notification> = errors.messages().map(Notification::error).collect();
        if notifications.is_empty() {
            let message = errors
                .message
                .clone()
                .unwrap_or_else(|| "The submitted data is invalid.".to_string());
            return vec![Notification::error(message)];
        }
        notifications
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_notification_per_message() {
        let mut errors = ValidationErrors::new();
        errors.add("last_name", "The last name field is required.");
        errors.add("section", "The section must be 2 characters.");
        errors.add("section", "The section format is invalid.");
        let notes = Notification::from_validation(&errors);
        assert_eq!(notes.len(), 3);
        assert!(notes.iter().all(|n| n.level == Level::Error));
    }

    #[test]
    fn bare_message_still_notifies() {
        let errors = ValidationErrors {
            message: Some("Too many attempts.".to_string()),
            ..Default::default()
        };
        let notes = Notification::from_validation(&errors);
        assert_eq!(notes, vec![Notification::error("Too many attempts.")]);
    }
}
