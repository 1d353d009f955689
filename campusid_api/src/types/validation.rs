use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field-keyed error map returned with HTTP 422.
///
/// ```json
/// {"message": "The given data was invalid.", "errors": {"last_name": ["The last name field is required."]}}
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.values().all(|v| v.is_empty())
    }

    /// Messages recorded against `field`.
    pub fn field(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every message in field order.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.errors.values().flatten().map(String::as_str)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.messages().collect();
        if messages.is_empty() {
            write!(f, "{}", self.message.as_deref().unwrap_or("invalid data"))
        } else {
            write!(f, "{}", messages.join("; "))
        }
    }
}
