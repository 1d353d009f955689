use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::de::{flexible_bool, flexible_u8};

pub type StudentId = i64;

/// Whether the card is a first issuance or a replacement of a lost/damaged one.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IdType {
    New,
    Replacement,
}

impl std::fmt::Display for IdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                IdType::New => "new",
                IdType::Replacement => "replacement",
            }
        )?;
        Ok(())
    }
}

impl FromStr for IdType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(IdType::New),
            "replacement" | "replace" => Ok(IdType::Replacement),
            _ => Err(()),
        }
    }
}

/// A student record as projected by the listing endpoints.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Student {
    pub id: StudentId,

    pub id_number: String,

    pub id_type: Option<IdType>,

    pub first_name: String,

    #[serde(default)]
    pub middle_name: Option<String>,

    pub last_name: String,

    #[serde(default)]
    pub suffix: Option<String>,

    #[serde(default)]
    pub campus: Option<String>,

    #[serde(default)]
    pub college: Option<String>,

    #[serde(default)]
    pub program: Option<String>,

    #[serde(default)]
    pub major: Option<String>,

    #[serde(default, deserialize_with = "flexible_u8")]
    pub year_level: Option<u8>,

    #[serde(default)]
    pub section: Option<String>,

    #[serde(default)]
    pub contact_first_name: Option<String>,

    #[serde(default)]
    pub contact_middle_name: Option<String>,

    #[serde(default)]
    pub contact_last_name: Option<String>,

    #[serde(default)]
    pub contact_relationship: Option<String>,

    #[serde(default)]
    pub contact_number: Option<String>,

    #[serde(default)]
    pub province: Option<String>,

    #[serde(default)]
    pub city: Option<String>,

    #[serde(default)]
    pub barangay: Option<String>,

    #[serde(default)]
    pub zip_code: Option<String>,

    #[serde(default)]
    pub picture: Option<String>,

    #[serde(default)]
    pub signature: Option<String>,

    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_completed: bool,

    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_exported: bool,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Student {
    /// "LAST, First Middle Suffix" as printed on listings.
    pub fn display_name(&self) -> String {
        let mut name = format!("{}, {}", self.last_name, self.first_name);
        if let Some(middle) = self.middle_name.as_deref().filter(|m| !m.is_empty()) {
            name.push(' ');
            name.push_str(middle);
        }
        if let Some(suffix) = self.suffix.as_deref().filter(|s| !s.is_empty()) {
            name.push(' ');
            name.push_str(suffix);
        }
        name
    }
}
