//! Lenient deserializers for columns the backend may send as numbers or strings.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolLike {
    Bool(bool),
    Int(i64),
    Str(String),
}

/// Accepts `true`/`false`, `0`/`1` and their string forms.
pub fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<BoolLike>::deserialize(deserializer)?;
    Ok(match value {
        None => false,
        Some(BoolLike::Bool(b)) => b,
        Some(BoolLike::Int(i)) => i != 0,
        Some(BoolLike::Str(s)) => matches!(s.trim(), "1" | "true" | "TRUE" | "yes"),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberLike {
    Int(u64),
    Str(String),
}

/// Accepts `3` or `"3"`; empty strings and null become `None`.
pub fn flexible_u8<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberLike>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(NumberLike::Int(i)) => u8::try_from(i)
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(NumberLike::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberLike::Str(s)) => s
            .trim()
            .parse::<u8>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
