//! Multipart form assembly for the registration and upload endpoints.

use reqwest::multipart::{Form, Part};
use serde::Serialize;

use crate::{types::NamedImage, Error};

/// Flattens a serializable struct into text fields.
///
/// Nulls are skipped and booleans become `1`/`0`, which is what the
/// backend's boolean validation rule accepts from form posts.
pub(crate) fn text_fields<T: Serialize>(value: &T) -> Result<Vec<(String, String)>, Error> {
    let value = serde_json::to_value(value).map_err(|e| {
        tracing::error!("Failed to serialize form fields: {}", e);
        Error::RequestFailed
    })?;
    let serde_json::Value::Object(map) = value else {
        tracing::error!("Form payload is not an object");
        return Err(Error::RequestFailed);
    };
    let mut fields = Vec::with_capacity(map.len());
    for (key, value) in map {
        let text = match value {
            serde_json::Value::Null => continue,
            serde_json::Value::Bool(b) => String::from(if b { "1" } else { "0" }),
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        fields.push((key, text));
    }
    Ok(fields)
}

pub(crate) fn form_from_fields(fields: Vec<(String, String)>) -> Form {
    fields
        .into_iter()
        .fold(Form::new(), |form, (key, value)| form.text(key, value))
}

pub(crate) fn image_part(image: &NamedImage) -> Result<Part, Error> {
    Part::bytes(image.bytes.clone())
        .file_name(image.file_name.clone())
        .mime_str(&image.content_type)
        .map_err(|e| {
            tracing::error!("Invalid content type {}: {}", image.content_type, e);
            Error::RequestFailed
        })
}
