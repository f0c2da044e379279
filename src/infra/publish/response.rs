//! Classifies raw API responses into payloads or typed errors.

use newsdesk_api_types::{ApiErrorEntry, ErrorEnvelope};
use serde_json::Value;

use super::error::PublishError;

/// Decoded JSON payload, `None` for an empty success (e.g. `204 No Content`).
pub fn parse_response(status: u16, body: &[u8]) -> Result<Option<Value>, PublishError> {
    let success = (200..300).contains(&status);
    let text = String::from_utf8_lossy(body);
    if text.trim().is_empty() {
        return if success {
            Ok(None)
        } else {
            Err(PublishError::UnexpectedResponse {
                status,
                body: String::new(),
            })
        };
    }

    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) if !success => {
            return Err(PublishError::UnexpectedResponse {
                status,
                body: text.into_owned(),
            });
        }
        Err(err) => return Err(PublishError::Decode(err)),
    };

    let has_errors = value
        .get("errors")
        .and_then(Value::as_array)
        .is_some_and(|errors| !errors.is_empty());
    if has_errors {
        let envelope: ErrorEnvelope = serde_json::from_value(value)?;
        return Err(classify(status, envelope.errors));
    }

    if !success {
        return Err(PublishError::UnexpectedResponse {
            status,
            body: text.into_owned(),
        });
    }
    Ok(Some(value))
}

fn classify(status: u16, errors: Vec<ApiErrorEntry>) -> PublishError {
    if errors.iter().any(ApiErrorEntry::is_date_not_recent) {
        return PublishError::ClockSkew;
    }

    let message = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");

    if let Some(duplicate) = errors.iter().find(|entry| entry.is_duplicate()) {
        let existing_id = duplicate.value.as_ref().and_then(|value| match value {
            Value::String(id) => Some(id.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        });
        return PublishError::Duplicate {
            existing_id,
            message,
        };
    }

    PublishError::Api {
        status,
        message,
        errors,
    }
}
