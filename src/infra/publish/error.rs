use std::{io, path::PathBuf};

use newsdesk_api_types::ApiErrorEntry;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("article document is empty")]
    EmptyDocument,
    #[error("failed to read bundle {}: {source}", path.display())]
    Bundle {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("api secret is not valid base64: {0}")]
    InvalidSecret(#[source] base64::DecodeError),
    #[error("api secret rejected by hmac: {0}")]
    InvalidKeyLength(String),
    #[error("invalid api url: {0}")]
    Url(#[from] url::ParseError),
    #[error("failed to format request date: {0}")]
    Date(#[from] time::error::Format),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(
        "server clock not synchronized with the publishing API; check the system time and retry"
    )]
    ClockSkew,
    #[error(
        "article already published{}: {message}",
        .existing_id.as_deref().map(|id| format!(" as {id}")).unwrap_or_default()
    )]
    Duplicate {
        existing_id: Option<String>,
        message: String,
    },
    #[error("api error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        errors: Vec<ApiErrorEntry>,
    },
    #[error("unexpected response ({status}): {body}")]
    UnexpectedResponse { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}
