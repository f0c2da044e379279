//! `HHMAC` request signing.
//!
//! The signed string is `VERB + URL + date`, followed by the content type and
//! the raw body for requests that carry one. The key is the base64-decoded
//! API secret.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use super::error::PublishError;

type HmacSha256 = Hmac<Sha256>;

/// Second-precision UTC timestamp the API expects in the `date` field.
const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

/// API key and base64-encoded secret. Never persisted by this crate.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    key: String,
    secret: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn secret_bytes(&self) -> Result<Vec<u8>, PublishError> {
        STANDARD
            .decode(self.secret.trim())
            .map_err(PublishError::InvalidSecret)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Body and content type of a signed POST.
#[derive(Debug, Clone, Copy)]
pub struct SignedBody<'a> {
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

pub fn format_date(at: OffsetDateTime) -> Result<String, PublishError> {
    Ok(at.to_offset(time::UtcOffset::UTC).format(DATE_FORMAT)?)
}

/// Date for a request about to be sent.
pub fn current_date() -> Result<String, PublishError> {
    format_date(OffsetDateTime::now_utc())
}

/// Bytes fed to the HMAC.
pub fn canonical_request(
    method: &str,
    url: &str,
    date: &str,
    body: Option<SignedBody<'_>>,
) -> Vec<u8> {
    let mut info = Vec::with_capacity(method.len() + url.len() + date.len());
    info.extend_from_slice(method.to_ascii_uppercase().as_bytes());
    info.extend_from_slice(url.as_bytes());
    info.extend_from_slice(date.as_bytes());
    if let Some(body) = body {
        info.extend_from_slice(body.content_type.as_bytes());
        info.extend_from_slice(body.bytes);
    }
    info
}

/// `base64(hmac_sha256(decoded_secret, request_info))`.
pub fn sign(credentials: &Credentials, request_info: &[u8]) -> Result<String, PublishError> {
    let key = credentials.secret_bytes()?;
    let mut mac = <HmacSha256 as KeyInit>::new_from_slice(&key)
        .map_err(|err| PublishError::InvalidKeyLength(err.to_string()))?;
    mac.update(request_info);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Full `Authorization` header value for one request.
pub fn authorization(
    credentials: &Credentials,
    method: &str,
    url: &str,
    date: &str,
    body: Option<SignedBody<'_>>,
) -> Result<String, PublishError> {
    let signature = sign(credentials, &canonical_request(method, url, date, body))?;
    Ok(format!(
        "HHMAC; key={}; signature={signature}; date={date}",
        credentials.key
    ))
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("key-id", "c2VjcmV0LWtleQ==")
    }

    #[test]
    fn hmac_matches_rfc4231_case_two() {
        let jefe = Credentials::new("k", "SmVmZQ==");
        let signature = sign(&jefe, b"what do ya want for nothing?").expect("sign");
        assert_eq!(signature, "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=");
    }

    #[test]
    fn get_signature_regression() {
        let header = authorization(
            &credentials(),
            "GET",
            "https://news-api.example.com/articles/abc",
            "2015-08-27T19:01:27Z",
            None,
        )
        .expect("header");
        assert_eq!(
            header,
            "HHMAC; key=key-id; signature=CpbFrVQmLKuNT9ZBP71VCVTR3mdt00CqrmXJ1udwuH4=; date=2015-08-27T19:01:27Z"
        );
    }

    #[test]
    fn post_signature_covers_content_type_and_body() {
        let body = SignedBody {
            content_type: "multipart/form-data; boundary=xyz",
            bytes: b"--xyz--",
        };
        let info = canonical_request(
            "POST",
            "https://news-api.example.com/channels/chan/articles",
            "2015-08-27T19:01:27Z",
            Some(body),
        );
        assert_eq!(
            sign(&credentials(), &info).expect("sign"),
            "QSPSd+LoQAxtVYiRfJe1DG+dEhoGzJZHvlxb8RlGxMo="
        );
    }

    #[test]
    fn signing_is_deterministic() {
        let info = canonical_request("DELETE", "https://e.x/articles/1", "2020-01-01T00:00:00Z", None);
        let first = sign(&credentials(), &info).expect("sign");
        let second = sign(&credentials(), &info).expect("sign");
        assert_eq!(first, second);
    }

    #[test]
    fn dates_are_second_precision_utc() {
        let at = datetime!(2015-08-27 21:01:27.654 +02:00);
        assert_eq!(format_date(at).expect("date"), "2015-08-27T19:01:27Z");
    }

    #[test]
    fn non_base64_secret_is_rejected() {
        let bad = Credentials::new("k", "not base64!!");
        assert!(matches!(
            sign(&bad, b"x"),
            Err(PublishError::InvalidSecret(_))
        ));
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("c2VjcmV0"));
    }
}
