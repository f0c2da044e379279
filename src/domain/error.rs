use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("domain validation failed: {message}")]
    Validation { message: String },
    #[error("unknown value `{value}` for `{key}`")]
    UnknownValue { key: &'static str, value: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unknown_value(key: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownValue {
            key,
            value: value.into(),
        }
    }
}
