use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::{export::ExportError, publish::ArticleError},
    config::LoadError,
    domain::error::DomainError,
    infra::error::InfraError,
    infra::publish::PublishError,
};

/// Error and its chain of sources, flattened for reporting.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl From<ArticleError> for AppError {
    fn from(error: ArticleError) -> Self {
        match error {
            ArticleError::Export(err) => AppError::Export(err),
            ArticleError::Publish(err) => AppError::Publish(err),
        }
    }
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_walks_the_source_chain() {
        let io = std::io::Error::other("disk full");
        let error = AppError::from(InfraError::from(io));
        let report = error.report();
        assert_eq!(report.messages[0], "io error: disk full");
        assert_eq!(report.messages.len(), 2);
    }

    #[test]
    fn missing_configuration_names_the_key() {
        let error = AppError::from(LoadError::Missing { key: "api.key" });
        assert_eq!(error.to_string(), "missing configuration for `api.key`");
    }
}
