//! Source article handed over by the host CMS.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{error::DomainError, settings::ContentSettings};

/// Immutable input to one export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub id: String,
    pub title: String,
    /// Body markup (HTML fragment).
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    /// Cover image: local path, `file://` URL or remote URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub modified_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub settings: ContentSettings,
}

impl Content {
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            intro: None,
            cover: None,
            byline: None,
            url: None,
            created_at: None,
            modified_at: None,
            settings: ContentSettings::default(),
        }
    }

    pub fn with_intro(mut self, intro: impl Into<String>) -> Self {
        self.intro = Some(intro.into());
        self
    }

    pub fn with_cover(mut self, cover: impl Into<String>) -> Self {
        self.cover = Some(cover.into());
        self
    }

    pub fn with_byline(mut self, byline: impl Into<String>) -> Self {
        self.byline = Some(byline.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_settings(mut self, settings: ContentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn intro(&self) -> Option<&str> {
        non_blank(self.intro.as_deref())
    }

    pub fn cover(&self) -> Option<&str> {
        non_blank(self.cover.as_deref())
    }

    pub fn byline(&self) -> Option<&str> {
        non_blank(self.byline.as_deref())
    }

    /// Identifier used for the exported document and its workspace.
    pub fn document_identifier(&self) -> String {
        format!("content-{}", self.id.trim())
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(DomainError::validation("content id must not be empty"));
        }
        if !id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
        {
            return Err(DomainError::validation(format!(
                "content id `{id}` may only contain ASCII letters, digits, `-`, `_` and `.`"
            )));
        }
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("content title must not be empty"));
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optional_fields_read_as_absent() {
        let content = Content::new("1", "Title", "<p>x</p>")
            .with_byline("   ")
            .with_intro("Lead");
        assert_eq!(content.byline(), None);
        assert_eq!(content.intro(), Some("Lead"));
    }

    #[test]
    fn validation_rejects_path_like_ids() {
        assert!(Content::new("../etc", "T", "").validate().is_err());
        assert!(Content::new("", "T", "").validate().is_err());
        assert!(Content::new("42", " ", "").validate().is_err());
        assert!(Content::new("post-42", "T", "").validate().is_ok());
    }

    #[test]
    fn content_reads_from_json() {
        let content: Content = serde_json::from_str(
            r#"{"id":"7","title":"Hi","body":"<p>a</p>","created_at":"2024-03-01T10:00:00Z","settings":{"pullquote":"q"}}"#,
        )
        .expect("content");
        assert_eq!(content.document_identifier(), "content-7");
        assert!(content.created_at.is_some());
        assert_eq!(content.settings.text("pullquote"), Some("q"));
    }
}
