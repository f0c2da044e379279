//! `multipart/form-data` bodies for article uploads.
//!
//! Parts are written by hand rather than through a form builder: the API
//! expects a `size` parameter in every file part's `Content-Disposition`, and
//! the exact bytes must be available up front for signing.

use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};
use newsdesk_api_types::ArticleMetadata;
use uuid::Uuid;

use super::error::PublishError;
use crate::application::export::bundle::sniff_mime;

pub const ARTICLE_PART: &str = "my_article";
pub const ARTICLE_FILENAME: &str = "article.json";
pub const METADATA_PART: &str = "metadata";
const JSON: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: String,
    pub content: Bytes,
}

#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBody {
    /// Empty body with a fresh random boundary.
    pub fn new() -> Self {
        Self::with_boundary(Uuid::new_v4().simple().to_string())
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn push(&mut self, part: Part) {
        self.parts.push(part);
    }

    pub fn push_metadata(&mut self, metadata: &ArticleMetadata) -> Result<(), PublishError> {
        let json = serde_json::to_vec(metadata)?;
        self.push(Part {
            name: METADATA_PART.to_string(),
            filename: None,
            content_type: JSON.to_string(),
            content: Bytes::from(json),
        });
        Ok(())
    }

    pub fn push_article(&mut self, json: &str) {
        self.push(Part {
            name: ARTICLE_PART.to_string(),
            filename: Some(ARTICLE_FILENAME.to_string()),
            content_type: JSON.to_string(),
            content: Bytes::copy_from_slice(json.as_bytes()),
        });
    }

    /// Read a bundle file and add it as a part named after the file.
    pub async fn push_bundle(&mut self, path: &Path) -> Result<(), PublishError> {
        let bundle_error = |source| PublishError::Bundle {
            path: path.to_path_buf(),
            source,
        };
        let content = tokio::fs::read(path).await.map_err(bundle_error)?;
        let content_type = sniff_mime(path).map_err(bundle_error)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.push(Part {
            name: filename.clone(),
            filename: Some(filename),
            content_type: content_type.to_string(),
            content: Bytes::from(content),
        });
        Ok(())
    }

    /// Serialized body including the closing boundary.
    pub fn encode(&self) -> Bytes {
        let mut body = BytesMut::new();
        for part in &self.parts {
            body.put_slice(b"--");
            body.put_slice(self.boundary.as_bytes());
            body.put_slice(b"\r\n");
            body.put_slice(format!("Content-Type: {}\r\n", part.content_type).as_bytes());
            body.put_slice(b"Content-Disposition: form-data; name=");
            body.put_slice(part.name.as_bytes());
            if let Some(filename) = &part.filename {
                body.put_slice(
                    format!("; filename={filename}; size={}", part.content.len()).as_bytes(),
                );
            }
            body.put_slice(b"\r\n\r\n");
            body.put_slice(&part.content);
            body.put_slice(b"\r\n");
        }
        body.put_slice(b"--");
        body.put_slice(self.boundary.as_bytes());
        body.put_slice(b"--");
        body.freeze()
    }
}

/// Metadata part (when non-empty), the article, then one part per bundle.
pub async fn article_body(
    json: &str,
    bundles: &[impl AsRef<Path>],
    metadata: Option<&ArticleMetadata>,
) -> Result<MultipartBody, PublishError> {
    if json.trim().is_empty() {
        return Err(PublishError::EmptyDocument);
    }
    let mut body = MultipartBody::new();
    if let Some(metadata) = metadata.filter(|metadata| !metadata.is_empty()) {
        body.push_metadata(metadata)?;
    }
    body.push_article(json);
    for bundle in bundles {
        body.push_bundle(bundle.as_ref()).await?;
    }
    Ok(body)
}
