//! Article lifecycle against the publishing API.
//!
//! Publish and update run export → upload → workspace cleanup as one call;
//! the workspace is gone when the call returns, whatever the outcome.

use newsdesk_api_types::{
    Article, ArticleLinks, ArticleMetadata, ArticleMetadataData, Channel, DataEnvelope, Section,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{
    application::export::{ExportError, ExportedArticle, Exporter},
    domain::{
        content::Content,
        settings::{IS_PREVIEW, IS_SPONSORED, MATURITY_RATING, SECTIONS},
    },
    infra::publish::{PublishClient, PublishError},
};

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

#[derive(Clone, Debug)]
pub struct ArticleService {
    exporter: Exporter,
    client: PublishClient,
    channel_id: String,
}

impl ArticleService {
    pub fn new(exporter: Exporter, client: PublishClient, channel_id: impl Into<String>) -> Self {
        Self {
            exporter,
            client,
            channel_id: channel_id.into(),
        }
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Create a new article in the channel.
    #[instrument(skip_all, fields(content_id = %content.id))]
    pub async fn publish(&self, content: &Content) -> Result<Article, ArticleError> {
        let url = self
            .client
            .url(&format!("channels/{}/articles", self.channel_id))?;
        let metadata = metadata_for(content, None);
        let exported = self.exporter.export(content)?;
        let result = self.upload(&url, &exported, &metadata).await;
        discard(exported);

        let article = result?;
        info!(
            target = "application::publish",
            op = "publish",
            article_id = %article.id,
            revision = %article.revision,
            "article published"
        );
        Ok(article)
    }

    /// Replace an existing article; `revision` must match the current one.
    #[instrument(skip_all, fields(content_id = %content.id, article_id = %id))]
    pub async fn update(
        &self,
        id: &str,
        revision: &str,
        content: &Content,
    ) -> Result<Article, ArticleError> {
        let url = self.client.url(&format!("articles/{id}"))?;
        let metadata = metadata_for(content, Some(revision));
        let exported = self.exporter.export(content)?;
        let result = self.upload(&url, &exported, &metadata).await;
        discard(exported);

        let article = result?;
        info!(
            target = "application::publish",
            op = "update",
            article_id = %article.id,
            revision = %article.revision,
            "article updated"
        );
        Ok(article)
    }

    pub async fn fetch(&self, id: &str) -> Result<Article, ArticleError> {
        let url = self.client.url(&format!("articles/{id}"))?;
        self.get_data(&url).await
    }

    /// `true` when the API confirmed the deletion with an empty response.
    pub async fn delete(&self, id: &str) -> Result<bool, ArticleError> {
        let url = self.client.url(&format!("articles/{id}"))?;
        let response = self.client.delete(&url).await?;
        info!(
            target = "application::publish",
            op = "delete",
            article_id = %id,
            "article deleted"
        );
        Ok(response.is_none())
    }

    pub async fn channel(&self) -> Result<Channel, ArticleError> {
        let url = self.client.url(&format!("channels/{}", self.channel_id))?;
        self.get_data(&url).await
    }

    pub async fn sections(&self) -> Result<Vec<Section>, ArticleError> {
        let url = self
            .client
            .url(&format!("channels/{}/sections", self.channel_id))?;
        self.get_data(&url).await
    }

    async fn upload(
        &self,
        url: &reqwest::Url,
        exported: &ExportedArticle,
        metadata: &ArticleMetadata,
    ) -> Result<Article, ArticleError> {
        let metadata = (!metadata.is_empty()).then_some(metadata);
        let response = self
            .client
            .post(url, exported.json(), exported.bundles(), metadata)
            .await?;
        decode_data(response)
    }

    async fn get_data<T: DeserializeOwned>(&self, url: &reqwest::Url) -> Result<T, ArticleError> {
        let envelope: DataEnvelope<T> = self.client.get_json(url).await?;
        Ok(envelope.data)
    }
}

fn decode_data<T: DeserializeOwned>(value: Value) -> Result<T, ArticleError> {
    let envelope: DataEnvelope<T> =
        serde_json::from_value(value).map_err(PublishError::Decode)?;
    Ok(envelope.data)
}

fn discard(exported: ExportedArticle) {
    let path = exported.workspace_path().to_path_buf();
    if let Err(err) = exported.close() {
        warn!(
            target = "application::publish",
            path = %path.display(),
            error = %err,
            "failed to remove export workspace"
        );
    }
}

/// Upload metadata derived from the article's settings.
pub fn metadata_for(content: &Content, revision: Option<&str>) -> ArticleMetadata {
    let settings = &content.settings;
    let sections = settings.list(SECTIONS);
    ArticleMetadata {
        data: ArticleMetadataData {
            revision: revision.map(str::to_string),
            is_preview: settings.flag(IS_PREVIEW),
            is_sponsored: settings.flag(IS_SPONSORED),
            maturity_rating: settings.text(MATURITY_RATING).map(str::to_string),
            links: (!sections.is_empty()).then_some(ArticleLinks { sections }),
        },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::domain::settings::{ContentSettings, SettingValue};

    #[test]
    fn metadata_is_empty_without_settings() {
        let content = Content::new("1", "Title", "<p>x</p>");
        assert!(metadata_for(&content, None).is_empty());
    }

    #[test]
    fn metadata_forwards_article_settings() {
        let settings = ContentSettings::new()
            .with(IS_PREVIEW, SettingValue::Bool(true))
            .with(MATURITY_RATING, SettingValue::Text("GENERAL".into()))
            .with(
                SECTIONS,
                SettingValue::List(vec![SettingValue::Text(
                    "https://news-api.example.com/sections/s1".into(),
                )]),
            );
        let content = Content::new("1", "Title", "<p>x</p>").with_settings(settings);

        let metadata = metadata_for(&content, Some("rev-1"));

        let value = serde_json::to_value(&metadata).expect("json");
        assert_eq!(
            value,
            serde_json::json!({
                "data": {
                    "revision": "rev-1",
                    "isPreview": true,
                    "maturityRating": "GENERAL",
                    "links": {"sections": ["https://news-api.example.com/sections/s1"]}
                }
            })
        );
    }
}
