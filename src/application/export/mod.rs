//! Content → Article Format export.
//!
//! One [`Exporter::export`] call owns a private [`ExportContext`] (layout and
//! text-style registries plus the media bundle) and a scratch [`Workspace`]
//! holding `article.json` and copies of every bundled file.

pub mod assembler;
pub mod bundle;
pub mod component;
pub mod document;
pub mod factory;
pub mod registry;
pub mod settings;
pub mod workspace;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::{error::DomainError, settings::ENABLE_ADVERTISEMENT};

pub use self::{
    bundle::MediaBundle,
    component::{AnchorPosition, Component, ComponentKind, Role},
    document::Document,
    registry::{LayoutRegistry, TextStyleRegistry},
    settings::ExportSettings,
    workspace::Workspace,
};
use crate::domain::content::Content;

pub const ARTICLE_FILE: &str = "article.json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("export produced an empty document")]
    EmptyDocument,
    #[error("unresolved {kind} reference `{name}`")]
    UnresolvedReference { kind: &'static str, name: String },
    #[error("failed to bundle {}: {source}", path.display())]
    Bundle {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("workspace error: {0}")]
    Workspace(#[source] io::Error),
    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ExportError {
    pub fn unresolved(kind: &'static str, name: &str) -> Self {
        Self::UnresolvedReference {
            kind,
            name: name.to_string(),
        }
    }
}

/// State shared by every step of one export.
#[derive(Debug, Default)]
pub struct ExportContext {
    pub settings: ExportSettings,
    pub layouts: LayoutRegistry,
    pub text_styles: TextStyleRegistry,
    pub bundle: MediaBundle,
}

impl ExportContext {
    pub fn new(settings: ExportSettings) -> Self {
        Self {
            settings,
            layouts: LayoutRegistry::default(),
            text_styles: TextStyleRegistry::default(),
            bundle: MediaBundle::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Exporter {
    settings: ExportSettings,
}

impl Exporter {
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Export defaults with the article's own overrides applied.
    pub fn settings_for(&self, content: &Content) -> Result<ExportSettings, ExportError> {
        let mut settings = self.settings.clone();
        if let Some(enabled) = content.settings.flag(ENABLE_ADVERTISEMENT) {
            settings.enable_advertisement = enabled;
        }
        if let Some(orientation) = content.settings.body_orientation()? {
            settings.body_orientation = orientation;
        }
        Ok(settings)
    }

    /// Build the document in memory without touching the filesystem.
    pub fn document(&self, content: &Content) -> Result<(Document, MediaBundle), ExportError> {
        content.validate()?;
        let mut context = ExportContext::new(self.settings_for(content)?);
        let components = assembler::assemble(&mut context, content);
        let document = Document::build(content, &context, &components)?;
        Ok((document, context.bundle))
    }

    /// Build the document and materialize it in a fresh workspace.
    ///
    /// The workspace is removed again if any later step fails.
    #[instrument(skip_all, fields(content_id = %content.id))]
    pub fn export(&self, content: &Content) -> Result<ExportedArticle, ExportError> {
        let (document, bundle) = self.document(content)?;
        let json = document.to_json()?;

        let workspace = Workspace::create(self.settings.workspace_root.as_deref(), &content.id)
            .map_err(ExportError::Workspace)?;
        fs::write(workspace.join(ARTICLE_FILE), &json).map_err(ExportError::Workspace)?;

        let mut bundles = Vec::with_capacity(bundle.len());
        for file in bundle.files() {
            let destination = workspace.join(&file.name);
            fs::copy(&file.source, &destination).map_err(|source| ExportError::Bundle {
                path: file.source.clone(),
                source,
            })?;
            bundles.push(destination);
        }

        info!(
            target = "application::export",
            op = "export",
            components = document.components.len(),
            bundles = bundles.len(),
            workspace = %workspace.path().display(),
            "article exported"
        );
        Ok(ExportedArticle {
            workspace,
            document,
            json,
            bundles,
        })
    }
}

/// An exported article living in its workspace; dropping it removes the
/// workspace.
#[derive(Debug)]
pub struct ExportedArticle {
    workspace: Workspace,
    document: Document,
    json: String,
    bundles: Vec<PathBuf>,
}

impl ExportedArticle {
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn json(&self) -> &str {
        &self.json
    }

    /// Bundle copies inside the workspace.
    pub fn bundles(&self) -> &[PathBuf] {
        &self.bundles
    }

    pub fn workspace_path(&self) -> &Path {
        self.workspace.path()
    }

    pub fn article_path(&self) -> PathBuf {
        self.workspace.join(ARTICLE_FILE)
    }

    /// Remove the workspace, surfacing any filesystem error.
    pub fn close(self) -> io::Result<()> {
        self.workspace.close()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use super::*;
    use crate::domain::settings::{
        BODY_ORIENTATION, ContentSettings, PULLQUOTE, PULLQUOTE_POSITION, SettingValue,
    };

    fn exporter(root: &Path) -> Exporter {
        Exporter::new(ExportSettings {
            workspace_root: Some(root.to_path_buf()),
            ..ExportSettings::default()
        })
    }

    fn roles(document: &Document) -> Vec<&str> {
        document
            .components
            .iter()
            .map(|component| component["role"].as_str().unwrap_or_default())
            .collect()
    }

    #[test]
    fn title_and_single_paragraph() {
        let content = Content::new("1", "Title", "<p>Hello</p>");
        let (document, bundle) = Exporter::new(ExportSettings::default())
            .document(&content)
            .expect("document");

        assert_eq!(roles(&document), ["title", "body"]);
        assert_eq!(document.components[0]["text"], "Title");
        assert_eq!(document.components[1]["text"], "Hello\n");
        assert!(bundle.is_empty());
    }

    #[test]
    fn bare_inline_body_keeps_word_spacing() {
        let content = Content::new("1", "Title", "Hello <b>world</b> <i>again</i>");
        let (document, _) = Exporter::new(ExportSettings::default())
            .document(&content)
            .expect("document");

        assert_eq!(roles(&document), ["title", "body"]);
        assert_eq!(document.components[1]["text"], "Hello **world** _again_\n");
    }

    #[test]
    fn advertisement_lands_in_the_middle() {
        let settings = ContentSettings::new()
            .with(ENABLE_ADVERTISEMENT, SettingValue::Text("yes".into()));
        let content = Content::new("1", "Title", "<p>Hello</p>").with_settings(settings);
        let (document, _) = Exporter::new(ExportSettings::default())
            .document(&content)
            .expect("document");

        assert_eq!(roles(&document), ["title", "banner_advertisement", "body"]);
    }

    #[test]
    fn every_referenced_name_is_defined() {
        let settings = ContentSettings::new()
            .with(PULLQUOTE, SettingValue::Text("Worth repeating".into()))
            .with(PULLQUOTE_POSITION, SettingValue::Text("middle".into()))
            .with(ENABLE_ADVERTISEMENT, SettingValue::Bool(true));
        let content = Content::new(
            "1",
            "Title",
            "<p>One</p><h2>Two</h2><p>Three</p><blockquote>Four</blockquote><p>Five</p>",
        )
        .with_byline("By Someone")
        .with_intro("Intro")
        .with_cover("https://cdn.example.com/cover.jpg")
        .with_settings(settings);
        let (document, _) = Exporter::new(ExportSettings::default())
            .document(&content)
            .expect("document");

        let value = serde_json::to_value(&document).expect("json");
        let layouts = value["componentLayouts"].as_object().expect("layouts");
        let styles = value["componentTextStyles"].as_object().expect("styles");
        let mut identifiers = Vec::new();
        for component in value["components"].as_array().expect("components") {
            if let Some(Value::String(identifier)) = component.get("identifier") {
                identifiers.push(identifier.clone());
            }
        }
        for component in value["components"].as_array().expect("components") {
            if let Some(Value::String(layout)) = component.get("layout") {
                assert!(layouts.contains_key(layout), "missing layout {layout}");
            }
            if let Some(Value::String(style)) = component.get("textStyle") {
                assert!(styles.contains_key(style), "missing style {style}");
            }
            if let Some(anchor) = component.get("anchor") {
                let target = anchor["targetComponentIdentifier"].as_str().expect("target");
                assert!(identifiers.iter().any(|id| id == target));
            }
        }
        assert!(roles(&document).contains(&"pullquote"));
        assert!(layouts.contains_key("anchor-layout-right"));
    }

    #[test]
    fn center_orientation_from_content_disables_anchoring() {
        let settings = ContentSettings::new()
            .with(PULLQUOTE, SettingValue::Text("Quote".into()))
            .with(BODY_ORIENTATION, SettingValue::Text("center".into()));
        let content =
            Content::new("1", "Title", "<p>One</p><p>Two</p>").with_settings(settings);
        let (document, _) = Exporter::new(ExportSettings::default())
            .document(&content)
            .expect("document");

        assert!(document.components.iter().all(|c| c.get("anchor").is_none()));
        assert!(!document.component_layouts.contains_key("anchor-target-layout"));
    }

    #[test]
    fn invalid_orientation_is_reported() {
        let settings = ContentSettings::new()
            .with(BODY_ORIENTATION, SettingValue::Text("diagonal".into()));
        let content = Content::new("1", "Title", "<p>x</p>").with_settings(settings);
        let result = Exporter::new(ExportSettings::default()).document(&content);
        assert!(matches!(result, Err(ExportError::Domain(_))));
    }

    #[test]
    fn export_writes_article_and_bundle_copies() {
        let root = tempfile::tempdir().expect("root");
        let media = tempfile::tempdir().expect("media");
        let image = media.path().join("photo.png");
        fs::write(&image, b"\x89PNG\r\n\x1a\n").expect("image");

        let body = format!("<p><img src=\"{}\"></p><p>Text</p>", image.display());
        let content = Content::new("7", "Title", body);
        let exported = exporter(root.path()).export(&content).expect("export");

        let written = fs::read_to_string(exported.article_path()).expect("article");
        assert_eq!(written, exported.json());
        assert!(written.contains("bundle://photo.png"));
        assert_eq!(exported.bundles().len(), 1);
        assert!(exported.bundles()[0].ends_with("photo.png"));
        assert!(exported.bundles()[0].is_file());

        let workspace = exported.workspace_path().to_path_buf();
        exported.close().expect("close");
        assert!(!workspace.exists());
    }

    #[test]
    fn failed_bundle_copy_leaves_no_workspace() {
        let root = tempfile::tempdir().expect("root");
        let content = Content::new("8", "Title", "<p><img src=\"/missing/nowhere.png\"></p>");

        let result = exporter(root.path()).export(&content);

        assert!(matches!(result, Err(ExportError::Bundle { .. })));
        let leftovers = fs::read_dir(root.path()).expect("read root").count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn empty_title_fails_validation() {
        let content = Content::new("1", "  ", "<p>x</p>");
        let result = Exporter::new(ExportSettings::default()).document(&content);
        assert!(matches!(result, Err(ExportError::Domain(_))));
    }
}
