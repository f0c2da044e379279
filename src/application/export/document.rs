//! The terminal Article Format document.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use super::{
    ExportContext, ExportError,
    component::{Component, ComponentKind},
    registry::{LayoutSpec, TextStyleSpec},
    settings::LayoutGrid,
};
use crate::domain::content::Content;

pub const FORMAT_VERSION: &str = "1.7";
pub const GENERATOR_NAME: &str = env!("CARGO_PKG_NAME");
pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub version: &'static str,
    pub identifier: String,
    pub language: String,
    pub title: String,
    pub layout: DocumentLayout,
    pub document_style: DocumentStyle,
    pub component_text_styles: BTreeMap<String, TextStyleSpec>,
    pub component_layouts: BTreeMap<String, LayoutSpec>,
    pub components: Vec<Value>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentLayout {
    pub columns: u32,
    pub width: u32,
    pub margin: u32,
    pub gutter: u32,
}

impl From<LayoutGrid> for DocumentLayout {
    fn from(grid: LayoutGrid) -> Self {
        Self {
            columns: grid.columns,
            width: grid.width,
            margin: grid.margin,
            gutter: grid.gutter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStyle {
    pub background_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(rename = "thumbnailURL", skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(rename = "canonicalURL", skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<String>,
    pub generator_name: &'static str,
    pub generator_version: &'static str,
}

impl Metadata {
    fn for_content(content: &Content, components: &[Component]) -> Self {
        let thumbnail_url = components.iter().find_map(|component| match component.kind() {
            ComponentKind::Cover { url } => Some(url.clone()),
            _ => None,
        });
        Self {
            excerpt: content.intro().map(str::to_string),
            thumbnail_url,
            authors: content.byline().map(str::to_string).into_iter().collect(),
            canonical_url: content.url.clone(),
            date_created: content.created_at.and_then(rfc3339),
            date_modified: content.modified_at.and_then(rfc3339),
            generator_name: GENERATOR_NAME,
            generator_version: GENERATOR_VERSION,
        }
    }
}

fn rfc3339(value: OffsetDateTime) -> Option<String> {
    value.format(&Rfc3339).ok()
}

impl Document {
    /// Freeze assembled components into a document.
    ///
    /// Fails when there is nothing to publish or when a component references
    /// a layout, text style or anchor target the document does not define.
    pub fn build(
        content: &Content,
        context: &ExportContext,
        components: &[Component],
    ) -> Result<Self, ExportError> {
        if components.is_empty() {
            return Err(ExportError::EmptyDocument);
        }
        check_references(context, components)?;

        let settings = &context.settings;
        Ok(Self {
            version: FORMAT_VERSION,
            identifier: content.document_identifier(),
            language: settings.language.clone(),
            title: content.title.trim().to_string(),
            layout: settings.layout.into(),
            document_style: DocumentStyle {
                background_color: settings.theme.background_color.clone(),
            },
            component_text_styles: context.text_styles.entries().clone(),
            component_layouts: context.layouts.entries().clone(),
            components: components.iter().map(Component::to_json).collect(),
            metadata: Metadata::for_content(content, components),
        })
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string(self)?)
    }
}

fn check_references(context: &ExportContext, components: &[Component]) -> Result<(), ExportError> {
    let identifiers: BTreeSet<&str> = components
        .iter()
        .filter_map(Component::identifier)
        .collect();

    for component in components {
        if let Some(layout) = component.layout()
            && !context.layouts.contains(layout)
        {
            return Err(ExportError::unresolved("layout", layout));
        }
        if let Some(style) = component.text_style()
            && !context.text_styles.contains(style)
        {
            return Err(ExportError::unresolved("text style", style));
        }
        if let Some(anchor) = component.anchor()
            && !identifiers.contains(anchor.target_identifier.as_str())
        {
            return Err(ExportError::unresolved(
                "anchor target",
                &anchor.target_identifier,
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::application::export::settings::ExportSettings;

    #[test]
    fn empty_component_list_is_a_build_defect() {
        let content = Content::new("1", "T", "");
        let context = ExportContext::new(ExportSettings::default());
        let result = Document::build(&content, &context, &[]);
        assert!(matches!(result, Err(ExportError::EmptyDocument)));
    }

    #[test]
    fn unregistered_layout_is_rejected() {
        let content = Content::new("1", "T", "");
        let context = ExportContext::new(ExportSettings::default());
        let component = Component::new(ComponentKind::Title { text: "T".into() })
            .with_layout("nowhere");
        let result = Document::build(&content, &context, &[component]);
        assert!(matches!(
            result,
            Err(ExportError::UnresolvedReference { kind: "layout", .. })
        ));
    }

    #[test]
    fn metadata_carries_content_fields() {
        let mut content = Content::new("1", "T", "")
            .with_intro("Short")
            .with_byline("Ann Writer")
            .with_url("https://example.com/t");
        content.created_at = Some(datetime!(2024-05-01 10:00 UTC));

        let context = ExportContext::new(ExportSettings::default());
        let cover = Component::new(ComponentKind::Cover {
            url: "bundle://c.jpg".into(),
        });
        let document = Document::build(&content, &context, &[cover]).expect("document");
        let value = serde_json::to_value(&document.metadata).expect("json");
        assert_eq!(value["excerpt"], "Short");
        assert_eq!(value["thumbnailURL"], "bundle://c.jpg");
        assert_eq!(value["authors"], serde_json::json!(["Ann Writer"]));
        assert_eq!(value["canonicalURL"], "https://example.com/t");
        assert_eq!(value["dateCreated"], "2024-05-01T10:00:00Z");
        assert!(value.get("dateModified").is_none());
        assert_eq!(value["generatorName"], "newsdesk");
    }
}
