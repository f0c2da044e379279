//! First-writer-wins stores for named layouts and text styles.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::trace;

/// Named specs keyed by name; registering an existing name is a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRegistry<T> {
    kind: &'static str,
    entries: BTreeMap<String, T>,
}

impl<T> NamedRegistry<T> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    /// Register `spec` under `name` unless the name is taken. Returns whether
    /// the spec was stored.
    pub fn register(&mut self, name: impl Into<String>, spec: T) -> bool {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return false;
        }
        trace!(
            target = "application::export::registry",
            kind = self.kind,
            name = %name,
            "registered spec"
        );
        self.entries.insert(name, spec);
        true
    }

    /// Register lazily; `build` only runs for new names.
    pub fn register_with(&mut self, name: &str, build: impl FnOnce() -> T) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        self.register(name, build())
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &BTreeMap<String, T> {
        &self.entries
    }
}

pub type LayoutRegistry = NamedRegistry<LayoutSpec>;
pub type TextStyleRegistry = NamedRegistry<TextStyleSpec>;

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::new("layout")
    }
}

impl Default for TextStyleRegistry {
    fn default() -> Self {
        Self::new("text_style")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Margin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<u32>,
}

impl Margin {
    pub fn new(top: u32, bottom: u32) -> Self {
        Self {
            top: Some(top),
            bottom: Some(bottom),
        }
    }

    pub fn bottom(bottom: u32) -> Self {
        Self {
            top: None,
            bottom: Some(bottom),
        }
    }
}

/// Column geometry for one component layout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_start: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_span: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_document_margin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_document_gutter: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_height: Option<String>,
}

impl LayoutSpec {
    pub fn columns(start: u32, span: u32) -> Self {
        Self {
            column_start: Some(start),
            column_span: Some(span),
            ..Self::default()
        }
    }

    pub fn with_margin(mut self, margin: Margin) -> Self {
        self.margin = Some(margin);
        self
    }

    pub fn full_bleed(mut self) -> Self {
        self.ignore_document_margin = Some(true);
        self.ignore_document_gutter = Some(true);
        self
    }

    pub fn with_minimum_height(mut self, height: impl Into<String>) -> Self {
        self.minimum_height = Some(height.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStyle {
    pub text_color: String,
}

/// Typography for one text-bearing component.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyleSpec {
    pub font_name: String,
    pub font_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<u32>,
    pub text_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_transform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_style: Option<LinkStyle>,
}

impl TextStyleSpec {
    pub fn new(font_name: impl Into<String>, font_size: u32, text_color: impl Into<String>) -> Self {
        Self {
            font_name: font_name.into(),
            font_size,
            text_color: text_color.into(),
            ..Self::default()
        }
    }

    pub fn with_line_height(mut self, line_height: u32) -> Self {
        self.line_height = Some(line_height);
        self
    }

    pub fn with_transform(mut self, transform: impl Into<String>) -> Self {
        self.text_transform = Some(transform.into());
        self
    }

    pub fn with_link_color(mut self, color: impl Into<String>) -> Self {
        self.link_style = Some(LinkStyle {
            text_color: color.into(),
        });
        self
    }
}
