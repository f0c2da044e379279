//! Export-wide geometry and typography defaults.

use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::settings::BodyOrientation;

pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_LAYOUT_COLUMNS: u32 = 7;
pub const DEFAULT_BODY_COLUMN_SPAN: u32 = 5;
pub const DEFAULT_LAYOUT_WIDTH: u32 = 1024;
pub const DEFAULT_LAYOUT_MARGIN: u32 = 100;
pub const DEFAULT_LAYOUT_GUTTER: u32 = 20;

/// Resolved settings shared by every component of one export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub language: String,
    pub layout: LayoutGrid,
    pub body_orientation: BodyOrientation,
    pub enable_advertisement: bool,
    pub gallery_type: GalleryType,
    pub theme: Theme,
    /// Parent directory for scratch workspaces; the system temp dir when unset.
    pub workspace_root: Option<PathBuf>,
    /// Base for relative image paths in body markup.
    pub media_root: Option<PathBuf>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            layout: LayoutGrid::default(),
            body_orientation: BodyOrientation::Left,
            enable_advertisement: false,
            gallery_type: GalleryType::Gallery,
            theme: Theme::default(),
            workspace_root: None,
            media_root: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutGrid {
    pub columns: u32,
    pub body_column_span: u32,
    pub width: u32,
    pub margin: u32,
    pub gutter: u32,
}

impl Default for LayoutGrid {
    fn default() -> Self {
        Self {
            columns: DEFAULT_LAYOUT_COLUMNS,
            body_column_span: DEFAULT_BODY_COLUMN_SPAN,
            width: DEFAULT_LAYOUT_WIDTH,
            margin: DEFAULT_LAYOUT_MARGIN,
            gutter: DEFAULT_LAYOUT_GUTTER,
        }
    }
}

impl LayoutGrid {
    /// Columns left over beside the body for anchored components.
    pub fn side_span(&self) -> u32 {
        self.columns.saturating_sub(self.body_column_span)
    }

    /// First body column for the given orientation.
    pub fn body_column_start(&self, orientation: BodyOrientation) -> u32 {
        match orientation {
            BodyOrientation::Left => 0,
            BodyOrientation::Right => self.side_span(),
            BodyOrientation::Center => self.side_span() / 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GalleryType {
    #[default]
    Gallery,
    Mosaic,
}

impl GalleryType {
    pub fn role(self) -> &'static str {
        match self {
            GalleryType::Gallery => "gallery",
            GalleryType::Mosaic => "mosaic",
        }
    }
}

/// Fonts and colors; every field has a default so partial config files work.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background_color: String,
    pub body_font: String,
    pub body_size: u32,
    pub body_line_height: u32,
    pub body_color: String,
    pub body_link_color: String,
    pub heading_font: String,
    pub heading_color: String,
    pub title_font: String,
    pub title_size: u32,
    pub title_color: String,
    pub byline_font: String,
    pub byline_size: u32,
    pub byline_color: String,
    pub intro_font: String,
    pub intro_size: u32,
    pub intro_color: String,
    pub pullquote_font: String,
    pub pullquote_size: u32,
    pub pullquote_color: String,
    pub pullquote_transform: String,
    pub blockquote_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background_color: "#FFFFFF".to_string(),
            body_font: "AvenirNext-Regular".to_string(),
            body_size: 18,
            body_line_height: 24,
            body_color: "#4F4F4F".to_string(),
            body_link_color: "#428BCA".to_string(),
            heading_font: "AvenirNext-Bold".to_string(),
            heading_color: "#333333".to_string(),
            title_font: "AvenirNext-Bold".to_string(),
            title_size: 48,
            title_color: "#333333".to_string(),
            byline_font: "AvenirNext-Medium".to_string(),
            byline_size: 13,
            byline_color: "#7C7C7C".to_string(),
            intro_font: "AvenirNext-Medium".to_string(),
            intro_size: 22,
            intro_color: "#333333".to_string(),
            pullquote_font: "AvenirNext-Bold".to_string(),
            pullquote_size: 48,
            pullquote_color: "#53585F".to_string(),
            pullquote_transform: "uppercase".to_string(),
            blockquote_color: "#4F4F4F".to_string(),
        }
    }
}

impl Theme {
    /// Point size for `h1`..`h6`.
    pub fn heading_size(&self, level: u8) -> u32 {
        match level {
            1 => 42,
            2 => 32,
            3 => 24,
            4 => 21,
            5 => 18,
            _ => 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_start_follows_orientation() {
        let grid = LayoutGrid::default();
        assert_eq!(grid.side_span(), 2);
        assert_eq!(grid.body_column_start(BodyOrientation::Left), 0);
        assert_eq!(grid.body_column_start(BodyOrientation::Right), 2);
        assert_eq!(grid.body_column_start(BodyOrientation::Center), 1);
    }
}
