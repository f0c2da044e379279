//! Maps parsed markup nodes and named directives to components.
//!
//! Every component the factory hands out references a layout and text style
//! it has registered itself, so the built document never points at a missing
//! name.

use std::{path::PathBuf, str::FromStr};

use tracing::debug;
use url::Url;

use super::{
    ExportContext,
    component::{AnchorPosition, Component, ComponentKind, GalleryItem, Role},
    registry::{LayoutSpec, Margin, TextStyleSpec},
};
use crate::application::markup::{Element, MarkupParser, Node};

const INLINE_TAGS: &[&str] = &[
    "abbr", "cite", "code", "del", "ins", "kbd", "mark", "q", "s", "small", "span", "sub", "sup",
    "time", "u", "var",
];

const WRAPPER_TAGS: &[&str] = &[
    "article", "aside", "body", "div", "footer", "header", "main", "section",
];

const SKIPPED_TAGS: &[&str] = &[
    "head", "hr", "link", "meta", "noscript", "script", "style", "template",
];

/// Synthesized components that do not come from body markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Title,
    Byline,
    Intro,
    Cover,
    PullQuote,
    Advertisement,
}

impl FromStr for Directive {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(Directive::Title),
            "byline" => Ok(Directive::Byline),
            "intro" => Ok(Directive::Intro),
            "cover" => Ok(Directive::Cover),
            "pullquote" | "pull_quote" => Ok(Directive::PullQuote),
            "advertisement" | "ad" => Ok(Directive::Advertisement),
            other => Err(other.to_string()),
        }
    }
}

pub struct ComponentFactory<'a> {
    context: &'a mut ExportContext,
    parser: MarkupParser,
}

impl<'a> ComponentFactory<'a> {
    pub fn new(context: &'a mut ExportContext) -> Self {
        Self {
            context,
            parser: MarkupParser::new(),
        }
    }

    pub fn context(&self) -> &ExportContext {
        &*self.context
    }

    /// Parse a body fragment and map every top-level node.
    pub fn from_html(&mut self, html: &str) -> Vec<Component> {
        let nodes = self.parser.parse(html);
        self.from_nodes(&nodes)
    }

    /// Map sibling nodes, merging each run of inline nodes into one body.
    fn from_nodes(&mut self, nodes: &[Node]) -> Vec<Component> {
        let mut components = Vec::new();
        let mut start = 0;
        while start < nodes.len() {
            let run = nodes[start..]
                .iter()
                .take_while(|node| is_inline(node))
                .count();
            if run == 0 {
                components.extend(self.from_node(&nodes[start]));
                start += 1;
                continue;
            }
            let inline = &nodes[start..start + run];
            if !inline.iter().all(Node::is_blank) {
                components.extend(self.body(inline));
            }
            start += run;
        }
        components
    }

    /// Zero or more components for one node.
    pub fn from_node(&mut self, node: &Node) -> Vec<Component> {
        match node {
            Node::Text(_) | Node::LineBreak if node.is_blank() => Vec::new(),
            Node::Paragraph(children) => match sole_image(children) {
                Some(image) => self.image(image, None).into_iter().collect(),
                None => self.body(std::slice::from_ref(node)).into_iter().collect(),
            },
            Node::Other(element) => self.from_element(node, element),
            _ => self.body(std::slice::from_ref(node)).into_iter().collect(),
        }
    }

    fn from_element(&mut self, node: &Node, element: &Element) -> Vec<Component> {
        let name = element.name.as_str();
        if SKIPPED_TAGS.contains(&name) {
            return Vec::new();
        }
        if let Some(level) = heading_level(name) {
            return self.heading(level, node).into_iter().collect();
        }
        if INLINE_TAGS.contains(&name) {
            return self.body(std::slice::from_ref(node)).into_iter().collect();
        }
        if WRAPPER_TAGS.contains(&name) {
            if element.has_class("gallery") {
                return self.gallery(element).into_iter().collect();
            }
            return self.from_nodes(&element.children);
        }

        let component = match name {
            "img" => self.image(element, None),
            "figure" => self.figure(element),
            "blockquote" => self.blockquote(node, element),
            "iframe" => self.iframe(node, element),
            "video" => self.video(element),
            "audio" => self.audio(element),
            _ => None,
        };
        match component {
            Some(component) => vec![component],
            None if matches!(name, "img" | "figure" | "video" | "audio") => Vec::new(),
            None => self.fallback(std::slice::from_ref(node)).into_iter().collect(),
        }
    }

    /// Component for a named directive. Unknown names degrade to a raw HTML
    /// component built from `text`.
    pub fn from_directive(&mut self, name: &str, text: &str) -> Option<Component> {
        match name.parse::<Directive>() {
            Ok(directive) => self.directive(directive, text),
            Err(unknown) => {
                debug!(
                    target = "application::export::factory",
                    directive = %unknown,
                    "unknown directive, falling back to html"
                );
                let nodes = self.parser.parse(text);
                self.fallback(&nodes)
            }
        }
    }

    pub fn directive(&mut self, directive: Directive, text: &str) -> Option<Component> {
        match directive {
            Directive::Title => self.plain(Role::Title, text),
            Directive::Byline => self.plain(Role::Byline, text),
            Directive::Intro => self.plain(Role::Intro, text),
            Directive::PullQuote => self
                .plain(Role::PullQuote, text)
                .map(|component| component.with_anchor_position(AnchorPosition::Auto)),
            Directive::Cover => {
                let url = self.resolve_media(text)?;
                Some(self.styled(ComponentKind::Cover { url }))
            }
            Directive::Advertisement => Some(self.styled(ComponentKind::Advertisement)),
        }
    }

    fn plain(&mut self, role: Role, text: &str) -> Option<Component> {
        let text = collapse_whitespace(&plain_text(&self.parser.parse(text)));
        if text.is_empty() {
            return None;
        }
        let kind = match role {
            Role::Title => ComponentKind::Title { text },
            Role::Byline => ComponentKind::Byline { text },
            Role::Intro => ComponentKind::Intro { text },
            _ => ComponentKind::PullQuote { text },
        };
        Some(self.styled(kind))
    }

    fn body(&mut self, nodes: &[Node]) -> Option<Component> {
        let text = self.parser.to_markdown(nodes);
        if text.trim().is_empty() {
            return None;
        }
        Some(self.styled(ComponentKind::Body { text }))
    }

    fn heading(&mut self, level: u8, node: &Node) -> Option<Component> {
        let text = collapse_whitespace(&node.text_content());
        if text.is_empty() {
            return None;
        }
        Some(self.styled(ComponentKind::Heading { level, text }))
    }

    fn image(&mut self, image: &Element, caption: Option<String>) -> Option<Component> {
        let url = self.resolve_media(image.attr("src")?)?;
        let component = self.styled(ComponentKind::Image { url, caption });
        Some(component.with_anchor_position(alignment(image)))
    }

    fn figure(&mut self, figure: &Element) -> Option<Component> {
        let images = figure.descendants_named("img");
        if figure.has_class("gallery") || figure.has_class("wp-block-gallery") || images.len() > 1
        {
            return self.gallery(figure);
        }
        let image = images.first()?;
        let caption = caption_of(figure);
        let component = self.image(image, caption)?;
        Some(match alignment(figure) {
            AnchorPosition::None => component,
            position => component.with_anchor_position(position),
        })
    }

    fn gallery(&mut self, container: &Element) -> Option<Component> {
        let figures = container.descendants_named("figure");
        let sources: Vec<(String, Option<String>)> = if figures.is_empty() {
            container
                .descendants_named("img")
                .into_iter()
                .filter_map(|image| image.attr("src").map(|src| (src.to_string(), None)))
                .collect()
        } else {
            figures
                .into_iter()
                .filter_map(|figure| {
                    let image = figure.descendants_named("img").into_iter().next()?;
                    Some((image.attr("src")?.to_string(), caption_of(figure)))
                })
                .collect()
        };

        let items: Vec<GalleryItem> = sources
            .into_iter()
            .filter_map(|(src, caption)| {
                self.resolve_media(&src)
                    .map(|url| GalleryItem { url, caption })
            })
            .collect();
        if items.is_empty() {
            return None;
        }
        let style = self.context.settings.gallery_type;
        Some(self.styled(ComponentKind::Gallery { style, items }))
    }

    fn blockquote(&mut self, node: &Node, element: &Element) -> Option<Component> {
        if element.has_class("twitter-tweet") {
            let status = hyperlinks(&element.children)
                .into_iter()
                .filter(|href| href.contains("/status/"))
                .last();
            if let Some(url) = status {
                return Some(self.styled(ComponentKind::Tweet { url: url.to_string() }));
            }
        }
        if element.has_class("instagram-media") {
            let permalink = element
                .attr("data-instgrm-permalink")
                .map(str::to_string)
                .or_else(|| {
                    hyperlinks(&element.children)
                        .into_iter()
                        .find(|href| href.contains("instagram.com"))
                        .map(str::to_string)
                });
            if let Some(url) = permalink {
                return Some(self.styled(ComponentKind::Instagram { url }));
            }
        }

        let text = collapse_whitespace(&node.text_content());
        if text.is_empty() {
            return None;
        }
        Some(self.styled(ComponentKind::Quote { text }))
    }

    fn iframe(&mut self, node: &Node, element: &Element) -> Option<Component> {
        let src = element.attr("src").map(normalize_scheme)?;
        let is_video = ["youtube.com/embed/", "youtube-nocookie.com/embed/", "player.vimeo.com/video/"]
            .iter()
            .any(|marker| src.contains(marker));
        if is_video {
            return Some(self.styled(ComponentKind::EmbedWebVideo { url: src }));
        }
        self.fallback(std::slice::from_ref(node))
    }

    fn video(&mut self, element: &Element) -> Option<Component> {
        let url = media_source(element).filter(|src| is_remote(src))?;
        let still_url = element
            .attr("poster")
            .map(normalize_scheme)
            .filter(|src| is_remote(src));
        Some(self.styled(ComponentKind::Video { url, still_url }))
    }

    fn audio(&mut self, element: &Element) -> Option<Component> {
        let url = media_source(element).filter(|src| is_remote(src))?;
        Some(self.styled(ComponentKind::Audio { url }))
    }

    /// Sanitized HTML for anything the mapping above does not cover.
    fn fallback(&mut self, nodes: &[Node]) -> Option<Component> {
        let html = self.parser.sanitize(nodes);
        let html = html.trim();
        if html.is_empty() {
            return None;
        }
        Some(self.styled(ComponentKind::Html {
            html: html.to_string(),
        }))
    }

    /// Remote URLs pass through; local paths and `file://` URLs are bundled.
    fn resolve_media(&mut self, source: &str) -> Option<String> {
        let source = source.trim();
        if source.is_empty() || source.starts_with("data:") {
            return None;
        }
        let source = normalize_scheme(source);
        if is_remote(&source) {
            return Some(source);
        }

        let path = if source.starts_with("file:") {
            Url::parse(&source).ok()?.to_file_path().ok()?
        } else {
            let path = PathBuf::from(&source);
            match (&self.context.settings.media_root, path.is_relative()) {
                (Some(root), true) => root.join(path),
                _ => path,
            }
        };
        let reference = self.context.bundle.add(path);
        debug!(
            target = "application::export::factory",
            source = %source,
            reference = %reference,
            "bundled media"
        );
        Some(reference)
    }

    /// Wrap `kind` and attach its default layout and text style.
    fn styled(&mut self, kind: ComponentKind) -> Component {
        let layout = self.register_layout(&kind);
        let component = Component::new(kind).with_layout(layout);
        match self.register_text_style(component.kind()) {
            Some(style) => component.with_text_style(style),
            None => component,
        }
    }

    fn register_layout(&mut self, kind: &ComponentKind) -> &'static str {
        let grid = self.context.settings.layout;
        let body_start = grid.body_column_start(self.context.settings.body_orientation);
        let body = move || LayoutSpec::columns(body_start, grid.body_column_span);

        let (name, build): (&'static str, Box<dyn FnOnce() -> LayoutSpec>) = match kind {
            ComponentKind::Title { .. } => (
                "title-layout",
                Box::new(move || body().with_margin(Margin::new(30, 10))),
            ),
            ComponentKind::Byline { .. } => (
                "byline-layout",
                Box::new(move || body().with_margin(Margin::new(10, 10))),
            ),
            ComponentKind::Intro { .. } => (
                "intro-layout",
                Box::new(move || body().with_margin(Margin::new(15, 15))),
            ),
            ComponentKind::Body { .. } | ComponentKind::Html { .. } => (
                "body-layout",
                Box::new(move || body().with_margin(Margin::bottom(12))),
            ),
            ComponentKind::Heading { .. } => (
                "heading-layout",
                Box::new(move || body().with_margin(Margin::new(15, 5))),
            ),
            ComponentKind::Image { .. } | ComponentKind::Quote { .. } => (
                "media-layout",
                Box::new(move || body().with_margin(Margin::new(15, 15))),
            ),
            ComponentKind::PullQuote { .. } => (
                "pullquote-layout",
                Box::new(move || body().with_margin(Margin::new(15, 15))),
            ),
            ComponentKind::Gallery { .. } => (
                "gallery-layout",
                Box::new(move || {
                    LayoutSpec::columns(0, grid.columns).with_margin(Margin::new(15, 15))
                }),
            ),
            ComponentKind::Cover { .. } => (
                "cover-layout",
                Box::new(move || {
                    LayoutSpec::columns(0, grid.columns)
                        .full_bleed()
                        .with_minimum_height("50vh")
                }),
            ),
            ComponentKind::Advertisement => (
                "advertisement-layout",
                Box::new(move || {
                    LayoutSpec::columns(0, grid.columns).with_margin(Margin::new(15, 15))
                }),
            ),
            ComponentKind::EmbedWebVideo { .. }
            | ComponentKind::Tweet { .. }
            | ComponentKind::Instagram { .. }
            | ComponentKind::Audio { .. }
            | ComponentKind::Video { .. } => (
                "embed-layout",
                Box::new(move || body().with_margin(Margin::new(15, 15))),
            ),
        };
        self.context.layouts.register_with(name, build);
        name
    }

    fn register_text_style(&mut self, kind: &ComponentKind) -> Option<String> {
        let theme = &self.context.settings.theme;
        let (name, spec) = match kind {
            ComponentKind::Title { .. } => (
                "default-title".to_string(),
                TextStyleSpec::new(&theme.title_font, theme.title_size, &theme.title_color),
            ),
            ComponentKind::Byline { .. } => (
                "default-byline".to_string(),
                TextStyleSpec::new(&theme.byline_font, theme.byline_size, &theme.byline_color),
            ),
            ComponentKind::Intro { .. } => (
                "default-intro".to_string(),
                TextStyleSpec::new(&theme.intro_font, theme.intro_size, &theme.intro_color),
            ),
            ComponentKind::Body { .. } | ComponentKind::Html { .. } => (
                "default-body".to_string(),
                TextStyleSpec::new(&theme.body_font, theme.body_size, &theme.body_color)
                    .with_line_height(theme.body_line_height)
                    .with_link_color(&theme.body_link_color),
            ),
            ComponentKind::Heading { level, .. } => (
                format!("default-heading-{level}"),
                TextStyleSpec::new(
                    &theme.heading_font,
                    theme.heading_size(*level),
                    &theme.heading_color,
                ),
            ),
            ComponentKind::Quote { .. } => (
                "default-quote".to_string(),
                TextStyleSpec::new(&theme.body_font, theme.body_size, &theme.blockquote_color)
                    .with_line_height(theme.body_line_height),
            ),
            ComponentKind::PullQuote { .. } => (
                "default-pullquote".to_string(),
                TextStyleSpec::new(
                    &theme.pullquote_font,
                    theme.pullquote_size,
                    &theme.pullquote_color,
                )
                .with_transform(&theme.pullquote_transform),
            ),
            _ => return None,
        };
        self.context.text_styles.register(name.clone(), spec);
        Some(name)
    }
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn is_inline(node: &Node) -> bool {
    match node {
        Node::Text(_)
        | Node::Bold(_)
        | Node::Italic(_)
        | Node::LineBreak
        | Node::Hyperlink { .. } => true,
        Node::Other(element) => INLINE_TAGS.contains(&element.name.as_str()),
        _ => false,
    }
}

/// The image of a paragraph whose only non-blank content is one `<img>`,
/// possibly wrapped in a link.
fn sole_image(children: &[Node]) -> Option<&Element> {
    let mut meaningful = children.iter().filter(|child| !child.is_blank());
    let only = meaningful.next()?;
    if meaningful.next().is_some() {
        return None;
    }
    match only {
        Node::Other(element) if element.name == "img" => Some(element),
        Node::Hyperlink { children, .. } => sole_image(children),
        _ => None,
    }
}

fn alignment(element: &Element) -> AnchorPosition {
    if element.has_class("alignleft") {
        AnchorPosition::Left
    } else if element.has_class("alignright") {
        AnchorPosition::Right
    } else {
        AnchorPosition::None
    }
}

fn caption_of(figure: &Element) -> Option<String> {
    figure
        .descendants_named("figcaption")
        .first()
        .map(|caption| collapse_whitespace(&plain_text(&caption.children)))
        .filter(|caption| !caption.is_empty())
}

fn hyperlinks(nodes: &[Node]) -> Vec<&str> {
    let mut found = Vec::new();
    for node in nodes {
        if let Node::Hyperlink { href, .. } = node {
            found.push(href.as_str());
        }
        found.extend(hyperlinks(node.children()));
    }
    found
}

fn media_source(element: &Element) -> Option<String> {
    element
        .attr("src")
        .or_else(|| {
            element
                .descendants_named("source")
                .into_iter()
                .find_map(|source| source.attr("src"))
        })
        .map(normalize_scheme)
}

fn normalize_scheme(src: &str) -> String {
    let src = src.trim();
    match src.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => src.to_string(),
    }
}

fn is_remote(src: &str) -> bool {
    src.starts_with("https://") || src.starts_with("http://")
}

fn plain_text(nodes: &[Node]) -> String {
    nodes.iter().map(Node::text_content).collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
