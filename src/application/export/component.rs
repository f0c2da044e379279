//! Closed taxonomy of Article Format components.
//!
//! A [`Component`] is created by the factory, mutated in place by the
//! assembler (anchor wiring, layout assignment, body merging) and frozen with
//! [`Component::to_json`] when the document is built.

use serde_json::{Map, Value, json};
use uuid::Uuid;

use super::settings::GalleryType;

/// Where a component wants to sit relative to its anchor target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorPosition {
    #[default]
    None,
    Left,
    Right,
    /// Resolved from the body orientation during the anchor pass.
    Auto,
}

impl AnchorPosition {
    pub fn opposite(self) -> Self {
        match self {
            AnchorPosition::Left => AnchorPosition::Right,
            AnchorPosition::Right => AnchorPosition::Left,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnchorPosition::None => "none",
            AnchorPosition::Left => "left",
            AnchorPosition::Right => "right",
            AnchorPosition::Auto => "auto",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Title,
    Byline,
    Intro,
    Body,
    Heading,
    Image,
    Gallery,
    Cover,
    Quote,
    PullQuote,
    Advertisement,
    EmbedWebVideo,
    Tweet,
    Instagram,
    Audio,
    Video,
    Html,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryItem {
    pub url: String,
    pub caption: Option<String>,
}

/// Role-specific payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentKind {
    Title { text: String },
    Byline { text: String },
    Intro { text: String },
    /// Markdown text.
    Body { text: String },
    Heading { level: u8, text: String },
    Image { url: String, caption: Option<String> },
    Gallery { style: GalleryType, items: Vec<GalleryItem> },
    Cover { url: String },
    Quote { text: String },
    PullQuote { text: String },
    Advertisement,
    EmbedWebVideo { url: String },
    Tweet { url: String },
    Instagram { url: String },
    Audio { url: String },
    Video { url: String, still_url: Option<String> },
    /// Sanitized HTML for markup nothing else understood.
    Html { html: String },
}

impl ComponentKind {
    pub fn role(&self) -> Role {
        match self {
            ComponentKind::Title { .. } => Role::Title,
            ComponentKind::Byline { .. } => Role::Byline,
            ComponentKind::Intro { .. } => Role::Intro,
            ComponentKind::Body { .. } => Role::Body,
            ComponentKind::Heading { .. } => Role::Heading,
            ComponentKind::Image { .. } => Role::Image,
            ComponentKind::Gallery { .. } => Role::Gallery,
            ComponentKind::Cover { .. } => Role::Cover,
            ComponentKind::Quote { .. } => Role::Quote,
            ComponentKind::PullQuote { .. } => Role::PullQuote,
            ComponentKind::Advertisement => Role::Advertisement,
            ComponentKind::EmbedWebVideo { .. } => Role::EmbedWebVideo,
            ComponentKind::Tweet { .. } => Role::Tweet,
            ComponentKind::Instagram { .. } => Role::Instagram,
            ComponentKind::Audio { .. } => Role::Audio,
            ComponentKind::Video { .. } => Role::Video,
            ComponentKind::Html { .. } => Role::Html,
        }
    }

    fn accepts_anchor(&self) -> bool {
        matches!(self, ComponentKind::Body { .. } | ComponentKind::Heading { .. })
    }
}

/// Reference from an anchored component to its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub target_identifier: String,
}

impl Anchor {
    fn to_json(&self) -> Value {
        json!({
            "targetComponentIdentifier": self.target_identifier,
            "targetAnchorPosition": "center",
            "rangeStart": 0,
            "rangeLength": 1,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    uid: String,
    kind: ComponentKind,
    layout: Option<String>,
    text_style: Option<String>,
    anchor_position: AnchorPosition,
    anchor: Option<Anchor>,
    identifier: Option<String>,
}

impl Component {
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            uid: Uuid::new_v4().simple().to_string(),
            kind,
            layout: None,
            text_style: None,
            anchor_position: AnchorPosition::None,
            anchor: None,
            identifier: None,
        }
    }

    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    pub fn with_text_style(mut self, text_style: impl Into<String>) -> Self {
        self.text_style = Some(text_style.into());
        self
    }

    pub fn with_anchor_position(mut self, position: AnchorPosition) -> Self {
        self.anchor_position = position;
        self
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    pub fn role(&self) -> Role {
        self.kind.role()
    }

    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    pub fn text_style(&self) -> Option<&str> {
        self.text_style.as_deref()
    }

    pub fn anchor_position(&self) -> AnchorPosition {
        self.anchor_position
    }

    pub fn anchor(&self) -> Option<&Anchor> {
        self.anchor.as_ref()
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn set_layout(&mut self, layout: impl Into<String>) {
        self.layout = Some(layout.into());
    }

    pub fn set_anchor_position(&mut self, position: AnchorPosition) {
        self.anchor_position = position;
    }

    /// Point this component at `target`.
    pub fn anchor_to(&mut self, target_identifier: impl Into<String>) {
        self.anchor = Some(Anchor {
            target_identifier: target_identifier.into(),
        });
    }

    /// Expose the uid as `identifier` so other components can anchor here.
    pub fn mark_anchor_target(&mut self) {
        self.identifier = Some(self.uid.clone());
    }

    pub fn is_anchor_target(&self) -> bool {
        self.identifier.is_some()
    }

    pub fn can_be_anchor_target(&self) -> bool {
        self.kind.accepts_anchor() && !self.is_anchor_target() && self.anchor.is_none()
    }

    /// Whether this component anchors onto `identifier`.
    pub fn anchors_to(&self, identifier: &str) -> bool {
        self.anchor
            .as_ref()
            .is_some_and(|anchor| anchor.target_identifier == identifier)
    }

    /// Body text, `None` for every other role.
    pub fn body_text(&self) -> Option<&str> {
        match &self.kind {
            ComponentKind::Body { text } => Some(text),
            _ => None,
        }
    }

    /// Append to a body component's text; a no-op for other roles.
    pub fn append_body_text(&mut self, more: &str) {
        if let ComponentKind::Body { text } = &mut self.kind {
            text.push_str(more);
        }
    }

    pub fn set_body_text(&mut self, value: String) {
        if let ComponentKind::Body { text } = &mut self.kind {
            *text = value;
        }
    }

    /// Freeze the component as an Article Format JSON object.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        match &self.kind {
            ComponentKind::Title { text } => text_payload(&mut map, "title", text, None),
            ComponentKind::Byline { text } => text_payload(&mut map, "byline", text, None),
            ComponentKind::Intro { text } => text_payload(&mut map, "intro", text, None),
            ComponentKind::Body { text } => {
                text_payload(&mut map, "body", text, Some("markdown"))
            }
            ComponentKind::Heading { level, text } => {
                let role = format!("heading{}", (*level).clamp(1, 6));
                text_payload(&mut map, &role, text, None);
            }
            ComponentKind::Quote { text } => text_payload(&mut map, "quote", text, None),
            ComponentKind::PullQuote { text } => {
                text_payload(&mut map, "pullquote", text, None)
            }
            ComponentKind::Html { html } => text_payload(&mut map, "body", html, Some("html")),
            ComponentKind::Image { url, caption } => {
                map.insert("role".into(), Value::from("photo"));
                map.insert("URL".into(), Value::from(url.as_str()));
                if let Some(caption) = caption {
                    map.insert("caption".into(), Value::from(caption.as_str()));
                }
            }
            ComponentKind::Gallery { style, items } => {
                map.insert("role".into(), Value::from(style.role()));
                let items: Vec<Value> = items
                    .iter()
                    .map(|item| {
                        let mut entry = Map::new();
                        entry.insert("URL".into(), Value::from(item.url.as_str()));
                        if let Some(caption) = &item.caption {
                            entry.insert("caption".into(), Value::from(caption.as_str()));
                        }
                        Value::Object(entry)
                    })
                    .collect();
                map.insert("items".into(), Value::Array(items));
            }
            ComponentKind::Cover { url } => {
                map.insert("role".into(), Value::from("header"));
                let mut photo = json!({ "role": "photo", "URL": url });
                if let (Some(layout), Value::Object(photo)) = (&self.layout, &mut photo) {
                    photo.insert("layout".into(), Value::from(layout.as_str()));
                }
                map.insert("components".into(), Value::Array(vec![photo]));
                map.insert(
                    "behavior".into(),
                    json!({ "type": "parallax", "factor": 0.8 }),
                );
            }
            ComponentKind::Advertisement => {
                map.insert("role".into(), Value::from("banner_advertisement"));
                map.insert("bannerType".into(), Value::from("standard"));
            }
            ComponentKind::EmbedWebVideo { url } => {
                map.insert("role".into(), Value::from("embedwebvideo"));
                map.insert("URL".into(), Value::from(url.as_str()));
                map.insert("aspectRatio".into(), json!(1.777));
            }
            ComponentKind::Tweet { url } => url_payload(&mut map, "tweet", url),
            ComponentKind::Instagram { url } => url_payload(&mut map, "instagram", url),
            ComponentKind::Audio { url } => url_payload(&mut map, "audio", url),
            ComponentKind::Video { url, still_url } => {
                url_payload(&mut map, "video", url);
                if let Some(still) = still_url {
                    map.insert("stillURL".into(), Value::from(still.as_str()));
                }
            }
        }

        if let Some(identifier) = &self.identifier {
            map.insert("identifier".into(), Value::from(identifier.as_str()));
        }
        if let Some(layout) = &self.layout {
            map.insert("layout".into(), Value::from(layout.as_str()));
        }
        if let Some(text_style) = &self.text_style {
            map.insert("textStyle".into(), Value::from(text_style.as_str()));
        }
        if let Some(anchor) = &self.anchor {
            map.insert("anchor".into(), anchor.to_json());
        }
        Value::Object(map)
    }
}

fn text_payload(map: &mut Map<String, Value>, role: &str, text: &str, format: Option<&str>) {
    map.insert("role".into(), Value::from(role));
    map.insert("text".into(), Value::from(text));
    if let Some(format) = format {
        map.insert("format".into(), Value::from(format));
    }
}

fn url_payload(map: &mut Map<String, Value>, role: &str, url: &str) {
    map.insert("role".into(), Value::from(role));
    map.insert("URL".into(), Value::from(url));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(text: &str) -> Component {
        Component::new(ComponentKind::Body {
            text: text.to_string(),
        })
    }

    #[test]
    fn uid_is_stable_across_mutation() {
        let mut component = body("a");
        let uid = component.uid().to_string();
        component.append_body_text("b");
        component.set_layout("body-layout");
        component.mark_anchor_target();
        assert_eq!(component.uid(), uid);
        assert_eq!(component.identifier(), Some(uid.as_str()));
    }

    #[test]
    fn uids_are_unique() {
        assert_ne!(body("a").uid(), body("a").uid());
    }

    #[test]
    fn anchor_target_eligibility() {
        let mut target = body("a");
        assert!(target.can_be_anchor_target());
        target.mark_anchor_target();
        assert!(!target.can_be_anchor_target());

        let ad = Component::new(ComponentKind::Advertisement);
        assert!(!ad.can_be_anchor_target());

        let mut anchored = body("b");
        anchored.anchor_to("x");
        assert!(!anchored.can_be_anchor_target());
        assert!(anchored.anchors_to("x"));
    }

    #[test]
    fn body_serializes_as_markdown_with_references() {
        let mut component = body("Hello\n").with_text_style("default-body");
        component.set_layout("body-layout");
        component.anchor_to("abc");
        assert_eq!(
            component.to_json(),
            json!({
                "role": "body",
                "text": "Hello\n",
                "format": "markdown",
                "layout": "body-layout",
                "textStyle": "default-body",
                "anchor": {
                    "targetComponentIdentifier": "abc",
                    "targetAnchorPosition": "center",
                    "rangeStart": 0,
                    "rangeLength": 1
                }
            })
        );
    }

    #[test]
    fn heading_role_carries_level() {
        let heading = Component::new(ComponentKind::Heading {
            level: 3,
            text: "Sub".into(),
        });
        assert_eq!(heading.to_json()["role"], "heading3");
    }

    #[test]
    fn advertisement_is_banner() {
        let ad = Component::new(ComponentKind::Advertisement).with_layout("advertisement-layout");
        assert_eq!(
            ad.to_json(),
            json!({
                "role": "banner_advertisement",
                "bannerType": "standard",
                "layout": "advertisement-layout"
            })
        );
    }

    #[test]
    fn append_ignores_non_body_roles() {
        let mut quote = Component::new(ComponentKind::Quote { text: "q".into() });
        quote.append_body_text("more");
        assert_eq!(quote.kind(), &ComponentKind::Quote { text: "q".into() });
        assert_eq!(quote.body_text(), None);
    }
}
