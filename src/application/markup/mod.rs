//! HTML fragment parsing into a small block/inline node tree.
//!
//! Parsing goes through an HTML5 tree builder, so malformed markup is repaired
//! rather than rejected. The resulting [`Node`] sequence feeds two renderers on
//! [`MarkupParser`]: a markdown writer and an allow-list HTML sanitizer.

mod markdown;
mod sanitize;

use kuchikikiki::{ElementData, NodeData, NodeRef, traits::TendrilSink};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// One node of a parsed fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Bold(Vec<Node>),
    Italic(Vec<Node>),
    LineBreak,
    Paragraph(Vec<Node>),
    Hyperlink { href: String, children: Vec<Node> },
    OrderedList(Vec<Node>),
    UnorderedList(Vec<Node>),
    ListItem(Vec<Node>),
    /// Any tag without a dedicated variant; kept with its attributes.
    Other(Element),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Depth-first search for descendant elements with the given tag name.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        collect_named(&self.children, name, &mut found);
        found
    }
}

fn collect_named<'a>(nodes: &'a [Node], name: &str, found: &mut Vec<&'a Element>) {
    for node in nodes {
        if let Node::Other(element) = node
            && element.name == name
        {
            found.push(element);
        }
        collect_named(node.children(), name, found);
    }
}

impl Node {
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Text(_) | Node::LineBreak => &[],
            Node::Bold(children)
            | Node::Italic(children)
            | Node::Paragraph(children)
            | Node::OrderedList(children)
            | Node::UnorderedList(children)
            | Node::ListItem(children)
            | Node::Hyperlink { children, .. } => children,
            Node::Other(element) => &element.children,
        }
    }

    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Node::Text(_) => None,
            Node::Bold(_) => Some("strong"),
            Node::Italic(_) => Some("em"),
            Node::LineBreak => Some("br"),
            Node::Paragraph(_) => Some("p"),
            Node::Hyperlink { .. } => Some("a"),
            Node::OrderedList(_) => Some("ol"),
            Node::UnorderedList(_) => Some("ul"),
            Node::ListItem(_) => Some("li"),
            Node::Other(element) => Some(element.name.as_str()),
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Other(element) => Some(element),
            _ => None,
        }
    }

    /// Concatenated text of the subtree; line breaks become `\n`.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.push_text(&mut text);
        text
    }

    fn push_text(&self, buffer: &mut String) {
        match self {
            Node::Text(text) => buffer.push_str(text),
            Node::LineBreak => buffer.push('\n'),
            other => {
                for child in other.children() {
                    child.push_text(buffer);
                }
            }
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Node::Text(text) => text.trim().is_empty(),
            Node::LineBreak => true,
            _ => false,
        }
    }

    /// Re-serialize the subtree as HTML.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        self.write_html(&mut html);
        html
    }

    fn write_html(&self, html: &mut String) {
        match self {
            Node::Text(text) => html.push_str(&ammonia::clean_text(text)),
            Node::LineBreak => html.push_str("<br>"),
            Node::Hyperlink { href, children } => {
                html.push_str("<a href=\"");
                html.push_str(&ammonia::clean_text(href));
                html.push_str("\">");
                write_children(children, html);
                html.push_str("</a>");
            }
            Node::Other(element) => {
                html.push('<');
                html.push_str(&element.name);
                for (key, value) in &element.attributes {
                    html.push(' ');
                    html.push_str(key);
                    html.push_str("=\"");
                    html.push_str(&ammonia::clean_text(value));
                    html.push('"');
                }
                html.push('>');
                if VOID_ELEMENTS.contains(&element.name.as_str()) {
                    return;
                }
                write_children(&element.children, html);
                html.push_str("</");
                html.push_str(&element.name);
                html.push('>');
            }
            other => {
                let tag = other.tag_name().unwrap_or("span");
                html.push('<');
                html.push_str(tag);
                html.push('>');
                write_children(other.children(), html);
                html.push_str("</");
                html.push_str(tag);
                html.push('>');
            }
        }
    }
}

fn write_children(children: &[Node], html: &mut String) {
    for child in children {
        child.write_html(html);
    }
}

/// Serialize a node sequence back to HTML.
pub fn nodes_to_html(nodes: &[Node]) -> String {
    let mut html = String::new();
    write_children(nodes, &mut html);
    html
}

/// Parse an HTML fragment into its top-level nodes.
///
/// Never fails: unparseable input degrades to whatever the tree builder could
/// recover, which may be an empty sequence.
pub fn parse(html: &str) -> Vec<Node> {
    let document = kuchikikiki::parse_html().one(html);
    match document.select_first("body") {
        Ok(body) => convert_children(body.as_node()),
        Err(()) => Vec::new(),
    }
}

fn convert_children(node: &NodeRef) -> Vec<Node> {
    node.children().filter_map(|child| convert(&child)).collect()
}

fn convert(node: &NodeRef) -> Option<Node> {
    match node.data() {
        NodeData::Text(text) => Some(Node::Text(text.borrow().clone())),
        NodeData::Element(element) => Some(convert_element(node, element)),
        _ => None,
    }
}

fn convert_element(node: &NodeRef, element: &ElementData) -> Node {
    let name = element.name.local.to_string().to_ascii_lowercase();
    let children = convert_children(node);
    match name.as_str() {
        "strong" | "b" => Node::Bold(children),
        "em" | "i" => Node::Italic(children),
        "br" => Node::LineBreak,
        "p" => Node::Paragraph(children),
        "a" => Node::Hyperlink {
            href: element
                .attributes
                .borrow()
                .get("href")
                .unwrap_or_default()
                .trim()
                .to_string(),
            children,
        },
        "ol" => Node::OrderedList(children),
        "ul" => Node::UnorderedList(children),
        "li" => Node::ListItem(children),
        _ => {
            let attributes = element
                .attributes
                .borrow()
                .map
                .iter()
                .map(|(key, attribute)| (key.local.to_string(), attribute.value.clone()))
                .collect();
            Node::Other(Element {
                name,
                attributes,
                children,
            })
        }
    }
}

/// List context carried across sibling `<li>` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ListMode {
    #[default]
    None,
    Unordered,
    Ordered,
}

/// Renders parsed nodes as markdown or sanitized HTML.
///
/// List numbering lives on the instance, so one parser serves one document at
/// a time.
pub struct MarkupParser {
    list_mode: ListMode,
    list_index: usize,
    sanitizer: ammonia::Builder<'static>,
}

impl Default for MarkupParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupParser {
    pub fn new() -> Self {
        Self {
            list_mode: ListMode::None,
            list_index: 0,
            sanitizer: sanitize::build_sanitizer(),
        }
    }

    pub fn parse(&self, html: &str) -> Vec<Node> {
        parse(html)
    }

    /// Parse and render a fragment as markdown in one step.
    pub fn markdown_from_html(&mut self, html: &str) -> String {
        let nodes = parse(html);
        self.to_markdown(&nodes)
    }

    /// Parse and sanitize a fragment in one step.
    pub fn sanitize_html(&self, html: &str) -> String {
        let nodes = parse(html);
        self.sanitize(&nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_maps_known_tags_to_variants() {
        let nodes = parse("<p>Hi <b>there</b> <a href=\" /x \">link</a></p><ul><li>a</li></ul>");
        assert_eq!(nodes.len(), 2);
        match &nodes[0] {
            Node::Paragraph(children) => {
                assert!(matches!(children[1], Node::Bold(_)));
                match &children[3] {
                    Node::Hyperlink { href, .. } => assert_eq!(href, "/x"),
                    other => panic!("unexpected node {other:?}"),
                }
            }
            other => panic!("unexpected node {other:?}"),
        }
        assert!(matches!(nodes[1], Node::UnorderedList(_)));
    }

    #[test]
    fn malformed_markup_is_repaired() {
        let nodes = parse("<p>open <b>bold <i>both</p><div>tail");
        assert!(!nodes.is_empty());
        let text: String = nodes.iter().map(Node::text_content).collect();
        assert!(text.contains("open"));
        assert!(text.contains("tail"));
    }

    #[test]
    fn parse_is_total_and_deterministic() {
        let inputs = [
            "",
            "<",
            "</p></p></div>",
            "<<<>>>",
            "<script>alert(1)</script>",
            "<table><tr><td>cell",
            "&amp;&lt;&bogus;",
            "<p><p><p>",
            "\u{0}\u{feff}text",
        ];
        for input in inputs {
            assert_eq!(parse(input), parse(input), "input {input:?}");
        }
    }

    #[test]
    fn unknown_tags_keep_attributes_and_children() {
        let nodes = parse("<figure class=\"wp-block-image alignleft\"><img src=\"a.png\" alt=\"A\"><figcaption>Cap</figcaption></figure>");
        let figure = nodes[0].as_element().expect("figure element");
        assert_eq!(figure.name, "figure");
        assert!(figure.has_class("alignleft"));
        let images = figure.descendants_named("img");
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].attr("src"), Some("a.png"));
        assert_eq!(nodes[0].text_content(), "Cap");
    }

    #[test]
    fn serialized_text_never_reopens_markup() {
        let nodes = parse("<p>a &lt;script&gt; b</p><img src=\"x&quot;y\">");
        let html = nodes_to_html(&nodes);
        assert!(!html.contains("<script"));
        assert!(!html.contains("x\"y"));
    }

    #[test]
    fn escaped_text_survives_sanitizing() {
        let html = MarkupParser::new().sanitize(&parse("<p>a &lt; b &amp; c</p>"));
        assert_eq!(html, "<p>a &lt; b &amp; c</p>");
    }
}
