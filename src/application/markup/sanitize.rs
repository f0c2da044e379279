use std::collections::{HashMap, HashSet};

use ammonia::Builder as AmmoniaBuilder;

use super::{MarkupParser, Node, nodes_to_html};

const ALLOWED_TAGS: &[&str] = &[
    "a",
    "b",
    "blockquote",
    "br",
    "code",
    "del",
    "em",
    "i",
    "img",
    "li",
    "ol",
    "p",
    "pre",
    "strong",
    "sub",
    "sup",
    "ul",
];

/// Tags outside the allow-list are unwrapped to their text; `script` and
/// `style` lose their content entirely.
pub(super) fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let tags: HashSet<&'static str> = ALLOWED_TAGS.iter().copied().collect();
    let tag_attributes: HashMap<&'static str, HashSet<&'static str>> = HashMap::from([
        ("a", HashSet::from(["href"])),
        ("img", HashSet::from(["src", "alt"])),
    ]);

    builder
        .tags(tags)
        .tag_attributes(tag_attributes)
        .generic_attributes(HashSet::new())
        .link_rel(None);

    builder
}

impl MarkupParser {
    /// Render nodes as HTML restricted to the allow-list.
    pub fn sanitize(&self, nodes: &[Node]) -> String {
        let html = nodes_to_html(nodes);
        self.sanitizer.clean(&html).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::super::MarkupParser;

    #[test]
    fn allowed_tags_keep_only_allowed_attributes() {
        let parser = MarkupParser::new();
        let html = parser.sanitize_html(
            "<p class=\"lead\" style=\"color:red\">Hi <a href=\"https://e.x\" target=\"_blank\" onclick=\"x()\">there</a></p>",
        );
        assert_eq!(html, "<p>Hi <a href=\"https://e.x\">there</a></p>");
    }

    #[test]
    fn unknown_tags_unwrap_to_text() {
        let parser = MarkupParser::new();
        let html = parser.sanitize_html("<div><span>one</span> <section>two</section></div>");
        assert_eq!(html, "one two");
    }

    #[test]
    fn script_content_is_dropped() {
        let parser = MarkupParser::new();
        let html = parser.sanitize_html("<p>safe</p><div><script>alert(1)</script></div>");
        assert_eq!(html, "<p>safe</p>");
    }
}
