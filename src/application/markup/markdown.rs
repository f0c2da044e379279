use super::{ListMode, MarkupParser, Node};

impl MarkupParser {
    /// Render nodes as the markdown dialect accepted by body components.
    pub fn to_markdown(&mut self, nodes: &[Node]) -> String {
        let mut out = String::new();
        for node in nodes {
            self.write_node(node, &mut out);
        }
        out
    }

    fn write_node(&mut self, node: &Node, out: &mut String) {
        match node {
            Node::Text(text) => push_collapsed(text, out),
            Node::Bold(children) => self.write_wrapped(children, "**", out),
            Node::Italic(children) => self.write_wrapped(children, "_", out),
            Node::LineBreak => out.push('\n'),
            Node::Paragraph(children) => {
                out.push_str(&self.to_markdown(children));
                out.push_str("\n\n");
            }
            Node::Hyperlink { href, children } => {
                let text = self.to_markdown(children);
                if href.is_empty() {
                    out.push_str(&text);
                } else {
                    out.push('[');
                    out.push_str(text.trim());
                    out.push_str("](");
                    out.push_str(href);
                    out.push(')');
                }
            }
            Node::UnorderedList(children) => self.write_list(ListMode::Unordered, children, out),
            Node::OrderedList(children) => self.write_list(ListMode::Ordered, children, out),
            Node::ListItem(children) => {
                let prefix = match self.list_mode {
                    ListMode::Ordered => {
                        let prefix = format!("{}. ", self.list_index);
                        self.list_index += 1;
                        prefix
                    }
                    ListMode::Unordered | ListMode::None => "- ".to_string(),
                };
                let content = self.to_markdown(children);
                out.push_str(&prefix);
                out.push_str(content.trim());
                out.push('\n');
            }
            Node::Other(element) => match element.name.as_str() {
                "script" | "style" | "noscript" | "template" => {}
                _ => {
                    let inner = self.to_markdown(&element.children);
                    out.push_str(&inner);
                }
            },
        }
    }

    fn write_wrapped(&mut self, children: &[Node], marker: &str, out: &mut String) {
        let inner = self.to_markdown(children);
        if inner.trim().is_empty() {
            out.push_str(&inner);
            return;
        }
        out.push_str(marker);
        out.push_str(&inner);
        out.push_str(marker);
    }

    /// Lists save and restore the enclosing list state so nested lists number
    /// independently.
    fn write_list(&mut self, mode: ListMode, children: &[Node], out: &mut String) {
        let saved = (self.list_mode, self.list_index);
        self.list_mode = mode;
        self.list_index = 1;

        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        for child in children {
            match child {
                Node::ListItem(_) => self.write_node(child, out),
                other if other.is_blank() => {}
                other => self.write_node(other, out),
            }
        }
        out.push('\n');

        (self.list_mode, self.list_index) = saved;
    }
}

fn push_collapsed(text: &str, out: &mut String) {
    let mut previous_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !previous_space {
                out.push(' ');
            }
            previous_space = true;
        } else {
            out.push(ch);
            previous_space = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{MarkupParser, parse};

    fn markdown(html: &str) -> String {
        MarkupParser::new().markdown_from_html(html)
    }

    #[test]
    fn paragraphs_end_with_blank_line() {
        assert_eq!(markdown("<p>Hello</p>"), "Hello\n\n");
        assert_eq!(markdown("<p>One</p><p>Two</p>"), "One\n\nTwo\n\n");
    }

    #[test]
    fn inline_formatting_and_links() {
        assert_eq!(
            markdown("<p><strong>bold</strong> and <em>it</em> <a href=\"https://e.x\">here</a></p>"),
            "**bold** and _it_ [here](https://e.x)\n\n"
        );
    }

    #[test]
    fn whitespace_collapses_inside_text() {
        assert_eq!(markdown("<p>a\n   b\t c</p>"), "a b c\n\n");
    }

    #[test]
    fn unordered_lists_use_dashes() {
        assert_eq!(
            markdown("<ul><li>one</li><li>two</li></ul>"),
            "- one\n- two\n\n"
        );
    }

    #[test]
    fn ordered_lists_restart_for_every_list() {
        let html = "<ol><li>a</li><li>b</li><li>c</li></ol><ol><li>x</li><li>y</li></ol>";
        assert_eq!(markdown(html), "1. a\n2. b\n3. c\n\n1. x\n2. y\n\n");
    }

    #[test]
    fn ordered_numbering_ignores_inline_nesting() {
        let html = "<ol><li><b>a</b></li><li><i><b><a href=\"/l\">b</a></b></i></li><li>c</li></ol>";
        assert_eq!(markdown(html), "1. **a**\n2. _**[b](/l)**_\n3. c\n\n");
    }

    #[test]
    fn nested_lists_resume_outer_numbering() {
        let html = "<ol><li>a<ul><li>x</li></ul></li><li>b</li></ol>";
        assert_eq!(markdown(html), "1. a\n- x\n2. b\n\n");
    }

    #[test]
    fn unsupported_tags_degrade_to_text() {
        assert_eq!(
            markdown("<p><span class=\"x\">kept</span> <mark>too</mark></p>"),
            "kept too\n\n"
        );
        assert_eq!(markdown("<script>alert(1)</script>"), "");
    }

    #[test]
    fn parser_instance_state_spans_calls_within_a_document() {
        let mut parser = MarkupParser::new();
        let first = parser.to_markdown(&parse("<ol><li>a</li></ol>"));
        let second = parser.to_markdown(&parse("<ol><li>b</li></ol>"));
        assert_eq!(first, "1. a\n\n");
        assert_eq!(second, "1. b\n\n");
    }
}
