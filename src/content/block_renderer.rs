use lazy_static::lazy_static;
use regex::Regex;
use spdlog::warn;

use crate::content::{Block, BlockKind};

/// Renders one block into editor markup. Blocks without text render to nothing.
pub fn render_block(block: &Block) -> Option<String> {
    if block.lines.is_empty() {
        return None;
    }

    let content = block.lines.join("\n");
    let rendered = match &block.kind {
        BlockKind::Paragraph => format!("<p>{}</p>", convert_links(&content)),
        BlockKind::Heading { level } => format!("<h{0}>{1}</h{0}>", level, content),
        BlockKind::List { ordered } => render_list(&block.lines, *ordered),
        BlockKind::Quote => format!("<blockquote>{}</blockquote>", content),
        // Not escaped. Whoever writes the post is in charge of that.
        BlockKind::Code => format!("<pre><code>{}</code></pre>", content),
        // WordPress shortcode, the editor expands it
        BlockKind::Embed => format!("[embed]{}[/embed]", content),
        BlockKind::Unknown { tag } => {
            warn!("Unknown block type [{}], passing content through", tag);
            content
        }
    };

    Some(rendered)
}

/// `[text](url)` into an anchor
fn convert_links(text: &str) -> String {
    lazy_static! {
        static ref LINK_REGEX: Regex = Regex::new(r"\[(.*?)\]\((.*?)\)").unwrap();
    }

    LINK_REGEX.replace_all(text, r#"<a href="${2}">${1}</a>"#).to_string()
}

fn render_list(lines: &[String], ordered: bool) -> String {
    lazy_static! {
        // "- item", "1. item"
        static ref MARKER_REGEX: Regex = Regex::new(r"^[-\d\s.]+").unwrap();
    }

    let tag = if ordered { "ol" } else { "ul" };
    let items: String = lines.iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| format!("<li>{}</li>", MARKER_REGEX.replace(line, "").trim()))
        .collect();

    format!("<{0}>\n{1}\n</{0}>", tag, items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(kind: BlockKind, lines: &[&str]) -> Block {
        Block {
            kind,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn test_paragraph_multiple_links() {
        let b = block(BlockKind::Paragraph, &["See [one](https://a.test) and", "[two](https://b.test)."]);
        assert_eq!(render_block(&b).unwrap(),
                   "<p>See <a href=\"https://a.test\">one</a> and\n<a href=\"https://b.test\">two</a>.</p>");
    }

    #[test]
    fn test_list_markers() {
        let b = block(BlockKind::List { ordered: false }, &["- apples", "-pears", "  3. plums"]);
        assert_eq!(render_block(&b).unwrap(), "<ul>\n<li>apples</li><li>pears</li><li>plums</li>\n</ul>");
    }

    #[test]
    fn test_code_is_not_escaped() {
        let b = block(BlockKind::Code, &["if a < b {", "    <tag>", "}"]);
        assert_eq!(render_block(&b).unwrap(), "<pre><code>if a < b {\n    <tag>\n}</code></pre>");
    }

    #[test]
    fn test_quote_and_embed() {
        let b = block(BlockKind::Quote, &["To be."]);
        assert_eq!(render_block(&b).unwrap(), "<blockquote>To be.</blockquote>");
        let b = block(BlockKind::Embed, &["https://youtu.be/xyz"]);
        assert_eq!(render_block(&b).unwrap(), "[embed]https://youtu.be/xyz[/embed]");
    }

    #[test]
    fn test_unknown_passes_through() {
        let b = block(BlockKind::Unknown { tag: "gallery".to_string() }, &["<b>raw</b>", "text"]);
        assert_eq!(render_block(&b).unwrap(), "<b>raw</b>\ntext");
    }

    #[test]
    fn test_empty_block_renders_nothing() {
        assert!(render_block(&block(BlockKind::Paragraph, &[])).is_none());
    }
}
