use std::collections::HashMap;

use spdlog::warn;
use thiserror::Error;

use crate::content::block_renderer::render_block;
use crate::content::parsing_utils::{parse_media_index, parse_metadata, scan_blocks, split_sections, CONTENT_SEPARATOR};
use crate::post::{PostDescriptor, RawPost, ValidationError};

pub mod block_renderer;
pub mod parsing_utils;
pub mod post_file;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Invalid file format. Missing content delimiter `{sep}`", sep = CONTENT_SEPARATOR)]
    MissingSeparator,
    #[error("Invalid file format. Content delimiter `{sep}` found {0} times, expected once", sep = CONTENT_SEPARATOR)]
    DuplicateSeparator(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

const DEFAULT_HEADING_LEVEL: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading { level: u8 },
    List { ordered: bool },
    Quote,
    Code,
    Embed,
    /// Tag we don't know how to render. Its text is passed through as is.
    Unknown { tag: String },
}

impl BlockKind {
    pub fn from_tag(tag: &str, attributes: &HashMap<String, String>) -> BlockKind {
        match tag {
            "paragraph" => BlockKind::Paragraph,
            "heading" => BlockKind::Heading { level: Self::heading_level(attributes.get("level")) },
            "list" => BlockKind::List {
                ordered: attributes.get("type").is_some_and(|t| t != "unordered"),
            },
            "quote" => BlockKind::Quote,
            "code" => BlockKind::Code,
            "embed" => BlockKind::Embed,
            other => BlockKind::Unknown { tag: other.to_string() },
        }
    }

    fn heading_level(level: Option<&String>) -> u8 {
        let Some(level) = level else {
            return DEFAULT_HEADING_LEVEL;
        };

        match level.parse::<u8>() {
            Ok(l) if (1..=6).contains(&l) => l,
            _ => {
                warn!("Invalid heading level {}, using h{}", level, DEFAULT_HEADING_LEVEL);
                DEFAULT_HEADING_LEVEL
            }
        }
    }
}

/// A tagged span of the content section, alive for one parse pass only.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub lines: Vec<String>,
}

impl Block {
    pub fn new(kind: BlockKind) -> Block {
        Block { kind, lines: vec![] }
    }

    /// Code keeps its indentation, everything else is trimmed.
    pub fn push_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }

        let line = match self.kind {
            BlockKind::Code => line.trim_end(),
            _ => line.trim(),
        };
        self.lines.push(line.to_string());
    }
}

/// Turns a post document into a validated post.
///
/// The document is a metadata section (`key: value` lines), the
/// `# --- Content ---` line, and a list of `[tag attr=val]...[/tag]` blocks.
pub fn compile(document: &str) -> Result<PostDescriptor, CompileError> {
    let (metadata, content) = split_sections(document)?;
    let mut metadata = parse_metadata(&metadata);

    let mut rendered: Vec<String> = vec![];
    scan_blocks(&content, |block| {
        if let Some(markup) = render_block(&block) {
            rendered.push(markup);
        }
    });

    let raw = RawPost {
        title: metadata.remove("title").unwrap_or_default(),
        content: rendered.join("\n\n"),
        category: metadata.remove("category"),
        tags: metadata.remove("tags"),
        media_index: metadata.get("featured_image").and_then(|v| parse_media_index(v)),
        status: metadata.remove("status"),
    };

    Ok(PostDescriptor::try_from(raw)?)
}
