use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::content::{Block, BlockKind, FormatError};

pub const CONTENT_SEPARATOR: &str = "# --- Content ---";

/// Splits the document on the separator line into (metadata, content).
pub fn split_sections(document: &str) -> Result<(String, String), FormatError> {
    let lines: Vec<&str> = document.lines().collect();
    let separators: Vec<usize> = lines.iter()
        .enumerate()
        .filter(|(_, line)| line.trim() == CONTENT_SEPARATOR)
        .map(|(i, _)| i)
        .collect();

    match separators.as_slice() {
        [] => Err(FormatError::MissingSeparator),
        [pos] => Ok((lines[..*pos].join("\n"), lines[pos + 1..].join("\n"))),
        many => Err(FormatError::DuplicateSeparator(many.len())),
    }
}

pub fn parse_metadata(metadata: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();

    for line in metadata.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        // Anything after '#' is a comment
        let value = value.split('#').next().unwrap_or_default().trim();
        values.insert(key.trim().to_string(), strip_quotes(value).to_string());
    }

    values
}

/// Only plain digit strings are an index; anything else means "no image".
pub fn parse_media_index(value: &str) -> Option<usize> {
    let value = strip_quotes(value.trim());
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse::<usize>().ok()
}

fn strip_quotes(value: &str) -> &str {
    value.trim_matches('"')
}

pub struct OpenTag<'a> {
    pub name: &'a str,
    pub attributes: HashMap<String, String>,
    /// Text after the tag on the same line.
    pub rest: &'a str,
}

pub fn parse_open_tag(line: &str) -> Option<OpenTag<'_>> {
    lazy_static! {
        static ref OPEN_TAG_REGEX: Regex = Regex::new(
            r"^\[(?P<tag>\w+)(?:\s+(?P<attrs>[^\]]*))?\]"
        ).unwrap();
    }

    let caps = OPEN_TAG_REGEX.captures(line)?;
    let rest = &line[caps.get(0)?.end()..];

    // [text](url) is a link, not a block
    if rest.starts_with('(') {
        return None;
    }

    let attributes = caps.name("attrs")
        .map(|attrs| parse_attributes(attrs.as_str()))
        .unwrap_or_default();

    Some(OpenTag {
        name: caps.name("tag")?.as_str(),
        attributes,
        rest: rest.trim(),
    })
}

fn parse_attributes(attrs: &str) -> HashMap<String, String> {
    attrs.split_whitespace()
        .filter_map(|attr| attr.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Splits a trailing `[/tag]` off a line: (text before it, tag name).
fn strip_close_tag(text: &str) -> Option<(&str, &str)> {
    lazy_static! {
        static ref CLOSE_TAG_REGEX: Regex = Regex::new(r"\[/(?P<tag>\w*)\]\s*$").unwrap();
    }

    let caps = CLOSE_TAG_REGEX.captures(text)?;
    let start = caps.get(0)?.start();
    Some((&text[..start], caps.name("tag")?.as_str()))
}

/// Walks the content section and hands every finished block to `emit`,
/// in source order.
pub fn scan_blocks<F: FnMut(Block)>(content: &str, mut emit: F) {
    let mut current: Option<Block> = None;
    let mut open_tag = String::new();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.starts_with('#') {
            continue;
        }

        let mut body = raw_line.trim_end();

        if let Some(tag) = parse_open_tag(line) {
            if let Some(block) = current.take() {
                emit(block);
            }
            current = Some(Block::new(BlockKind::from_tag(tag.name, &tag.attributes)));
            open_tag = tag.name.to_string();
            body = tag.rest;
        } else if line.starts_with("[/") {
            if let Some(block) = current.take() {
                emit(block);
            }
            continue;
        }

        // Only the open block's own tag ends it mid-line; `[youtube]x[/youtube]` is content
        let closes = match strip_close_tag(body) {
            Some((before, name)) if name.is_empty() || name == open_tag => {
                body = before;
                true
            }
            _ => false,
        };

        if let Some(block) = current.as_mut() {
            block.push_line(body);
        }

        if closes {
            if let Some(block) = current.take() {
                emit(block);
            }
        }
    }

    if let Some(block) = current.take() {
        emit(block);
    }
}
