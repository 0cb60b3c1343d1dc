use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Post title is required")]
    EmptyTitle,
    #[error("Post content is required")]
    EmptyContent,
    #[error("Invalid post status: {0}")]
    InvalidStatus(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostStatus {
    #[default]
    Draft,
    Publish,
    Private,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Publish => "publish",
            PostStatus::Private => "private",
        }
    }
}

impl FromStr for PostStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "publish" => Ok(PostStatus::Publish),
            "private" => Ok(PostStatus::Private),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

impl Display for PostStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unvalidated post fields, as collected from a document.
/// `status` stays a string so an unknown value can be reported.
#[derive(Debug, Clone, Default)]
pub struct RawPost {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Option<String>,
    pub media_index: Option<usize>,
    pub status: Option<String>,
}

/// A post ready to be handed to the publisher.
///
/// Only obtainable through `TryFrom<RawPost>`, which is the single place
/// where title, content and status are checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDescriptor {
    title: String,
    content: String,
    category: Option<String>,
    tags: Option<String>,
    media_index: Option<usize>,
    status: PostStatus,
}

impl PostDescriptor {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn tags(&self) -> Option<&str> {
        self.tags.as_deref()
    }

    /// 1-based position in the media library.
    pub fn media_index(&self) -> Option<usize> {
        self.media_index
    }

    pub fn status(&self) -> PostStatus {
        self.status
    }
}

impl TryFrom<RawPost> for PostDescriptor {
    type Error = ValidationError;

    fn try_from(raw: RawPost) -> Result<Self, Self::Error> {
        if raw.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if raw.content.trim().is_empty() {
            return Err(ValidationError::EmptyContent);
        }

        let status = match raw.status {
            Some(ref status) => status.parse::<PostStatus>()?,
            None => PostStatus::default(),
        };

        Ok(PostDescriptor {
            title: raw.title,
            content: raw.content,
            category: raw.category.filter(|c| !c.is_empty()),
            tags: raw.tags.filter(|t| !t.is_empty()),
            media_index: raw.media_index,
            status,
        })
    }
}

impl Display for PostDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "title={}, status={}, category={}, tags={}, featured_image={}\ncontent:\n{}",
               self.title,
               self.status,
               self.category.as_deref().unwrap_or("-"),
               self.tags.as_deref().unwrap_or("-"),
               self.media_index.map(|i| i.to_string()).unwrap_or("-".to_string()),
               self.content
        )
    }
}
