//! Note domain model and tag normalization rules.
//!
//! # Responsibility
//! - Define the note record, creation input and content patch.
//! - Own the tag validation rule shared by every tag entry point.
//!
//! # Invariants
//! - `tags` keeps first-insertion order and never holds duplicates.
//! - A tag is never empty and never contains whitespace.
//! - Tags are case-sensitive: `Work` and `work` are distinct.
//! - `title` is never blank; blank input becomes the untitled placeholder.

use crate::clock::Timestamp;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one note.
pub type NoteId = Uuid;

/// Title given to notes created or saved without one.
pub const DEFAULT_NOTE_TITLE: &str = "Untitled Note";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s").expect("valid ws regex"));

/// Rejection reasons for one tag value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValidationError {
    /// Tag is empty after trimming.
    Empty,
    /// Tag contains a space or inner whitespace.
    ContainsWhitespace(String),
}

impl Display for TagValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "tag cannot be empty"),
            Self::ContainsWhitespace(value) => {
                write!(f, "tag cannot contain whitespace: `{value}`")
            }
        }
    }
}

impl Error for TagValidationError {}

/// Validates and trims one tag input.
///
/// Rules:
/// - Surrounding line breaks and tabs are trimmed.
/// - Any space character, leading or inner, rejects the whole input.
/// - Any whitespace left after trimming rejects the input.
pub fn normalize_tag(raw: &str) -> Result<String, TagValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TagValidationError::Empty);
    }
    if raw.contains(' ') || WHITESPACE_RE.is_match(trimmed) {
        return Err(TagValidationError::ContainsWhitespace(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Normalizes a tag list: invalid entries are dropped, duplicates keep their
/// first position.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for raw in tags {
        if let Ok(tag) = normalize_tag(raw.as_ref()) {
            if !normalized.contains(&tag) {
                normalized.push(tag);
            }
        }
    }
    normalized
}

fn title_or_placeholder(raw: &str, placeholder: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        placeholder.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Free-form note with tags and a favorite flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: Timestamp,
    /// Bumped by title, content and tag changes only.
    pub modified_at: Timestamp,
    pub is_favorite: bool,
}

impl Note {
    /// Builds a new note; `placeholder` replaces a blank title.
    pub fn create(input: NewNote, placeholder: &str, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title_or_placeholder(&input.title, placeholder),
            content: input.content,
            tags: normalize_tags(&input.tags),
            created_at: now,
            modified_at: now,
            is_favorite: input.is_favorite,
        }
    }

    /// Applies a content patch. Returns whether anything was supplied; the
    /// caller bumps `modified_at` in that case.
    pub fn apply(&mut self, patch: NotePatch, placeholder: &str) -> bool {
        if patch.is_empty() {
            return false;
        }
        if let Some(title) = patch.title {
            self.title = title_or_placeholder(&title, placeholder);
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(tags) = patch.tags {
            self.tags = normalize_tags(&tags);
        }
        true
    }

    /// Appends one tag.
    ///
    /// Returns `Ok(false)` when the tag is already present.
    pub fn add_tag(&mut self, raw: &str) -> Result<bool, TagValidationError> {
        let tag = normalize_tag(raw)?;
        if self.tags.contains(&tag) {
            return Ok(false);
        }
        self.tags.push(tag);
        Ok(true)
    }

    /// Removes an exact tag match. Returns whether a tag was removed.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|existing| existing != tag);
        self.tags.len() != before
    }

    /// Superset check used by tag filtering.
    pub fn has_all_tags(&self, required: &[String]) -> bool {
        required.iter().all(|tag| self.tags.contains(tag))
    }
}

/// Creation input for one note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_favorite: bool,
}

impl NewNote {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }
}

/// Content patch for one note. Favorite state is changed separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tags.is_none()
    }

    /// Overlays `newer` on top of this patch, field by field.
    pub fn merge(&mut self, newer: NotePatch) {
        if newer.title.is_some() {
            self.title = newer.title;
        }
        if newer.content.is_some() {
            self.content = newer.content;
        }
        if newer.tags.is_some() {
            self.tags = newer.tags;
        }
    }
}
