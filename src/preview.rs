//! Preview state: extracted text plus the numbers derived from it.
//!
//! [`PreviewState`] owns the text and computes `word_count` and `char_count`
//! from it in one place. Its fields are private, so the counts can never drift
//! from the text they describe; replacing the text means building a new state.

use serde::Serialize;
use std::borrow::Cow;

/// Characters shown before the preview is truncated.
pub const PREVIEW_LIMIT: usize = 500;

/// Marker appended to a truncated preview.
pub const ELLIPSIS: &str = "...";

/// Derived view of one successful extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewState {
    extracted_text: String,
    word_count: usize,
    char_count: usize,
    is_expanded: bool,
}

impl PreviewState {
    /// Derive counts from `text`. Starts collapsed.
    pub fn from_text(text: impl Into<String>) -> Self {
        let extracted_text = text.into();
        Self {
            word_count: count_words(&extracted_text),
            char_count: count_chars(&extracted_text),
            extracted_text,
            is_expanded: false,
        }
    }

    pub fn extracted_text(&self) -> &str {
        &self.extracted_text
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn is_expanded(&self) -> bool {
        self.is_expanded
    }

    /// Whether the text is long enough for an expand/collapse toggle.
    pub fn can_toggle(&self, limit: usize) -> bool {
        self.char_count > limit
    }

    /// Flip between truncated and full display. No-op when there is nothing
    /// to expand.
    pub fn toggle(&mut self, limit: usize) {
        if self.can_toggle(limit) {
            self.is_expanded = !self.is_expanded;
        }
    }

    /// Text to show: the first `limit` characters plus [`ELLIPSIS`] while
    /// collapsed, otherwise everything.
    pub fn display(&self, limit: usize) -> Cow<'_, str> {
        if self.is_expanded || !self.can_toggle(limit) {
            return Cow::Borrowed(&self.extracted_text);
        }
        let cut = self
            .extracted_text
            .char_indices()
            .nth(limit)
            .map(|(i, _)| i)
            .unwrap_or(self.extracted_text.len());
        Cow::Owned(format!("{}{}", &self.extracted_text[..cut], ELLIPSIS))
    }

    /// Serialisable view for observers.
    pub fn view(&self, limit: usize) -> PreviewView {
        PreviewView {
            text: self.display(limit).into_owned(),
            word_count: self.word_count,
            char_count: self.char_count,
            is_expanded: self.is_expanded,
            can_toggle: self.can_toggle(limit),
        }
    }
}

/// What a preview panel renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewView {
    pub text: String,
    pub word_count: usize,
    pub char_count: usize,
    pub is_expanded: bool,
    pub can_toggle: bool,
}

/// Number of maximal runs of non-whitespace characters.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Length in characters, whitespace included.
pub fn count_chars(text: &str) -> usize {
    text.chars().count()
}
