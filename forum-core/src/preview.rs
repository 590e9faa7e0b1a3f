//! "See more / see less" truncation for long answers and comments.

use std::collections::HashSet;

use crate::id::EntityId;

pub const ANSWER_PREVIEW_CHARS: usize = 180;
pub const COMMENT_PREVIEW_CHARS: usize = 100;

/// Text as displayed, plus whether a toggle should be offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preview<'a> {
    pub text: &'a str,
    /// Text was cut; render "see more".
    pub truncated: bool,
    /// Text is longer than the limit and fully shown; render "see less".
    pub collapsible: bool,
}

/// Cut `text` to `limit` characters unless `expanded`.
pub fn preview(text: &str, limit: usize, expanded: bool) -> Preview<'_> {
    let cut = text.char_indices().nth(limit).map(|(idx, _)| idx);
    match cut {
        None => Preview {
            text,
            truncated: false,
            collapsible: false,
        },
        Some(_) if expanded => Preview {
            text,
            truncated: false,
            collapsible: true,
        },
        Some(idx) => Preview {
            text: &text[..idx],
            truncated: true,
            collapsible: false,
        },
    }
}

/// Which answers/comments the reader has expanded.
#[derive(Debug, Clone, Default)]
pub struct ExpandedSet(HashSet<EntityId>);

impl ExpandedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the state of `id`; returns the new state.
    pub fn toggle(&mut self, id: &EntityId) -> bool {
        if self.0.remove(id) {
            false
        } else {
            self.0.insert(id.clone());
            true
        }
    }

    pub fn is_expanded(&self, id: &EntityId) -> bool {
        self.0.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        let p = preview("short", COMMENT_PREVIEW_CHARS, false);
        assert_eq!(p.text, "short");
        assert!(!p.truncated);
        assert!(!p.collapsible);
    }

    #[test]
    fn test_long_text_cut_at_limit() {
        let text = "x".repeat(ANSWER_PREVIEW_CHARS + 20);
        let p = preview(&text, ANSWER_PREVIEW_CHARS, false);
        assert_eq!(p.text.chars().count(), ANSWER_PREVIEW_CHARS);
        assert!(p.truncated);

        let p = preview(&text, ANSWER_PREVIEW_CHARS, true);
        assert_eq!(p.text.len(), text.len());
        assert!(p.collapsible);
    }

    #[test]
    fn test_exact_limit_not_truncated() {
        let text = "y".repeat(COMMENT_PREVIEW_CHARS);
        assert!(!preview(&text, COMMENT_PREVIEW_CHARS, false).truncated);
    }

    #[test]
    fn test_cut_respects_char_boundaries() {
        let text = "é".repeat(5);
        let p = preview(&text, 3, false);
        assert_eq!(p.text, "ééé");
    }

    #[test]
    fn test_expanded_toggle() {
        let mut expanded = ExpandedSet::new();
        let id = EntityId::new("a1");
        assert!(expanded.toggle(&id));
        assert!(expanded.is_expanded(&id));
        assert!(!expanded.toggle(&id));
        assert!(!expanded.is_expanded(&id));
    }
}
