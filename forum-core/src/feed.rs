//! Question feed: search filter and infinite-scroll pagination.

use crate::model::Question;

/// Questions shown per page, and added per "load more".
pub const DEFAULT_PAGE_SIZE: usize = 9;

/// Search text plus the number of visible items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    search: String,
    visible: usize,
    page_size: usize,
}

/// One rendered page of the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage<'a> {
    pub items: Vec<&'a Question>,
    /// Matches before pagination.
    pub total_matches: usize,
}

impl FeedPage<'_> {
    /// Whether the "loading more" sentinel should be shown.
    pub fn has_more(&self) -> bool {
        self.items.len() < self.total_matches
    }
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl FeedQuery {
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            search: String::new(),
            visible: page_size,
            page_size,
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn visible(&self) -> usize {
        self.visible
    }

    /// Scroll sentinel reached: show one more page.
    pub fn load_more(&mut self) {
        self.visible += self.page_size;
    }

    /// Case-insensitive match on the title or any tag.
    pub fn matches(&self, question: &Question) -> bool {
        let needle = self.search.to_lowercase();
        question.title.to_lowercase().contains(&needle)
            || question
                .tags
                .iter()
                .any(|tag| tag.as_str().to_lowercase().contains(&needle))
    }

    pub fn page<'a>(&self, questions: &'a [Question]) -> FeedPage<'a> {
        let matching: Vec<&Question> = questions.iter().filter(|q| self.matches(q)).collect();
        let total_matches = matching.len();
        FeedPage {
            items: matching.into_iter().take(self.visible).collect(),
            total_matches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::EntityId;
    use crate::model::{Tag, User};
    use crate::vote::VoteSet;

    fn question(n: usize, title: &str, tags: &[Tag]) -> Question {
        Question {
            id: EntityId::new(format!("q{n}")),
            title: title.to_string(),
            description: "Some description here".into(),
            category: Default::default(),
            tags: tags.iter().copied().collect(),
            author: User::new("u", "u@example.com"),
            created_at: n as u64,
            upvotes: VoteSet::new(),
            downvotes: VoteSet::new(),
        }
    }

    #[test]
    fn test_empty_search_matches_all() {
        let questions: Vec<Question> = (0..5).map(|n| question(n, "Title", &[])).collect();
        let page = FeedQuery::default().page(&questions);
        assert_eq!(page.items.len(), 5);
        assert!(!page.has_more());
    }

    #[test]
    fn test_search_title_and_tags() {
        let questions = vec![
            question(0, "How do hooks work?", &[Tag::React]),
            question(1, "Borrow checker woes", &[Tag::Other]),
            question(2, "Flexbox centering", &[Tag::Css]),
        ];
        let mut query = FeedQuery::default();

        query.set_search("HOOKS");
        assert_eq!(query.page(&questions).items[0].id.as_str(), "q0");

        query.set_search("css");
        let page = query.page(&questions);
        assert_eq!(page.total_matches, 1);
        assert_eq!(page.items[0].id.as_str(), "q2");

        query.set_search("nothing matches this");
        assert!(query.page(&questions).items.is_empty());
    }

    #[test]
    fn test_pagination() {
        let questions: Vec<Question> = (0..20).map(|n| question(n, "Title", &[])).collect();
        let mut query = FeedQuery::default();

        let page = query.page(&questions);
        assert_eq!(page.items.len(), 9);
        assert!(page.has_more());

        query.load_more();
        assert_eq!(query.page(&questions).items.len(), 18);

        query.load_more();
        let page = query.page(&questions);
        assert_eq!(page.items.len(), 20);
        assert!(!page.has_more());
    }

    #[test]
    fn test_zero_page_size_clamped() {
        let query = FeedQuery::new(0);
        assert_eq!(query.visible(), 1);
    }
}
