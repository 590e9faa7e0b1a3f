//! Per-user activity summary: own questions, own answers, upvotes earned.

use crate::id::{EntityId, UserId};
use crate::model::{Answer, Question};
use crate::store::EntityStore;
use crate::vote::Votable;

/// An answer together with the question it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct AnsweredQuestion<'a> {
    pub question_id: &'a EntityId,
    pub question_title: &'a str,
    pub answer: &'a Answer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary<'a> {
    pub questions: Vec<&'a Question>,
    pub answers: Vec<AnsweredQuestion<'a>>,
    /// Upvotes received on the user's questions and answers combined.
    pub total_upvotes: usize,
}

impl<'a> ProfileSummary<'a> {
    /// Only answers whose scope is loaded in `store` are counted.
    pub fn compute(store: &'a EntityStore, user: &UserId) -> Self {
        let questions: Vec<&Question> = store
            .questions()
            .iter()
            .filter(|q| &q.author.uid == user)
            .collect();

        let answers: Vec<AnsweredQuestion<'a>> = store
            .questions()
            .iter()
            .flat_map(|q| {
                store
                    .answers(&q.id)
                    .iter()
                    .filter(|a| &a.author.uid == user)
                    .map(move |a| AnsweredQuestion {
                        question_id: &q.id,
                        question_title: &q.title,
                        answer: a,
                    })
            })
            .collect();

        let total_upvotes = questions.iter().map(|q| q.tally().up).sum::<usize>()
            + answers.iter().map(|a| a.answer.tally().up).sum::<usize>();

        Self {
            questions,
            answers,
            total_upvotes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::User;
    use crate::scope::Snapshot;
    use crate::vote::VoteSet;

    fn voters(ids: &[&str]) -> VoteSet {
        ids.iter().map(|id| UserId::from(*id)).collect()
    }

    #[test]
    fn test_summary_counts_own_content_only() {
        let me = User::new("me", "me@example.com");
        let other = User::new("other", "other@example.com");

        let mut store = EntityStore::new();
        store.apply(Snapshot::Questions(vec![
            Question {
                id: EntityId::new("q1"),
                title: "Mine".into(),
                description: "My own question".into(),
                category: Default::default(),
                tags: Default::default(),
                author: me.clone(),
                created_at: 2,
                upvotes: voters(&["a", "b"]),
                downvotes: voters(&["c"]),
            },
            Question {
                id: EntityId::new("q2"),
                title: "Theirs".into(),
                description: "Someone else's question".into(),
                category: Default::default(),
                tags: Default::default(),
                author: other.clone(),
                created_at: 1,
                upvotes: voters(&["a"]),
                downvotes: VoteSet::new(),
            },
        ]));
        store.apply(Snapshot::Answers {
            question: EntityId::new("q2"),
            answers: vec![
                Answer {
                    id: EntityId::new("a1"),
                    question_id: EntityId::new("q2"),
                    text: "My answer".into(),
                    author: me.clone(),
                    created_at: 3,
                    upvotes: voters(&["x", "y", "z"]),
                    downvotes: VoteSet::new(),
                },
                Answer {
                    id: EntityId::new("a2"),
                    question_id: EntityId::new("q2"),
                    text: "Their answer".into(),
                    author: other,
                    created_at: 4,
                    upvotes: voters(&["me"]),
                    downvotes: VoteSet::new(),
                },
            ],
        });

        let summary = ProfileSummary::compute(&store, &me.uid);
        assert_eq!(summary.questions.len(), 1);
        assert_eq!(summary.questions[0].title, "Mine");
        assert_eq!(summary.answers.len(), 1);
        assert_eq!(summary.answers[0].question_title, "Theirs");
        assert_eq!(summary.answers[0].question_id.as_str(), "q2");
        assert_eq!(summary.total_upvotes, 5);
    }

    #[test]
    fn test_empty_profile() {
        let store = EntityStore::new();
        let summary = ProfileSummary::compute(&store, &UserId::from("nobody"));
        assert!(summary.questions.is_empty());
        assert!(summary.answers.is_empty());
        assert_eq!(summary.total_upvotes, 0);
    }
}
