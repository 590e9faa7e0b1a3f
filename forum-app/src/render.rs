//! JSON renderings of the pages, printed by the demo.

use serde_json::{json, Value};

use forum_collab::ForumConfig;
use forum_core::{
    preview, EntityId, EntityStore, ExpandedSet, FeedQuery, ProfileSummary, User, Votable,
    VoteDirection,
};

fn vote_buttons(entity: &dyn Votable, viewer: Option<&User>) -> Value {
    let tally = entity.tally();
    let enabled = |direction| viewer.is_some_and(|u| !entity.has_voted(&u.uid, direction));
    json!({
        "up": tally.up,
        "down": tally.down,
        "score": tally.score(),
        "can_upvote": enabled(VoteDirection::Up),
        "can_downvote": enabled(VoteDirection::Down),
    })
}

pub fn feed(store: &EntityStore, query: &FeedQuery, viewer: Option<&User>) -> Value {
    let page = query.page(store.questions());
    let items: Vec<Value> = page
        .items
        .iter()
        .map(|q| {
            json!({
                "id": q.id,
                "title": q.title,
                "category": q.category,
                "tags": q.tags,
                "author": q.author.email,
                "votes": vote_buttons(*q, viewer),
            })
        })
        .collect();

    json!({
        "search": query.search(),
        "showing": items.len(),
        "matches": page.total_matches,
        "has_more": page.has_more(),
        "questions": items,
    })
}

pub fn thread(
    store: &EntityStore,
    question: &EntityId,
    config: &ForumConfig,
    expanded: &ExpandedSet,
    viewer: Option<&User>,
) -> Value {
    let Some(q) = store.question(question) else {
        return json!({ "error": "Question not found." });
    };

    let answers: Vec<Value> = store
        .answers(question)
        .iter()
        .map(|a| {
            let text = preview(&a.text, config.answer_preview_chars, expanded.is_expanded(&a.id));
            let comments: Vec<Value> = store
                .comments(&a.id)
                .iter()
                .map(|c| {
                    let text = preview(
                        &c.text,
                        config.comment_preview_chars,
                        expanded.is_expanded(&c.id),
                    );
                    json!({
                        "author": c.author.email,
                        "text": text.text,
                        "see_more": text.truncated,
                    })
                })
                .collect();
            json!({
                "id": a.id,
                "author": a.author.email,
                "text": text.text,
                "see_more": text.truncated,
                "see_less": text.collapsible,
                "votes": vote_buttons(a, viewer),
                "comments": comments,
            })
        })
        .collect();

    json!({
        "title": q.title,
        "description": q.description,
        "category": q.category,
        "tags": q.tags,
        "votes": vote_buttons(q, viewer),
        "answers": answers,
    })
}

pub fn profile(user: &User, summary: &ProfileSummary<'_>) -> Value {
    json!({
        "email": user.email,
        "questions": summary.questions.iter().map(|q| &q.title).collect::<Vec<_>>(),
        "answers": summary
            .answers
            .iter()
            .map(|a| json!({ "question": a.question_title, "text": a.answer.text }))
            .collect::<Vec<_>>(),
        "total_upvotes": summary.total_upvotes,
    })
}
