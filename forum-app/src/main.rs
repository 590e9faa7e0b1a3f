//! Forum demo: two users sharing an in-memory backend.
//!
//! Alice and Bob each get their own client session and Entity Store, kept
//! current by realtime subscriptions. The script walks through posting,
//! answering, commenting and voting, and prints each page as JSON.
//! Set `RUST_LOG=debug` to see every snapshot applied.

mod render;

use log::info;
use std::time::Duration;

use forum_collab::{
    shared_store, AccountController, CompositionController, ForumConfig, IdentityProvider,
    MemoryBackend, ProfileLoader, SessionContext, SharedStore, Submission, SyncAdapter, ThreadView,
    VoteController,
};
use forum_core::{
    AnswerDraft, Category, CommentDraft, EntityStore, ExpandedSet, FeedQuery, QuestionDraft,
    Scope, Tag, VoteDirection, VoteTarget,
};

/// Wait until a pushed snapshot makes `check` true.
async fn settle(
    store: &SharedStore,
    check: impl Fn(&EntityStore) -> bool,
) -> Result<(), tokio::time::error::Elapsed> {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check(&*store.read().await) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting forum demo...");
    let config = ForumConfig::default().with_latency(Duration::from_millis(40));
    let backend = MemoryBackend::new(config.clone());

    let alice = AccountController::new(backend.connect());
    let bob = AccountController::new(backend.connect());
    for (accounts, email) in [(&alice, "alice@example.com"), (&bob, "bob@example.com")] {
        accounts.sign_up(email, "correct-horse").await?;
        accounts.sign_in(email, "correct-horse").await?;
    }

    let alice_session = SessionContext::init(alice.auth());
    let bob_session = SessionContext::init(bob.auth());
    let alice_store = shared_store();
    let bob_store = shared_store();

    let alice_home = SyncAdapter::attach(&backend, alice_store.clone(), Scope::Questions).await?;
    let alice_compose = CompositionController::new(backend.clone(), alice_session.clone());
    let bob_compose = CompositionController::new(backend.clone(), bob_session.clone());
    let alice_votes = VoteController::new(backend.clone(), alice_store.clone(), alice_session.clone());
    let bob_votes = VoteController::new(backend.clone(), bob_store.clone(), bob_session.clone());

    // Alice asks. The first attempt fails validation and keeps her input.
    let mut form = Submission::new(QuestionDraft::new("Sets?", "short"));
    if let Err(e) = alice_compose.submit_question_form(&mut form).await {
        info!("Question rejected: {e}");
    }
    {
        let draft = form.draft_mut();
        draft.title = "Deduplicating voters".into();
        draft.description = "How do I keep a list of voters free of duplicates?".into();
        draft.category = Category::Programming;
        draft.toggle_tag(Tag::JavaScript);
        draft.toggle_tag(Tag::Firebase);
    }
    let question = alice_compose.submit_question_form(&mut form).await?;

    // Acknowledged, but not on screen until the push lands.
    let visible_now = alice_store.read().await.get(&question).is_some();
    info!("Question {question} visible right after submit: {visible_now}");
    settle(&alice_store, |s| s.get(&question).is_some()).await?;

    // Bob opens the thread and answers at length.
    let mut bob_thread = ThreadView::open(backend.clone(), bob_store.clone(), question.clone()).await?;
    let answer = bob_compose
        .submit_answer(
            &question,
            AnswerDraft::new(
                "Store voters in a set keyed by user id rather than an array. The backend's \
                 append-if-absent update then becomes a real set insert, so a double click or \
                 a stale view can never count the same person twice, and two people voting at \
                 once both land.",
            ),
        )
        .await?;
    settle(&bob_store, |s| s.answer(&question, &answer).is_some()).await?;
    bob_thread.sync_comments().await?;

    let mut alice_thread =
        ThreadView::open(backend.clone(), alice_store.clone(), question.clone()).await?;
    alice_compose
        .submit_comment(&question, &answer, CommentDraft::new("That did it, thanks!"))
        .await?;

    // Both vote at once; set-union keeps both.
    let question_target = VoteTarget::Question(question.clone());
    let answer_target = VoteTarget::Answer {
        question: question.clone(),
        answer: answer.clone(),
    };
    let (a, b) = tokio::join!(
        alice_votes.cast_vote(&answer_target, VoteDirection::Up),
        bob_votes.cast_vote(&question_target, VoteDirection::Up),
    );
    let (a, b) = (a?, b?);
    info!("Alice's vote: {a:?}, Bob's vote: {b:?}");

    settle(&alice_store, |s| {
        s.answer(&question, &answer).is_some_and(|a| !a.upvotes.is_empty())
    })
    .await?;
    let again = alice_votes.cast_vote(&answer_target, VoteDirection::Up).await?;
    info!("Alice votes again: {again:?}");

    alice_thread.sync_comments().await?;
    settle(&alice_store, |s| s.comments(&answer).len() == 1).await?;
    settle(&alice_store, |s| {
        s.question(&question).is_some_and(|q| q.upvotes.len() == 1)
    })
    .await?;

    let viewer = alice_session.current_user();
    {
        let store = alice_store.read().await;
        let mut query = FeedQuery::new(config.page_size);
        println!("{:#}", render::feed(&store, &query, viewer.as_ref()));
        query.set_search("firebase");
        println!("{:#}", render::feed(&store, &query, viewer.as_ref()));

        let mut expanded = ExpandedSet::new();
        println!(
            "{:#}",
            render::thread(&store, &question, &config, &expanded, viewer.as_ref())
        );
        expanded.toggle(&answer);
        println!(
            "{:#}",
            render::thread(&store, &question, &config, &expanded, viewer.as_ref())
        );
    }

    let profile = ProfileLoader::new(backend.clone(), bob_session.clone()).load().await?;
    println!("{:#}", render::profile(profile.user(), &profile.summary()));

    // Carol arrives through Google; her account is created on the spot.
    let carol = AccountController::new(
        backend
            .connect()
            .with_identity(IdentityProvider::Google, "carol@gmail.com"),
    );
    carol.sign_in_with_provider(IdentityProvider::Google).await?;
    let carol_session = SessionContext::init(carol.auth());
    let carol_profile = ProfileLoader::new(backend.clone(), carol_session.clone());
    let mut live = carol_profile.live(&backend).await?;
    if let Some(snapshot) = live.next().await {
        let profile = snapshot?;
        println!("{:#}", render::profile(profile.user(), &profile.summary()));
    }
    drop(live);
    carol.sign_out().await?;
    carol_session.shutdown();

    alice_thread.close().await;
    bob_thread.close().await;
    alice_home.unsubscribe().await;
    alice.sign_out().await?;
    bob.sign_out().await?;
    alice_session.shutdown();
    bob_session.shutdown();

    info!("Demo finished");
    Ok(())
}
