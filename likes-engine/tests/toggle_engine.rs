mod common;

use common::{Directory, RacingStore};
use likes_engine::toggle::ToggleEngine;
use likes_repository::{CountAggregator, MemoryVoteStore, VoteStore};
use likes_shared::types::{ToggleAction, VotesCount};
use std::sync::Arc;

fn engine_over(store: Arc<MemoryVoteStore>) -> ToggleEngine {
    let directory = Arc::new(Directory::populated());
    ToggleEngine::new(store, directory.clone(), directory)
}

#[tokio::test]
async fn test_like_twice_toggles_off() {
    let store = Arc::new(MemoryVoteStore::new());
    let engine = engine_over(store.clone());

    let first = engine.toggle(1, 1, Some(true), true).await.unwrap();
    assert_eq!(first.action, ToggleAction::Created);
    assert_eq!(first.liked, Some(true));

    let second = engine.toggle(1, 1, Some(true), true).await.unwrap();
    assert_eq!(second.action, ToggleAction::Deleted);
    assert_eq!(second.liked, None);
    assert_eq!(store.user_status(1, 1).await.unwrap(), None);
}

#[tokio::test]
async fn test_like_then_dislike_updates() {
    let store = Arc::new(MemoryVoteStore::new());
    let engine = engine_over(store.clone());

    engine.toggle(1, 1, Some(true), true).await.unwrap();
    let outcome = engine.toggle(1, 1, Some(false), true).await.unwrap();

    assert_eq!(outcome.action, ToggleAction::Updated);
    assert_eq!(outcome.liked, Some(false));
    assert_eq!(store.user_status(1, 1).await.unwrap(), Some(false));
    assert_eq!(store.counts(1).await.unwrap(), VotesCount::new(0, 1));
    assert!(store.find(1, 1).await.unwrap().unwrap().modified_at.is_some());
}

#[tokio::test]
async fn test_locked_vote_is_denied() {
    let store = Arc::new(MemoryVoteStore::new());
    let engine = engine_over(store.clone());

    let first = engine.toggle(1, 1, Some(true), false).await.unwrap();
    assert_eq!(first.action, ToggleAction::Created);

    let flip = engine.toggle(1, 1, Some(false), false).await.unwrap();
    assert_eq!(flip.action, ToggleAction::Denied);
    assert_eq!(flip.liked, Some(true));

    let clear = engine.toggle(1, 1, None, false).await.unwrap();
    assert_eq!(clear.action, ToggleAction::Denied);
    assert_eq!(store.user_status(1, 1).await.unwrap(), Some(true));
}

#[tokio::test]
async fn test_clear_without_vote_is_noop() {
    let store = Arc::new(MemoryVoteStore::new());
    let engine = engine_over(store.clone());

    let outcome = engine.toggle(1, 1, None, true).await.unwrap();
    assert_eq!(outcome.action, ToggleAction::None);
    assert_eq!(outcome.liked, None);
    assert!(store.is_empty().await);

    engine.toggle(1, 1, Some(false), true).await.unwrap();
    let cleared = engine.toggle(1, 1, None, true).await.unwrap();
    assert_eq!(cleared.action, ToggleAction::Deleted);
}

#[tokio::test]
async fn test_unknown_actor_or_resource_is_error_outcome() {
    let store = Arc::new(MemoryVoteStore::new());
    let engine = engine_over(store.clone());

    let unknown_actor = engine.toggle(1, 99, Some(true), true).await.unwrap();
    assert_eq!(unknown_actor.action, ToggleAction::Error);

    let unknown_resource = engine.toggle(999, 1, Some(true), true).await.unwrap();
    assert_eq!(unknown_resource.action, ToggleAction::Error);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_lost_create_race_resolves_as_toggle_off() {
    let inner = MemoryVoteStore::new();
    inner.create(1, 1, true).await.unwrap();
    let store = Arc::new(RacingStore::new(inner.clone(), 1));
    let directory = Arc::new(Directory::populated());
    let engine = ToggleEngine::new(store, directory.clone(), directory);

    let outcome = engine.toggle(1, 1, Some(true), true).await.unwrap();
    assert_eq!(outcome.action, ToggleAction::Deleted);
    assert!(inner.is_empty().await);
}

#[tokio::test]
async fn test_lost_create_race_resolves_as_update() {
    let inner = MemoryVoteStore::new();
    inner.create(1, 1, false).await.unwrap();
    let store = Arc::new(RacingStore::new(inner.clone(), 1));
    let directory = Arc::new(Directory::populated());
    let engine = ToggleEngine::new(store, directory.clone(), directory);

    let outcome = engine.toggle(1, 1, Some(true), true).await.unwrap();
    assert_eq!(outcome.action, ToggleAction::Updated);
    assert_eq!(inner.len().await, 1);
    assert_eq!(inner.user_status(1, 1).await.unwrap(), Some(true));
}

#[tokio::test]
async fn test_lost_create_race_respects_lock() {
    let inner = MemoryVoteStore::new();
    inner.create(1, 1, false).await.unwrap();
    let store = Arc::new(RacingStore::new(inner.clone(), 1));
    let directory = Arc::new(Directory::populated());
    let engine = ToggleEngine::new(store, directory.clone(), directory);

    let outcome = engine.toggle(1, 1, Some(true), false).await.unwrap();
    assert_eq!(outcome.action, ToggleAction::Denied);
    assert_eq!(outcome.liked, Some(false));
}

#[tokio::test]
async fn test_unsettled_race_is_error_outcome() {
    let inner = MemoryVoteStore::new();
    inner.create(1, 1, true).await.unwrap();
    // Both the first lookup and the retry miss the stored vote.
    let store = Arc::new(RacingStore::new(inner.clone(), 2));
    let directory = Arc::new(Directory::populated());
    let engine = ToggleEngine::new(store, directory.clone(), directory);

    let outcome = engine.toggle(1, 1, Some(true), true).await.unwrap();
    assert_eq!(outcome.action, ToggleAction::Error);
    assert_eq!(inner.len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_votes_never_duplicate() {
    for resource_id in 1..=20 {
        let inner = MemoryVoteStore::new();
        // Both toggles read "no vote" before either creates one.
        let store = Arc::new(RacingStore::lockstep(inner.clone(), 2));
        let directory = Arc::new(Directory::populated());
        let engine = Arc::new(ToggleEngine::new(store, directory.clone(), directory));

        let a = tokio::spawn({
            let engine = engine.clone();
            async move { engine.toggle(resource_id, 1, Some(true), true).await }
        });
        let b = tokio::spawn({
            let engine = engine.clone();
            async move { engine.toggle(resource_id, 1, Some(true), true).await }
        });
        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());

        let mut actions = vec![a.action, b.action];
        actions.sort_by_key(|action| action.as_str());
        assert_eq!(actions, vec![ToggleAction::Created, ToggleAction::Deleted]);
        assert!(inner.is_empty().await);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_opposite_first_votes_settle_on_one_row() {
    let inner = MemoryVoteStore::new();
    let store = Arc::new(RacingStore::lockstep(inner.clone(), 2));
    let directory = Arc::new(Directory::populated());
    let engine = Arc::new(ToggleEngine::new(store, directory.clone(), directory));

    let like = tokio::spawn({
        let engine = engine.clone();
        async move { engine.toggle(1, 1, Some(true), true).await }
    });
    let dislike = tokio::spawn({
        let engine = engine.clone();
        async move { engine.toggle(1, 1, Some(false), true).await }
    });
    let (like, dislike) = (like.await.unwrap().unwrap(), dislike.await.unwrap().unwrap());

    let mut actions = vec![like.action, dislike.action];
    actions.sort_by_key(|action| action.as_str());
    assert_eq!(actions, vec![ToggleAction::Created, ToggleAction::Updated]);
    assert_eq!(inner.len().await, 1);
}
