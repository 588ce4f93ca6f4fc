//! End-to-end tests for note-history.
//!
//! Drives the public API the way an editor would: saves, history listings,
//! reconstruction of old revisions, comparison and merging.

use std::sync::Arc;

use note_history::diff::diff;
use note_history::patch::apply;
use note_history::{
    reconcile, EditKind, HistoryConfig, HistoryError, MemoryStore, Revision, RevisionKind,
    SaveOutcome, VersionEngine, VersionStore,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn new_engine() -> (Arc<MemoryStore>, VersionEngine<Arc<MemoryStore>>) {
    let store = Arc::new(MemoryStore::new());
    let engine = VersionEngine::new(Arc::clone(&store));
    (store, engine)
}

/// Produce a random edit of `text`: insert, delete or replace a span.
fn mutate(rng: &mut StdRng, text: &str) -> String {
    const WORDS: &[&str] = &["note", "täglich", "🦀", "todo", "\n", "- item", "## H"];
    let chars: Vec<char> = text.chars().collect();
    let at = rng.random_range(0..=chars.len());
    let word = WORDS[rng.random_range(0..WORDS.len())];
    let mut out: Vec<char> = chars[..at].to_vec();
    match rng.random_range(0..3) {
        0 => {
            out.extend(word.chars());
            out.extend(&chars[at..]);
        }
        1 => {
            let end = (at + rng.random_range(1..5)).min(chars.len());
            out.extend(&chars[end..]);
        }
        _ => {
            let end = (at + rng.random_range(1..5)).min(chars.len());
            out.extend(word.chars());
            out.extend(&chars[end..]);
        }
    }
    out.into_iter().collect()
}

#[tokio::test]
async fn scenario_root_snapshot_then_diff() {
    let (_store, mut engine) = new_engine();
    engine.save_version("note", "hello", None).await.unwrap();
    engine.save_version("note", "hello world", None).await.unwrap();

    let versions = engine.get_versions("note").await.unwrap();
    assert_eq!(versions.len(), 2);
    let first = engine.get_version_content("note", versions[0].id.as_str()).await.unwrap();
    let second = engine.get_version_content("note", versions[1].id.as_str()).await.unwrap();
    assert_eq!(first.as_deref(), Some("hello"));
    assert_eq!(second.as_deref(), Some("hello world"));
}

#[tokio::test]
async fn scenario_identical_and_whitespace_saves_are_skipped() {
    let (_store, mut engine) = new_engine();
    engine.save_version("b", "A", None).await.unwrap();
    assert_eq!(engine.save_version("b", "A", None).await.unwrap(), SaveOutcome::Skipped);
    assert_eq!(engine.get_versions("b").await.unwrap().len(), 1);

    engine.save_version("c", "line1", None).await.unwrap();
    assert_eq!(engine.save_version("c", "line1 ", None).await.unwrap(), SaveOutcome::Skipped);
    assert_eq!(engine.get_versions("c").await.unwrap().len(), 1);
}

#[tokio::test]
async fn scenario_compare_pure_append() {
    let (_store, mut engine) = new_engine();
    for content in ["a", "ab", "abc"] {
        engine.save_version("d", content, None).await.unwrap();
    }
    let versions = engine.get_versions("d").await.unwrap();
    let script = engine
        .compare_versions("d", versions[0].id.as_str(), versions[2].id.as_str())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(apply(&script), "abc");
    assert!(!script.iter().any(|op| op.kind == EditKind::Delete));
}

#[test]
fn scenario_remote_delete_is_rejected() {
    assert_eq!(reconcile("keep me", ""), "keep me");
}

#[test]
fn round_trip_on_generated_edits() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut text = String::from("# Title\n\nSome body text.");
    for _ in 0..200 {
        let next = mutate(&mut rng, &text);
        assert_eq!(apply(&diff(&text, &next)), next);
        text = next;
    }
}

#[tokio::test]
async fn long_edit_session_replays_every_revision() {
    let (store, mut engine) = new_engine();
    let mut rng = StdRng::seed_from_u64(42);
    let mut text = String::from("start");
    let mut saved: Vec<(String, String)> = Vec::new();

    for _ in 0..60 {
        text = mutate(&mut rng, &text);
        let before = engine.get_versions("s").await.unwrap().len();
        match engine.save_version("s", &text, Some("tester")).await.unwrap() {
            SaveOutcome::Saved(meta) => {
                assert_eq!(engine.get_versions("s").await.unwrap().len(), before + 1);
                saved.push((meta.id.to_string(), text.clone()));
            }
            SaveOutcome::Skipped => {
                assert_eq!(engine.get_versions("s").await.unwrap().len(), before);
            }
        }
    }

    // Every revision after the root is a delta based on its predecessor
    let versions = engine.get_versions("s").await.unwrap();
    assert_eq!(versions[0].kind, RevisionKind::Snapshot);
    for pair in versions.windows(2) {
        assert_eq!(pair[1].kind, RevisionKind::Delta);
        assert_eq!(pair[1].base_version_id.as_ref(), Some(&pair[0].id));
    }

    // Warm reads and cold replays agree
    for (id, expected) in &saved {
        let warm = engine.get_version_content("s", id).await.unwrap();
        assert_eq!(warm.as_deref(), Some(expected.as_str()));
    }
    let mut cold = VersionEngine::new(store);
    for (id, expected) in saved.iter().rev() {
        let replayed = cold.get_version_content("s", id).await.unwrap();
        assert_eq!(replayed.as_deref(), Some(expected.as_str()));
    }
}

#[tokio::test]
async fn tiny_cache_still_reconstructs_correctly() {
    let config = HistoryConfig {
        cache_capacity: 2,
        ..HistoryConfig::default()
    };
    let mut engine = VersionEngine::with_config(Arc::new(MemoryStore::new()), config);
    let contents = ["one", "one two", "one two three", "two three", "three"];
    for content in contents {
        engine.save_version("n", content, None).await.unwrap();
    }

    let versions = engine.get_versions("n").await.unwrap();
    for _ in 0..2 {
        for (meta, expected) in versions.iter().zip(contents) {
            let content = engine.get_version_content("n", meta.id.as_str()).await.unwrap();
            assert_eq!(content.as_deref(), Some(expected));
        }
    }
}

#[tokio::test]
async fn deletion_forgets_history() {
    let (store, mut engine) = new_engine();
    engine.save_version("gone", "v1", None).await.unwrap();
    engine.save_version("gone", "v2", None).await.unwrap();
    let versions = engine.get_versions("gone").await.unwrap();

    engine.delete_note_versions("gone").await.unwrap();

    assert!(engine.get_versions("gone").await.unwrap().is_empty());
    for meta in &versions {
        let content = engine.get_version_content("gone", meta.id.as_str()).await.unwrap();
        assert!(content.is_none());
    }
    assert!(store.get_chain("gone").await.unwrap().is_empty());
}

#[tokio::test]
async fn corrupted_chain_is_distinct_from_not_found() {
    let store = Arc::new(MemoryStore::new());
    let root = Revision::snapshot(1, "root".into(), None);
    let orphan = Revision::delta(2, diff("other", "other!"), root.id.clone(), None);
    let orphan_id = orphan.id.to_string();
    store.put_chain("n", &[root, orphan]).await.unwrap();

    let mut engine = VersionEngine::new(store);
    assert!(engine.get_version_content("n", "v_0_absent").await.unwrap().is_none());

    let err = engine.get_version_content("n", &orphan_id).await.unwrap_err();
    match err {
        HistoryError::ChainCorrupted { note_id, .. } => assert_eq!(note_id, "n"),
        other => panic!("expected ChainCorrupted, got {other:?}"),
    }
}
