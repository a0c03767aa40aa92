use std::sync::Arc;

use services::{
    OpenOutcome, ProgressStore, SnapshotService, SnapshotServiceError, TopicField, TopicList,
    TopicListItem,
};
use storage::{InMemoryRepository, SnapshotRepository, Storage};
use study_core::Course;
use study_core::model::{ConfidenceRating, SnapshotError};

const MODULE: &str = "Module 4: Context-Free Languages";

fn fresh_store() -> ProgressStore {
    ProgressStore::new(Course::Cst301.catalog().expect("catalog"))
}

fn first_topic(store: &ProgressStore) -> String {
    store.catalog().modules[MODULE]
        .keys()
        .next()
        .expect("topic")
        .clone()
}

#[tokio::test]
async fn rating_survives_export_clear_and_import() {
    let mut store = fresh_store();
    store.initialize();
    let topic = first_topic(&store);

    store
        .set_topic_field(MODULE, &topic, TopicField::Done(true))
        .expect("mark done");
    store
        .set_topic_field(
            MODULE,
            &topic,
            TopicField::Confidence(ConfidenceRating::High),
        )
        .expect("rate");

    let text = SnapshotService::export_text(&store).expect("export");
    store.clear();
    assert!(!store.is_initialized());

    SnapshotService::import_text(&mut store, &text).expect("import");
    let record = store.topic(MODULE, &topic).expect("topic");
    assert!(record.done);
    assert_eq!(record.confidence, ConfidenceRating::High);
}

#[tokio::test]
async fn rejected_import_keeps_existing_progress() {
    let mut store = fresh_store();
    store.initialize();
    let topic = first_topic(&store);
    store
        .set_topic_field(MODULE, &topic, TopicField::Notes("PDA = NFA + stack".into()))
        .expect("notes");
    let before = store.snapshot().cloned();

    let err = SnapshotService::import_text(&mut store, r#"{"foo": 1}"#).unwrap_err();
    assert!(matches!(
        err,
        SnapshotServiceError::Snapshot(SnapshotError::Schema(_))
    ));
    let err = SnapshotService::import_text(&mut store, "{oops").unwrap_err();
    assert!(matches!(
        err,
        SnapshotServiceError::Snapshot(SnapshotError::Parse(_))
    ));
    assert_eq!(store.snapshot().cloned(), before);
}

#[tokio::test]
async fn open_seeds_then_restores_saved_progress() {
    let storage = Storage::in_memory();
    let service = SnapshotService::new(Arc::clone(&storage.snapshots));

    let mut store = fresh_store();
    assert_eq!(service.open(&mut store).await.expect("open"), OpenOutcome::Seeded);
    let topic = first_topic(&store);
    store
        .append_to_topic_list(
            MODULE,
            &topic,
            TopicListItem::Link("https://example.com/cnf".into()),
        )
        .expect("link");
    service.save(&store).await.expect("save");

    let mut reopened = fresh_store();
    assert_eq!(
        service.open(&mut reopened).await.expect("reopen"),
        OpenOutcome::Restored
    );
    assert_eq!(reopened.snapshot(), store.snapshot());

    reopened
        .remove_from_topic_list_at(MODULE, &topic, TopicList::Links, 0)
        .expect("remove");
    assert!(reopened.topic(MODULE, &topic).expect("topic").links.is_empty());
}

#[tokio::test]
async fn open_with_corrupt_file_leaves_store_alone() {
    let repo = Arc::new(InMemoryRepository::new());
    repo.save_text("[]").await.expect("seed corrupt");
    let service = SnapshotService::new(repo);

    let mut store = fresh_store();
    assert!(service.open(&mut store).await.is_err());
    assert!(!store.is_initialized());
}

#[tokio::test]
async fn import_replaces_unreadable_saved_file() {
    let good = {
        let mut store = fresh_store();
        store.initialize();
        let topic = first_topic(&store);
        store
            .set_topic_field(MODULE, &topic, TopicField::Done(true))
            .expect("mark done");
        SnapshotService::export_text(&store).expect("export")
    };

    let repo = Arc::new(InMemoryRepository::new());
    repo.save_text("{oops").await.expect("seed corrupt");
    let service = SnapshotService::new(repo.clone());

    let mut store = fresh_store();
    assert_eq!(
        service.open_or_discard(&mut store).await.expect("open"),
        OpenOutcome::Discarded
    );
    assert!(!store.is_initialized());

    SnapshotService::import_text(&mut store, &good).expect("import");
    service.save(&store).await.expect("save");

    let saved = repo.load().await.expect("load").expect("present");
    assert_eq!(Some(&saved), store.snapshot());
    assert_eq!(store.completion().completed, 1);
}

#[tokio::test]
async fn open_or_discard_restores_valid_files() {
    let storage = Storage::in_memory();
    let service = SnapshotService::new(Arc::clone(&storage.snapshots));
    let mut store = fresh_store();
    assert_eq!(
        service.open_or_discard(&mut store).await.expect("open"),
        OpenOutcome::Seeded
    );
    service.save(&store).await.expect("save");

    let mut reopened = fresh_store();
    assert_eq!(
        service.open_or_discard(&mut reopened).await.expect("reopen"),
        OpenOutcome::Restored
    );
}

#[tokio::test]
async fn save_requires_initialized_store() {
    let service = SnapshotService::new(Arc::new(InMemoryRepository::new()));
    let store = fresh_store();
    assert!(matches!(
        service.save(&store).await,
        Err(SnapshotServiceError::NotInitialized)
    ));
}
