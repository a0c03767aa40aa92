use storage::{FileSnapshotRepository, SnapshotRepository, StorageError};
use study_core::Course;
use study_core::model::{Attachment, ConfidenceRating, Snapshot, SnapshotError};

fn seeded() -> Snapshot {
    Snapshot::seed(&Course::Cst301.catalog().expect("catalog"))
}

#[tokio::test]
async fn missing_file_loads_as_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = FileSnapshotRepository::new(dir.path().join("cst301_progress.json"));
    assert!(repo.load().await.expect("load").is_none());
}

#[tokio::test]
async fn file_roundtrip_persists_progress_and_attachments() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("cst301_progress.json");
    let repo = FileSnapshotRepository::new(&path);

    let mut snapshot = seeded();
    let topic = snapshot
        .topic_mut(
            "Module 1: Regular Languages",
            "Deterministic Finite State Automata (DFA)",
        )
        .expect("topic");
    topic.done = true;
    topic.confidence = ConfidenceRating::High;
    topic
        .attachments
        .push(Attachment::from_upload("dfa.png", &[0x89, 0x50, 0x4e, 0x47]).expect("upload"));

    repo.save(&snapshot).await.expect("save");
    assert!(path.exists());
    assert!(!path.with_file_name("cst301_progress.json.tmp").exists());

    let reopened = FileSnapshotRepository::new(&path);
    let fetched = reopened.load().await.expect("load").expect("present");
    assert_eq!(fetched, snapshot);
}

#[tokio::test]
async fn save_overwrites_previous_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let repo = FileSnapshotRepository::new(dir.path().join("p.json"));

    let mut snapshot = seeded();
    repo.save(&snapshot).await.expect("first save");
    snapshot
        .question_mut("Module 5: Turing Machines", 0)
        .expect("question")
        .answer_text = "three-tape construction".into();
    repo.save(&snapshot).await.expect("second save");

    let fetched = repo.load().await.expect("load").expect("present");
    assert_eq!(
        fetched
            .question("Module 5: Turing Machines", 0)
            .expect("question")
            .answer_text,
        "three-tape construction"
    );
}

#[tokio::test]
async fn corrupt_file_is_reported_not_replaced() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("p.json");
    std::fs::write(&path, "{ definitely not json").expect("write");

    let repo = FileSnapshotRepository::new(&path);
    assert!(matches!(
        repo.load().await,
        Err(StorageError::Snapshot(SnapshotError::Parse(_)))
    ));
    assert_eq!(
        std::fs::read_to_string(&path).expect("read"),
        "{ definitely not json"
    );
}

#[tokio::test]
async fn failed_save_cleans_up_staging_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("p.json");
    // A non-empty directory at the target makes the final rename fail.
    std::fs::create_dir(&path).expect("mkdir");
    std::fs::write(path.join("keep"), "x").expect("write");

    let repo = FileSnapshotRepository::new(&path);
    assert!(matches!(
        repo.save(&seeded()).await,
        Err(StorageError::Io { .. })
    ));
    assert!(!dir.path().join("p.json.tmp").exists());
    assert!(path.join("keep").exists());
}
