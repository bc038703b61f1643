//! Memory, task and file persistence across restarts

use ziggy::capabilities::{FileStore, TaskStore};
use ziggy::files::LocalFileStore;
use ziggy::memory::JsonFilePersistence;
use ziggy::tasks::JsonTaskStore;
use ziggy::{Error, MemoryStore};

#[test]
fn test_memory_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.json");

    let store = MemoryStore::open(Box::new(JsonFilePersistence::new(&path)));
    for i in 0..5 {
        store.save(&format!("Topic {i}"), &format!("content {i}"));
    }
    store.save("topic 2", "replaced");
    store.save("קוד דלת", "say \"hi\"\nthen 4321");

    let reopened = MemoryStore::open(Box::new(JsonFilePersistence::new(&path)));
    assert_eq!(reopened.len(), 6);
    assert_eq!(reopened.snapshot(), store.snapshot());
    assert_eq!(reopened.retrieve("TOPIC 0").as_deref(), Some("content 0"));
    assert_eq!(reopened.retrieve("topic 2").as_deref(), Some("replaced"));
    assert_eq!(
        reopened.retrieve("קוד דלת").as_deref(),
        Some("say \"hi\"\nthen 4321")
    );
}

#[test]
fn test_corrupt_memory_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.json");
    std::fs::write(&path, "{not json").unwrap();

    let store = MemoryStore::open(Box::new(JsonFilePersistence::new(&path)));
    assert!(store.is_empty());

    store.save("door code", "4321");
    let reopened = MemoryStore::open(Box::new(JsonFilePersistence::new(&path)));
    assert_eq!(reopened.retrieve("door code").as_deref(), Some("4321"));
}

#[tokio::test]
async fn test_tasks_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");

    let store = JsonTaskStore::open(&path);
    store.create_task("call the plumber", "tomorrow 9am").await.unwrap();
    store.create_task("water plants", "tonight").await.unwrap();
    store.cancel_task("water plants").await.unwrap();

    let reopened = JsonTaskStore::open(&path);
    let tasks = reopened.tasks().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].description, "call the plumber");

    let err = reopened.cancel_task("water plants").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_shopping_list_and_notes() {
    let dir = tempfile::tempdir().unwrap();
    let files = LocalFileStore::new(dir.path());

    files.add_to_list("milk").await.unwrap();
    files.add_to_list("חלב").await.unwrap();
    files.remove_from_list("milk").await.unwrap();
    assert_eq!(files.list_items().await.unwrap(), vec!["חלב".to_string()]);

    files.write("notes", "first").await.unwrap();
    files.write("notes", "second").await.unwrap();
    assert_eq!(files.read("notes").await.unwrap(), "second");

    assert!(matches!(
        files.read("../outside").await.unwrap_err(),
        Error::InvalidInput(_)
    ));
    assert!(matches!(
        files.read("missing").await.unwrap_err(),
        Error::NotFound(_)
    ));
}
