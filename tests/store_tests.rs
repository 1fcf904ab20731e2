use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use console_rules::models::storage::SNIPPETS_KEY;
use console_rules::models::{ExportData, StoreLabels};
use console_rules::{
    FileStorage, ImportError, KeyValueStore, MemoryStorage, Snippet, SnippetStore, StorageError,
    StoreError,
};
use serde_json::{Value, json};

/// Memory backend whose writes can be switched off, counting every write attempt.
#[derive(Debug, Default)]
struct FlakyStorage {
    inner: MemoryStorage,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyStorage {
    fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for FlakyStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("disk full".to_string()));
        }
        self.inner.set(key, value).await
    }
}

fn labels() -> StoreLabels {
    StoreLabels {
        seed_name: "Example".to_string(),
        seed_code: "console.log('hi');".to_string(),
        new_name: "New snippet".to_string(),
        untitled: "Untitled".to_string(),
        copy_suffix: " (copy)".to_string(),
    }
}

fn record(id: &str, name: &str, code: &str) -> Value {
    json!({ "id": id, "name": name, "code": code, "updatedAt": 1_700_000_000_000_i64 })
}

async fn store_with(records: Vec<Value>) -> SnippetStore<MemoryStorage> {
    let storage = MemoryStorage::new().with_value(SNIPPETS_KEY, Value::Array(records));
    SnippetStore::open(storage, labels()).await.unwrap()
}

fn names(store: &SnippetStore<impl KeyValueStore>) -> Vec<&str> {
    store.snippets().iter().map(|s| s.name.as_str()).collect()
}

#[tokio::test]
async fn test_empty_storage_is_seeded_once() {
    let store = SnippetStore::open(MemoryStorage::new(), labels()).await.unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.snippets()[0].name, "Example");
    assert_eq!(store.snippets()[0].code, "console.log('hi');");

    let stored = store.storage().peek(SNIPPETS_KEY).unwrap();
    let reopened = SnippetStore::open(MemoryStorage::new().with_value(SNIPPETS_KEY, stored), labels())
        .await
        .unwrap();
    assert_eq!(reopened.snippets(), store.snippets());
}

#[tokio::test]
async fn test_create_prepends_with_distinct_ids() {
    let mut store = store_with(vec![record("s1", "S", "1;")]).await;

    for i in 0..50 {
        store.create(format!("n{i}"), "x").await.unwrap();
    }

    let ids: HashSet<&str> = store.snippets().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids.len(), 51);
    assert_eq!(store.snippets()[0].name, "n49");
    assert_eq!(store.snippets()[50].id, "s1");
}

#[tokio::test]
async fn test_create_blank_and_untitled_names() {
    let mut store = store_with(vec![record("s1", "S", "1;")]).await;

    let blank = store.create_blank().await.unwrap();
    assert_eq!(blank.name, "New snippet");
    assert_eq!(blank.code, "");

    let untitled = store.create("   ", "2;").await.unwrap();
    assert_eq!(untitled.name, "Untitled");
}

#[tokio::test]
async fn test_update_keeps_identity_and_position() {
    let mut store = store_with(vec![
        record("a", "A", "1;"),
        record("b", "B", "2;"),
        record("c", "C", "3;"),
    ])
    .await;

    let updated = store.update("b", "  Renamed  ", "22;").await.unwrap();

    assert_eq!(updated.id, "b");
    assert_eq!(updated.name, "Renamed");
    assert!(updated.updated_at > 1_700_000_000_000);
    assert_eq!(names(&store), vec!["A", "Renamed", "C"]);
    assert_eq!(store.get("b").unwrap().code, "22;");

    let err = store.update("zzz", "x", "y").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_duplicate_copies_to_front() {
    let mut store = store_with(vec![record("a", "A", "1;"), record("b", "B", "2;")]).await;

    let copy = store.duplicate("b").await.unwrap();

    assert_ne!(copy.id, "b");
    assert_eq!(copy.name, "B (copy)");
    assert_eq!(copy.code, "2;");
    assert_eq!(names(&store), vec!["B (copy)", "A", "B"]);
    assert_eq!(store.get("b").unwrap().name, "B");
    assert!(store.duplicate("missing").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_remove_present_and_absent() {
    let storage = Arc::new(FlakyStorage::default());
    storage
        .inner
        .set(SNIPPETS_KEY, json!([record("a", "A", "1;"), record("b", "B", "2;")]))
        .await
        .unwrap();
    let mut store = SnippetStore::open(Arc::clone(&storage), labels()).await.unwrap();

    let removed = store.remove("a").await.unwrap();
    assert_eq!(removed.map(|s| s.id), Some("a".to_string()));
    assert_eq!(names(&store), vec!["B"]);

    let writes = storage.writes();
    assert_eq!(store.remove("a").await.unwrap(), None);
    assert_eq!(storage.writes(), writes);
}

#[tokio::test]
async fn test_removing_last_snippet_leaves_empty_store() {
    let mut store = store_with(vec![record("a", "A", "1;")]).await;

    store.remove("a").await.unwrap();

    assert!(store.is_empty());
    assert!(store.fallback_active(Some("a")).is_none());
}

#[tokio::test]
async fn test_fallback_active() {
    let store = store_with(vec![record("a", "A", "1;"), record("b", "B", "2;")]).await;

    assert_eq!(store.fallback_active(Some("b")).unwrap().id, "b");
    assert_eq!(store.fallback_active(Some("gone")).unwrap().id, "a");
    assert_eq!(store.fallback_active(None).unwrap().id, "a");
}

#[tokio::test]
async fn test_reorder_moves_within_full_collection() {
    let mut store = store_with(vec![
        record("a", "A", ""),
        record("b", "B", ""),
        record("c", "C", ""),
    ])
    .await;

    store.reorder("c", 0).await.unwrap();
    assert_eq!(names(&store), vec!["C", "A", "B"]);

    // Target equal to the remaining length places it last.
    store.reorder("c", 2).await.unwrap();
    assert_eq!(names(&store), vec!["A", "B", "C"]);

    store.reorder("a", 0).await.unwrap();
    assert_eq!(names(&store), vec!["A", "B", "C"]);

    let err = store.reorder("a", 3).await.unwrap_err();
    assert!(matches!(err, StoreError::IndexOutOfBounds { index: 3, len: 2 }));
    assert!(store.reorder("zzz", 0).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_reorder_persists_order() {
    let mut store = store_with(vec![record("a", "A", ""), record("b", "B", "")]).await;

    store.reorder("a", 1).await.unwrap();

    let stored: Vec<Snippet> =
        serde_json::from_value(store.storage().peek(SNIPPETS_KEY).unwrap()).unwrap();
    let ids: Vec<&str> = stored.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[tokio::test]
async fn test_export_then_import_round_trip() {
    let source = store_with(vec![record("a", "A", "1;"), record("b", "B", "2;")]).await;
    let document = source.export_json().unwrap();

    let parsed: ExportData = serde_json::from_str(&document).unwrap();
    assert_eq!(parsed.kind, "console-rules-snippets");
    assert_eq!(parsed.count, 2);

    let mut target = store_with(vec![record("x", "X", "0;")]).await;
    let imported = target.import_json(&document).await.unwrap();

    assert_eq!(imported.len(), 2);
    assert_eq!(names(&target), vec!["A", "B", "X"]);
    assert_eq!(target.snippets()[0].code, "1;");
    assert_eq!(target.snippets()[0].updated_at, 1_700_000_000_000);
    assert_ne!(target.snippets()[0].id, "a");
}

#[tokio::test]
async fn test_import_bare_array_prepends_in_input_order() {
    let mut store = store_with(vec![record("s", "S", "")]).await;

    let imported = store
        .import_many(json!([
            { "name": "I0", "code": "0;" },
            { "name": "I1", "code": "1;" },
        ]))
        .await
        .unwrap();

    assert_eq!(imported.len(), 2);
    assert_eq!(names(&store), vec!["I0", "I1", "S"]);
}

#[tokio::test]
async fn test_import_skips_records_without_code() {
    let mut store = store_with(vec![record("s", "S", "")]).await;

    let imported = store
        .import_many(json!([
            { "name": "no code" },
            { "name": "numeric code", "code": 5 },
            { "code": "kept;", "updatedAt": -3 },
            "not an object",
        ]))
        .await
        .unwrap();

    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].name, "Untitled");
    assert!(imported[0].updated_at > 0);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_import_with_nothing_usable_leaves_collection_unchanged() {
    let mut store = store_with(vec![record("s", "S", "")]).await;

    let err = store
        .import_many(json!({ "snippets": [{ "name": "x" }] }))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Import(ImportError::NothingToImport)));
    assert_eq!(names(&store), vec!["S"]);
}

#[tokio::test]
async fn test_import_rejects_malformed_payloads() {
    let mut store = store_with(vec![record("s", "S", "")]).await;

    let err = store.import_json("{ not json").await.unwrap_err();
    assert!(matches!(err, StoreError::Import(ImportError::Parse(_))));

    let err = store.import_json("\"text\"").await.unwrap_err();
    assert!(matches!(err, StoreError::Import(ImportError::InvalidFormat(_))));

    let err = store.import_json("{\"items\": []}").await.unwrap_err();
    assert!(matches!(err, StoreError::Import(ImportError::InvalidFormat(_))));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_failed_write_keeps_change_in_memory_until_flush() {
    let storage = Arc::new(FlakyStorage::default());
    let mut store = SnippetStore::open(Arc::clone(&storage), labels()).await.unwrap();
    storage.set_failing(true);

    let err = store.create("Offline", "1;").await.unwrap_err();

    assert!(matches!(err, StoreError::Unpersisted(_)));
    assert!(store.is_dirty());
    assert_eq!(store.snippets()[0].name, "Offline");
    let persisted: Vec<Snippet> =
        serde_json::from_value(storage.inner.peek(SNIPPETS_KEY).unwrap()).unwrap();
    assert_eq!(persisted.len(), 1);

    storage.set_failing(false);
    store.flush().await.unwrap();

    assert!(!store.is_dirty());
    let persisted: Vec<Snippet> =
        serde_json::from_value(storage.inner.peek(SNIPPETS_KEY).unwrap()).unwrap();
    assert_eq!(persisted.len(), 2);
    assert_eq!(persisted[0].name, "Offline");
}

#[tokio::test]
async fn test_duplicate_stored_ids_are_reissued_on_load() {
    let store = store_with(vec![record("a", "First", ""), record("a", "Second", "")]).await;

    assert_eq!(store.snippets()[0].id, "a");
    assert_ne!(store.snippets()[1].id, "a");
    assert_eq!(store.snippets()[1].name, "Second");
}

#[tokio::test]
async fn test_file_storage_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let created = {
        let storage = FileStorage::new(dir.path()).unwrap();
        let mut store = SnippetStore::open(storage, labels()).await.unwrap();
        store.create("Kept", "keep();").await.unwrap()
    };

    let storage = FileStorage::new(dir.path()).unwrap();
    let store = SnippetStore::open(storage, labels()).await.unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(store.snippets()[0], created);
    assert_eq!(store.snippets()[1].name, "Example");
}

#[tokio::test]
async fn test_unreadable_storage_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path()).unwrap();
    std::fs::write(storage.path(), "{ broken").unwrap();

    let err = SnippetStore::open(storage, labels()).await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
}

#[tokio::test]
async fn test_hand_edited_records_are_recovered_on_load() {
    let store = store_with(vec![
        json!({ "id": "a", "name": "A", "code": "1;" }),
        json!({ "id": "b", "name": "B", "code": "2;", "updatedAt": 1_700_000_000_000.5 }),
        json!({ "name": "No id", "code": "3;" }),
        json!({ "id": "d", "name": "No code" }),
    ])
    .await;

    assert_eq!(names(&store), vec!["A", "B", "No id"]);
    assert_eq!(store.snippets()[0].id, "a");
    assert!(store.snippets()[0].updated_at > 0);
    assert_eq!(store.snippets()[1].updated_at, 1_700_000_000_000);
    assert!(!store.snippets()[2].id.is_empty());
    assert!(store.get("d").is_none());
}

#[tokio::test]
async fn test_non_array_storage_fails_to_open() {
    let storage = MemoryStorage::new().with_value(SNIPPETS_KEY, json!({ "a": 1 }));

    let err = SnippetStore::open(storage, labels()).await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
}
