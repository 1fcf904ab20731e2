use std::path::PathBuf;

use console_rules::config::Config;
use console_rules::models::{Backend, MemoryStorage};
use console_rules::{Session, StoreError};

fn config(data_dir: PathBuf) -> Config {
    Config {
        data_dir: Some(data_dir),
        language: "en".to_string(),
        ..Config::default()
    }
}

#[tokio::test]
async fn test_open_seeds_in_configured_language() {
    let dir = tempfile::tempdir().unwrap();

    let session = Session::open(config(dir.path().to_path_buf()), false)
        .await
        .unwrap();

    assert_eq!(session.store.len(), 1);
    assert_eq!(session.store.snippets()[0].name, "Example: Hello Console");
    assert!(dir.path().join("storage.json").exists());
}

#[tokio::test]
async fn test_ephemeral_session_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();

    let mut session = Session::open(config(dir.path().join("data")), true)
        .await
        .unwrap();
    session.store.create("Temp", "1;").await.unwrap();

    assert_eq!(session.store.len(), 2);
    assert!(!dir.path().join("data").join("storage.json").exists());
}

#[tokio::test]
async fn test_language_switch_relabels_new_snippets() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::with_storage(
        config(dir.path().to_path_buf()),
        dir.path().to_path_buf(),
        Backend::Memory(MemoryStorage::new()),
    )
    .await
    .unwrap();

    assert!(session.set_language("pt").await.unwrap());
    let blank = session.store.create_blank().await.unwrap();
    assert_eq!(blank.name, "Novo snippet");

    assert!(!session.set_language("xx").await.unwrap());
    assert_eq!(session.translator.t("save"), "Salvar");
}

#[tokio::test]
async fn test_export_file_round_trips_through_import() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::open(config(dir.path().to_path_buf()), false)
        .await
        .unwrap();
    session.store.create("Second", "2;").await.unwrap();

    let path = session.export_to(None).await.unwrap();
    let file_name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("console-rules-snippets-"));
    assert!(file_name.ends_with(".json"));
    assert!(!file_name.contains(':'));

    let result = session.import_from(&path).await;
    assert_eq!(session.import_status(&result), "Imported 2");
    assert_eq!(session.store.len(), 4);
}

#[tokio::test]
async fn test_import_statuses() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::open(config(dir.path().to_path_buf()), true)
        .await
        .unwrap();

    let empty = dir.path().join("empty.json");
    std::fs::write(&empty, "[{\"name\": \"no code\"}]").unwrap();
    let result = session.import_from(&empty).await;
    assert!(matches!(
        result.as_ref().unwrap_err().downcast_ref::<StoreError>(),
        Some(StoreError::Import(_))
    ));
    assert_eq!(session.import_status(&result), "Nothing to import");

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "not json").unwrap();
    let result = session.import_from(&broken).await;
    let status = session.import_status(&result);
    assert!(status.starts_with("Import failed: invalid JSON: "), "{status}");

    let shapeless = dir.path().join("shapeless.json");
    std::fs::write(&shapeless, "{\"foo\": 1}").unwrap();
    let result = session.import_from(&shapeless).await;
    assert_eq!(
        session.import_status(&result),
        "Import failed: invalid format: object has no `snippets` array"
    );

    let result = session.import_from(&dir.path().join("missing.json")).await;
    assert!(session.import_status(&result).starts_with("Import failed: "));
    assert_eq!(session.store.len(), 1);
}

#[tokio::test]
async fn test_export_to_explicit_path_creates_parents() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::open(config(dir.path().to_path_buf()), true)
        .await
        .unwrap();
    let target = dir.path().join("out").join("rules.json");

    let written = session.export_to(Some(&target)).await.unwrap();

    assert_eq!(written, target);
    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(document["type"], "console-rules-snippets");
    assert_eq!(document["count"], 1);
}
