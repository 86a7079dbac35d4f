use std::sync::Arc;

use serde_json::{Value, json};
use strawchemy_core::{FieldType, ModelRegistry, ModelType, synthesize};
use strawchemy_db_memory::{Database, MemoryDatabase, Row, Session, StorageError};

fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

fn database() -> MemoryDatabase {
    let registry = ModelRegistry::from_models([
        ModelType::new("Dataset")
            .field("id", FieldType::int())
            .field("name", FieldType::string())
            .field("datafiles", FieldType::list(FieldType::model("Datafile")))
            .field("crs", FieldType::model("Crs")),
        ModelType::new("Datafile")
            .field("id", FieldType::int())
            .field("name", FieldType::string()),
        ModelType::new("Crs")
            .lookup()
            .field("id", FieldType::int())
            .field("name", FieldType::string()),
    ])
    .unwrap();
    MemoryDatabase::new(Arc::new(synthesize(&registry).unwrap()))
}

async fn seed(session: &mut Box<dyn Session>) -> (i64, i64) {
    let crs = session.insert("crs", row(json!({"name": "WGS84"}))).await.unwrap();
    let crs_id = crs["id"].as_i64().unwrap();
    let dataset = session
        .insert("dataset", row(json!({"name": "rivers", "crs_id": crs_id})))
        .await
        .unwrap();
    let dataset_id = dataset["id"].as_i64().unwrap();
    for name in ["a.csv", "b.csv"] {
        session
            .insert("datafile", row(json!({"name": name, "dataset_id": dataset_id})))
            .await
            .unwrap();
    }
    (crs_id, dataset_id)
}

#[tokio::test]
async fn test_insert_assigns_ids_and_fills_columns() {
    let db = database();
    let mut session = db.open().await.unwrap();

    let first = session.insert("crs", row(json!({"name": "WGS84"}))).await.unwrap();
    let second = session.insert("crs", row(json!({"name": "ETRS89"}))).await.unwrap();
    assert_eq!(first["id"], json!(1));
    assert_eq!(second["id"], json!(2));

    let datafile = session.insert("datafile", row(json!({"name": "x"}))).await.unwrap();
    assert_eq!(datafile["dataset_id"], Value::Null);
}

#[tokio::test]
async fn test_explicit_id_is_kept_and_advances_sequence() {
    let db = database();
    let mut session = db.open().await.unwrap();

    session.insert("crs", row(json!({"id": 10, "name": "a"}))).await.unwrap();
    let next = session.insert("crs", row(json!({"name": "b"}))).await.unwrap();
    assert_eq!(next["id"], json!(11));

    let err = session
        .insert("crs", row(json!({"id": 10, "name": "c"})))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Integrity { .. }));
}

#[tokio::test]
async fn test_writes_are_checked_against_schema() {
    let db = database();
    let mut session = db.open().await.unwrap();

    let missing_name = session.insert("crs", Row::new()).await.unwrap_err();
    assert!(matches!(missing_name, StorageError::InvalidValue { .. }));

    let wrong_type = session.insert("crs", row(json!({"name": 5}))).await.unwrap_err();
    assert!(matches!(wrong_type, StorageError::InvalidValue { .. }));

    let dangling = session
        .insert("dataset", row(json!({"name": "x", "crs_id": 42})))
        .await
        .unwrap_err();
    assert!(matches!(dangling, StorageError::Integrity { .. }));

    let unknown = session
        .insert("crs", row(json!({"name": "x", "colour": "red"})))
        .await
        .unwrap_err();
    assert!(matches!(unknown, StorageError::UnknownColumn { .. }));
}

#[tokio::test]
async fn test_delete_cascades_to_children() {
    let db = database();
    let mut session = db.open().await.unwrap();
    let (crs_id, dataset_id) = seed(&mut session).await;

    let deleted = session.delete("dataset", dataset_id).await.unwrap();
    assert_eq!(deleted["name"], json!("rivers"));

    assert!(session.scan("datafile").await.unwrap().is_empty());
    assert!(session.get("crs", crs_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_referenced_lookup_row_cannot_be_deleted() {
    let db = database();
    let mut session = db.open().await.unwrap();
    let (crs_id, _) = seed(&mut session).await;

    let err = session.delete("crs", crs_id).await.unwrap_err();
    assert!(matches!(err, StorageError::Integrity { .. }));
    assert!(session.get("crs", crs_id).await.unwrap().is_some());
    assert_eq!(session.scan("datafile").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_commit_publishes_and_close_discards() {
    let db = database();

    let mut writer = db.open().await.unwrap();
    seed(&mut writer).await;
    assert_eq!(db.row_count("datafile").await, 0);
    writer.commit().await.unwrap();
    assert_eq!(db.row_count("datafile").await, 2);

    writer
        .insert("crs", row(json!({"name": "uncommitted"})))
        .await
        .unwrap();
    writer.close();
    assert!(!writer.is_open());
    assert_eq!(db.row_count("crs").await, 1);
    assert!(matches!(writer.scan("crs").await, Err(StorageError::Closed)));
}

#[tokio::test]
async fn test_rollback_restores_committed_state() {
    let db = database();
    let mut session = db.open().await.unwrap();
    let (_, dataset_id) = seed(&mut session).await;
    session.commit().await.unwrap();

    session
        .update("dataset", dataset_id, row(json!({"name": "lakes"})))
        .await
        .unwrap();
    session.rollback().await.unwrap();

    let dataset = session.get("dataset", dataset_id).await.unwrap().unwrap();
    assert_eq!(dataset["name"], json!("rivers"));
}

#[tokio::test]
async fn test_find_by_and_update() {
    let db = database();
    let mut session = db.open().await.unwrap();
    let (_, dataset_id) = seed(&mut session).await;

    let children = session.find_by("datafile", "dataset_id", dataset_id).await.unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0]["name"], json!("a.csv"));

    let err = session
        .update("datafile", 99, row(json!({"name": "z"})))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = session
        .update("datafile", 1, row(json!({"id": 2})))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidValue { .. }));
}

#[tokio::test]
async fn test_second_writer_waits_for_first_commit() {
    let db = database();
    let mut first = db.open().await.unwrap();
    first.insert("crs", row(json!({"name": "a"}))).await.unwrap();

    let other = db.clone();
    let second = tokio::spawn(async move {
        let mut session = other.open().await.unwrap();
        let stored = session.insert("crs", row(json!({"name": "b"}))).await.unwrap();
        session.commit().await.unwrap();
        stored
    });
    tokio::task::yield_now().await;
    assert!(!second.is_finished());

    first.commit().await.unwrap();
    let stored = second.await.unwrap();
    assert_eq!(stored["id"], json!(2));
    assert_eq!(db.row_count("crs").await, 2);
}

#[tokio::test]
async fn test_rollback_and_close_release_the_writer() {
    let db = database();

    let mut rolled_back = db.open().await.unwrap();
    rolled_back.insert("crs", row(json!({"name": "a"}))).await.unwrap();
    rolled_back.rollback().await.unwrap();

    let mut closed = db.open().await.unwrap();
    closed.insert("crs", row(json!({"name": "b"}))).await.unwrap();
    closed.close();

    let mut last = db.open().await.unwrap();
    let stored = last.insert("crs", row(json!({"name": "c"}))).await.unwrap();
    last.commit().await.unwrap();
    assert_eq!(stored["id"], json!(1));
    assert_eq!(db.row_count("crs").await, 1);
}
