use std::fs;

use futures_util::future::join_all;
use tempfile::TempDir;
use threadfeed_engine::{IgnoreData, IgnoreRecord, IgnoreStore, StoreError};

fn data(url: &str, title: &str) -> IgnoreData {
    IgnoreData {
        url: url.to_string(),
        title: title.to_string(),
    }
}

#[tokio::test]
async fn insert_then_get_and_find_round_trip() {
    let temp = TempDir::new().unwrap();
    let store = IgnoreStore::new(temp.path().join("ignored.ron"));
    let entry = data("/cheap-widgets-2654321/", "Cheap widgets");

    store.insert("2654321", entry.clone()).await.unwrap();

    assert_eq!(store.get_by_key("2654321").await.unwrap(), Some(entry.clone()));
    assert_eq!(
        store.get_by_index("/cheap-widgets-2654321/").await.unwrap(),
        Some(entry)
    );
}

#[tokio::test]
async fn absent_keys_are_none_not_errors() {
    let temp = TempDir::new().unwrap();
    let store = IgnoreStore::new(temp.path().join("ignored.ron"));

    assert_eq!(store.get_by_key("missing").await.unwrap(), None);
    assert_eq!(store.get_by_index("/missing/").await.unwrap(), None);
}

#[tokio::test]
async fn schema_is_created_on_first_open() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("ignored.ron");
    let store = IgnoreStore::new(&path);
    assert!(!path.exists());

    store.get_by_key("anything").await.unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("ignoredTopics"));
    assert!(content.contains("version: 1"));
}

#[tokio::test]
async fn insert_is_an_upsert() {
    let temp = TempDir::new().unwrap();
    let store = IgnoreStore::new(temp.path().join("ignored.ron"));

    store.insert("1", data("/old-1/", "Old")).await.unwrap();
    store.insert("1", data("/new-1/", "New")).await.unwrap();

    assert_eq!(
        store.entries().await.unwrap(),
        vec![IgnoreRecord {
            id: "1".to_string(),
            data: data("/new-1/", "New"),
        }]
    );
    assert_eq!(store.get_by_index("/old-1/").await.unwrap(), None);
    assert_eq!(
        store.get_by_index("/new-1/").await.unwrap(),
        Some(data("/new-1/", "New"))
    );
}

#[tokio::test]
async fn url_index_is_not_unique() {
    let temp = TempDir::new().unwrap();
    let store = IgnoreStore::new(temp.path().join("ignored.ron"));

    store.insert("b", data("/shared/", "B")).await.unwrap();
    store.insert("a", data("/shared/", "A")).await.unwrap();

    assert_eq!(
        store.get_by_index("/shared/").await.unwrap(),
        Some(data("/shared/", "A"))
    );
    assert_eq!(store.entries().await.unwrap().len(), 2);
}

#[tokio::test]
async fn entries_survive_a_new_store_handle() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ignored.ron");

    IgnoreStore::new(&path)
        .insert("42", data("/thread-42/", "Forty two"))
        .await
        .unwrap();

    let reopened = IgnoreStore::new(&path);
    assert_eq!(
        reopened.get_by_key("42").await.unwrap(),
        Some(data("/thread-42/", "Forty two"))
    );
}

#[tokio::test]
async fn delete_removes_key_and_index_entry() {
    let temp = TempDir::new().unwrap();
    let store = IgnoreStore::new(temp.path().join("ignored.ron"));
    store.insert("7", data("/seven-7/", "Seven")).await.unwrap();

    assert!(store.delete("7").await.unwrap());
    assert!(!store.delete("7").await.unwrap());
    assert_eq!(store.get_by_key("7").await.unwrap(), None);
    assert_eq!(store.get_by_index("/seven-7/").await.unwrap(), None);
}

#[tokio::test]
async fn concurrent_inserts_all_land() {
    let temp = TempDir::new().unwrap();
    let store = IgnoreStore::new(temp.path().join("ignored.ron"));

    let inserts = (0..20).map(|n| {
        let store = store.clone();
        async move {
            store
                .insert(&n.to_string(), data(&format!("/t-{n}/"), "T"))
                .await
        }
    });
    for result in join_all(inserts).await {
        result.unwrap();
    }

    assert_eq!(store.entries().await.unwrap().len(), 20);
}

#[tokio::test]
async fn corrupt_file_fails_to_open() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ignored.ron");
    fs::write(&path, "this is not ron (").unwrap();
    let store = IgnoreStore::new(&path);

    let err = store.get_by_key("1").await.unwrap_err();
    assert!(matches!(err, StoreError::OpenFailed { .. }));
    let err = store.insert("1", data("/t-1/", "T")).await.unwrap_err();
    assert!(matches!(err, StoreError::OpenFailed { .. }));
    // The broken file is left for the user to inspect.
    assert_eq!(fs::read_to_string(&path).unwrap(), "this is not ron (");
}

#[tokio::test]
async fn newer_schema_version_fails_to_open() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ignored.ron");
    fs::write(
        &path,
        r#"(version: 2, collection: "ignoredTopics", records: [])"#,
    )
    .unwrap();

    let err = IgnoreStore::new(&path).get_by_key("1").await.unwrap_err();
    match err {
        StoreError::OpenFailed { reason, .. } => assert!(reason.contains("version 2")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn unwritable_location_fails_to_open() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, "x").unwrap();

    let store = IgnoreStore::new(blocker.join("ignored.ron"));
    let err = store.get_by_key("1").await.unwrap_err();
    assert!(matches!(err, StoreError::OpenFailed { .. }));
}
