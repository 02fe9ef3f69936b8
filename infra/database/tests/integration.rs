use kw_database::*;
use kw_domain::model::application::NamedPool;
use kw_storage::Storage;
use tempfile::TempDir;

async fn storage(dir: &TempDir) -> Storage {
    Storage::builder().root(dir.path()).connect().await.expect("storage root")
}

fn add_pool(db: &Database, id: &str) {
    db.write(|tables| {
        tables.config_pools.insert(
            id.to_owned(),
            NamedPool { id: id.to_owned(), name: format!("pool {id}"), description: String::new() },
        );
        Ok::<_, DatabaseError>(())
    })
    .expect("write");
}

#[tokio::test]
async fn flushed_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let db = Database::builder().storage(storage(&dir).await).open().await.unwrap();
    assert_eq!(db.revision(), 0);

    add_pool(&db, "p1");
    add_pool(&db, "p2");
    assert!(db.is_dirty());
    assert!(db.flush().await.unwrap());
    assert!(!db.is_dirty());
    assert!(!db.flush().await.unwrap(), "clean database must not rewrite the snapshot");

    let reopened = Database::builder().storage(storage(&dir).await).open().await.unwrap();
    assert_eq!(reopened.revision(), 2);
    assert_eq!(reopened.read(|t| t.config_pools.len()), 2);
}

#[tokio::test]
async fn corrupt_snapshot_falls_back_to_previous_generation() {
    let dir = TempDir::new().unwrap();
    let store = storage(&dir).await;
    let db = Database::builder().storage(store.clone()).snapshot("inv.bin").open().await.unwrap();

    add_pool(&db, "p1");
    db.flush().await.unwrap();
    add_pool(&db, "p2");
    db.flush().await.unwrap();
    assert!(store.exists("inv.bin.previous").unwrap());

    store.write("inv.bin", b"garbage").await.unwrap();

    let recovered = Database::builder().storage(store).snapshot("inv.bin").open().await.unwrap();
    assert_eq!(recovered.revision(), 1);
    assert_eq!(recovered.read(|t| t.config_pools.len()), 1);
}

#[tokio::test]
async fn unreadable_snapshot_without_backup_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = storage(&dir).await;
    store.write(DEFAULT_SNAPSHOT, b"garbage").await.unwrap();

    let err = Database::builder().storage(store).open().await.unwrap_err();
    assert!(matches!(err, DatabaseError::Format { .. } | DatabaseError::Codec { .. }));
}

#[tokio::test]
async fn empty_snapshot_name_fails_validation() {
    let dir = TempDir::new().unwrap();
    let err =
        Database::builder().storage(storage(&dir).await).snapshot(" ").open().await.unwrap_err();
    assert!(matches!(err, DatabaseError::Validation { .. }));
}

#[tokio::test]
async fn clones_share_the_same_tables() {
    let db = Database::builder().open().await.unwrap();
    let other = db.clone();
    add_pool(&db, "shared");
    assert_eq!(other.read(|t| t.config_pools.len()), 1);
    assert_eq!(other.revision(), 1);
}
