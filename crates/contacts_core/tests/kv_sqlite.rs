use contacts_core::db::migrations::latest_version;
use contacts_core::db::{open_db, open_db_in_memory, DbError};
use contacts_core::{
    ContactDraft, ContactStore, KeyValueStore, ManualClock, SampleSeed, SqliteKeyValueStore,
    StoreConfig,
};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_slots");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn slots_upsert_and_remove() {
    let mut store = SqliteKeyValueStore::new(open_db_in_memory().unwrap());

    assert_eq!(store.get("k").unwrap(), None);
    store.set("k", "one").unwrap();
    store.set("k", "two").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));

    let rows: i64 = store
        .connection()
        .query_row("SELECT COUNT(*) FROM kv_slots;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);

    store.remove("k").unwrap();
    store.remove("k").unwrap();
    assert_eq!(store.get("k").unwrap(), None);
}

#[test]
fn contact_store_state_survives_reopening_the_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.sqlite3");
    let clock = ManualClock::new(1_760_000_000_000);

    let created_id = {
        let backend = SqliteKeyValueStore::new(open_db(&path).unwrap());
        let mut store = ContactStore::open(
            backend,
            clock.clone(),
            StoreConfig::default(),
            &SampleSeed::instant(),
        );
        let created = store
            .create(ContactDraft::new("Persisted Person", "5550001111").with_role("Design"))
            .unwrap();
        store.soft_delete(store.active()[1].id).unwrap();
        created.id
    };

    let backend = SqliteKeyValueStore::new(open_db(&path).unwrap());
    let store = ContactStore::initialize(backend, clock, StoreConfig::default());

    assert!(!store.is_loading());
    assert_eq!(store.active()[0].id, created_id);
    assert_eq!(store.active().len(), 3);
    assert_eq!(store.trash_count(), 1);
    assert_eq!(store.trash()[0].contact.name, "Aisha Khan");
    assert_eq!(store.search("", "design").len(), 2);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
