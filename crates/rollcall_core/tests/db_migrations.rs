use rollcall_core::db::migrations::latest_version;
use rollcall_core::db::{
    open_database, open_database_in_memory, Database, DbError, Executor, PoolConfig,
    QueryContext,
};
use rusqlite::Connection;

#[test]
fn open_database_in_memory_applies_all_migrations() {
    let db = open_database_in_memory().unwrap();

    assert_eq!(schema_version(&db), latest_version());
    assert_table_exists(&db, "users");
    assert_table_exists(&db, "church_members");
    assert_index_exists(&db, "idx_church_members_joined_at");
    assert_index_exists(&db, "idx_church_members_email");
}

#[test]
fn in_memory_databases_are_independent() {
    let first = open_database_in_memory().unwrap();
    let second = open_database_in_memory().unwrap();
    let ctx = QueryContext::background();

    first
        .executor()
        .execute(
            &ctx,
            "INSERT INTO users (name, email, created_at) VALUES ('Ann', 'ann@x.com', 0);",
            [],
        )
        .unwrap();

    assert_eq!(user_count(&first), 1);
    assert_eq!(user_count(&second), 0);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rollcall.db");

    let first = open_database(&path, &PoolConfig::default()).unwrap();
    assert_eq!(schema_version(&first), latest_version());
    drop(first);

    let second = open_database(&path, &PoolConfig::default()).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    assert_table_exists(&second, "church_members");
}

#[test]
fn file_database_runs_in_wal_mode() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_database(dir.path().join("wal.db"), &PoolConfig::default()).unwrap();

    let mode: String = db
        .executor()
        .fetch_one(&QueryContext::background(), "PRAGMA journal_mode;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(mode.to_ascii_lowercase(), "wal");
}

#[test]
fn pool_respects_configured_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let config = PoolConfig {
        max_open: 3,
        min_idle: 2,
        ..PoolConfig::default()
    };
    let db = open_database(dir.path().join("pool.db"), &config).unwrap();

    assert_eq!(db.max_size(), 3);
    assert!(db.state().connections <= 3);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_database(&path, &PoolConfig::default()).unwrap_err();
    match err {
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

fn schema_version(db: &Database) -> u32 {
    db.executor()
        .fetch_one(&QueryContext::background(), "PRAGMA user_version;", [], |row| {
            row.get(0)
        })
        .unwrap()
}

fn user_count(db: &Database) -> i64 {
    db.executor()
        .fetch_one(&QueryContext::background(), "SELECT COUNT(*) FROM users;", [], |row| {
            row.get(0)
        })
        .unwrap()
}

fn assert_table_exists(db: &Database, table_name: &str) {
    assert_schema_object(db, "table", table_name);
}

fn assert_index_exists(db: &Database, index_name: &str) {
    assert_schema_object(db, "index", index_name);
}

fn assert_schema_object(db: &Database, kind: &str, name: &str) {
    let exists: i64 = db
        .executor()
        .fetch_one(
            &QueryContext::background(),
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} `{name}` should exist");
}
