use rollcall_core::db::{
    open_database, open_database_in_memory, DbError, Executor, OptionalRow, PoolConfig,
    QueryContext,
};
use std::time::{Duration, Instant};

const SEED_USERS_SQL: &str = "INSERT INTO users (name, email, created_at) VALUES
    ('Ann', 'ann@x.com', 1000),
    ('Ben', 'ben@x.com', 2000),
    ('Cid', 'cid@x.com', 3000);";

const ENDLESS_QUERY_SQL: &str = "WITH RECURSIVE counter(n) AS (
    SELECT 1
    UNION ALL
    SELECT n + 1 FROM counter
)
SELECT COUNT(*) FROM counter;";

#[test]
fn fetch_one_without_match_reports_no_rows() {
    let db = open_database_in_memory().unwrap();
    let exec = db.executor();
    let ctx = QueryContext::background();

    let err = exec
        .fetch_one(&ctx, "SELECT id FROM users WHERE id = ?1;", [1_i64], |row| {
            row.get::<_, i64>(0)
        })
        .unwrap_err();
    assert!(matches!(err, DbError::NoRows));

    let missing = exec
        .fetch_one(&ctx, "SELECT id FROM users WHERE id = ?1;", [1_i64], |row| {
            row.get::<_, i64>(0)
        })
        .optional()
        .unwrap();
    assert_eq!(missing, None);
}

#[test]
fn fetch_many_streams_rows_in_query_order() {
    let db = open_database_in_memory().unwrap();
    let exec = db.executor();
    let ctx = QueryContext::background();
    exec.execute(&ctx, SEED_USERS_SQL, []).unwrap();

    let names = exec
        .fetch_many(&ctx, "SELECT name FROM users ORDER BY id DESC;", [], |rows| {
            let mut names = Vec::new();
            while let Some(row) = rows.next()? {
                names.push(row.get::<_, String>(0)?);
            }
            Ok(names)
        })
        .unwrap();
    assert_eq!(names, vec!["Cid", "Ben", "Ann"]);
}

#[test]
fn fetch_many_releases_cursor_when_consumer_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = PoolConfig {
        max_open: 1,
        min_idle: 1,
        ..PoolConfig::default()
    };
    let db = open_database(dir.path().join("cursor.db"), &config).unwrap();
    let exec = db.executor();
    let ctx = QueryContext::background();
    exec.execute(&ctx, SEED_USERS_SQL, []).unwrap();

    let err = exec
        .fetch_many(&ctx, "SELECT id FROM users ORDER BY id;", [], |rows| {
            rows.next()?;
            Err::<(), _>(DbError::Transaction("consumer gave up"))
        })
        .unwrap_err();
    assert!(matches!(err, DbError::Transaction(_)));

    // The single pooled connection must be free and hold no open statement,
    // otherwise dropping the table reports it as locked.
    exec.execute(&ctx, "DROP TABLE users;", []).unwrap();
}

#[test]
fn execute_reports_constraint_failures_as_sqlite_errors() {
    let db = open_database_in_memory().unwrap();
    let exec = db.executor();
    let ctx = QueryContext::background();
    exec.execute(&ctx, SEED_USERS_SQL, []).unwrap();

    let err = exec
        .execute(
            &ctx,
            "INSERT INTO users (name, email, created_at) VALUES ('Ann 2', 'ann@x.com', 0);",
            [],
        )
        .unwrap_err();
    assert_eq!(
        err.sqlite_extended_code(),
        Some(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
    );
}

#[test]
fn expired_context_fails_before_touching_storage() {
    let db = open_database_in_memory().unwrap();
    let ctx = QueryContext::with_deadline(Instant::now());

    let err = db
        .executor()
        .execute(&ctx, SEED_USERS_SQL, [])
        .unwrap_err();
    assert!(matches!(err, DbError::DeadlineExceeded));

    let count: i64 = db
        .executor()
        .fetch_one(
            &QueryContext::background(),
            "SELECT COUNT(*) FROM users;",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn running_statement_is_interrupted_at_deadline() {
    let db = open_database_in_memory().unwrap();
    let ctx = QueryContext::with_timeout(Duration::from_millis(50));

    let started_at = Instant::now();
    let err = db
        .executor()
        .fetch_one(&ctx, ENDLESS_QUERY_SQL, [], |row| row.get::<_, i64>(0))
        .unwrap_err();
    assert!(matches!(err, DbError::DeadlineExceeded));
    assert!(started_at.elapsed() < Duration::from_secs(10));

    // The connection stays usable once the deadline handler is cleared.
    let one: i64 = db
        .executor()
        .fetch_one(&QueryContext::background(), "SELECT 1;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(one, 1);
}

#[test]
fn saturated_pool_wait_honors_caller_deadline() {
    let dir = tempfile::tempdir().unwrap();
    let config = PoolConfig {
        max_open: 1,
        min_idle: 1,
        ..PoolConfig::default()
    };
    let db = open_database(dir.path().join("saturated.db"), &config).unwrap();

    let mut uow = db.unit_of_work();
    uow.begin(&QueryContext::background()).unwrap();

    let ctx = QueryContext::with_timeout(Duration::from_millis(100));
    let err = db
        .executor()
        .fetch_one(&ctx, "SELECT 1;", [], |row| row.get::<_, i64>(0))
        .unwrap_err();
    assert!(matches!(err, DbError::DeadlineExceeded));

    uow.rollback().unwrap();
    let one: i64 = db
        .executor()
        .fetch_one(&QueryContext::background(), "SELECT 1;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(one, 1);
}

#[test]
fn saturated_pool_without_deadline_uses_acquire_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let config = PoolConfig {
        max_open: 1,
        min_idle: 1,
        acquire_timeout_ms: 100,
        ..PoolConfig::default()
    };
    let db = open_database(dir.path().join("acquire.db"), &config).unwrap();

    let mut uow = db.unit_of_work();
    uow.begin(&QueryContext::background()).unwrap();

    let err = db
        .executor()
        .execute(&QueryContext::background(), "SELECT 1;", [])
        .unwrap_err();
    assert!(matches!(err, DbError::Pool(_)));
}
