use rusqlite::Connection;
use studynote_core::db::schema::{SCHEMA_VERSION, TABLES};
use studynote_core::db::seed::{DEFAULT_SUBJECTS, DEFAULT_TAGS};
use studynote_core::db::{open_db, open_db_in_memory, DbError, SchemaError};

#[test]
fn open_db_in_memory_creates_every_table() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), SCHEMA_VERSION);
    for table in TABLES {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn fresh_database_is_seeded_with_ownerless_defaults() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(count(&conn, "subjects"), DEFAULT_SUBJECTS.len() as i64);
    assert_eq!(count(&conn, "tags"), DEFAULT_TAGS.len() as i64);
    let owned: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM subjects WHERE user_id IS NOT NULL;",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(owned, 0);

    let first: (String, String) = conn
        .query_row(
            "SELECT name, color FROM subjects ORDER BY id LIMIT 1;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(first, ("Psychology".to_string(), "#9c27b0".to_string()));
}

#[test]
fn reopening_same_file_neither_rebuilds_nor_reseeds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("studynote.sqlite3");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO users (username, password) VALUES ('ada', 'pw');",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), SCHEMA_VERSION);
    assert_eq!(count(&conn_second, "users"), 1);
    assert_eq!(count(&conn_second, "subjects"), DEFAULT_SUBJECTS.len() as i64);
    assert_eq!(count(&conn_second, "tags"), DEFAULT_TAGS.len() as i64);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 42;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::Schema(SchemaError::TooNew { found, supported }) => {
            assert_eq!(found, 42);
            assert_eq!(supported, SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unopenable_path_is_reported_with_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("studynote.sqlite3");

    match open_db(&path).unwrap_err() {
        DbError::Open { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn connections_enforce_foreign_keys_and_progress_bounds() {
    let conn = open_db_in_memory().unwrap();

    let fk_enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(fk_enabled, 1);

    let orphan = conn.execute(
        "INSERT INTO notes (title, content, user_id, created_at, updated_at)
         VALUES ('t', '', 999, 0, 0);",
        [],
    );
    assert!(orphan.is_err());

    conn.execute(
        "INSERT INTO users (username, password) VALUES ('ada', 'pw');",
        [],
    )
    .unwrap();
    let out_of_range = conn.execute(
        "INSERT INTO exams (title, progress, user_id) VALUES ('Final', 150, 1);",
        [],
    );
    assert!(out_of_range.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
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
