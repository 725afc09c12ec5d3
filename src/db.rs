use anyhow::Context;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub const DB_FILE_NAME: &str = "students.db";

/// Columns a database must carry to be served as a grade table.
pub const SUNGJUK_COLUMNS: [&str; 9] = [
    "id",
    "student_id",
    "name",
    "kor",
    "eng",
    "mat",
    "total",
    "avg",
    "grade",
];

pub fn db_path(workspace: &Path) -> PathBuf {
    workspace.join(DB_FILE_NAME)
}

/// Opens the workspace database and makes sure the grade table exists.
/// Run once per workspace selection; store operations use [`connect`].
pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace.to_string_lossy()
        )
    })?;
    let conn = connect(&db_path(workspace))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sungjuk(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id TEXT,
            name TEXT,
            kor INTEGER,
            eng INTEGER,
            mat INTEGER,
            total INTEGER,
            avg REAL,
            grade TEXT
        )",
        [],
    )?;
    // Not UNIQUE: duplicate student ids are tolerated (see store::create).
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sungjuk_student_id ON sungjuk(student_id)",
        [],
    )?;

    Ok(conn)
}

pub fn connect(path: &Path) -> anyhow::Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database {}", path.to_string_lossy()))?;
    Ok(conn)
}

/// Grade-table columns absent from `conn`; all of them when the table is missing.
pub fn missing_columns(conn: &Connection) -> anyhow::Result<Vec<&'static str>> {
    let mut stmt = conn.prepare("PRAGMA table_info(sungjuk)")?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SUNGJUK_COLUMNS
        .iter()
        .copied()
        .filter(|c| !present.iter().any(|p| p == c))
        .collect())
}
