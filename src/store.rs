use crate::calc;
use crate::db;
use chrono::Datelike;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_PAGE_SIZE: u32 = 20;

const RECORD_COLUMNS: &str = "id, student_id, name, kor, eng, mat, total, avg, grade";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("student not found: {0}")]
    NotFound(String),

    #[error("{subject} score must be between 0 and 100, got {value}")]
    InvalidScore { subject: &'static str, value: i64 },

    #[error("page must be a positive integer, got {0}")]
    InvalidPage(u32),

    #[error("page size must be a positive integer")]
    InvalidPageSize,

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("{0:#}")]
    Open(#[from] anyhow::Error),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "not_found",
            StoreError::InvalidScore { .. } => "invalid_score",
            StoreError::InvalidPage(_) | StoreError::InvalidPageSize => "bad_params",
            StoreError::Db(_) => "db_query_failed",
            StoreError::Open(_) => "db_open_failed",
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scores {
    pub kor: i64,
    pub eng: i64,
    pub mat: i64,
}

impl Scores {
    pub fn new(kor: i64, eng: i64, mat: i64) -> Self {
        Self { kor, eng, mat }
    }

    fn validate(&self) -> StoreResult<()> {
        for (subject, value) in [("kor", self.kor), ("eng", self.eng), ("mat", self.mat)] {
            if !calc::score_in_range(value) {
                return Err(StoreError::InvalidScore { subject, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub sequence_id: i64,
    pub student_id: String,
    pub name: String,
    pub kor: i64,
    pub eng: i64,
    pub mat: i64,
    pub total: i64,
    pub average: f64,
    pub grade: String,
}

impl StudentRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            sequence_id: row.get(0)?,
            student_id: row.get(1)?,
            name: row.get(2)?,
            kor: row.get(3)?,
            eng: row.get(4)?,
            mat: row.get(5)?,
            total: row.get(6)?,
            average: row.get(7)?,
            grade: row.get(8)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPage {
    pub records: Vec<StudentRecord>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: i64,
    pub has_prev: bool,
    pub has_next: bool,
}

/// `<year><ordinal>` with the ordinal zero-padded to 3 digits. Ordinals past
/// 999 are not truncated and produce longer ids.
pub fn format_student_id(year: i32, ordinal: i64) -> String {
    format!("{}{:03}", year, ordinal)
}

/// The grade-record table of one workspace.
///
/// Holds only the database path. Every operation opens its own connection,
/// which is closed when it goes out of scope on both success and error paths.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Opens `workspace`, creating the directory and schema if needed.
    pub fn open(workspace: &Path) -> StoreResult<Self> {
        db::open_db(workspace)?;
        Ok(Self {
            path: db::db_path(workspace),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> StoreResult<Connection> {
        Ok(db::connect(&self.path)?)
    }

    pub fn count(&self) -> StoreResult<i64> {
        let conn = self.connect()?;
        count_rows(&conn)
    }

    /// Registers a student under the current calendar year.
    pub fn create(&self, name: &str, scores: Scores) -> StoreResult<StudentRecord> {
        self.create_for_year(chrono::Local::now().year(), name, scores)
    }

    pub fn create_for_year(
        &self,
        year: i32,
        name: &str,
        scores: Scores,
    ) -> StoreResult<StudentRecord> {
        scores.validate()?;
        let summary = calc::summarize(scores.kor, scores.eng, scores.mat);
        let conn = self.connect()?;

        // Count-then-insert runs without a lock or transaction. Two concurrent
        // creators can read the same count and issue the same student_id, and a
        // create after a delete can reissue an id that is still in use.
        let count = count_rows(&conn)?;
        let student_id = format_student_id(year, count + 1);
        let grade = summary.grade.as_str().to_string();

        conn.execute(
            "INSERT INTO sungjuk(student_id, name, kor, eng, mat, total, avg, grade)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &student_id,
                name,
                scores.kor,
                scores.eng,
                scores.mat,
                summary.total,
                summary.average,
                &grade,
            ),
        )?;
        let sequence_id = conn.last_insert_rowid();
        info!(%student_id, sequence_id, "student registered");

        Ok(StudentRecord {
            sequence_id,
            student_id,
            name: name.to_string(),
            kor: scores.kor,
            eng: scores.eng,
            mat: scores.mat,
            total: summary.total,
            average: summary.average,
            grade,
        })
    }

    /// Newest-first page of records; callers without a preference pass
    /// [`DEFAULT_PAGE_SIZE`]. A page past the end is empty, not an error.
    pub fn list(&self, page: u32, page_size: u32) -> StoreResult<RecordPage> {
        if page == 0 {
            return Err(StoreError::InvalidPage(page));
        }
        if page_size == 0 {
            return Err(StoreError::InvalidPageSize);
        }
        let conn = self.connect()?;
        let total_count = count_rows(&conn)?;
        let limit = i64::from(page_size);
        // u32 x u32 does not fit i64; pages that far out just read nothing.
        let offset = i64::try_from(i128::from(page - 1) * i128::from(page_size))
            .unwrap_or(i64::MAX);

        let sql = format!(
            "SELECT {} FROM sungjuk ORDER BY id DESC LIMIT ? OFFSET ?",
            RECORD_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map((limit, offset), StudentRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        debug!(page, page_size, total_count, rows = records.len(), "listed records");

        Ok(RecordPage {
            records,
            page,
            page_size,
            total_count,
            has_prev: page > 1,
            has_next: i128::from(total_count) > i128::from(page) * i128::from(page_size),
        })
    }

    /// First record (lowest sequence id) carrying `student_id`.
    pub fn get_by_student_id(&self, student_id: &str) -> StoreResult<StudentRecord> {
        let conn = self.connect()?;
        find_first(&conn, student_id)?.ok_or_else(|| StoreError::NotFound(student_id.to_string()))
    }

    /// Overwrites name and scores and recomputes the derived fields. Every row
    /// sharing `student_id` is updated; the first one is returned.
    pub fn update(
        &self,
        student_id: &str,
        name: &str,
        scores: Scores,
    ) -> StoreResult<StudentRecord> {
        scores.validate()?;
        let summary = calc::summarize(scores.kor, scores.eng, scores.mat);
        let conn = self.connect()?;

        let changed = conn.execute(
            "UPDATE sungjuk
             SET name = ?, kor = ?, eng = ?, mat = ?, total = ?, avg = ?, grade = ?
             WHERE student_id = ?",
            (
                name,
                scores.kor,
                scores.eng,
                scores.mat,
                summary.total,
                summary.average,
                summary.grade.as_str(),
                student_id,
            ),
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(student_id.to_string()));
        }
        info!(%student_id, rows = changed, "student updated");

        find_first(&conn, student_id)?.ok_or_else(|| StoreError::NotFound(student_id.to_string()))
    }

    /// Removes every row carrying `student_id` and returns the name of the
    /// first one. Nothing is touched when no row matches.
    pub fn delete(&self, student_id: &str) -> StoreResult<String> {
        let conn = self.connect()?;
        let name: Option<String> = conn
            .query_row(
                "SELECT name FROM sungjuk WHERE student_id = ? ORDER BY id LIMIT 1",
                [student_id],
                |r| r.get(0),
            )
            .optional()?;
        let Some(name) = name else {
            return Err(StoreError::NotFound(student_id.to_string()));
        };

        let removed = conn.execute("DELETE FROM sungjuk WHERE student_id = ?", [student_id])?;
        info!(%student_id, rows = removed, "student deleted");
        Ok(name)
    }
}

fn count_rows(conn: &Connection) -> StoreResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM sungjuk", [], |r| r.get(0))?)
}

fn find_first(conn: &Connection, student_id: &str) -> StoreResult<Option<StudentRecord>> {
    let sql = format!(
        "SELECT {} FROM sungjuk WHERE student_id = ? ORDER BY id LIMIT 1",
        RECORD_COLUMNS
    );
    Ok(conn
        .query_row(&sql, [student_id], StudentRecord::from_row)
        .optional()?)
}
