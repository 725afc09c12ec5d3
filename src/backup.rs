use anyhow::{anyhow, bail, Context};
use rusqlite::{Connection, OpenFlags};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::db;

/// First 16 bytes of every SQLite 3 database file.
const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";

#[derive(Debug, Clone)]
pub struct SnapshotSummary {
    pub record_count: i64,
    pub bytes: u64,
}

#[derive(Debug, Clone)]
pub struct RestoreSummary {
    pub record_count: i64,
}

/// Writes a consistent copy of the workspace grade table to `out_path` with
/// `VACUUM INTO`. An existing file at `out_path` is never overwritten.
pub fn snapshot_workspace(workspace: &Path, out_path: &Path) -> anyhow::Result<SnapshotSummary> {
    let db_path = db::db_path(workspace);
    if !db_path.is_file() {
        bail!("workspace database not found: {}", db_path.display());
    }
    if out_path.exists() {
        bail!("snapshot target already exists: {}", out_path.display());
    }
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let target = out_path
        .to_str()
        .ok_or_else(|| anyhow!("snapshot path is not valid UTF-8: {}", out_path.display()))?;
    let conn = db::connect(&db_path)?;
    conn.execute("VACUUM INTO ?1", [target])
        .with_context(|| format!("failed to write snapshot {}", out_path.display()))?;
    drop(conn);

    let record_count = check_grade_database(out_path)?;
    let bytes = std::fs::metadata(out_path)
        .with_context(|| format!("failed to stat snapshot {}", out_path.display()))?
        .len();
    Ok(SnapshotSummary {
        record_count,
        bytes,
    })
}

/// Replaces the workspace database with `in_path`.
///
/// The source must be a SQLite file holding a complete `sungjuk` table. It is
/// copied to a side file and checked again there; the live database is only
/// touched by the final rename.
pub fn restore_workspace(in_path: &Path, workspace: &Path) -> anyhow::Result<RestoreSummary> {
    check_grade_database(in_path)?;

    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create workspace {}", workspace.display()))?;
    let dst = db::db_path(workspace);
    let staged = dst.with_extension("db.restoring");
    if staged.exists() {
        let _ = std::fs::remove_file(&staged);
    }

    std::fs::copy(in_path, &staged).with_context(|| {
        format!(
            "failed to stage {} as {}",
            in_path.display(),
            staged.display()
        )
    })?;
    let record_count = match check_grade_database(&staged) {
        Ok(n) => n,
        Err(e) => {
            let _ = std::fs::remove_file(&staged);
            return Err(e);
        }
    };

    std::fs::rename(&staged, &dst)
        .with_context(|| format!("failed to move restored database to {}", dst.display()))?;
    Ok(RestoreSummary { record_count })
}

/// Row count of `path` if it is a SQLite file with a usable grade table.
fn check_grade_database(path: &Path) -> anyhow::Result<i64> {
    let mut f =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut header = [0u8; 16];
    if f.read_exact(&mut header).is_err() || &header != SQLITE_HEADER {
        bail!("not a SQLite database: {}", path.display());
    }
    drop(f);

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open database {}", path.display()))?;
    let missing = db::missing_columns(&conn)?;
    if !missing.is_empty() {
        bail!(
            "{} has no usable sungjuk table (missing: {})",
            path.display(),
            missing.join(", ")
        );
    }
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM sungjuk", [], |r| r.get(0))?;
    Ok(count)
}
