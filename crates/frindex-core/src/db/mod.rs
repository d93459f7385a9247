//! SQLite reference backend: schema, migrations, the collaborator
//! implementation and the bundle importer.

pub mod import;
pub mod migrations;
pub mod schema;
pub mod store;

pub use import::{ImportBundle, ImportSummary};
pub use store::SqliteBackend;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// How long a connection waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the index at `path`, creating the file and its directory when
/// missing, and migrate it to the latest schema.
///
/// # Errors
///
/// Returns an error if the directory, the file, the pragmas or a migration
/// step fails.
pub fn open_index(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create directory {}", dir.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open index database {}", path.display()))?;
    tune_file_connection(&conn).context("set index pragmas")?;
    let version = migrations::migrate(&mut conn).context("migrate index schema")?;
    debug!(path = %path.display(), version, "opened index database");

    Ok(conn)
}

/// A throwaway index that lives only as long as the connection.
///
/// # Errors
///
/// Returns an error if a migration step fails.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory index")?;
    conn.pragma_update(None, "foreign_keys", true)
        .context("enable foreign keys")?;
    migrations::migrate(&mut conn).context("migrate index schema")?;
    Ok(conn)
}

fn tune_file_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    // WAL replies with the resulting mode; a plain update would discard it.
    let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    debug!(journal_mode = %mode, "index journal mode");
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)
}
