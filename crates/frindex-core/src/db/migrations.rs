//! Schema versions for the index database.
//!
//! The applied version lives in `PRAGMA user_version` and is mirrored into
//! `index_meta.schema_version` so it shows up in ordinary queries.

use super::schema;
use rusqlite::{Connection, types::Type};
use tracing::info;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "core tables",
        sql: schema::MIGRATION_V1_SQL,
    },
    Migration {
        version: 2,
        name: "lookup indexes",
        sql: schema::MIGRATION_V2_SQL,
    },
    Migration {
        version: 3,
        name: "nullable cached counts",
        sql: schema::MIGRATION_V3_SQL,
    },
];

/// Newest schema this build can write.
pub const LATEST_SCHEMA_VERSION: u32 = 3;

/// # Errors
///
/// Returns an error if the pragma query fails or holds a value outside `u32`.
pub fn current_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let stored: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    u32::try_from(stored)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(err)))
}

/// Bring the schema up to [`LATEST_SCHEMA_VERSION`]. Each step commits on its
/// own, so a failure leaves the earlier steps in place.
///
/// # Errors
///
/// Returns the first failing step's SQLite error.
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<u32> {
    let start = current_schema_version(conn)?;

    let mut reached = start;
    for step in MIGRATIONS.iter().filter(|m| m.version > start) {
        let tx = conn.transaction()?;
        tx.execute_batch(step.sql)?;
        tx.execute(
            "UPDATE index_meta SET schema_version = ?1 WHERE id = 1",
            [i64::from(step.version)],
        )?;
        tx.pragma_update(None, "user_version", i64::from(step.version))?;
        tx.commit()?;

        info!(version = step.version, step = step.name, "migrated index schema");
        reached = step.version;
    }

    Ok(reached)
}
