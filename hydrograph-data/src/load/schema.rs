//! SQLite schema for the six loaded tables.
//!
//! Column names follow the staged column contracts of
//! [`StagingTable::columns`](crate::StagingTable::columns), so a staged file
//! loads without any mapping. Join tables carry no foreign keys: members may
//! point at entities outside the extract.

use rusqlite::{Connection, Error as SqliteError, Transaction};
use thiserror::Error;

/// Ordered `(step, statement)` pairs applied by [`initialise_schema`].
const SCHEMA_STEPS: [(&str, &str); 9] = [
    (
        "create relations",
        "CREATE TABLE IF NOT EXISTS relations (
            osm_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('river', 'boundary')),
            sandre_ref TEXT
        )",
    ),
    (
        "create ways",
        "CREATE TABLE IF NOT EXISTS ways (
            osm_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT
        )",
    ),
    (
        "create nodes",
        "CREATE TABLE IF NOT EXISTS nodes (
            osm_id INTEGER PRIMARY KEY,
            geometry TEXT NOT NULL
        )",
    ),
    (
        "create tributaries",
        "CREATE TABLE IF NOT EXISTS tributaries (
            main_id INTEGER NOT NULL,
            tributary_id INTEGER NOT NULL
        )",
    ),
    (
        "create waysinrel",
        "CREATE TABLE IF NOT EXISTS waysinrel (
            rel_id INTEGER NOT NULL,
            way_id INTEGER NOT NULL
        )",
    ),
    (
        "create nodesinway",
        "CREATE TABLE IF NOT EXISTS nodesinway (
            way_id INTEGER NOT NULL,
            node_id INTEGER NOT NULL
        )",
    ),
    (
        "index tributaries",
        "CREATE INDEX IF NOT EXISTS idx_tributaries_main ON tributaries(main_id)",
    ),
    (
        "index waysinrel",
        "CREATE INDEX IF NOT EXISTS idx_waysinrel_rel ON waysinrel(rel_id)",
    ),
    (
        "index nodesinway",
        "CREATE INDEX IF NOT EXISTS idx_nodesinway_way ON nodesinway(way_id)",
    ),
];

/// Create the hydrography tables inside an existing SQLite database.
///
/// Tables and indexes are created only when missing, so the call is safe on a
/// database that already holds an earlier import. All steps run in one
/// transaction; a failing step leaves the database untouched.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use hydrograph_data::load::initialise_schema;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_schema(&mut conn).expect("create schema");
///
/// let tables: i64 = conn
///     .query_row(
///         "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN
///             ('relations', 'tributaries', 'waysinrel', 'ways', 'nodesinway', 'nodes')",
///         [],
///         |row| row.get(0),
///     )
///     .expect("count tables");
/// assert_eq!(tables, 6);
/// ```
pub fn initialise_schema(connection: &mut Connection) -> Result<(), SchemaError> {
    let transaction = connection.transaction().map_err(|source| SchemaError::Step {
        step: "begin schema transaction",
        source,
    })?;
    for (step, sql) in SCHEMA_STEPS {
        apply_step(&transaction, step, sql)?;
    }
    transaction.commit().map_err(|source| SchemaError::Step {
        step: "commit schema transaction",
        source,
    })
}

fn apply_step(transaction: &Transaction<'_>, step: &'static str, sql: &str) -> Result<(), SchemaError> {
    transaction
        .execute(sql, [])
        .map(drop)
        .map_err(|source| SchemaError::Step { step, source })
}

/// Errors raised when initialising the hydrography schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A schema statement was rejected by SQLite.
    #[error("schema step '{step}' failed")]
    Step {
        /// Short name of the statement that failed.
        step: &'static str,
        /// Error reported by SQLite.
        #[source]
        source: SqliteError,
    },
}
