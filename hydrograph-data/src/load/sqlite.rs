//! [`BulkStore`] backed by a SQLite database.

use std::io::{self, BufRead};

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use rusqlite::{Connection, Error as SqliteError, params_from_iter};
use thiserror::Error;

use super::{BulkStore, CopySpec, SchemaError, initialise_schema};
use crate::staging::row::split_row;

/// Errors raised by [`SqliteStore`].
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Creating the tables failed.
    #[error("failed to initialise hydrograph schema")]
    Schema {
        /// Underlying schema error.
        #[source]
        source: SchemaError,
    },
    /// Beginning the import transaction failed.
    #[error("failed to begin import transaction for {table}")]
    BeginTransaction {
        /// Target table.
        table: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Preparing the insert statement failed.
    #[error("failed to prepare insert into {table}")]
    PrepareInsert {
        /// Target table.
        table: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Reading a staged row failed.
    #[error("failed to read row {line} for {table}")]
    ReadRow {
        /// Target table.
        table: &'static str,
        /// One-based line number in the staged file.
        line: u64,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A staged row has the wrong number of fields.
    #[error("row {line} for {table} has {found} fields, expected {expected}")]
    MalformedRow {
        /// Target table.
        table: &'static str,
        /// One-based line number in the staged file.
        line: u64,
        /// Column count of the table.
        expected: usize,
        /// Field count of the row.
        found: usize,
    },
    /// Inserting a row failed.
    #[error("failed to insert row {line} into {table}")]
    InsertRow {
        /// Target table.
        table: &'static str,
        /// One-based line number in the staged file.
        line: u64,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Committing the import transaction failed.
    #[error("failed to commit import into {table}")]
    Commit {
        /// Target table.
        table: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A maintenance statement failed.
    #[error("failed to execute `{statement}`")]
    Execute {
        /// Statement text.
        statement: String,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

/// A SQLite database receiving staged rows.
///
/// Each [`BulkStore::copy_rows`] call runs in its own transaction, so a
/// failing table leaves earlier tables loaded and itself empty.
#[derive(Debug)]
pub struct SqliteStore {
    connection: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Utf8Path) -> Result<Self, SqliteStoreError> {
        let connection =
            Connection::open(path.as_std_path()).map_err(|source| SqliteStoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { connection })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let connection =
            Connection::open_in_memory().map_err(|source| SqliteStoreError::Open {
                path: Utf8PathBuf::from(":memory:"),
                source,
            })?;
        Ok(Self { connection })
    }

    /// Create the hydrography tables if they are missing.
    pub fn initialise_schema(&mut self) -> Result<(), SqliteStoreError> {
        initialise_schema(&mut self.connection)
            .map_err(|source| SqliteStoreError::Schema { source })
    }

    /// Underlying connection, for queries after the load.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl BulkStore for SqliteStore {
    type Error = SqliteStoreError;

    fn copy_rows<R: BufRead>(&mut self, spec: &CopySpec, rows: R) -> Result<u64, Self::Error> {
        let table = spec.table;
        let transaction = self
            .connection
            .transaction()
            .map_err(|source| SqliteStoreError::BeginTransaction { table, source })?;

        let mut inserted = 0;
        {
            let mut statement = transaction
                .prepare(&insert_statement(spec))
                .map_err(|source| SqliteStoreError::PrepareInsert { table, source })?;

            for (index, row) in rows.lines().enumerate() {
                let line = index as u64 + 1;
                let row = row.map_err(|source| SqliteStoreError::ReadRow {
                    table,
                    line,
                    source,
                })?;
                let fields = split_row(&row, spec.delimiter, spec.null_marker);
                if fields.len() != spec.columns.len() {
                    return Err(SqliteStoreError::MalformedRow {
                        table,
                        line,
                        expected: spec.columns.len(),
                        found: fields.len(),
                    });
                }
                statement
                    .execute(params_from_iter(fields.iter()))
                    .map_err(|source| SqliteStoreError::InsertRow {
                        table,
                        line,
                        source,
                    })?;
                inserted += 1;
            }
        }

        transaction
            .commit()
            .map_err(|source| SqliteStoreError::Commit { table, source })?;
        debug!("Inserted {inserted} rows into {table}");
        Ok(inserted)
    }

    fn execute(&mut self, statement: &str) -> Result<(), Self::Error> {
        self.connection
            .execute_batch(statement)
            .map_err(|source| SqliteStoreError::Execute {
                statement: statement.to_owned(),
                source,
            })
    }
}

fn insert_statement(spec: &CopySpec) -> String {
    let columns = spec
        .columns
        .iter()
        .map(|column| quote_identifier(column))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=spec.columns.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({columns}) VALUES ({placeholders})",
        quote_identifier(spec.table)
    )
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
