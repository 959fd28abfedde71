//! Bulk import of staged rows into a relational store.
//!
//! [`load_staged`] copies each staged table, in dependency order, through the
//! [`BulkStore`] seam and runs the store's maintenance statement after every
//! table. Nothing is rolled back when a later table fails.
#![forbid(unsafe_code)]

mod schema;
mod sqlite;

use std::{error::Error as StdError, io::BufRead};

use log::info;
use serde::Serialize;
use thiserror::Error;

use crate::staging::{
    StagingArea, StagingError, StagingTable,
    row::{DELIMITER, NULL_MARKER},
};

pub use schema::{SchemaError, initialise_schema};
pub use sqlite::{SqliteStore, SqliteStoreError};

/// Describes how staged rows map onto a store table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopySpec {
    /// Target table name.
    pub table: &'static str,
    /// Field delimiter.
    pub delimiter: char,
    /// Target columns, in field order.
    pub columns: &'static [&'static str],
    /// Text standing for `NULL`.
    pub null_marker: &'static str,
}

impl CopySpec {
    /// Copy description for a staged table.
    ///
    /// # Examples
    /// ```
    /// use hydrograph_data::{CopySpec, StagingTable};
    ///
    /// let spec = CopySpec::for_table(StagingTable::Ways);
    /// assert_eq!(spec.table, "ways");
    /// assert_eq!(spec.columns, ["osm_id", "name", "type"]);
    /// assert_eq!(spec.delimiter, '|');
    /// ```
    #[must_use]
    pub const fn for_table(table: StagingTable) -> Self {
        Self {
            table: table.name(),
            delimiter: DELIMITER,
            columns: table.columns(),
            null_marker: NULL_MARKER,
        }
    }
}

/// A store that accepts delimited rows in bulk.
pub trait BulkStore {
    /// Store-specific failure.
    type Error: StdError + Send + Sync + 'static;

    /// Import every row of `rows` into the table described by `spec`,
    /// returning the number of rows imported.
    fn copy_rows<R: BufRead>(&mut self, spec: &CopySpec, rows: R) -> Result<u64, Self::Error>;

    /// Run a statement with no result set.
    fn execute(&mut self, statement: &str) -> Result<(), Self::Error>;

    /// Statement refreshing planner statistics after `table` is loaded.
    fn maintenance_statement(&self, table: &str) -> String {
        format!("ANALYZE {table}")
    }
}

/// Errors raised by [`load_staged`]. Every variant names its table.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The staged file could not be opened.
    #[error("failed to open staged rows for {table}")]
    OpenStaged {
        /// Target table.
        table: &'static str,
        /// Underlying staging error.
        #[source]
        source: StagingError,
    },
    /// The store rejected the import.
    #[error("failed to import staged rows into {table}")]
    Import {
        /// Target table.
        table: &'static str,
        /// Store error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// The post-import maintenance statement failed.
    #[error("failed to run maintenance on {table}")]
    Maintenance {
        /// Target table.
        table: &'static str,
        /// Store error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl LoadError {
    /// Table the failure relates to.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        match self {
            Self::OpenStaged { table, .. }
            | Self::Import { table, .. }
            | Self::Maintenance { table, .. } => *table,
        }
    }
}

/// Rows imported into one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableLoad {
    /// Target table.
    pub table: &'static str,
    /// Rows imported.
    pub rows: u64,
}

/// Outcome of [`load_staged`], in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Per-table row counts.
    pub tables: Vec<TableLoad>,
}

impl LoadReport {
    /// Rows imported into `table`, if it was loaded.
    #[must_use]
    pub fn rows(&self, table: &str) -> Option<u64> {
        self.tables
            .iter()
            .find(|load| load.table == table)
            .map(|load| load.rows)
    }
}

/// Copy every staged table into `store`, in [`StagingTable::LOAD_ORDER`].
///
/// Expects the relations file to be reconciled already. Tables loaded before
/// a failure stay loaded.
pub fn load_staged<S: BulkStore>(
    area: &StagingArea,
    store: &mut S,
) -> Result<LoadReport, LoadError> {
    let mut report = LoadReport::default();
    for staged in StagingTable::LOAD_ORDER {
        let spec = CopySpec::for_table(staged);
        let table = spec.table;
        info!("Copying {} into {table}", area.table_path(staged));

        let rows = area
            .open_table(staged)
            .map_err(|source| LoadError::OpenStaged { table, source })?;
        let imported = store
            .copy_rows(&spec, rows)
            .map_err(|source| LoadError::Import {
                table,
                source: Box::new(source),
            })?;

        let statement = store.maintenance_statement(table);
        store
            .execute(&statement)
            .map_err(|source| LoadError::Maintenance {
                table,
                source: Box::new(source),
            })?;

        info!("Loaded {imported} rows into {table}");
        report.tables.push(TableLoad {
            table,
            rows: imported,
        });
    }
    Ok(report)
}
