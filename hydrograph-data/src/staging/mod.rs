//! Per-table staging files for a single import run.
//!
//! A [`StagingArea`] owns the staging directory. It hands out a
//! [`StagingWriter`] that appends delimited rows while the parser runs, then
//! rewrites the relations file once the discard list is complete. The bulk
//! loader reads the finished files back through [`StagingArea::open_table`].
#![forbid(unsafe_code)]

mod reconcile;
pub mod row;
mod table;
mod writer;

use std::io::{self, BufRead, BufReader};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8;
use log::warn;
use serde::Serialize;
use thiserror::Error;

pub use reconcile::ReconcileReport;
pub use table::StagingTable;
pub use writer::StagingWriter;

/// Errors raised while preparing, writing or rewriting staged files.
#[derive(Debug, Error)]
pub enum StagingError {
    /// Something other than a directory occupies the staging path.
    #[error("staging path {path:?} exists and is not a directory")]
    NotADirectory {
        /// Requested staging directory.
        path: Utf8PathBuf,
    },
    /// The staging directory could not be created or opened.
    #[error("failed to prepare staging directory {path:?}")]
    Prepare {
        /// Requested staging directory.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A staged file could not be created.
    #[error("failed to create staging file {path:?}")]
    CreateSink {
        /// Table the file belongs to.
        table: StagingTable,
        /// Path of the staged file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Appending a row failed.
    #[error("failed to write staged row for {table}")]
    Write {
        /// Table being written.
        table: StagingTable,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Flushing a staged file failed.
    #[error("failed to flush staged rows for {table}")]
    Flush {
        /// Table being flushed.
        table: StagingTable,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A staged file could not be opened for reading.
    #[error("failed to open staged file {path:?}")]
    OpenTable {
        /// Table the file belongs to.
        table: StagingTable,
        /// Path of the staged file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Reading a staged file failed part-way.
    #[error("failed to read staged file {path:?}")]
    ReadTable {
        /// Table the file belongs to.
        table: StagingTable,
        /// Path of the staged file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A step of the discard reconciliation failed.
    #[error("failed to {step} while reconciling discarded relations in {path:?}")]
    Reconcile {
        /// Step that failed.
        step: &'static str,
        /// File involved in the failing step.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Rows appended to each staged file during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StagedRows {
    /// Rows in `relations_data`, before reconciliation.
    pub relations: u64,
    /// Rows in `tributaries_data`.
    pub tributaries: u64,
    /// Rows in `waysinrel_data`.
    pub waysinrel: u64,
    /// Rows in `ways_data`.
    pub ways: u64,
    /// Rows in `nodesinway_data`.
    pub nodesinway: u64,
    /// Rows in `nodes_data`.
    pub nodes: u64,
    /// Lines in `discarded_rels_data`.
    pub discarded_rels: u64,
}

impl StagedRows {
    /// Row count for `table`.
    #[must_use]
    pub const fn get(&self, table: StagingTable) -> u64 {
        match table {
            StagingTable::Relations => self.relations,
            StagingTable::Tributaries => self.tributaries,
            StagingTable::WaysInRel => self.waysinrel,
            StagingTable::Ways => self.ways,
            StagingTable::NodesInWay => self.nodesinway,
            StagingTable::Nodes => self.nodes,
            StagingTable::DiscardedRels => self.discarded_rels,
        }
    }

    pub(crate) fn increment(&mut self, table: StagingTable) {
        let counter = match table {
            StagingTable::Relations => &mut self.relations,
            StagingTable::Tributaries => &mut self.tributaries,
            StagingTable::WaysInRel => &mut self.waysinrel,
            StagingTable::Ways => &mut self.ways,
            StagingTable::NodesInWay => &mut self.nodesinway,
            StagingTable::Nodes => &mut self.nodes,
            StagingTable::DiscardedRels => &mut self.discarded_rels,
        };
        *counter += 1;
    }
}

/// The staging directory of one import run.
#[derive(Debug)]
pub struct StagingArea {
    root: Utf8PathBuf,
    dir: fs_utf8::Dir,
}

impl StagingArea {
    /// Create (if needed) and open the staging directory at `root`.
    ///
    /// # Errors
    /// Returns [`StagingError::NotADirectory`] when a file already occupies
    /// `root`, or [`StagingError::Prepare`] when the directory cannot be
    /// created or opened.
    pub fn prepare(root: impl Into<Utf8PathBuf>) -> Result<Self, StagingError> {
        let root = root.into();
        let dir = hydrograph_fs::prepare_dir(&root).map_err(|source| {
            if source.kind() == io::ErrorKind::NotADirectory {
                StagingError::NotADirectory { path: root.clone() }
            } else {
                StagingError::Prepare {
                    path: root.clone(),
                    source,
                }
            }
        })?;
        Ok(Self { root, dir })
    }

    /// Path of the staging directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Path of the staged file backing `table`.
    #[must_use]
    pub fn table_path(&self, table: StagingTable) -> Utf8PathBuf {
        self.root.join(table.file_name())
    }

    /// Open fresh, truncated sinks for every staged table.
    ///
    /// Prefer [`StagingArea::stage`], which guarantees the writer is finished.
    pub fn writer(&self) -> Result<StagingWriter, StagingError> {
        StagingWriter::create(self)
    }

    /// Run `body` against a fresh writer and finish the writer whatever the
    /// outcome.
    ///
    /// When `body` fails its error is returned and any flush failure is only
    /// logged.
    ///
    /// # Examples
    /// ```
    /// use camino::Utf8PathBuf;
    /// use hydrograph_core::Node;
    /// use hydrograph_data::{EntitySink, StagingArea, StagingError, StagingTable};
    ///
    /// let tmp = tempfile::tempdir().expect("create temp dir");
    /// let root = Utf8PathBuf::from_path_buf(tmp.path().join("tmp")).expect("utf-8 path");
    /// let area = StagingArea::prepare(root)?;
    /// let ((), rows) = area.stage(|writer| {
    ///     let node = Node::new(1, 2.5, 48.8).expect("valid node");
    ///     writer.accept_node(&node)
    /// })?;
    ///
    /// assert_eq!(rows.nodes, 1);
    /// assert_eq!(
    ///     area.read_table(StagingTable::Nodes)?,
    ///     vec!["1|SRID=4326;POINT(2.500000 48.800000)".to_owned()]
    /// );
    /// # Ok::<(), StagingError>(())
    /// ```
    pub fn stage<T, E, F>(&self, body: F) -> Result<(T, StagedRows), E>
    where
        F: FnOnce(&mut StagingWriter) -> Result<T, E>,
        E: From<StagingError>,
    {
        let mut writer = self.writer()?;
        let outcome = body(&mut writer);
        let finished = writer.finish();
        match outcome {
            Ok(value) => Ok((value, finished?)),
            Err(err) => {
                if let Err(flush) = finished {
                    warn!("Failed to finish staging after an aborted run: {flush}");
                }
                Err(err)
            }
        }
    }

    /// Open the staged file for `table` for buffered reading.
    pub fn open_table(
        &self,
        table: StagingTable,
    ) -> Result<BufReader<fs_utf8::File>, StagingError> {
        self.dir
            .open(table.file_name())
            .map(BufReader::new)
            .map_err(|source| StagingError::OpenTable {
                table,
                path: self.table_path(table),
                source,
            })
    }

    /// Read every line of the staged file for `table`.
    pub fn read_table(&self, table: StagingTable) -> Result<Vec<String>, StagingError> {
        self.open_table(table)?
            .lines()
            .collect::<io::Result<Vec<_>>>()
            .map_err(|source| StagingError::ReadTable {
                table,
                path: self.table_path(table),
                source,
            })
    }

    pub(crate) const fn dir(&self) -> &fs_utf8::Dir {
        &self.dir
    }
}

#[cfg(test)]
mod tests;
