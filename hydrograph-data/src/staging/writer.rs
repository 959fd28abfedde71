use std::io::{BufWriter, Write};

use cap_std::fs_utf8;
use log::{debug, warn};

use hydrograph_core::{Node, Relation, Way};

use super::{
    StagedRows, StagingArea, StagingError, StagingTable,
    row::{Field, write_row},
};
use crate::parse::EntitySink;

struct Sink {
    table: StagingTable,
    out: BufWriter<fs_utf8::File>,
}

/// Appends staged rows to one file per table.
///
/// Call [`StagingWriter::finish`] to flush and close every sink. A writer
/// dropped without finishing still flushes, logging any failure.
pub struct StagingWriter {
    sinks: Vec<Sink>,
    rows: StagedRows,
    finished: bool,
}

impl StagingWriter {
    pub(super) fn create(area: &StagingArea) -> Result<Self, StagingError> {
        let mut sinks = Vec::with_capacity(StagingTable::ALL.len());
        for table in StagingTable::ALL {
            let file = area
                .dir()
                .create(table.file_name())
                .map_err(|source| StagingError::CreateSink {
                    table,
                    path: area.table_path(table),
                    source,
                })?;
            sinks.push(Sink {
                table,
                out: BufWriter::new(file),
            });
        }
        debug!("Opened staging sinks in {}", area.root());
        Ok(Self {
            sinks,
            rows: StagedRows::default(),
            finished: false,
        })
    }

    /// Rows written so far.
    #[must_use]
    pub const fn rows(&self) -> &StagedRows {
        &self.rows
    }

    /// Flush and close every sink, returning the row counts.
    ///
    /// Every sink is flushed even when an earlier one fails; the first
    /// failure is returned.
    pub fn finish(mut self) -> Result<StagedRows, StagingError> {
        self.finished = true;
        let mut first_error = None;
        for mut sink in std::mem::take(&mut self.sinks) {
            if let Err(source) = sink.out.flush() {
                let err = StagingError::Flush {
                    table: sink.table,
                    source,
                };
                warn!("{err}");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(self.rows), Err)
    }

    fn write(&mut self, table: StagingTable, fields: &[Field<'_>]) -> Result<(), StagingError> {
        let sink = self
            .sinks
            .iter_mut()
            .find(|sink| sink.table == table)
            .ok_or_else(|| StagingError::Write {
                table,
                source: std::io::Error::other("staging sink already closed"),
            })?;
        write_row(&mut sink.out, fields).map_err(|source| StagingError::Write { table, source })?;
        self.rows.increment(table);
        Ok(())
    }
}

impl EntitySink for StagingWriter {
    type Error = StagingError;

    fn accept_node(&mut self, node: &Node) -> Result<(), Self::Error> {
        let geometry = node.wkt();
        self.write(StagingTable::Nodes, &[Field::Id(node.id), Field::Text(&geometry)])
    }

    fn accept_way(&mut self, way: &Way) -> Result<(), Self::Error> {
        let name = way.resolved_name();
        let kind = way.resolved_type().map(|kind| kind.as_str());
        self.write(
            StagingTable::Ways,
            &[Field::Id(way.id), Field::Text(&name), Field::from(kind)],
        )?;
        for &node in &way.nodes {
            self.write(StagingTable::NodesInWay, &[Field::Id(way.id), Field::Id(node)])?;
        }
        Ok(())
    }

    fn accept_relation(&mut self, relation: &Relation) -> Result<(), Self::Error> {
        // Side-stream markers count whatever the marking relation's own type.
        for &discarded in &relation.discarded {
            self.write(StagingTable::DiscardedRels, &[Field::Id(discarded)])?;
        }
        let Some(kind) = relation.resolved_type() else {
            debug!("Not staging {relation} as a row: neither river nor boundary");
            return Ok(());
        };
        let name = relation.resolved_name();
        self.write(
            StagingTable::Relations,
            &[
                Field::Id(relation.id),
                Field::Text(&name),
                Field::Text(kind.as_str()),
                Field::from(relation.sandre_ref.as_deref()),
            ],
        )?;
        for &way in &relation.ways {
            self.write(StagingTable::WaysInRel, &[Field::Id(relation.id), Field::Id(way)])?;
        }
        for &tributary in &relation.tributaries {
            self.write(
                StagingTable::Tributaries,
                &[Field::Id(relation.id), Field::Id(tributary)],
            )?;
        }
        Ok(())
    }
}

impl Drop for StagingWriter {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        for sink in &mut self.sinks {
            if let Err(err) = sink.out.flush() {
                warn!("Failed to flush staged rows for {} on drop: {err}", sink.table);
            }
        }
    }
}
