//! Second pass removing discarded relations from the staged relations file.

use std::{
    collections::HashSet,
    io::{self, BufRead, BufWriter, Write},
};

use camino::Utf8Path;
use log::{info, warn};
use serde::Serialize;

use hydrograph_core::OsmId;
use hydrograph_fs::{remove_if_exists, replace_file};

use super::{StagingArea, StagingError, StagingTable, row::leading_id};

const RELATIONS_SCRATCH: &str = "relations_data.tmp";

/// Outcome of [`StagingArea::reconcile_discarded`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Distinct relation ids named by `side_stream` members.
    pub discarded_ids: usize,
    /// Relation rows kept.
    pub kept: u64,
    /// Relation rows removed.
    pub removed: u64,
    /// Lines of the discard list that did not hold an id.
    pub malformed_markers: u64,
}

impl StagingArea {
    /// Rewrite `relations_data` without the relations named in
    /// `discarded_rels_data`.
    ///
    /// Must run after the writer is finished. Surviving rows keep their order.
    /// The rewrite goes through a scratch file renamed over the original, so
    /// a failure leaves the original untouched.
    pub fn reconcile_discarded(&self) -> Result<ReconcileReport, StagingError> {
        let (discarded, malformed_markers) = self.discarded_ids()?;
        let (kept, removed) = match self.rewrite_relations(&discarded) {
            Ok(counts) => counts,
            Err(err) => {
                if let Err(cleanup) = remove_if_exists(self.dir(), RELATIONS_SCRATCH) {
                    warn!("Failed to remove {RELATIONS_SCRATCH}: {cleanup}");
                }
                return Err(err);
            }
        };

        let report = ReconcileReport {
            discarded_ids: discarded.len(),
            kept,
            removed,
            malformed_markers,
        };
        info!(
            "Reconciled relations: {} kept, {} removed ({} discarded ids)",
            report.kept, report.removed, report.discarded_ids
        );
        Ok(report)
    }

    fn discarded_ids(&self) -> Result<(HashSet<OsmId>, u64), StagingError> {
        let table = StagingTable::DiscardedRels;
        let mut ids = HashSet::new();
        let mut malformed = 0;
        for line in self.open_table(table)?.lines() {
            let line = line.map_err(|source| StagingError::ReadTable {
                table,
                path: self.table_path(table),
                source,
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match trimmed.parse() {
                Ok(id) => {
                    ids.insert(id);
                }
                Err(_) => {
                    warn!("Ignoring malformed discarded relation id {trimmed:?}");
                    malformed += 1;
                }
            }
        }
        Ok((ids, malformed))
    }

    fn rewrite_relations(&self, discarded: &HashSet<OsmId>) -> Result<(u64, u64), StagingError> {
        let table = StagingTable::Relations;
        let relations_path = self.table_path(table);
        let scratch_path = self.root().join(RELATIONS_SCRATCH);

        let source = self.open_table(table)?;
        let file = self
            .dir()
            .create(RELATIONS_SCRATCH)
            .map_err(step("create scratch file", &scratch_path))?;
        let mut out = BufWriter::new(file);
        let (mut kept, mut removed) = (0, 0);

        for line in source.lines() {
            let line = line.map_err(step("read staged relations", &relations_path))?;
            if leading_id(&line).is_some_and(|id| discarded.contains(&id)) {
                removed += 1;
                continue;
            }
            writeln!(out, "{line}").map_err(step("write scratch file", &scratch_path))?;
            kept += 1;
        }

        let file = out
            .into_inner()
            .map_err(io::IntoInnerError::into_error)
            .map_err(step("flush scratch file", &scratch_path))?;
        file.sync_all()
            .map_err(step("sync scratch file", &scratch_path))?;
        drop(file);

        replace_file(self.dir(), RELATIONS_SCRATCH, table.file_name())
            .map_err(step("replace staged relations", &relations_path))?;
        Ok((kept, removed))
    }
}

fn step(step: &'static str, path: &Utf8Path) -> impl FnOnce(io::Error) -> StagingError {
    let path = path.to_path_buf();
    move |source| StagingError::Reconcile { step, path, source }
}
