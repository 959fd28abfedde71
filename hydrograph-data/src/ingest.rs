//! End-to-end import: parse, stage, reconcile, then bulk load.
#![forbid(unsafe_code)]

use std::io::BufRead;

use camino::Utf8PathBuf;
use log::info;
use serde::Serialize;
use thiserror::Error;

use crate::{
    load::{BulkStore, LoadError, LoadReport, load_staged},
    parse::{ParseError, ParseStats, read_osm_xml},
    staging::{ReconcileReport, StagedRows, StagingArea, StagingError},
};

/// Outcome of staging one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// Entities parsed and skipped.
    pub parse: ParseStats,
    /// Rows written per staged file, before reconciliation.
    pub staged: StagedRows,
    /// Relations removed by the discard pass.
    pub reconcile: ReconcileReport,
}

/// Outcome of a full import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Directory holding the staged files.
    pub staging_dir: Utf8PathBuf,
    /// Parse and staging counters.
    pub stage: StageReport,
    /// Rows loaded per table.
    pub load: LoadReport,
}

/// Errors returned by [`stage_osm_xml`] and [`import_osm_xml`].
#[derive(Debug, Error)]
pub enum IngestError {
    /// Staging files could not be written or reconciled.
    #[error("staging failed")]
    Staging {
        /// Underlying staging error.
        #[from]
        source: StagingError,
    },
    /// The document could not be parsed.
    #[error("failed to parse OSM XML")]
    Parse {
        /// Underlying parse error.
        #[source]
        source: ParseError,
    },
    /// The staged rows could not be loaded.
    #[error("bulk load failed")]
    Load {
        /// Underlying load error.
        #[source]
        source: LoadError,
    },
}

/// Parse `reader` into `area` and remove discarded relations.
///
/// The staging writer is finished on every path, including parse failures.
///
/// # Examples
/// ```
/// use camino::Utf8PathBuf;
/// use hydrograph_data::{StagingArea, StagingTable, stage_osm_xml};
///
/// let tmp = tempfile::tempdir().expect("create temp dir");
/// let root = Utf8PathBuf::from_path_buf(tmp.path().join("tmp")).expect("utf-8 path");
/// let area = StagingArea::prepare(root)?;
///
/// let xml = br#"<osm><way id="10"><nd ref="1"/><tag k="bridge" v="yes"/></way></osm>"#;
/// let report = stage_osm_xml(&xml[..], &area)?;
///
/// assert_eq!(report.parse.ways, 1);
/// assert_eq!(area.read_table(StagingTable::Ways)?, vec!["10|#10|bridge".to_owned()]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn stage_osm_xml<R: BufRead>(reader: R, area: &StagingArea) -> Result<StageReport, IngestError> {
    let (parse, staged) = area.stage(|writer| {
        read_osm_xml(reader, writer).map_err(|source| IngestError::Parse { source })
    })?;
    let reconcile = area.reconcile_discarded()?;
    Ok(StageReport {
        parse,
        staged,
        reconcile,
    })
}

/// Stage `reader` into `area`, then bulk load the staged rows into `store`.
pub fn import_osm_xml<R, S>(
    reader: R,
    area: &StagingArea,
    store: &mut S,
) -> Result<ImportReport, IngestError>
where
    R: BufRead,
    S: BulkStore,
{
    let stage = stage_osm_xml(reader, area)?;
    let load = load_staged(area, store).map_err(|source| IngestError::Load { source })?;
    info!(
        "Imported {} relations, {} ways and {} nodes",
        stage.reconcile.kept, stage.staged.ways, stage.staged.nodes
    );
    Ok(ImportReport {
        staging_dir: area.root().to_path_buf(),
        stage,
        load,
    })
}
