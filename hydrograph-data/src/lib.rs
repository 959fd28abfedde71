//! Streaming ingestion and staging for the Hydrograph store.
//!
//! Responsibilities:
//! - Drive the OSM XML state machine and hand finished entities to a sink.
//! - Stage entities as pipe-delimited rows, one file per target table.
//! - Remove relations marked `side_stream` once the whole stream is known.
//! - Bulk load staged rows into a store in dependency order.
//!
//! Boundaries:
//! - Derived-field rules live in `hydrograph-core`.
//! - No spatial computation; geometry is staged as extended WKT text.
//!
//! Invariants:
//! - Every staging sink is flushed and closed once per run, on every exit path.
//! - No global mutable state.

pub mod ingest;
pub mod load;
pub mod parse;
pub mod staging;

pub use ingest::{ImportReport, IngestError, StageReport, import_osm_xml, stage_osm_xml};
pub use load::{
    BulkStore, CopySpec, LoadError, LoadReport, SqliteStore, SqliteStoreError, TableLoad,
    load_staged,
};
pub use parse::{ElementAttributes, EntitySink, OsmHandler, ParseError, ParseStats, read_osm_xml};
pub use staging::{
    ReconcileReport, StagedRows, StagingArea, StagingError, StagingTable, StagingWriter,
};
