//! Facade crate for the Hydrograph river and boundary store.
//!
//! This crate re-exports the entity model and, behind the `pipeline` feature,
//! the streaming OSM XML import pipeline with its SQLite store.

#![forbid(unsafe_code)]

pub use hydrograph_core::{
    EntityError, MemberRole, Node, OsmId, Relation, RelationType, SRID, Way, WayType,
};

#[cfg(feature = "pipeline")]
pub use hydrograph_data::{
    BulkStore, ImportReport, IngestError, LoadReport, ParseError, SqliteStore, SqliteStoreError,
    StagingArea, StagingError, StagingTable, import_osm_xml, stage_osm_xml,
};
