//! Error types emitted by the Hydrograph CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use hydrograph_data::{IngestError, SqliteStoreError, StagingError};
use thiserror::Error;

/// Errors emitted by the Hydrograph CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The log level is not one of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    #[error("unknown log level {value:?}")]
    InvalidLogLevel { value: String },
    /// A referenced input path does not exist on disk or is not a file.
    #[error("{field} path {path:?} does not exist or is not a file")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening the OSM XML input failed.
    #[error("failed to open OSM XML at {path:?}: {source}")]
    OpenInput {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The staging directory could not be prepared.
    #[error("failed to prepare staging directory: {source}")]
    PrepareStaging {
        #[source]
        source: StagingError,
    },
    /// Opening or initialising the SQLite database failed.
    #[error("failed to open database at {path:?}: {source}")]
    OpenStore {
        path: Utf8PathBuf,
        #[source]
        source: SqliteStoreError,
    },
    /// The import pipeline failed.
    #[error("import failed: {0}")]
    Import(#[from] IngestError),
    /// Serializing the import report failed.
    #[error("failed to serialize import report: {0}")]
    SerializeReport(#[source] serde_json::Error),
    /// Writing the import report failed.
    #[error("failed to write import report: {0}")]
    WriteReport(#[source] std::io::Error),
}
