//! Command-line interface for importing OSM XML extracts into the Hydrograph
//! store.
#![forbid(unsafe_code)]

mod error;

use std::{
    io::{self, BufRead, BufReader, Write},
    str::FromStr,
};

use bzip2::read::MultiBzDecoder;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use hydrograph_data::{ImportReport, SqliteStore, StagingArea, import_osm_xml};
use hydrograph_fs::{file_is_file, open_utf8_file};
use log::{LevelFilter, info};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use structured_logger::{Builder, json::new_writer};

pub use error::CliError;

const ARG_OSM_XML: &str = "osm-xml";
const ARG_DATABASE: &str = "database";
const ARG_STAGING_DIR: &str = "staging-dir";
const ARG_LOG_LEVEL: &str = "log-level";
const ENV_OSM_XML: &str = "HYDROGRAPH_CMDS_IMPORT_OSM_XML";
const ENV_DATABASE: &str = "HYDROGRAPH_CMDS_IMPORT_DATABASE";
const DEFAULT_STAGING_DIR: &str = "tmp";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Run the Hydrograph CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // `--help` and `--version` surface as errors that belong on stdout.
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => return Err(CliError::ArgumentParsing(err)),
    };
    match cli.command {
        Command::Import(args) => {
            let config = resolve_import_config(args)?;
            init_logging(config.log_level);
            let report = run_import(&config)?;
            write_report(&report, io::stdout().lock())?;
        }
    }
    Ok(())
}

fn resolve_import_config(args: ImportArgs) -> Result<ImportConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

fn init_logging(level: LevelFilter) {
    Builder::with_level(level.as_str())
        .with_target_writer("*", new_writer(io::stderr()))
        .init();
}

fn run_import(config: &ImportConfig) -> Result<ImportReport, CliError> {
    let area = StagingArea::prepare(config.staging_dir.clone())
        .map_err(|source| CliError::PrepareStaging { source })?;
    let mut store = SqliteStore::open(&config.database).map_err(|source| CliError::OpenStore {
        path: config.database.clone(),
        source,
    })?;
    store
        .initialise_schema()
        .map_err(|source| CliError::OpenStore {
            path: config.database.clone(),
            source,
        })?;

    info!("Importing {} into {}", config.osm_xml, config.database);
    let reader = open_input(&config.osm_xml)?;
    Ok(import_osm_xml(reader, &area, &mut store)?)
}

fn open_input(path: &Utf8Path) -> Result<Box<dyn BufRead>, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;
    if is_bz2(path) {
        Ok(Box::new(BufReader::new(MultiBzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub(crate) fn is_bz2(path: &Utf8Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("bz2"))
}

fn write_report<W: Write>(report: &ImportReport, mut out: W) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut out, report).map_err(CliError::SerializeReport)?;
    writeln!(out).map_err(CliError::WriteReport)
}

#[derive(Debug, Parser)]
#[command(
    name = "hydrograph",
    about = "Load river and boundary relations from OSM XML into a SQLite store",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Stage an OSM XML extract and bulk load it into the database.
    Import(ImportArgs),
}

/// CLI arguments for the `import` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Stage an OSM XML extract (optionally bzip2-compressed) as \
                 delimited rows, drop side streams, then load the rows into \
                 SQLite. Paths can come from CLI flags, configuration files, \
                 or environment variables.",
    about = "Import an OSM XML extract"
)]
#[ortho_config(prefix = "HYDROGRAPH")]
struct ImportArgs {
    /// Path to the OSM XML extract (`.osm` or `.osm.bz2`).
    #[arg(long = ARG_OSM_XML, value_name = "path")]
    #[serde(default)]
    osm_xml: Option<Utf8PathBuf>,
    /// Path to the SQLite database receiving the rows.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    database: Option<Utf8PathBuf>,
    /// Directory holding the staged files [default: tmp].
    #[arg(long = ARG_STAGING_DIR, value_name = "path")]
    #[serde(default)]
    staging_dir: Option<Utf8PathBuf>,
    /// Log level written to stderr [default: info].
    #[arg(long = ARG_LOG_LEVEL, value_name = "level")]
    #[serde(default)]
    log_level: Option<String>,
}

impl ImportArgs {
    fn into_config(self) -> Result<ImportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ImportConfig::try_from(merged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ImportConfig {
    osm_xml: Utf8PathBuf,
    database: Utf8PathBuf,
    staging_dir: Utf8PathBuf,
    log_level: LevelFilter,
}

impl ImportConfig {
    fn validate_sources(&self) -> Result<(), CliError> {
        match file_is_file(&self.osm_xml) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::MissingSourceFile {
                field: ARG_OSM_XML,
                path: self.osm_xml.clone(),
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field: ARG_OSM_XML,
                    path: self.osm_xml.clone(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field: ARG_OSM_XML,
                path: self.osm_xml.clone(),
                source,
            }),
        }
    }
}

impl TryFrom<ImportArgs> for ImportConfig {
    type Error = CliError;

    fn try_from(args: ImportArgs) -> Result<Self, Self::Error> {
        let osm_xml = args.osm_xml.ok_or(CliError::MissingArgument {
            field: ARG_OSM_XML,
            env: ENV_OSM_XML,
        })?;
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_DATABASE,
        })?;
        let staging_dir = args
            .staging_dir
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_STAGING_DIR));
        let level = args
            .log_level
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned());
        let log_level = LevelFilter::from_str(level.trim())
            .map_err(|_| CliError::InvalidLogLevel { value: level })?;
        Ok(Self {
            osm_xml,
            database,
            staging_dir,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests;
