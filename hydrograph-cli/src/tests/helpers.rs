//! Test helpers for composing import datasets and layered overrides.

use super::*;
use bzip2::{Compression, write::BzEncoder};
use std::fs;
use tempfile::TempDir;

/// A small basin: two nodes, one way, two rivers (one a side stream of the
/// other) and a commune boundary.
pub(super) const BASIN_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="1" lon="3.5650" lat="47.7986"/>
  <node id="2" lon="3.5714" lat="47.8012"/>
  <way id="10">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="bridge" v="yes"/>
  </way>
  <relation id="100">
    <member type="way" ref="10" role=""/>
    <tag k="type" v="waterway"/>
    <tag k="waterway" v="river"/>
    <tag k="name" v="Yonne"/>
  </relation>
  <relation id="101">
    <member type="relation" ref="100" role="side_stream"/>
    <tag k="type" v="waterway"/>
    <tag k="waterway" v="stream"/>
    <tag k="name" v="Ru de Baulches"/>
  </relation>
  <relation id="300">
    <tag k="boundary" v="administrative"/>
    <tag k="admin_level" v="8"/>
    <tag k="name" v="Auxerre"/>
  </relation>
</osm>
"#;

#[derive(Debug, Clone, Default)]
pub(super) struct LayerOverrides {
    pub(super) osm_xml: Option<Utf8PathBuf>,
    pub(super) database: Option<Utf8PathBuf>,
    pub(super) staging_dir: Option<Utf8PathBuf>,
}

/// Temporary directory holding import inputs and outputs.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    /// Write `contents` as a plain OSM XML file.
    pub(super) fn write_xml(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).expect("write OSM XML");
        path
    }

    /// Write `contents` as a bzip2-compressed OSM XML file.
    pub(super) fn write_bz2(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.path(name);
        let file = fs::File::create(&path).expect("create compressed fixture");
        let mut encoder = BzEncoder::new(file, Compression::best());
        encoder
            .write_all(contents.as_bytes())
            .expect("compress OSM XML");
        encoder.finish().expect("finish bzip2 stream");
        path
    }

    /// Import configuration writing everything inside the workspace.
    pub(super) fn config(&self, osm_xml: Utf8PathBuf) -> ImportConfig {
        ImportConfig {
            osm_xml,
            database: self.path("hydrograph.db"),
            staging_dir: self.path("tmp"),
            log_level: LevelFilter::Info,
        }
    }
}

/// Input files for configuration-layering scenarios.
#[derive(Debug)]
pub(super) struct DatasetFiles {
    workspace: Workspace,
    cli_osm: Utf8PathBuf,
    config_osm: Utf8PathBuf,
}

impl DatasetFiles {
    pub(super) fn new() -> Self {
        let workspace = Workspace::new();
        let cli_osm = workspace.write_xml("cli.osm", BASIN_XML);
        let config_osm = workspace.write_xml("config.osm", BASIN_XML);
        Self {
            workspace,
            cli_osm,
            config_osm,
        }
    }

    pub(super) fn osm(&self) -> &Utf8Path {
        &self.cli_osm
    }

    pub(super) fn config_osm(&self) -> &Utf8Path {
        &self.config_osm
    }

    pub(super) fn cli_database(&self) -> Utf8PathBuf {
        self.workspace.path("cli.db")
    }

    pub(super) fn config_database(&self) -> Utf8PathBuf {
        self.workspace.path("config.db")
    }

    pub(super) fn env_database(&self) -> Utf8PathBuf {
        self.workspace.path("env.db")
    }

    pub(super) fn config_staging_dir(&self) -> Utf8PathBuf {
        self.workspace.path("config-staging")
    }
}

pub(super) fn merge_layers(
    mut cli_args: ImportArgs,
    file_layer: Option<LayerOverrides>,
    env_layer: Option<LayerOverrides>,
) -> Result<ImportConfig, CliError> {
    merge_field(
        &mut cli_args.osm_xml,
        extract_field(&env_layer, |layer| &layer.osm_xml),
        extract_field(&file_layer, |layer| &layer.osm_xml),
    );
    merge_field(
        &mut cli_args.database,
        extract_field(&env_layer, |layer| &layer.database),
        extract_field(&file_layer, |layer| &layer.database),
    );
    merge_field(
        &mut cli_args.staging_dir,
        extract_field(&env_layer, |layer| &layer.staging_dir),
        extract_field(&file_layer, |layer| &layer.staging_dir),
    );
    resolve_import_config(cli_args)
}

fn merge_field<T: Clone>(target: &mut Option<T>, env_value: Option<T>, file_value: Option<T>) {
    if target.is_none()
        && let Some(value) = env_value.or(file_value)
    {
        *target = Some(value);
    }
}

fn extract_field<T: Clone>(
    layer: &Option<LayerOverrides>,
    accessor: fn(&LayerOverrides) -> &Option<T>,
) -> Option<T> {
    layer.as_ref().and_then(|entry| accessor(entry).clone())
}
