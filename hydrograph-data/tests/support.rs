use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Directory containing the OSM XML fixtures.
pub fn fixtures_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Read a fixture document by stem.
pub fn read_fixture(stem: &str) -> String {
    let path = fixtures_dir().join(format!("{stem}.osm"));
    fs::read_to_string(&path).unwrap_or_else(|err| {
        panic!("failed to read fixture {path}: {err}");
    })
}

/// Lines of a staged file.
pub fn staged_lines(root: &Utf8Path, file_name: &str) -> Vec<String> {
    let path = root.join(file_name);
    fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read staged file {path}: {err}"))
        .lines()
        .map(str::to_owned)
        .collect()
}
