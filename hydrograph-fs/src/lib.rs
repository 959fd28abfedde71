//! Capability-based filesystem helpers shared by the staging pipeline and CLI.
//!
//! Everything here resolves ambient paths through `cap-std` once, then works
//! relative to the returned [`fs_utf8::Dir`] handle so staged files are never
//! addressed by re-joining strings.
#![forbid(unsafe_code)]

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;

/// Open a UTF-8 file path using ambient authority.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Return whether a path exists and is a regular file.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    let parent = if parent.as_str().is_empty() {
        Utf8Path::new(".")
    } else {
        parent
    };
    let Some(name) = path.file_name() else {
        return Ok(false);
    };
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    match dir.metadata(name) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Open the directory at `path`, creating it (and any parents) when missing.
///
/// Fails with [`io::ErrorKind::NotADirectory`] when something other than a
/// directory already occupies the path; nothing is created in that case.
///
/// # Examples
/// ```
/// use camino::Utf8PathBuf;
/// use hydrograph_fs::prepare_dir;
///
/// let tmp = tempfile::tempdir().expect("create temp dir");
/// let root = Utf8PathBuf::from_path_buf(tmp.path().join("staging")).expect("utf-8 path");
/// let dir = prepare_dir(&root).expect("prepare staging dir");
/// dir.write("probe", b"ok").expect("write probe");
/// assert!(root.join("probe").is_file());
/// ```
pub fn prepare_dir(path: &Utf8Path) -> io::Result<fs_utf8::Dir> {
    let (base, relative) = base_dir_and_relative(path)?;
    if relative.as_str().is_empty() {
        return Ok(base);
    }

    match base.metadata(&relative) {
        Ok(meta) if meta.is_dir() => base.open_dir(&relative),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::NotADirectory,
            format!("{path} exists and is not a directory"),
        )),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            base.create_dir_all(&relative)?;
            base.open_dir(&relative)
        }
        Err(err) => Err(err),
    }
}

/// Atomically move `from` over `to` inside the same directory.
pub fn replace_file(dir: &fs_utf8::Dir, from: &str, to: &str) -> io::Result<()> {
    dir.rename(from, dir, to)
}

/// Remove `name` from `dir`, treating a missing file as success.
pub fn remove_if_exists(dir: &fs_utf8::Dir, name: &str) -> io::Result<()> {
    match dir.remove_file(name) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

/// Split `path` into an ambient base directory and the part below it.
///
/// Absolute paths are anchored at their root (or drive prefix on Windows);
/// relative paths are anchored at the current directory.
pub fn base_dir_and_relative(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let anchor = match path.components().next() {
        Some(Utf8Component::Prefix(_) | Utf8Component::RootDir) => {
            path.ancestors().last().unwrap_or(path)
        }
        _ => Utf8Path::new(""),
    };
    let relative = path
        .strip_prefix(anchor)
        .map_err(|_| io::Error::other(format!("cannot split {path} below {anchor}")))?;
    let base = if anchor.as_str().is_empty() {
        Utf8Path::new(".")
    } else {
        anchor
    };
    let dir = fs_utf8::Dir::open_ambient_dir(base, ambient_authority())?;
    Ok((dir, relative.to_path_buf()))
}
