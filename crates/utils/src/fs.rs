//! Filesystem helpers for mirroring one directory tree into another.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Collects every regular file below `root`.
///
/// Entries are sorted by name at each directory level, so the returned order is stable across
/// runs and platforms.
pub fn walk_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = vec![];
    collect_files(root, &mut files)?;
    Ok(files)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else if path.is_file() {
            files.push(path);
        } else {
            trace!("skipping non-regular entry: {:?}", path);
        }
    }

    Ok(())
}

/// Maps `file`, located below `input_root`, to the same relative location below `output_root`.
///
/// Returns `None` if `file` does not live under `input_root`.
pub fn mirror_path(file: &Path, input_root: &Path, output_root: &Path) -> Option<PathBuf> {
    file.strip_prefix(input_root).ok().map(|relative| output_root.join(relative))
}

/// Writes `bytes` to `path`, creating missing parent directories first.
pub fn write_creating_dirs(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)
}
