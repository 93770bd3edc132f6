//! Filesystem helpers shared by the compressor: directory creation,
//! metadata-preserving copies and whole-subtree mirroring.

use std::fs;
use std::io;
use std::path::Path;

use filetime::FileTime;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{CompressError, Result};

/// Creates `dir` and any missing parents. An existing directory is fine.
pub fn create_directory(dir: &Path) -> Result<()> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(CompressError::io(dir, e)),
    }
}

/// Copies file content and permissions, then carries over the access and
/// modification times of `src`.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64> {
    let bytes = fs::copy(src, dst).map_err(|e| CompressError::io(src, e))?;
    let meta = fs::metadata(src).map_err(|e| CompressError::io(src, e))?;
    let atime = FileTime::from_last_access_time(&meta);
    let mtime = FileTime::from_last_modification_time(&meta);
    filetime::set_file_times(dst, atime, mtime).map_err(|e| CompressError::io(dst, e))?;
    Ok(bytes)
}

/// Mirrors the subtree at `src` into `dst`.
///
/// Symlinks are recreated rather than followed, so dangling links survive
/// the copy. Existing directories under `dst` are merged into and existing
/// files are overwritten. A directory equal to `exclude` is left out.
pub fn copy_tree(src: &Path, dst: &Path, exclude: Option<&Path>) -> Result<u64> {
    let mut files = 0u64;
    let walker = WalkDir::new(src)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| match exclude {
            Some(excluded) if e.file_type().is_dir() => !same_file(e.path(), excluded),
            _ => true,
        });
    for entry in walker {
        let entry = entry?;
        let rel = match entry.path().strip_prefix(src) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
            files += 1;
        } else if file_type.is_dir() {
            create_directory(&target)?;
        } else {
            copy_file(entry.path(), &target)?;
            files += 1;
        }
    }
    debug!(src = %src.display(), dst = %dst.display(), files, "Copied subtree");
    Ok(files)
}

fn copy_symlink(link: &Path, target: &Path) -> Result<()> {
    let points_to = fs::read_link(link).map_err(|e| CompressError::io(link, e))?;
    if fs::symlink_metadata(target).is_ok() {
        remove_existing(target)?;
    }
    make_symlink(link, &points_to, target).map_err(|e| CompressError::io(target, e))
}

fn remove_existing(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path).map_err(|e| CompressError::io(path, e))?;
    let res = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    res.map_err(|e| CompressError::io(path, e))
}

#[cfg(unix)]
fn make_symlink(_link: &Path, points_to: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(points_to, target)
}

#[cfg(windows)]
fn make_symlink(link: &Path, points_to: &Path, target: &Path) -> io::Result<()> {
    // Windows needs to know the link flavour up front; dangling links fall
    // back to file links.
    let is_dir = link
        .parent()
        .map(|parent| parent.join(points_to).is_dir())
        .unwrap_or(false);
    if is_dir {
        std::os::windows::fs::symlink_dir(points_to, target)
    } else {
        std::os::windows::fs::symlink_file(points_to, target)
    }
}

/// Whether two paths name the same existing filesystem object.
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
