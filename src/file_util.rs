//! In-process archiving and recursive copying.

use crate::item::Password;
use anyhow::{Context, Result, bail};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{AesMode, CompressionMethod, ZipWriter};

/// Entry counts for one recursive copy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyReport {
    pub files: usize,
    pub dirs: usize,
    /// Entries that could not be read or written and were passed over.
    pub skipped: usize,
}

/// Writes `src` (file or directory) into a new zip file at `dest`.
///
/// Entry names keep the source's own name as their first component, so
/// `/home/me/docs/a.txt` is stored as `docs/a.txt`. Every entry is deflated with
/// `level`, or stored as is for level 0, and encrypted with AES-256 when
/// `password` is given. When `dest` is written inside `src`, the folder holding
/// it is left out of the archive.
pub fn zip_source(src: &Path, dest: &Path, level: i64, password: Option<&Password>) -> Result<()> {
    if !src.exists() {
        bail!("The path '{}' does not exist", src.display());
    }
    if !src.is_dir() && !src.is_file() {
        bail!("Does not support compression except for files and directories");
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(dest).with_context(|| format!("Cannot create '{}'", dest.display()))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let base = if level == 0 {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .compression_level(None)
    } else {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(level))
    };
    let options = match password {
        Some(pw) => base.with_aes_encryption(AesMode::Aes256, pw.expose()),
        None => base,
    };

    let prefix = src.parent().unwrap_or_else(|| Path::new(""));
    let output = dest
        .parent()
        .and_then(|dir| nested_in(src, dir))
        .or_else(|| nested_in(src, dest));
    let walk = WalkDir::new(src)
        .into_iter()
        .filter_entry(|e| e.path() != dest && Some(e.path()) != output.as_deref());
    for entry in walk {
        let entry = entry?;
        let path = entry.path();
        let name = path.strip_prefix(prefix)?.to_string_lossy().replace('\\', "/");
        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else {
            zip.start_file(name, options)?;
            let mut f = File::open(path)?;
            io::copy(&mut f, &mut zip)?;
        }
    }
    zip.finish()?;
    Ok(())
}

/// Copies the contents of `src` into `dest`, creating `dest` first.
///
/// Empty directories are recreated, existing files are overwritten even when
/// read-only, and entries that fail are logged and counted instead of aborting
/// the copy. A file `src` is copied into `dest` under its own name. When `dest`
/// lies inside `src` it is not copied into itself.
///
/// # Errors
/// Only when `src` cannot be read at all or `dest` cannot be created.
pub fn copy_tree(src: &Path, dest: &Path) -> io::Result<CopyReport> {
    let meta = fs::metadata(src)?;
    fs::create_dir_all(dest)?;
    let mut report = CopyReport::default();

    if meta.is_file() {
        let file_name = src.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "Invalid file name")
        })?;
        copy_file(src, &dest.join(file_name))?;
        report.files = 1;
        return Ok(report);
    }

    let output = nested_in(src, dest);
    let walk = WalkDir::new(src)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| Some(e.path()) != output.as_deref());
    for entry in walk {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                report.skipped += 1;
                continue;
            }
        };
        let Ok(rel) = entry.path().strip_prefix(src) else {
            report.skipped += 1;
            continue;
        };
        let target = dest.join(rel);
        let is_dir = entry.file_type().is_dir();
        let res = if is_dir {
            fs::create_dir_all(&target)
        } else {
            copy_file(entry.path(), &target)
        };
        match res {
            Ok(()) if is_dir => report.dirs += 1,
            Ok(()) => report.files += 1,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "skipping entry");
                report.skipped += 1;
            }
        }
    }
    debug!(?report, "copy finished");
    Ok(report)
}

/// `inner` as a path under `src` as the walk reports it, if `inner` lies strictly
/// inside `src`. Both paths must exist.
fn nested_in(src: &Path, inner: &Path) -> Option<PathBuf> {
    let src_abs = src.canonicalize().ok()?;
    let inner_abs = inner.canonicalize().ok()?;
    let rel = inner_abs.strip_prefix(&src_abs).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    Some(src.join(rel))
}

/// Copies one file, replacing `target` even if it is read-only.
#[allow(clippy::permissions_set_readonly_false)]
fn copy_file(src: &Path, target: &Path) -> io::Result<()> {
    if let Ok(meta) = fs::metadata(target) {
        let mut perms = meta.permissions();
        if perms.readonly() {
            perms.set_readonly(false);
            fs::set_permissions(target, perms)?;
        }
    }
    if let Some(parent) = target.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::copy(src, target)?;
    Ok(())
}
