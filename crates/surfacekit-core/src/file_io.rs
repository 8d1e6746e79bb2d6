//! File I/O helpers used at the pipeline boundary.
//!
//! Reads report failures as [`Error::IoFailure`] carrying the path. Writes go
//! through a temporary file in the destination directory that is persisted
//! only once everything has been written, so a failed run never leaves a
//! truncated output behind.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Read a whole text file
pub fn read_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Atomically replace `path` with `contents`
pub fn write_atomic(path: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
    write_atomic_with(path, |writer| writer.write_all(contents))
}

/// Atomically replace `path` with whatever `write` produces.
///
/// The callback writes into a buffered temporary file. If it fails, the
/// temporary file is discarded and the destination is left untouched.
pub fn write_atomic_with<F>(path: impl AsRef<Path>, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> std::io::Result<()>,
{
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(path, e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer).map_err(|e| Error::io(path, e))?;
        writer.flush().map_err(|e| Error::io(path, e))?;
    }
    tmp.as_file().sync_all().map_err(|e| Error::io(path, e))?;
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;

    tracing::debug!("Wrote {}", path.display());
    Ok(())
}
