//! Program file I/O
//!
//! Reads toolpath programs from disk and writes generated lines back,
//! atomically.

use std::fs;
use std::path::{Path, PathBuf};

use surfacekit_core::{read_text, write_atomic_with, Error, Result};

use crate::command::CommandSequence;
use crate::parser::GcodeParser;

/// Files above this size are still read, with a warning
const LARGE_FILE_WARNING_BYTES: u64 = 64 * 1024 * 1024;

/// G-Code file reader
#[derive(Debug, Clone)]
pub struct GcodeFileReader {
    path: PathBuf,
    file_size: u64,
}

impl GcodeFileReader {
    /// Open a reader for `path`, failing if it is not a readable file
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|e| Error::io(path, e))?;
        if !metadata.is_file() {
            return Err(Error::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        let file_size = metadata.len();
        if file_size > LARGE_FILE_WARNING_BYTES {
            tracing::warn!(
                "{} is {} bytes, parsing may take a while",
                path.display(),
                file_size
            );
        }

        Ok(Self {
            path: path.to_path_buf(),
            file_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Read the raw program text
    pub fn read_all(&self) -> Result<String> {
        read_text(&self.path)
    }

    /// Read and parse the program
    pub fn read_program(&self, parser: &GcodeParser) -> Result<CommandSequence> {
        let text = self.read_all()?;
        let sequence = parser.parse(&text);
        tracing::info!(
            "Loaded {} ({} lines)",
            self.path.display(),
            sequence.len()
        );
        Ok(sequence)
    }
}

/// Atomically write `lines` to `path`, one per line
pub fn write_program<S: AsRef<str>>(path: impl AsRef<Path>, lines: &[S]) -> Result<()> {
    write_atomic_with(path, |writer| {
        use std::io::Write;
        for line in lines {
            writer.write_all(line.as_ref().as_bytes())?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    })
}
