use std::path::{Path, PathBuf};

use eyre::Result;

/// How to handle an existing file at the target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overwrite {
    /// Always overwrite (generated artifacts).
    Always,
    /// Only create if the file doesn't exist.
    IfMissing,
}

/// Result of a write operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written.
    Written,
    /// File was skipped (already exists).
    Skipped,
}

/// An output file to be written to disk.
pub struct File {
    path: PathBuf,
    content: Vec<u8>,
    overwrite: Overwrite,
}

impl File {
    /// Create a new file with the given path and content (always overwritten).
    pub fn new(path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            overwrite: Overwrite::Always,
        }
    }

    /// Only write the file if nothing exists at the target path yet.
    pub fn if_missing(mut self) -> Self {
        self.overwrite = Overwrite::IfMissing;
        self
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the file content.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Write the file according to its overwrite rule, creating parent
    /// directories as needed.
    pub fn write(&self) -> Result<WriteResult> {
        if self.overwrite == Overwrite::IfMissing && self.path.exists() {
            return Ok(WriteResult::Skipped);
        }
        write_file(&self.path, &self.content)?;
        Ok(WriteResult::Written)
    }
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
