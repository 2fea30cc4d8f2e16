//! Staged file writes for publication.
//!
//! A write happens in two phases:
//! 1. Stage: write to a temp file beside the target and fsync it
//! 2. Commit: rename the temp file over the target
//!
//! A staged file that is dropped without being committed is removed, so a
//! failed multi-file publish leaves no debris behind.

use crate::error::{CollbankError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::NamedTempFile;
use tracing::debug;

/// Contents written and synced next to `target`, not yet visible there.
#[derive(Debug)]
pub struct StagedFile {
    target: PathBuf,
    temp: NamedTempFile,
}

impl StagedFile {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Rename the staged contents over the target.
    pub fn commit(self) -> Result<PathBuf> {
        let StagedFile { target, temp } = self;
        temp.persist(&target).map_err(|e| CollbankError::Publish {
            message: format!("Failed to rename into {}: {}", target.display(), e.error),
            path: Some(target.clone()),
        })?;
        debug!("Committed {}", target.display());
        Ok(target)
    }

    /// Set the staged file's modification time, then commit it.
    ///
    /// The rename keeps the time, so the target never shows a clock
    /// reading older than `modified`.
    pub fn commit_stamped(self, modified: SystemTime) -> Result<PathBuf> {
        self.temp
            .as_file()
            .set_modified(modified)
            .map_err(|e| CollbankError::Io {
                message: format!("Failed to stamp {}", self.temp.path().display()),
                path: Some(self.target.clone()),
                source: Some(e),
            })?;
        self.commit()
    }
}

/// Write `contents` to a temp file in the target's directory and fsync it.
pub fn stage(target: &Path, contents: &[u8]) -> Result<StagedFile> {
    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| CollbankError::Io {
            message: format!("Failed to create directory {}", parent.display()),
            path: Some(parent.to_path_buf()),
            source: Some(e),
        })?;
    }

    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{}.", file_name))
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| CollbankError::Io {
            message: format!("Failed to create temp file in {}", parent.display()),
            path: Some(parent.to_path_buf()),
            source: Some(e),
        })?;

    let staged_path = temp.path().to_path_buf();
    let io_err = |e: std::io::Error| CollbankError::Io {
        message: format!("Failed to write temp file {}", staged_path.display()),
        path: Some(staged_path.clone()),
        source: Some(e),
    };
    temp.write_all(contents).map_err(io_err)?;
    temp.flush().map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;

    Ok(StagedFile {
        target: target.to_path_buf(),
        temp,
    })
}

/// Stage and commit a single file.
pub fn atomic_write(target: &Path, contents: &[u8]) -> Result<()> {
    stage(target, contents)?.commit()?;
    Ok(())
}
