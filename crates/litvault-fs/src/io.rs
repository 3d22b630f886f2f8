//! Atomic I/O with file locking
//!
//! Status files are written with a write-to-temp-then-rename strategy under
//! an advisory lock, so a crash mid-write can never leave a half-written
//! file behind.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use fs2::FileExt;

use crate::{Error, Result};

/// Write content atomically to a file with locking.
///
/// Ensures the parent directory exists, writes to a temp file in the same
/// directory (same filesystem, so the final rename is atomic), then renames
/// over the target.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file
        .sync_all()
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

    Ok(())
}

/// Read a file to a string under a shared lock.
///
/// Reading through the locked handle avoids a TOCTOU race against a
/// concurrent atomic write.
pub fn read_locked(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    file.lock_shared().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    let mut content = String::new();
    (&file)
        .read_to_string(&mut content)
        .map_err(|e| Error::io(path, e))?;

    // Lock released when file is dropped
    Ok(content)
}
