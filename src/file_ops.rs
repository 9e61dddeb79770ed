//! Low-level file reads and atomic writes
//!
//! All vault writes go through `write_all`, which stages the new content
//! in a tempfile in the target's directory, fsyncs it, and renames it
//! over the target. Either the old file or the complete new file exists
//! on disk, never a partial one. Files are created with mode 0o600 on
//! Unix so encrypted blobs and the manifest stay owner-only.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{ErrorCategory, ErrorKind, Result, VaultError};

/// Read the entire contents of a file.
///
/// A missing file is a user-visible condition (`NotFound`); any other
/// I/O failure is reported as internal.
pub fn read_all(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| read_error(path, e))
}

/// Atomically replace `path` with `contents`.
///
/// Writes to a tempfile in the same directory, flushes and fsyncs it,
/// sets mode 0o600 on Unix, then renames over the target.
pub fn write_all(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().ok_or_else(|| {
        VaultError::with_kind(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("{} has no parent directory", path.display()),
        )
    })?;
    // Path::parent returns Some("") for bare relative filenames.
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };

    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        VaultError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to create tempfile",
            e,
        )
    })?;

    temp_file.write_all(contents).map_err(|e| {
        VaultError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to write to tempfile",
            e,
        )
    })?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file.flush().map_err(|e| {
        VaultError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to flush tempfile",
            e,
        )
    })?;
    temp_file.as_file().sync_all().map_err(|e| {
        VaultError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = temp_file
            .as_file()
            .metadata()
            .map_err(|e| {
                VaultError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to get tempfile metadata",
                    e,
                )
            })?
            .permissions();
        perms.set_mode(0o600);
        temp_file.as_file().set_permissions(perms).map_err(|e| {
            VaultError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to set tempfile permissions",
                e,
            )
        })?;
    }

    temp_file.persist(path).map_err(|e| {
        VaultError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

fn read_error(path: &Path, err: io::Error) -> VaultError {
    let (category, kind) = if err.kind() == io::ErrorKind::NotFound {
        (ErrorCategory::User, ErrorKind::NotFound)
    } else {
        (ErrorCategory::Internal, ErrorKind::Io)
    };
    VaultError::with_kind_and_source(
        category,
        kind,
        format!("failed to read from {}", path.display()),
        err,
    )
}
