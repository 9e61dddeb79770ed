//! Advisory vault lock
//!
//! A sidecar lock file next to the manifest serializes sessions. The lock
//! is advisory and process-scoped: acquiring it takes an exclusive OS
//! file lock that is released on drop or when the process exits, so a
//! crashed session never leaves the vault permanently locked.

use std::fs::{File, OpenOptions, TryLockError};
use std::path::Path;

use crate::error::{ErrorCategory, ErrorKind, Result, VaultError};

/// Holds an exclusive lock on the vault for as long as it is alive.
#[derive(Debug)]
pub struct VaultLock {
    file: File,
}

impl VaultLock {
    /// Acquire the lock at `path`, failing immediately if another
    /// session already holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                VaultError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to open lock file {}", path.display()),
                    e,
                )
            })?;

        match file.try_lock() {
            Ok(()) => Ok(Self { file }),
            Err(TryLockError::WouldBlock) => Err(VaultError::with_kind(
                ErrorCategory::User,
                ErrorKind::LockUnavailable,
                "another session holds the vault lock",
            )),
            Err(TryLockError::Error(e)) => Err(VaultError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to lock {}", path.display()),
                e,
            )),
        }
    }
}

impl Drop for VaultLock {
    fn drop(&mut self) {
        // Dropping the file handle releases the OS lock anyway; unlock
        // explicitly so release is not deferred to process teardown.
        let _ = self.file.unlock();
    }
}
