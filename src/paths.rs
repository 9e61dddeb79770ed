//! Path normalization for manifest keys
//!
//! Files are keyed in the manifest by absolute path, so the same file is
//! found no matter which directory a session runs from. Normalization is
//! purely lexical after anchoring to the current directory; symlinks are
//! not resolved and the file need not exist yet.

use std::path::{Path, PathBuf};

use crate::error::{ErrorCategory, ErrorKind, Result, VaultError};

/// Resolve a path to its absolute form.
pub fn resolve(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| {
        VaultError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("cannot resolve path {}", path.display()),
            e,
        )
    })
}

/// The base file name of a path, for display in listings.
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path_unchanged() {
        let p = Path::new("/tmp/some/file.txt");
        assert_eq!(resolve(p).unwrap(), p);
    }

    #[test]
    fn test_relative_path_anchored() {
        let resolved = resolve(Path::new("notes.txt")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("notes.txt"));
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name(Path::new("/a/b/c.txt")), "c.txt");
        assert_eq!(base_name(Path::new("plain.txt")), "plain.txt");
    }
}
