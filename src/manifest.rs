//! Encrypted manifest of registered files
//!
//! The manifest maps each registered file's absolute path to the password
//! and tags it was encrypted with. On disk it is a single hex-armored
//! AES-GCM blob sealed under the session passphrase; in memory it is a
//! plain map. Every mutation that must survive the session goes through
//! `save`, which rewrites the backing file atomically.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{ErrorCategory, ErrorKind, Result, VaultError};
use crate::file_ops;
use crate::hexarmor;
use crate::paths;
use crate::sealcrypt;

/// Everything the vault remembers about one registered file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path of the encrypted file; doubles as the manifest key.
    pub filename: String,
    /// The generated password the file's contents were sealed under.
    pub password: String,
    /// Free-form labels attached at registration.
    pub tags: Vec<String>,
}

impl fmt::Debug for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRecord")
            .field("filename", &self.filename)
            .field("password", &"<redacted>")
            .field("tags", &self.tags)
            .finish()
    }
}

/// In-memory manifest bound to one backing file and one session passphrase.
#[derive(Debug)]
pub struct ManifestStore {
    path: PathBuf,
    passphrase: Zeroizing<Vec<u8>>,
    records: HashMap<String, FileRecord>,
}

impl ManifestStore {
    /// Create an empty store bound to `path`.
    ///
    /// The backing file is not touched until `load` or `save`.
    pub fn new(path: PathBuf, passphrase: &[u8]) -> Result<Self> {
        if passphrase.is_empty() {
            return Err(VaultError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidInput,
                "session passphrase must not be empty",
            ));
        }
        Ok(Self {
            path,
            passphrase: Zeroizing::new(passphrase.to_vec()),
            records: HashMap::new(),
        })
    }

    /// Load and decrypt the backing file, replacing the in-memory map.
    ///
    /// A missing backing file surfaces as `NotFound`; the caller decides
    /// whether that means "first run" or an error.
    pub fn load(&mut self) -> Result<()> {
        let armored = file_ops::read_all(&self.path)?;
        let blob = hexarmor::decode(&armored)
            .map_err(|e| e.with_context("manifest file is not valid armored data"))?;
        let serialized = sealcrypt::decrypt(&self.passphrase, &blob)
            .map_err(|e| e.with_context("cannot unlock vault"))?;
        let records: HashMap<String, FileRecord> =
            serde_json::from_slice(&serialized).map_err(|e| {
                VaultError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Malformed,
                    "manifest decrypted but does not parse as JSON",
                    e,
                )
            })?;
        self.records = records;
        Ok(())
    }

    /// Encrypt and atomically persist the in-memory map to the backing file.
    pub fn save(&self) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(&self.records).map_err(|e| {
            VaultError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Malformed,
                "failed to serialize manifest",
                e,
            )
        })?;
        let blob = sealcrypt::encrypt(&self.passphrase, &serialized)?;
        let armored = hexarmor::encode(&blob);
        file_ops::write_all(&self.path, armored.as_bytes())
            .map_err(|e| e.with_context(format!("failed to write {}", self.path.display())))
    }

    /// Insert a record, replacing any existing record with the same filename.
    pub fn add(&mut self, record: FileRecord) {
        self.records.insert(record.filename.clone(), record);
    }

    /// Look up a record by its filename key.
    pub fn get(&self, filename: &str) -> Result<&FileRecord> {
        self.records.get(filename).ok_or_else(|| {
            VaultError::with_kind(
                ErrorCategory::User,
                ErrorKind::NotFound,
                format!("{filename} is not registered in the vault"),
            )
        })
    }

    /// Apply `mutator` to the record stored under `filename`.
    ///
    /// If the mutator changes the record's filename the entry is re-keyed:
    /// the old key is removed and the record reinserted under the new one.
    /// Returns the updated record.
    pub fn update(
        &mut self,
        filename: &str,
        mutator: impl FnOnce(&mut FileRecord),
    ) -> Result<FileRecord> {
        let mut record = self.get(filename)?.clone();
        mutator(&mut record);

        if record.filename != filename {
            self.records.remove(filename);
        }
        self.records
            .insert(record.filename.clone(), record.clone());
        Ok(record)
    }

    /// Remove a record; absent keys are a no-op.
    pub fn delete(&mut self, filename: &str) {
        self.records.remove(filename);
    }

    /// Whether `filename` is registered.
    pub fn contains(&self, filename: &str) -> bool {
        self.records.contains_key(filename)
    }

    /// Base names of every registered file, for display.
    pub fn list_names(&self) -> Vec<String> {
        self.records
            .keys()
            .map(|k| paths::base_name(std::path::Path::new(k)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn record(filename: &str) -> FileRecord {
        FileRecord {
            filename: filename.to_string(),
            password: "pw".to_string(),
            tags: vec!["tag1".to_string()],
        }
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        let err = ManifestStore::new(PathBuf::from("/tmp/x"), b"").expect_err("expected rejection");
        assert_eq!(err.kind, Some(ErrorKind::InvalidInput));
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let mut store =
            ManifestStore::new(temp_dir.path().join("manifest"), b"session").unwrap();
        let err = store.load().expect_err("expected not found");
        assert_eq!(err.kind, Some(ErrorKind::NotFound));
    }

    #[test]
    fn test_save_load_identity() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("manifest");

        let mut store = ManifestStore::new(path.clone(), b"session").unwrap();
        store.add(record("/a/one.txt"));
        store.add(record("/b/two.txt"));
        store.save().unwrap();

        let mut reloaded = ManifestStore::new(path, b"session").unwrap();
        reloaded.load().unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("/a/one.txt").unwrap(), &record("/a/one.txt"));
        assert_eq!(reloaded.get("/b/two.txt").unwrap(), &record("/b/two.txt"));
    }

    #[test]
    fn test_backing_file_is_armored_ciphertext() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("manifest");

        let mut store = ManifestStore::new(path.clone(), b"session").unwrap();
        store.add(record("/a/secret-name.txt"));
        store.save().unwrap();

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(on_disk.bytes().all(|b| b.is_ascii_hexdigit()));
        assert!(!on_disk.contains("secret-name"));
        assert!(!on_disk.contains("pw"));
    }

    #[test]
    fn test_load_wrong_passphrase() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("manifest");

        let mut store = ManifestStore::new(path.clone(), b"correct").unwrap();
        store.add(record("/a/one.txt"));
        store.save().unwrap();

        let mut other = ManifestStore::new(path, b"wrong").unwrap();
        let err = other.load().expect_err("expected authentication failure");
        assert_eq!(err.kind, Some(ErrorKind::AuthenticationFailed));
    }

    #[test]
    fn test_load_garbage_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("manifest");
        std::fs::write(&path, "not hex at all!").unwrap();

        let mut store = ManifestStore::new(path, b"session").unwrap();
        let err = store.load().expect_err("expected malformed input");
        assert_eq!(err.kind, Some(ErrorKind::Malformed));
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = ManifestStore::new(PathBuf::from("/tmp/x"), b"s").unwrap();
        let err = store.get("/nope").expect_err("expected not found");
        assert_eq!(err.kind, Some(ErrorKind::NotFound));
    }

    #[test]
    fn test_update_in_place() {
        let mut store = ManifestStore::new(PathBuf::from("/tmp/x"), b"s").unwrap();
        store.add(record("/a/one.txt"));

        let updated = store
            .update("/a/one.txt", |r| r.tags = vec!["new".to_string()])
            .unwrap();
        assert_eq!(updated.tags, vec!["new".to_string()]);
        assert_eq!(store.get("/a/one.txt").unwrap().tags, vec!["new".to_string()]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_rekeys_on_rename() {
        let mut store = ManifestStore::new(PathBuf::from("/tmp/x"), b"s").unwrap();
        store.add(record("/a/old.txt"));

        let updated = store
            .update("/a/old.txt", |r| r.filename = "/a/new.txt".to_string())
            .unwrap();
        assert_eq!(updated.filename, "/a/new.txt");
        assert_eq!(store.len(), 1);
        assert!(store.contains("/a/new.txt"));
        assert!(!store.contains("/a/old.txt"));
        assert_eq!(store.get("/a/new.txt").unwrap().password, "pw");
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let mut store = ManifestStore::new(PathBuf::from("/tmp/x"), b"s").unwrap();
        let err = store
            .update("/nope", |_| {})
            .expect_err("expected not found");
        assert_eq!(err.kind, Some(ErrorKind::NotFound));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = ManifestStore::new(PathBuf::from("/tmp/x"), b"s").unwrap();
        store.add(record("/a/one.txt"));

        store.delete("/a/one.txt");
        assert!(store.is_empty());
        store.delete("/a/one.txt");
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_names_are_base_names() {
        let mut store = ManifestStore::new(PathBuf::from("/tmp/x"), b"s").unwrap();
        store.add(record("/a/one.txt"));
        store.add(record("/deep/nested/two.txt"));

        let mut names = store.list_names();
        names.sort();
        assert_eq!(names, vec!["one.txt", "two.txt"]);
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", record("/a/one.txt"));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("pw"));
    }
}
