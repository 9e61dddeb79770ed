//! Vault sessions
//!
//! A `Vault` is one exclusive session over a manifest: it holds the
//! advisory lock, the decrypted manifest, and the session passphrase for
//! as long as it is alive. All file-level operations (register, read
//! back, restore, relabel) live here; the per-module building blocks do
//! not touch the manifest on their own.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{ErrorCategory, ErrorKind, Result, VaultError};
use crate::file_ops;
use crate::hexarmor;
use crate::lock::VaultLock;
use crate::manifest::{FileRecord, ManifestStore};
use crate::password;
use crate::paths;
use crate::sealcrypt;

#[derive(Debug)]
pub struct Vault {
    store: ManifestStore,
    _lock: VaultLock,
}

impl Vault {
    /// Open a session over the manifest at `manifest_path`.
    ///
    /// Acquires the advisory lock, then loads and decrypts the manifest.
    /// A missing manifest file means a fresh vault and starts empty; a
    /// manifest that fails authentication refuses the session.
    pub fn open(manifest_path: &Path, passphrase: &[u8]) -> Result<Self> {
        if passphrase.is_empty() {
            return Err(VaultError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidInput,
                "session passphrase must not be empty",
            ));
        }

        let lock = VaultLock::acquire(&lock_path(manifest_path))?;

        let mut store = ManifestStore::new(manifest_path.to_path_buf(), passphrase)?;
        match store.load() {
            Ok(()) => {}
            Err(e) if e.kind == Some(ErrorKind::NotFound) => {}
            Err(e) => return Err(e),
        }

        Ok(Self { store, _lock: lock })
    }

    /// Register a file: encrypt it in place under a fresh generated
    /// password and record the password and tags in the manifest.
    ///
    /// Refuses files that are already registered, since re-encrypting
    /// would overwrite the only ciphertext recoverable with the stored
    /// password.
    pub fn add_and_encrypt(&mut self, path: &Path, tags: Vec<String>) -> Result<FileRecord> {
        let abs = paths::resolve(path)?;
        let key = abs.to_string_lossy().into_owned();

        if self.store.contains(&key) {
            return Err(VaultError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidInput,
                format!("{key} is already registered in the vault"),
            ));
        }

        let file_password = password::generate();
        let plaintext = file_ops::read_all(&abs)?;
        let blob = sealcrypt::encrypt(file_password.as_bytes(), &plaintext)?;
        let armored = hexarmor::encode(&blob);
        file_ops::write_all(&abs, armored.as_bytes())?;

        let record = FileRecord {
            filename: key,
            password: file_password,
            tags,
        };
        self.store.add(record.clone());
        self.save_after_file_mutation()?;
        Ok(record)
    }

    /// Decrypt a registered file and return its plaintext without
    /// touching the file on disk.
    pub fn decrypt_read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs = paths::resolve(path)?;
        let record = self.store.get(&abs.to_string_lossy())?;

        let armored = file_ops::read_all(&abs)?;
        let blob = hexarmor::decode(&armored)
            .map_err(|e| e.with_context(format!("{} is not an encrypted file", abs.display())))?;
        sealcrypt::decrypt(record.password.as_bytes(), &blob)
            .map_err(|e| e.with_context(format!("failed to decrypt {}", abs.display())))
    }

    /// Decrypt a registered file back to plaintext on disk and drop its
    /// record from the manifest.
    ///
    /// The file is restored before the record is removed, so a failed
    /// decryption leaves everything untouched.
    pub fn decrypt_restore(&mut self, path: &Path) -> Result<()> {
        let abs = paths::resolve(path)?;
        let key = abs.to_string_lossy().into_owned();

        let plaintext = self.decrypt_read(&abs)?;
        file_ops::write_all(&abs, &plaintext)?;

        self.store.delete(&key);
        self.save_after_file_mutation()
    }

    /// Change a registered file's manifest entry: new filename, new tags,
    /// or both.
    ///
    /// Renames are metadata-only; the file on disk is not moved.
    pub fn update_metadata(
        &mut self,
        path: &Path,
        new_filename: Option<&Path>,
        new_tags: Option<Vec<String>>,
    ) -> Result<FileRecord> {
        let abs = paths::resolve(path)?;
        let new_key = match new_filename {
            Some(p) => Some(paths::resolve(p)?.to_string_lossy().into_owned()),
            None => None,
        };

        let updated = self.store.update(&abs.to_string_lossy(), |record| {
            if let Some(key) = new_key {
                record.filename = key;
            }
            if let Some(tags) = new_tags {
                record.tags = tags;
            }
        })?;
        self.store.save()?;
        Ok(updated)
    }

    /// Base names of every registered file.
    pub fn list_names(&self) -> Vec<String> {
        self.store.list_names()
    }

    /// Tags recorded for a registered file.
    pub fn tags(&self, path: &Path) -> Result<Vec<String>> {
        let abs = paths::resolve(path)?;
        Ok(self.store.get(&abs.to_string_lossy())?.tags.clone())
    }

    /// Persist the manifest after a target file was already mutated.
    ///
    /// At this point the file on disk and the old manifest disagree, so a
    /// failed save is flagged `ManifestInconsistent` rather than plain Io.
    fn save_after_file_mutation(&self) -> Result<()> {
        self.store.save().map_err(|e| {
            VaultError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::ManifestInconsistent,
                "file was rewritten but the manifest could not be saved; \
                 on-disk state and manifest now disagree",
                e,
            )
        })
    }
}

fn lock_path(manifest_path: &Path) -> PathBuf {
    let mut p = OsString::from(manifest_path.as_os_str());
    p.push(".lock");
    PathBuf::from(p)
}
