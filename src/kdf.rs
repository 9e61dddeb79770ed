//! Key derivation from a session or per-file passphrase
//!
//! PBKDF2-HMAC-SHA256 with a fixed iteration count. The salt travels with
//! every ciphertext, so the parameters here are frozen: changing them
//! breaks decryption of previously written data (the format carries no
//! version header).

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{ErrorCategory, ErrorKind, Result, VaultError};

/// Length of salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of derived key in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count
const PBKDF2_ROUNDS: u32 = 4096;

/// Derive a 32-byte key from a passphrase and salt.
///
/// The returned key is wrapped in `Zeroizing` so it is wiped from memory
/// when dropped. An empty passphrase is rejected before any hashing.
pub fn derive(passphrase: &[u8], salt: &[u8; SALT_LEN]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if passphrase.is_empty() {
        return Err(VaultError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidInput,
            "passphrase must not be empty",
        ));
    }

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(passphrase, salt, PBKDF2_ROUNDS, key.as_mut_slice());

    Ok(key)
}

/// Generate a fresh random salt.
pub fn random_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}
