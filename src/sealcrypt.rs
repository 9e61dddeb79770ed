//! Encryption/decryption using PBKDF2 + AES-256-GCM
//!
//! This module implements password-based authenticated encryption using:
//! - PBKDF2-HMAC-SHA256 for key derivation from a passphrase
//! - AES-256-GCM for authenticated encryption
//!
//! The binary format is:
//! - salt: 16 bytes
//! - nonce: 12 bytes
//! - sealed bytes: variable length (ciphertext plus 16-byte GCM tag)

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{ErrorCategory, ErrorKind, Result, VaultError};
use crate::kdf::{self, SALT_LEN};

/// Length of nonce in bytes (the GCM standard 96-bit nonce)
pub const NONCE_LEN: usize = 12;

/// Length of the GCM authentication tag in bytes
const TAG_LEN: usize = 16;

/// Encrypt plaintext with a passphrase using random salt and nonce
///
/// Returns the binary format: salt(16) + nonce(12) + sealed(variable)
pub fn encrypt(passphrase: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let salt = kdf::random_salt();

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    encrypt_deterministic(passphrase, plaintext, &salt, &nonce)
}

/// Encrypt plaintext with a passphrase using provided salt and nonce
///
/// This function is ONLY for testing purposes to generate deterministic
/// output. NEVER use this in production - always use `encrypt()` which
/// generates random salt/nonce. Nonce reuse under AES-GCM breaks both
/// confidentiality and integrity.
pub fn encrypt_deterministic(
    passphrase: &[u8],
    plaintext: &[u8],
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    let key = kdf::derive(passphrase, salt)?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));
    let nonce_obj = Nonce::from(*nonce);
    let sealed = cipher.encrypt(&nonce_obj, plaintext).map_err(|_| {
        VaultError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::SealFailure,
            "encryption failed",
        )
    })?;

    let mut output = Vec::with_capacity(SALT_LEN + NONCE_LEN + sealed.len());
    output.extend_from_slice(salt);
    output.extend_from_slice(nonce);
    output.extend_from_slice(&sealed);

    Ok(output)
}

/// Decrypt ciphertext with a passphrase
pub fn decrypt(passphrase: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let mut pos = 0;

    if ciphertext.len() < pos + SALT_LEN {
        return Err(malformed("input likely truncated while reading salt"));
    }
    let salt: [u8; SALT_LEN] = ciphertext[pos..pos + SALT_LEN]
        .try_into()
        .map_err(|_| malformed("failed to read salt"))?;
    pos += SALT_LEN;

    if ciphertext.len() < pos + NONCE_LEN {
        return Err(malformed("input likely truncated while reading nonce"));
    }
    let nonce: [u8; NONCE_LEN] = ciphertext[pos..pos + NONCE_LEN]
        .try_into()
        .map_err(|_| malformed("failed to read nonce"))?;
    pos += NONCE_LEN;

    let sealed = &ciphertext[pos..];
    if sealed.len() < TAG_LEN {
        return Err(malformed(
            "input likely truncated while reading sealed bytes",
        ));
    }

    let key = kdf::derive(passphrase, &salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));
    let nonce_obj = Nonce::from(nonce);
    let plaintext = cipher.decrypt(&nonce_obj, sealed).map_err(|_| {
        VaultError::with_kind(
            ErrorCategory::User,
            ErrorKind::AuthenticationFailed,
            "corrupt input, tampered-with data, or bad passphrase",
        )
    })?;

    Ok(plaintext)
}

fn malformed(msg: &str) -> VaultError {
    VaultError::with_kind(ErrorCategory::User, ErrorKind::Malformed, msg)
}
