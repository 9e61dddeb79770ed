//! Hex text armor for encrypted blobs
//!
//! Encrypted files are stored as lowercase hex rather than raw bytes so
//! they survive copy/paste, text-mode transfers, and casual inspection.
//! The armor carries no header or version marker; the armored text is
//! exactly the hex expansion of the binary blob.

use crate::error::{ErrorCategory, ErrorKind, Result, VaultError};

/// Encode binary data as lowercase hex text.
pub fn encode(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decode hex text back into binary data.
///
/// Fails on odd-length input or any non-hex character.
pub fn decode(armored: &[u8]) -> Result<Vec<u8>> {
    hex::decode(armored).map_err(|e| {
        VaultError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Malformed,
            "input is not valid hex-armored data",
            e,
        )
    })
}
