//! CRC32 checksums for persisted collection files
//!
//! The manifest of each collection records the CRC32 of its documents file;
//! a mismatch on load makes the store refuse to open.

use std::path::Path;

use crc32fast::Hasher;

use super::errors::{StoreError, StoreResult};

/// CRC32 (IEEE) of a serialized documents file.
pub fn documents_crc32(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Checks a documents file against the checksum recorded in its manifest.
pub fn check_documents(path: &Path, bytes: &[u8], recorded: u32) -> StoreResult<()> {
    let actual = documents_crc32(bytes);
    if actual == recorded {
        return Ok(());
    }
    Err(StoreError::corrupted(
        path,
        format!(
            "checksum mismatch: manifest records {:08x}, file hashes to {:08x}",
            recorded, actual
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_documents_same_checksum() {
        let data = br#"[{"nombre_modalidad":"Tarjeta","activo":true}]"#;
        assert_eq!(documents_crc32(data), documents_crc32(data));
    }

    #[test]
    fn test_flipped_bit_is_corruption() {
        let mut data = br#"[{"activo":true}]"#.to_vec();
        let recorded = documents_crc32(&data);
        assert!(check_documents(Path::new("documents.json"), &data, recorded).is_ok());

        data[3] ^= 0x01;
        let err = check_documents(Path::new("documents.json"), &data, recorded).unwrap_err();
        assert_eq!(err.code(), "STORE_CORRUPTED");
        assert!(err.to_string().contains("checksum mismatch"));
    }
}
