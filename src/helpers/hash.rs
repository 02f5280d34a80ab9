//! SHA-256 integrity checks for downloaded artifacts.

use crate::core::error::{BisectError, Result};
use indicatif::ProgressBar;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

use super::progress::{ProgressGuard, upgrade_to_bytes};

/// Chunk size for reading files during hashing (1MB)
const CHUNK_SIZE: usize = 1024 * 1024;

/// Threshold for showing progress (100MB)
const PROGRESS_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Compute the lowercase hex SHA-256 of a file.
pub fn sha256_file(file: &Path) -> std::io::Result<String> {
    let mut f = std::fs::File::open(file)?;
    let file_size = f.metadata().map(|m| m.len()).unwrap_or(0);

    let guard = (file_size > PROGRESS_THRESHOLD).then(|| {
        let pb = ProgressBar::new(file_size);
        upgrade_to_bytes(&pb, file_size);
        ProgressGuard::new(pb)
    });

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total_read = 0u64;

    loop {
        let n = f.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        total_read += n as u64;
        if let Some(guard) = &guard {
            guard.bar().set_position(total_read);
        }
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Verify a file against an expected SHA-256.
///
/// Hex case is ignored. On mismatch the file is left where it is.
pub fn verify_sha256(file: &Path, expected: &str) -> Result<()> {
    let actual = sha256_file(file)?;
    let expected = expected.trim().to_ascii_lowercase();

    if actual != expected {
        return Err(BisectError::Integrity {
            path: file.to_path_buf(),
            expected,
            actual,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // SHA256 of "hello world"
    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_verify_sha256() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        std::fs::write(&file_path, b"hello world").unwrap();

        assert_eq!(sha256_file(&file_path).unwrap(), HELLO_SHA256);
        verify_sha256(&file_path, HELLO_SHA256).unwrap();
    }

    #[test]
    fn test_verify_sha256_mismatch_keeps_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        std::fs::write(&file_path, b"hello world").unwrap();

        let err = verify_sha256(&file_path, "wrong_hash").unwrap_err();
        match &err {
            BisectError::Integrity {
                expected, actual, ..
            } => {
                assert_eq!(expected, "wrong_hash");
                assert_eq!(actual, HELLO_SHA256);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("integrity check failed"));
        assert!(file_path.exists());
    }

    #[test]
    fn test_case_insensitive_comparison() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        std::fs::write(&file_path, b"hello world").unwrap();

        verify_sha256(&file_path, &HELLO_SHA256.to_uppercase()).unwrap();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = verify_sha256(&temp_dir.path().join("nope"), HELLO_SHA256).unwrap_err();
        assert!(matches!(err, BisectError::Io(_)));
    }
}
