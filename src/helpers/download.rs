//! Streaming downloads with progress.

use crate::core::error::{BisectError, Result};
use crate::core::output;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use super::http::{describe_error, request};
use super::progress::{self, ProgressGuard, upgrade_to_bytes};

/// Download `url` to `dest`, creating parent directories.
///
/// Returns the number of bytes written. A failed download leaves whatever
/// was written so far in place.
pub fn download(url: &str, dest: &Path, timeout: Duration) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let filename = dest
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".to_string());

    let total_bytes = download_with_progress(url, dest, &filename, timeout)?;
    output::detail(&format!("downloaded {} ({} bytes)", filename, total_bytes));
    Ok(total_bytes)
}

fn download_with_progress(url: &str, dest: &Path, filename: &str, timeout: Duration) -> Result<u64> {
    let http_err = |reason: String| BisectError::Http {
        url: url.to_string(),
        reason,
    };

    let guard = ProgressGuard::new(progress::create_spinner(&format!("downloading {}", filename)));

    let response = request(url, timeout)
        .call()
        .map_err(|e| http_err(describe_error(&e)))?;

    if let Some(len) = response
        .header("content-length")
        .and_then(|s| s.parse().ok())
    {
        upgrade_to_bytes(guard.bar(), len);
    }

    let mut file = std::fs::File::create(dest)?;
    let mut reader = response.into_reader();
    let mut buffer = [0u8; 8192];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| http_err(format!("read error: {}", e)))?;
        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])?;
        total_bytes += bytes_read as u64;
        guard.bar().set_position(total_bytes);
    }

    file.flush()?;
    Ok(total_bytes)
}
