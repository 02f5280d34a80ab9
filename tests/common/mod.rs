//! Shared fixtures: throwaway configs, history files and in-memory archives.

#![allow(dead_code)]

use bisect_builds::{Arch, Config, Host, Os, Quality};
use flate2::Compression;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;

/// Config rooted in `dir` for a fixed host, talking to `update_url`.
pub fn config(dir: &Path, host: Host, update_url: &str) -> Config {
    Config::new(dir.join("builds"), dir.join("history"))
        .with_host(host)
        .with_update_url(update_url)
}

pub fn linux_x64() -> Host {
    Host::new(Os::Linux, Arch::X64)
}

pub fn write_history(config: &Config, quality: Quality, records: serde_json::Value) {
    std::fs::create_dir_all(&config.history_dir).unwrap();
    std::fs::write(
        config.history_dir.join(quality.history_file()),
        serde_json::to_string_pretty(&records).unwrap(),
    )
    .unwrap();
}

pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o755);
        builder.append_data(&mut header, path, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

pub fn zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (path, data) in entries {
        writer
            .start_file(*path, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Update-service metadata body for an artifact served by the mock.
pub fn metadata(url: &str, commit: &str, product_version: &str, sha256: &str) -> serde_json::Value {
    serde_json::json!({
        "url": url,
        "name": product_version,
        "version": commit,
        "productVersion": product_version,
        "hash": "0000",
        "timestamp": 1_700_000_000_000i64,
        "sha256hash": sha256,
        "supportsFastUpdate": true
    })
}
