//! Metadata Fetcher: per-build download information from the update service.

use super::kind::{Arch, Build, BuildKind, BuildMetadata, Os, Quality};
use super::naming;
use crate::core::config::Config;
use crate::core::error::{BisectError, Result};
use crate::core::output;
use crate::helpers::http;

/// Fetch the metadata of `build`.
///
/// Stable builds for Apple silicon are retried once as Intel builds, since
/// older stable releases never published an arm64 variant. When the retry
/// fails too, the first error is returned.
pub fn fetch_metadata(config: &Config, build: &Build) -> Result<BuildMetadata> {
    let original = match fetch_for_kind(config, &build.kind, &build.commit) {
        Ok(meta) => return Ok(meta),
        Err(e) => e,
    };

    let target = build.kind.target(&config.host);
    if !(target.is_apple_silicon() && build.kind.quality == Quality::Stable) {
        return Err(original);
    }

    output::warning(&format!(
        "no arm64 metadata for {}, retrying as darwin-x64",
        build.short_commit()
    ));
    let intel = build.kind.with_target(Os::MacOs, Arch::X64);
    fetch_for_kind(config, &intel, &build.commit).map_err(|_| original)
}

fn fetch_for_kind(config: &Config, kind: &BuildKind, commit: &str) -> Result<BuildMetadata> {
    let api_name = naming::api_name(kind, &config.host)?;
    let url = format!(
        "{}/api/versions/commit:{}/{}/{}",
        config.update_url,
        commit,
        api_name,
        kind.quality.api_segment()
    );
    output::detail(&format!("GET {}", url));
    http::get_json(&url, config.http_timeout).map_err(|reason| BisectError::MetadataFetch { url, reason })
}

/// Version string as the update service expects it.
///
/// `1.80` becomes `1.80.0`; insider tiers get an `-insider` suffix.
pub fn normalize_version(version: &str, quality: Quality) -> String {
    let version = version.trim();
    let (base, suffix) = match version.split_once('-') {
        Some((base, suffix)) => (base, Some(suffix)),
        None => (version, None),
    };

    let mut normalized = base.to_owned();
    if base.split('.').count() == 2 {
        normalized.push_str(".0");
    }
    match suffix {
        Some(suffix) => {
            normalized.push('-');
            normalized.push_str(suffix);
        }
        None if quality.is_insider() => normalized.push_str("-insider"),
        None => {}
    }
    normalized
}

/// Resolve a human-given version to a build.
///
/// `history` is searched first; otherwise the update service is asked for
/// the newest released build of that version.
pub fn fetch_build_by_version(
    config: &Config,
    kind: &BuildKind,
    version: &str,
    history: &[Build],
) -> Result<Build> {
    let normalized = normalize_version(version, kind.quality);
    let local = history.iter().find(|b| {
        b.version
            .as_deref()
            .is_some_and(|v| v == version.trim() || v == normalized)
    });
    if let Some(build) = local {
        output::detail(&format!("{} found in local history", version));
        return Ok(build.clone());
    }

    if kind.quality.is_alternate() {
        return Err(BisectError::UnsupportedTarget(format!(
            "{} builds can only be resolved by version from local history",
            kind.quality
        )));
    }

    let api_name = naming::api_name(kind, &config.host)?;
    let url = format!(
        "{}/api/versions/{}/{}/{}?released=true",
        config.update_url,
        normalized,
        api_name,
        kind.quality.api_segment()
    );
    output::detail(&format!("GET {}", url));
    let meta: BuildMetadata = http::get_json(&url, config.http_timeout)
        .map_err(|reason| BisectError::MetadataFetch { url, reason })?;

    Ok(Build {
        version: Some(meta.product_version),
        ..Build::from_commit(*kind, meta.version)
    })
}
