//! Acquisition Engine: download, verify and unpack builds into the cache.
//!
//! Every build owns one cache directory, `<build_root>/<quality>/<flavor>/<commit>`.
//! The directory only counts as cached once it holds the completion marker,
//! written after the artifact was verified and unpacked. A cached build is
//! returned without touching the network, so each build is downloaded at
//! most once unless a forced re-download is requested. A directory without
//! the marker is left over from a failed attempt and is discarded by the
//! next acquisition.
//!
//! Flow for primary-channel builds:
//!
//! 1. Resolve metadata (download URL, checksum, product version)
//! 2. Download the artifact into the cache directory
//! 3. Verify its SHA-256
//! 4. Unpack it, unless the artifact is an installer
//!
//! Alternate-channel builds take the route in [`codium`].

mod codium;

use crate::builds::kind::{Build, Flavor};
use crate::builds::{metadata, naming};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::output;
use crate::helpers::{download, extract, hash};
use std::path::{Path, PathBuf};

pub use codium::patch_product_json;

/// Written last into a cache directory; holds the product version.
pub const COMPLETE_MARKER: &str = ".complete";

/// Materializes builds on disk.
pub struct BuildAcquirer<'a> {
    config: &'a Config,
}

impl<'a> BuildAcquirer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Cache directory of `build`.
    pub fn build_path(&self, build: &Build) -> PathBuf {
        self.config
            .build_root
            .join(build.kind.quality.as_str())
            .join(build.kind.flavor.as_str())
            .join(&build.commit)
    }

    /// Make `build` available locally and return its cache directory.
    ///
    /// Container builds have no local artifact and yield `None`. With
    /// `force`, an existing cache directory is deleted first.
    pub fn acquire(&self, build: &Build, force: bool) -> Result<Option<PathBuf>> {
        if build.kind.quality.is_alternate() {
            return codium::acquire(self, build, force).map(Some);
        }
        if build.kind.flavor == Flavor::Container {
            output::info(&format!(
                "{} builds are served from container images, nothing to download",
                build.kind.flavor
            ));
            return Ok(None);
        }

        // Reject unsupported targets before touching the cache.
        naming::api_name(&build.kind, &self.config.host)?;

        let dir = self.build_path(build);
        if !self.prepare_cache_dir(&dir, build, force)? {
            return Ok(Some(dir));
        }

        output::action(&format!(
            "Acquiring {} {} build {}",
            build.kind.quality,
            build.kind.runtime,
            build.short_commit()
        ));

        let meta = metadata::fetch_metadata(self.config, build)?;
        let host = &self.config.host;
        let product_version = Some(meta.product_version.as_str());

        let archive = dir.join(naming::download_name(&build.kind, host, product_version)?);
        output::sub_action("download");
        download::download(&meta.url, &archive, self.config.http_timeout)?;

        output::sub_action("verify");
        hash::verify_sha256(&archive, &meta.sha256hash)?;
        output::detail("sha256 verified");

        if build.kind.flavor.is_installer() {
            mark_complete(&dir, product_version)?;
            output::success(&format!("installer ready at {}", archive.display()));
            return Ok(Some(dir));
        }

        let dest = if naming::extracts_into_named_dir(&build.kind, host) {
            dir.join(naming::build_name(&build.kind, host, product_version)?)
        } else {
            dir.clone()
        };
        output::sub_action("extract");
        extract::extract(&archive, &dest)?;
        remove_archive(&archive);
        mark_complete(&dir, product_version)?;

        output::success(&format!("{} ready at {}", build.short_commit(), dir.display()));
        Ok(Some(dir))
    }

    /// Path of the runnable entry point of an acquired build.
    ///
    /// Windows desktop names embed the product version. It is read from the
    /// completion marker of a cached build and only fetched from the update
    /// service when the build is not cached.
    pub fn executable_path(&self, build: &Build) -> Result<PathBuf> {
        let host = &self.config.host;
        let dir = self.build_path(build);
        let product_version = if !naming::needs_product_version(&build.kind, host) {
            None
        } else if let Some(recorded) = recorded_product_version(&dir) {
            Some(recorded)
        } else {
            Some(metadata::fetch_metadata(self.config, build)?.product_version)
        };
        let name = naming::build_name(&build.kind, host, product_version.as_deref())?;
        naming::executable_path(&dir, &name, &build.kind, host)
    }

    /// Whether `build` has been fully acquired.
    pub fn is_cached(&self, build: &Build) -> bool {
        self.build_path(build).join(COMPLETE_MARKER).is_file()
    }

    /// Returns whether `build` still has to be downloaded into `dir`.
    ///
    /// Leftovers of a failed attempt are removed; they were kept only so
    /// they could be inspected after the failure.
    fn prepare_cache_dir(&self, dir: &Path, build: &Build, force: bool) -> Result<bool> {
        if !dir.exists() {
            return Ok(true);
        }
        if self.is_cached(build) && !force {
            output::skip(&format!(
                "{} already cached at {}",
                build.short_commit(),
                dir.display()
            ));
            return Ok(false);
        }
        if force {
            output::detail(&format!("removing cached {}", dir.display()));
        } else {
            output::warning(&format!(
                "discarding incomplete download in {}",
                dir.display()
            ));
        }
        std::fs::remove_dir_all(dir)?;
        Ok(true)
    }
}

fn mark_complete(dir: &Path, product_version: Option<&str>) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(COMPLETE_MARKER), product_version.unwrap_or_default())?;
    Ok(())
}

fn recorded_product_version(dir: &Path) -> Option<String> {
    let recorded = std::fs::read_to_string(dir.join(COMPLETE_MARKER)).ok()?;
    let recorded = recorded.trim();
    (!recorded.is_empty()).then(|| recorded.to_owned())
}

/// Drop an archive once unpacked; a leftover only costs disk space.
fn remove_archive(archive: &Path) {
    if let Err(e) = std::fs::remove_file(archive) {
        output::warning(&format!("could not remove {}: {}", archive.display(), e));
    }
}
