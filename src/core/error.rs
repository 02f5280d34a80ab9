//! Error types for history resolution and build acquisition.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which end of a bisection range a reference belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Good,
    Bad,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Good => f.write_str("good"),
            Self::Bad => f.write_str("bad"),
        }
    }
}

/// Errors that can occur while resolving a range or acquiring a build.
#[derive(Error, Debug)]
pub enum BisectError {
    #[error("{side} commit {reference} not found in build history")]
    ReferenceNotFound { side: Side, reference: String },

    #[error("invalid range: bad build {bad} must be newer than good build {good}")]
    InvalidRange { good: String, bad: String },

    #[error("could not resolve date {reference} to any build")]
    Resolution { reference: String },

    #[error("sha256 integrity check failed for {}\n  expected: {expected}\n  got:      {actual}", path.display())]
    Integrity {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("failed to fetch build metadata from {url}: {reason}")]
    MetadataFetch { url: String, reason: String },

    #[error("no {platform} asset published for build {commit}")]
    MissingAsset { commit: String, platform: String },

    #[error("{tool} failed: {detail}")]
    ExternalTool { tool: String, detail: String },

    #[error("HTTP request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("cannot extract {}: {reason}", archive.display())]
    Extract { archive: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unsupported build target: {0}")]
    UnsupportedTarget(String),

    #[error("{target} artifact names require the product version from build metadata")]
    MissingProductVersion { target: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BisectError>;
