//! Build history resolution and artifact acquisition for bisecting
//! Visual Studio Code regressions.
//!
//! A bisection run starts from a good and a bad reference, each a commit
//! hash or a `DD-MM-YYYY` date, and turns them into the newest-first list of
//! candidate builds between the two. Any candidate can then be downloaded,
//! checksummed and unpacked into a per-build cache directory.
//!
//! # Example
//!
//! ```no_run
//! use bisect_builds::{BuildAcquirer, BuildKind, Config, Flavor, Quality, RangeRequest, Runtime};
//!
//! # fn main() -> bisect_builds::Result<()> {
//! let config = Config::load()?;
//! let kind = BuildKind::new(Runtime::DesktopLocal, Quality::Insider, Flavor::Default);
//!
//! let request = RangeRequest {
//!     good: Some("01-03-2024".into()),
//!     bad: Some("15-03-2024".into()),
//!     ..Default::default()
//! };
//! let candidates = bisect_builds::resolve_range(&config, &kind, &request)?;
//!
//! let acquirer = BuildAcquirer::new(&config);
//! if let Some(middle) = candidates.get(candidates.len() / 2) {
//!     acquirer.acquire(middle, false)?;
//!     println!("{}", acquirer.executable_path(middle)?.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The bisection search itself is left to the caller.

pub mod acquire;
pub mod builds;
pub mod core;
pub mod helpers;

pub use acquire::BuildAcquirer;
pub use builds::{
    Arch, Build, BuildKind, BuildMetadata, Flavor, HistorySource, Host, Os, Quality, RangeRequest,
    Runtime, fetch_build_by_version, fetch_metadata, resolve_range,
};
pub use crate::core::{BisectError, Config, Result, Side, output};
