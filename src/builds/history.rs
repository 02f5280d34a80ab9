//! History Source: the ordered list of known builds for a quality tier.
//!
//! Local history files live in [`Config::history_dir`], one per tier. The
//! returned list is always newest first (index 0 = newest), whatever the
//! file's own ordering.

use super::kind::{Build, BuildDate, BuildKind, HistoryOrder};
use super::naming;
use crate::core::config::Config;
use crate::core::error::{BisectError, Result};
use crate::core::output;
use crate::helpers::http;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One record of a local history file.
#[derive(Debug, Clone, Deserialize)]
struct HistoryRecord {
    commit: String,
    #[serde(default)]
    date: Option<BuildDate>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    assets: Option<BTreeMap<String, String>>,
}

pub struct HistorySource<'a> {
    config: &'a Config,
}

impl<'a> HistorySource<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn history_path(&self, kind: &BuildKind) -> PathBuf {
        self.config.history_dir.join(kind.quality.history_file())
    }

    /// Load the local history for `kind`'s tier, newest first.
    ///
    /// A missing, unreadable or corrupt file yields an empty list.
    pub fn load(&self, kind: &BuildKind) -> Vec<Build> {
        let path = self.history_path(kind);
        if !path.exists() {
            output::detail(&format!("no local history at {}", path.display()));
            return Vec::new();
        }

        match read_records(&path) {
            Ok(records) => order_newest_first(records, kind.quality.history_order())
                .into_iter()
                .map(|r| Build {
                    kind: *kind,
                    commit: r.commit,
                    date: r.date,
                    version: r.version,
                    assets: r.assets,
                })
                .collect(),
            Err(reason) => {
                output::warning(&format!(
                    "ignoring unreadable history {}: {}",
                    path.display(),
                    reason
                ));
                Vec::new()
            }
        }
    }

    /// Load local history, querying the update service when it is empty or
    /// when `use_discovery` asks for it.
    pub fn load_or_discover(
        &self,
        kind: &BuildKind,
        released_only: bool,
        use_discovery: bool,
    ) -> Result<Vec<Build>> {
        if kind.quality.is_alternate() {
            // The alternate channel has no discovery endpoint.
            if use_discovery {
                output::warning(&format!(
                    "{} builds cannot be discovered remotely, using local history",
                    kind.quality
                ));
            }
            return Ok(self.load(kind));
        }

        if !use_discovery {
            let local = self.load(kind);
            if !local.is_empty() {
                output::detail(&format!(
                    "loaded {} {} builds from local history",
                    local.len(),
                    kind.quality
                ));
                return Ok(local);
            }
        }

        if use_discovery {
            output::info("discovering builds from the update service");
        } else {
            output::info("local history is empty, discovering builds from the update service");
        }
        self.discover(kind, released_only)
    }

    /// Query the update service's commit list for `kind`.
    ///
    /// The service returns commits newest first.
    pub fn discover(&self, kind: &BuildKind, released_only: bool) -> Result<Vec<Build>> {
        let api_name = naming::api_name(kind, &self.config.host)?;
        let url = format!(
            "{}/api/commits/{}/{}?released={}",
            self.config.update_url,
            kind.quality.api_segment(),
            api_name,
            released_only
        );
        output::detail(&format!("GET {}", url));

        let commits: Vec<String> = http::get_json(&url, self.config.http_timeout)
            .map_err(|reason| BisectError::Http { url, reason })?;

        Ok(commits
            .into_iter()
            .map(|commit| Build::from_commit(*kind, commit))
            .collect())
    }
}

fn read_records(path: &Path) -> std::result::Result<Vec<HistoryRecord>, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

fn order_newest_first(mut records: Vec<HistoryRecord>, order: HistoryOrder) -> Vec<HistoryRecord> {
    if order == HistoryOrder::OldestFirst {
        records.reverse();
    }
    records
}
