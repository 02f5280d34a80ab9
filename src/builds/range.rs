//! Range Builder: turns good/bad references into the candidate build list.

use super::history::HistorySource;
use super::kind::{Build, BuildKind};
use super::reference;
use crate::core::config::Config;
use crate::core::error::{BisectError, Result, Side};
use crate::core::output;
use std::collections::HashSet;

/// Inputs of a range resolution besides the build kind.
#[derive(Debug, Clone, Default)]
pub struct RangeRequest {
    /// Known good commit or `DD-MM-YYYY` date. Defaults to the oldest build.
    pub good: Option<String>,
    /// Known bad commit or `DD-MM-YYYY` date. Defaults to the newest build.
    pub bad: Option<String>,
    pub released_only: bool,
    pub exclude: Vec<String>,
    pub use_discovery: bool,
}

/// Resolve `request` against the history of `kind`.
///
/// Returns the newest-first slice from the bad build to the good build,
/// both inclusive, minus excluded commits.
pub fn resolve_range(config: &Config, kind: &BuildKind, request: &RangeRequest) -> Result<Vec<Build>> {
    let history = HistorySource::new(config).load_or_discover(
        kind,
        request.released_only,
        request.use_discovery,
    )?;
    select_range(&history, request)
}

/// The pure part of [`resolve_range`], over an already loaded history.
pub fn select_range(history: &[Build], request: &RangeRequest) -> Result<Vec<Build>> {
    if history.is_empty() && request.good.is_none() && request.bad.is_none() {
        output::warning("no builds found for this configuration");
        return Ok(Vec::new());
    }

    let good_index = match request.good.as_deref() {
        Some(r) => resolve_index(history, r, Side::Good)?,
        None => history.len().saturating_sub(1),
    };
    let bad_index = match request.bad.as_deref() {
        Some(r) => resolve_index(history, r, Side::Bad)?,
        None => 0,
    };

    if bad_index >= good_index {
        return Err(BisectError::InvalidRange {
            good: request.good.clone().unwrap_or_else(|| "oldest".to_owned()),
            bad: request.bad.clone().unwrap_or_else(|| "newest".to_owned()),
        });
    }

    let range = &history[bad_index..=good_index];
    if request.exclude.is_empty() {
        return Ok(range.to_vec());
    }

    let excluded: HashSet<&str> = request.exclude.iter().map(String::as_str).collect();
    let kept: Vec<Build> = range
        .iter()
        .filter(|b| !excluded.contains(b.commit.as_str()))
        .cloned()
        .collect();
    let removed = range.len() - kept.len();
    if removed > 0 {
        output::info(&format!(
            "excluded {} build{} from the range",
            removed,
            if removed == 1 { "" } else { "s" }
        ));
    }
    Ok(kept)
}

fn resolve_index(history: &[Build], reference: &str, side: Side) -> Result<usize> {
    let commit = if reference::is_date_reference(reference) {
        let commit = reference::resolve_date(history, reference)?;
        output::detail(&format!("{side} date {reference} resolved to {commit}"));
        commit
    } else {
        reference.trim().to_owned()
    };

    reference::commit_index(history, &commit).ok_or_else(|| BisectError::ReferenceNotFound {
        side,
        reference: reference.to_owned(),
    })
}
