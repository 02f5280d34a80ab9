//! Reference Resolver: maps good/bad references onto a newest-first history.

use super::kind::{Build, BuildDate};
use crate::core::error::{BisectError, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{2}-\d{2}-\d{4}$").expect("static regex"))
}

/// Whether a reference is shaped like `DD-MM-YYYY`.
pub fn is_date_reference(reference: &str) -> bool {
    date_pattern().is_match(reference.trim())
}

/// Midnight local time of a `DD-MM-YYYY` reference.
pub fn parse_date_reference(reference: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(reference.trim(), "%d-%m-%Y").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    let local = Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        // Midnight skipped by a DST transition.
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight));
    Some(local)
}

/// Position of `commit` in `history`, if present.
pub fn commit_index(history: &[Build], commit: &str) -> Option<usize> {
    history.iter().position(|b| b.commit == commit)
}

/// Commit of the dated build closest in time to a `DD-MM-YYYY` reference.
///
/// Ties go to the build encountered first, i.e. the newer one.
pub fn resolve_date(history: &[Build], reference: &str) -> Result<String> {
    let resolution_err = || BisectError::Resolution {
        reference: reference.to_string(),
    };
    let target = parse_date_reference(reference).ok_or_else(resolution_err)?;

    let mut best: Option<(&Build, i64)> = None;
    for build in history {
        let Some(date) = build.date.as_ref().and_then(BuildDate::to_datetime) else {
            continue;
        };
        let distance = (date - target).num_milliseconds().abs();
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((build, distance));
        }
    }

    best.map(|(b, _)| b.commit.clone()).ok_or_else(resolution_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builds::kind::{BuildKind, Flavor, Quality, Runtime};

    fn dated(commit: &str, date: Option<BuildDate>) -> Build {
        let kind = BuildKind::new(Runtime::DesktopLocal, Quality::Stable, Flavor::Default);
        Build {
            date,
            ..Build::from_commit(kind, commit)
        }
    }

    fn local_midnight_millis(day: u32, month: u32, year: i32) -> BuildDate {
        let naive = NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let dt = Local.from_local_datetime(&naive).earliest().unwrap();
        BuildDate::EpochMillis(dt.timestamp_millis())
    }

    #[test]
    fn test_date_shape() {
        assert!(is_date_reference("15-03-2023"));
        assert!(!is_date_reference("2023-03-15"));
        assert!(!is_date_reference("5-3-2023"));
        assert!(!is_date_reference("1a2b3c4d"));
    }

    #[test]
    fn test_commit_index() {
        let history = vec![dated("c", None), dated("b", None), dated("a", None)];
        assert_eq!(commit_index(&history, "b"), Some(1));
        assert_eq!(commit_index(&history, "z"), None);
    }

    #[test]
    fn test_nearest_date_wins() {
        let history = vec![
            dated("newer", Some(local_midnight_millis(17, 3, 2023))),
            dated("undated", None),
            dated("older", Some(local_midnight_millis(14, 3, 2023))),
        ];
        assert_eq!(resolve_date(&history, "15-03-2023").unwrap(), "older");
    }

    #[test]
    fn test_mixed_date_shapes() {
        let history = vec![
            dated("iso", Some(BuildDate::Iso("2024-01-10T12:00:00Z".into()))),
            dated("epoch", Some(local_midnight_millis(1, 1, 2023))),
        ];
        assert_eq!(resolve_date(&history, "09-01-2024").unwrap(), "iso");
        assert_eq!(resolve_date(&history, "01-06-2022").unwrap(), "epoch");
    }

    #[test]
    fn test_tie_goes_to_first_encountered() {
        let history = vec![
            dated("first", Some(local_midnight_millis(16, 3, 2023))),
            dated("second", Some(local_midnight_millis(14, 3, 2023))),
        ];
        assert_eq!(resolve_date(&history, "15-03-2023").unwrap(), "first");
    }

    #[test]
    fn test_no_dated_builds_is_resolution_error() {
        let history = vec![dated("a", None), dated("b", None)];
        let err = resolve_date(&history, "15-03-2023").unwrap_err();
        assert!(matches!(err, BisectError::Resolution { .. }));
        assert!(err.to_string().contains("15-03-2023"));
    }

    #[test]
    fn test_impossible_calendar_date() {
        let history = vec![dated("a", Some(local_midnight_millis(1, 1, 2023)))];
        assert!(resolve_date(&history, "31-02-2023").is_err());
    }
}
