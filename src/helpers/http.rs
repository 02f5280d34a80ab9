//! Blocking HTTP helpers for the update service.

use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("bisect-builds/", env!("CARGO_PKG_VERSION"));

/// Build a GET request with the standard headers and timeout.
pub fn request(url: &str, timeout: Duration) -> ureq::Request {
    ureq::get(url).timeout(timeout).set("User-Agent", USER_AGENT)
}

/// Human-readable reason for a failed request.
pub fn describe_error(err: &ureq::Error) -> String {
    match err {
        ureq::Error::Status(404, _) => "not found (HTTP 404)".to_owned(),
        ureq::Error::Status(code, response) => {
            format!("HTTP {} {}", code, response.status_text())
        }
        ureq::Error::Transport(t) => t.to_string(),
    }
}

/// GET a URL and decode the JSON body.
///
/// The error is a plain reason string; callers wrap it in the error
/// variant that matches what they were fetching.
pub fn get_json<T: DeserializeOwned>(url: &str, timeout: Duration) -> Result<T, String> {
    request(url, timeout)
        .call()
        .map_err(|e| describe_error(&e))?
        .into_json::<T>()
        .map_err(|e| format!("invalid JSON response: {}", e))
}
