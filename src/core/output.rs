//! Console lines for range listings and acquisition progress.
//!
//! Status goes to stdout, warnings to stderr. Progress bars live in
//! `helpers::progress`.

use owo_colors::OwoColorize;

/// Start of an acquisition, e.g. `==> Acquiring insider desktop build 1a2b3c4`.
pub fn action(message: &str) {
    println!("{} {}", "==>".blue().bold(), message.bold());
}

/// One stage of an acquisition: download, verify, extract, patch bundle.
pub fn sub_action(stage: &str) {
    println!("  {} {}", "->".cyan(), stage);
}

/// Request URLs, resolved references and other low-level facts.
pub fn detail(message: &str) {
    println!("     {}", message.dimmed());
}

/// A build is ready in the cache.
pub fn success(message: &str) {
    println!("{} {}", "==>".green().bold(), message.green());
}

pub fn info(message: &str) {
    println!("{} {}", "::".cyan(), message);
}

/// Recoverable trouble: unreadable history, metadata retries.
pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

/// Cache hits.
pub fn skip(message: &str) {
    println!("{} {}", "==>".dimmed(), message.dimmed());
}

/// One candidate of a range listing: index, commit, version and date.
pub fn list_item(index: usize, commit: &str, annotation: &str) {
    println!(
        "  {} {} {}",
        format!("{:>4}", index).cyan(),
        commit,
        annotation.dimmed()
    );
}
