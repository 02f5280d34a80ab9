//! External tool invocation.

use crate::core::error::{BisectError, Result};
use crate::core::output;
use std::process::Command;

/// Run `tool` with `args` synchronously.
///
/// A spawn failure or non-zero exit is reported as
/// [`BisectError::ExternalTool`] carrying the exit status and stderr.
pub fn run_tool(tool: &str, args: &[&str]) -> Result<()> {
    output::detail(&format!("{} {}", tool, args.join(" ")));

    let output = Command::new(tool)
        .args(args)
        .output()
        .map_err(|e| BisectError::ExternalTool {
            tool: tool.to_string(),
            detail: format!("failed to execute: {}", e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BisectError::ExternalTool {
            tool: tool.to_string(),
            detail: format!("{}: {}", output.status, stderr.trim()),
        });
    }

    Ok(())
}
