//! Thin wrapper around the external tools the backends drive.

use std::process::Command;

/// Run `program` with `args` and return its stdout.
///
/// A spawn failure or a non-zero exit becomes an `Err` with a one-line
/// description that includes the tool's stderr.
pub(crate) fn run(program: &str, args: &[&str]) -> Result<Vec<u8>, String> {
    log::debug!("Running {} {}", program, args.join(" "));
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| format!("couldn't run {}: {}", program, e))?;

    if output.status.success() {
        return Ok(output.stdout);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(format!("{} exited with {}: {}", program, output.status, stderr.trim()))
}

/// Like `run`, decoding stdout as text.
pub(crate) fn run_text(program: &str, args: &[&str]) -> Result<String, String> {
    run(program, args).map(|stdout| String::from_utf8_lossy(&stdout).into_owned())
}
