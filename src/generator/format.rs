use anyhow::Context;
use std::io::Write;
use std::process::{Command, Stdio};

/// Run rustfmt over generated source and return the formatted text.
///
/// The source is piped through stdin so the result can be compared with
/// what is already on disk before anything is written.
pub fn format_source(source: &str) -> anyhow::Result<String> {
    // Allow tests to override the rustfmt binary path without mutating PATH
    let rustfmt_bin =
        std::env::var("ENDPOINTGEN_RUSTFMT_BIN").unwrap_or_else(|_| "rustfmt".to_string());

    let mut child = Command::new(&rustfmt_bin)
        .arg("--edition")
        .arg("2021")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to run {rustfmt_bin}"))?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(source.as_bytes())
            .context("Failed to pipe generated code to rustfmt")?;
    }
    let output = child
        .wait_with_output()
        .context("Failed to wait for rustfmt")?;
    if !output.status.success() {
        anyhow::bail!(
            "rustfmt failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    let formatted =
        String::from_utf8(output.stdout).context("rustfmt produced invalid UTF-8")?;
    if formatted.trim().is_empty() {
        anyhow::bail!("rustfmt produced no output");
    }
    Ok(formatted)
}
