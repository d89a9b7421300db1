//! Process runner for the pass-cli binary
//!
//! Spawns pass-cli directly (no shell, no interpolation) with a hard
//! wall-clock timeout and a captured-output cap, and maps every failure
//! mode onto the stable error taxonomy.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use super::{classify_failure, CliRunner};
use crate::config::CliConfig;
use crate::{PassCliError, Result};

/// Bare executable name, resolved via the (augmented) search path.
const DEFAULT_BINARY: &str = "pass-cli";

/// Captured stdout above this size is rejected rather than buffered.
const MAX_OUTPUT_BYTES: usize = 20 * 1024 * 1024;

/// Runner that spawns the real pass-cli binary.
pub struct ProcessRunner {
    /// Resolved binary name or path
    binary: String,
    /// Command timeout
    timeout: Duration,
    /// Augmented PATH for the child, None on Windows
    path_env: Option<OsString>,
}

impl ProcessRunner {
    /// Create a new process runner from the CLI configuration.
    pub fn new(config: &CliConfig) -> Self {
        Self {
            binary: resolve_binary(config.binary.as_deref()),
            timeout: Duration::from_secs(config.timeout_secs),
            path_env: augmented_path(),
        }
    }

    /// Execute pass-cli once and return stdout.
    /// Command::new executes the binary directly without a shell,
    /// preventing any command injection from the path argument.
    async fn run_once(&self, program: &str, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(path) = &self.path_env {
            cmd.env("PATH", path);
        }

        // No console window on Windows.
        #[cfg(windows)]
        cmd.creation_flags(0x0800_0000);

        tracing::debug!(binary = %program, args = ?args, "executing pass-cli command");

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PassCliError::NotInstalled
            } else {
                classify_failure(&e.to_string())
            }
        })?;

        match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                if output.status.success() {
                    if output.stdout.len() > MAX_OUTPUT_BYTES {
                        return Err(PassCliError::Unknown(
                            "pass-cli output exceeded the 20 MiB cap".to_string(),
                        ));
                    }
                    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    let stderr = stderr.trim();
                    if stderr.is_empty() {
                        let code = output.status.code().unwrap_or(-1);
                        Err(classify_failure(&format!(
                            "pass-cli exited with status {code}"
                        )))
                    } else {
                        Err(classify_failure(stderr))
                    }
                }
            }
            Ok(Err(e)) => Err(classify_failure(&e.to_string())),
            Err(_) => Err(PassCliError::Timeout(self.timeout.as_secs())),
        }
    }
}

#[async_trait]
impl CliRunner for ProcessRunner {
    async fn invoke(&self, args: &[&str]) -> Result<String> {
        match self.run_once(&self.binary, args).await {
            // Windows commonly omits the executable extension; retry once
            // with the conventional suffix before giving up.
            Err(PassCliError::NotInstalled)
                if cfg!(windows) && !self.binary.to_lowercase().ends_with(".exe") =>
            {
                let with_suffix = format!("{}.exe", self.binary);
                tracing::debug!(binary = %with_suffix, "retrying with executable suffix");
                self.run_once(&with_suffix, args).await
            }
            other => other,
        }
    }
}

/// Resolve the binary from the configured override: trim whitespace,
/// strip surrounding quote characters, fall back to the bare name.
fn resolve_binary(raw: Option<&str>) -> String {
    let unquoted = raw
        .unwrap_or("")
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    if unquoted.is_empty() {
        DEFAULT_BINARY.to_string()
    } else {
        unquoted.to_string()
    }
}

/// Build a search path with common install directories prepended, so the
/// binary is found even when the parent environment is minimal. Windows
/// resolves executables through its own lookup and is left alone.
fn augmented_path() -> Option<OsString> {
    if cfg!(windows) {
        return None;
    }

    let mut dirs_in_order: Vec<PathBuf> = Vec::new();
    if let Some(home) = dirs::home_dir() {
        dirs_in_order.push(home.join(".local/bin"));
        dirs_in_order.push(home.join(".cargo/bin"));
    }
    for common in [
        "/opt/homebrew/bin",
        "/opt/homebrew/sbin",
        "/opt/local/bin",
        "/usr/local/bin",
        "/usr/bin",
        "/bin",
        "/snap/bin",
    ] {
        dirs_in_order.push(PathBuf::from(common));
    }
    if let Some(existing) = std::env::var_os("PATH") {
        dirs_in_order.extend(std::env::split_paths(&existing));
    }

    let mut seen = HashSet::new();
    dirs_in_order.retain(|d| seen.insert(d.clone()));

    std::env::join_paths(dirs_in_order).ok()
}
