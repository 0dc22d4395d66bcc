//! Build runner: executes a profile's configured build command as a
//! subprocess, capturing stdout/stderr for diagnostics on failure.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{info, instrument, warn};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to spawn build command: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("build command exited with status {status}:\n{tail}")]
    NonZeroExit { status: i32, tail: String },
}

/// Output collected from a build run, kept for display and history even on
/// success (for `--verbose` style reporting).
#[derive(Debug, Default)]
pub struct BuildOutput {
    pub stdout_tail: Vec<String>,
    pub stderr_tail: Vec<String>,
}

const TAIL_LINES: usize = 50;

/// Runs `command` (a full shell command line, e.g. `"npm run build"`) with
/// its working directory set to `working_dir`.
///
/// # Errors
///
/// Returns [`BuildError::Spawn`] if the command cannot be started, or
/// [`BuildError::NonZeroExit`] if it exits with a non-zero status.
#[instrument(skip(command))]
pub async fn run_build(command: &str, working_dir: &Path) -> Result<BuildOutput, BuildError> {
    info!(command, dir = %working_dir.display(), "starting build");

    let mut child = shell_command(command)
        .current_dir(working_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");

    let stdout_task = tokio::spawn(collect_tail(stdout));
    let stderr_task = tokio::spawn(collect_tail(stderr));

    let status = child.wait().await?;
    let stdout_tail = stdout_task.await.unwrap_or_default();
    let stderr_tail = stderr_task.await.unwrap_or_default();

    if !status.success() {
        let mut tail = stdout_tail.clone();
        tail.extend(stderr_tail.clone());
        warn!(status = status.code(), "build command failed");
        return Err(BuildError::NonZeroExit {
            status: status.code().unwrap_or(-1),
            tail: tail.join("\n"),
        });
    }

    Ok(BuildOutput {
        stdout_tail,
        stderr_tail,
    })
}

fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}

async fn collect_tail<R>(reader: R) -> Vec<String>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut tail = std::collections::VecDeque::with_capacity(TAIL_LINES);
    while let Ok(Some(line)) = lines.next_line().await {
        if tail.len() == TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    tail.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_build_succeeds_for_trivial_command() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = run_build("echo building", dir.path()).await.unwrap();
        assert!(output.stdout_tail.iter().any(|line| line.contains("building")));
    }

    #[tokio::test]
    async fn test_run_build_surfaces_non_zero_exit() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = run_build("exit 7", dir.path()).await;
        assert!(matches!(result, Err(BuildError::NonZeroExit { status: 7, .. })));
    }
}
