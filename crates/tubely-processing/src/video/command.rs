//! Bounded execution of external media tools.

use std::ffi::OsStr;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Why a tool run did not produce a successful exit.
#[derive(Debug)]
pub enum ToolFailure {
    Spawn(std::io::Error),
    TimedOut(Duration),
    Failed { status: String, stderr: String },
}

impl Display for ToolFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ToolFailure::Spawn(e) => write!(f, "failed to start: {}", e),
            ToolFailure::TimedOut(limit) => write!(f, "timed out after {}s", limit.as_secs()),
            ToolFailure::Failed { status, stderr } => {
                write!(f, "exited with {}: {}", status, stderr.trim())
            }
        }
    }
}

/// Run `program` to completion with stdin closed, capturing both output streams.
///
/// The child is killed if `timeout` elapses or the calling future is dropped.
pub async fn run_tool<I, A>(
    program: &str,
    args: I,
    timeout: Duration,
) -> Result<Output, ToolFailure>
where
    I: IntoIterator<Item = A>,
    A: AsRef<OsStr>,
{
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(ToolFailure::Spawn)?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| ToolFailure::TimedOut(timeout))?
        .map_err(ToolFailure::Spawn)?;

    if !output.status.success() {
        return Err(ToolFailure::Failed {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(output)
}
