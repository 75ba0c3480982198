//! Running engine executables.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::ProviderError;

/// Captured result of one process run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, None when killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Converts a non-zero exit into [`ProviderError::Exit`].
    pub fn into_result(self) -> Result<Self, ProviderError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ProviderError::Exit {
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Spawns an executable with positional arguments, bounded by a timeout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` to completion and captures its output.
    ///
    /// Exceeding `timeout` yields [`ProviderError::Timeout`]; a non-zero exit
    /// is reported in [`ProcessOutput::code`], not as an error.
    async fn run(&self, program: &Path, args: &[String], timeout: Duration) -> Result<ProcessOutput, ProviderError>;

    /// Reports whether the executable exists.
    async fn exists(&self, program: &Path) -> bool {
        tokio::fs::metadata(program).await.is_ok_and(|m| m.is_file())
    }
}

/// Runs real processes with tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &Path, args: &[String], timeout: Duration) -> Result<ProcessOutput, ProviderError> {
        debug!(program = %program.display(), ?args, "process: spawn");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // dropping the wait future on timeout kills the child
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => return Err(ProviderError::Timeout(timeout)),
        };

        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Returns a unique temporary WAV path for one synthesis.
pub(crate) fn temp_wav_path(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{prefix}_{}.wav", uuid::Uuid::new_v4().simple()))
}

/// Reads the WAV an engine wrote, then removes it.
pub(crate) async fn take_file(path: &Path) -> Result<Vec<u8>, ProviderError> {
    let data = tokio::fs::read(path).await;
    if let Err(e) = tokio::fs::remove_file(path).await {
        if data.is_ok() {
            tracing::warn!(path = %path.display(), error = %e, "process: failed to remove temp file");
        }
    }
    Ok(data?)
}
