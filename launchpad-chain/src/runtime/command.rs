//! Helpers for spawning child processes.

use std::process::Stdio;

use async_trait::async_trait;
use tracing::debug;

use super::RuntimeError;

/// Extension trait for [`tokio::process::Command`].
#[async_trait]
pub trait CommandExt: std::fmt::Debug + Send {
    /// Runs the command to completion and returns its `stdout`.
    ///
    /// The child is killed if the returned future is dropped. A non-zero exit
    /// status becomes [`RuntimeError::Failed`] carrying the captured `stderr`.
    async fn spawn_and_wait_for_stdout(&mut self) -> Result<String, RuntimeError>;

    /// Same as [`CommandExt::spawn_and_wait_for_stdout`], discarding `stdout`.
    async fn spawn_and_wait(&mut self) -> Result<(), RuntimeError> {
        self.spawn_and_wait_for_stdout().await.map(|_| ())
    }

    /// Description used for error reporting.
    fn description(&self) -> String {
        format!("{:?}", self)
    }
}

#[async_trait]
impl CommandExt for tokio::process::Command {
    async fn spawn_and_wait_for_stdout(&mut self) -> Result<String, RuntimeError> {
        debug!("Spawning and waiting for {:?}", self);
        self.stdin(Stdio::null());
        self.stdout(Stdio::piped());
        self.stderr(Stdio::piped());
        self.kill_on_drop(true);

        let child = self.spawn().map_err(|source| RuntimeError::Spawn {
            command: self.description(),
            source,
        })?;
        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(RuntimeError::Failed {
                command: self.description(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|err| RuntimeError::UnexpectedOutput {
            command: self.description(),
            output: String::from_utf8_lossy(err.as_bytes()).into_owned(),
        })
    }
}
