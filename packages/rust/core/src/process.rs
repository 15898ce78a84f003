//! Blocking-style execution of external converters with an optional timeout.

use std::ffi::OsString;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;

/// Why a subprocess did not produce an [`Output`].
#[derive(Debug)]
pub(crate) enum ProcessError {
    /// The program could not be started (usually: not on `PATH`).
    Spawn(std::io::Error),
    /// The program ran past the deadline and was killed.
    Timeout(Duration),
}

/// A fully described external invocation.
#[derive(Debug, Clone)]
pub(crate) struct Invocation<'a> {
    pub program: &'a str,
    pub args: Vec<OsString>,
    pub envs: &'a [(&'a str, &'a str)],
    pub timeout: Option<Duration>,
}

impl Invocation<'_> {
    /// Shell-like rendering for logs.
    pub fn display(&self) -> String {
        let mut line = self.program.to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    /// Run to completion, capturing stdout and stderr.
    ///
    /// On timeout the child is killed (`kill_on_drop`) before returning.
    pub async fn run(&self) -> Result<Output, ProcessError> {
        let mut command = Command::new(self.program);
        command
            .args(&self.args)
            .envs(self.envs.iter().copied())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(ProcessError::Spawn)?;

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ProcessError::Timeout(limit))?
                .map_err(ProcessError::Spawn),
            None => child.wait_with_output().await.map_err(ProcessError::Spawn),
        }
    }
}

/// Lossy UTF-8 stderr, trimmed.
pub(crate) fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}
