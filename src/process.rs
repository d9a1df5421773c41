#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Runners for the external processes the build pipeline shells out to
//! (container runtime, documentation server).
//!
//! Processes run one at a time, to completion; a non-zero exit is surfaced
//! as a fatal error carrying the captured stderr.

use std::{
    ffi::{OsStr, OsString},
    path::Path,
    process::Stdio,
};

use anyhow::{Context, Result, bail};
use tokio::{
    io::{AsyncReadExt, BufReader},
    process::{Child, Command},
};

/// Drop guard that terminates a spawned child process if callers forget to
/// await it.
struct ChildDropGuard(Option<Child>);

impl ChildDropGuard {
    /// Wraps the provided child process with the drop guard.
    fn new(child: Child) -> Self {
        Self(Some(child))
    }

    /// Returns a mutable reference to the underlying child process.
    fn child_mut(&mut self) -> Result<&mut Child> {
        self.0
            .as_mut()
            .context("child process already taken from guard")
    }

    /// Prevents the guard from killing the process on drop.
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for ChildDropGuard {
    fn drop(&mut self) {
        if let Some(child) = self.0.as_mut() {
            let _ = child.start_kill();
        }
    }
}

/// Captured result of a finished subprocess.
#[derive(Debug)]
pub struct Collected {
    /// Exit status returned by the process.
    pub status: std::process::ExitStatus,
    /// Contents written to stdout.
    pub stdout: Vec<u8>,
    /// Contents written to stderr.
    pub stderr: Vec<u8>,
}

impl Collected {
    /// Fails with the captured stderr when the process exited non-zero.
    pub fn ensure_success(&self, what: &str) -> Result<()> {
        if !self.status.success() {
            bail!("{what} failed ({}): {}", self.status, String::from_utf8_lossy(&self.stderr));
        }
        Ok(())
    }
}

/// Spawns a command with piped output and collects stdout/stderr after it
/// exits.
pub async fn run_collect(
    program: impl AsRef<OsStr>,
    args: &[OsString],
    cwd: Option<&Path>,
    env: &[(OsString, OsString)],
) -> Result<Collected> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    for (key, value) in env {
        cmd.env(key, value);
    }

    let mut guard = ChildDropGuard::new(cmd.spawn().context("failed to spawn process")?);

    let stdout = guard
        .child_mut()?
        .stdout
        .take()
        .context("missing stdout pipe")?;
    let stderr = guard
        .child_mut()?
        .stderr
        .take()
        .context("missing stderr pipe")?;

    let out_task = tokio::spawn(async move {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .await
            .context("failed to read stdout")?;
        Ok::<Vec<u8>, anyhow::Error>(buf)
    });

    let err_task = tokio::spawn(async move {
        let mut reader = BufReader::new(stderr);
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .await
            .context("failed to read stderr")?;
        Ok::<Vec<u8>, anyhow::Error>(buf)
    });

    let status = guard
        .child_mut()?
        .wait()
        .await
        .context("failed to wait on process")?;
    let stdout = out_task.await.context("stdout task join error")??;
    let stderr = err_task.await.context("stderr task join error")??;
    guard.disarm();

    Ok(Collected {
        status,
        stdout,
        stderr,
    })
}

/// Spawns a command wired to the parent's stdio and waits for it, for
/// long-running interactive processes like the local docs server.
pub async fn run_interactive(
    program: impl AsRef<OsStr>,
    args: &[OsString],
    cwd: Option<&Path>,
) -> Result<std::process::ExitStatus> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let mut guard = ChildDropGuard::new(cmd.spawn().context("failed to spawn process")?);
    let status = guard
        .child_mut()?
        .wait()
        .await
        .context("failed to wait on process")?;
    guard.disarm();
    Ok(status)
}
