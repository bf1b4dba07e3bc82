//! External process execution
//!
//! Every git/gh invocation (and every template-manifest `run` step)
//! goes through the [`ProcessRunner`] trait so tests can substitute a
//! recording or failing implementation.

use crate::error::{Error, Result};
use async_trait::async_trait;
use camino::Utf8Path;
use tokio::process::Command;
use tracing::debug;

/// Runs external commands, failing on non-zero exit status
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args`, optionally in `cwd`.
    ///
    /// # Errors
    /// `Error::ProcessSpawn` when the program cannot be started,
    /// `Error::Process` when it exits non-zero.
    async fn run(&self, program: &str, args: &[&str], cwd: Option<&Utf8Path>) -> Result<()>;

    /// Run a shell command line, optionally in `cwd`
    async fn run_shell(&self, command: &str, cwd: Option<&Utf8Path>) -> Result<()> {
        self.run("sh", &["-c", command], cwd).await
    }
}

/// [`ProcessRunner`] backed by `tokio::process::Command`
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&str], cwd: Option<&Utf8Path>) -> Result<()> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        debug!("running: {}", render_command(program, args));
        let output = cmd.output().await.map_err(|source| Error::ProcessSpawn {
            command: program.to_string(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(Error::Process {
                command: render_command(program, args),
                exit_code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        Ok(())
    }
}

/// Render a command line for logs and error messages
pub fn render_command(program: &str, args: &[&str]) -> String {
    let mut rendered = String::from(program);
    for arg in args {
        rendered.push(' ');
        if arg.contains(char::is_whitespace) {
            rendered.push('"');
            rendered.push_str(arg);
            rendered.push('"');
        } else {
            rendered.push_str(arg);
        }
    }
    rendered
}
