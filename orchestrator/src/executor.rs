//! External command execution.
//!
//! Module build and clean steps, and the coverage report renderer, are
//! external programs. They run through the [`CommandExecutor`] trait so tests
//! can substitute canned responses. The system implementation enforces a
//! timeout so a hung build tool cannot stall the run.

use crate::error::{OrchestratorError, Result};
use camino::Utf8Path;
use log::debug;
use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs `program` with `args` in `working_dir` and returns the captured
    /// output.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned or exceeds its time
    /// budget.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use camino::Utf8Path;
    /// use jarsmith::executor::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor::default();
    /// let output = executor.run("java", &["-version"], Utf8Path::new("."))?;
    /// assert!(output.status.success());
    /// # Ok::<(), jarsmith::error::OrchestratorError>(())
    /// ```
    fn run(&self, program: &str, args: &[&str], working_dir: &Utf8Path) -> Result<Output>;
}

/// Executes commands on the host system with a timeout.
#[derive(Debug, Clone, Copy)]
pub struct SystemCommandExecutor {
    timeout: Duration,
}

impl SystemCommandExecutor {
    /// Create an executor that kills commands running longer than `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemCommandExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(1800))
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, program: &str, args: &[&str], working_dir: &Utf8Path) -> Result<Output> {
        debug!("running {program} {} in {working_dir}", args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .current_dir(working_dir.as_std_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain both pipes while waiting so a chatty build tool cannot block
        // on a full pipe buffer.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        match child.wait_timeout(self.timeout)? {
            Some(status) => Ok(Output {
                status,
                stdout: join_drain(stdout),
                stderr: join_drain(stderr),
            }),
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(OrchestratorError::CommandTimedOut {
                    program: program.to_owned(),
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = pipe.read_to_end(&mut buffer);
        buffer
    })
}

fn join_drain(handle: Option<thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Render a failed command's output as a one-line reason.
#[must_use]
pub fn failure_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        format!("exited with {}", output.status)
    } else {
        trimmed.to_owned()
    }
}
