//! Stand-ins for the process and repository seams.
//!
//! Compiled for unit tests and, behind the `test-support` feature, for the
//! behaviour suites under `tests/`.

use crate::error::{OrchestratorError, Result};
use crate::executor::CommandExecutor;
use crate::publish::credentials::Credentials;
use crate::publish::transport::{RepositoryTransport, TransportError};
use camino::Utf8Path;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{ExitStatus, Output};

/// Process output with `code` as exit status and `stderr` as its diagnostics.
#[must_use]
pub fn process_output(code: i32, stderr: &str) -> Output {
    #[cfg(unix)]
    let status = {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(code << 8)
    };
    #[cfg(windows)]
    let status = {
        use std::os::windows::process::ExitStatusExt;
        ExitStatus::from_raw(code.unsigned_abs())
    };
    Output {
        status,
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// One scripted invocation for [`StubExecutor`].
#[derive(Debug)]
pub struct ExpectedCall {
    program: &'static str,
    args: Vec<&'static str>,
    reply: Result<Output>,
}

impl ExpectedCall {
    /// `program args..` exits 0.
    #[must_use]
    pub fn succeeds(program: &'static str, args: &[&'static str]) -> Self {
        Self::replying(program, args, Ok(process_output(0, "")))
    }

    /// `program args..` exits 1 and prints `stderr`.
    #[must_use]
    pub fn fails(program: &'static str, args: &[&'static str], stderr: &str) -> Self {
        Self::replying(program, args, Ok(process_output(1, stderr)))
    }

    /// `program args..` yields `reply` verbatim, e.g. a spawn error.
    #[must_use]
    pub fn replying(program: &'static str, args: &[&'static str], reply: Result<Output>) -> Self {
        Self {
            program,
            args: args.to_vec(),
            reply,
        }
    }

    fn describe(&self) -> String {
        std::iter::once(self.program)
            .chain(self.args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A [`CommandExecutor`] that replays a script of [`ExpectedCall`]s in order.
///
/// The working directory is ignored. Running off the end of the script or
/// diverging from it yields [`OrchestratorError::StubMismatch`].
#[derive(Debug)]
pub struct StubExecutor {
    script: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// An executor that expects exactly `script`, in order.
    #[must_use]
    pub fn new(script: Vec<ExpectedCall>) -> Self {
        Self {
            script: RefCell::new(script.into()),
        }
    }

    /// # Panics
    ///
    /// Panics if part of the script was never run.
    pub fn assert_finished(&self) {
        let script = self.script.borrow();
        let pending: Vec<String> = script.iter().map(ExpectedCall::describe).collect();
        assert!(pending.is_empty(), "commands never run: {pending:?}");
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str], _working_dir: &Utf8Path) -> Result<Output> {
        let actual = std::iter::once(cmd)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        let next = self.script.borrow_mut().pop_front();
        match next {
            Some(call) if call.program == cmd && call.args == args => call.reply,
            Some(call) => Err(OrchestratorError::StubMismatch {
                message: format!("expected `{}`, got `{actual}`", call.describe()),
            }),
            None => Err(OrchestratorError::StubMismatch {
                message: format!("unscripted command `{actual}`"),
            }),
        }
    }
}

/// A request observed by [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedRequest {
    /// An upload of `len` bytes.
    Put {
        /// Target URL.
        url: String,
        /// Body length.
        len: usize,
    },
    /// A deletion.
    Delete {
        /// Target URL.
        url: String,
    },
}

/// A repository transport that records requests instead of sending them.
///
/// Uploads whose URL ends with a configured suffix fail with the given
/// error; everything else succeeds.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    requests: RefCell<Vec<RecordedRequest>>,
    failures: Vec<(String, TransportError)>,
}

impl RecordingTransport {
    /// Creates a transport on which every request succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every upload whose URL ends with `suffix`.
    #[must_use]
    pub fn failing_on(mut self, suffix: &str, error: TransportError) -> Self {
        self.failures.push((suffix.to_owned(), error));
        self
    }

    /// Returns the requests observed so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.borrow().clone()
    }

    /// Returns the URLs uploaded so far.
    pub fn uploaded(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .filter_map(|r| match r {
                RecordedRequest::Put { url, .. } => Some(url.clone()),
                RecordedRequest::Delete { .. } => None,
            })
            .collect()
    }

    /// Returns the URLs deleted so far.
    pub fn deleted(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .filter_map(|r| match r {
                RecordedRequest::Delete { url } => Some(url.clone()),
                RecordedRequest::Put { .. } => None,
            })
            .collect()
    }
}

impl RepositoryTransport for RecordingTransport {
    fn put(
        &self,
        url: &str,
        body: &[u8],
        _credentials: &Credentials,
    ) -> std::result::Result<(), TransportError> {
        self.requests.borrow_mut().push(RecordedRequest::Put {
            url: url.to_owned(),
            len: body.len(),
        });
        match self.failures.iter().find(|(suffix, _)| url.ends_with(suffix)) {
            Some((_, error)) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn delete(
        &self,
        url: &str,
        _credentials: &Credentials,
    ) -> std::result::Result<(), TransportError> {
        self.requests.borrow_mut().push(RecordedRequest::Delete {
            url: url.to_owned(),
        });
        Ok(())
    }
}
