//! Error types for the jarsmith orchestrator.
//!
//! Run-level failures are collected in [`OrchestratorError`]. Failures that
//! only affect a single module's publication live in
//! [`crate::publish::PublishError`] and are reported in the run summary
//! instead of aborting the run.

use crate::assembler::AssemblyError;
use crate::config::ConfigError;
use crate::lifecycle::Phase;
use crate::module_name::ModuleName;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that abort an orchestration run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The configuration file could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A module's build or clean command failed.
    #[error("{phase} failed for module {module}: {reason}")]
    ModulePhaseFailure {
        /// The lifecycle phase that was running.
        phase: Phase,
        /// The module whose phase failed.
        module: ModuleName,
        /// Description of the failure, usually the command's stderr.
        reason: String,
    },

    /// Merging a module's embedded dependencies failed.
    #[error("failed to assemble merged artifact for {module}")]
    Assembly {
        /// The module being assembled.
        module: ModuleName,
        /// The underlying assembly failure.
        #[source]
        source: AssemblyError,
    },

    /// Copying an artifact into the root output directory failed.
    #[error("aggregation failed for {module}: {reason}")]
    AggregationFailed {
        /// The module whose artifact could not be copied.
        module: ModuleName,
        /// Description of the copy failure.
        reason: String,
    },

    /// The root output directory exists but is not writable.
    #[error("output directory {path} is not writable: {reason}")]
    TargetNotWritable {
        /// Path to the non-writable directory.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// The coverage report step failed.
    #[error("coverage report failed: {reason}")]
    CoverageFailed {
        /// Description of the failure.
        reason: String,
    },

    /// Removing the root output tree failed.
    #[error("failed to remove {path}")]
    CleanFailed {
        /// The directory that could not be removed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An external command did not finish within its time budget.
    #[error("{program} timed out after {seconds} seconds")]
    CommandTimedOut {
        /// The program that was running.
        program: String,
        /// The timeout that elapsed.
        seconds: u64,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`OrchestratorError`].
pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_phase_failure_names_phase_and_module() {
        let err = OrchestratorError::ModulePhaseFailure {
            phase: Phase::Build,
            module: ModuleName::from("yaml"),
            reason: "compilation error".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("build"));
        assert!(msg.contains("yaml"));
        assert!(msg.contains("compilation error"));
    }

    #[test]
    fn clean_failed_preserves_source() {
        let err = OrchestratorError::CleanFailed {
            path: Utf8PathBuf::from("/tmp/output"),
            source: std::io::Error::other("permission denied"),
        };
        assert!(err.to_string().contains("/tmp/output"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn command_timeout_reports_seconds() {
        let err = OrchestratorError::CommandTimedOut {
            program: "./gradlew".to_owned(),
            seconds: 600,
        };
        assert_eq!(err.to_string(), "./gradlew timed out after 600 seconds");
    }
}
