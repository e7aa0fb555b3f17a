//! Clean orchestration.
//!
//! Every module's clean step is dispatched first; the root output tree is
//! removed only once they have all finished. Removing a tree that does not
//! exist is a no-op, so cleaning twice succeeds.

use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, Result};
use crate::executor::CommandExecutor;
use crate::lifecycle::{LifecycleDriver, Phase, PhaseReport};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use serde::Serialize;
use std::fs;

/// Result of a clean run.
#[derive(Debug, Clone, Serialize)]
pub struct CleanReport {
    /// The per-module clean steps.
    pub modules: PhaseReport,
    /// The root output directory.
    pub output_dir: Utf8PathBuf,
    /// Whether the root output directory existed and was removed.
    pub removed: bool,
}

/// Clean every module, then remove the root output tree.
///
/// # Errors
///
/// Returns the first module clean failure, or an error if the root output
/// tree exists but cannot be removed.
pub fn clean(config: &OrchestratorConfig, executor: &dyn CommandExecutor) -> Result<CleanReport> {
    let modules = LifecycleDriver::new(config, executor).run_phase(Phase::Clean)?;
    let output_dir = config.output_dir();
    let removed = remove_tree(&output_dir)?;
    Ok(CleanReport {
        modules,
        output_dir,
        removed,
    })
}

/// Remove `dir` recursively, returning whether it existed.
///
/// # Errors
///
/// Returns an error if `dir` exists and cannot be removed.
pub fn remove_tree(dir: &Utf8Path) -> Result<bool> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {
            info!("removed {dir}");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{dir} already absent");
            Ok(false)
        }
        Err(source) => Err(OrchestratorError::CleanFailed {
            path: dir.to_owned(),
            source,
        }),
    }
}
