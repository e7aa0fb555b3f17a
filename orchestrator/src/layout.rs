//! On-disk layout of a module's build outputs.
//!
//! The orchestrator only reads these locations; they are written by the
//! module's own build tooling:
//!
//! ```text
//! <module>/output/*.jar              packaged artifacts
//! <module>/output/classes/**         compiled classes
//! <module>/coverage-data/*.exec      coverage execution data
//! <module>/sources/**                source files
//! ```

use camino::{Utf8Path, Utf8PathBuf};

/// Paths derived from a module directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLayout {
    module_dir: Utf8PathBuf,
}

impl ModuleLayout {
    /// Create a layout rooted at `module_dir`.
    #[must_use]
    pub fn new(module_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            module_dir: module_dir.into(),
        }
    }

    /// The module directory.
    #[must_use]
    pub fn module_dir(&self) -> &Utf8Path {
        &self.module_dir
    }

    /// Directory holding packaged artifacts.
    #[must_use]
    pub fn output_dir(&self) -> Utf8PathBuf {
        self.module_dir.join("output")
    }

    /// Directory holding compiled classes.
    #[must_use]
    pub fn classes_dir(&self) -> Utf8PathBuf {
        self.output_dir().join("classes")
    }

    /// Directory holding coverage execution data.
    #[must_use]
    pub fn coverage_data_dir(&self) -> Utf8PathBuf {
        self.module_dir.join("coverage-data")
    }

    /// Directory holding source files.
    #[must_use]
    pub fn sources_dir(&self) -> Utf8PathBuf {
        self.module_dir.join("sources")
    }
}
