//! Test support utilities for orchestrator behavioural tests.
//!
//! Provides a throwaway project tree with a `jarsmith.toml`, module output
//! directories, and helpers for dropping artifacts and coverage data into
//! it.

use camino::{Utf8Path, Utf8PathBuf};
use jarsmith::config::{CONFIG_FILE_NAME, OrchestratorConfig};
use jarsmith::coverage::{CoverageUnion, ReportGenerator, ReportPaths};
use jarsmith::error::Result;
use std::cell::RefCell;
use tempfile::TempDir;

/// Configuration for the two-module `JSky` project.
pub const TWO_MODULE_CONFIG: &str = r#"
[project]
family = "JSky"
namespace = "net.codersky"
version = "1.0.0-SNAPSHOT"

[[module]]
name = "base"
primary = true

[[module]]
name = "yaml"
"#;

/// A project tree rooted in a temporary directory.
pub struct TempProject {
    _temp: TempDir,
    root: Utf8PathBuf,
}

impl TempProject {
    /// Creates a project whose `jarsmith.toml` holds `config`.
    pub fn new(config: &str) -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root =
            Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("temp dir path not UTF-8");
        std::fs::write(root.join(CONFIG_FILE_NAME), config).expect("failed to write config");
        Self { _temp: temp, root }
    }

    /// The project root.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Loads the project configuration from disk.
    pub fn config(&self) -> OrchestratorConfig {
        OrchestratorConfig::load(&self.root.join(CONFIG_FILE_NAME), &self.root)
            .expect("failed to load config")
    }

    /// Writes `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &[u8]) -> Utf8PathBuf {
        let path = self.root.join(relative);
        let parent = path.parent().expect("file path should have parent");
        std::fs::create_dir_all(parent).expect("failed to create parent dir");
        std::fs::write(&path, contents).expect("failed to write file");
        path
    }

    /// Reads a file from the root output directory.
    pub fn output_file(&self, name: &str) -> Vec<u8> {
        std::fs::read(self.root.join("output").join(name)).expect("output file should exist")
    }
}

/// A report generator that records the unions it was asked to render.
#[derive(Default)]
pub struct RecordingGenerator {
    /// Unions passed to `generate`, in call order.
    pub calls: RefCell<Vec<CoverageUnion>>,
}

impl ReportGenerator for RecordingGenerator {
    fn generate(&self, union: &CoverageUnion, paths: &ReportPaths) -> Result<()> {
        std::fs::write(&paths.xml, b"<report/>")?;
        self.calls.borrow_mut().push(union.clone());
        Ok(())
    }
}
