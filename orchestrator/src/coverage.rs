//! Combined coverage reporting.
//!
//! Every module's execution data, source directories, and class
//! directories are pooled into one union and rendered by a single
//! [`ReportGenerator`] call. A module without execution data still
//! contributes whatever directories it has and never fails the step.

use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, Result};
use crate::executor::{CommandExecutor, failure_reason};
use crate::module_name::ModuleName;
use crate::registry::ModuleDescriptor;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use serde::Serialize;
use std::fs;

/// File name of the machine-readable report.
pub const XML_REPORT: &str = "coverage.xml";

/// Directory name of the human-readable report.
pub const HTML_REPORT: &str = "html";

const EXEC_PATTERN: &str = "*.exec";

/// Coverage inputs found for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageUnit {
    /// The module.
    pub module: ModuleName,
    /// Execution data files.
    pub exec_files: Vec<Utf8PathBuf>,
    /// Source directories.
    pub source_dirs: Vec<Utf8PathBuf>,
    /// Compiled class directories.
    pub class_dirs: Vec<Utf8PathBuf>,
}

impl CoverageUnit {
    /// Collect the coverage inputs of `module`.
    ///
    /// # Errors
    ///
    /// Returns an error if the execution data directory cannot be searched.
    pub fn collect(config: &OrchestratorConfig, module: &ModuleDescriptor) -> Result<Self> {
        let layout = config.layout(module);
        let pattern = format!(
            "{}/{EXEC_PATTERN}",
            glob::Pattern::escape(layout.coverage_data_dir().as_str())
        );
        let paths = glob::glob(&pattern).map_err(|e| OrchestratorError::CoverageFailed {
            reason: format!("invalid pattern {pattern}: {e}"),
        })?;

        let mut exec_files: Vec<Utf8PathBuf> = paths
            .filter_map(std::result::Result::ok)
            .filter_map(|p| Utf8PathBuf::from_path_buf(p).ok())
            .filter(|p| p.is_file())
            .collect();
        exec_files.sort();

        let existing = |dir: Utf8PathBuf| dir.is_dir().then_some(dir);
        Ok(Self {
            module: module.name().clone(),
            exec_files,
            source_dirs: existing(layout.sources_dir()).into_iter().collect(),
            class_dirs: existing(layout.classes_dir()).into_iter().collect(),
        })
    }

    /// Whether the module has any execution data.
    #[must_use]
    pub fn has_data(&self) -> bool {
        !self.exec_files.is_empty()
    }
}

/// The union of every module's coverage inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoverageUnion {
    /// All execution data files.
    pub exec_files: Vec<Utf8PathBuf>,
    /// All source directories.
    pub source_dirs: Vec<Utf8PathBuf>,
    /// All compiled class directories.
    pub class_dirs: Vec<Utf8PathBuf>,
}

impl CoverageUnion {
    /// Pool the inputs of `units`, preserving module order.
    #[must_use]
    pub fn from_units<'a>(units: impl IntoIterator<Item = &'a CoverageUnit>) -> Self {
        let mut union = Self::default();
        for unit in units {
            union.exec_files.extend(unit.exec_files.iter().cloned());
            union.source_dirs.extend(unit.source_dirs.iter().cloned());
            union.class_dirs.extend(unit.class_dirs.iter().cloned());
        }
        union
    }

    /// Whether there is no execution data at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exec_files.is_empty()
    }
}

/// Where a combined report is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportPaths {
    /// The machine-readable report file.
    pub xml: Utf8PathBuf,
    /// The human-readable report directory.
    pub html: Utf8PathBuf,
}

impl ReportPaths {
    /// Report paths under `report_dir`.
    #[must_use]
    pub fn under(report_dir: &Utf8Path) -> Self {
        Self {
            xml: report_dir.join(XML_REPORT),
            html: report_dir.join(HTML_REPORT),
        }
    }
}

/// Renders a combined coverage report.
#[cfg_attr(test, mockall::automock)]
pub trait ReportGenerator {
    /// Render `union` to `paths`.
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be produced.
    fn generate(&self, union: &CoverageUnion, paths: &ReportPaths) -> Result<()>;
}

/// Report generator running the JaCoCo command-line interface.
pub struct JacocoCliGenerator<'a> {
    executor: &'a dyn CommandExecutor,
    java: String,
    cli_jar: Utf8PathBuf,
    working_dir: Utf8PathBuf,
}

impl<'a> JacocoCliGenerator<'a> {
    /// Create a generator from the `[coverage]` settings.
    #[must_use]
    pub fn new(config: &OrchestratorConfig, executor: &'a dyn CommandExecutor) -> Self {
        Self {
            executor,
            java: config.coverage.java.clone(),
            cli_jar: config.root().join(&config.coverage.jacoco_cli),
            working_dir: config.root().to_owned(),
        }
    }

    /// Arguments passed to the Java launcher.
    #[must_use]
    pub fn arguments(&self, union: &CoverageUnion, paths: &ReportPaths) -> Vec<String> {
        let mut args = vec![
            "-jar".to_owned(),
            self.cli_jar.to_string(),
            "report".to_owned(),
        ];
        args.extend(union.exec_files.iter().map(ToString::to_string));
        for dir in &union.class_dirs {
            args.extend(["--classfiles".to_owned(), dir.to_string()]);
        }
        for dir in &union.source_dirs {
            args.extend(["--sourcefiles".to_owned(), dir.to_string()]);
        }
        args.extend([
            "--xml".to_owned(),
            paths.xml.to_string(),
            "--html".to_owned(),
            paths.html.to_string(),
        ]);
        args
    }
}

impl ReportGenerator for JacocoCliGenerator<'_> {
    fn generate(&self, union: &CoverageUnion, paths: &ReportPaths) -> Result<()> {
        let args = self.arguments(union, paths);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.executor.run(&self.java, &args, &self.working_dir)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(OrchestratorError::CoverageFailed {
                reason: failure_reason(&output),
            })
        }
    }
}

/// Result of the coverage step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombinedReport {
    /// Per-module inputs, in registry order.
    pub units: Vec<CoverageUnit>,
    /// Report locations, or `None` when there was no data to report.
    pub paths: Option<ReportPaths>,
}

impl CombinedReport {
    /// Modules that contributed execution data.
    pub fn contributing(&self) -> impl Iterator<Item = &ModuleName> {
        self.units.iter().filter(|u| u.has_data()).map(|u| &u.module)
    }

    /// Modules without execution data.
    pub fn without_data(&self) -> impl Iterator<Item = &ModuleName> {
        self.units.iter().filter(|u| !u.has_data()).map(|u| &u.module)
    }
}

/// Collect every module's coverage inputs and render one combined report.
///
/// # Errors
///
/// Returns an error if inputs cannot be collected, the report directory
/// cannot be created, or the generator fails.
pub fn aggregate_coverage(
    config: &OrchestratorConfig,
    generator: &dyn ReportGenerator,
) -> Result<CombinedReport> {
    let units = config
        .registry
        .iter()
        .map(|module| CoverageUnit::collect(config, module))
        .collect::<Result<Vec<_>>>()?;
    for unit in units.iter().filter(|u| !u.has_data()) {
        debug!("{}: no coverage data", unit.module);
    }

    let union = CoverageUnion::from_units(&units);
    if union.is_empty() {
        info!("coverage: no execution data in any module, report skipped");
        return Ok(CombinedReport { units, paths: None });
    }

    let report_dir = config.output_dir().join(&config.coverage.report_dir);
    fs::create_dir_all(&report_dir).map_err(|e| OrchestratorError::CoverageFailed {
        reason: format!("cannot create {report_dir}: {e}"),
    })?;
    let paths = ReportPaths::under(&report_dir);

    info!(
        "coverage: {} execution file(s) from {} module(s)",
        union.exec_files.len(),
        units.iter().filter(|u| u.has_data()).count()
    );
    generator.generate(&union, &paths)?;
    Ok(CombinedReport {
        units,
        paths: Some(paths),
    })
}
