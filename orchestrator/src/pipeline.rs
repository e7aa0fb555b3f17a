//! Stage pipelines behind each command.
//!
//! Stages run in a fixed order and each command names its sequence
//! explicitly:
//!
//! - build: Build → Aggregate
//! - publish: Build → Aggregate → Publish
//! - coverage: Build → Coverage
//! - clean: Clean
//!
//! A failing Build or Clean stage aborts the pipeline. Publish failures are
//! per module and recorded in the [`RunSummary`].

use crate::aggregator::{AggregationReport, Aggregator};
use crate::clean::{self, CleanReport};
use crate::config::OrchestratorConfig;
use crate::coverage::{self, CombinedReport, ReportGenerator};
use crate::error::Result;
use crate::executor::CommandExecutor;
use crate::lifecycle::{LifecycleDriver, Phase, PhaseReport};
use crate::publish::transport::RepositoryTransport;
use crate::publish::{PublishOutcome, Publisher};
use crate::summary::write_stderr_line;
use crate::version::Version;
use serde::Serialize;
use std::fmt;
use std::io::Write;

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Module build steps.
    Build,
    /// Copy into the root output directory.
    Aggregate,
    /// Upload to the remote repository.
    Publish,
    /// Combined coverage report.
    Coverage,
    /// Module clean steps and root output removal.
    Clean,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Build => "build",
            Self::Aggregate => "aggregate",
            Self::Publish => "publish",
            Self::Coverage => "coverage",
            Self::Clean => "clean",
        })
    }
}

/// Options shared by every pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Skip external module build commands.
    pub skip_build: bool,
    /// Plan publications without uploading.
    pub dry_run: bool,
    /// Suppress progress output.
    pub quiet: bool,
}

/// The collaborators a pipeline calls out to.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    /// Runs module commands.
    pub executor: &'a dyn CommandExecutor,
    /// Talks to the remote repository.
    pub transport: &'a dyn RepositoryTransport,
    /// Renders coverage reports.
    pub generator: &'a dyn ReportGenerator,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// The project version used.
    pub version: Version,
    /// Stages that ran, in order.
    pub stages: Vec<Stage>,
    /// Module build steps.
    pub build: Option<PhaseReport>,
    /// Aggregated artifacts and warnings.
    pub aggregation: Option<AggregationReport>,
    /// One outcome per module, when publishing.
    pub publications: Vec<PublishOutcome>,
    /// The combined coverage report.
    pub coverage: Option<CombinedReport>,
    /// The clean result.
    pub clean: Option<CleanReport>,
}

impl RunSummary {
    fn new(version: Version) -> Self {
        Self {
            version,
            stages: Vec::new(),
            build: None,
            aggregation: None,
            publications: Vec::new(),
            coverage: None,
            clean: None,
        }
    }

    /// Whether every module published successfully.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.publications.iter().any(PublishOutcome::is_failure)
    }
}

/// Runs the stage sequences.
pub struct Pipeline<'a> {
    config: &'a OrchestratorConfig,
    services: Services<'a>,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline.
    #[must_use]
    pub fn new(
        config: &'a OrchestratorConfig,
        services: Services<'a>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            config,
            services,
            options,
        }
    }

    /// Build → Aggregate.
    ///
    /// # Errors
    ///
    /// Returns an error if a module build or the aggregation fails.
    pub fn build(&self, stderr: &mut dyn Write) -> Result<RunSummary> {
        let mut summary = self.summary();
        self.build_stage(&mut summary, stderr)?;
        self.aggregate_stage(&mut summary, stderr)?;
        Ok(summary)
    }

    /// Build → Aggregate → Publish.
    ///
    /// # Errors
    ///
    /// Returns an error if a module build or the aggregation fails. Publish
    /// failures are recorded in the summary instead.
    pub fn publish(&self, stderr: &mut dyn Write) -> Result<RunSummary> {
        let mut summary = self.build(stderr)?;
        self.progress(stderr, Stage::Publish, "publishing modules");
        summary.publications = summary
            .aggregation
            .as_ref()
            .map(|report| {
                Publisher::new(self.config, self.services.transport)
                    .dry_run(self.options.dry_run)
                    .publish_all(report)
            })
            .unwrap_or_default();
        summary.stages.push(Stage::Publish);
        Ok(summary)
    }

    /// Build → Coverage.
    ///
    /// # Errors
    ///
    /// Returns an error if a module build or the report generation fails.
    pub fn coverage(&self, stderr: &mut dyn Write) -> Result<RunSummary> {
        let mut summary = self.summary();
        self.build_stage(&mut summary, stderr)?;
        self.progress(stderr, Stage::Coverage, "collecting coverage data");
        summary.coverage = Some(coverage::aggregate_coverage(
            self.config,
            self.services.generator,
        )?);
        summary.stages.push(Stage::Coverage);
        Ok(summary)
    }

    /// Clean.
    ///
    /// # Errors
    ///
    /// Returns an error if a module clean fails or the root output tree
    /// cannot be removed.
    pub fn clean(&self, stderr: &mut dyn Write) -> Result<RunSummary> {
        let mut summary = self.summary();
        self.progress(stderr, Stage::Clean, "cleaning modules and root output");
        summary.clean = Some(clean::clean(self.config, self.services.executor)?);
        summary.stages.push(Stage::Clean);
        Ok(summary)
    }

    fn summary(&self) -> RunSummary {
        RunSummary::new(self.config.project.version.clone())
    }

    fn build_stage(&self, summary: &mut RunSummary, stderr: &mut dyn Write) -> Result<()> {
        self.progress(
            stderr,
            Stage::Build,
            &format!("building {} module(s)", self.config.registry.len()),
        );
        let report = LifecycleDriver::new(self.config, self.services.executor)
            .skip_commands(self.options.skip_build)
            .run_phase(Phase::Build)?;
        summary.build = Some(report);
        summary.stages.push(Stage::Build);
        Ok(())
    }

    fn aggregate_stage(&self, summary: &mut RunSummary, stderr: &mut dyn Write) -> Result<()> {
        self.progress(
            stderr,
            Stage::Aggregate,
            &format!("collecting artifacts into {}", self.config.output_dir()),
        );
        summary.aggregation = Some(Aggregator::new(self.config).aggregate()?);
        summary.stages.push(Stage::Aggregate);
        Ok(())
    }

    fn progress(&self, stderr: &mut dyn Write, stage: Stage, message: &str) {
        if !self.options.quiet {
            write_stderr_line(stderr, format!("[{stage}] {message}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::MockReportGenerator;
    use crate::publish::PublishStatus;
    use crate::publish::transport::MockRepositoryTransport;
    use crate::test_utils::StubExecutor;
    use camino::Utf8PathBuf;
    use rstest::rstest;

    struct Project {
        _temp: tempfile::TempDir,
        config: OrchestratorConfig,
    }

    fn project() -> Project {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp dir");
        for (path, body) in [("base/output/base.jar", "base"), ("yaml/output/yaml.jar", "yaml")] {
            let path = root.join(path);
            std::fs::create_dir_all(path.parent().expect("parent")).expect("create dir");
            std::fs::write(path, body).expect("write jar");
        }
        let text = r#"
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
        let config = OrchestratorConfig::from_toml_str(text, &root).expect("valid config");
        Project {
            _temp: temp,
            config,
        }
    }

    #[rstest]
    #[case::quiet(true)]
    #[case::verbose(false)]
    fn build_respects_quiet_flag(#[case] quiet: bool) {
        let project = project();
        let executor = StubExecutor::new(Vec::new());
        let transport = MockRepositoryTransport::new();
        let generator = MockReportGenerator::new();
        let services = Services {
            executor: &executor,
            transport: &transport,
            generator: &generator,
        };
        let options = PipelineOptions {
            quiet,
            ..PipelineOptions::default()
        };
        let mut stderr = Vec::new();

        let summary = Pipeline::new(&project.config, services, options)
            .build(&mut stderr)
            .expect("build succeeds");

        assert_eq!(summary.stages, [Stage::Build, Stage::Aggregate]);
        let output = String::from_utf8_lossy(&stderr);
        if quiet {
            assert!(output.is_empty(), "expected no output in quiet mode");
        } else {
            assert!(output.contains("[build]"), "expected progress output");
        }
    }

    #[test]
    fn dry_run_publish_runs_three_stages() {
        let project = project();
        let executor = StubExecutor::new(Vec::new());
        let transport = MockRepositoryTransport::new();
        let generator = MockReportGenerator::new();
        let services = Services {
            executor: &executor,
            transport: &transport,
            generator: &generator,
        };
        let options = PipelineOptions {
            dry_run: true,
            quiet: true,
            ..PipelineOptions::default()
        };

        let summary = Pipeline::new(&project.config, services, options)
            .publish(&mut Vec::new())
            .expect("publish succeeds");

        assert_eq!(summary.stages, [Stage::Build, Stage::Aggregate, Stage::Publish]);
        assert_eq!(summary.publications.len(), 2);
        assert!(
            summary
                .publications
                .iter()
                .all(|p| p.status == PublishStatus::Planned)
        );
        assert!(summary.is_success());
    }

    #[test]
    fn coverage_skips_aggregation() {
        let project = project();
        let executor = StubExecutor::new(Vec::new());
        let transport = MockRepositoryTransport::new();
        let mut generator = MockReportGenerator::new();
        generator.expect_generate().never();
        let services = Services {
            executor: &executor,
            transport: &transport,
            generator: &generator,
        };

        let summary = Pipeline::new(&project.config, services, PipelineOptions::default())
            .coverage(&mut Vec::new())
            .expect("coverage succeeds");

        assert_eq!(summary.stages, [Stage::Build, Stage::Coverage]);
        assert!(summary.aggregation.is_none());
        assert!(!project.config.output_dir().join("JSky-1.0.0-SNAPSHOT.jar").exists());
    }
}
