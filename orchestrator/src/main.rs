//! jarsmith CLI entrypoint.
//!
//! This binary drives the build, aggregation, publication, coverage, and
//! clean pipelines of a multi-module project described by `jarsmith.toml`.
//! Progress goes to stderr; the run summary goes to stderr, or to stdout as
//! JSON when `--json` is given.

use camino::Utf8PathBuf;
use clap::Parser;
use jarsmith::cli::{Cli, Command};
use jarsmith::config::{ConfigError, OrchestratorConfig};
use jarsmith::coverage::JacocoCliGenerator;
use jarsmith::error::{OrchestratorError, Result};
use jarsmith::executor::SystemCommandExecutor;
use jarsmith::pipeline::{Pipeline, PipelineOptions, RunSummary, Services};
use jarsmith::publish::transport::HttpTransport;
use jarsmith::summary::{format_human, format_json, write_stderr_line};
use jarsmith::version::Version;
use std::io::Write;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, cli.json, &mut stdout, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Installs the log subscriber. `RUST_LOG` wins over the verbosity flags.
fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<RunSummary> {
    let config = load_config(cli)?;
    log::debug!(
        "loaded {} module(s) for {} {}",
        config.registry.len(),
        config.project.family,
        config.project.version
    );

    let executor = SystemCommandExecutor::new(config.commands.timeout());
    let transport = HttpTransport::new(Duration::from_secs(config.publish.timeout_secs));
    let generator = JacocoCliGenerator::new(&config, &executor);
    let services = Services {
        executor: &executor,
        transport: &transport,
        generator: &generator,
    };
    let options = PipelineOptions {
        skip_build: cli.skip_build(),
        dry_run: matches!(&cli.command, Command::Publish(args) if args.dry_run),
        quiet: cli.quiet,
    };

    let pipeline = Pipeline::new(&config, services, options);
    match &cli.command {
        Command::Build(_) => pipeline.build(stderr),
        Command::Publish(_) => pipeline.publish(stderr),
        Command::Coverage(_) => pipeline.coverage(stderr),
        Command::Clean => pipeline.clean(stderr),
    }
}

/// Loads the configuration, applying a `--release-version` override.
fn load_config(cli: &Cli) -> Result<OrchestratorConfig> {
    let cwd = std::env::current_dir()?;
    let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| {
        OrchestratorError::Io(std::io::Error::other(format!(
            "current directory is not valid UTF-8: {e}"
        )))
    })?;
    let root = cli.project_root(&cwd);
    let config = OrchestratorConfig::load(&cli.config_path(&root), &root)?;

    match &cli.command {
        Command::Publish(args) => match args.release_version.as_deref() {
            Some(version) => {
                let version = Version::try_from(version).map_err(ConfigError::from)?;
                Ok(config.with_version(version))
            }
            None => Ok(config),
        },
        _ => Ok(config),
    }
}

/// Reports the run and maps it to a process exit code.
///
/// A run that completed but left any module unpublished exits with 1.
fn exit_code_for_run_result(
    result: Result<RunSummary>,
    json: bool,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> i32 {
    match result {
        Ok(summary) => {
            if json {
                if writeln!(stdout, "{}", format_json(&summary)).is_err() {
                    // Best-effort output; the exit code still reports the run.
                }
            } else {
                write_stderr_line(stderr, "");
                write_stderr_line(stderr, format_human(&summary).trim_end());
            }
            i32::from(!summary.is_success())
        }
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                write_stderr_line(stderr, format!("  caused by: {cause}"));
                source = cause.source();
            }
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarsmith::lifecycle::Phase;
    use jarsmith::module_name::ModuleName;
    use jarsmith::pipeline::Stage;
    use jarsmith::publish::channel::RepositoryChannel;
    use jarsmith::publish::coordinates::Coordinates;
    use jarsmith::publish::{PublishOutcome, PublishStatus};
    use rstest::{fixture, rstest};

    #[fixture]
    fn summary() -> RunSummary {
        let version = Version::try_from("1.0.0").expect("valid version");
        let module = ModuleName::from("base");
        RunSummary {
            version: version.clone(),
            stages: vec![Stage::Build, Stage::Aggregate, Stage::Publish],
            build: None,
            aggregation: None,
            publications: vec![PublishOutcome {
                module: module.clone(),
                coordinates: Coordinates::new("net.codersky", "base", &module, version),
                channel: RepositoryChannel::Release,
                endpoint: Some("https://repo.example/releases".to_owned()),
                status: PublishStatus::Published,
                files: Vec::new(),
                warnings: Vec::new(),
                error: None,
            }],
            coverage: None,
            clean: None,
        }
    }

    #[rstest]
    fn successful_run_exits_zero(summary: RunSummary) {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(summary), false, &mut stdout, &mut stderr);

        assert_eq!(exit_code, 0);
        assert!(stdout.is_empty());
        let text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(text.contains("base published as net.codersky.base:base:1.0.0"));
    }

    #[rstest]
    fn failed_publication_exits_one(mut summary: RunSummary) {
        summary.publications[0].status = PublishStatus::Failed;
        summary.publications[0].error = Some("missing credentials".to_owned());

        let exit_code =
            exit_code_for_run_result(Ok(summary), false, &mut Vec::new(), &mut Vec::new());
        assert_eq!(exit_code, 1);
    }

    #[rstest]
    fn json_summary_goes_to_stdout(summary: RunSummary) {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(summary), true, &mut stdout, &mut stderr);

        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
        let json: serde_json::Value = serde_json::from_slice(&stdout).expect("valid JSON");
        assert_eq!(json["publications"][0]["status"], "published");
    }

    #[test]
    fn error_prints_message_and_returns_one() {
        let err = OrchestratorError::ModulePhaseFailure {
            phase: Phase::Build,
            module: ModuleName::from("yaml"),
            reason: "compilation failed".to_owned(),
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), false, &mut Vec::new(), &mut stderr);
        assert_eq!(exit_code, 1);

        let text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(text.contains("build failed for module yaml: compilation failed"));
    }

    #[test]
    fn error_prints_source_chain() {
        let err = OrchestratorError::CleanFailed {
            path: Utf8PathBuf::from("/p/output"),
            source: std::io::Error::other("device busy"),
        };

        let mut stderr = Vec::new();
        exit_code_for_run_result(Err(err), false, &mut Vec::new(), &mut stderr);

        let text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(text.contains("caused by: device busy"));
    }
}
