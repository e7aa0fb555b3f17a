//! Run summary rendering.
//!
//! The human-readable form lists, per module, the artifacts produced and
//! published, the channel and endpoint used, and every warning and error.
//! The JSON form serialises the whole [`RunSummary`].

use crate::pipeline::RunSummary;
use crate::publish::{PublishOutcome, PublishStatus};
use std::fmt::Write as _;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Format a run summary for people.
///
/// # Examples
///
/// ```no_run
/// use jarsmith::summary::format_human;
/// # fn summary() -> jarsmith::pipeline::RunSummary { unimplemented!() }
///
/// let text = format_human(&summary());
/// assert!(text.contains("Summary"));
/// ```
#[must_use]
pub fn format_human(summary: &RunSummary) -> String {
    let mut out = format!("Summary (version {})\n", summary.version);

    if let Some(aggregation) = &summary.aggregation {
        let _ = writeln!(out, "\nArtifacts in {}:", aggregation.output_dir);
        for module in &aggregation.modules {
            if module.copied.is_empty() {
                let _ = writeln!(out, "  {}: none", module.module);
            }
            for path in &module.copied {
                let name = path.file_name().unwrap_or(path.as_str());
                let _ = writeln!(out, "  {}: {name}", module.module);
            }
        }
        let warnings: Vec<_> = aggregation.warnings().collect();
        if !warnings.is_empty() {
            out.push_str("\nWarnings:\n");
            for warning in warnings {
                let _ = writeln!(out, "  - {warning}");
            }
        }
    }

    if !summary.publications.is_empty() {
        out.push_str("\nPublications:\n");
        for outcome in &summary.publications {
            push_publication(&mut out, outcome);
        }
    }

    if let Some(coverage) = &summary.coverage {
        out.push_str("\nCoverage:\n");
        match &coverage.paths {
            Some(paths) => {
                let _ = writeln!(out, "  report: {}", paths.xml);
                let _ = writeln!(out, "  html:   {}", paths.html);
            }
            None => out.push_str("  no execution data; report skipped\n"),
        }
        for module in coverage.without_data() {
            let _ = writeln!(out, "  {module}: no coverage data");
        }
    }

    if let Some(clean) = &summary.clean {
        let state = if clean.removed { "removed" } else { "already absent" };
        let _ = writeln!(
            out,
            "\nCleaned {} module(s); {} {state}",
            clean.modules.steps.len(),
            clean.output_dir
        );
    }

    out
}

fn push_publication(out: &mut String, outcome: &PublishOutcome) {
    let status = match outcome.status {
        PublishStatus::Published => "published",
        PublishStatus::Planned => "planned",
        PublishStatus::Skipped => "skipped",
        PublishStatus::Failed => "FAILED",
    };
    let endpoint = outcome.endpoint.as_deref().unwrap_or("<not configured>");
    let _ = writeln!(
        out,
        "  {} {status} as {} to {} ({endpoint})",
        outcome.module, outcome.coordinates, outcome.channel
    );
    for file in &outcome.files {
        let _ = writeln!(out, "    {file}");
    }
    for warning in &outcome.warnings {
        let _ = writeln!(out, "    warning: {warning}");
    }
    if let Some(error) = &outcome.error {
        let _ = writeln!(out, "    error: {error}");
    }
}

/// Format a run summary as JSON.
#[must_use]
pub fn format_json(summary: &RunSummary) -> String {
    serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{AggregationReport, AggregationWarning, ModuleAggregation};
    use crate::module_name::ModuleName;
    use crate::pipeline::Stage;
    use crate::publish::channel::RepositoryChannel;
    use crate::publish::coordinates::Coordinates;
    use crate::version::Version;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};

    #[fixture]
    fn summary() -> RunSummary {
        let version = Version::try_from("1.0.0-SNAPSHOT").expect("valid version");
        let yaml = ModuleName::from("yaml");
        RunSummary {
            version: version.clone(),
            stages: vec![Stage::Build, Stage::Aggregate, Stage::Publish],
            build: None,
            aggregation: Some(AggregationReport {
                output_dir: Utf8PathBuf::from("/p/output"),
                modules: vec![
                    ModuleAggregation {
                        module: ModuleName::from("base"),
                        main: None,
                        sources: None,
                        copied: vec![Utf8PathBuf::from("/p/output/JSky-1.0.0-SNAPSHOT.jar")],
                        warnings: Vec::new(),
                    },
                    ModuleAggregation {
                        module: yaml.clone(),
                        main: None,
                        sources: None,
                        copied: Vec::new(),
                        warnings: vec![AggregationWarning::NoArtifactsFound {
                            module: yaml.clone(),
                            dir: Utf8PathBuf::from("/p/yaml/output"),
                        }],
                    },
                ],
            }),
            publications: vec![PublishOutcome {
                module: yaml.clone(),
                coordinates: Coordinates::new("net.codersky", "yaml", &yaml, version),
                channel: RepositoryChannel::Snapshot,
                endpoint: None,
                status: PublishStatus::Failed,
                files: Vec::new(),
                warnings: Vec::new(),
                error: Some("no artifact was aggregated for yaml".to_owned()),
            }],
            coverage: None,
            clean: None,
        }
    }

    #[rstest]
    fn human_summary_lists_artifacts_warnings_and_errors(summary: RunSummary) {
        let text = format_human(&summary);

        assert!(text.contains("base: JSky-1.0.0-SNAPSHOT.jar"));
        assert!(text.contains("yaml: no artifacts found"));
        assert!(text.contains("FAILED as net.codersky.yaml:yaml:1.0.0-SNAPSHOT to snapshot"));
        assert!(text.contains("error: no artifact was aggregated"));
    }

    #[rstest]
    fn json_summary_is_structured(summary: RunSummary) {
        let json: serde_json::Value =
            serde_json::from_str(&format_json(&summary)).expect("valid JSON");

        assert_eq!(json["version"], "1.0.0-SNAPSHOT");
        assert_eq!(json["stages"][2], "publish");
        assert_eq!(json["publications"][0]["channel"], "snapshot");
        assert_eq!(json["publications"][0]["coordinates"]["group_id"], "net.codersky.yaml");
        assert_eq!(
            json["aggregation"]["modules"][1]["warnings"][0]["kind"],
            "no_artifacts_found"
        );
    }

    #[test]
    fn write_stderr_line_appends_newline() {
        let mut buffer = Vec::new();
        write_stderr_line(&mut buffer, "hello");
        assert_eq!(buffer, b"hello\n");
    }
}
