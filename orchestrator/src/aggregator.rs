//! Artifact aggregation into the root output directory.
//!
//! Each module's packaged artifact is copied, never moved, into the root
//! output directory under its canonical name (see
//! [`ArtifactName`](crate::artifact::naming::ArtifactName)). Existing
//! targets are overwritten, so aggregating unchanged inputs twice leaves
//! byte-identical files.

use crate::artifact::naming::ArtifactName;
use crate::artifact::scan::{self, ARTIFACT_EXTENSION, Selection, Variant};
use crate::artifact::{Artifact, ArtifactKind};
use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, Result};
use crate::module_name::ModuleName;
use crate::registry::ModuleDescriptor;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::fs;

const WRITE_MARKER: &str = ".jarsmith-writable";

/// A non-fatal condition raised while aggregating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregationWarning {
    /// The module's output directory holds no packaged artifact.
    NoArtifactsFound {
        /// The module.
        module: ModuleName,
        /// The directory that was scanned.
        dir: Utf8PathBuf,
    },
    /// An older candidate lost to a newer one.
    StaleArtifactIgnored {
        /// The module.
        module: ModuleName,
        /// The ignored file.
        path: Utf8PathBuf,
    },
}

impl fmt::Display for AggregationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoArtifactsFound { module, dir } => {
                write!(f, "{module}: no artifacts found in {dir}")
            }
            Self::StaleArtifactIgnored { module, path } => {
                write!(f, "{module}: stale artifact ignored: {path}")
            }
        }
    }
}

/// Aggregation outcome for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleAggregation {
    /// The module.
    pub module: ModuleName,
    /// The module's main artifact, if one was found.
    pub main: Option<Artifact>,
    /// The module's sources bundle, if one was found.
    pub sources: Option<Artifact>,
    /// Files written to the root output directory.
    pub copied: Vec<Utf8PathBuf>,
    /// Warnings raised for this module.
    pub warnings: Vec<AggregationWarning>,
}

/// Aggregation outcome for the whole registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationReport {
    /// The root output directory.
    pub output_dir: Utf8PathBuf,
    /// One entry per module, in registry order.
    pub modules: Vec<ModuleAggregation>,
}

impl AggregationReport {
    /// The entry for `module`, if present.
    #[must_use]
    pub fn module(&self, module: &str) -> Option<&ModuleAggregation> {
        self.modules.iter().find(|m| m.module.as_str() == module)
    }

    /// Every warning raised, in registry order.
    pub fn warnings(&self) -> impl Iterator<Item = &AggregationWarning> {
        self.modules.iter().flat_map(|m| m.warnings.iter())
    }
}

/// Copies module artifacts into the root output directory.
pub struct Aggregator<'a> {
    config: &'a OrchestratorConfig,
}

impl<'a> Aggregator<'a> {
    /// Create an aggregator for the configured project.
    #[must_use]
    pub fn new(config: &'a OrchestratorConfig) -> Self {
        Self { config }
    }

    /// Ensure the root output directory exists and is writable.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or is not writable.
    pub fn prepare(&self) -> Result<Utf8PathBuf> {
        let output_dir = self.config.output_dir();

        let not_writable = |e: std::io::Error| OrchestratorError::TargetNotWritable {
            path: output_dir.clone(),
            reason: e.to_string(),
        };
        fs::create_dir_all(&output_dir).map_err(not_writable)?;

        let marker = output_dir.join(WRITE_MARKER);
        fs::write(&marker, self.config.project.family.as_bytes()).map_err(not_writable)?;
        if let Err(e) = fs::remove_file(&marker) {
            debug!("could not remove {marker}: {e}");
        }
        Ok(output_dir)
    }

    /// Aggregate every registered module.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory is unusable or a copy fails.
    /// Modules without artifacts only raise warnings.
    pub fn aggregate(&self) -> Result<AggregationReport> {
        let output_dir = self.prepare()?;
        let modules = self
            .config
            .registry
            .iter()
            .map(|module| self.aggregate_module(module, &output_dir))
            .collect::<Result<Vec<_>>>()?;
        Ok(AggregationReport {
            output_dir,
            modules,
        })
    }

    fn aggregate_module(
        &self,
        module: &ModuleDescriptor,
        output_dir: &Utf8Path,
    ) -> Result<ModuleAggregation> {
        let module_output = self.config.layout(module).output_dir();
        let name = module.name().clone();
        let mut warnings = Vec::new();
        let mut copied = Vec::new();

        let (variant, kind) = if module.is_merged() {
            (Variant::Merged, ArtifactKind::Merged)
        } else {
            (Variant::Plain, ArtifactKind::Primary)
        };

        let main = self.locate(module, &module_output, variant, kind, &mut warnings)?;
        match &main {
            Some(artifact) => copied.push(self.copy(artifact, output_dir)?),
            None => {
                warn!("{name}: no artifacts found in {module_output}");
                warnings.push(AggregationWarning::NoArtifactsFound {
                    module: name.clone(),
                    dir: module_output.clone(),
                });
            }
        }

        let sources = self.locate(
            module,
            &module_output,
            Variant::Sources,
            ArtifactKind::Sources,
            &mut warnings,
        )?;
        if let Some(artifact) = sources
            .as_ref()
            .filter(|_| self.config.project.aggregate_sources)
        {
            copied.push(self.copy(artifact, output_dir)?);
        }

        Ok(ModuleAggregation {
            module: name,
            main,
            sources,
            copied,
            warnings,
        })
    }

    fn locate(
        &self,
        module: &ModuleDescriptor,
        module_output: &Utf8Path,
        variant: Variant,
        kind: ArtifactKind,
        warnings: &mut Vec<AggregationWarning>,
    ) -> Result<Option<Artifact>> {
        let selection = scan::find_newest(module_output, variant).map_err(|e| {
            OrchestratorError::AggregationFailed {
                module: module.name().clone(),
                reason: format!("cannot scan {module_output}: {e}"),
            }
        })?;
        let Some(Selection { chosen, stale }) = selection else {
            return Ok(None);
        };

        for candidate in stale {
            warn!("{}: stale artifact ignored: {}", module.name(), candidate.path);
            warnings.push(AggregationWarning::StaleArtifactIgnored {
                module: module.name().clone(),
                path: candidate.path,
            });
        }

        let target_name = self.target_name(module, kind, &chosen.path);
        debug!("{}: {kind} artifact {} -> {target_name}", module.name(), chosen.path);
        Ok(Some(Artifact {
            kind,
            module: module.name().clone(),
            source: chosen.path,
            target_name,
        }))
    }

    /// Canonical root output name for `source` as an artifact of `kind`.
    #[must_use]
    pub fn target_name(
        &self,
        module: &ModuleDescriptor,
        kind: ArtifactKind,
        source: &Utf8Path,
    ) -> String {
        ArtifactName::new(
            &self.config.project.family,
            module.name(),
            module.is_primary(),
            kind,
            self.config.module_version(module),
            source.extension().unwrap_or(ARTIFACT_EXTENSION),
        )
        .filename()
    }

    fn copy(&self, artifact: &Artifact, output_dir: &Utf8Path) -> Result<Utf8PathBuf> {
        let dest = output_dir.join(&artifact.target_name);
        fs::copy(&artifact.source, &dest).map_err(|e| OrchestratorError::AggregationFailed {
            module: artifact.module.clone(),
            reason: format!("failed to copy {} to {dest}: {e}", artifact.source),
        })?;
        info!("{}: {} -> {dest}", artifact.module, artifact.source);
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    struct Project {
        _temp: tempfile::TempDir,
        root: Utf8PathBuf,
    }

    impl Project {
        fn new() -> Self {
            let temp = tempfile::tempdir().expect("temp dir");
            let root =
                Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp dir");
            Self { _temp: temp, root }
        }

        fn write(&self, relative: &str, body: &[u8]) -> Utf8PathBuf {
            let path = self.root.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create parent");
            }
            fs::write(&path, body).expect("write fixture");
            path
        }

        fn config(&self, extra: &str) -> OrchestratorConfig {
            let text = format!(
                r#"
                [project]
                family = "JSky"
                namespace = "net.codersky"
                version = "1.0.0-SNAPSHOT"
                {extra}

                [[module]]
                name = "base"
                primary = true

                [[module]]
                name = "yaml"
                "#
            );
            OrchestratorConfig::from_toml_str(&text, &self.root).expect("valid config")
        }
    }

    fn set_mtime(path: &Utf8Path, secs: u64) {
        let file = fs::File::options().write(true).open(path).expect("open fixture");
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .expect("set mtime");
    }

    #[test]
    fn copies_with_canonical_names() {
        let project = Project::new();
        project.write("base/output/base.jar", b"base");
        project.write("yaml/output/yaml.jar", b"yaml");
        let config = project.config("");

        let report = Aggregator::new(&config).aggregate().expect("aggregation succeeds");

        let output = project.root.join("output");
        assert_eq!(fs::read(output.join("JSky-1.0.0-SNAPSHOT.jar")).expect("base copy"), b"base");
        assert_eq!(
            fs::read(output.join("JSky-yaml-1.0.0-SNAPSHOT.jar")).expect("yaml copy"),
            b"yaml"
        );
        assert!(project.root.join("yaml/output/yaml.jar").exists(), "source kept");
        assert_eq!(report.warnings().count(), 0);
    }

    #[test]
    fn empty_module_only_warns() {
        let project = Project::new();
        project.write("base/output/base.jar", b"base");
        let config = project.config("");

        let report = Aggregator::new(&config).aggregate().expect("aggregation succeeds");

        let yaml = report.module("yaml").expect("yaml entry");
        assert!(yaml.main.is_none());
        assert!(matches!(
            yaml.warnings.as_slice(),
            [AggregationWarning::NoArtifactsFound { .. }]
        ));
        assert!(report.module("base").and_then(|m| m.main.as_ref()).is_some());
    }

    #[test]
    fn companion_bundles_are_not_main_artifacts() {
        let project = Project::new();
        project.write("yaml/output/yaml-javadoc.jar", b"docs");
        project.write("yaml/output/yaml-sources.jar", b"src");
        let config = project.config("");

        let report = Aggregator::new(&config).aggregate().expect("aggregation succeeds");

        let yaml = report.module("yaml").expect("yaml entry");
        assert!(yaml.main.is_none());
        let sources = yaml.sources.as_ref().expect("sources located");
        assert_eq!(sources.target_name, "JSky-yaml-1.0.0-SNAPSHOT-sources.jar");
        assert!(yaml.copied.is_empty(), "sources copied only when enabled");
    }

    #[test]
    fn sources_copied_when_enabled() {
        let project = Project::new();
        project.write("yaml/output/yaml.jar", b"yaml");
        project.write("yaml/output/yaml-sources.jar", b"src");
        let config = project.config("aggregate_sources = true");

        Aggregator::new(&config).aggregate().expect("aggregation succeeds");

        assert!(project.root.join("output/JSky-yaml-1.0.0-SNAPSHOT-sources.jar").exists());
    }

    #[test]
    fn newest_candidate_wins_and_others_are_stale() {
        let project = Project::new();
        let old = project.write("yaml/output/yaml-0.9.jar", b"old");
        let new = project.write("yaml/output/yaml-1.0.jar", b"new");
        set_mtime(&old, 1_000);
        set_mtime(&new, 2_000);
        let config = project.config("");

        let report = Aggregator::new(&config).aggregate().expect("aggregation succeeds");

        let copied =
            fs::read(project.root.join("output/JSky-yaml-1.0.0-SNAPSHOT.jar")).expect("copy");
        assert_eq!(copied, b"new");
        let yaml = report.module("yaml").expect("yaml entry");
        assert!(matches!(
            yaml.warnings.as_slice(),
            [AggregationWarning::StaleArtifactIgnored { path, .. }] if path == &old
        ));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let project = Project::new();
        project.write("base/output/base.jar", b"base-bytes");
        project.write("yaml/output/yaml.jar", b"yaml-bytes");
        let config = project.config("");
        let aggregator = Aggregator::new(&config);

        let first = aggregator.aggregate().expect("first run");
        let snapshot: Vec<Vec<u8>> = first
            .modules
            .iter()
            .flat_map(|m| m.copied.iter())
            .map(|p| fs::read(p).expect("read copy"))
            .collect();
        let second = aggregator.aggregate().expect("second run");
        let again: Vec<Vec<u8>> = second
            .modules
            .iter()
            .flat_map(|m| m.copied.iter())
            .map(|p| fs::read(p).expect("read copy"))
            .collect();

        assert_eq!(first, second);
        assert_eq!(snapshot, again);
    }

    #[test]
    fn prepare_removes_its_write_marker() {
        let project = Project::new();
        let config = project.config("");
        let dir = Aggregator::new(&config).prepare().expect("prepare succeeds");
        assert!(dir.is_dir());
        assert!(!dir.join(WRITE_MARKER).exists());
        assert_eq!(std::fs::read_dir(&dir).expect("list output").count(), 0);
    }
}
