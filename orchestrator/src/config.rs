//! Orchestrator configuration loaded from `jarsmith.toml`.
//!
//! The file declares the project identity (artifact family, root namespace,
//! version), the module registry, the external commands used for module
//! phases, and the publish and coverage settings. It is parsed once into an
//! immutable [`OrchestratorConfig`] that every component borrows; nothing
//! reads the version or namespace from anywhere else.
//!
//! ```toml
//! [project]
//! family = "JSky"
//! namespace = "net.codersky"
//! version = "1.0.0-SNAPSHOT"
//!
//! [[module]]
//! name = "base"
//! primary = true
//!
//! [[module]]
//! name = "yaml"
//!
//! [publish.snapshot]
//! url = "https://repo.codersky.net/snapshots"
//! username_env = "REPO_USER"
//! password_env = "REPO_PASSWORD"
//! ```

use crate::layout::ModuleLayout;
use crate::registry::{ModuleDescriptor, ModuleRegistry, RegistryError};
use crate::version::{Version, VersionError};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Default configuration file name, resolved against the project root.
pub const CONFIG_FILE_NAME: &str = "jarsmith.toml";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}")]
    Read {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unknown fields.
    #[error("invalid configuration: {reason}")]
    Parse {
        /// Description of the parse error.
        reason: String,
    },

    /// A version string is malformed.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// The module list is invalid.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A field holds an unusable value.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    project: RawProject,
    #[serde(rename = "module", default)]
    modules: Vec<RawModule>,
    #[serde(default)]
    commands: CommandSettings,
    #[serde(default)]
    publish: PublishSettings,
    #[serde(default)]
    coverage: CoverageSettings,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProject {
    family: String,
    namespace: String,
    version: String,
    #[serde(default = "ProjectSettings::default_output_dir")]
    output_dir: Utf8PathBuf,
    #[serde(default)]
    aggregate_sources: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModule {
    name: String,
    #[serde(default)]
    primary: bool,
    namespace: Option<String>,
    version: Option<String>,
    directory: Option<Utf8PathBuf>,
    #[serde(default)]
    merged: bool,
    #[serde(default)]
    embed: Vec<String>,
}

/// Project-wide identity shared by every module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSettings {
    /// Artifact family prefix (e.g. `JSky`).
    pub family: String,
    /// Root namespace for group ids (e.g. `net.codersky`).
    pub namespace: String,
    /// Process-wide version applied to modules without an override.
    pub version: Version,
    /// Root output directory, relative to the project root.
    pub output_dir: Utf8PathBuf,
    /// Whether sources bundles are also copied into the root output.
    pub aggregate_sources: bool,
}

impl ProjectSettings {
    fn default_output_dir() -> Utf8PathBuf {
        Utf8PathBuf::from("output")
    }
}

/// External commands used for module lifecycle phases.
///
/// Each command is an argument vector whose elements may contain the
/// placeholders `{module}`, `{module_dir}`, and `{version}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommandSettings {
    /// Command run for each module's build step.
    pub build: Option<Vec<String>>,
    /// Command run for each module's clean step.
    pub clean: Option<Vec<String>>,
    /// Upper bound on a single command's run time, in seconds.
    #[serde(default = "CommandSettings::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CommandSettings {
    const fn default_timeout_secs() -> u64 {
        1800
    }

    /// The command timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            build: None,
            clean: None,
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

/// Endpoint and credential reference for one repository channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelSettings {
    /// Base URL of the Maven repository.
    pub url: String,
    /// Environment variable holding the username.
    pub username_env: String,
    /// Environment variable holding the password or token.
    pub password_env: String,
}

/// Remote publication settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishSettings {
    /// Per-request timeout, in seconds.
    #[serde(default = "PublishSettings::default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts per request before a network failure is final.
    #[serde(default = "PublishSettings::default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry, doubled on each further retry.
    #[serde(default = "PublishSettings::default_backoff_ms")]
    pub backoff_ms: u64,
    /// Repository used for `-SNAPSHOT` versions.
    pub snapshot: Option<ChannelSettings>,
    /// Repository used for all other versions.
    pub release: Option<ChannelSettings>,
}

impl PublishSettings {
    const fn default_timeout_secs() -> u64 {
        30
    }

    const fn default_max_attempts() -> u32 {
        3
    }

    const fn default_backoff_ms() -> u64 {
        500
    }
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout_secs(),
            max_attempts: Self::default_max_attempts(),
            backoff_ms: Self::default_backoff_ms(),
            snapshot: None,
            release: None,
        }
    }
}

/// Coverage report generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverageSettings {
    /// Java launcher used to run the JaCoCo CLI.
    #[serde(default = "CoverageSettings::default_java")]
    pub java: String,
    /// Path to `jacococli.jar`, relative to the project root.
    #[serde(default = "CoverageSettings::default_jacoco_cli")]
    pub jacoco_cli: Utf8PathBuf,
    /// Report directory, relative to the root output directory.
    #[serde(default = "CoverageSettings::default_report_dir")]
    pub report_dir: Utf8PathBuf,
}

impl CoverageSettings {
    fn default_java() -> String {
        "java".to_owned()
    }

    fn default_jacoco_cli() -> Utf8PathBuf {
        Utf8PathBuf::from("tools/jacococli.jar")
    }

    fn default_report_dir() -> Utf8PathBuf {
        Utf8PathBuf::from("coverage")
    }
}

impl Default for CoverageSettings {
    fn default() -> Self {
        Self {
            java: Self::default_java(),
            jacoco_cli: Self::default_jacoco_cli(),
            report_dir: Self::default_report_dir(),
        }
    }
}

/// The complete, validated configuration for one run.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    root: Utf8PathBuf,
    /// Project identity.
    pub project: ProjectSettings,
    /// The declared modules.
    pub registry: ModuleRegistry,
    /// Module phase commands.
    pub commands: CommandSettings,
    /// Publication settings.
    pub publish: PublishSettings,
    /// Coverage settings.
    pub coverage: CoverageSettings,
}

impl OrchestratorConfig {
    /// Load and validate the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails validation.
    pub fn load(path: &Utf8Path, root: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&contents, root)
    }

    /// Parse and validate configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration.
    pub fn from_toml_str(contents: &str, root: &Utf8Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;

        let project = project_settings(raw.project)?;
        let modules = raw
            .modules
            .into_iter()
            .map(module_descriptor)
            .collect::<Result<Vec<_>, _>>()?;
        let registry = ModuleRegistry::new(modules)?;
        reject_shared_output(root, &project, &registry)?;

        validate_command("commands.build", raw.commands.build.as_deref())?;
        validate_command("commands.clean", raw.commands.clean.as_deref())?;
        validate_channel("publish.snapshot", raw.publish.snapshot.as_ref())?;
        validate_channel("publish.release", raw.publish.release.as_ref())?;
        if raw.publish.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "publish.max_attempts".to_owned(),
                reason: "at least one attempt is required".to_owned(),
            });
        }

        Ok(Self {
            root: root.to_owned(),
            project,
            registry,
            commands: raw.commands,
            publish: raw.publish,
            coverage: raw.coverage,
        })
    }

    /// Replace the project version, e.g. from a command-line override.
    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.project.version = version;
        self
    }

    /// The project root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Absolute path of the root output directory.
    #[must_use]
    pub fn output_dir(&self) -> Utf8PathBuf {
        self.root.join(&self.project.output_dir)
    }

    /// Directory layout of `module` under the project root.
    #[must_use]
    pub fn layout(&self, module: &ModuleDescriptor) -> ModuleLayout {
        ModuleLayout::new(self.root.join(module.directory()))
    }

    /// The version a module is built and published with.
    #[must_use]
    pub fn module_version<'a>(&'a self, module: &'a ModuleDescriptor) -> &'a Version {
        module.effective_version(&self.project.version)
    }
}

fn project_settings(raw: RawProject) -> Result<ProjectSettings, ConfigError> {
    require_file_safe("project.family", &raw.family)?;
    if raw.namespace.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field: "project.namespace".to_owned(),
            reason: "namespace must not be empty".to_owned(),
        });
    }
    Ok(ProjectSettings {
        family: raw.family,
        namespace: raw.namespace,
        version: Version::try_from(raw.version)?,
        output_dir: raw.output_dir,
        aggregate_sources: raw.aggregate_sources,
    })
}

fn module_descriptor(raw: RawModule) -> Result<ModuleDescriptor, ConfigError> {
    if !raw.merged && !raw.embed.is_empty() {
        return Err(ConfigError::Invalid {
            field: format!("module.{}.embed", raw.name),
            reason: "embedded jars require merged = true".to_owned(),
        });
    }

    let mut module = ModuleDescriptor::new(raw.name);
    if raw.primary {
        module = module.primary();
    }
    if let Some(namespace) = raw.namespace {
        module = module.with_namespace(namespace);
    }
    if let Some(version) = raw.version {
        module = module.with_version(Version::try_from(version)?);
    }
    if let Some(directory) = raw.directory {
        module = module.with_directory(directory);
    }
    if raw.merged {
        module = module.merged(raw.embed);
    }
    Ok(module)
}

/// Aggregation writes into the root output, so no module may build there.
fn reject_shared_output(
    root: &Utf8Path,
    project: &ProjectSettings,
    registry: &ModuleRegistry,
) -> Result<(), ConfigError> {
    let root_output = root.join(&project.output_dir);
    let builds_into_root = |module: &&ModuleDescriptor| {
        ModuleLayout::new(root.join(module.directory())).output_dir() == root_output
    };
    match registry.iter().find(builds_into_root) {
        Some(module) => Err(ConfigError::Invalid {
            field: format!("module.{}.directory", module.name()),
            reason: format!("module output would be the root output directory {root_output}"),
        }),
        None => Ok(()),
    }
}

fn require_file_safe(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Invalid {
            field: field.to_owned(),
            reason: "value must not be empty".to_owned(),
        });
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(ConfigError::Invalid {
            field: field.to_owned(),
            reason: format!("invalid character '{bad}'"),
        });
    }
    Ok(())
}

fn validate_command(field: &str, command: Option<&[String]>) -> Result<(), ConfigError> {
    match command {
        Some(args) if args.first().is_none_or(|program| program.trim().is_empty()) => {
            Err(ConfigError::Invalid {
                field: field.to_owned(),
                reason: "command must name a program".to_owned(),
            })
        }
        _ => Ok(()),
    }
}

fn validate_channel(field: &str, channel: Option<&ChannelSettings>) -> Result<(), ConfigError> {
    let Some(channel) = channel else {
        return Ok(());
    };
    if !(channel.url.starts_with("https://") || channel.url.starts_with("http://")) {
        return Err(ConfigError::Invalid {
            field: format!("{field}.url"),
            reason: format!("\"{}\" is not an HTTP(S) URL", channel.url),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    const MINIMAL: &str = r#"
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

    #[fixture]
    fn root() -> Utf8PathBuf {
        Utf8PathBuf::from("/work/jsky")
    }

    #[rstest]
    fn parses_minimal_configuration(root: Utf8PathBuf) {
        let config = OrchestratorConfig::from_toml_str(MINIMAL, &root).expect("valid config");

        assert_eq!(config.project.family, "JSky");
        assert_eq!(config.project.version.as_str(), "1.0.0-SNAPSHOT");
        assert_eq!(config.registry.len(), 2);
        assert_eq!(config.output_dir(), Utf8PathBuf::from("/work/jsky/output"));
        assert_eq!(config.publish, PublishSettings::default());
        assert_eq!(config.commands.timeout_secs, 1800);
        assert!(config.commands.build.is_none());
    }

    #[rstest]
    fn parses_merged_module_and_channels(root: Utf8PathBuf) {
        let text = format!(
            "{MINIMAL}\n{}",
            r#"
            [[module]]
            name = "bundle"
            namespace = "Bundle"
            merged = true
            embed = ["libs/*.jar"]

            [commands]
            build = ["./gradlew", ":{module}:jar"]

            [publish]
            max_attempts = 5

            [publish.release]
            url = "https://repo.codersky.net/releases"
            username_env = "REPO_USER"
            password_env = "REPO_PASSWORD"
            "#
        );
        let config = OrchestratorConfig::from_toml_str(&text, &root).expect("valid config");

        let bundle = config.registry.get("bundle").expect("bundle module");
        assert!(bundle.is_merged());
        assert_eq!(bundle.embedded_patterns(), ["libs/*.jar".to_owned()]);
        assert_eq!(bundle.namespace(), "Bundle");
        assert_eq!(config.publish.max_attempts, 5);
        assert!(config.publish.release.is_some());
        assert!(config.publish.snapshot.is_none());
    }

    #[rstest]
    #[case::project_root_module("[[module]]\nname = \"x\"\ndirectory = \".\"\n", "")]
    #[case::output_inside_module(
        "[[module]]\nname = \"x\"\n",
        "output_dir = \"x/output\"\n"
    )]
    fn rejects_module_output_equal_to_root_output(
        root: Utf8PathBuf,
        #[case] module: &str,
        #[case] project_extra: &str,
    ) {
        let text = MINIMAL.replacen(
            "version = \"1.0.0-SNAPSHOT\"\n",
            &format!("version = \"1.0.0-SNAPSHOT\"\n{project_extra}"),
            1,
        );
        let text = format!("{text}\n{module}");

        let err = OrchestratorConfig::from_toml_str(&text, &root).expect_err("shared output");

        assert!(matches!(
            err,
            ConfigError::Invalid { field, .. } if field == "module.x.directory"
        ));
    }

    #[rstest]
    fn accepts_module_at_root_with_separate_output(root: Utf8PathBuf) {
        let text = MINIMAL.replacen(
            "version = \"1.0.0-SNAPSHOT\"\n",
            "version = \"1.0.0-SNAPSHOT\"\noutput_dir = \"dist\"\n",
            1,
        );
        let text = format!("{text}\n[[module]]\nname = \"x\"\ndirectory = \".\"\n");

        let config = OrchestratorConfig::from_toml_str(&text, &root).expect("valid config");

        assert_eq!(config.output_dir(), Utf8PathBuf::from("/work/jsky/dist"));
    }

    #[rstest]
    fn rejects_unknown_fields(root: Utf8PathBuf) {
        let text = format!("{MINIMAL}\nunexpected = 1\n");
        let err = OrchestratorConfig::from_toml_str(&text, &root).expect_err("unknown field");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[rstest]
    fn rejects_embed_without_merge(root: Utf8PathBuf) {
        let text = format!("{MINIMAL}\n[[module]]\nname = \"x\"\nembed = [\"a.jar\"]\n");
        let err = OrchestratorConfig::from_toml_str(&text, &root).expect_err("invalid");
        assert!(matches!(err, ConfigError::Invalid { field, .. } if field == "module.x.embed"));
    }

    #[rstest]
    fn rejects_non_http_channel(root: Utf8PathBuf) {
        let text = format!(
            "{MINIMAL}\n[publish.snapshot]\nurl = \"ftp://repo\"\nusername_env = \"U\"\npassword_env = \"P\"\n"
        );
        let err = OrchestratorConfig::from_toml_str(&text, &root).expect_err("invalid");
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[rstest]
    fn rejects_empty_command(root: Utf8PathBuf) {
        let text = format!("{MINIMAL}\n[commands]\nbuild = []\n");
        let err = OrchestratorConfig::from_toml_str(&text, &root).expect_err("invalid");
        assert!(matches!(err, ConfigError::Invalid { field, .. } if field == "commands.build"));
    }

    #[rstest]
    fn rejects_second_primary(root: Utf8PathBuf) {
        let text = format!("{MINIMAL}\n[[module]]\nname = \"core\"\nprimary = true\n");
        let err = OrchestratorConfig::from_toml_str(&text, &root).expect_err("invalid");
        assert!(matches!(
            err,
            ConfigError::Registry(RegistryError::MultiplePrimary { .. })
        ));
    }

    #[rstest]
    fn version_override_replaces_project_version(root: Utf8PathBuf) {
        let config = OrchestratorConfig::from_toml_str(MINIMAL, &root)
            .expect("valid config")
            .with_version(Version::try_from("1.0.0").expect("valid"));
        let base = config.registry.get("base").expect("base module");
        assert_eq!(config.module_version(base).as_str(), "1.0.0");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = OrchestratorConfig::load(
            Utf8Path::new("/nonexistent/jarsmith.toml"),
            Utf8Path::new("/nonexistent"),
        )
        .expect_err("missing file");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
