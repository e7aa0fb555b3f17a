//! Module lifecycle driver.
//!
//! Runs a [`Phase`] for every registered module, one module at a time in
//! registry order. The driver returns only after every module step has
//! finished, so callers run their root-level continuation (aggregation,
//! output deletion) strictly afterwards. The first failing module aborts the
//! phase with [`OrchestratorError::ModulePhaseFailure`].

use crate::assembler::{self, AssemblyOutput};
use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, Result};
use crate::executor::{CommandExecutor, failure_reason};
use crate::module_name::ModuleName;
use crate::registry::ModuleDescriptor;
use crate::version::Version;
use camino::Utf8Path;
use log::{debug, info};
use serde::Serialize;
use std::fmt;
use std::fs;

/// A module lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Produce the module's artifacts.
    Build,
    /// Remove the module's outputs.
    Clean,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Build => "build",
            Self::Clean => "clean",
        })
    }
}

/// What happened for one module during a phase.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleStep {
    /// The module.
    pub module: ModuleName,
    /// The external command that ran, if any.
    pub command: Option<String>,
    /// The merged artifact written during the build step, if any.
    pub assembly: Option<AssemblyOutput>,
}

/// The result of running a phase across all modules.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    /// The phase that ran.
    pub phase: Phase,
    /// One entry per module, in registry order.
    pub steps: Vec<ModuleStep>,
}

/// Substitute `{module}`, `{module_dir}`, and `{version}` in a command
/// template.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use jarsmith::lifecycle::expand_command;
/// use jarsmith::registry::ModuleDescriptor;
/// use jarsmith::version::Version;
///
/// let template = vec!["./gradlew".to_owned(), ":{module}:jar".to_owned()];
/// let module = ModuleDescriptor::new("yaml");
/// let version = Version::try_from("1.0.0").expect("valid version");
/// let args = expand_command(&template, &module, Utf8Path::new("/p/yaml"), &version);
/// assert_eq!(args, vec!["./gradlew", ":yaml:jar"]);
/// ```
#[must_use]
pub fn expand_command(
    template: &[String],
    module: &ModuleDescriptor,
    module_dir: &Utf8Path,
    version: &Version,
) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            arg.replace("{module_dir}", module_dir.as_str())
                .replace("{module}", module.name().as_str())
                .replace("{version}", version.as_str())
        })
        .collect()
}

/// Dispatches lifecycle phases to every module.
pub struct LifecycleDriver<'a> {
    config: &'a OrchestratorConfig,
    executor: &'a dyn CommandExecutor,
    run_commands: bool,
}

impl<'a> LifecycleDriver<'a> {
    /// Create a driver for the configured registry.
    #[must_use]
    pub fn new(config: &'a OrchestratorConfig, executor: &'a dyn CommandExecutor) -> Self {
        Self {
            config,
            executor,
            run_commands: true,
        }
    }

    /// Skip the external module commands, keeping in-process steps.
    #[must_use]
    pub fn skip_commands(mut self, skip: bool) -> Self {
        self.run_commands = !skip;
        self
    }

    /// Run `phase` for every module in registry order.
    ///
    /// # Errors
    ///
    /// Returns the first module failure; later modules are not run.
    pub fn run_phase(&self, phase: Phase) -> Result<PhaseReport> {
        info!("{phase}: {} module(s)", self.config.registry.len());
        let steps = self
            .config
            .registry
            .iter()
            .map(|module| self.run_module(phase, module))
            .collect::<Result<Vec<_>>>()?;
        Ok(PhaseReport { phase, steps })
    }

    fn run_module(&self, phase: Phase, module: &ModuleDescriptor) -> Result<ModuleStep> {
        let command = self.run_module_command(phase, module)?;
        let assembly = match phase {
            Phase::Build => self.assemble_if_merged(module)?,
            Phase::Clean => {
                if command.is_none() {
                    self.remove_module_output(module)?;
                }
                None
            }
        };
        Ok(ModuleStep {
            module: module.name().clone(),
            command,
            assembly,
        })
    }

    fn run_module_command(
        &self,
        phase: Phase,
        module: &ModuleDescriptor,
    ) -> Result<Option<String>> {
        let template = match phase {
            Phase::Build => self.config.commands.build.as_deref(),
            Phase::Clean => self.config.commands.clean.as_deref(),
        };
        let Some(template) = template.filter(|_| self.run_commands) else {
            debug!("{phase} {}: no command", module.name());
            return Ok(None);
        };

        let layout = self.config.layout(module);
        let args = expand_command(
            template,
            module,
            layout.module_dir(),
            self.config.module_version(module),
        );
        let Some((program, rest)) = args.split_first() else {
            return Ok(None);
        };
        let rest: Vec<&str> = rest.iter().map(String::as_str).collect();

        info!("{phase} {}: {}", module.name(), args.join(" "));
        let output = self
            .executor
            .run(program, &rest, self.config.root())
            .map_err(|e| self.failure(phase, module, e.to_string()))?;
        if !output.status.success() {
            return Err(self.failure(phase, module, failure_reason(&output)));
        }
        Ok(Some(args.join(" ")))
    }

    fn assemble_if_merged(&self, module: &ModuleDescriptor) -> Result<Option<AssemblyOutput>> {
        if !module.is_merged() {
            return Ok(None);
        }
        let layout = self.config.layout(module);
        let output = assembler::assemble(module, &layout).map_err(|source| {
            OrchestratorError::Assembly {
                module: module.name().clone(),
                source,
            }
        })?;
        Ok(Some(output))
    }

    fn remove_module_output(&self, module: &ModuleDescriptor) -> Result<()> {
        let output_dir = self.config.layout(module).output_dir();
        if !output_dir.exists() {
            return Ok(());
        }
        debug!("removing {output_dir}");
        fs::remove_dir_all(&output_dir)
            .map_err(|e| self.failure(Phase::Clean, module, format!("{output_dir}: {e}")))
    }

    fn failure(
        &self,
        phase: Phase,
        module: &ModuleDescriptor,
        reason: String,
    ) -> OrchestratorError {
        OrchestratorError::ModulePhaseFailure {
            phase,
            module: module.name().clone(),
            reason,
        }
    }
}
