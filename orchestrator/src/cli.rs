//! CLI argument definitions for jarsmith.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the entrypoint so parsing can be tested without running a pipeline.

use crate::config::CONFIG_FILE_NAME;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};

/// Build, collect, and publish the artifacts of a multi-module project.
#[derive(Parser, Debug)]
#[command(name = "jarsmith")]
#[command(version, about)]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Build every module and collect its jar into ./output:\n",
    "    $ jarsmith build\n\n",
    "  Show what a release would publish without uploading:\n",
    "    $ jarsmith publish --dry-run --release-version 1.2.0\n\n",
    "  Produce the combined coverage report:\n",
    "    $ jarsmith coverage\n\n",
    "  Remove module outputs and the root output directory:\n",
    "    $ jarsmith clean",
))]
pub struct Cli {
    /// Configuration file [default: <root>/jarsmith.toml].
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Project root directory [default: current directory].
    #[arg(short, long, value_name = "DIR", global = true)]
    pub root: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet",
        global = true
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity", global = true)]
    pub quiet: bool,

    /// Print the run summary as JSON on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Build every module and collect artifacts into the root output.
    Build(BuildArgs),

    /// Build, collect, and publish every module.
    Publish(PublishArgs),

    /// Build every module and produce the combined coverage report.
    Coverage(BuildArgs),

    /// Clean every module and remove the root output.
    Clean,
}

/// Arguments shared by commands that build.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildArgs {
    /// Skip module build commands and use existing outputs.
    #[arg(long)]
    pub skip_build: bool,
}

/// Arguments for the publish command.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishArgs {
    /// Shared build arguments.
    #[command(flatten)]
    pub build: BuildArgs,

    /// Compute publications without uploading anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Publish under this version instead of the configured one.
    #[arg(long, value_name = "VERSION")]
    pub release_version: Option<String>,
}

impl Cli {
    /// The project root, given the current directory.
    #[must_use]
    pub fn project_root(&self, cwd: &Utf8Path) -> Utf8PathBuf {
        match &self.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => cwd.join(root),
            None => cwd.to_owned(),
        }
    }

    /// The configuration file path, given the project root.
    #[must_use]
    pub fn config_path(&self, root: &Utf8Path) -> Utf8PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| root.join(CONFIG_FILE_NAME))
    }

    /// Whether module build commands should be skipped.
    #[must_use]
    pub fn skip_build(&self) -> bool {
        match &self.command {
            Command::Build(args) | Command::Coverage(args) => args.skip_build,
            Command::Publish(args) => args.build.skip_build,
            Command::Clean => false,
        }
    }

    /// Log filter directive implied by the verbosity flags.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbosity) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, _) => "debug",
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
