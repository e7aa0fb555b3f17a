//! jarsmith orchestrator library.
//!
//! This crate drives the build of a multi-module JVM project: it runs each
//! module's build or clean step, collects the produced jars into one root
//! output directory under canonical names, merges declared dependencies into
//! fat artifacts, publishes every module to a snapshot or release Maven
//! repository, and combines per-module coverage data into a single report.
//! It is used by the `jarsmith` CLI binary and can be driven
//! programmatically with substitute executors and transports.
//!
//! # Modules
//!
//! - [`aggregator`] - Copies module artifacts into the root output directory
//! - [`artifact`] - Artifact classification, discovery, and canonical naming
//! - [`assembler`] - Fat-artifact assembly from embedded dependencies
//! - [`clean`] - Idempotent removal of module and root outputs
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - `jarsmith.toml` loading and validation
//! - [`coverage`] - Union coverage report across all modules
//! - [`error`] - Run-level error types
//! - [`executor`] - External command execution with timeouts
//! - [`layout`] - Conventional module directory layout
//! - [`lifecycle`] - Per-module build and clean phases
//! - [`module_name`] - Semantic wrapper for module names
//! - [`pipeline`] - Stage sequences behind each command
//! - [`publish`] - Channel selection, coordinates, and atomic upload
//! - [`registry`] - The declared module set
//! - [`summary`] - Human and JSON run summaries
//! - [`version`] - Project version and pre-release detection

pub mod aggregator;
pub mod artifact;
pub mod assembler;
pub mod clean;
pub mod cli;
pub mod config;
pub mod coverage;
pub mod error;
pub mod executor;
pub mod layout;
pub mod lifecycle;
pub mod module_name;
pub mod pipeline;
pub mod publish;
pub mod registry;
pub mod summary;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod version;
