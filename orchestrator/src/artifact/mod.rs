//! Artifact model, naming policy, and output directory scanning.
//!
//! - [`naming`] - root output file names (`ArtifactName`).
//! - [`scan`] - discovery of packaged artifacts in a module's output.

pub mod naming;
pub mod scan;

use crate::module_name::ModuleName;
use camino::Utf8PathBuf;
use serde::Serialize;
use std::fmt;

/// The role an artifact plays in a publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// The module's plain packaged artifact.
    Primary,
    /// The companion source bundle.
    Sources,
    /// A merged artifact embedding the module's dependencies.
    Merged,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Primary => "primary",
            Self::Sources => "sources",
            Self::Merged => "merged",
        };
        f.write_str(label)
    }
}

/// A module artifact located during aggregation.
///
/// Artifacts are created once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// What the artifact is.
    pub kind: ArtifactKind,
    /// The module that produced it.
    pub module: ModuleName,
    /// Where the module build left it.
    pub source: Utf8PathBuf,
    /// Its file name in the root output directory.
    pub target_name: String,
}
