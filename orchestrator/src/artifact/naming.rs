//! Root output naming policy.
//!
//! Every aggregated artifact is named `<family>-<module>-<version>.<ext>`,
//! except artifacts of the primary module, which drop the module segment:
//! `<family>-<version>.<ext>`. Sources bundles append `-sources` after the
//! version. The name depends on nothing but these inputs.

use super::ArtifactKind;
use crate::module_name::ModuleName;
use crate::version::Version;
use std::fmt;

/// A root output file name.
///
/// # Examples
///
/// ```
/// use jarsmith::artifact::ArtifactKind;
/// use jarsmith::artifact::naming::ArtifactName;
/// use jarsmith::module_name::ModuleName;
/// use jarsmith::version::Version;
///
/// let version = Version::try_from("1.0.0-SNAPSHOT").expect("valid version");
/// let yaml = ModuleName::from("yaml");
/// let name = ArtifactName::new("JSky", &yaml, false, ArtifactKind::Primary, &version, "jar");
/// assert_eq!(name.to_string(), "JSky-yaml-1.0.0-SNAPSHOT.jar");
///
/// let base = ModuleName::from("base");
/// let name = ArtifactName::new("JSky", &base, true, ArtifactKind::Primary, &version, "jar");
/// assert_eq!(name.to_string(), "JSky-1.0.0-SNAPSHOT.jar");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName<'a> {
    family: &'a str,
    module: Option<&'a ModuleName>,
    kind: ArtifactKind,
    version: &'a Version,
    extension: &'a str,
}

impl<'a> ArtifactName<'a> {
    /// Build the name for one artifact.
    #[must_use]
    pub fn new(
        family: &'a str,
        module: &'a ModuleName,
        primary: bool,
        kind: ArtifactKind,
        version: &'a Version,
        extension: &'a str,
    ) -> Self {
        Self {
            family,
            module: (!primary).then_some(module),
            kind,
            version,
            extension,
        }
    }

    /// Return the file name as a string.
    #[must_use]
    pub fn filename(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ArtifactName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.family)?;
        if let Some(module) = self.module {
            write!(f, "-{module}")?;
        }
        write!(f, "-{}", self.version)?;
        if self.kind == ArtifactKind::Sources {
            f.write_str("-sources")?;
        }
        write!(f, ".{}", self.extension)
    }
}
