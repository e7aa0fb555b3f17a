//! Maven coordinates and repository paths.

use crate::module_name::ModuleName;
use crate::version::Version;
use serde::Serialize;
use std::fmt;

/// Compose a group id from the root namespace and a module's namespace
/// segment.
///
/// # Examples
///
/// ```
/// use jarsmith::publish::coordinates::group_id;
///
/// assert_eq!(group_id("net.codersky", "YAML"), "net.codersky.yaml");
/// ```
#[must_use]
pub fn group_id(root_namespace: &str, segment: &str) -> String {
    format!("{root_namespace}.{}", segment.to_lowercase())
}

/// The identity of one publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Coordinates {
    /// Maven group id.
    pub group_id: String,
    /// Maven artifact id; the module name.
    pub artifact_id: String,
    /// Published version.
    pub version: Version,
}

impl Coordinates {
    /// Coordinates for `module` under `root_namespace`.
    #[must_use]
    pub fn new(root_namespace: &str, segment: &str, module: &ModuleName, version: Version) -> Self {
        Self {
            group_id: group_id(root_namespace, segment),
            artifact_id: module.as_str().to_owned(),
            version,
        }
    }

    /// Directory of this publication relative to the repository root.
    ///
    /// Follows the Maven 2 layout: the group id with dots as path
    /// separators, then the artifact id and version.
    #[must_use]
    pub fn directory(&self) -> String {
        format!(
            "{}/{}/{}",
            self.group_id.replace('.', "/"),
            self.artifact_id,
            self.version
        )
    }

    /// Repository file name for a file with the optional classifier.
    #[must_use]
    pub fn file_name(&self, classifier: Option<&str>, extension: &str) -> String {
        match classifier {
            Some(classifier) => format!(
                "{}-{}-{classifier}.{extension}",
                self.artifact_id, self.version
            ),
            None => format!("{}-{}.{extension}", self.artifact_id, self.version),
        }
    }

    /// Full URL of a repository file under `base_url`.
    #[must_use]
    pub fn url(&self, base_url: &str, file_name: &str) -> String {
        format!(
            "{}/{}/{file_name}",
            base_url.trim_end_matches('/'),
            self.directory()
        )
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}
