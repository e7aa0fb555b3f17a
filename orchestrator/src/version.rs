//! Project version newtype.
//!
//! Validates that the version string is non-empty and contains only ASCII
//! alphanumeric characters, hyphens, dots, underscores, and plus signs, the
//! characters permitted in Maven version strings and artifact file names.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Suffix marking a pre-release (snapshot) version.
pub const PRE_RELEASE_MARKER: &str = "-SNAPSHOT";

/// Error raised for a malformed version string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version \"{value}\": {reason}")]
pub struct VersionError {
    /// The rejected input.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}

/// A validated artifact version (e.g. `1.0.0-SNAPSHOT`).
///
/// # Examples
///
/// ```
/// use jarsmith::version::Version;
///
/// let version: Version = "1.0.0-SNAPSHOT".try_into().expect("valid version");
/// assert!(version.is_pre_release());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Version(String);

fn is_valid_version_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '+')
}

impl Version {
    /// Return the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the version ends with [`PRE_RELEASE_MARKER`].
    #[must_use]
    pub fn is_pre_release(&self) -> bool {
        self.0.ends_with(PRE_RELEASE_MARKER)
    }
}

impl TryFrom<&str> for Version {
    type Error = VersionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(VersionError {
                value: value.to_owned(),
                reason: "version must not be empty".to_owned(),
            });
        }
        if let Some(bad) = value.chars().find(|c| !is_valid_version_char(*c)) {
            return Err(VersionError {
                value: value.to_owned(),
                reason: format!("invalid character '{bad}'"),
            });
        }
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::snapshot("1.0.0-SNAPSHOT", true)]
    #[case::release("1.0.0", false)]
    #[case::double_marker("1.0.0-SNAPSHOT-SNAPSHOT", true)]
    #[case::lowercase_marker("1.0.0-snapshot", false)]
    #[case::marker_not_suffix("1.0.0-SNAPSHOT.1", false)]
    fn pre_release_detection(#[case] input: &str, #[case] expected: bool) {
        let version = Version::try_from(input).expect("valid version");
        assert_eq!(version.is_pre_release(), expected);
    }

    #[rstest]
    #[case::empty("")]
    #[case::whitespace("1.0 beta")]
    #[case::slash("1.0/2")]
    fn rejects_malformed_versions(#[case] input: &str) {
        assert!(Version::try_from(input).is_err());
    }

    #[test]
    fn display_shows_inner_value() {
        let version = Version::try_from("2.1.0+build.7").expect("valid version");
        assert_eq!(version.to_string(), "2.1.0+build.7");
    }
}
