//! Repository channel selection.
//!
//! The channel depends on the version string alone: a version ending with
//! [`PRE_RELEASE_MARKER`](crate::version::PRE_RELEASE_MARKER) goes to the
//! snapshot repository, anything else to the release repository.

use crate::config::{ChannelSettings, PublishSettings};
use crate::version::Version;
use serde::Serialize;
use std::fmt;

/// The remote repository a publication targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryChannel {
    /// Pre-release builds.
    Snapshot,
    /// Stable releases.
    Release,
}

impl RepositoryChannel {
    /// Select the channel for `version`.
    ///
    /// # Examples
    ///
    /// ```
    /// use jarsmith::publish::channel::RepositoryChannel;
    /// use jarsmith::version::Version;
    ///
    /// let snapshot = Version::try_from("1.0.0-SNAPSHOT").expect("valid version");
    /// assert_eq!(RepositoryChannel::for_version(&snapshot), RepositoryChannel::Snapshot);
    ///
    /// let release = Version::try_from("1.0.0").expect("valid version");
    /// assert_eq!(RepositoryChannel::for_version(&release), RepositoryChannel::Release);
    /// ```
    #[must_use]
    pub fn for_version(version: &Version) -> Self {
        if version.is_pre_release() {
            Self::Snapshot
        } else {
            Self::Release
        }
    }

    /// The channel's settings, if configured.
    #[must_use]
    pub fn settings(self, publish: &PublishSettings) -> Option<&ChannelSettings> {
        match self {
            Self::Snapshot => publish.snapshot.as_ref(),
            Self::Release => publish.release.as_ref(),
        }
    }
}

impl fmt::Display for RepositoryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Snapshot => "snapshot",
            Self::Release => "release",
        })
    }
}
