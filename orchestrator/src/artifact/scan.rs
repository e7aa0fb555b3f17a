//! Discovery of packaged artifacts in a module output directory.
//!
//! Only files with the packaged-artifact extension are considered. Their
//! stem suffix decides the variant: `-sources` and `-javadoc` mark companion
//! bundles, `-all` marks a merged artifact, anything else is the plain
//! artifact.
//!
//! When several files match the same variant (typically stale jars from an
//! earlier version), the newest by modification time is selected and the
//! rest are returned as stale so the caller can warn about them.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::io;
use std::time::SystemTime;

/// Extension of packaged artifacts.
pub const ARTIFACT_EXTENSION: &str = "jar";

/// Stem suffix of merged artifacts written by the assembler.
pub const MERGED_SUFFIX: &str = "-all";

const SOURCES_SUFFIX: &str = "-sources";
const JAVADOC_SUFFIX: &str = "-javadoc";

/// The flavour of a packaged artifact file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// The plain packaged artifact.
    Plain,
    /// A source bundle.
    Sources,
    /// A documentation bundle.
    Javadoc,
    /// A merged artifact.
    Merged,
}

/// Classify a file name, returning `None` for non-artifacts.
///
/// # Examples
///
/// ```
/// use jarsmith::artifact::scan::{Variant, classify};
///
/// assert_eq!(classify("yaml-1.0.jar"), Some(Variant::Plain));
/// assert_eq!(classify("yaml-1.0-sources.jar"), Some(Variant::Sources));
/// assert_eq!(classify("yaml-1.0-all.jar"), Some(Variant::Merged));
/// assert_eq!(classify("yaml-1.0.pom"), None);
/// ```
#[must_use]
pub fn classify(file_name: &str) -> Option<Variant> {
    let path = Utf8Path::new(file_name);
    if path.extension() != Some(ARTIFACT_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?;
    let variant = if stem.ends_with(SOURCES_SUFFIX) {
        Variant::Sources
    } else if stem.ends_with(JAVADOC_SUFFIX) {
        Variant::Javadoc
    } else if stem.ends_with(MERGED_SUFFIX) {
        Variant::Merged
    } else {
        Variant::Plain
    };
    Some(variant)
}

/// A file matching a requested variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Full path of the file.
    pub path: Utf8PathBuf,
    /// Last modification time.
    pub modified: SystemTime,
}

/// The outcome of choosing among candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The newest candidate.
    pub chosen: Candidate,
    /// All other candidates, oldest first.
    pub stale: Vec<Candidate>,
}

/// List files in `dir` of the given variant.
///
/// A missing directory yields an empty list.
///
/// # Errors
///
/// Returns an error if the directory or a file's metadata cannot be read.
pub fn find_candidates(dir: &Utf8Path, variant: Variant) -> io::Result<Vec<Candidate>> {
    if !dir.is_dir() {
        debug!("no output directory at {dir}");
        return Ok(Vec::new());
    }

    let mut candidates = Vec::new();
    for entry in dir.read_dir_utf8()? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() || classify(entry.file_name()) != Some(variant) {
            continue;
        }
        candidates.push(Candidate {
            path: entry.path().to_owned(),
            modified: metadata.modified()?,
        });
    }
    Ok(candidates)
}

/// Choose the newest candidate.
///
/// Ties on modification time are broken by file name, the last name in
/// lexical order winning, so the choice is stable across runs.
#[must_use]
pub fn select_newest(mut candidates: Vec<Candidate>) -> Option<Selection> {
    candidates.sort_by(|a, b| {
        a.modified
            .cmp(&b.modified)
            .then_with(|| a.path.file_name().cmp(&b.path.file_name()))
    });
    let chosen = candidates.pop()?;
    Some(Selection {
        chosen,
        stale: candidates,
    })
}

/// Find and select the newest file of `variant` in `dir`.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn find_newest(dir: &Utf8Path, variant: Variant) -> io::Result<Option<Selection>> {
    find_candidates(dir, variant).map(select_newest)
}
