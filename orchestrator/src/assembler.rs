//! Fat-artifact assembly.
//!
//! A merged module ships one jar containing its own classes and those of its
//! embedded dependencies. Entry names are copied verbatim: dependency
//! packages are never relocated, because consumers depend on the same
//! dependency versions directly and relocated copies would load as distinct,
//! incompatible classes.
//!
//! Merge rules:
//!
//! - the module's own jar is copied first, so its entries (including its
//!   manifest) win;
//! - dependencies follow in lexical path order and duplicate entries are
//!   skipped;
//! - dependency manifests and signature files are dropped, since they
//!   describe the original jar and would break verification of the merged
//!   one.
//!
//! Entries are raw-copied with their original metadata, so assembling the
//! same inputs twice produces identical bytes.

use crate::artifact::scan::{self, ARTIFACT_EXTENSION, MERGED_SUFFIX, Variant};
use crate::layout::ModuleLayout;
use crate::registry::ModuleDescriptor;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use thiserror::Error;
use zip::{ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";
const SIGNATURE_EXTENSIONS: &[&str] = &[".SF", ".RSA", ".DSA", ".EC"];

/// Errors raised while assembling a merged artifact.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// The module has no plain artifact to merge into.
    #[error("no packaged artifact found in {dir}")]
    MissingModuleArtifact {
        /// The directory that was scanned.
        dir: Utf8PathBuf,
    },

    /// An embedded dependency pattern is not valid glob syntax.
    #[error("invalid embed pattern \"{pattern}\": {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A jar could not be read or written.
    #[error("archive error in {path}: {source}")]
    Archive {
        /// The jar being processed.
        path: Utf8PathBuf,
        /// The underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// An I/O operation failed.
    #[error("I/O error during assembly: {0}")]
    Io(#[from] std::io::Error),
}

/// Summary of a merged artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyOutput {
    /// Path of the merged jar.
    pub merged_path: Utf8PathBuf,
    /// Embedded dependency jars, in merge order.
    pub embedded: Vec<Utf8PathBuf>,
    /// Number of entries written.
    pub entries: usize,
    /// Entries skipped as duplicates or dependency metadata.
    pub skipped: usize,
}

/// Merge `module`'s jar with its embedded dependencies.
///
/// The result is written next to the module's jar as `<stem>-all.jar`.
///
/// # Errors
///
/// Returns an error if the module has no jar, a pattern is invalid, or any
/// archive cannot be read or written.
pub fn assemble(
    module: &ModuleDescriptor,
    layout: &ModuleLayout,
) -> Result<AssemblyOutput, AssemblyError> {
    let output_dir = layout.output_dir();
    let selection = scan::find_newest(&output_dir, Variant::Plain)?
        .ok_or_else(|| AssemblyError::MissingModuleArtifact {
            dir: output_dir.clone(),
        })?;
    let module_jar = selection.chosen.path;
    let embedded = resolve_embedded(layout.module_dir(), module.embedded_patterns())?;
    let merged_path = merged_path_for(&module_jar);

    info!(
        "assembling {} from {} and {} embedded jar(s)",
        merged_path,
        module_jar,
        embedded.len()
    );
    let (entries, skipped) = write_merged(&merged_path, &module_jar, &embedded)?;

    Ok(AssemblyOutput {
        merged_path,
        embedded,
        entries,
        skipped,
    })
}

/// Expand embed patterns against the module directory, sorted and
/// de-duplicated.
///
/// # Errors
///
/// Returns an error if a pattern is not valid glob syntax.
pub fn resolve_embedded(
    module_dir: &Utf8Path,
    patterns: &[String],
) -> Result<Vec<Utf8PathBuf>, AssemblyError> {
    let escaped_dir = glob::Pattern::escape(module_dir.as_str());
    let mut jars = Vec::new();
    for pattern in patterns {
        let full = format!("{escaped_dir}/{pattern}");
        let paths = glob::glob(&full).map_err(|e| AssemblyError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
        let before = jars.len();
        for path in paths.filter_map(std::result::Result::ok) {
            match Utf8PathBuf::from_path_buf(path) {
                Ok(path) if path.is_file() => jars.push(path),
                Ok(_) => {}
                Err(path) => warn!("skipping non UTF-8 path {}", path.display()),
            }
        }
        if jars.len() == before {
            warn!("embed pattern \"{pattern}\" matched no files in {module_dir}");
        }
    }
    jars.sort();
    jars.dedup();
    Ok(jars)
}

fn merged_path_for(module_jar: &Utf8Path) -> Utf8PathBuf {
    let stem = module_jar.file_stem().unwrap_or("module");
    module_jar.with_file_name(format!("{stem}{MERGED_SUFFIX}.{ARTIFACT_EXTENSION}"))
}

fn write_merged(
    merged_path: &Utf8Path,
    module_jar: &Utf8Path,
    embedded: &[Utf8PathBuf],
) -> Result<(usize, usize), AssemblyError> {
    let archive_err = |path: &Utf8Path| {
        let path = path.to_owned();
        move |source| AssemblyError::Archive { path, source }
    };

    let mut writer = ZipWriter::new(File::create(merged_path)?);
    let mut seen = HashSet::new();
    let mut skipped = 0;

    copy_entries(&mut writer, module_jar, false, &mut seen, &mut skipped)?;
    for jar in embedded {
        copy_entries(&mut writer, jar, true, &mut seen, &mut skipped)?;
    }

    writer.finish().map_err(archive_err(merged_path))?;
    debug!("wrote {} entries, skipped {skipped}", seen.len());
    Ok((seen.len(), skipped))
}

fn copy_entries(
    writer: &mut ZipWriter<File>,
    jar: &Utf8Path,
    is_dependency: bool,
    seen: &mut HashSet<String>,
    skipped: &mut usize,
) -> Result<(), AssemblyError> {
    let archive_err = |source| AssemblyError::Archive {
        path: jar.to_owned(),
        source,
    };
    let mut archive = ZipArchive::new(File::open(jar)?).map_err(archive_err)?;

    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index).map_err(archive_err)?;
        let name = entry.name().to_owned();
        if (is_dependency && is_dependency_metadata(&name)) || seen.contains(&name) {
            *skipped += 1;
            continue;
        }
        writer.raw_copy_file(entry).map_err(archive_err)?;
        seen.insert(name);
    }
    Ok(())
}

fn is_dependency_metadata(name: &str) -> bool {
    if name.eq_ignore_ascii_case(MANIFEST_ENTRY) {
        return true;
    }
    let Some(file) = name.strip_prefix("META-INF/") else {
        return false;
    };
    !file.contains('/')
        && SIGNATURE_EXTENSIONS
            .iter()
            .any(|ext| file.to_ascii_uppercase().ends_with(ext))
}
