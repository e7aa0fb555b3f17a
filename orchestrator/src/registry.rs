//! Static registry of the modules an orchestration run operates on.
//!
//! Modules are declared explicitly in configuration and validated once when
//! the registry is built. Every component walks the registry in declaration
//! order, which is also the order module phases are dispatched in.

use crate::module_name::ModuleName;
use crate::version::Version;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised while constructing a [`ModuleRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No modules were declared.
    #[error("no modules declared")]
    Empty,

    /// A module name is empty or contains characters unsafe in file names.
    #[error("invalid module name \"{name}\": {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Two modules share a name.
    #[error("module {0} is declared more than once")]
    DuplicateName(ModuleName),

    /// More than one module is flagged as primary.
    #[error("modules {first} and {second} are both marked primary")]
    MultiplePrimary {
        /// The first primary module found.
        first: ModuleName,
        /// The conflicting primary module.
        second: ModuleName,
    },
}

/// Describes one independently buildable module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    name: ModuleName,
    primary: bool,
    namespace: String,
    version: Option<Version>,
    directory: Utf8PathBuf,
    embedded: Option<Vec<String>>,
}

impl ModuleDescriptor {
    /// Create a non-primary module whose namespace segment and directory
    /// default to its name.
    #[must_use]
    pub fn new(name: impl Into<ModuleName>) -> Self {
        let name = name.into();
        Self {
            namespace: name.as_str().to_owned(),
            directory: Utf8PathBuf::from(name.as_str()),
            name,
            primary: false,
            version: None,
            embedded: None,
        }
    }

    /// Mark the module as primary; its artifacts drop the module-name segment.
    #[must_use]
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Override the namespace segment used to build the group id.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Override the project version for this module.
    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Override the module directory, relative to the project root.
    #[must_use]
    pub fn with_directory(mut self, directory: impl Into<Utf8PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Produce a merged artifact embedding the jars matched by `patterns`.
    ///
    /// Patterns use glob syntax and are resolved against the module
    /// directory.
    #[must_use]
    pub fn merged(mut self, patterns: Vec<String>) -> Self {
        self.embedded = Some(patterns);
        self
    }

    /// The module's unique name.
    #[must_use]
    pub fn name(&self) -> &ModuleName {
        &self.name
    }

    /// Whether this is the primary module.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    /// The namespace segment appended to the root namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The module directory relative to the project root.
    #[must_use]
    pub fn directory(&self) -> &Utf8Path {
        &self.directory
    }

    /// Whether the module produces a merged artifact.
    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.embedded.is_some()
    }

    /// Glob patterns for embedded dependency jars (empty unless merged).
    #[must_use]
    pub fn embedded_patterns(&self) -> &[String] {
        self.embedded.as_deref().unwrap_or_default()
    }

    /// The module's version, falling back to the project version.
    #[must_use]
    pub fn effective_version<'a>(&'a self, project: &'a Version) -> &'a Version {
        self.version.as_ref().unwrap_or(project)
    }
}

/// The validated, ordered list of modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDescriptor>,
}

impl ModuleRegistry {
    /// Validate and wrap the given descriptors.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty, a name is invalid or repeated,
    /// or more than one module is marked primary.
    pub fn new(modules: Vec<ModuleDescriptor>) -> Result<Self, RegistryError> {
        if modules.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        let mut primary: Option<&ModuleName> = None;
        for module in &modules {
            validate_name(module.name())?;
            if !seen.insert(module.name()) {
                return Err(RegistryError::DuplicateName(module.name().clone()));
            }
            if module.is_primary() {
                if let Some(first) = primary {
                    return Err(RegistryError::MultiplePrimary {
                        first: first.clone(),
                        second: module.name().clone(),
                    });
                }
                primary = Some(module.name());
            }
        }

        Ok(Self { modules })
    }

    /// Iterate over modules in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, ModuleDescriptor> {
        self.modules.iter()
    }

    /// Look up a module by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.modules.iter().find(|m| m.name() == name)
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Always false; an empty registry cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl<'a> IntoIterator for &'a ModuleRegistry {
    type Item = &'a ModuleDescriptor;
    type IntoIter = std::slice::Iter<'a, ModuleDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn validate_name(name: &ModuleName) -> Result<(), RegistryError> {
    let s = name.as_str();
    if s.is_empty() {
        return Err(RegistryError::InvalidName {
            name: s.to_owned(),
            reason: "name must not be empty".to_owned(),
        });
    }
    if let Some(bad) = s
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(RegistryError::InvalidName {
            name: s.to_owned(),
            reason: format!("invalid character '{bad}'"),
        });
    }
    Ok(())
}
