//! Module identities.
//!
//! A [`ModuleName`] is what the registry, artifact names, coordinates and the
//! run summary all key on. The registry checks the character set; this type
//! only carries the text.

use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;

/// Name of a registered module, e.g. `yaml` or `base`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    /// The name as written in `jarsmith.toml`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModuleName {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for ModuleName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for ModuleName {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for ModuleName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case::lowercase("yaml")]
    #[case::dotted("net.codersky")]
    #[case::dashed("yaml-ext")]
    fn displays_and_serialises_as_plain_text(#[case] raw: &str) {
        let name = ModuleName::from(raw);

        assert_eq!(name.to_string(), raw);
        assert_eq!(
            serde_json::to_string(&name).expect("serialise"),
            format!("\"{raw}\"")
        );
    }

    #[test]
    fn compares_against_str_and_looks_up_by_str() {
        let names: HashSet<ModuleName> =
            ["base", "yaml"].into_iter().map(ModuleName::from).collect();

        assert!(names.contains("yaml"));
        assert!(!names.contains("json"));
        assert!(ModuleName::from(String::from("base")) == *"base");
    }
}
