//! Atom-name translation between `.off` type names and output names.

use std::collections::BTreeMap;

/// Maps `.off` atom type names to the names used in generated GROMACS files.
///
/// Force-matched type names rarely match the atom types an existing topology
/// declares; table filenames, `[ nonbond_params ]` entries, and bonded
/// `[ atoms ]` sections all go through this map. Names without an entry pass
/// through unchanged, so the default (empty) translation is the identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTranslation {
    map: BTreeMap<String, String>,
}

impl NameTranslation {
    /// Creates an identity translation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the output name for an `.off` type name.
    pub fn insert(&mut self, off_name: impl Into<String>, output_name: impl Into<String>) {
        self.map.insert(off_name.into(), output_name.into());
    }

    /// Translates one name, returning it unchanged when unmapped.
    pub fn translate<'a>(&'a self, name: &'a str) -> &'a str {
        self.map.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl From<BTreeMap<String, String>> for NameTranslation {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self { map }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NameTranslation {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
