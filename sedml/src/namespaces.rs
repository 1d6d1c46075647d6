// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping between SED-ML level/version pairs and XML namespaces.

use crate::error::{OpResult, OperationError};
use crate::token::XmlNamespaces;

pub const SEDML_XMLNS_L1V1: &str = "http://sed-ml.org/";
pub const SEDML_XMLNS_L1V2: &str = "http://sed-ml.org/sed-ml/level1/version2";
pub const SEDML_XMLNS_L1V3: &str = "http://sed-ml.org/sed-ml/level1/version3";
pub const SEDML_XMLNS_L1V4: &str = "http://sed-ml.org/sed-ml/level1/version4";
pub const SEDML_XMLNS_L1V5: &str = "http://sed-ml.org/sed-ml/level1/version5";

pub const SEDML_DEFAULT_LEVEL: u32 = 1;
pub const SEDML_DEFAULT_VERSION: u32 = 4;

const ALL: [&str; 5] = [
    SEDML_XMLNS_L1V1,
    SEDML_XMLNS_L1V2,
    SEDML_XMLNS_L1V3,
    SEDML_XMLNS_L1V4,
    SEDML_XMLNS_L1V5,
];

/// Returns the core namespace URI for a level/version pair.
///
/// Every level uses the level 1 table; unknown versions map to version 3.
pub fn sedml_namespace_uri(_level: u32, version: u32) -> &'static str {
    match version {
        1 => SEDML_XMLNS_L1V1,
        2 => SEDML_XMLNS_L1V2,
        4 => SEDML_XMLNS_L1V4,
        5 => SEDML_XMLNS_L1V5,
        _ => SEDML_XMLNS_L1V3,
    }
}

/// True if `uri` is any SED-ML core namespace.
pub fn is_sed_namespace(uri: &str) -> bool {
    ALL.contains(&uri)
}

/// Returns the `(level, version)` a core namespace URI denotes.
pub fn level_version_for_uri(uri: &str) -> Option<(u32, u32)> {
    ALL.iter()
        .position(|u| *u == uri)
        .map(|i| (1, i as u32 + 1))
}

/// A level/version pair plus the XML namespaces declared alongside it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SedNamespaces {
    level: u32,
    version: u32,
    namespaces: XmlNamespaces,
}

impl SedNamespaces {
    /// Creates namespaces for `level`/`version` with the matching core URI as the default namespace.
    pub fn new(level: u32, version: u32) -> Self {
        let mut namespaces = XmlNamespaces::new();
        namespaces.add(sedml_namespace_uri(level, version), "");
        Self {
            level,
            version,
            namespaces,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// The core namespace URI implied by the level and version.
    pub fn uri(&self) -> &'static str {
        sedml_namespace_uri(self.level, self.version)
    }

    /// Changes the level and version, moving a default core namespace along with them.
    pub(crate) fn set_level_version(&mut self, level: u32, version: u32) {
        let old = self.uri();
        self.level = level;
        self.version = version;
        if let Some(prefix) = self.namespaces.prefix_for_uri(old).map(str::to_owned) {
            self.namespaces.add(self.uri(), &prefix);
        }
    }

    pub fn namespaces(&self) -> &XmlNamespaces {
        &self.namespaces
    }

    pub fn namespaces_mut(&mut self) -> &mut XmlNamespaces {
        &mut self.namespaces
    }

    /// Declares `prefix` as `uri`. Redeclaring the core namespace under another prefix fails.
    pub fn add_namespace(&mut self, uri: &str, prefix: &str) -> OpResult {
        if is_sed_namespace(uri) && self.namespaces.prefix_for_uri(uri).map_or(false, |p| p != prefix) {
            return Err(OperationError::InvalidAttributeValue);
        }
        self.namespaces.add(uri, prefix);
        Ok(())
    }

    pub fn remove_namespace(&mut self, uri: &str) -> OpResult {
        match self.namespaces.prefix_for_uri(uri).map(str::to_owned) {
            Some(prefix) => {
                self.namespaces.remove(&prefix);
                Ok(())
            }
            None => Err(OperationError::IndexExceedsSize),
        }
    }

    /// Adds all of `other`'s declarations, keeping existing ones.
    pub fn add_namespaces(&mut self, other: &XmlNamespaces) {
        for (prefix, uri) in other.iter() {
            if self.namespaces.index_of_prefix(prefix).is_none() {
                self.namespaces.add(uri, prefix);
            }
        }
    }

    /// True if at most one core namespace is declared and it agrees with the version.
    pub fn is_valid_combination(&self) -> bool {
        let declared: Vec<&str> = ALL
            .iter()
            .copied()
            .filter(|u| self.namespaces.has_uri(u))
            .collect();
        match declared.as_slice() {
            [] => true,
            [uri] => *uri == self.uri(),
            _ => false,
        }
    }
}

impl Default for SedNamespaces {
    fn default() -> Self {
        Self::new(SEDML_DEFAULT_LEVEL, SEDML_DEFAULT_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uris() {
        assert_eq!(sedml_namespace_uri(1, 1), "http://sed-ml.org/");
        assert_eq!(sedml_namespace_uri(1, 9), SEDML_XMLNS_L1V3);
        assert_eq!(sedml_namespace_uri(2, 4), SEDML_XMLNS_L1V4);
        assert_eq!(level_version_for_uri(SEDML_XMLNS_L1V2), Some((1, 2)));
        assert!(is_sed_namespace(SEDML_XMLNS_L1V5));
        assert!(!is_sed_namespace("http://www.w3.org/1999/xhtml"));
    }

    #[test]
    fn combination() {
        let mut ns = SedNamespaces::new(1, 4);
        assert!(ns.is_valid_combination());
        ns.namespaces_mut().add(SEDML_XMLNS_L1V3, "old");
        assert!(!ns.is_valid_combination());
        ns.remove_namespace(SEDML_XMLNS_L1V3).unwrap();
        assert!(ns.is_valid_combination());
        assert_eq!(
            ns.add_namespace(SEDML_XMLNS_L1V4, "s"),
            Err(OperationError::InvalidAttributeValue)
        );
    }
}
