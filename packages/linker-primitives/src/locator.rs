use serde::{Deserialize, Serialize};

use crate::hash::StableHash;
use crate::ident::Ident;
use crate::reference::Reference;

/// An opaque, totally-ordered identity for a resolved package.
///
/// Two locators compare equal iff they name the same ident resolved to
/// the same reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Locator {
    pub ident: Ident,
    pub reference: Reference,
}

impl Locator {
    pub fn new(ident: Ident, reference: Reference) -> Self {
        Locator { ident, reference }
    }

    pub fn is_virtual(&self) -> bool {
        self.reference.is_virtual()
    }

    /// The underlying non-virtual locator a virtual instance stands in
    /// for; identity for everything else.
    pub fn devirtualize(&self) -> Locator {
        Locator { ident: self.ident.clone(), reference: self.reference.devirtualize() }
    }

    pub fn is_soft_linkable(&self) -> bool {
        self.reference.is_soft_linkable()
    }

    fn canonical_string(&self) -> String {
        format!("{}@{}", self.ident, self.reference)
    }

    /// Stable 64-bit-ish content hash, used as the async-action-table key
    /// and as the `packageLocations`/`locatorByPath` key.
    pub fn locator_hash(&self) -> String {
        StableHash::of(self.canonical_string().as_bytes()).full()
    }

    /// Deterministic, filesystem-safe slug, unique per locator. Used as
    /// the store entry's directory name.
    pub fn slug(&self) -> String {
        let hash = StableHash::of(self.canonical_string().as_bytes());
        format!("{}-{}-{}", self.ident.slug(), self.reference.slug(), hash.short())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn npm(name: &str, version: &str) -> Locator {
        Locator::new(Ident::new(name).unwrap(), Reference::Npm(version.into()))
    }

    #[test]
    fn same_ident_and_reference_hash_equal() {
        assert_eq!(npm("a", "1.0.0").locator_hash(), npm("a", "1.0.0").locator_hash());
    }

    #[test]
    fn different_versions_hash_differently() {
        assert_ne!(npm("a", "1.0.0").locator_hash(), npm("a", "2.0.0").locator_hash());
    }

    #[rstest]
    #[case("a", "1.0.0")]
    #[case("@org/b", "2.3.4")]
    fn slug_is_filesystem_safe(#[case] name: &str, #[case] version: &str) {
        let slug = npm(name, version).slug();
        assert!(!slug.contains('/'));
        assert!(!slug.contains(':'));
    }

    #[test]
    fn devirtualize_is_identity_for_physical_locators() {
        let locator = npm("a", "1.0.0");
        assert_eq!(locator.devirtualize(), locator);
    }

    #[test]
    fn devirtualize_strips_virtual_wrapper() {
        let physical = npm("a", "1.0.0");
        let virtual_ref = Reference::Virtual {
            inner: std::sync::Arc::new(physical.reference.clone()),
            hash: "deadbeef".into(),
        };
        let virtual_locator = Locator::new(physical.ident.clone(), virtual_ref);

        assert!(virtual_locator.is_virtual());
        assert_eq!(virtual_locator.devirtualize(), physical);
    }
}
