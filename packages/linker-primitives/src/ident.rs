use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Clone, Debug)]
pub enum IdentError {
    #[error("invalid ident: {0}")]
    SyntaxError(String),
}

/// A package identity: `name` or `@scope/name`. Carries no version or
/// resolution strategy; see `Locator` for that.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ident(String);

impl Ident {
    pub fn new(full: impl AsRef<str>) -> Result<Self, IdentError> {
        let full = full.as_ref();

        if full.is_empty() || full.starts_with('/') || full.ends_with('/') {
            return Err(IdentError::SyntaxError(full.to_string()));
        }

        if full.matches('/').count() > 1 {
            return Err(IdentError::SyntaxError(full.to_string()));
        }

        Ok(Ident(full.to_string()))
    }

    pub fn scope(&self) -> Option<&str> {
        self.0.split_once('/').map(|(scope, _)| scope)
    }

    pub fn name(&self) -> &str {
        self.0.split_once('/').map(|(_, name)| name).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem-safe form, used as part of a locator's store slug.
    pub fn slug(&self) -> String {
        self.0.replace('/', "-")
    }

    /// `node_modules/<ident>` — the vendor subpath this ident occupies
    /// inside someone else's link farm, and the self-reference prefix
    /// inside a package's own store entry.
    pub fn vendor_path(&self) -> PathBuf {
        PathBuf::from("node_modules").join(&self.0)
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Ident {
    type Err = IdentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ident::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_scope_and_name() {
        let ident = Ident::new("@org/pkg").unwrap();
        assert_eq!(ident.scope(), Some("@org"));
        assert_eq!(ident.name(), "pkg");
    }

    #[test]
    fn unscoped_has_no_scope() {
        let ident = Ident::new("pkg").unwrap();
        assert_eq!(ident.scope(), None);
        assert_eq!(ident.name(), "pkg");
    }

    #[test]
    fn slug_replaces_slash() {
        assert_eq!(Ident::new("@org/pkg").unwrap().slug(), "@org-pkg");
    }

    #[test]
    fn vendor_path_is_nm_subdir() {
        assert_eq!(
            Ident::new("@org/pkg").unwrap().vendor_path(),
            PathBuf::from("node_modules/@org/pkg"),
        );
    }

    #[test]
    fn rejects_malformed_idents() {
        assert!(Ident::new("").is_err());
        assert!(Ident::new("/pkg").is_err());
        assert!(Ident::new("a/b/c").is_err());
    }
}
