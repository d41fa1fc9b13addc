use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// How a locator was resolved. The resolver itself is out of scope for
/// this crate (spec §1); only the branches the linker core needs to tell
/// apart — "does this live at a fixed, already-on-disk path (soft link)"
/// versus "does this need extracting into the store (hard link)" — are
/// modeled. Richer resolver-specific shapes (git refs, tarball urls, npm
/// dist-tags, patches) are the resolver's business, not the linker's.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Reference {
    /// A registry-resolved version. Hard-linked into the store.
    Npm(String),

    /// A workspace member, living at a fixed path inside the project.
    /// Soft-linked in place.
    Workspace(PathBuf),

    /// A `portal:`-style reference to an arbitrary directory outside the
    /// project. Soft-linked in place, same as a workspace.
    Portal(PathBuf),

    /// A peer-dependency instantiation of another reference. Carries the
    /// instantiation hash that makes it unique among virtual siblings.
    Virtual {
        inner: Arc<Reference>,
        hash: String,
    },
}

impl Reference {
    pub fn is_soft_linkable(&self) -> bool {
        matches!(self, Reference::Workspace(_) | Reference::Portal(_))
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, Reference::Virtual { .. })
    }

    /// The non-virtual reference this one stands in for, or itself if it
    /// isn't virtual already.
    pub fn devirtualize(&self) -> Reference {
        match self {
            Reference::Virtual { inner, .. } => inner.devirtualize(),
            other => other.clone(),
        }
    }

    pub fn slug(&self) -> String {
        match self {
            Reference::Npm(version) => format!("npm-{version}"),
            Reference::Workspace(path) => format!("workspace-{}", path.display()),
            Reference::Portal(path) => format!("portal-{}", path.display()),
            Reference::Virtual { inner, hash } => format!("virtual-{}-{hash}", inner.slug()),
        }
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reference::Npm(version) => write!(f, "npm:{version}"),
            Reference::Workspace(path) => write!(f, "workspace:{}", path.display()),
            Reference::Portal(path) => write!(f, "portal:{}", path.display()),
            Reference::Virtual { inner, hash } => write!(f, "virtual:{hash}#{inner}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devirtualize_unwraps_nested_virtuals() {
        let base = Reference::Npm("1.0.0".into());
        let once = Reference::Virtual { inner: Arc::new(base.clone()), hash: "a".into() };
        let twice = Reference::Virtual { inner: Arc::new(once), hash: "b".into() };

        assert_eq!(twice.devirtualize(), base);
    }

    #[test]
    fn workspace_and_portal_are_soft_linkable() {
        assert!(Reference::Workspace(PathBuf::from("/repo/packages/w")).is_soft_linkable());
        assert!(Reference::Portal(PathBuf::from("/elsewhere")).is_soft_linkable());
        assert!(!Reference::Npm("1.0.0".into()).is_soft_linkable());
    }
}
