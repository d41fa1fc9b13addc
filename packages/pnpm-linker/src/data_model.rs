use std::collections::BTreeMap;
use std::path::PathBuf;

use linker_primitives::{Ident, Locator};

/// How a package's content reaches disk (spec §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkType {
    /// Lives at a fixed path already on disk (workspaces, portals). No
    /// copy into the store; the link farm is built alongside it in place.
    Soft,
    /// Must be materialised into the content-addressed store exactly once,
    /// then referenced by every dependent through a symlink.
    Hard,
}

/// A resolved package: identity, link strategy, and its dependency edges.
#[derive(Clone, Debug)]
pub struct Package {
    pub locator: Locator,
    pub link_type: LinkType,
    /// Dependency ident (as it should appear in the dependent's link
    /// farm — may be an alias) to the locator it resolves to.
    pub dependencies: BTreeMap<Ident, Locator>,
}

impl Package {
    /// Self-reference is enabled iff the package doesn't already declare
    /// a dependency on its own ident (spec §3).
    pub fn wants_self_reference(&self) -> bool {
        !self.dependencies.contains_key(&self.locator.ident)
    }
}

/// A readable filesystem view of a package's content, as produced by a
/// fetcher (out of scope for this crate — see spec §1).
#[derive(Clone, Debug)]
pub enum FetchResult {
    /// Content ready to be copied into the store: `root` is where the
    /// package's files actually start inside the fetched tree (some
    /// fetchers wrap the package in an extra directory, e.g. a tarball's
    /// `package/` prefix).
    Readable { root: PathBuf },
    /// Already resolvable at a fixed real path (workspaces, portals);
    /// never copied.
    RealPath { path: PathBuf },
}

impl FetchResult {
    pub fn real_path(&self) -> Option<&PathBuf> {
        match self {
            FetchResult::RealPath { path } => Some(path),
            FetchResult::Readable { .. } => None,
        }
    }
}
