//! The installer proper: turning a resolved package graph into the on-disk
//! store-and-symlink-farm layout (spec §4). Grounded on the teacher's
//! `linker::pnpm::PnpmLinker`, which performs the same two-pass
//! materialise-then-attach shape synchronously; this version defers the
//! filesystem work through [`AsyncActions`] so a dependent's farm
//! construction can run concurrently with its siblings', gated only on its
//! own dependencies' materialisation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use linker_primitives::{Ident, Locator, Reference};

use crate::actions::AsyncActions;
use crate::custom_data::CustomData;
use crate::data_model::{FetchResult, LinkType, Package};
use crate::error::{Error, Result};
use crate::fsops;
use crate::listing::listing;
use crate::project::{DependencyMeta, Project};

const DEFAULT_CONCURRENCY: usize = 10;

/// What [`Installer::materialize`] hands back to the host for a single
/// package (spec §4.4's return value).
#[derive(Clone, Debug)]
pub struct MaterializeResult {
    pub package_location: PathBuf,
    pub build_commands: Option<Vec<String>>,
}

/// One dependency edge resolved and ready to be linked: the name it should
/// appear under in the dependent's farm, and where it actually lives.
struct DependencyEdge {
    ident: Ident,
    target_path: PathBuf,
}

/// Drives one install from start to finish. Not `Clone`; the host is
/// expected to hold a single instance for the duration of the install and
/// call `materialize`/`attach_dependencies` for every package in the graph,
/// then `finalize` once.
pub struct Installer {
    project: Arc<Project>,
    actions: AsyncActions,
    custom_data: CustomData,
}

impl Installer {
    pub fn new(project: Arc<Project>) -> Self {
        Self::with_concurrency(project, DEFAULT_CONCURRENCY)
    }

    pub fn with_concurrency(project: Arc<Project>, concurrency: usize) -> Self {
        Self { project, actions: AsyncActions::new(concurrency), custom_data: CustomData::default() }
    }

    /// Spec §4.4: establishes where `package` will live, recording that
    /// location in `packageLocations` synchronously, then (for hard-linked
    /// packages only) schedules the actual content copy in the background.
    pub fn materialize(&mut self, package: &Package, fetch: &FetchResult) -> Result<MaterializeResult> {
        match package.link_type {
            LinkType::Soft => self.materialize_soft(package, fetch),
            LinkType::Hard => self.materialize_hard(package, fetch),
        }
    }

    fn materialize_soft(&mut self, package: &Package, fetch: &FetchResult) -> Result<MaterializeResult> {
        let real_path = fetch.real_path().ok_or_else(|| {
            Error::Assertion(format!("{} is soft-linked but its fetch result has no real path", package.locator))
        })?;

        self.custom_data.package_locations.insert(package.locator.locator_hash(), real_path.clone());

        Ok(MaterializeResult { package_location: real_path.clone(), build_commands: None })
    }

    fn materialize_hard(&mut self, package: &Package, fetch: &FetchResult) -> Result<MaterializeResult> {
        let root = match fetch {
            FetchResult::Readable { root } => root.clone(),
            FetchResult::RealPath { .. } => {
                return Err(Error::Assertion(format!("{} is hard-linked but its fetch result is a real path", package.locator)))
            },
        };

        let create_self_reference = package.wants_self_reference();
        let package_location = crate::path::package_location(&package.locator, &self.project.project_cwd, create_self_reference);
        let locator_hash = package.locator.locator_hash();

        self.custom_data.locator_by_path.insert(package_location.clone(), package.locator.to_string());
        self.custom_data.package_locations.insert(locator_hash.clone(), package_location.clone());

        let dest = package_location.clone();
        log::debug!("materializing {} into {}", package.locator, dest.display());

        self.actions.set(locator_hash, move || async move { fsops::copy_tree_without_overwrite(&root, &dest).await });

        let devirtualized = package.locator.devirtualize();
        let raw_commands = self.project.build_directives.build_commands(&devirtualized);
        let meta = self.project.dependency_meta.dependency_meta(&devirtualized);
        let build_commands = resolve_build_commands(raw_commands, &meta, self.project.config.is_active_linker());

        Ok(MaterializeResult { package_location, build_commands })
    }

    /// Spec §7: `attachExternalDependents` is not supported by this linker
    /// and raises unconditionally.
    pub fn attach_external_dependents(&self) -> Result<()> {
        Err(Error::UnsupportedOperation)
    }

    /// Spec §4.5: schedules the link-farm reconciliation for `dependent`,
    /// gated (via `reduce`) on `dependent`'s own materialisation having
    /// settled. The lookups below run synchronously at call time, relying
    /// on the host's ordering guarantee that every dependency named here
    /// was already materialized before this call is made.
    pub fn attach_dependencies(&self, dependent: &Package) -> Result<()> {
        if !self.project.config.is_active_linker() {
            return Ok(());
        }

        if !is_compatible(&dependent.locator) {
            return Ok(());
        }

        let locator_hash = dependent.locator.locator_hash();

        let package_location = self.custom_data.package_locations.get(&locator_hash).cloned().ok_or_else(|| {
            Error::Assertion(format!("materialize was never called for {}", dependent.locator))
        })?;

        let store_root = self.project.store_root();
        let (nm_path, store_entry_to_clean) = compute_nm_path(&package_location, &store_root, &dependent.locator);

        let mut edges = Vec::with_capacity(dependent.dependencies.len());

        for (descriptor_ident, dep_locator) in &dependent.dependencies {
            let resolved = if is_compatible(dep_locator) {
                dep_locator.clone()
            } else {
                self.project.report.warn(
                    "PEER_VARIANTS_UNSUPPORTED",
                    &format!("{} cannot carry a workspace peer-dependency variant; falling back to the physical instance", dep_locator),
                );
                dep_locator.devirtualize()
            };

            let dep_hash = resolved.locator_hash();
            let target_path = self.custom_data.package_locations.get(&dep_hash).cloned().ok_or_else(|| {
                Error::Assertion(format!("materialize was never called for dependency {resolved} of {}", dependent.locator))
            })?;

            edges.push(DependencyEdge { ident: descriptor_ident.clone(), target_path });
        }

        let self_ident = dependent.locator.ident.clone();

        self.actions.reduce(locator_hash, move |prior| async move {
            if let Err(err) = prior {
                return Err(Error::Assertion(format!("dependency materialisation failed before attachment could run: {err}")));
            }

            attach_farm(nm_path, store_entry_to_clean, edges, self_ident).await
        });

        Ok(())
    }

    /// Spec §4.6: awaits every scheduled action, then garbage-collects
    /// store entries no longer referenced by any path recorded this
    /// install, and returns the data to persist for the next one.
    pub async fn finalize(self) -> Result<CustomData> {
        self.actions.wait().await;

        let store_root = self.project.store_root();
        let live_entries: std::collections::BTreeSet<PathBuf> =
            self.custom_data.package_locations.values().filter_map(|path| store_entry_root(path, &store_root)).collect();

        let mut removed = 0u32;

        match tokio::fs::read_dir(&store_root).await {
            Ok(mut entries) => {
                while let Some(entry) = entries.next_entry().await? {
                    let path = entry.path();

                    if !live_entries.contains(&path) {
                        fsops::remove_entry(&path, true).await?;
                        removed += 1;
                    }
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {},
            Err(err) => return Err(err.into()),
        }

        if removed > 0 {
            log::debug!("finalize: garbage-collected {removed} stale store entr{}", if removed == 1 { "y" } else { "ies" });
        }

        // Step 3's prune can empty the store entirely (e.g. switching away
        // from this linker); step 5 does the same one level up. Both are
        // opportunistic: a non-empty node_modules (other linker state,
        // .bin, …) is left alone.
        crate::error::ok_if_not_empty(tokio::fs::remove_dir(&store_root).await)?;
        crate::error::ok_if_not_empty(tokio::fs::remove_dir(self.project.node_modules_root()).await)?;

        Ok(self.custom_data)
    }
}

/// Spec §4.4 step 5: the manifest-derived directive is only ever a
/// candidate. A `dependenciesMeta` entry marking the package `built: false`
/// suppresses it outright (the host's escape hatch for a package whose
/// build step is broken or unwanted), and it's moot whenever this isn't
/// even the linker driving the install.
fn resolve_build_commands(raw: Option<Vec<String>>, meta: &DependencyMeta, is_active_linker: bool) -> Option<Vec<String>> {
    if !is_active_linker || meta.built == Some(false) {
        return None;
    }

    raw
}

/// `true` unless `locator` is a virtual instance of a workspace member —
/// spec's non-goal of supporting more than one peer-dependency
/// instantiation of the same workspace means such an edge can't be
/// satisfied (a workspace has exactly one on-disk location, so it can't be
/// duplicated per-instantiation the way a store entry can).
fn is_compatible(locator: &Locator) -> bool {
    !(locator.is_virtual() && matches!(locator.devirtualize().reference, Reference::Workspace(_)))
}

/// If `package_location` sits inside the store and ends with the
/// package's own vendor subpath (self-reference enabled), the farm for its
/// dependencies is its *store entry's* `node_modules` — the level above its
/// own self-entry, so sibling lookups from inside the self-entry still find
/// it via Node's usual upward walk. Otherwise (self-reference disabled, or
/// not a store path at all) the farm is simply `package_location/node_modules`.
fn compute_nm_path(package_location: &Path, store_root: &Path, locator: &Locator) -> (PathBuf, Option<PathBuf>) {
    let vendor_suffix = crate::path::vendor_path(locator);

    if package_location.starts_with(store_root) && package_location.ends_with(&vendor_suffix) {
        let ident_depth = if locator.ident.scope().is_some() { 2 } else { 1 };

        let mut nm_path = package_location.to_path_buf();
        for _ in 0..ident_depth {
            nm_path.pop();
        }

        let store_entry_root = nm_path.parent().map(Path::to_path_buf).expect("node_modules always has a parent inside the store");

        (nm_path, Some(store_entry_root))
    } else {
        (package_location.join("node_modules"), None)
    }
}

/// Store entry root for GC purposes: `<store>/<slug>`, derived from a
/// `packageLocations` value the same way `compute_nm_path` derives it, plus
/// the disabled-self-reference case where the location already *is* the
/// entry root (spec §3's `.` convention).
fn store_entry_root(package_location: &Path, store_root: &Path) -> Option<PathBuf> {
    let relative = package_location.strip_prefix(store_root).ok()?;
    let slug = relative.components().next()?;
    Some(store_root.join(slug.as_os_str()))
}

/// The async body deferred behind `reduce`: spec §4.5 steps 3-8.
async fn attach_farm(
    nm_path: PathBuf,
    store_entry_to_clean: Option<PathBuf>,
    edges: Vec<DependencyEdge>,
    self_ident: Ident,
) -> Result<()> {
    if let Some(store_entry_root) = &store_entry_to_clean {
        clean_store_entry_root(store_entry_root).await?;
    }

    let mut extraneous = listing(&nm_path).await?;

    // The self-reference entry, when present, is never extraneous — it
    // was placed by this same package's own materialisation, not by a
    // stale dependency edge.
    extraneous.remove(self_ident.as_str());

    let mut touched_scopes = std::collections::BTreeSet::new();

    for edge in &edges {
        extraneous.remove(edge.ident.as_str());

        let link_path = nm_path.join(edge.ident.as_str());
        let relative_target = crate::path::relative_to(&edge.target_path, link_path.parent().unwrap_or(&nm_path));

        if fsops::symlink_already_correct(&link_path, &relative_target).await {
            continue;
        }

        fsops::remove_entry(&link_path, true).await?;
        fsops::create_package_link(&link_path, relative_target, edge.target_path.clone()).await?;
    }

    for (key, entry) in &extraneous {
        fsops::remove_entry(&entry.path, entry.is_dir).await?;

        if let Some((scope, _)) = key.split_once('/') {
            touched_scopes.insert(scope.to_string());
        }
    }

    for scope in touched_scopes {
        let result = tokio::fs::remove_dir(nm_path.join(&scope)).await;
        crate::error::ok_if_not_empty(result)?;
    }

    Ok(())
}

/// Spec §4.5 step 3: a store entry whose self-reference regime changed
/// between installs may have leftover content sitting directly at the
/// entry root from when self-reference was disabled (content lived at
/// `<store>/<slug>/.` rather than `<store>/<slug>/node_modules/<ident>`).
/// Everything except the `node_modules` directory itself is stale.
async fn clean_store_entry_root(store_entry_root: &Path) -> Result<()> {
    let mut entries = match tokio::fs::read_dir(store_entry_root).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        if entry.file_name() == "node_modules" {
            continue;
        }

        let file_type = entry.file_type().await?;
        fsops::remove_entry(&entry.path(), file_type.is_dir()).await?;
    }

    Ok(())
}
