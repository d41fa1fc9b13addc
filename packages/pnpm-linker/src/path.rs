use std::path::{Path, PathBuf};

use linker_primitives::Locator;

/// `<project>/node_modules`.
pub fn node_modules_root(project_cwd: &Path) -> PathBuf {
    project_cwd.join("node_modules")
}

/// `<project>/node_modules/.store`.
pub fn store_root(project_cwd: &Path) -> PathBuf {
    node_modules_root(project_cwd).join(".store")
}

/// `<store>/<slug>/<prefix>`, where `prefix` is either the package's own
/// vendor subpath (self-reference enabled) or `.` (disabled).
///
/// Self-reference lets `require("self-name")` resolve from inside the
/// package's own store entry; it's enabled by the installer exactly when
/// the package doesn't already declare a dependency on its own ident
/// (spec §3, "Store layout invariants").
pub fn package_location(locator: &Locator, project_cwd: &Path, create_self_reference: bool) -> PathBuf {
    let entry_root = store_root(project_cwd).join(locator.slug());

    if create_self_reference {
        entry_root.join(vendor_path(locator))
    } else {
        entry_root.join(".")
    }
}

/// `node_modules/<ident>` — where a package would sit inside someone
/// else's link farm, and (when self-reference is enabled) inside its own
/// store entry.
pub fn vendor_path(locator: &Locator) -> PathBuf {
    locator.ident.vendor_path()
}

/// The relative path from `base` to `target`, so a symlink created at
/// `base/<name>` with this as its target stays valid if the whole store
/// is moved — the portability requirement from spec §4.5.
///
/// Both paths must be absolute (or at least share a common root); this is
/// plain path algebra, not filesystem-aware (no symlink resolution).
pub fn relative_to(target: &Path, base: &Path) -> PathBuf {
    let target_components: Vec<_> = target.components().collect();
    let base_components: Vec<_> = base.components().collect();

    let common_len = target_components.iter()
        .zip(base_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();

    for _ in common_len..base_components.len() {
        result.push("..");
    }

    for component in &target_components[common_len..] {
        result.push(component.as_os_str());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use linker_primitives::{Ident, Reference};

    fn locator(name: &str) -> Locator {
        Locator::new(Ident::new(name).unwrap(), Reference::Npm("1.0.0".into()))
    }

    #[test]
    fn store_root_is_dotstore_under_node_modules() {
        let cwd = Path::new("/repo");
        assert_eq!(store_root(cwd), PathBuf::from("/repo/node_modules/.store"));
    }

    #[test]
    fn package_location_with_self_reference_appends_vendor_path() {
        let cwd = Path::new("/repo");
        let loc = locator("a");

        let with_self_ref = package_location(&loc, cwd, true);
        assert_eq!(
            with_self_ref,
            store_root(cwd).join(loc.slug()).join("node_modules/a"),
        );
    }

    #[test]
    fn package_location_without_self_reference_uses_dot() {
        let cwd = Path::new("/repo");
        let loc = locator("a");

        let without_self_ref = package_location(&loc, cwd, false);
        assert_eq!(without_self_ref, store_root(cwd).join(loc.slug()).join("."));
    }

    #[test]
    fn scoped_ident_vendor_path_keeps_scope_segment() {
        let loc = locator("@org/pkg");
        assert_eq!(vendor_path(&loc), PathBuf::from("node_modules/@org/pkg"));
    }
}
