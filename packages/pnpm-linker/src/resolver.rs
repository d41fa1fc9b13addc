use std::path::{Component, Path, PathBuf};

use crate::custom_data::CustomData;
use crate::error::{Error, Result};

/// Read-side of the installer: maps a locator hash to where it lives on
/// disk, and a filesystem path back to the locator that owns it
/// (spec §4.7). Both operations require a persisted `CustomData` from a
/// prior install; its absence is user-visible (spec §7).
pub struct Resolver<'a> {
    data: &'a CustomData,
}

impl<'a> Resolver<'a> {
    pub fn new(data: &'a CustomData) -> Self {
        Self { data }
    }

    pub fn find_package_location(&self, locator_hash: &str) -> Result<PathBuf> {
        self.data.package_locations
            .get(locator_hash)
            .cloned()
            .ok_or_else(|| Error::LookupError(locator_hash.to_string()))
    }

    /// `None` if nothing in this install owns `path`.
    pub fn find_package_locator(&self, path: &Path) -> Option<String> {
        if let Some(prefix) = node_modules_package_prefix(path) {
            if let Some(locator) = self.data.locator_by_path.get(&prefix) {
                return Some(locator.clone());
            }
        }

        let mut candidate = Some(path.to_path_buf());

        while let Some(current) = candidate {
            if let Some(locator) = self.data.locator_by_path.get(&current) {
                return Some(locator.clone());
            }

            candidate = current.parent().map(Path::to_path_buf);
        }

        None
    }
}

/// Loads the persisted custom data a resolver query needs (spec §4.7): both
/// `find_package_location` and `find_package_locator` require it to exist,
/// and its absence is the one user-visible error this step can raise.
pub fn load_or_err(
    bag: &std::collections::BTreeMap<String, serde_json::Value>,
    project_cwd: &Path,
) -> Result<CustomData> {
    CustomData::load_from_bag(bag).ok_or_else(|| Error::ConfigurationError(project_cwd.to_path_buf()))
}

/// Extracts the `.../node_modules/(@scope/)?name` prefix of `path`, using
/// the *last* such occurrence (a path may legitimately nest several
/// `node_modules` segments, one per level of dependency).
fn node_modules_package_prefix(path: &Path) -> Option<PathBuf> {
    let components: Vec<Component> = path.components().collect();

    let mut best: Option<usize> = None;

    for (idx, component) in components.iter().enumerate() {
        if component.as_os_str() == "node_modules" {
            best = Some(idx);
        }
    }

    let nm_idx = best?;
    let name_idx = nm_idx + 1;
    let name_component = components.get(name_idx)?;

    let is_scope = name_component.as_os_str().to_str().is_some_and(|s| s.starts_with('@'));

    let end_idx = if is_scope { name_idx + 2 } else { name_idx + 1 };

    if end_idx > components.len() {
        return None;
    }

    Some(components[..end_idx].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn data_with(pairs: &[(&str, &str)]) -> CustomData {
        let mut data = CustomData::default();

        for (path, locator) in pairs {
            data.locator_by_path.insert(PathBuf::from(path), locator.to_string());
        }

        data
    }

    #[test]
    fn finds_plain_package_prefix() {
        let path = Path::new("/repo/node_modules/foo/lib/index.js");
        assert_eq!(node_modules_package_prefix(path), Some(PathBuf::from("/repo/node_modules/foo")));
    }

    #[test]
    fn finds_scoped_package_prefix() {
        let path = Path::new("/repo/node_modules/@org/foo/lib/index.js");
        assert_eq!(node_modules_package_prefix(path), Some(PathBuf::from("/repo/node_modules/@org/foo")));
    }

    #[test]
    fn no_node_modules_segment_yields_none() {
        assert_eq!(node_modules_package_prefix(Path::new("/repo/packages/w/index.js")), None);
    }

    #[test]
    fn uses_the_deepest_node_modules_segment() {
        let path = Path::new("/store/slug/node_modules/foo/node_modules/bar/lib/index.js");
        assert_eq!(
            node_modules_package_prefix(path),
            Some(PathBuf::from("/store/slug/node_modules/foo/node_modules/bar")),
        );
    }

    #[test]
    fn direct_lookup_hits_registered_prefix() {
        let data = data_with(&[("/repo/node_modules/foo", "foo@npm:1.0.0")]);
        let resolver = Resolver::new(&data);

        assert_eq!(
            resolver.find_package_locator(Path::new("/repo/node_modules/foo/lib/index.js")),
            Some("foo@npm:1.0.0".to_string()),
        );
    }

    #[test]
    fn falls_back_to_upward_walk_for_non_node_modules_paths() {
        let data = data_with(&[("/repo/packages/w", "w@workspace:.")]);
        let resolver = Resolver::new(&data);

        assert_eq!(
            resolver.find_package_locator(Path::new("/repo/packages/w/src/index.js")),
            Some("w@workspace:.".to_string()),
        );
    }

    #[test]
    fn upward_walk_matches_the_exact_path_too() {
        let data = data_with(&[("/store/slug/.", "a@npm:1.0.0")]);
        let resolver = Resolver::new(&data);

        assert_eq!(
            resolver.find_package_locator(&PathBuf::from("/store/slug/.")),
            Some("a@npm:1.0.0".to_string()),
        );
    }

    #[test]
    fn unmatched_path_returns_none() {
        let data = data_with(&[("/repo/node_modules/foo", "foo@npm:1.0.0")]);
        let resolver = Resolver::new(&data);

        assert_eq!(resolver.find_package_locator(Path::new("/elsewhere/file.js")), None);
    }

    #[test]
    fn find_package_location_reports_unseen_locator() {
        let data = CustomData::default();
        let resolver = Resolver::new(&data);

        assert!(matches!(resolver.find_package_location("unknown"), Err(Error::LookupError(_))));
    }

    #[test]
    fn load_or_err_reports_missing_data_as_configuration_error() {
        let bag = BTreeMap::new();
        let cwd = Path::new("/repo");

        let err = load_or_err(&bag, cwd).unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(path) if path.as_path() == cwd));
    }

    #[test]
    fn load_or_err_succeeds_once_a_prior_install_persisted_data() {
        let mut bag = BTreeMap::new();
        let mut data = CustomData::default();
        data.package_locations.insert("a@npm:1.0.0".into(), PathBuf::from("/store/a"));
        data.store_into_bag(&mut bag).unwrap();

        let loaded = load_or_err(&bag, Path::new("/repo")).unwrap();
        assert_eq!(loaded.package_locations, data.package_locations);
    }
}
