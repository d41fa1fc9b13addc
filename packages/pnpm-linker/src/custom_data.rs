use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Schema version embedded in the custom-data key. Bumping this makes any
/// previously persisted bag invisible to a newer build without needing to
/// migrate it — the installer just recomputes everything from scratch
/// (spec §6, §9).
const CUSTOM_DATA_VERSION: u32 = 2;
const CUSTOM_DATA_NAME: &str = "PnpmInstaller";

/// The key this core's custom data is stored under in the host's
/// `installersCustomData` bag (spec §6). Any data under a different key —
/// including the same name at an older version — is simply invisible and
/// treated as absent.
pub fn custom_data_key() -> String {
    format!(r#"{{"name":"{CUSTOM_DATA_NAME}","version":{CUSTOM_DATA_VERSION}}}"#)
}

/// Persisted between installs (spec §3).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CustomData {
    /// `locatorHash -> absolute on-disk path` where that package was
    /// materialised.
    pub package_locations: BTreeMap<String, PathBuf>,

    /// `absolute path -> stringified locator` that owns it. Only ever
    /// populated for hard-linked packages (spec §9's preserved ambiguity:
    /// a soft link sets `package_locations` but never this map).
    pub locator_by_path: BTreeMap<PathBuf, String>,
}

impl CustomData {
    /// Looks up this core's entry in the host's persisted bag. Returns
    /// `None` on a missing key, a key for a different version, or a
    /// deserialization failure — all three are "no usable prior data",
    /// never a hard error, since the installer always recomputes.
    pub fn load_from_bag(bag: &BTreeMap<String, serde_json::Value>) -> Option<CustomData> {
        bag.get(&custom_data_key())
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn store_into_bag(&self, bag: &mut BTreeMap<String, serde_json::Value>) -> crate::error::Result<()> {
        let value = serde_json::to_value(self)?;
        bag.insert(custom_data_key(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_the_bag() {
        let mut data = CustomData::default();
        data.package_locations.insert("hash-a".into(), PathBuf::from("/store/a"));
        data.locator_by_path.insert(PathBuf::from("/store/a"), "a@npm:1.0.0".into());

        let mut bag = BTreeMap::new();
        data.store_into_bag(&mut bag).unwrap();

        let reloaded = CustomData::load_from_bag(&bag).unwrap();
        assert_eq!(reloaded.package_locations, data.package_locations);
        assert_eq!(reloaded.locator_by_path, data.locator_by_path);
    }

    #[test]
    fn missing_key_yields_none() {
        let bag = BTreeMap::new();
        assert!(CustomData::load_from_bag(&bag).is_none());
    }

    #[test]
    fn mismatched_version_is_ignored() {
        let mut bag = BTreeMap::new();
        bag.insert(
            r#"{"name":"PnpmInstaller","version":1}"#.to_string(),
            serde_json::json!({"package_locations": {}, "locator_by_path": {}}),
        );

        assert!(CustomData::load_from_bag(&bag).is_none());
    }
}
