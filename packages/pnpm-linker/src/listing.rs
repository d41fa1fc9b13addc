use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// One entry of a link farm's real, on-disk contents.
#[derive(Clone, Debug)]
pub struct ListingEntry {
    /// Full path to the entry (may be a `<scope>/<name>` path one level
    /// under `nm_path`).
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Enumerates the real contents of a `node_modules` directory, flattening
/// scoped (`@scope/name`) entries into single `"@scope/name"` keys.
///
/// Absence of `nm_path` itself is not an error — a package that declares
/// no dependencies simply has no link farm yet.
pub async fn listing(nm_path: &Path) -> Result<BTreeMap<String, ListingEntry>> {
    let mut out = BTreeMap::new();

    let mut entries = match tokio::fs::read_dir(nm_path).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(out),
        Err(err) => return Err(err.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();

        // `.store`, `.bin`, and any other dotfile are reserved/internal
        // and never participate in dependency-edge reconciliation.
        if name.starts_with('.') {
            continue;
        }

        if let Some(scope) = name.strip_prefix('@') {
            let scope_path = nm_path.join(&name);

            let mut scope_entries = match tokio::fs::read_dir(&scope_path).await {
                Ok(entries) => entries,
                // The scope directory may have been removed concurrently
                // between our outer read_dir and this one; not an error.
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };

            let mut any_child = false;

            while let Some(child) = scope_entries.next_entry().await? {
                any_child = true;

                let child_name = child.file_name().to_string_lossy().into_owned();
                let child_path = scope_path.join(&child_name);
                let file_type = child.file_type().await?;

                out.insert(
                    format!("@{scope}/{child_name}"),
                    ListingEntry { path: child_path, is_dir: file_type.is_dir() },
                );
            }

            // An empty scope directory is exposed as a single entry so
            // it's eligible for cleanup like any other extraneous entry.
            if !any_child {
                out.insert(name, ListingEntry { path: scope_path, is_dir: true });
            }

            continue;
        }

        let file_type = entry.file_type().await?;
        out.insert(name.clone(), ListingEntry { path: nm_path.join(&name), is_dir: file_type.is_dir() });
    }

    Ok(out)
}
