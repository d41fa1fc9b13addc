//! Filesystem primitives shared by the installer: the into-store copy, and
//! the platform-specific link creation described in spec §4.5 and §9.

use std::path::{Path, PathBuf};

use crate::error::{ok_if_missing, Result};

/// Recursively copies `src` into `dst`, creating directories as needed and
/// skipping any destination entry that already exists (spec §4.4 step 3:
/// "without overwriting files already present" — a second install that
/// reuses a store entry must not clobber content another package already
/// wrote there, e.g. peer files shared between a dependency and its
/// devirtualized instances).
pub async fn copy_tree_without_overwrite(src: &Path, dst: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dst).await?;

    let mut entries = tokio::fs::read_dir(src).await?;

    while let Some(entry) = entries.next_entry().await? {
        let file_type = entry.file_type().await?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if file_type.is_dir() {
            Box::pin(copy_tree_without_overwrite(&src_path, &dst_path)).await?;
        } else if tokio::fs::symlink_metadata(&dst_path).await.is_ok() {
            continue;
        } else if file_type.is_symlink() {
            let target = tokio::fs::read_link(&src_path).await?;
            create_relative_symlink(&target, &dst_path).await?;
        } else {
            tokio::fs::copy(&src_path, &dst_path).await?;
        }
    }

    Ok(())
}

/// Removes whatever sits at `path` — file, directory tree, or dangling
/// symlink — tolerating its prior absence.
pub async fn remove_entry(path: &Path, is_dir: bool) -> Result<()> {
    let result = if is_dir {
        match tokio::fs::symlink_metadata(path).await {
            Ok(meta) if meta.file_type().is_symlink() => tokio::fs::remove_file(path).await,
            Ok(_) => tokio::fs::remove_dir_all(path).await,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    } else {
        tokio::fs::remove_file(path).await
    };

    ok_if_missing(result)?;
    Ok(())
}

/// Creates the link a dependent's farm entry needs: a relative symlink on
/// every platform except Windows, where directory reparse points require a
/// junction built from an absolute target (spec §9).
pub async fn create_package_link(link_path: &Path, relative_target: PathBuf, absolute_target: PathBuf) -> Result<()> {
    if let Some(parent) = link_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let link_path = link_path.to_path_buf();

    let outcome = tokio::task::spawn_blocking(move || create_link_blocking(&link_path, &relative_target, &absolute_target))
        .await
        .map_err(|join_error| crate::error::Error::Assertion(format!("link-creation task panicked: {join_error}")))?;

    outcome.map_err(Into::into)
}

#[cfg(unix)]
fn create_link_blocking(link_path: &Path, relative_target: &Path, _absolute_target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(relative_target, link_path)
}

#[cfg(windows)]
fn create_link_blocking(link_path: &Path, _relative_target: &Path, absolute_target: &Path) -> std::io::Result<()> {
    junction::create(absolute_target, link_path)
}

#[cfg(unix)]
async fn create_relative_symlink(target: &Path, link_path: &Path) -> Result<()> {
    let target = target.to_path_buf();
    let link_path = link_path.to_path_buf();

    tokio::task::spawn_blocking(move || std::os::unix::fs::symlink(&target, &link_path))
        .await
        .map_err(|join_error| crate::error::Error::Assertion(format!("symlink task panicked: {join_error}")))??;

    Ok(())
}

#[cfg(windows)]
async fn create_relative_symlink(target: &Path, link_path: &Path) -> Result<()> {
    let target = target.to_path_buf();
    let link_path = link_path.to_path_buf();

    tokio::task::spawn_blocking(move || std::os::windows::fs::symlink_file(&target, &link_path))
        .await
        .map_err(|join_error| crate::error::Error::Assertion(format!("symlink task panicked: {join_error}")))??;

    Ok(())
}

/// On non-Windows, a farm entry can be left alone when it's already a
/// symlink pointing at exactly `expected_target` (spec §4.5 step 4's
/// idempotence requirement). Junctions on Windows don't round-trip through
/// `read_link` the same way, so that platform always replaces the entry;
/// still correct, just not idempotent in the no-op sense.
#[cfg(not(windows))]
pub async fn symlink_already_correct(link_path: &Path, expected_target: &Path) -> bool {
    match tokio::fs::read_link(link_path).await {
        Ok(actual) => actual == expected_target,
        Err(_) => false,
    }
}

#[cfg(windows)]
pub async fn symlink_already_correct(_link_path: &Path, _expected_target: &Path) -> bool {
    false
}
