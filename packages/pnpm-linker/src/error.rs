use std::path::PathBuf;

/// Errors this core can produce.
///
/// Mirrors the split the teacher's `zpm::error::Error` draws between
/// user-visible failures (bad configuration, unknown locator) and
/// programmer errors (`Assertion`) that indicate a bug in the host or in
/// this crate rather than something the user did — see spec §7.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no install data found at {0}; run an install first")]
    ConfigurationError(PathBuf),

    #[error("locator {0} was not seen during the current install")]
    LookupError(String),

    #[error("internal invariant violated: {0}")]
    Assertion(String),

    #[error("attachExternalDependents is not supported by this linker")]
    UnsupportedOperation,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to (de)serialize install metadata: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// `ENOENT` is not an error for operations spec.md documents as
/// "absence tolerant" (directory listing, store-entry pruning).
pub(crate) fn ok_if_missing(result: std::io::Result<()>) -> std::io::Result<()> {
    match result {
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// `ENOTEMPTY` is not an error for the opportunistic `rmdir` calls this
/// core makes when a directory might have become empty.
pub(crate) fn ok_if_not_empty(result: std::io::Result<()>) -> std::io::Result<()> {
    match result {
        Err(err)
            if err.kind() == std::io::ErrorKind::NotFound
                || err.raw_os_error() == Some(libc_enotempty()) =>
        {
            Ok(())
        },
        other => other,
    }
}

#[cfg(unix)]
fn libc_enotempty() -> i32 {
    39
}

#[cfg(not(unix))]
fn libc_enotempty() -> i32 {
    // Windows reports a directory-not-empty rmdir as ERROR_DIR_NOT_EMPTY (145).
    145
}
