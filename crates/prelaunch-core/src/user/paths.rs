//! Discovery of the passwd and group database locations.

use std::path::{Path, PathBuf};

use prelaunch_common::error::Result;

/// Locations of the user and group databases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDbPaths {
    /// Path to the passwd database.
    pub passwd: PathBuf,
    /// Path to the group database.
    pub group: PathBuf,
}

impl UserDbPaths {
    /// Resolves both database paths, preferring explicit overrides over
    /// the platform's standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform has no standard location and no
    /// override was given.
    pub fn discover(passwd: Option<&Path>, group: Option<&Path>) -> Result<Self> {
        let passwd = match passwd {
            Some(path) => path.to_path_buf(),
            None => passwd_path()?,
        };
        let group = match group {
            Some(path) => path.to_path_buf(),
            None => group_path()?,
        };
        tracing::debug!(
            passwd = %passwd.display(),
            group = %group.display(),
            "resolved user database paths"
        );
        Ok(Self { passwd, group })
    }
}

/// Returns the platform's passwd database location.
///
/// # Errors
///
/// Infallible on Unix.
#[cfg(unix)]
pub fn passwd_path() -> Result<PathBuf> {
    Ok(PathBuf::from(prelaunch_common::constants::DEFAULT_PASSWD_PATH))
}

/// Stub for non-Unix platforms.
///
/// # Errors
///
/// Always returns an error — there is no passwd database outside Unix.
#[cfg(not(unix))]
pub fn passwd_path() -> Result<PathBuf> {
    Err(prelaunch_common::error::PrelaunchError::UserDbPath {
        database: "passwd",
        message: "unsupported platform".into(),
    })
}

/// Returns the platform's group database location.
///
/// # Errors
///
/// Infallible on Unix.
#[cfg(unix)]
pub fn group_path() -> Result<PathBuf> {
    Ok(PathBuf::from(prelaunch_common::constants::DEFAULT_GROUP_PATH))
}

/// Stub for non-Unix platforms.
///
/// # Errors
///
/// Always returns an error — there is no group database outside Unix.
#[cfg(not(unix))]
pub fn group_path() -> Result<PathBuf> {
    Err(prelaunch_common::error::PrelaunchError::UserDbPath {
        database: "group",
        message: "unsupported platform".into(),
    })
}
