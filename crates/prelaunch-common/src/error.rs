//! Unified error types for the prelaunch workspace.
//!
//! Every failure cause of the two startup steps maps to its own variant so
//! the entry point can report exactly which step stopped the bootstrap.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum PrelaunchError {
    /// The location of a user or group database could not be determined.
    #[error("cannot resolve {database} database path: {message}")]
    UserDbPath {
        /// Which database was being located (`passwd` or `group`).
        database: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// A user or group database exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    UserDbRead {
        /// Path of the database file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The requested user or group could not be resolved.
    #[error("unable to find user {spec}: {message}")]
    UserLookup {
        /// The `user[:group]` spec that was being resolved.
        spec: String,
        /// Description of what could not be found.
        message: String,
    },

    /// Applying the supplementary group list failed.
    #[error("setgroups {gids:?}: {source}")]
    SetGroups {
        /// Group ids that were being applied.
        gids: Vec<u32>,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// Applying the primary group id failed.
    #[error("setgid {gid}: {source}")]
    SetGid {
        /// Group id that was being applied.
        gid: u32,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// Applying the user id failed.
    #[error("setuid {uid}: {source}")]
    SetUid {
        /// User id that was being applied.
        uid: u32,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// `HOME` could not be assigned.
    #[error("set HOME to {}: {message}", home.display())]
    SetHome {
        /// Home directory that was being assigned.
        home: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// A dependency endpoint never accepted a connection within the budget.
    #[error("{address} unreachable after {attempts} attempts: {last_error}")]
    Unreachable {
        /// The `host:port` that was being checked.
        address: String,
        /// Number of connection attempts made.
        attempts: u32,
        /// Error returned by the final attempt.
        last_error: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, PrelaunchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_reports_address_and_attempts() {
        let err = PrelaunchError::Unreachable {
            address: "db:5432".into(),
            attempts: 15,
            last_error: "connection refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "db:5432 unreachable after 15 attempts: connection refused"
        );
    }

    #[test]
    fn syscall_errors_name_the_failed_step() {
        let err = PrelaunchError::SetGid {
            gid: 1000,
            source: std::io::Error::from_raw_os_error(1),
        };
        assert!(err.to_string().starts_with("setgid 1000:"));
    }
}
