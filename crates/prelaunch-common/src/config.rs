//! Global configuration model for a prelaunch run.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::types::RetryBudget;

/// Root configuration for the startup preparation steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrelaunchConfig {
    /// `user[:group]` to drop privileges to. `None` keeps the current identity.
    pub user: Option<String>,
    /// Whether to wait for linked TCP dependencies.
    pub wait: bool,
    /// Overall time allowed per dependency.
    pub wait_timeout: Duration,
    /// Time allowed for a single connection attempt.
    pub attempt_timeout: Duration,
    /// Override for the passwd database location.
    pub passwd_file: Option<PathBuf>,
    /// Override for the group database location.
    pub group_file: Option<PathBuf>,
}

impl PrelaunchConfig {
    /// Builds the retry budget from the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the attempt timeout is zero.
    pub fn retry_budget(&self) -> Result<RetryBudget> {
        RetryBudget::new(self.wait_timeout, self.attempt_timeout)
    }
}

impl Default for PrelaunchConfig {
    fn default() -> Self {
        Self {
            user: None,
            wait: true,
            wait_timeout: crate::constants::DEFAULT_WAIT_TIMEOUT,
            attempt_timeout: crate::constants::DEFAULT_ATTEMPT_TIMEOUT,
            passwd_file: None,
            group_file: None,
        }
    }
}
