//! Domain primitive types used across the prelaunch workspace.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{PrelaunchError, Result};

/// Identity resolved from the user and group databases.
///
/// Produced once per privilege drop and consumed immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecIdentity {
    /// User id to switch to.
    pub uid: u32,
    /// Primary group id to switch to.
    pub gid: u32,
    /// Supplementary group ids.
    pub sgids: Vec<u32>,
    /// Home directory of the user.
    pub home: PathBuf,
}

/// A `host:port` dependency address taken from a `tcp://` link variable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    /// Creates an endpoint from a `host:port` string.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Returns the `host:port` representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Time budget for waiting on a single endpoint.
///
/// `attempts × per_attempt` never exceeds `deadline` by more than one
/// attempt's worth of slack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    deadline: Duration,
    per_attempt: Duration,
    attempts: u32,
}

impl RetryBudget {
    /// Derives the attempt count as `deadline / per_attempt`, rounded down,
    /// with a floor of one attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if `per_attempt` is zero.
    pub fn new(deadline: Duration, per_attempt: Duration) -> Result<Self> {
        if per_attempt.is_zero() {
            return Err(PrelaunchError::Config {
                message: "per-attempt timeout must be greater than zero".into(),
            });
        }
        Ok(Self {
            deadline,
            per_attempt,
            attempts: attempts_within(deadline, per_attempt),
        })
    }

    /// Overall deadline per endpoint.
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Timeout of a single attempt, and the minimum slice each attempt occupies.
    #[must_use]
    pub const fn per_attempt(&self) -> Duration {
        self.per_attempt
    }

    /// Maximum number of connection attempts per endpoint.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        let deadline = crate::constants::DEFAULT_WAIT_TIMEOUT;
        let per_attempt = crate::constants::DEFAULT_ATTEMPT_TIMEOUT;
        Self {
            deadline,
            per_attempt,
            attempts: attempts_within(deadline, per_attempt),
        }
    }
}

/// `deadline / per_attempt` rounded down, clamped to `1..=u32::MAX`.
///
/// `per_attempt` must be non-zero.
fn attempts_within(deadline: Duration, per_attempt: Duration) -> u32 {
    let ratio = deadline.as_nanos() / per_attempt.as_nanos();
    u32::try_from(ratio).unwrap_or(u32::MAX).max(1)
}
