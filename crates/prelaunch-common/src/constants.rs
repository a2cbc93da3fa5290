//! System-wide constants and default paths.

use std::time::Duration;

/// Standard location of the passwd database on Unix systems.
pub const DEFAULT_PASSWD_PATH: &str = "/etc/passwd";

/// Standard location of the group database on Unix systems.
pub const DEFAULT_GROUP_PATH: &str = "/etc/group";

/// Home directory used when the user database has no entry for the user.
pub const DEFAULT_HOME: &str = "/";

/// Environment variable holding the user's home directory.
pub const HOME_ENV: &str = "HOME";

/// Highest user or group id accepted from a numeric spec.
pub const MAX_ID: u32 = (1 << 31) - 1;

/// Suffix identifying link variables that carry a dependency address.
pub const PORT_ENV_SUFFIX: &str = "_PORT";

/// Name fragments marking already-decomposed transport variables
/// (`DB_PORT_5432_TCP`, `DB_PORT_5432_TCP_ADDR`, ...).
pub const DECOMPOSED_ENV_MARKERS: [&str; 2] = ["TCP", "UDP"];

/// Scheme prefix of a composite dependency address.
pub const TCP_SCHEME: &str = "tcp://";

/// Overall time allowed for one dependency to become reachable.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Time allowed for a single connection attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);

/// Binary name for the CLI.
pub const BIN_NAME: &str = "prelaunch";
