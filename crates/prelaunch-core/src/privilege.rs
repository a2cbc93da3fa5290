//! Dropping process privileges to a named user.
//!
//! Identity changes are applied strictly as supplementary groups, then
//! primary gid, then uid. Once the uid changes, the process can no longer
//! change its groups, so any other order either fails or leaves privileged
//! groups behind.

use std::io;
use std::path::{Path, PathBuf};

use prelaunch_common::constants::{DEFAULT_HOME, HOME_ENV};
use prelaunch_common::error::{PrelaunchError, Result};
use prelaunch_common::types::ExecIdentity;

use crate::env::{EnvProvider, ProcessEnv};
use crate::user::lookup_exec_identity;
use crate::user::paths::UserDbPaths;

/// OS primitives for reading and changing the process identity.
pub trait IdentitySyscalls {
    /// Real user id of the current process.
    fn current_uid(&self) -> u32;

    /// Real group id of the current process.
    fn current_gid(&self) -> u32;

    /// Replaces the supplementary group list.
    ///
    /// # Errors
    ///
    /// Returns the OS error if `setgroups(2)` fails.
    fn set_groups(&mut self, gids: &[u32]) -> io::Result<()>;

    /// Sets the group id.
    ///
    /// # Errors
    ///
    /// Returns the OS error if `setgid(2)` fails.
    fn set_gid(&mut self, gid: u32) -> io::Result<()>;

    /// Sets the user id.
    ///
    /// # Errors
    ///
    /// Returns the OS error if `setuid(2)` fails.
    fn set_uid(&mut self, uid: u32) -> io::Result<()>;
}

/// Identity syscalls of the running host, backed by `nix`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostSyscalls;

impl IdentitySyscalls for HostSyscalls {
    fn current_uid(&self) -> u32 {
        nix::unistd::getuid().as_raw()
    }

    fn current_gid(&self) -> u32 {
        nix::unistd::getgid().as_raw()
    }

    #[cfg(target_os = "linux")]
    fn set_groups(&mut self, gids: &[u32]) -> io::Result<()> {
        let gids: Vec<nix::unistd::Gid> =
            gids.iter().copied().map(nix::unistd::Gid::from_raw).collect();
        nix::unistd::setgroups(&gids).map_err(io::Error::from)
    }

    #[cfg(not(target_os = "linux"))]
    fn set_groups(&mut self, _gids: &[u32]) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "setgroups requires Linux",
        ))
    }

    fn set_gid(&mut self, gid: u32) -> io::Result<()> {
        nix::unistd::setgid(nix::unistd::Gid::from_raw(gid)).map_err(io::Error::from)
    }

    fn set_uid(&mut self, uid: u32) -> io::Result<()> {
        nix::unistd::setuid(nix::unistd::Uid::from_raw(uid)).map_err(io::Error::from)
    }
}

/// One identity change performed while dropping privileges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityStep {
    /// `setgroups(2)` with the supplementary gids.
    SupplementaryGroups,
    /// `setgid(2)` with the primary gid.
    PrimaryGroup,
    /// `setuid(2)` with the uid.
    User,
}

impl IdentityStep {
    /// The only permitted application order.
    pub const ORDER: [Self; 3] = [Self::SupplementaryGroups, Self::PrimaryGroup, Self::User];
}

/// Switches the current process to a named user.
///
/// # Example
///
/// ```no_run
/// use prelaunch_core::privilege::PrivilegeDropper;
///
/// let identity = PrivilegeDropper::new().apply("nobody")?;
/// println!("running as uid {}", identity.uid);
/// # Ok::<(), prelaunch_common::error::PrelaunchError>(())
/// ```
#[derive(Debug)]
pub struct PrivilegeDropper<S = HostSyscalls, E = ProcessEnv> {
    syscalls: S,
    env: E,
    passwd_file: Option<PathBuf>,
    group_file: Option<PathBuf>,
}

impl PrivilegeDropper {
    /// Creates a dropper acting on the real process.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_parts(HostSyscalls, ProcessEnv)
    }
}

impl Default for PrivilegeDropper {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: IdentitySyscalls, E: EnvProvider> PrivilegeDropper<S, E> {
    /// Creates a dropper over explicit syscall and environment providers.
    pub const fn with_parts(syscalls: S, env: E) -> Self {
        Self {
            syscalls,
            env,
            passwd_file: None,
            group_file: None,
        }
    }

    /// Reads users from `path` instead of the platform's passwd database.
    #[must_use]
    pub fn passwd_file<T: AsRef<Path>>(mut self, path: T) -> Self {
        self.passwd_file = Some(path.as_ref().to_owned());
        self
    }

    /// Reads groups from `path` instead of the platform's group database.
    #[must_use]
    pub fn group_file<T: AsRef<Path>>(mut self, path: T) -> Self {
        self.group_file = Some(path.as_ref().to_owned());
        self
    }

    /// Returns the syscall provider.
    pub const fn syscalls(&self) -> &S {
        &self.syscalls
    }

    /// Returns the environment provider.
    pub const fn env(&self) -> &E {
        &self.env
    }

    /// Resolves `user` and applies its identity to the process.
    ///
    /// Sets `HOME` to the user's home directory when it is unset or empty.
    /// Nothing is retried. No identity change is made if resolution fails.
    ///
    /// # Errors
    ///
    /// Returns an error naming the failed step: database path resolution,
    /// user lookup, `setgroups`, `setgid`, `setuid`, or the `HOME` assignment.
    pub fn apply(&mut self, user: &str) -> Result<ExecIdentity> {
        let defaults = ExecIdentity {
            uid: self.syscalls.current_uid(),
            gid: self.syscalls.current_gid(),
            sgids: Vec::new(),
            home: PathBuf::from(DEFAULT_HOME),
        };
        let paths = UserDbPaths::discover(self.passwd_file.as_deref(), self.group_file.as_deref())?;
        let identity = lookup_exec_identity(user, &defaults, &paths)?;

        tracing::info!(
            user,
            uid = identity.uid,
            gid = identity.gid,
            sgids = ?identity.sgids,
            "dropping privileges"
        );
        for step in IdentityStep::ORDER {
            self.apply_step(step, &identity)?;
        }
        self.ensure_home(&identity.home)?;
        Ok(identity)
    }

    fn apply_step(&mut self, step: IdentityStep, identity: &ExecIdentity) -> Result<()> {
        match step {
            IdentityStep::SupplementaryGroups => self
                .syscalls
                .set_groups(&identity.sgids)
                .map_err(|source| PrelaunchError::SetGroups {
                    gids: identity.sgids.clone(),
                    source,
                }),
            IdentityStep::PrimaryGroup => {
                self.syscalls
                    .set_gid(identity.gid)
                    .map_err(|source| PrelaunchError::SetGid {
                        gid: identity.gid,
                        source,
                    })
            }
            IdentityStep::User => {
                self.syscalls
                    .set_uid(identity.uid)
                    .map_err(|source| PrelaunchError::SetUid {
                        uid: identity.uid,
                        source,
                    })
            }
        }
    }

    fn ensure_home(&mut self, home: &Path) -> Result<()> {
        if self.env.get(HOME_ENV).is_some_and(|h| !h.is_empty()) {
            return Ok(());
        }
        let value = home.to_str().ok_or_else(|| PrelaunchError::SetHome {
            home: home.to_path_buf(),
            message: "path is not valid UTF-8".into(),
        })?;
        self.env
            .set(HOME_ENV, value)
            .map_err(|e| PrelaunchError::SetHome {
                home: home.to_path_buf(),
                message: e.to_string(),
            })?;
        tracing::debug!(home = value, "HOME set from user database");
        Ok(())
    }
}
