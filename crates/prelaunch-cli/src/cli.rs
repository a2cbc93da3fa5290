//! Command-line definition and the bootstrap sequence.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use prelaunch_common::config::PrelaunchConfig;
use prelaunch_common::constants::{BIN_NAME, DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_WAIT_TIMEOUT};
use prelaunch_core::privilege::PrivilegeDropper;
use prelaunch_core::wait::DependencyWaiter;

/// Prepare a container process, then exec its workload.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Drop privileges to `user[:group]` (names or numeric ids).
    #[arg(short, long, env = "PRELAUNCH_USER")]
    pub user: Option<String>,

    /// Do not wait for linked TCP dependencies.
    #[arg(long, env = "PRELAUNCH_NO_WAIT")]
    pub no_wait: bool,

    /// Overall time each dependency has to become reachable.
    #[arg(
        long,
        env = "PRELAUNCH_WAIT_TIMEOUT",
        value_name = "SECS",
        default_value_t = DEFAULT_WAIT_TIMEOUT.as_secs()
    )]
    pub wait_timeout: u64,

    /// Time allowed for a single connection attempt.
    #[arg(
        long,
        env = "PRELAUNCH_ATTEMPT_TIMEOUT",
        value_name = "SECS",
        default_value_t = DEFAULT_ATTEMPT_TIMEOUT.as_secs()
    )]
    pub attempt_timeout: u64,

    /// Read users from this file instead of the system passwd database.
    #[arg(long, env = "PRELAUNCH_PASSWD_FILE")]
    pub passwd_file: Option<PathBuf>,

    /// Read groups from this file instead of the system group database.
    #[arg(long, env = "PRELAUNCH_GROUP_FILE")]
    pub group_file: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,

    /// Workload command to exec once preparation succeeds.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl Cli {
    /// Builds the run configuration from the parsed arguments.
    pub fn config(&self) -> PrelaunchConfig {
        PrelaunchConfig {
            user: self.user.clone().filter(|u| !u.is_empty()),
            wait: !self.no_wait,
            wait_timeout: Duration::from_secs(self.wait_timeout),
            attempt_timeout: Duration::from_secs(self.attempt_timeout),
            passwd_file: self.passwd_file.clone(),
            group_file: self.group_file.clone(),
        }
    }
}

/// Runs the preparation steps in order, then execs the workload.
///
/// # Errors
///
/// Returns an error if privilege dropping or dependency waiting fails, or
/// if the workload cannot be executed.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config();

    if let Some(user) = &config.user {
        let mut dropper = PrivilegeDropper::new();
        if let Some(path) = &config.passwd_file {
            dropper = dropper.passwd_file(path);
        }
        if let Some(path) = &config.group_file {
            dropper = dropper.group_file(path);
        }
        let _ = dropper
            .apply(user)
            .with_context(|| format!("failed to drop privileges to {user}"))?;
    }

    if config.wait {
        let budget = config
            .retry_budget()
            .context("invalid dependency wait timeouts")?;
        DependencyWaiter::new(budget)
            .wait_all()
            .context("dependencies did not become reachable")?;
    }

    match cli.command.split_first() {
        Some((program, args)) => exec_workload(program, args),
        None => {
            tracing::info!("preparation complete, no command to run");
            Ok(())
        }
    }
}

#[cfg(unix)]
fn exec_workload(program: &str, args: &[String]) -> anyhow::Result<()> {
    use std::os::unix::process::CommandExt;

    tracing::info!(program, args = ?args, "starting workload");
    let err = std::process::Command::new(program).args(args).exec();
    Err(anyhow::Error::new(err).context(format!("failed to exec {program}")))
}

#[cfg(not(unix))]
fn exec_workload(program: &str, _args: &[String]) -> anyhow::Result<()> {
    anyhow::bail!("cannot exec {program}: process replacement requires Unix")
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("prelaunch").chain(args.iter().copied()))
            .expect("should parse")
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_wait_with_thirty_second_budget() {
        let config = parse(&[]).config();
        assert!(config.user.is_none());
        assert!(config.wait);
        assert_eq!(config.wait_timeout, Duration::from_secs(30));
        assert_eq!(config.attempt_timeout, Duration::from_secs(2));
        assert_eq!(config.retry_budget().expect("valid").attempts(), 15);
    }

    #[test]
    fn parses_user_and_trailing_command() {
        let cli = parse(&["--user", "app:docker", "--no-wait", "--", "server", "--port", "80"]);
        assert_eq!(cli.command, vec!["server", "--port", "80"]);
        let config = cli.config();
        assert_eq!(config.user.as_deref(), Some("app:docker"));
        assert!(!config.wait);
    }

    #[test]
    fn empty_user_means_no_privilege_drop() {
        let config = parse(&["--user", ""]).config();
        assert!(config.user.is_none());
    }

    #[test]
    fn custom_timeouts_change_attempt_count() {
        let config = parse(&["--wait-timeout", "10", "--attempt-timeout", "3"]).config();
        assert_eq!(config.retry_budget().expect("valid").attempts(), 3);
    }

    #[test]
    fn zero_attempt_timeout_is_rejected_when_waiting() {
        let cli = parse(&["--attempt-timeout", "0"]);
        let err = execute(cli).expect_err("should fail");
        assert!(err.to_string().contains("invalid dependency wait timeouts"));
    }

    #[test]
    fn timeouts_are_ignored_without_waiting() {
        let cli = parse(&["--attempt-timeout", "0", "--no-wait"]);
        execute(cli).expect("nothing to wait for");
    }

    #[test]
    fn database_overrides_are_carried_into_config() {
        let config = parse(&["--passwd-file", "/tmp/p", "--group-file", "/tmp/g"]).config();
        assert_eq!(config.passwd_file, Some(PathBuf::from("/tmp/p")));
        assert_eq!(config.group_file, Some(PathBuf::from("/tmp/g")));
    }
}
