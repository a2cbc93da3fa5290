//! # prelaunch — container startup preparation
//!
//! Drops privileges to a named user, waits for linked TCP dependencies,
//! then replaces itself with the workload command.

mod cli;

use clap::Parser;

use crate::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    cli::execute(cli)
}
