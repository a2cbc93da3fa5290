//! Blocking until linked TCP dependencies accept connections.
//!
//! Endpoints are checked one at a time. The first endpoint that exhausts its
//! retry budget aborts the wait; the remaining endpoints are not checked.
//!
//! Every failed attempt occupies at least one full attempt slice. When a
//! connect fails faster than the per-attempt timeout (typically an immediate
//! "connection refused"), the waiter sleeps out the rest of the slice before
//! retrying, so a dependency that is still starting gets the whole deadline
//! to come up instead of a burst of attempts in a few milliseconds.

pub mod connector;
pub mod discovery;

use std::collections::BTreeSet;

use prelaunch_common::error::{PrelaunchError, Result};
use prelaunch_common::types::{Endpoint, RetryBudget};

use crate::env::{EnvProvider, ProcessEnv};

use self::connector::{Clock, Connector, SystemClock, TcpConnector};

/// Waits for every dependency endpoint published in the environment.
#[derive(Debug)]
pub struct DependencyWaiter<E = ProcessEnv, C = TcpConnector, K = SystemClock> {
    env: E,
    connector: C,
    clock: K,
    budget: RetryBudget,
}

impl DependencyWaiter {
    /// Creates a waiter over the process environment and real TCP sockets.
    #[must_use]
    pub const fn new(budget: RetryBudget) -> Self {
        Self::with_parts(ProcessEnv, TcpConnector, SystemClock, budget)
    }
}

impl<E: EnvProvider, C: Connector, K: Clock> DependencyWaiter<E, C, K> {
    /// Creates a waiter over explicit environment, connector and clock.
    pub const fn with_parts(env: E, connector: C, clock: K, budget: RetryBudget) -> Self {
        Self {
            env,
            connector,
            clock,
            budget,
        }
    }

    /// Returns the retry budget applied to each endpoint.
    pub const fn budget(&self) -> RetryBudget {
        self.budget
    }

    /// Returns the connector.
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    /// Returns the distinct endpoints currently published in the environment.
    pub fn endpoints(&self) -> BTreeSet<Endpoint> {
        discovery::discover_endpoints(&self.env)
    }

    /// Discovers the endpoints and waits for each of them in turn.
    ///
    /// # Errors
    ///
    /// Returns [`PrelaunchError::Unreachable`] for the first endpoint that
    /// never accepts a connection within the budget.
    pub fn wait_all(&mut self) -> Result<()> {
        let endpoints = self.endpoints();
        if endpoints.is_empty() {
            tracing::debug!("no dependency endpoints to wait for");
            return Ok(());
        }
        tracing::info!(
            count = endpoints.len(),
            attempts = self.budget.attempts(),
            attempt_timeout = ?self.budget.per_attempt(),
            "waiting for dependencies"
        );
        for endpoint in &endpoints {
            let _ = self.wait_for(endpoint)?;
        }
        Ok(())
    }

    /// Retries `endpoint` until it accepts a connection or the attempt
    /// budget is spent, returning the number of attempts made.
    ///
    /// # Errors
    ///
    /// Returns [`PrelaunchError::Unreachable`] once every attempt has failed.
    pub fn wait_for(&mut self, endpoint: &Endpoint) -> Result<u32> {
        let per_attempt = self.budget.per_attempt();
        let attempts = self.budget.attempts();
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let started = self.clock.now();
            match self.connector.connect(endpoint, per_attempt) {
                Ok(()) => {
                    tracing::info!(endpoint = %endpoint, attempt, "dependency reachable");
                    return Ok(attempt);
                }
                Err(e) => {
                    tracing::debug!(endpoint = %endpoint, attempt, error = %e, "connection attempt failed");
                    last_error = e.to_string();
                }
            }
            if attempt < attempts {
                let spent = self.clock.now().saturating_duration_since(started);
                if let Some(rest) = per_attempt.checked_sub(spent).filter(|d| !d.is_zero()) {
                    self.clock.sleep(rest);
                }
            }
        }

        Err(PrelaunchError::Unreachable {
            address: endpoint.to_string(),
            attempts,
            last_error,
        })
    }
}
