//! Discovery of dependency endpoints from link environment variables.
//!
//! Container links publish each dependency several times:
//! `DB_PORT=tcp://10.0.0.2:5432` plus decomposed forms such as
//! `DB_PORT_5432_TCP=tcp://10.0.0.2:5432` and `DB_PORT_5432_TCP_ADDR=10.0.0.2`.
//! Only the composite `*_PORT` form is consumed.

use std::collections::BTreeSet;

use prelaunch_common::constants::{DECOMPOSED_ENV_MARKERS, PORT_ENV_SUFFIX, TCP_SCHEME};
use prelaunch_common::types::Endpoint;

use crate::env::EnvProvider;

/// Returns the endpoint named by a single variable, if it is a composite
/// `tcp://host:port` link variable.
#[must_use]
pub fn endpoint_from_var(name: &str, value: &str) -> Option<Endpoint> {
    if !name.ends_with(PORT_ENV_SUFFIX)
        || DECOMPOSED_ENV_MARKERS.iter().any(|m| name.contains(m))
    {
        return None;
    }
    let address = value.strip_prefix(TCP_SCHEME)?;
    if address.is_empty() {
        tracing::warn!(name, "skipping link variable with empty address");
        return None;
    }
    Some(Endpoint::new(address))
}

/// Scans every environment entry and collects the distinct endpoints.
///
/// Entries are visited in sorted order so warnings about malformed entries
/// are reproducible. Entries without `=` are skipped.
pub fn discover_endpoints<E: EnvProvider + ?Sized>(env: &E) -> BTreeSet<Endpoint> {
    let mut entries = env.entries();
    entries.sort();

    let mut endpoints = BTreeSet::new();
    for entry in &entries {
        let Some((name, value)) = entry.split_once('=') else {
            tracing::warn!(entry = %entry, "skipping malformed environment entry");
            continue;
        };
        if let Some(endpoint) = endpoint_from_var(name, value) {
            tracing::debug!(name, endpoint = %endpoint, "found dependency endpoint");
            let _ = endpoints.insert(endpoint);
        }
    }
    endpoints
}
