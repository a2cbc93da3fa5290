//! Access to the process environment behind an injectable provider.
//!
//! The startup steps read every variable (dependency discovery) and may
//! assign `HOME`. Tests supply a [`MapEnv`] instead of mutating the real
//! process state.

use std::io;

/// Source of environment variables.
pub trait EnvProvider {
    /// Returns every entry in raw `name=value` form.
    ///
    /// Entries without a `=` separator are possible and must be tolerated by
    /// callers.
    fn entries(&self) -> Vec<String>;

    /// Returns the value of `key`, if set.
    fn get(&self, key: &str) -> Option<String>;

    /// Assigns `key=value`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the key is empty or contains `=` or NUL, or
    /// if the value contains NUL.
    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;
}

fn validate_assignment(key: &str, value: &str) -> io::Result<()> {
    if key.is_empty() || key.contains(['=', '\0']) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid environment variable name {key:?}"),
        ));
    }
    if value.contains('\0') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "environment value contains a NUL byte",
        ));
    }
    Ok(())
}

/// The real environment of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvProvider for ProcessEnv {
    fn entries(&self) -> Vec<String> {
        std::env::vars_os()
            .map(|(k, v)| format!("{}={}", k.to_string_lossy(), v.to_string_lossy()))
            .collect()
    }

    fn get(&self, key: &str) -> Option<String> {
        std::env::var_os(key).map(|v| v.to_string_lossy().into_owned())
    }

    #[allow(unsafe_code)]
    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        validate_assignment(key, value)?;
        // SAFETY: called on the single-threaded bootstrap path before the
        // workload starts, so no other thread reads the environment.
        unsafe { std::env::set_var(key, value) };
        Ok(())
    }
}

/// A synthetic environment held in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MapEnv {
    entries: Vec<String>,
}

impl MapEnv {
    /// Creates an empty environment.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates an environment from `(name, value)` pairs.
    #[must_use]
    pub fn from_pairs<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> Self {
        Self {
            entries: pairs
                .iter()
                .map(|(k, v)| format!("{}={}", k.as_ref(), v.as_ref()))
                .collect(),
        }
    }

    /// Appends a raw entry verbatim, which may lack a `=` separator.
    pub fn push_raw(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.split_once('=').is_some_and(|(k, _)| k == key))
    }
}

impl EnvProvider for MapEnv {
    fn entries(&self) -> Vec<String> {
        self.entries.clone()
    }

    fn get(&self, key: &str) -> Option<String> {
        self.position(key)
            .and_then(|i| self.entries[i].split_once('='))
            .map(|(_, v)| v.to_owned())
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        validate_assignment(key, value)?;
        let entry = format!("{key}={value}");
        match self.position(key) {
            Some(i) => self.entries[i] = entry,
            None => self.entries.push(entry),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_env_get_and_set() {
        let mut env = MapEnv::from_pairs(&[("PATH", "/bin")]);
        assert_eq!(env.get("PATH").as_deref(), Some("/bin"));
        assert!(env.get("HOME").is_none());

        env.set("HOME", "/root").expect("should set");
        env.set("PATH", "/usr/bin").expect("should overwrite");
        assert_eq!(env.get("HOME").as_deref(), Some("/root"));
        assert_eq!(env.get("PATH").as_deref(), Some("/usr/bin"));
        assert_eq!(env.entries().len(), 2);
    }

    #[test]
    fn map_env_keeps_malformed_entries() {
        let mut env = MapEnv::new();
        env.push_raw("NOSEPARATOR");
        assert_eq!(env.entries(), vec!["NOSEPARATOR".to_owned()]);
        assert!(env.get("NOSEPARATOR").is_none());
    }

    #[test]
    fn value_may_contain_equals() {
        let env = MapEnv::from_pairs(&[("OPTS", "a=b")]);
        assert_eq!(env.get("OPTS").as_deref(), Some("a=b"));
    }

    #[test]
    fn invalid_assignments_are_rejected() {
        let mut env = MapEnv::new();
        assert!(env.set("", "x").is_err());
        assert!(env.set("A=B", "x").is_err());
        assert!(env.set("HOME", "/ho\0me").is_err());
        assert!(env.entries().is_empty());
    }
}
