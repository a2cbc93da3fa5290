//! Resolution of a `user[:group]` spec against the passwd and group databases.
//!
//! A database file that does not exist is treated as unavailable and the
//! lookup falls back to the caller's defaults. Any other read failure is an
//! error.

pub mod database;
pub mod paths;

use std::io;
use std::path::{Path, PathBuf};

use prelaunch_common::constants::MAX_ID;
use prelaunch_common::error::{PrelaunchError, Result};
use prelaunch_common::types::ExecIdentity;

use self::database::{GroupEntry, PasswdEntry};
use self::paths::UserDbPaths;

/// Reads a database file, returning `None` when it does not exist.
fn load_database<T>(path: &Path, parse: fn(&str) -> Vec<T>) -> Result<Option<Vec<T>>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(parse(&contents))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "user database not present");
            Ok(None)
        }
        Err(e) => Err(PrelaunchError::UserDbRead {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Looks up `spec` in the databases at `paths`.
///
/// # Errors
///
/// Returns an error if a database cannot be read or the spec does not
/// resolve.
pub fn lookup_exec_identity(
    spec: &str,
    defaults: &ExecIdentity,
    paths: &UserDbPaths,
) -> Result<ExecIdentity> {
    let passwd = load_database(&paths.passwd, database::parse_passwd)?;
    let group = load_database(&paths.group, database::parse_group)?;
    resolve_exec_identity(spec, defaults, passwd.as_deref(), group.as_deref())
}

fn numeric(arg: &str) -> Option<u32> {
    arg.parse().ok()
}

fn checked_id(spec: &str, kind: &str, id: u32) -> Result<u32> {
    if id > MAX_ID {
        return Err(PrelaunchError::UserLookup {
            spec: spec.to_owned(),
            message: format!("{kind} {id} out of range (max {MAX_ID})"),
        });
    }
    Ok(id)
}

/// Resolves `spec` against already-parsed databases.
///
/// `None` for a database means it is unavailable. The user part selects uid,
/// primary gid and home. An explicit group part overrides the primary gid.
/// Otherwise every group listing the user as a member becomes a
/// supplementary gid.
///
/// # Errors
///
/// Returns [`PrelaunchError::UserLookup`] if a named user or group has no
/// entry, or a numeric id is out of range.
pub fn resolve_exec_identity(
    spec: &str,
    defaults: &ExecIdentity,
    passwd: Option<&[PasswdEntry]>,
    group: Option<&[GroupEntry]>,
) -> Result<ExecIdentity> {
    let mut identity = defaults.clone();
    let (user_arg, group_arg) = match spec.split_once(':') {
        Some((user, group)) => (user, Some(group).filter(|g| !g.is_empty())),
        None => (spec, None),
    };

    let numeric_user = numeric(user_arg);
    let matched = passwd.and_then(|entries| {
        entries.iter().find(|e| {
            if user_arg.is_empty() {
                e.uid == identity.uid
            } else {
                e.name == user_arg || Some(e.uid) == numeric_user
            }
        })
    });

    let mut name = None;
    if let Some(entry) = matched {
        identity.uid = entry.uid;
        identity.gid = entry.gid;
        if !entry.home.is_empty() {
            identity.home = PathBuf::from(&entry.home);
        }
        name = Some(entry.name.as_str());
    } else if !user_arg.is_empty() {
        let Some(uid) = numeric_user else {
            let message = if passwd.is_some() {
                "no matching entries in passwd file"
            } else {
                "no passwd database available"
            };
            return Err(PrelaunchError::UserLookup {
                spec: spec.to_owned(),
                message: message.into(),
            });
        };
        identity.uid = checked_id(spec, "uid", uid)?;
    }

    if let Some(group_arg) = group_arg {
        let numeric_group = numeric(group_arg);
        let matched = group.and_then(|entries| {
            entries
                .iter()
                .find(|g| g.name == group_arg || Some(g.gid) == numeric_group)
        });
        identity.gid = match (matched, numeric_group) {
            (Some(entry), _) => entry.gid,
            (None, Some(gid)) => checked_id(spec, "gid", gid)?,
            (None, None) => {
                return Err(PrelaunchError::UserLookup {
                    spec: spec.to_owned(),
                    message: format!("unable to find group {group_arg}"),
                });
            }
        };
    } else if let (Some(name), Some(entries)) = (name, group) {
        let sgids: Vec<u32> = entries
            .iter()
            .filter(|g| g.members.iter().any(|m| m == name))
            .map(|g| g.gid)
            .collect();
        if !sgids.is_empty() {
            identity.sgids = sgids;
        }
    }

    tracing::debug!(
        spec,
        uid = identity.uid,
        gid = identity.gid,
        sgids = ?identity.sgids,
        home = %identity.home.display(),
        "resolved exec identity"
    );
    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::database::{parse_group, parse_passwd};

    const PASSWD: &str = "\
root:x:0:0:root:/root:/bin/sh
app:x:1000:1000:App:/home/app:/bin/sh
worker:x:1001:100::/srv/worker:/bin/false
nohome:x:1002:1002:::/bin/false
";

    const GROUP: &str = "\
root:x:0:
app:x:1000:
users:x:100:
docker:x:998:app,worker
audio:x:29:app
";

    fn defaults() -> ExecIdentity {
        ExecIdentity {
            uid: 0,
            gid: 0,
            sgids: Vec::new(),
            home: PathBuf::from("/"),
        }
    }

    fn resolve(spec: &str) -> Result<ExecIdentity> {
        let passwd = parse_passwd(PASSWD);
        let group = parse_group(GROUP);
        resolve_exec_identity(spec, &defaults(), Some(&passwd), Some(&group))
    }

    #[test]
    fn resolves_named_user_with_supplementary_groups() {
        let identity = resolve("app").expect("should resolve");
        assert_eq!(identity.uid, 1000);
        assert_eq!(identity.gid, 1000);
        assert_eq!(identity.sgids, vec![998, 29]);
        assert_eq!(identity.home, PathBuf::from("/home/app"));
    }

    #[test]
    fn resolves_numeric_user_present_in_database() {
        let identity = resolve("1001").expect("should resolve");
        assert_eq!(identity.uid, 1001);
        assert_eq!(identity.gid, 100);
        assert_eq!(identity.sgids, vec![998]);
        assert_eq!(identity.home, PathBuf::from("/srv/worker"));
    }

    #[test]
    fn numeric_user_absent_from_database_is_used_directly() {
        let identity = resolve("4242").expect("should resolve");
        assert_eq!(identity.uid, 4242);
        assert_eq!(identity.gid, 0);
        assert!(identity.sgids.is_empty());
        assert_eq!(identity.home, PathBuf::from("/"));
    }

    #[test]
    fn unknown_named_user_is_a_lookup_error() {
        let err = resolve("ghost").expect_err("should fail");
        assert!(matches!(err, PrelaunchError::UserLookup { ref spec, .. } if spec == "ghost"));
    }

    #[test]
    fn out_of_range_uid_is_rejected() {
        let err = resolve("4294967295").expect_err("should fail");
        assert!(matches!(err, PrelaunchError::UserLookup { .. }));
    }

    #[test]
    fn explicit_group_overrides_primary_gid_and_clears_sgids() {
        let identity = resolve("app:docker").expect("should resolve");
        assert_eq!(identity.uid, 1000);
        assert_eq!(identity.gid, 998);
        assert!(identity.sgids.is_empty());
    }

    #[test]
    fn numeric_group_absent_from_database_is_used_directly() {
        let identity = resolve("app:5555").expect("should resolve");
        assert_eq!(identity.gid, 5555);
    }

    #[test]
    fn unknown_named_group_is_a_lookup_error() {
        let err = resolve("app:ghosts").expect_err("should fail");
        assert!(matches!(err, PrelaunchError::UserLookup { .. }));
    }

    #[test]
    fn empty_home_keeps_default() {
        let identity = resolve("nohome").expect("should resolve");
        assert_eq!(identity.home, PathBuf::from("/"));
    }

    #[test]
    fn empty_user_part_matches_default_uid() {
        let identity = resolve(":users").expect("should resolve");
        assert_eq!(identity.uid, 0);
        assert_eq!(identity.gid, 100);
        assert_eq!(identity.home, PathBuf::from("/root"));
    }

    #[test]
    fn missing_databases_fall_back_to_defaults_for_numeric_ids() {
        let identity =
            resolve_exec_identity("1000:1000", &defaults(), None, None).expect("should resolve");
        assert_eq!(identity.uid, 1000);
        assert_eq!(identity.gid, 1000);
        assert_eq!(identity.home, PathBuf::from("/"));
    }

    #[test]
    fn missing_passwd_database_fails_named_lookup() {
        let err = resolve_exec_identity("app", &defaults(), None, None).expect_err("should fail");
        assert!(err.to_string().contains("no passwd database"));
    }

    #[test]
    fn lookup_treats_absent_files_as_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = UserDbPaths {
            passwd: dir.path().join("passwd"),
            group: dir.path().join("group"),
        };
        let identity = lookup_exec_identity("77", &defaults(), &paths).expect("should resolve");
        assert_eq!(identity.uid, 77);
    }

    #[test]
    fn lookup_reports_unreadable_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = UserDbPaths {
            passwd: dir.path().to_path_buf(),
            group: dir.path().join("group"),
        };
        let err = lookup_exec_identity("77", &defaults(), &paths).expect_err("should fail");
        assert!(matches!(err, PrelaunchError::UserDbRead { .. }));
    }
}
