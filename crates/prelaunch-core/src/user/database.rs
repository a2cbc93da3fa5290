//! Parsing of colon-separated passwd and group databases using `nom`.
//!
//! Lines that cannot be parsed are skipped rather than failing the whole
//! database, matching how libc treats corrupt entries.

use nom::{
    IResult, Parser,
    bytes::complete::take_while,
    character::complete::{char, u32 as decimal_u32},
    combinator::all_consuming,
    multi::separated_list0,
};

/// A single `/etc/passwd` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswdEntry {
    /// Login name.
    pub name: String,
    /// User id.
    pub uid: u32,
    /// Primary group id.
    pub gid: u32,
    /// Comment / full-name field.
    pub gecos: String,
    /// Home directory.
    pub home: String,
    /// Login shell.
    pub shell: String,
}

/// A single `/etc/group` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    /// Group name.
    pub name: String,
    /// Group id.
    pub gid: u32,
    /// Names of the group's members.
    pub members: Vec<String>,
}

const fn is_field_char(c: char) -> bool {
    c != ':'
}

/// Splits a line into its colon-separated fields, keeping empty ones.
fn fields(input: &str) -> IResult<&str, Vec<&str>> {
    all_consuming(separated_list0(char(':'), take_while(is_field_char))).parse(input)
}

fn numeric_id(field: &str) -> Option<u32> {
    all_consuming(decimal_u32::<&str, nom::error::Error<&str>>)
        .parse(field)
        .ok()
        .map(|(_, id)| id)
}

/// Returns the trimmed line, or `None` for blank lines and comments.
fn significant(line: &str) -> Option<&str> {
    let line = line.trim();
    (!line.is_empty() && !line.starts_with('#')).then_some(line)
}

fn field<'a>(parts: &[&'a str], index: usize) -> &'a str {
    parts.get(index).copied().unwrap_or_default()
}

/// Parses one `name:password:uid:gid:gecos:home:shell` line.
///
/// Missing trailing fields default to empty strings. Returns `None` when the
/// uid or gid is not a decimal number.
#[must_use]
pub fn parse_passwd_line(line: &str) -> Option<PasswdEntry> {
    let (_, parts) = fields(line).ok()?;
    Some(PasswdEntry {
        name: field(&parts, 0).to_owned(),
        uid: numeric_id(field(&parts, 2))?,
        gid: numeric_id(field(&parts, 3))?,
        gecos: field(&parts, 4).to_owned(),
        home: field(&parts, 5).to_owned(),
        shell: field(&parts, 6).to_owned(),
    })
}

/// Parses one `name:password:gid:member,member` line.
#[must_use]
pub fn parse_group_line(line: &str) -> Option<GroupEntry> {
    let (_, parts) = fields(line).ok()?;
    Some(GroupEntry {
        name: field(&parts, 0).to_owned(),
        gid: numeric_id(field(&parts, 2))?,
        members: field(&parts, 3)
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_owned)
            .collect(),
    })
}

/// Parses every valid entry of a passwd database.
#[must_use]
pub fn parse_passwd(contents: &str) -> Vec<PasswdEntry> {
    contents
        .lines()
        .filter_map(significant)
        .filter_map(|line| {
            let entry = parse_passwd_line(line);
            if entry.is_none() {
                tracing::debug!(line, "skipping invalid passwd entry");
            }
            entry
        })
        .collect()
}

/// Parses every valid entry of a group database.
#[must_use]
pub fn parse_group(contents: &str) -> Vec<GroupEntry> {
    contents
        .lines()
        .filter_map(significant)
        .filter_map(|line| {
            let entry = parse_group_line(line);
            if entry.is_none() {
                tracing::debug!(line, "skipping invalid group entry");
            }
            entry
        })
        .collect()
}
