//! # Facts
//!
//! Machine listing (`MLSD`/`MLST`) grammar, as described by
//! [RFC 3659](https://datatracker.ietf.org/doc/html/rfc3659#section-7)

use chrono::{NaiveDate, NaiveDateTime};

use super::{DirectoryEntry, EntryKind, ParseContext, Permissions};
use crate::regex::MDTM_RE;

pub(super) fn is_valid(lines: &[String]) -> bool {
    lines
        .first()
        .is_some_and(|line| line.to_lowercase().contains("type="))
}

/// Parse a facts line: `fact=value;fact=value; name`.
///
/// The name is everything after the first `"; "`, whitespace included.
pub(super) fn parse(line: &str, _ctx: &ParseContext) -> Option<DirectoryEntry> {
    let (facts, name) = line.split_once("; ")?;
    if name.is_empty() {
        return None;
    }
    let mut kind = None;
    let mut size = None;
    let mut modified = None;
    let mut created = None;
    let mut mode = None;
    let mut perm = None;
    let mut owner = None;
    let mut group = None;
    let mut unique = None;
    for fact in facts.split(';') {
        let Some((key, value)) = fact.split_once('=') else {
            continue;
        };
        // first occurrence of a fact wins
        match key.trim().to_lowercase().as_str() {
            "type" if kind.is_none() => kind = Some(entry_kind(value)?),
            "size" if size.is_none() => size = value.parse::<u64>().ok(),
            "modify" if modified.is_none() => modified = parse_timestamp(value),
            "create" | "created" if created.is_none() => created = parse_timestamp(value),
            "unix.mode" if mode.is_none() => mode = Some(value),
            "perm" if perm.is_none() => perm = Some(value),
            "unix.owner" | "unix.uid" if owner.is_none() => owner = Some(value.to_string()),
            "unix.group" | "unix.gid" if group.is_none() => group = Some(value.to_string()),
            "unique" if unique.is_none() => unique = Some(value.to_string()),
            _ => {}
        }
    }
    let mut entry = DirectoryEntry::new(name, kind?);
    entry.size = size;
    entry.modified = modified;
    entry.created = created;
    entry.permissions = mode
        .and_then(Permissions::from_octal)
        .or_else(|| perm.filter(|p| !p.is_empty()).map(Permissions::raw));
    entry.owner = owner;
    entry.group = group;
    entry.unique = unique;
    Some(entry)
}

fn entry_kind(value: &str) -> Option<EntryKind> {
    match value.to_lowercase().as_str() {
        "dir" | "cdir" | "pdir" => Some(EntryKind::Directory),
        "file" => Some(EntryKind::File),
        "link" | "slink" | "symlink" | "os.unix=link" | "os.unix=slink" | "os.unix=symlink" => {
            Some(EntryKind::Link)
        }
        _ => None,
    }
}

/// Whether the line describes the listed directory or its parent
pub(super) fn is_self_or_parent(line: &str) -> bool {
    let facts = line.split_once("; ").map(|(f, _)| f).unwrap_or(line);
    facts.split(';').any(|fact| {
        fact.split_once('=').is_some_and(|(key, value)| {
            key.trim().eq_ignore_ascii_case("type")
                && (value.eq_ignore_ascii_case("cdir") || value.eq_ignore_ascii_case("pdir"))
        })
    })
}

/// Parse a `YYYYMMDDHHMMSS[.sss]` timestamp, as found in `MDTM` replies and `modify` facts
pub(crate) fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let caps = MDTM_RE.captures(text)?;
    let number = |i: usize| caps[i].parse::<u32>().ok();
    let millis = match caps.get(7) {
        // ".5" means 500 milliseconds
        Some(fraction) => format!("{:0<3}", fraction.as_str()).parse::<u32>().ok()?,
        None => 0,
    };
    NaiveDate::from_ymd_opt(caps[1].parse::<i32>().ok()?, number(2)?, number(3)?)?.and_hms_milli_opt(
        number(4)?,
        number(5)?,
        number(6)?,
        millis,
    )
}
