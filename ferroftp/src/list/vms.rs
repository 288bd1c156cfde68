//! # VMS
//!
//! OpenVMS and Multinet listings.
//!
//! ```text
//! {NAME;VERSION} {USED[/ALLOCATED]} {DATE} {TIME} [\[GROUP,OWNER\]] [(PERMISSIONS)]
//! 411_4114.TXT;1             11  21-MAR-2012 15:17 [TBMS,TBMS_BOSS] (RWED,RWED,,RE)
//! ```
//!
//! Long names push the other fields on a continuation line.

use chrono::NaiveDateTime;

use super::{fields, DirectoryEntry, EntryKind, ParseContext, Permissions};

const MIN_FIELDS: usize = 4;
const DIR_SUFFIX: &str = ".DIR";
/// Bytes per block when the size is given as `used/allocated` blocks
const BLOCK_SIZE: u64 = 512 * 1024;

pub(super) fn is_valid(lines: &[String]) -> bool {
    let mut versioned_name = false;
    let mut bracket_open = false;
    let mut bracket_close = false;
    for line in lines.iter().take(10) {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(pos) = line.find(';').filter(|pos| *pos > 0) {
            if line[pos + 1..].starts_with(|c: char| c.is_ascii_digit()) {
                versioned_name = true;
            }
        }
        bracket_open |= line.contains('[');
        bracket_close |= line.contains(']');
    }
    versioned_name && bracket_open && bracket_close
}

pub(super) fn parse(record: &str, _ctx: &ParseContext) -> Option<DirectoryEntry> {
    let values = fields(record);
    // "Directory DISK:[PATH]" header and "Total of N files" trailer
    if values.first().is_some_and(|v| *v == "Directory" || *v == "Total") {
        return None;
    }
    if values.len() < MIN_FIELDS {
        return None;
    }
    let versioned = values[0];
    let semicolon = versioned.rfind(';').filter(|pos| *pos > 0)?;
    let name = &versioned[..semicolon];
    let (name, kind) = match name.strip_suffix(DIR_SUFFIX) {
        Some(dir) => (dir, EntryKind::Directory),
        None => (name, EntryKind::File),
    };
    let size = parse_size(values[1])?;
    let modified = parse_datetime(values[2], values[3]);

    let mut entry = DirectoryEntry::new(name, kind);
    entry.size = Some(size);
    entry.modified = modified;
    if let Some(owner) = values
        .get(4)
        .and_then(|v| v.strip_prefix('['))
        .and_then(|v| v.strip_suffix(']'))
    {
        match owner.split_once(',') {
            Some((group, owner)) => {
                entry.group = Some(group.to_string());
                entry.owner = Some(owner.to_string());
            }
            None => entry.owner = Some(owner.to_string()),
        }
    }
    entry.permissions = values
        .get(5)
        .and_then(|v| v.strip_prefix('('))
        .and_then(|v| v.strip_suffix(')'))
        .map(Permissions::raw);
    Some(entry)
}

/// Size is either `used/allocated` blocks or plain bytes
fn parse_size(size: &str) -> Option<u64> {
    match size.split_once('/') {
        Some((used, _)) => used.parse::<u64>().ok()?.checked_mul(BLOCK_SIZE),
        None => size.parse::<u64>().ok(),
    }
}

/// `d-MON-yyyy` followed by `HH:MM[:SS[.cc]]`
fn parse_datetime(date: &str, time: &str) -> Option<NaiveDateTime> {
    let stamp = format!("{date} {time}");
    ["%d-%b-%Y %H:%M:%S%.f", "%d-%b-%Y %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&stamp, fmt).ok())
}
