//! # zOS
//!
//! IBM z/OS listings. A listing is made of realms, each starting with its own header:
//!
//! ```text
//! total 17904
//! Volume Unit    Referred Ext Used Recfm Lrecl BlkSz Dsorg Dsname
//!  Name     VV.MM   Created       Changed      Size  Init   Mod   Id
//!  Name      Size     TTR   Alias-of AC --------- Attributes --------- Amode Rmode
//! ```
//!
//! The Unix realm uses the Unix grammar; the others are fixed column layouts.

use chrono::NaiveDateTime;

use super::{Dialect, DirectoryEntry, EntryKind, ParseContext};

/// Bytes per track of a 3390 device
const TRACK_SIZE: u64 = 56664;
/// Tracks of a large format sequential dataset, assumed when the used tracks overflow the column
const MAX_TRACKS: u64 = 16777216;
const DATE_FORMAT: &str = "%Y/%m/%d %H:%M";
const NO_DATE: &str = "**NONE**";

pub(super) fn is_valid(lines: &[String]) -> bool {
    lines
        .first()
        .is_some_and(|line| realm_from_header(line).is_some())
}

/// Get the realm introduced by a header line, if `line` is one
pub(super) fn realm_from_header(line: &str) -> Option<Dialect> {
    if line.trim_start().starts_with("total") {
        Some(Dialect::ZosUnix)
    } else if line.contains("Volume Unit") {
        Some(Dialect::ZosDataset)
    } else if line.contains("Name     VV.MM") {
        Some(Dialect::ZosMember)
    } else if line.contains("Name      Size     TTR") {
        Some(Dialect::ZosMemberLoadlib)
    } else {
        None
    }
}

/// Columns `[start, end)` of the record, clipped to its length
fn column(record: &str, start: usize, end: usize) -> &str {
    let end = end.min(record.len());
    record.get(start.min(end)..end).unwrap_or_default().trim()
}

/// Parse a sequential (`PS`) or partitioned (`PO`) dataset line.
/// VSAM, unmounted and unreadable datasets are skipped.
pub(super) fn parse_dataset(record: &str, _ctx: &ParseContext) -> Option<DirectoryEntry> {
    let kind = match column(record, 51, 55) {
        "PO" => EntryKind::Directory,
        "PS" => EntryKind::File,
        _ => return None,
    };
    let name = column(record, 56, record.len()).split(' ').next()?;
    if name.is_empty() {
        return None;
    }
    let referred = column(record, 14, 24);
    let modified = if referred == NO_DATE {
        None
    } else {
        NaiveDateTime::parse_from_str(&format!("{referred} 00:00"), DATE_FORMAT).ok()
    };
    let used = column(record, 27, 32);
    let tracks = if used == "+++++" {
        Some(MAX_TRACKS)
    } else {
        used.parse::<u64>().ok()
    };
    let mut entry = DirectoryEntry::new(name, kind);
    entry.size = tracks.map(|t| t * TRACK_SIZE);
    entry.modified = modified;
    Some(entry)
}

/// Parse a member of a partitioned dataset; its size is the number of records times the record length
pub(super) fn parse_member(record: &str, ctx: &ParseContext) -> Option<DirectoryEntry> {
    let name = column(record, 0, 8);
    if name.is_empty() {
        return None;
    }
    // stats may be missing
    let (changed, records) = if record.trim_end().len() > 8 {
        (column(record, 27, 43), column(record, 44, 49))
    } else {
        ("", "0")
    };
    let mut entry = DirectoryEntry::new(name, EntryKind::File);
    entry.modified = NaiveDateTime::parse_from_str(changed, DATE_FORMAT).ok();
    entry.size = records.parse::<u64>().ok().map(|r| r * ctx.zos_lrecl);
    Some(entry)
}

/// Parse a load module member, whose size is in hex
pub(super) fn parse_loadlib(record: &str, _ctx: &ParseContext) -> Option<DirectoryEntry> {
    let name = column(record, 0, 8);
    if name.is_empty() {
        return None;
    }
    let size = u64::from_str_radix(column(record, 10, 16), 16).ok()?;
    let mut entry = DirectoryEntry::new(name, EntryKind::File);
    entry.size = Some(size);
    Some(entry)
}
