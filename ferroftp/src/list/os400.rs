//! # OS/400
//!
//! IBM i (AS/400) listings.
//!
//! ```text
//! {OWNER} {SIZE} {DATE} {TIME} {OBJECT TYPE} {NAME}
//! CFT             45056 04/12/14 14:19:31 *FILE ANTHONY1.FILE
//! CFT                                     *MEM ANTHONY1.FILE/ANTHONY1.MBR
//! ```

use chrono::NaiveDateTime;

use super::{fields, is_future, text_after, DirectoryEntry, EntryKind, ParseContext};

const MIN_FIELDS: usize = 5;
const DIR_MARKER: &str = "*DIR";
const DDIR_MARKER: &str = "*DDIR";
const MEM_MARKER: &str = "*MEM";
const FILE_MARKER: &str = "*FILE";

const OBJECT_TYPES: [&str; 6] = ["*DIR", "*FILE", "*FLR", "*DDIR", "*STMF", "*LIB"];

/// Day first, year first and month first layouts
const DATE_FORMATS: [[&str; 3]; 3] = [
    ["%d/%m/%y %H:%M:%S", "%d/%m/%Y %H:%M:%S", "%d.%m.%y %H:%M:%S"],
    ["%y/%m/%d %H:%M:%S", "%Y/%m/%d %H:%M:%S", "%y.%m.%d %H:%M:%S"],
    ["%m/%d/%y %H:%M:%S", "%m/%d/%Y %H:%M:%S", "%m.%d.%y %H:%M:%S"],
];

pub(super) fn is_valid(lines: &[String]) -> bool {
    lines
        .iter()
        .take(10)
        .any(|line| OBJECT_TYPES.iter().any(|t| line.contains(t)))
}

pub(super) fn parse(record: &str, ctx: &ParseContext) -> Option<DirectoryEntry> {
    let values = fields(record);
    // members have no size nor date
    if values.get(1) == Some(&MEM_MARKER) {
        let mut entry = DirectoryEntry::new(*values.get(2)?, EntryKind::File);
        entry.size = Some(0);
        entry.owner = Some(values[0].to_string());
        return Some(entry);
    }
    if values.len() < MIN_FIELDS {
        return None;
    }
    let size = values[1].parse::<u64>().ok()?;
    let modified = parse_datetime(&format!("{} {}", values[2], values[3]), ctx.now);
    let mut is_dir = values[4] == DIR_MARKER
        || values[4] == DDIR_MARKER
        || (values.len() == MIN_FIELDS && values[4] == FILE_MARKER);
    // no name when listing the content of a file
    let mut name = match values.get(5) {
        Some(_) => text_after(record, &values[..MIN_FIELDS])?.trim(),
        None => ".",
    };
    if let Some(dir) = name.strip_suffix('/') {
        is_dir = true;
        name = dir;
    }
    let kind = if is_dir {
        EntryKind::Directory
    } else {
        EntryKind::File
    };
    let mut entry = DirectoryEntry::new(name, kind);
    entry.size = Some(size);
    entry.modified = modified;
    entry.owner = Some(values[0].to_string());
    Some(entry)
}

/// The first layout giving a date which is not in the future wins
fn parse_datetime(stamp: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    DATE_FORMATS.iter().find_map(|group| {
        group
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(stamp, fmt).ok())
            .filter(|date| !is_future(*date, now))
    })
}
