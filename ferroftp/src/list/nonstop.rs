//! # NonStop
//!
//! HP NonStop (Tandem) Guardian listings.
//!
//! ```text
//! File         Code             EOF  Last Modification    Owner  RWEP
//! FILE3        101            16354 14-Mar-14 15:09:12 244, 10 "extra3"
//! ```

use chrono::NaiveDateTime;

use super::{fields, DirectoryEntry, EntryKind, ParseContext, Permissions};

const MIN_FIELDS: usize = 7;
const DATE_FORMAT: &str = "%d-%b-%y %H:%M:%S";

pub(super) fn is_valid(lines: &[String]) -> bool {
    lines.first().is_some_and(|line| is_header(line))
}

fn is_header(line: &str) -> bool {
    line.contains("Code") && line.contains("EOF") && line.contains("RWEP")
}

pub(super) fn parse(record: &str, _ctx: &ParseContext) -> Option<DirectoryEntry> {
    if is_header(record) {
        return None;
    }
    let values = fields(record);
    if values.len() < MIN_FIELDS {
        return None;
    }
    let modified =
        NaiveDateTime::parse_from_str(&format!("{} {}", values[3], values[4]), DATE_FORMAT).ok()?;
    // owner is `group,user`, sometimes with a blank after the comma
    let (owner, rest) = if values[5].ends_with(',') {
        (format!("{}{}", values[5], values[6]), &values[7..])
    } else {
        (values[5].to_string(), &values[6..])
    };
    let mut entry = DirectoryEntry::new(values[0], EntryKind::File);
    entry.size = values[2].parse::<u64>().ok();
    entry.modified = Some(modified);
    entry.owner = Some(owner);
    entry.permissions = rest
        .first()
        .map(|p| p.trim_matches('"'))
        .filter(|p| !p.is_empty())
        .map(Permissions::raw);
    Some(entry)
}
