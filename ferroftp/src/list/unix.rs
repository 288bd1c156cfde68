//! # Unix
//!
//! `ls -l` style listings.
//!
//! ```text
//! {PERMISSIONS} [LINKS] [OWNER] [GROUP] {SIZE} {MONTH} {DAY} {YEAR | TIME} {NAME} [-> TARGET]
//! -rw-r--r--   1 omar  users      8192 Nov  5  2018 omar.txt
//! lrwxrwxrwx   1 omar  users         9 Sep 27 10:30 data.0000 -> data.6460
//! ```

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use super::{
    fields, is_numeric, last_year_if_future, text_after, DirectoryEntry, EntryKind, ParseContext,
    Permissions,
};

const MIN_FIELDS: usize = 7;
const MIN_FIELDS_ALT: usize = 8;

pub(super) fn is_valid(lines: &[String]) -> bool {
    let mut type_char = false;
    let mut mode_chars = false;
    for line in lines.iter().take(10) {
        let values = fields(line);
        if values.len() < MIN_FIELDS {
            continue;
        }
        let mode: Vec<char> = values[0].to_lowercase().chars().collect();
        if matches!(mode[0], '-' | 'l' | 'd') {
            type_char = true;
        }
        if mode.len() > 1 && matches!(mode[1], 'r' | '-') {
            mode_chars = true;
        }
        // Connect:Enterprise has -ART------TCP
        if !mode_chars && mode.len() > 2 && mode[2..].contains(&'-') {
            mode_chars = true;
        }
    }
    type_char && mode_chars
}

/// Parse a line of a Unix listing.
/// "total N" lines and anything not starting with `-`, `d` or `l` are rejected.
pub(super) fn parse(record: &str, ctx: &ParseContext) -> Option<DirectoryEntry> {
    let kind = kind_of(record)?;
    let values = fields(record);
    if values.len() < MIN_FIELDS {
        return None;
    }
    let mode = values[0];
    let mut idx = 1;
    // some servers don't supply the link count
    let mut link_count = None;
    if values[idx].starts_with(|c: char| c.is_ascii_digit()) {
        link_count = values[idx].parse::<u64>().ok();
        idx += 1;
    } else if values[idx].starts_with('-') {
        idx += 1;
    }
    // owner and group are there if the size is found two (or one) fields ahead
    // with enough fields left for the date and the name
    let mut owner = None;
    let mut group = None;
    if values.get(idx + 2).is_some_and(|v| is_numeric(v)) && values.len() - (idx + 2) > 4 {
        owner = Some(values[idx]);
        group = Some(values[idx + 1]);
        idx += 2;
    } else if values.get(idx + 1).is_some_and(|v| is_numeric(v)) && values.len() - (idx + 1) > 4 {
        group = Some(values[idx]);
        idx += 1;
    }
    let size = values.get(idx)?.replace('.', "").parse::<u64>().ok()?;
    idx += 1;
    // a numeric field before the month is either the BSD day of month or junk to skip
    let mut day_of_month = None;
    if is_numeric(values.get(idx)?) {
        let month_follows = values
            .get(idx + 1)
            .is_some_and(|v| v.starts_with(char::is_alphabetic));
        let time_follows = values
            .get(idx + 2)
            .and_then(|v| v.find(':'))
            .is_some_and(|pos| pos > 0);
        if month_follows && time_follows {
            day_of_month = values[idx]
                .parse::<u32>()
                .ok()
                .filter(|day| (1..=31).contains(day));
        }
        idx += 1;
    }
    let date_pos = idx;
    let month = values.get(idx)?;
    idx += 1;
    let day = match day_of_month {
        Some(day) => day.to_string(),
        None => {
            idx += 1;
            values.get(idx - 1)?.to_string()
        }
    };
    let year_or_time = values.get(idx)?;
    let modified = parse_date(month, &day, year_or_time, ctx)?;
    let date_fields = if day_of_month.is_some() { 2 } else { 3 };
    let remainder = text_after(record, values.get(date_pos..date_pos + date_fields)?)?.trim();
    if remainder.is_empty() {
        return None;
    }
    let (name, link_target) = split_link(kind, remainder);

    let mut entry = DirectoryEntry::new(name, kind);
    entry.size = Some(size);
    entry.modified = Some(modified);
    entry.link_count = link_count;
    entry.link_target = link_target;
    entry.owner = owner.map(str::to_string);
    entry.group = group.map(str::to_string);
    entry.permissions = Some(Permissions::from_symbolic(mode));
    Some(entry)
}

/// Parse a line where the group comes before the link count and the owner, and times have seconds.
///
/// ```text
/// -rw-r--r-- users 1 omar 8192 Nov 5 10:30:00 omar.txt
/// ```
pub(super) fn parse_alt(record: &str, ctx: &ParseContext) -> Option<DirectoryEntry> {
    let kind = kind_of(record)?;
    let values = fields(record);
    if values.len() < MIN_FIELDS_ALT {
        return None;
    }
    let mode = values[0];
    let group = values[1];
    let mut idx = 2;
    let mut link_count = None;
    if values[idx].starts_with(|c: char| c.is_ascii_digit()) {
        link_count = values[idx].parse::<u64>().ok();
        idx += 1;
    }
    let owner = values[idx];
    let size = values.get(idx + 1)?.parse::<u64>().ok()?;
    let date_pos = idx + 2;
    let date = values.get(date_pos..date_pos + 3)?;
    let modified = if date[2].contains(':') {
        let stamp = format!("{} {} {} {}", date[0], date[1], ctx.now.year(), date[2]);
        NaiveDateTime::parse_from_str(&stamp, "%b %d %Y %H:%M:%S")
            .ok()
            .map(|dt| last_year_if_future(dt, ctx.now))?
    } else {
        parse_year_date(date[0], date[1], date[2])?
    };
    let remainder = text_after(record, date)?.trim();
    if remainder.is_empty() {
        return None;
    }
    let (name, link_target) = split_link(kind, remainder);

    let mut entry = DirectoryEntry::new(name, kind);
    entry.size = Some(size);
    entry.modified = Some(modified);
    entry.link_count = link_count;
    entry.link_target = link_target;
    entry.owner = Some(owner.to_string());
    entry.group = Some(group.to_string());
    entry.permissions = Some(Permissions::from_symbolic(mode));
    Some(entry)
}

fn kind_of(record: &str) -> Option<EntryKind> {
    match record.chars().next()? {
        '-' => Some(EntryKind::File),
        'd' => Some(EntryKind::Directory),
        'l' => Some(EntryKind::Link),
        _ => None,
    }
}

/// Returns from a symlink name token the name of the file and the symbolic link (if there is any)
fn split_link(kind: EntryKind, token: &str) -> (String, Option<String>) {
    if kind != EntryKind::Link {
        return (token.to_string(), None);
    }
    match token.find("->") {
        Some(pos) if pos > 0 => {
            let target = token[pos + 2..].trim();
            (
                token[..pos].trim().to_string(),
                Some(target.to_string()).filter(|t| !t.is_empty()),
            )
        }
        _ => (token.to_string(), None),
    }
}

/// ls time has two possible syntax:
/// 1. if year is current: %b %d %H:%M (e.g. Nov 5 13:46)
/// 2. else: %b %d %Y (e.g. Nov 5 2019)
fn parse_date(
    month: &str,
    day: &str,
    year_or_time: &str,
    ctx: &ParseContext,
) -> Option<NaiveDateTime> {
    if !year_or_time.contains(':') && !year_or_time.contains('.') {
        return parse_year_date(month, day, year_or_time);
    }
    // some servers write 10.30
    let time = year_or_time.replace('.', ":");
    let stamp = format!("{month} {day} {} {time}", ctx.now.year());
    NaiveDateTime::parse_from_str(&stamp, "%b %d %Y %H:%M")
        .ok()
        .map(|dt| last_year_if_future(dt, ctx.now))
}

fn parse_year_date(month: &str, day: &str, year: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(&format!("{month} {day} {year}"), "%b %d %Y")
        .ok()?
        .and_hms_opt(0, 0, 0)
}
