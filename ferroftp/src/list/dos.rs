//! # DOS
//!
//! Windows / IIS listings.
//!
//! ```text
//! {DATE} {TIME} {<DIR> | SIZE} {FILENAME}
//! 10-19-20  03:19PM       <DIR>          pub
//! 04-08-14  03:09PM                  403 readme.txt
//! 2013-09-02  19:06                9,730 File17
//! ```

use chrono::NaiveDateTime;

use super::{fields, text_after, DirectoryEntry, EntryKind, ParseContext};

const MIN_FIELDS: usize = 4;
const DIR_MARKER: &str = "<DIR>";
/// Columns between the type field and the name
const DIR_NAME_OFFSET: usize = 10;
const FILE_NAME_OFFSET: usize = 1;

const DATE_FORMATS: [&str; 5] = [
    "%m-%d-%y %I:%M%p",
    "%m-%d-%y %H:%M",
    "%m-%d-%Y %I:%M%p",
    "%Y-%m-%d %I:%M%p",
    "%Y-%m-%d %H:%M",
];

pub(super) fn is_valid(lines: &[String]) -> bool {
    let mut date_start = false;
    let mut time_colon = false;
    let mut dir_or_file = false;
    for line in lines.iter().take(10) {
        let values = fields(line);
        if values.len() < MIN_FIELDS {
            continue;
        }
        if values[0].starts_with(|c: char| c.is_ascii_digit())
            && values[0].ends_with(|c: char| c.is_ascii_digit())
        {
            date_start = true;
        }
        if values[1].find(':').is_some_and(|pos| pos > 0) {
            time_colon = true;
        }
        if values[2].eq_ignore_ascii_case(DIR_MARKER)
            || values[2].starts_with(|c: char| c.is_ascii_digit())
        {
            dir_or_file = true;
        }
    }
    date_start && time_colon && dir_or_file
}

/// Parse a DOS line. The date is mandatory: it is what tells this format apart.
pub(super) fn parse(record: &str, _ctx: &ParseContext) -> Option<DirectoryEntry> {
    let values = fields(record);
    if values.len() < MIN_FIELDS {
        return None;
    }
    let stamp = format!("{} {}", values[0], values[1]);
    let modified = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&stamp, fmt).ok())?;
    let (kind, size) = if values[2].eq_ignore_ascii_case(DIR_MARKER) {
        (EntryKind::Directory, None)
    } else {
        (
            EntryKind::File,
            Some(values[2].replace(',', "").parse::<u64>().ok()?),
        )
    };
    let offset = match kind {
        EntryKind::Directory => DIR_NAME_OFFSET,
        _ => FILE_NAME_OFFSET,
    };
    let name = skip_padding(text_after(record, &values[..3])?, offset);
    if name.trim().is_empty() {
        return None;
    }
    let mut entry = DirectoryEntry::new(name, kind);
    entry.size = size;
    entry.modified = Some(modified);
    Some(entry)
}

/// Skip at most `columns` blanks; names may start with spaces beyond the padding
fn skip_padding(text: &str, columns: usize) -> &str {
    let skip = text
        .chars()
        .take(columns)
        .take_while(|c| c.is_whitespace())
        .map(char::len_utf8)
        .sum::<usize>();
    &text[skip..]
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::list::test::{context, datetime};

    fn parse_dos(line: &str) -> Option<DirectoryEntry> {
        parse(line, &context())
    }

    #[test]
    fn should_parse_dos_lines() {
        let entry = parse_dos("03-07-13  10:02AM                  901 File01.xml").unwrap();
        assert_eq!(entry.name(), "File01.xml");
        assert_eq!(entry.kind(), EntryKind::File);
        assert_eq!(entry.size_opt(), Some(901));
        assert_eq!(entry.modified(), Some(datetime(2013, 3, 7, 10, 2, 0)));
        let entry = parse_dos("04-27-00  12:09PM       <DIR>          Folder14").unwrap();
        assert_eq!(entry.name(), "Folder14");
        assert!(entry.is_directory());
        assert_eq!(entry.size_opt(), None);
        assert_eq!(entry.modified(), Some(datetime(2000, 4, 27, 12, 9, 0)));
    }

    #[test]
    fn should_parse_dos_long_year_lines() {
        let entry = parse_dos("2013-09-02  19:06                9,730 File17").unwrap();
        assert_eq!(entry.name(), "File17");
        assert_eq!(entry.size_opt(), Some(9730));
        assert_eq!(entry.modified(), Some(datetime(2013, 9, 2, 19, 6, 0)));
        let entry = parse_dos("10-19-2020  03:19PM <dir> pub folder").unwrap();
        assert_eq!(entry.name(), "pub folder");
        assert!(entry.is_directory());
        assert_eq!(entry.modified(), Some(datetime(2020, 10, 19, 15, 19, 0)));
    }

    #[test]
    fn should_keep_spaces_beyond_padding() {
        let entry = parse_dos("04-08-14  03:09PM 403   readme.txt").unwrap();
        assert_eq!(entry.name(), "  readme.txt");
    }

    #[test]
    fn should_reject_dos_lines() {
        assert!(parse_dos("-rw-r--r--   1 omar  users  10 May 30 10:30 a").is_none());
        assert!(parse_dos("03-07-13  10:02AM  big File01.xml").is_none());
        assert!(parse_dos("03-07-13  10:02AM  901").is_none());
    }

    #[test]
    fn should_validate_dos_listing() {
        assert!(is_valid(&[
            "04-27-00  12:09PM       <DIR>          Folder14".to_string()
        ]));
        assert!(!is_valid(&["total 0".to_string()]));
    }
}
