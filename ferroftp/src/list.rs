//! # List
//!
//! This module exposes the parser for directory listings.
//! Please note that there's no guarantee this parser works on every server, and the reason is quite simple.
//! No RFC defines the LIST command output, so it basically depends on the implementation of the
//! remote FTP server. Each server family gets its own grammar, selected through a [`Dialect`]; the machine
//! readable `MLSD` format is supported as well.
//!
//! ## Get started
//!
//! Whenever you receive the output of your LIST command, pass its lines to [`ListingParser::parse_listing`].
//! Lines which can't be parsed are skipped and reported to the log sink.
//!
//! ```rust
//! use ferroftp::list::{Dialect, ListingParser};
//!
//! let lines = vec![
//!     "total 2".to_string(),
//!     "-rw-r--r--   1 omar  users      8192 Nov  5  2018 omar.txt".to_string(),
//!     "drwxr-xr-x   2 omar  users      4096 Nov  5  2018 pub".to_string(),
//! ];
//! let entries = ListingParser::new(Dialect::Unix).parse_listing("/home/omar", &lines);
//! assert_eq!(entries.len(), 2);
//! assert_eq!(entries[0].full_path(), "/home/omar/omar.txt");
//! assert!(entries[1].is_directory());
//! ```

mod dialect;
mod dos;
mod entry;
mod facts;
mod nonstop;
mod os400;
mod pex;
mod unix;
mod vms;
mod zos;

use std::borrow::Cow;

use chrono::{Datelike, Duration, Local, NaiveDateTime};

pub use self::dialect::Dialect;
pub use self::entry::{DirectoryEntry, EntryKind};
pub(crate) use self::facts::parse_timestamp;
pub use self::pex::{Permissions, PosixPex, PosixPexQuery, SpecialBits};
use crate::log_sink::SharedLogSink;

/// Default record length of zOS members
pub const DEFAULT_ZOS_LRECL: u64 = 80;

/// Values shared by every grammar while parsing one listing
#[derive(Debug, Clone, Copy)]
pub(crate) struct ParseContext {
    /// Current server time, used to guess the year of recent Unix entries
    pub now: NaiveDateTime,
    pub zos_lrecl: u64,
}

type ParseFn = fn(&str, &ParseContext) -> Option<DirectoryEntry>;
type ValidFn = fn(&[String]) -> bool;

/// A listing grammar: a pure line parser plus the heuristic telling whether a listing looks like it
struct Grammar {
    dialect: Dialect,
    parse: ParseFn,
    is_valid: ValidFn,
}

/// Registered grammars. With an unknown dialect lines are tried in this order and the first match wins.
static DIALECTS: &[Grammar] = &[
    Grammar {
        dialect: Dialect::MachineFacts,
        parse: facts::parse,
        is_valid: facts::is_valid,
    },
    Grammar {
        dialect: Dialect::Unix,
        parse: unix::parse,
        is_valid: unix::is_valid,
    },
    Grammar {
        dialect: Dialect::Windows,
        parse: dos::parse,
        is_valid: dos::is_valid,
    },
    Grammar {
        dialect: Dialect::IbmOs400,
        parse: os400::parse,
        is_valid: os400::is_valid,
    },
    Grammar {
        dialect: Dialect::Vms,
        parse: vms::parse,
        is_valid: vms::is_valid,
    },
    Grammar {
        dialect: Dialect::NonStop,
        parse: nonstop::parse,
        is_valid: nonstop::is_valid,
    },
    Grammar {
        dialect: Dialect::UnixAlt,
        parse: unix::parse_alt,
        is_valid: unix::is_valid,
    },
    Grammar {
        dialect: Dialect::Multinet,
        parse: vms::parse,
        is_valid: vms::is_valid,
    },
    Grammar {
        dialect: Dialect::ZosUnix,
        parse: unix::parse,
        is_valid: zos::is_valid,
    },
    Grammar {
        dialect: Dialect::ZosDataset,
        parse: zos::parse_dataset,
        is_valid: zos::is_valid,
    },
    Grammar {
        dialect: Dialect::ZosMember,
        parse: zos::parse_member,
        is_valid: zos::is_valid,
    },
    Grammar {
        dialect: Dialect::ZosMemberLoadlib,
        parse: zos::parse_loadlib,
        is_valid: zos::is_valid,
    },
];

/// Dialects tried on single lines when the dialect is unknown
const FALLBACK_ORDER: [Dialect; 6] = [
    Dialect::MachineFacts,
    Dialect::Unix,
    Dialect::Windows,
    Dialect::IbmOs400,
    Dialect::Vms,
    Dialect::NonStop,
];

/// Dialects whose heuristic is checked against a whole listing, in order
const DETECTION_ORDER: [Dialect; 6] = [
    Dialect::Unix,
    Dialect::Windows,
    Dialect::IbmOs400,
    Dialect::Vms,
    Dialect::NonStop,
    Dialect::ZosDataset,
];

fn grammar(dialect: Dialect) -> Option<&'static Grammar> {
    DIALECTS.iter().find(|g| g.dialect == dialect)
}

impl Dialect {
    /// Guess the dialect from the first lines of a listing. Defaults to [`Dialect::Unix`].
    pub fn detect_from_listing(lines: &[String]) -> Self {
        for dialect in DETECTION_ORDER {
            let Some(grammar) = grammar(dialect) else {
                continue;
            };
            if (grammar.is_valid)(lines) {
                if dialect.is_zos() {
                    return lines
                        .first()
                        .and_then(|line| zos::realm_from_header(line))
                        .unwrap_or(dialect);
                }
                return dialect;
            }
        }
        Self::Unix
    }
}

/// Parses directory listings into [`DirectoryEntry`]
#[derive(Debug, Clone)]
pub struct ListingParser {
    dialect: Dialect,
    include_self_and_parent: bool,
    reference_time: Option<NaiveDateTime>,
    zos_lrecl: u64,
    log: SharedLogSink,
}

impl ListingParser {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            include_self_and_parent: false,
            reference_time: None,
            zos_lrecl: DEFAULT_ZOS_LRECL,
            log: SharedLogSink::default(),
        }
    }

    /// Keep `.` and `..` entries in parsed listings
    pub fn include_self_and_parent(mut self, include: bool) -> Self {
        self.include_self_and_parent = include;
        self
    }

    pub fn with_log_sink(mut self, log: SharedLogSink) -> Self {
        self.log = log;
        self
    }

    /// Use `now` as the current time instead of the local clock
    pub fn with_reference_time(mut self, now: NaiveDateTime) -> Self {
        self.reference_time = Some(now);
        self
    }

    /// Record length used to compute the size of zOS members
    pub fn with_zos_lrecl(mut self, lrecl: u64) -> Self {
        self.zos_lrecl = lrecl;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Parse a single listing line of a listing of `path`.
    /// Returns `None` if the line doesn't match the grammar of the dialect.
    pub fn parse_line(&self, path: &str, line: &str) -> Option<DirectoryEntry> {
        let ctx = self.context();
        if self.dialect.is_zos() && zos::realm_from_header(line).is_some() {
            return None;
        }
        self.parse_with(self.dialect, &ctx, path, line)
    }

    /// Parse all the lines of a listing of `path`.
    ///
    /// A line followed by one starting with a tab or a space is merged with it before being parsed.
    /// zOS header lines switch the grammar used for the following lines.
    pub fn parse_listing(&self, path: &str, lines: &[String]) -> Vec<DirectoryEntry> {
        let ctx = self.context();
        let mut dialect = match self.dialect {
            Dialect::Unknown => {
                let detected = Dialect::detect_from_listing(lines);
                self.log.debug(format!("detected listing format {detected}"));
                detected
            }
            dialect => dialect,
        };
        let mut entries = Vec::with_capacity(lines.len());
        let mut i = 0;
        while i < lines.len() {
            let mut line = Cow::Borrowed(lines[i].as_str());
            i += 1;
            if !dialect.is_zos() {
                if let Some(next) = lines.get(i).filter(|l| l.starts_with(['\t', ' '])) {
                    line.to_mut().push_str(next);
                    i += 1;
                }
            }
            if dialect.is_zos() {
                if let Some(realm) = zos::realm_from_header(&line) {
                    self.log.trace(format!("listing realm is now {realm}"));
                    dialect = realm;
                    continue;
                }
            }
            match self.parse_with(dialect, &ctx, path, &line) {
                Some(entry) if !self.include_self_and_parent && is_self_or_parent(&entry) => {
                    self.log.trace(format!("skipped self or parent entry {}", entry.name()));
                }
                Some(entry) => entries.push(entry),
                None if line.trim().is_empty() => {}
                None => self.log.debug(format!("failed to parse listing line: {line}")),
            }
        }
        entries
    }

    fn parse_with(
        &self,
        dialect: Dialect,
        ctx: &ParseContext,
        path: &str,
        line: &str,
    ) -> Option<DirectoryEntry> {
        let mut entry = match dialect {
            Dialect::Unknown => FALLBACK_ORDER
                .iter()
                .filter_map(|d| grammar(*d))
                .find_map(|g| (g.parse)(line, ctx))?,
            dialect => (grammar(dialect)?.parse)(line, ctx)?,
        };
        entry.raw = line.to_string();
        resolve_paths(&mut entry, path);
        self.log.trace(format!(
            "found {} {} (size: {:?})",
            entry.kind, entry.full_path, entry.size
        ));
        Some(entry)
    }

    fn context(&self) -> ParseContext {
        ParseContext {
            now: self
                .reference_time
                .unwrap_or_else(|| Local::now().naive_local()),
            zos_lrecl: self.zos_lrecl,
        }
    }
}

impl Default for ListingParser {
    fn default() -> Self {
        Self::new(Dialect::Unknown)
    }
}

fn is_self_or_parent(entry: &DirectoryEntry) -> bool {
    entry.name == "." || entry.name == ".." || facts::is_self_or_parent(&entry.raw)
}

/// Fill the full path of the entry and make a relative link target absolute
fn resolve_paths(entry: &mut DirectoryEntry, dir: &str) {
    if entry.name.starts_with('/') {
        entry.full_path = normalize_path(&entry.name);
        if let Some(name) = entry.full_path.rsplit('/').next().filter(|n| !n.is_empty()) {
            entry.name = name.to_string();
        }
    } else {
        entry.full_path = join_path(dir, &entry.name);
    }
    if let Some(target) = entry.link_target.as_mut() {
        if !target.starts_with('/') && !dir.is_empty() {
            *target = join_path(dir, target.strip_prefix("./").unwrap_or(target));
        }
    }
}

/// Join a directory and a name into a path
pub(crate) fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        return normalize_path(name);
    }
    normalize_path(&format!("{dir}/{name}"))
}

/// Use forward slashes, collapse repeated slashes and strip the trailing one
fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len());
    for c in path.chars().map(|c| if c == '\\' { '/' } else { c }) {
        if c == '/' && normalized.ends_with('/') {
            continue;
        }
        normalized.push(c);
    }
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

// -- helpers shared by grammars

/// Whitespace separated fields
fn fields(record: &str) -> Vec<&str> {
    record.split_whitespace().collect()
}

fn is_numeric(field: &str) -> bool {
    !field.is_empty() && field.chars().all(|c| c.is_ascii_digit())
}

/// Locate `values` in order inside `record` and return the text following the last one
fn text_after<'a>(record: &'a str, values: &[&str]) -> Option<&'a str> {
    let mut pos = 0;
    for value in values {
        pos += record.get(pos..)?.find(value)? + value.len();
    }
    record.get(pos..)
}

/// A date more than two days in the future belongs to the previous year
fn last_year_if_future(date: NaiveDateTime, now: NaiveDateTime) -> NaiveDateTime {
    if is_future(date, now) {
        date.with_year(date.year() - 1).unwrap_or(date)
    } else {
        date
    }
}

/// Whether the date is more than two days after `now`; two days absorb time zone differences
fn is_future(date: NaiveDateTime, now: NaiveDateTime) -> bool {
    date > now + Duration::days(2)
}
