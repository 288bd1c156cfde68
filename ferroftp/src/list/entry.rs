//! # Entry
//!
//! A normalized directory listing entry

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;

use super::pex::Permissions;

/// Describes the kind of entry
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    Link,
    Unknown,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
            Self::Link => write!(f, "link"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Describes a file entry on the remote system.
/// This data type is returned in a collection after parsing a listing.
///
/// Fields the server didn't report are `None`, never zero.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DirectoryEntry {
    pub(crate) full_path: String,
    pub(crate) name: String,
    pub(crate) kind: EntryKind,
    pub(crate) size: Option<u64>,
    pub(crate) modified: Option<NaiveDateTime>,
    pub(crate) created: Option<NaiveDateTime>,
    pub(crate) permissions: Option<Permissions>,
    pub(crate) owner: Option<String>,
    pub(crate) group: Option<String>,
    pub(crate) link_target: Option<String>,
    pub(crate) link_count: Option<u64>,
    /// Entry the link resolves to, filled by link dereferencing
    pub(crate) link_entry: Option<Arc<DirectoryEntry>>,
    pub(crate) unique: Option<String>,
    pub(crate) raw: String,
}

impl DirectoryEntry {
    pub(crate) fn new(name: impl ToString, kind: EntryKind) -> Self {
        Self {
            full_path: String::new(),
            name: name.to_string(),
            kind,
            size: None,
            modified: None,
            created: None,
            permissions: None,
            owner: None,
            group: None,
            link_target: None,
            link_count: None,
            link_entry: None,
            unique: None,
            raw: String::new(),
        }
    }

    /// Absolute path of the entry on the server
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Get file name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Get whether file is a directory
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Get whether file is a file
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Get whether file is a symlink
    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Link
    }

    /// Size in bytes, `-1` when the server didn't report it
    pub fn size(&self) -> i64 {
        self.size
            .and_then(|size| i64::try_from(size).ok())
            .unwrap_or(-1)
    }

    /// Size in bytes, if known
    pub fn size_opt(&self) -> Option<u64> {
        self.size
    }

    /// Returns the last time the file was modified, in server time
    pub fn modified(&self) -> Option<NaiveDateTime> {
        self.modified
    }

    pub fn created(&self) -> Option<NaiveDateTime> {
        self.created
    }

    pub fn permissions(&self) -> Option<&Permissions> {
        self.permissions.as_ref()
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Returns, if available, the path the symlink is pointing to
    pub fn link_target(&self) -> Option<&str> {
        self.link_target.as_deref()
    }

    pub fn link_count(&self) -> Option<u64> {
        self.link_count
    }

    /// The entry this link resolves to, once dereferenced
    pub fn link_entry(&self) -> Option<&DirectoryEntry> {
        self.link_entry.as_deref()
    }

    /// `unique` fact of a machine listing
    pub fn unique(&self) -> Option<&str> {
        self.unique.as_deref()
    }

    /// Listing line the entry was parsed from
    pub fn raw(&self) -> &str {
        &self.raw
    }
}
