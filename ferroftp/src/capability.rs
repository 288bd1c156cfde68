//! # Capability
//!
//! Optional server features, as advertised through `FEAT`

use std::collections::{HashMap, HashSet};
use std::fmt;

/// Raw `FEAT` entries: feature label mapped to its optional parameters
pub type Features = HashMap<String, Option<String>>;

/// Optional server feature
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Machine listing (`MLST`/`MLSD`)
    Mlsd,
    /// Modification time query
    Mdtm,
    /// Stream mode restart
    RestStream,
    /// File size query
    Size,
    /// UTF-8 paths
    Utf8,
    /// `PRET` before `PASV`
    Pret,
    /// Set modification time
    Mfmt,
    /// Set creation time
    Mfct,
    /// Set facts
    Mff,
    /// Multiple files MD5
    Mmd5,
    Xmd5,
    Xcrc,
    Xsha1,
    Xsha256,
    Xsha512,
    Epsv,
    Cpsv,
    Noop,
    Clnt,
    Sscn,
    SiteMkdir,
    SiteRmdir,
    SiteUtime,
    SiteSymlink,
    /// Available disk space
    Avbl,
    Thmb,
    /// Recursive directory removal
    Rmda,
    /// Directory size
    Dsiz,
    /// Virtual hosting
    Host,
    /// Clear command channel
    Ccc,
    /// Deflate transfer mode
    ModeZ,
    Lang,
    /// Generic `HASH` command
    Hash,
}

impl Capability {
    /// Upper-cased `FEAT` line prefixes, longest first where one prefix contains another
    const PREFIXES: &'static [(&'static str, Capability)] = &[
        ("MLST", Capability::Mlsd),
        ("MLSD", Capability::Mlsd),
        ("MDTM", Capability::Mdtm),
        ("REST STREAM", Capability::RestStream),
        ("SIZE", Capability::Size),
        ("UTF8", Capability::Utf8),
        ("PRET", Capability::Pret),
        ("MFMT", Capability::Mfmt),
        ("MFCT", Capability::Mfct),
        ("MFF", Capability::Mff),
        ("MMD5", Capability::Mmd5),
        ("XMD5", Capability::Xmd5),
        ("XCRC", Capability::Xcrc),
        ("XSHA256", Capability::Xsha256),
        ("XSHA512", Capability::Xsha512),
        ("XSHA1", Capability::Xsha1),
        ("XSHA", Capability::Xsha1),
        ("EPSV", Capability::Epsv),
        ("CPSV", Capability::Cpsv),
        ("NOOP", Capability::Noop),
        ("CLNT", Capability::Clnt),
        ("SSCN", Capability::Sscn),
        ("SITE MKDIR", Capability::SiteMkdir),
        ("SITE RMDIR", Capability::SiteRmdir),
        ("SITE UTIME", Capability::SiteUtime),
        ("SITE SYMLINK", Capability::SiteSymlink),
        ("AVBL", Capability::Avbl),
        ("THMB", Capability::Thmb),
        ("RMDA", Capability::Rmda),
        ("DSIZ", Capability::Dsiz),
        ("HOST", Capability::Host),
        ("CCC", Capability::Ccc),
        ("MODE Z", Capability::ModeZ),
        ("LANG", Capability::Lang),
        ("HASH", Capability::Hash),
    ];

    /// Match an upper-cased feature line against the known prefixes
    fn from_feature_line(line: &str) -> Option<Self> {
        Self::PREFIXES
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix))
            .map(|(_, cap)| *cap)
    }
}

/// Algorithm listed on the `HASH` feature line
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha512,
    Md5,
    Crc,
}

impl HashAlgorithm {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "SHA-1" => Some(Self::Sha1),
            "SHA-256" => Some(Self::Sha256),
            "SHA-512" => Some(Self::Sha512),
            "MD5" => Some(Self::Md5),
            "CRC" => Some(Self::Crc),
            _ => None,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "SHA-1"),
            Self::Sha256 => write!(f, "SHA-256"),
            Self::Sha512 => write!(f, "SHA-512"),
            Self::Md5 => write!(f, "MD5"),
            Self::Crc => write!(f, "CRC"),
        }
    }
}

/// The set of features a server advertised.
///
/// Populated once per session from the `FEAT` reply; clones receive a copy of their parent's set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    capabilities: HashSet<Capability>,
    hash_algorithms: HashSet<HashAlgorithm>,
    features: Features,
}

impl CapabilitySet {
    /// Record one `FEAT` line: the raw entry and the capability it advertises, if known
    pub(crate) fn add_feature_line(&mut self, line: &str) {
        let mut words = line.split_whitespace();
        let Some(label) = words.next() else {
            return;
        };
        let params = match words.collect::<Vec<&str>>().join(" ") {
            params if params.is_empty() => None,
            params => Some(params),
        };
        let line = match params.as_deref() {
            Some(params) => format!("{label} {params}").to_uppercase(),
            None => label.to_uppercase(),
        };
        self.features.entry(label.to_string()).or_insert(params);
        let Some(capability) = Capability::from_feature_line(&line) else {
            return;
        };
        if capability == Capability::Hash {
            self.hash_algorithms.extend(
                line.trim_start_matches("HASH")
                    .split(';')
                    .map(|algo| algo.trim().trim_end_matches('*'))
                    .filter_map(HashAlgorithm::from_name),
            );
        }
        self.capabilities.insert(capability);
    }

    /// Whether the server advertised the capability
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Hash algorithms listed on the `HASH` feature line
    pub fn hash_algorithms(&self) -> &HashSet<HashAlgorithm> {
        &self.hash_algorithms
    }

    /// Raw `FEAT` entries the set was built from
    pub fn features(&self) -> &Features {
        &self.features
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.capabilities.iter()
    }

    /// Add a capability; used when a server supports a feature it didn't advertise
    pub fn insert(&mut self, capability: Capability) {
        self.capabilities.insert(capability);
    }
}
