//! # Command
//!
//! The set of FTP commands emitted on the control connection

pub(crate) mod feat;

use std::fmt;

use crate::config::TextEncoding;
use crate::types::FileType;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Ftp commands with their arguments
pub enum Command {
    /// Abort an active file transfer
    Abor,
    /// Append to file
    Appe(String),
    /// Ask for a security mechanism on the control connection
    Auth(AuthMechanism),
    /// Ask server not to encrypt command channel
    Ccc,
    /// Change directory to parent directory
    Cdup,
    /// Change working directory
    Cwd(String),
    /// Remove file at specified path
    Dele(String),
    /// Extended active mode <https://www.rfc-editor.org/rfc/rfc2428#section-2>;
    /// argument is the already formatted `|af|addr|port|`
    Eprt(String),
    /// Extended passive mode <https://www.rfc-editor.org/rfc/rfc2428#section-3>
    Epsv,
    /// List the extensions supported by the server
    Feat,
    /// Ask a checksum of a file with the algorithm selected through `OPTS HASH`
    Hash(String),
    /// List entries at specified path. If path is not provided list entries at current working directory
    List(Option<String>),
    /// Get modification time for file at specified path
    Mdtm(String),
    /// Make directory
    Mkd(String),
    /// Machine listing of the entries at specified path
    Mlsd(Option<String>),
    /// Get the list of file names at specified path. If path is not provided list entries at current working directory
    Nlst(Option<String>),
    /// Ping server
    Noop,
    /// Set an option for a command or a feature
    Opts(String, Option<String>),
    /// Provide login password
    Pass(String),
    /// Passive mode
    Pasv,
    /// Protection buffer size
    Pbsz(usize),
    /// Specifies an address and port to which the server should connect (active mode)
    Port(String),
    /// Announce the data command which will follow the next PASV
    Pret(String),
    /// Set protection level for protocol
    Prot(ProtectionLevel),
    /// Print working directory
    Pwd,
    /// Quit
    Quit,
    /// Select file to rename
    RenameFrom(String),
    /// Rename selected file to
    RenameTo(String),
    /// Resume transfer from offset
    Rest(u64),
    /// Retrieve file
    Retr(String),
    /// Remove directory
    Rmd(String),
    /// Site specific command
    Site(String),
    /// Get file size of specified path
    Size(String),
    /// Put file at specified path
    Store(String),
    /// Ask the system type of the server
    Syst,
    /// Set transfer type
    Type(FileType),
    /// Provide user to login as
    User(String),
    /// Legacy CRC32 checksum
    Xcrc(String),
    /// Legacy MD5 checksum
    Xmd5(String),
    /// Legacy SHA-1 checksum
    Xsha1(String),
    /// Legacy SHA-256 checksum
    Xsha256(String),
    /// Legacy SHA-512 checksum
    Xsha512(String),
    /// Any other command line, sent verbatim
    Custom(String),
}

/// Security mechanism requested through `AUTH`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMechanism {
    Tls,
    Ssl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Protection level; argument for `Prot` command
pub enum ProtectionLevel {
    Clear,
    Private,
}

impl Command {
    /// Encode the command line, CRLF terminated, with the session text encoding
    pub(crate) fn encode(&self, encoding: TextEncoding) -> Vec<u8> {
        let mut line = encoding.encode(&self.to_string());
        line.extend_from_slice(b"\r\n");
        line
    }

    /// Printable form of the command, with secrets masked
    pub(crate) fn masked(&self) -> String {
        match self {
            Self::Pass(_) => "PASS ********".to_string(),
            cmd => cmd.to_string(),
        }
    }

    /// Remote path the command works on
    pub(crate) fn path(&self) -> Option<&str> {
        match self {
            Self::Appe(p) | Self::Retr(p) | Self::Store(p) => Some(p),
            Self::List(p) | Self::Mlsd(p) | Self::Nlst(p) => p.as_deref(),
            _ => None,
        }
    }

    /// Whether the command needs a data connection
    pub(crate) fn opens_data_channel(&self) -> bool {
        matches!(
            self,
            Self::Appe(_)
                | Self::List(_)
                | Self::Mlsd(_)
                | Self::Nlst(_)
                | Self::Retr(_)
                | Self::Store(_)
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn with_path(f: &mut fmt::Formatter<'_>, verb: &str, path: &Option<String>) -> fmt::Result {
            match path {
                Some(path) => write!(f, "{verb} {path}"),
                None => write!(f, "{verb}"),
            }
        }

        match self {
            Self::Abor => write!(f, "ABOR"),
            Self::Appe(p) => write!(f, "APPE {p}"),
            Self::Auth(mechanism) => write!(f, "AUTH {mechanism}"),
            Self::Ccc => write!(f, "CCC"),
            Self::Cdup => write!(f, "CDUP"),
            Self::Cwd(d) => write!(f, "CWD {d}"),
            Self::Dele(p) => write!(f, "DELE {p}"),
            Self::Eprt(addr) => write!(f, "EPRT {addr}"),
            Self::Epsv => write!(f, "EPSV"),
            Self::Feat => write!(f, "FEAT"),
            Self::Hash(p) => write!(f, "HASH {p}"),
            Self::List(p) => with_path(f, "LIST", p),
            Self::Mdtm(p) => write!(f, "MDTM {p}"),
            Self::Mkd(p) => write!(f, "MKD {p}"),
            Self::Mlsd(p) => with_path(f, "MLSD", p),
            Self::Nlst(p) => with_path(f, "NLST", p),
            Self::Noop => write!(f, "NOOP"),
            Self::Opts(name, Some(value)) => write!(f, "OPTS {name} {value}"),
            Self::Opts(name, None) => write!(f, "OPTS {name}"),
            Self::Pass(p) => write!(f, "PASS {p}"),
            Self::Pasv => write!(f, "PASV"),
            Self::Pbsz(sz) => write!(f, "PBSZ {sz}"),
            Self::Port(p) => write!(f, "PORT {p}"),
            Self::Pret(cmd) => write!(f, "PRET {cmd}"),
            Self::Prot(l) => write!(f, "PROT {l}"),
            Self::Pwd => write!(f, "PWD"),
            Self::Quit => write!(f, "QUIT"),
            Self::RenameFrom(p) => write!(f, "RNFR {p}"),
            Self::RenameTo(p) => write!(f, "RNTO {p}"),
            Self::Rest(offset) => write!(f, "REST {offset}"),
            Self::Retr(p) => write!(f, "RETR {p}"),
            Self::Rmd(p) => write!(f, "RMD {p}"),
            Self::Site(cmd) => write!(f, "SITE {cmd}"),
            Self::Size(p) => write!(f, "SIZE {p}"),
            Self::Store(p) => write!(f, "STOR {p}"),
            Self::Syst => write!(f, "SYST"),
            Self::Type(t) => write!(f, "TYPE {t}"),
            Self::User(u) => write!(f, "USER {u}"),
            Self::Xcrc(p) => write!(f, "XCRC {p}"),
            Self::Xmd5(p) => write!(f, "XMD5 {p}"),
            Self::Xsha1(p) => write!(f, "XSHA1 {p}"),
            Self::Xsha256(p) => write!(f, "XSHA256 {p}"),
            Self::Xsha512(p) => write!(f, "XSHA512 {p}"),
            Self::Custom(line) => write!(f, "{line}"),
        }
    }
}

impl fmt::Display for AuthMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tls => write!(f, "TLS"),
            Self::Ssl => write!(f, "SSL"),
        }
    }
}

impl fmt::Display for ProtectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clear => write!(f, "C"),
            Self::Private => write!(f, "P"),
        }
    }
}
