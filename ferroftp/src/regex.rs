//! # FTP Regex
//!
//! Regular expressions to parse FTP replies

use lazy_regex::{Lazy, Regex};

/// This regex extracts IP and Port details from PASV command response.
/// The regex looks for the pattern h1,h2,h3,h4,p1,p2; parentheses are optional since
/// some servers omit them.
pub static PASV_PORT_RE: Lazy<Regex> = lazy_regex!(r"(\d+),(\d+),(\d+),(\d+),(\d+),(\d+)");

/// This regex extract the port number from EPSV command response.
/// The regex looks for the pattern (|||port_number|)
pub static EPSV_PORT_RE: Lazy<Regex> = lazy_regex!(r"\(\|\|\|(\d+)\|\)");

/// This regex extracts the quoted path from the PWD response.
/// Quotes inside the path are doubled, so the match is greedy.
pub static PWD_RE: Lazy<Regex> = lazy_regex!(r#""(.*)""#);

/// This regex extracts modification time from MDTM command response.
pub static MDTM_RE: Lazy<Regex> =
    lazy_regex!(r"\b(\d{4})(\d{2})(\d{2})(\d{2})(\d{2})(\d{2})(?:\.(\d{1,3}))?\b");

/// This regex extracts file size from SIZE command response.
pub static SIZE_RE: Lazy<Regex> = lazy_regex!(r"(\d+)\s*$");

/// This regex matches IPv4 addresses a server may advertise in a PASV reply which
/// can't be reached from outside its own network.
pub static UNROUTABLE_IPV4_RE: Lazy<Regex> = lazy_regex!(
    r"^(?:10\.\d+\.\d+\.\d+|172\.(?:1[6-9]|2\d|3[01])\.\d+\.\d+|192\.168\.\d+\.\d+|127\.0\.0\.1|0\.0\.0\.0)$"
);
