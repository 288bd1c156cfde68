//! # Dialect
//!
//! Server families with their own listing grammar

use std::fmt;

use crate::capability::{Capability, CapabilitySet};

/// Listing grammar of a server
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum Dialect {
    /// `ls -l` long format
    Unix,
    /// `ls -l` with group before owner and `HH:mm:ss` times
    UnixAlt,
    /// DOS / IIS short format
    Windows,
    Vms,
    /// Multinet on VMS; same grammar as [`Dialect::Vms`]
    Multinet,
    IbmOs400,
    /// zOS in the Unix System Services realm
    ZosUnix,
    /// zOS MVS dataset listing
    ZosDataset,
    /// zOS partitioned dataset members
    ZosMember,
    /// zOS load library members
    ZosMemberLoadlib,
    /// HP NonStop (Tandem)
    NonStop,
    /// `MLSD` facts lines
    MachineFacts,
    /// Detected from the listing itself
    #[default]
    Unknown,
}

impl Dialect {
    /// Choose the dialect from the `SYST` reply and the advertised features.
    ///
    /// `MLSD` support wins over the system type.
    pub fn detect(system_type: Option<&str>, capabilities: &CapabilitySet) -> Self {
        if capabilities.has(Capability::Mlsd) {
            return Self::MachineFacts;
        }
        let Some(system) = system_type.map(|s| s.to_uppercase()) else {
            return Self::Unknown;
        };
        // z/OS first: its SYST reply may contain UNIX too
        if system.starts_with("WINDOWS") {
            Self::Windows
        } else if system.contains("Z/OS") || system.starts_with("MVS") {
            if system.starts_with("UNIX") {
                Self::ZosUnix
            } else {
                Self::ZosDataset
            }
        } else if system.contains("UNIX") || system.contains("AIX") || system.contains("SUNOS")
        {
            Self::Unix
        } else if system.contains("MULTINET") {
            Self::Multinet
        } else if system.contains("VMS") {
            Self::Vms
        } else if system.contains("OS/400") {
            Self::IbmOs400
        } else {
            Self::Unknown
        }
    }

    /// Whether the dialect is one of the zOS realms
    pub fn is_zos(&self) -> bool {
        matches!(
            self,
            Self::ZosUnix | Self::ZosDataset | Self::ZosMember | Self::ZosMemberLoadlib
        )
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unix => "UNIX",
            Self::UnixAlt => "UNIX (alternate)",
            Self::Windows => "Windows",
            Self::Vms => "VMS",
            Self::Multinet => "Multinet",
            Self::IbmOs400 => "IBM OS/400",
            Self::ZosUnix => "IBM zOS (unix)",
            Self::ZosDataset => "IBM zOS (dataset)",
            Self::ZosMember => "IBM zOS (member)",
            Self::ZosMemberLoadlib => "IBM zOS (loadlib)",
            Self::NonStop => "NonStop",
            Self::MachineFacts => "machine listing",
            Self::Unknown => "auto",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_detect_dialect_from_system_type() {
        let caps = CapabilitySet::default();
        assert_eq!(
            Dialect::detect(Some("UNIX Type: L8"), &caps),
            Dialect::Unix
        );
        assert_eq!(Dialect::detect(Some("Windows_NT"), &caps), Dialect::Windows);
        assert_eq!(
            Dialect::detect(Some("VMS OpenVMS V8.4"), &caps),
            Dialect::Vms
        );
        assert_eq!(
            Dialect::detect(Some("VMS MultiNet V5.5"), &caps),
            Dialect::Multinet
        );
        assert_eq!(Dialect::detect(Some("OS/400 is the remote operating system."), &caps), Dialect::IbmOs400);
        assert_eq!(
            Dialect::detect(
                Some("MVS is the operating system of this server. FTP Server is running on z/OS."),
                &caps
            ),
            Dialect::ZosDataset
        );
        assert_eq!(
            Dialect::detect(
                Some("UNIX is the operating system of this server. FTP Server is running on z/OS."),
                &caps
            ),
            Dialect::ZosUnix
        );
        assert_eq!(Dialect::detect(Some("SunOS 5.10"), &caps), Dialect::Unix);
        assert_eq!(Dialect::detect(Some("Plan 9"), &caps), Dialect::Unknown);
        assert_eq!(Dialect::detect(None, &caps), Dialect::Unknown);
    }

    #[test]
    fn should_prefer_machine_listing() {
        let mut caps = CapabilitySet::default();
        caps.insert(Capability::Mlsd);
        assert_eq!(
            Dialect::detect(Some("Windows_NT"), &caps),
            Dialect::MachineFacts
        );
    }

    #[test]
    fn should_tell_zos_realm() {
        assert!(Dialect::ZosMember.is_zos());
        assert!(!Dialect::NonStop.is_zos());
        assert_eq!(Dialect::IbmOs400.to_string(), "IBM OS/400");
    }
}
