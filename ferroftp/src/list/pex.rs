//! # Pex
//!
//! POSIX permission bits of a listing entry

/// This enum is used to query about posix permissions on a file
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PosixPexQuery {
    Owner,
    Group,
    Others,
}

/// Describes the permissions on POSIX system.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct PosixPex {
    read: bool,
    write: bool,
    execute: bool,
}

impl PosixPex {
    /// Returns whether read permission is true
    pub fn can_read(&self) -> bool {
        self.read
    }

    /// Returns whether write permission is true
    pub fn can_write(&self) -> bool {
        self.write
    }

    /// Returns whether execute permission is true
    pub fn can_execute(&self) -> bool {
        self.execute
    }

    /// Octal digit of this triplet
    pub fn bits(&self) -> u8 {
        (u8::from(self.read) << 2) | (u8::from(self.write) << 1) | u8::from(self.execute)
    }

    /// Parse a `rwx` triplet as found in `ls -l`.
    /// `s` and `t` grant execute, their uppercase versions don't.
    fn from_symbolic(triplet: &[char]) -> Self {
        let at = |i: usize| triplet.get(i).copied().unwrap_or('-');
        Self {
            read: at(0) == 'r',
            write: at(1) == 'w',
            execute: matches!(at(2), 'x' | 's' | 't'),
        }
    }
}

impl From<u8> for PosixPex {
    fn from(bits: u8) -> Self {
        Self {
            read: ((bits >> 2) & 0x01) != 0,
            write: ((bits >> 1) & 0x01) != 0,
            execute: (bits & 0x01) != 0,
        }
    }
}

/// setuid, setgid and sticky bits
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct SpecialBits {
    pub setuid: bool,
    pub setgid: bool,
    pub sticky: bool,
}

impl SpecialBits {
    pub fn bits(&self) -> u8 {
        (u8::from(self.setuid) << 2) | (u8::from(self.setgid) << 1) | u8::from(self.sticky)
    }
}

impl From<u8> for SpecialBits {
    fn from(bits: u8) -> Self {
        Self {
            setuid: ((bits >> 2) & 0x01) != 0,
            setgid: ((bits >> 1) & 0x01) != 0,
            sticky: (bits & 0x01) != 0,
        }
    }
}

/// Permissions of a listing entry
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub struct Permissions {
    pub owner: PosixPex,
    pub group: PosixPex,
    pub others: PosixPex,
    pub special: SpecialBits,
    /// Permission text exactly as the server sent it
    pub raw: Option<String>,
}

impl Permissions {
    /// Returns the pex structure for selected query
    pub fn query(&self, who: PosixPexQuery) -> &PosixPex {
        match who {
            PosixPexQuery::Owner => &self.owner,
            PosixPexQuery::Group => &self.group,
            PosixPexQuery::Others => &self.others,
        }
    }

    /// Numeric mode, such as `0o755`
    pub fn mode(&self) -> u32 {
        (u32::from(self.special.bits()) << 9)
            | (u32::from(self.owner.bits()) << 6)
            | (u32::from(self.group.bits()) << 3)
            | u32::from(self.others.bits())
    }

    /// Parse the mode column of `ls -l`, type character included (e.g. `drwxr-sr-t`)
    pub(crate) fn from_symbolic(mode: &str) -> Self {
        let chars: Vec<char> = mode.chars().skip(1).collect();
        let at = |i: usize| chars.get(i).copied().unwrap_or('-');
        let triplet = |start: usize| PosixPex::from_symbolic(chars.get(start..).unwrap_or(&[]));
        Self {
            owner: triplet(0),
            group: triplet(3),
            others: triplet(6),
            special: SpecialBits {
                setuid: matches!(at(2), 's' | 'S'),
                setgid: matches!(at(5), 's' | 'S'),
                sticky: matches!(at(8), 't' | 'T'),
            },
            raw: Some(mode.to_string()),
        }
    }

    /// Parse an octal mode of 3 or 4 digits (`755`, `2775`)
    pub(crate) fn from_octal(mode: &str) -> Option<Self> {
        let digits = mode
            .chars()
            .map(|c| c.to_digit(8).map(|d| d as u8))
            .collect::<Option<Vec<u8>>>()?;
        let (special, rest) = match digits.as_slice() {
            [s, rest @ ..] if rest.len() == 3 => (*s, rest),
            rest if rest.len() == 3 => (0, rest),
            _ => return None,
        };
        Some(Self {
            owner: PosixPex::from(rest[0]),
            group: PosixPex::from(rest[1]),
            others: PosixPex::from(rest[2]),
            special: SpecialBits::from(special),
            raw: Some(mode.to_string()),
        })
    }

    /// Permissions known only by their raw text (VMS, NonStop)
    pub(crate) fn raw(raw: impl ToString) -> Self {
        Self {
            raw: Some(raw.to_string()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn posix_pex_from_bits() {
        let pex: PosixPex = PosixPex::from(4);
        assert_eq!(pex.can_read(), true);
        assert_eq!(pex.can_write(), false);
        assert_eq!(pex.can_execute(), false);
        let pex: PosixPex = PosixPex::from(0);
        assert_eq!(pex.can_read(), false);
        assert_eq!(pex.can_write(), false);
        assert_eq!(pex.can_execute(), false);
        let pex: PosixPex = PosixPex::from(3);
        assert_eq!(pex.can_read(), false);
        assert_eq!(pex.can_write(), true);
        assert_eq!(pex.can_execute(), true);
        let pex: PosixPex = PosixPex::from(7);
        assert_eq!(pex.bits(), 7);
    }

    #[test]
    fn should_parse_symbolic_mode() {
        let pex = Permissions::from_symbolic("-rw-rw-r--");
        assert_eq!(pex.mode(), 0o664);
        assert_eq!(pex.raw.as_deref(), Some("-rw-rw-r--"));
        // Setuid bit
        let pex = Permissions::from_symbolic("drws------");
        assert_eq!(pex.special.setuid, true);
        assert_eq!(pex.query(PosixPexQuery::Owner).can_execute(), true);
        let pex = Permissions::from_symbolic("drwS------");
        assert_eq!(pex.special.setuid, true);
        assert_eq!(pex.query(PosixPexQuery::Owner).can_execute(), false);
        // Setgid bit
        let pex = Permissions::from_symbolic("drwx--s---");
        assert_eq!(pex.mode(), 0o2710);
        let pex = Permissions::from_symbolic("drwx--S---");
        assert_eq!(pex.query(PosixPexQuery::Group).can_execute(), false);
        // Sticky bit
        let pex = Permissions::from_symbolic("drwx-----t");
        assert_eq!(pex.mode(), 0o1701);
        let pex = Permissions::from_symbolic("drwx--S--T");
        assert_eq!(pex.mode(), 0o3700);
    }

    #[test]
    fn should_tolerate_short_symbolic_mode() {
        let pex = Permissions::from_symbolic("-rw");
        assert_eq!(pex.mode(), 0o600);
    }

    #[test]
    fn should_parse_octal_mode() {
        assert_eq!(Permissions::from_octal("755").unwrap().mode(), 0o755);
        let pex = Permissions::from_octal("2775").unwrap();
        assert_eq!(pex.special.setgid, true);
        assert_eq!(pex.mode(), 0o2775);
        assert!(Permissions::from_octal("00").is_none());
        assert!(Permissions::from_octal("789").is_none());
        assert!(Permissions::from_octal("12345").is_none());
    }
}
