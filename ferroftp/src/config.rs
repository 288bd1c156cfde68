//! # Config
//!
//! Connection settings for a control session and its data channels

use std::time::Duration;

use crate::types::{FtpError, FtpResult};

/// Default FTP control port
pub const DEFAULT_PORT: u16 = 21;
/// Default implicit FTPS control port
pub const DEFAULT_IMPLICIT_TLS_PORT: u16 = 990;

/// Address family used to resolve the server host
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum IpVersion {
    /// Any resolved address, in resolver order
    #[default]
    Any,
    V4,
    V6,
}

/// How data channels are negotiated
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DataMode {
    /// `EPSV`, falling back to `PASV` when refused on an IPv4 connection
    #[default]
    AutoPassive,
    /// `EPSV` only
    ExtendedPassive,
    /// `PASV`; unroutable advertised addresses are replaced by the control host
    Passive,
    /// `PASV`, always connecting to the advertised address
    PassiveAllowUnroutable,
    /// `PASV`, always connecting to the control host (NAT workaround)
    PassiveIgnoreHost,
    /// `EPRT`, falling back to `PORT` when refused on an IPv4 connection
    AutoActive,
    /// `EPRT` only
    ExtendedActive,
    /// `PORT`
    Active,
}

impl DataMode {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::AutoActive | Self::ExtendedActive | Self::Active)
    }

    pub fn is_passive(&self) -> bool {
        !self.is_active()
    }
}

/// Encryption of the control connection
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum EncryptionMode {
    /// Plain FTP
    #[default]
    None,
    /// `AUTH TLS` (or `AUTH SSL`) after the greeting
    Explicit,
    /// TLS from the first byte
    Implicit,
    /// Try explicit TLS, stay in plain text if the server refuses it
    Auto,
}

/// Text encoding for paths on the control connection
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// 7 bit ASCII; non ASCII characters are sent as `?` and received bytes as latin-1
    #[default]
    Ascii,
    Utf8,
}

impl TextEncoding {
    /// Encode a string for the wire
    pub fn encode(&self, s: &str) -> Vec<u8> {
        match self {
            Self::Ascii => s
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
            Self::Utf8 => s.as_bytes().to_vec(),
        }
    }

    /// Decode bytes read from the wire
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Ascii => bytes.iter().map(|b| char::from(*b)).collect(),
            Self::Utf8 => String::from_utf8_lossy(bytes).to_string(),
        }
    }
}

/// Connection settings.
///
/// Mutable until the session connects; clones receive a verbatim copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub ip_version: IpVersion,
    pub data_mode: DataMode,
    pub encryption_mode: EncryptionMode,
    /// Protect data channels (`PBSZ 0`, `PROT P`) when the control channel is encrypted
    pub data_channel_encryption: bool,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub data_connect_timeout: Duration,
    pub data_read_timeout: Duration,
    /// Bytes moved per read/write in a transfer
    pub chunk_size: usize,
    /// How often a blocking wait (active accept) wakes up to check for cancellation
    pub socket_poll_interval: Duration,
    /// Discard unsolicited replies found on the control socket and reconnect before a command
    pub stale_data_check: bool,
    /// Skip `QUIT` on disconnect
    pub ungraceful_disconnect: bool,
    /// Query `FEAT` after login
    pub check_capabilities: bool,
    /// TCP keep-alive on the control and data sockets
    pub keep_alive: bool,
    /// Pinned text encoding; `None` selects UTF-8 when the server advertises it
    pub encoding: Option<TextEncoding>,
    /// Passive ports never to connect to; the server is asked for another one
    pub passive_blocked_ports: Vec<u16>,
    pub max_passive_attempts: usize,
    /// Maximum number of links followed when dereferencing a symbolic link
    pub max_dereference_depth: usize,
    /// Record length used to compute zOS member sizes
    pub zos_lrecl: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            username: "anonymous".to_string(),
            password: "anonymous".to_string(),
            ip_version: IpVersion::default(),
            data_mode: DataMode::default(),
            encryption_mode: EncryptionMode::default(),
            data_channel_encryption: true,
            connect_timeout: Duration::from_secs(15),
            read_timeout: Duration::from_secs(15),
            data_connect_timeout: Duration::from_secs(15),
            data_read_timeout: Duration::from_secs(15),
            chunk_size: 65536,
            socket_poll_interval: Duration::from_millis(100),
            stale_data_check: true,
            ungraceful_disconnect: false,
            check_capabilities: true,
            keep_alive: false,
            encoding: None,
            passive_blocked_ports: Vec::new(),
            max_passive_attempts: 100,
            max_dereference_depth: 20,
            zos_lrecl: 80,
        }
    }
}

impl ConnectionConfig {
    /// Configuration for `host` with the default port and anonymous credentials
    pub fn new(host: impl ToString) -> Self {
        Self {
            host: host.to_string(),
            ..Default::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credentials(mut self, username: impl ToString, password: impl ToString) -> Self {
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    pub fn with_ip_version(mut self, ip_version: IpVersion) -> Self {
        self.ip_version = ip_version;
        self
    }

    pub fn with_data_mode(mut self, data_mode: DataMode) -> Self {
        self.data_mode = data_mode;
        self
    }

    /// Set the encryption mode. Selecting implicit TLS on the default port moves to port 990.
    pub fn with_encryption_mode(mut self, encryption_mode: EncryptionMode) -> Self {
        if encryption_mode == EncryptionMode::Implicit && self.port == DEFAULT_PORT {
            self.port = DEFAULT_IMPLICIT_TLS_PORT;
        }
        self.encryption_mode = encryption_mode;
        self
    }

    pub fn with_data_channel_encryption(mut self, enabled: bool) -> Self {
        self.data_channel_encryption = enabled;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_data_connect_timeout(mut self, timeout: Duration) -> Self {
        self.data_connect_timeout = timeout;
        self
    }

    pub fn with_data_read_timeout(mut self, timeout: Duration) -> Self {
        self.data_read_timeout = timeout;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_socket_poll_interval(mut self, interval: Duration) -> Self {
        self.socket_poll_interval = interval;
        self
    }

    pub fn with_stale_data_check(mut self, enabled: bool) -> Self {
        self.stale_data_check = enabled;
        self
    }

    pub fn with_ungraceful_disconnect(mut self, enabled: bool) -> Self {
        self.ungraceful_disconnect = enabled;
        self
    }

    pub fn with_check_capabilities(mut self, enabled: bool) -> Self {
        self.check_capabilities = enabled;
        self
    }

    pub fn with_keep_alive(mut self, enabled: bool) -> Self {
        self.keep_alive = enabled;
        self
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn with_passive_blocked_ports(mut self, ports: Vec<u16>) -> Self {
        self.passive_blocked_ports = ports;
        self
    }

    pub fn with_max_passive_attempts(mut self, attempts: usize) -> Self {
        self.max_passive_attempts = attempts;
        self
    }

    pub fn with_max_dereference_depth(mut self, depth: usize) -> Self {
        self.max_dereference_depth = depth;
        self
    }

    pub fn with_zos_lrecl(mut self, lrecl: u64) -> Self {
        self.zos_lrecl = lrecl;
        self
    }

    /// Check the configuration can be used to connect
    pub fn validate(&self) -> FtpResult<()> {
        if self.host.trim().is_empty() {
            return Err(FtpError::InvalidConfig("host is empty".to_string()));
        }
        if self.port == 0 {
            return Err(FtpError::InvalidConfig("port is 0".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(FtpError::InvalidConfig("chunk size is 0".to_string()));
        }
        if self.max_passive_attempts == 0 {
            return Err(FtpError::InvalidConfig(
                "max passive attempts is 0".to_string(),
            ));
        }
        if self.socket_poll_interval.is_zero() {
            return Err(FtpError::InvalidConfig(
                "socket poll interval is 0".to_string(),
            ));
        }
        Ok(())
    }
}
