//! # Types
//!
//! Replies, transfer outcomes and the error type shared by every component

use std::fmt;
use std::io;

use thiserror::Error;

use crate::status::{ReplyKind, Status};

/// A shorthand for a Result whose error type is always an FtpError.
pub type FtpResult<T> = std::result::Result<T, FtpError>;

/// `FtpError` is a library-global error type to describe the different kinds of
/// errors that might occur while using FTP.
#[derive(Debug, Error)]
pub enum FtpError {
    /// Could not open the control connection (resolve, TCP connect or greeting)
    #[error("Connection failed: {0}")]
    ConnectFailure(io::Error),
    /// The control connection broke while in use. The session is now disconnected
    /// and the next command reconnects it.
    #[error("Connection error: {0}")]
    ConnectionError(io::Error),
    /// A connect, accept or read did not complete in time
    #[error("Operation timed out")]
    Timeout,
    /// TLS handshake failed or the certificate was rejected
    #[error("Security negotiation failed: {0}")]
    SecurityNegotiation(String),
    /// The server refused the credentials
    #[error("Authentication failed: {0}")]
    AuthFailure(Reply),
    /// The server answered a command with a negative reply
    #[error("Command failed: {0}")]
    CommandFailure(Reply),
    /// A reply could not be understood (passive address, PWD path, ...)
    #[error("Malformed reply: {0}")]
    ProtocolParse(String),
    /// The data channel failed in the middle of a transfer
    #[error("Transfer failed: {0}")]
    Transfer(io::Error),
    /// The local source or destination of a transfer failed
    #[error("Local resource error: {0}")]
    LocalResource(io::Error),
    /// The operation was cancelled through its cancellation token
    #[error("Operation cancelled")]
    Cancelled,
    /// The connection configuration can't be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The operation requires a connected session
    #[error("Not connected")]
    NotConnected,
}

impl FtpError {
    /// Map an I/O error raised on the control connection
    pub(crate) fn connection(err: io::Error) -> Self {
        if is_timeout(&err) {
            Self::Timeout
        } else {
            Self::ConnectionError(err)
        }
    }

    /// Map an I/O error raised while establishing a connection
    pub(crate) fn connect(err: io::Error) -> Self {
        if is_timeout(&err) {
            Self::Timeout
        } else {
            Self::ConnectFailure(err)
        }
    }

    /// Map an I/O error raised on a data channel
    pub(crate) fn transfer(err: io::Error) -> Self {
        if is_timeout(&err) {
            Self::Timeout
        } else {
            Self::Transfer(err)
        }
    }

    /// Returns the reply carried by the error, if any
    pub fn reply(&self) -> Option<&Reply> {
        match self {
            Self::AuthFailure(reply) | Self::CommandFailure(reply) => Some(reply),
            _ => None,
        }
    }
}

/// Whether an io error is the result of a socket timeout
pub(crate) fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

/// A complete reply read from the control connection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    code: String,
    message: String,
    info: Vec<String>,
}

impl Reply {
    /// Instantiates a new `Reply`
    pub fn new(code: impl ToString, message: impl ToString) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            info: Vec::new(),
        }
    }

    /// Set the lines received before the final line of the reply
    pub fn with_info(mut self, info: Vec<String>) -> Self {
        self.info = info;
        self
    }

    /// The three digit reply code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Text of the final reply line, without the code
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Lines preceding the final reply line, in order
    pub fn info(&self) -> &[String] {
        &self.info
    }

    /// Classification of the reply
    pub fn kind(&self) -> ReplyKind {
        ReplyKind::from_code(&self.code)
    }

    /// Whether the reply is a 1xx, 2xx or 3xx reply
    pub fn is_success(&self) -> bool {
        self.kind().is_success()
    }

    /// Maps the code onto a well-known status
    pub fn status(&self) -> Status {
        Status::from(self.code.parse::<u32>().unwrap_or_default())
    }

    /// Turn a negative reply into a [`FtpError::CommandFailure`]
    pub(crate) fn into_result(self) -> FtpResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FtpError::CommandFailure(self))
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Result of a transfer which may soft-fail when the remote file doesn't exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// All bytes were moved and the server confirmed the transfer
    Success {
        /// Bytes moved by this call, resume restarts included
        bytes: u64,
    },
    /// The server said the remote file does not exist
    NotFound(Reply),
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Bytes transferred, zero when the file was not found
    pub fn bytes(&self) -> u64 {
        match self {
            Self::Success { bytes } => *bytes,
            Self::NotFound(_) => 0,
        }
    }
}

/// Text Format Control used in `TYPE` command
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormatControl {
    /// Default text format control (is NonPrint)
    Default,
    /// Non-print (not destined for printing)
    NonPrint,
    /// Telnet format control (\<CR\>, \<FF\>, etc.)
    Telnet,
    /// ASA (Fortran) Carriage Control
    Asa,
}

/// File Type used in `TYPE` command
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileType {
    /// ASCII text (the argument is the text format control)
    Ascii(FormatControl),
    /// EBCDIC text (the argument is the text format control)
    Ebcdic(FormatControl),
    /// Image,
    Image,
    /// Binary (the synonym to Image)
    Binary,
    /// Local format (the argument is the number of bits in one byte on local machine)
    Local(u8),
}

impl fmt::Display for FormatControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatControl::Default | FormatControl::NonPrint => write!(f, "N"),
            FormatControl::Telnet => write!(f, "T"),
            FormatControl::Asa => write!(f, "C"),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileType::Ascii(fc) => write!(f, "A {fc}"),
            FileType::Ebcdic(fc) => write!(f, "E {fc}"),
            FileType::Image | FileType::Binary => write!(f, "I"),
            FileType::Local(bits) => write!(f, "L {bits}"),
        }
    }
}
