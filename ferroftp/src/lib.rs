#![crate_name = "ferroftp"]
#![crate_type = "lib"]

//! # ferroftp
//!
//! ferroftp is the core of a synchronous FTP/FTPS client.
//! It takes care of the parts of FTP which are hard to get right:
//!
//! - a control session which reconnects by itself, drops stale replies and remembers what the
//!   server supports
//! - data channels in every passive and active flavour, with NAT workarounds
//! - chunked transfers which resume when the data connection is reset
//! - a parser for the **LIST** output of many server families (Unix, Windows, VMS, OS/400, zOS,
//!   NonStop) and for **MLSD**
//! - connected clones of a session, to run work in parallel
//!
//! ## Get started
//!
//! To get started, first add **ferroftp** to your dependencies:
//!
//! ```toml
//! ferroftp = "^0.1"
//! ```
//!
//! ### Features
//!
//! #### SSL/TLS Support
//!
//! If you want to enable **support for FTPS**, you must enable the `native-tls` or `rustls` feature in your cargo dependencies, based on the TLS provider you prefer.
//!
//! ```toml
//! ferroftp = { version = "^0.1", features = ["native-tls"] }
//! # or
//! ferroftp = { version = "^0.1", features = ["rustls"] }
//! ```
//!
//! > 💡 If you don't know what to choose, `native-tls` should be preferred for compatibility reasons.
//!
//! ## Usage
//!
//! Here is a basic usage example:
//!
//! ```rust,no_run
//! use ferroftp::{ConnectionConfig, FtpSession, ListingOptions, TransferEngine, UploadMode};
//! use std::io::Cursor;
//!
//! let config = ConnectionConfig::new("127.0.0.1")
//!     .with_port(10021)
//!     .with_credentials("test", "test");
//! let mut session = FtpSession::new(config);
//! session.connect().unwrap();
//!
//! let mut reader = Cursor::new(b"hello, world!".to_vec());
//! TransferEngine::new(&mut session)
//!     .upload(&mut reader, "hello.txt", UploadMode::Overwrite)
//!     .unwrap();
//! for entry in session.get_listing("", ListingOptions::default()).unwrap() {
//!     println!("{} {}", entry.kind(), entry.full_path());
//! }
//!
//! // Disconnect from server
//! session.disconnect();
//! ```
//!
//! ## FTPS
//!
//! Set the encryption mode in the configuration and give the session a connector of your
//! TLS provider. The data channels are encrypted as well, unless disabled in the configuration.
//!
//! ### FTPS Usage
//!
//! ```rust,ignore
//! use ferroftp::native_tls::TlsConnector;
//! use ferroftp::{ConnectionConfig, EncryptionMode, NativeTlsConnector, NativeTlsFtpSession};
//!
//! let config = ConnectionConfig::new("test.rebex.net")
//!     .with_credentials("demo", "password")
//!     .with_encryption_mode(EncryptionMode::Explicit);
//! let mut session = NativeTlsFtpSession::new(config)
//!     .with_tls(NativeTlsConnector::from(TlsConnector::new().unwrap()));
//! session.connect().unwrap();
//! // Do other secret stuff
//! session.disconnect();
//! ```
//!

#![doc(html_playground_url = "https://play.rust-lang.org")]

// -- common deps
#[macro_use]
extern crate lazy_regex;
#[macro_use]
extern crate log;

// -- private
mod cancel;
mod capability;
pub(crate) mod command;
mod config;
mod log_sink;
mod regex;
mod session;
mod status;
#[cfg(test)]
mod mock_server;
#[cfg(test)]
mod test_container;

// -- public
pub mod list;
pub mod types;

// -- secure deps
#[cfg(feature = "native-tls")]
pub extern crate native_tls_crate as native_tls;
#[cfg(feature = "rustls")]
pub extern crate rustls_crate as rustls;

// -- export
pub use cancel::CancellationToken;
pub use capability::{Capability, CapabilitySet, Features, HashAlgorithm};
pub use command::{AuthMechanism, Command, ProtectionLevel};
pub use config::{ConnectionConfig, DataMode, EncryptionMode, IpVersion, TextEncoding};
pub use list::{Dialect, DirectoryEntry, EntryKind, ListingParser};
pub use log_sink::{LogCrateSink, LogSink, SharedLogSink};
#[cfg(feature = "native-tls")]
pub use session::{NativeTlsConnector, NativeTlsStream};
#[cfg(feature = "rustls")]
pub use session::{RustlsConnector, RustlsStream};
pub use session::{
    CertificateValidator, ControlSession, DataChannel, DataChannelNegotiator, DataStream,
    DirectTransport, ListingOptions, NoTlsStream, SessionCloner, SessionState, TlsConnector,
    TlsStream, TransferEngine, Transport, UploadMode,
};
pub use status::{ReplyKind, Status};
pub use types::{FileType, FormatControl, FtpError, FtpResult, Reply, TransferOutcome};

// -- type aliases

/// A session on a plain connection
pub type FtpSession = ControlSession<NoTlsStream>;
/// A session which may be secured with rustls
#[cfg(feature = "rustls")]
pub type RustlsFtpSession = ControlSession<RustlsStream>;
/// A session which may be secured with native-tls
#[cfg(feature = "native-tls")]
pub type NativeTlsFtpSession = ControlSession<NativeTlsStream>;

// -- test logging
#[cfg(test)]
pub fn log_init() {
    let _ = env_logger::builder().is_test(true).try_init();
}
