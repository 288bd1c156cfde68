//! # Tls
//!
//! Tls wrappers

use std::fmt::Debug;
use std::io::{Read, Write};
use std::net::TcpStream;

#[cfg(feature = "native-tls")]
mod native_tls;
#[cfg(feature = "native-tls")]
pub use self::native_tls::{NativeTlsConnector, NativeTlsStream};

#[cfg(feature = "rustls")]
mod rustls;
#[cfg(feature = "rustls")]
pub use self::rustls::{RustlsConnector, RustlsStream};

use crate::FtpResult;

/// Decides whether the certificate presented by the server, DER encoded, is trusted.
///
/// Returning `false` aborts the connection with [`crate::FtpError::SecurityNegotiation`].
pub type CertificateValidator = dyn Fn(&[u8]) -> bool + Send + Sync;

/// Wraps a plain TCP stream into a TLS stream, performing the handshake
pub trait TlsConnector: Debug + Send + Sync {
    type Stream: TlsStream;

    fn connect(&self, domain: &str, stream: TcpStream) -> FtpResult<Self::Stream>;
}

/// A trait for a TLS stream.
///
/// This kind of stream is used both on the control connection and on data channels.
pub trait TlsStream: Debug + Send {
    type InnerStream: Read + Write;

    /// Get ref to underlying tcp stream
    fn get_ref(&self) -> &TcpStream;

    /// Get mutable reference to tls stream
    fn mut_ref(&mut self) -> &mut Self::InnerStream;

    /// Certificate presented by the server, DER encoded
    fn peer_certificate(&self) -> Option<Vec<u8>>;
}

/// Stream type of sessions which can't be secured. It can't be instantiated.
#[derive(Debug)]
pub enum NoTlsStream {}

impl TlsStream for NoTlsStream {
    type InnerStream = TcpStream;

    fn get_ref(&self) -> &TcpStream {
        match *self {}
    }

    fn mut_ref(&mut self) -> &mut Self::InnerStream {
        match *self {}
    }

    fn peer_certificate(&self) -> Option<Vec<u8>> {
        match *self {}
    }
}
