//! # Native tls
//!
//! Native tls implementation of TLS types

use std::net::TcpStream;

use native_tls::{TlsConnector as NativeConnector, TlsStream as NativeStream};

use super::{TlsConnector, TlsStream};
use crate::{FtpError, FtpResult};

#[derive(Debug)]
/// A Wrapper for the tls connector
pub struct NativeTlsConnector {
    connector: NativeConnector,
}

impl From<NativeConnector> for NativeTlsConnector {
    fn from(connector: NativeConnector) -> Self {
        Self { connector }
    }
}

impl TlsConnector for NativeTlsConnector {
    type Stream = NativeTlsStream;

    fn connect(&self, domain: &str, stream: TcpStream) -> FtpResult<Self::Stream> {
        self.connector
            .connect(domain, stream)
            .map(NativeTlsStream::from)
            .map_err(|e| FtpError::SecurityNegotiation(e.to_string()))
    }
}

// -- tls stream wrapper to implement drop...

/// Tls stream wrapper. The TLS session is shut down when dropped.
#[derive(Debug)]
pub struct NativeTlsStream {
    stream: NativeStream<TcpStream>,
}

impl TlsStream for NativeTlsStream {
    type InnerStream = NativeStream<TcpStream>;

    /// Get ref to underlying tcp stream
    fn get_ref(&self) -> &TcpStream {
        self.stream.get_ref()
    }

    /// Get mutable reference to tls stream
    fn mut_ref(&mut self) -> &mut Self::InnerStream {
        &mut self.stream
    }

    fn peer_certificate(&self) -> Option<Vec<u8>> {
        match self.stream.peer_certificate() {
            Ok(Some(cert)) => cert.to_der().ok(),
            Ok(None) => None,
            Err(err) => {
                error!("Failed to get peer certificate: {}", err);
                None
            }
        }
    }
}

impl From<NativeStream<TcpStream>> for NativeTlsStream {
    fn from(stream: NativeStream<TcpStream>) -> Self {
        Self { stream }
    }
}

impl Drop for NativeTlsStream {
    fn drop(&mut self) {
        if let Err(err) = self.stream.shutdown() {
            error!("Failed to shutdown stream: {}", err);
        } else {
            debug!("TLS Stream shut down");
        }
    }
}
