//! # Rustls
//!
//! Rustls implementation of tls types

use std::net::TcpStream;
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, StreamOwned};

use super::{TlsConnector, TlsStream};
use crate::{FtpError, FtpResult};

/// A Wrapper for the tls connector
pub struct RustlsConnector {
    connector: Arc<ClientConfig>,
}

impl std::fmt::Debug for RustlsConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<?>")
    }
}

impl From<Arc<ClientConfig>> for RustlsConnector {
    fn from(connector: Arc<ClientConfig>) -> Self {
        Self { connector }
    }
}

impl TlsConnector for RustlsConnector {
    type Stream = RustlsStream;

    fn connect(&self, domain: &str, stream: TcpStream) -> FtpResult<Self::Stream> {
        let server_name = ServerName::try_from(domain.to_string())
            .map_err(|e| FtpError::SecurityNegotiation(e.to_string()))?;
        let connection = ClientConnection::new(Arc::clone(&self.connector), server_name)
            .map_err(|e| FtpError::SecurityNegotiation(e.to_string()))?;
        let mut stream = StreamOwned::new(connection, stream);
        // complete the handshake now, so the certificate can be checked before any command
        while stream.conn.is_handshaking() {
            stream
                .conn
                .complete_io(&mut stream.sock)
                .map_err(|e| FtpError::SecurityNegotiation(e.to_string()))?;
        }
        trace!("TLS handshake with {domain} completed");
        Ok(RustlsStream { stream })
    }
}

// -- tls stream wrapper to implement drop...

/// Tls stream wrapper. It sends `close_notify` when dropped.
#[derive(Debug)]
pub struct RustlsStream {
    stream: StreamOwned<ClientConnection, TcpStream>,
}

impl TlsStream for RustlsStream {
    type InnerStream = StreamOwned<ClientConnection, TcpStream>;

    /// Get ref to underlying tcp stream
    fn get_ref(&self) -> &TcpStream {
        self.stream.get_ref()
    }

    /// Get mutable reference to tls stream
    fn mut_ref(&mut self) -> &mut Self::InnerStream {
        &mut self.stream
    }

    fn peer_certificate(&self) -> Option<Vec<u8>> {
        self.stream
            .conn
            .peer_certificates()
            .and_then(|certs| certs.first())
            .map(|cert| cert.as_ref().to_vec())
    }
}

impl Drop for RustlsStream {
    fn drop(&mut self) {
        self.stream.conn.send_close_notify();
        while self.stream.conn.wants_write() {
            if let Err(err) = self.stream.conn.write_tls(&mut self.stream.sock) {
                debug!("Failed to send close notify: {err}");
                break;
            }
        }
        trace!("TLS stream terminated");
    }
}
