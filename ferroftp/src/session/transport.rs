//! # Transport
//!
//! Strategy opening the sockets of a session before any FTP byte is exchanged.
//! Proxies (HTTP CONNECT, SOCKS, `user@host`) are implementations of [`Transport`].

use std::fmt::Debug;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::IpVersion;

/// Opens the control connection and the passive data connections of a session
pub trait Transport: Debug + Send + Sync {
    /// Connect to the FTP server. The returned stream is the one the greeting is read from.
    fn connect(
        &self,
        host: &str,
        port: u16,
        ip_version: IpVersion,
        timeout: Duration,
    ) -> io::Result<TcpStream>;

    /// Connect to the address advertised for a passive data channel
    fn connect_data(&self, addr: SocketAddr, timeout: Duration) -> io::Result<TcpStream> {
        TcpStream::connect_timeout(&addr, timeout)
    }

    /// Whether the connection goes through a proxy. Proxies may truncate uploads, so the
    /// transfer engine verifies the remote size after each upload.
    fn is_proxy(&self) -> bool {
        false
    }
}

/// Connects straight to the server
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectTransport;

impl Transport for DirectTransport {
    fn connect(
        &self,
        host: &str,
        port: u16,
        ip_version: IpVersion,
        timeout: Duration,
    ) -> io::Result<TcpStream> {
        let addresses = resolve(host, port, ip_version)?;
        let mut last_error = None;
        for addr in addresses {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok(stream),
                Err(err) => last_error = Some(err),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("{host} resolves to no address usable with {ip_version:?}"),
            )
        }))
    }
}

/// Resolve `host` keeping only the addresses allowed by `ip_version`, in resolver order
pub(crate) fn resolve(host: &str, port: u16, ip_version: IpVersion) -> io::Result<Vec<SocketAddr>> {
    Ok((host, port)
        .to_socket_addrs()?
        .filter(|addr| match ip_version {
            IpVersion::Any => true,
            IpVersion::V4 => addr.is_ipv4(),
            IpVersion::V6 => addr.is_ipv6(),
        })
        .collect())
}

#[cfg(test)]
mod test {

    use std::net::TcpListener;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_resolve_by_ip_version() {
        let addresses = resolve("127.0.0.1", 21, IpVersion::V4).unwrap();
        assert_eq!(addresses, vec!["127.0.0.1:21".parse::<SocketAddr>().unwrap()]);
        assert!(resolve("127.0.0.1", 21, IpVersion::V6).unwrap().is_empty());
        assert_eq!(resolve("127.0.0.1", 21, IpVersion::Any).unwrap().len(), 1);
    }

    #[test]
    fn should_connect_directly() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let stream = DirectTransport
            .connect("127.0.0.1", port, IpVersion::Any, Duration::from_secs(5))
            .unwrap();
        assert_eq!(stream.peer_addr().unwrap().port(), port);
        assert!(!DirectTransport.is_proxy());
    }

    #[test]
    fn should_fail_without_usable_address() {
        let err = DirectTransport
            .connect("127.0.0.1", 21, IpVersion::V6, Duration::from_secs(1))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrNotAvailable);
    }
}
