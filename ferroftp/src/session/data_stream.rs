//! # Data Stream
//!
//! This module exposes the stream where bytes must be written to/read from,
//! on the control connection as well as on data channels

use std::io::{Read, Result, Write};
use std::net::TcpStream;

use super::tls::TlsStream;

/// Stream used for communications. It can be both of type Tcp in case of plain communication or Ssl in case of FTPS
#[derive(Debug)]
pub enum DataStream<T>
where
    T: TlsStream,
{
    Tcp(TcpStream),
    Ssl(Box<T>),
}

impl<T> DataStream<T>
where
    T: TlsStream,
{
    /// Returns a reference to the underlying TcpStream.
    pub fn get_ref(&self) -> &TcpStream {
        match self {
            DataStream::Tcp(ref stream) => stream,
            DataStream::Ssl(ref stream) => stream.get_ref(),
        }
    }

    /// Whether the stream is encrypted
    pub fn is_secure(&self) -> bool {
        matches!(self, DataStream::Ssl(_))
    }

    /// Certificate presented by the server; always `None` on a plain stream
    pub fn peer_certificate(&self) -> Option<Vec<u8>> {
        match self {
            DataStream::Tcp(_) => None,
            DataStream::Ssl(ref stream) => stream.peer_certificate(),
        }
    }
}

impl<T> Read for DataStream<T>
where
    T: TlsStream,
{
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self {
            DataStream::Tcp(ref mut stream) => stream.read(buf),
            DataStream::Ssl(ref mut stream) => stream.mut_ref().read(buf),
        }
    }
}

impl<T> Write for DataStream<T>
where
    T: TlsStream,
{
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        match self {
            DataStream::Tcp(ref mut stream) => stream.write(buf),
            DataStream::Ssl(ref mut stream) => stream.mut_ref().write(buf),
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self {
            DataStream::Tcp(ref mut stream) => stream.flush(),
            DataStream::Ssl(ref mut stream) => stream.mut_ref().flush(),
        }
    }
}
