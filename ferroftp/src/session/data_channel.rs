//! # Data channel
//!
//! Negotiation of the secondary connection carrying transfers and listings

use std::io::{self, Read, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use super::{ControlSession, DataStream, TlsStream, apply_keep_alive};
use crate::capability::Capability;
use crate::command::Command;
use crate::config::DataMode;
use crate::regex::{EPSV_PORT_RE, PASV_PORT_RE, UNROUTABLE_IPV4_RE};
use crate::status::{ReplyKind, Status};
use crate::types::{FtpError, FtpResult, Reply};

/// An open data connection, bound to the command which opened it.
///
/// Must be handed back to [`ControlSession::close_data_channel`] to read the final reply of the
/// command. A channel dropped without being closed leaves that reply pending on the session,
/// and it is consumed before the next command.
#[derive(Debug)]
pub struct DataChannel<T>
where
    T: TlsStream,
{
    /// `None` when the server had nothing to send (`NLST` on an empty directory)
    stream: Option<DataStream<T>>,
    local_addr: Option<SocketAddr>,
    peer_addr: Option<SocketAddr>,
    reply: Reply,
    encrypted: bool,
    restart: u64,
    awaiting_reply: bool,
    pending: Arc<AtomicBool>,
    closed: bool,
}

impl<T> DataChannel<T>
where
    T: TlsStream,
{
    /// Reply of the server to the command owning the channel
    pub fn reply(&self) -> &Reply {
        &self.reply
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Whether the data is encrypted
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Offset the transfer restarted at
    pub fn restart(&self) -> u64 {
        self.restart
    }

    /// Whether the server sent no data connection at all
    pub fn is_empty(&self) -> bool {
        self.stream.is_none()
    }

    /// Returns a reference to the underlying [`TcpStream`]
    pub fn get_ref(&self) -> Option<&TcpStream> {
        self.stream.as_ref().map(|stream| stream.get_ref())
    }
}

impl<T> Read for DataChannel<T>
where
    T: TlsStream,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.stream.as_mut() {
            Some(stream) => stream.read(buf),
            None => Ok(0),
        }
    }
}

impl<T> Write for DataChannel<T>
where
    T: TlsStream,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.stream.as_mut() {
            Some(stream) => stream.write(buf),
            None => Err(io::ErrorKind::NotConnected.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream.as_mut() {
            Some(stream) => stream.flush(),
            None => Ok(()),
        }
    }
}

impl<T> Drop for DataChannel<T>
where
    T: TlsStream,
{
    fn drop(&mut self) {
        if !self.closed && self.awaiting_reply {
            self.pending.store(true, Ordering::SeqCst);
        }
    }
}

/// Outcome of the command owning a data channel
enum Requested {
    /// The server is about to use the data connection
    Accepted(Reply),
    /// `NLST` found nothing; the data connection won't be used
    NoFiles(Reply),
}

/// Opens the data channel of a command, in the mode configured on the session
pub struct DataChannelNegotiator<'a, T>
where
    T: TlsStream,
{
    session: &'a mut ControlSession<T>,
}

impl<'a, T> DataChannelNegotiator<'a, T>
where
    T: TlsStream,
{
    pub fn new(session: &'a mut ControlSession<T>) -> Self {
        Self { session }
    }

    /// Open the data channel and send `command` over the control connection.
    ///
    /// With `restart` above zero, `REST` is sent before the command.
    pub fn open(mut self, command: Command, restart: u64) -> FtpResult<DataChannel<T>> {
        if !command.opens_data_channel() && !matches!(command, Command::Custom(_)) {
            self.session
                .log()
                .warn(format!("{} doesn't use a data channel", command.masked()));
        }
        self.session.prepare()?;
        let control = self.session.control_stream()?;
        let local = control.local_addr().map_err(FtpError::connection)?;
        let peer = control.peer_addr().map_err(FtpError::connection)?;
        let mode = self.session.config.data_mode;
        self.session.log().debug(format!(
            "Opening data channel for {} in {mode:?} mode",
            command.masked()
        ));
        if mode.is_active() {
            self.open_active(command, restart, local)
        } else {
            self.open_passive(command, restart, peer)
        }
    }

    // -- passive

    fn open_passive(
        &mut self,
        command: Command,
        restart: u64,
        peer: SocketAddr,
    ) -> FtpResult<DataChannel<T>> {
        let stream = self.connect_passive(&command, peer)?;
        match self.request(&command, restart)? {
            Requested::Accepted(reply) => self.into_channel(stream, reply, restart),
            Requested::NoFiles(reply) => Ok(self.empty_channel(reply, restart)),
        }
    }

    /// Request a passive address until its port is not blocked, then connect to it
    fn connect_passive(&mut self, command: &Command, peer: SocketAddr) -> FtpResult<TcpStream> {
        let attempts = self.session.config.max_passive_attempts;
        for attempt in 1..=attempts {
            let addr = self.passive_address(command, peer)?;
            if self
                .session
                .config
                .passive_blocked_ports
                .contains(&addr.port())
            {
                self.session.log().debug(format!(
                    "Passive port {} is blocked (attempt {attempt}/{attempts})",
                    addr.port()
                ));
                continue;
            }
            self.session
                .log()
                .debug(format!("Connecting to passive address {addr}"));
            let timeout = self.session.config.data_connect_timeout;
            return self
                .session
                .transport()
                .connect_data(addr, timeout)
                .map_err(FtpError::connect);
        }
        Err(FtpError::ConnectFailure(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no usable passive port after {attempts} attempts"),
        )))
    }

    /// Ask the server for a passive address, with `EPSV` or `PASV`
    fn passive_address(&mut self, command: &Command, peer: SocketAddr) -> FtpResult<SocketAddr> {
        let mode = self.session.config.data_mode;
        let use_epsv = match mode {
            DataMode::ExtendedPassive => true,
            DataMode::AutoPassive => !self.session.epsv_unsupported || peer.is_ipv6(),
            _ => peer.is_ipv6(),
        };
        if use_epsv {
            let reply = self.session.exchange(Command::Epsv)?;
            if reply.is_success() {
                let port = parse_epsv_port(&reply)?;
                return Ok(SocketAddr::new(peer.ip(), port));
            }
            if mode == DataMode::AutoPassive
                && peer.is_ipv4()
                && reply.kind() == ReplyKind::PermanentNegative
            {
                self.session
                    .log()
                    .info(format!("EPSV refused ({reply}); falling back to PASV"));
                self.session.epsv_unsupported = true;
            } else {
                return Err(FtpError::CommandFailure(reply));
            }
        }

        if self.session.capabilities.has(Capability::Pret) {
            self.session
                .exchange(Command::Pret(command.to_string()))?
                .into_result()?;
        }
        let reply = self.session.exchange(Command::Pasv)?.into_result()?;
        let advertised = parse_passive_address(&reply)?;
        let ip = match mode {
            DataMode::PassiveAllowUnroutable => advertised.ip(),
            DataMode::PassiveIgnoreHost => peer.ip(),
            _ if is_unroutable(&advertised.ip()) => {
                if advertised.ip() != peer.ip() {
                    self.session.log().debug(format!(
                        "Replacing unroutable passive address {} with {}",
                        advertised.ip(),
                        peer.ip()
                    ));
                }
                peer.ip()
            }
            _ => advertised.ip(),
        };
        Ok(SocketAddr::new(ip, advertised.port()))
    }

    // -- active

    fn open_active(
        &mut self,
        command: Command,
        restart: u64,
        local: SocketAddr,
    ) -> FtpResult<DataChannel<T>> {
        self.session.log().debug("Starting local tcp listener...");
        let listener =
            TcpListener::bind(SocketAddr::new(local.ip(), 0)).map_err(FtpError::connect)?;
        listener.set_nonblocking(true).map_err(FtpError::connect)?;
        let addr = listener.local_addr().map_err(FtpError::connect)?;
        self.session
            .log()
            .debug(format!("Active mode, listening on {addr}"));
        self.announce_active(addr)?;

        let reply = match self.request(&command, restart)? {
            Requested::Accepted(reply) => reply,
            Requested::NoFiles(reply) => return Ok(self.empty_channel(reply, restart)),
        };
        let awaiting = reply.kind() == ReplyKind::PositivePreliminary;
        let stream = match self.accept(&listener) {
            Ok(stream) => stream,
            Err(err) => {
                if awaiting {
                    self.session.pending_reply.store(true, Ordering::SeqCst);
                }
                return Err(err);
            }
        };
        self.into_channel(stream, reply, restart)
    }

    /// Tell the server where to connect, with `EPRT` or `PORT`
    fn announce_active(&mut self, addr: SocketAddr) -> FtpResult<()> {
        let mode = self.session.config.data_mode;
        let use_eprt = match mode {
            DataMode::ExtendedActive | DataMode::AutoActive => true,
            _ => addr.is_ipv6(),
        };
        if use_eprt {
            let reply = self.session.exchange(Command::Eprt(format_eprt(addr)))?;
            if reply.is_success() {
                return Ok(());
            }
            if mode == DataMode::AutoActive
                && addr.is_ipv4()
                && reply.kind() == ReplyKind::PermanentNegative
            {
                self.session
                    .log()
                    .info(format!("EPRT refused ({reply}); falling back to PORT"));
            } else {
                return Err(FtpError::CommandFailure(reply));
            }
        }
        self.session
            .exchange(Command::Port(format_port(addr)?))?
            .into_result()
            .map(|_| ())
    }

    /// Wait for the server to connect to `listener`
    fn accept(&self, listener: &TcpListener) -> FtpResult<TcpStream> {
        let config = &self.session.config;
        let start = Instant::now();
        loop {
            self.session.cancel.check()?;
            match listener.accept() {
                Ok((stream, addr)) => {
                    self.session
                        .log()
                        .debug(format!("Server connected from {addr}"));
                    stream.set_nonblocking(false).map_err(FtpError::connect)?;
                    return Ok(stream);
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    if start.elapsed() > config.data_connect_timeout {
                        return Err(FtpError::Timeout);
                    }
                    std::thread::sleep(config.socket_poll_interval);
                }
                Err(err) => return Err(FtpError::connect(err)),
            }
        }
    }

    // -- common

    /// Send `REST` when restarting, then the command owning the channel
    fn request(&mut self, command: &Command, restart: u64) -> FtpResult<Requested> {
        if restart > 0 && self.should_restart(command, restart) {
            self.session
                .exchange(Command::Rest(restart))?
                .into_result()?;
        }
        let reply = self.session.exchange(command.clone())?;
        if reply.is_success() {
            return Ok(Requested::Accepted(reply));
        }
        if matches!(command, Command::Nlst(_))
            && reply.status() == Status::FileUnavailable
            && reply.message().contains("No files found")
        {
            self.session.log().debug("NLST: no files found");
            return Ok(Requested::NoFiles(reply));
        }
        Err(FtpError::CommandFailure(reply))
    }

    /// Proxies may choke on a restart offset past the end of the file
    fn should_restart(&mut self, command: &Command, restart: u64) -> bool {
        if !self.session.transport().is_proxy() {
            return true;
        }
        let Some(path) = command.path() else {
            return true;
        };
        let reply = match self.session.exchange(Command::Size(path.to_string())) {
            Ok(reply) if reply.is_success() => reply,
            _ => return true,
        };
        match crate::regex::SIZE_RE
            .captures(reply.message())
            .and_then(|caps| caps[1].parse::<u64>().ok())
        {
            Some(size) if restart >= size => {
                self.session.log().debug(format!(
                    "Not sending REST {restart}: remote file is {size} bytes"
                ));
                false
            }
            _ => true,
        }
    }

    /// Secure the connected socket if required and wrap it into a channel
    fn into_channel(
        &mut self,
        stream: TcpStream,
        reply: Reply,
        restart: u64,
    ) -> FtpResult<DataChannel<T>> {
        let awaiting = reply.kind() == ReplyKind::PositivePreliminary;
        match self.setup_stream(stream) {
            Ok(stream) => Ok(DataChannel {
                local_addr: stream.get_ref().local_addr().ok(),
                peer_addr: stream.get_ref().peer_addr().ok(),
                encrypted: stream.is_secure(),
                stream: Some(stream),
                reply,
                restart,
                awaiting_reply: awaiting,
                pending: self.session.pending_reply.clone(),
                closed: false,
            }),
            Err(err) => {
                if awaiting {
                    self.session.pending_reply.store(true, Ordering::SeqCst);
                }
                Err(err)
            }
        }
    }

    fn setup_stream(&mut self, stream: TcpStream) -> FtpResult<DataStream<T>> {
        let config = &self.session.config;
        stream
            .set_read_timeout(Some(config.data_read_timeout))
            .and_then(|_| stream.set_write_timeout(Some(config.data_read_timeout)))
            .and_then(|_| apply_keep_alive(&stream, config.keep_alive))
            .map_err(FtpError::connect)?;
        if !(self.session.encrypted && config.data_channel_encryption) {
            return Ok(DataStream::Tcp(stream));
        }
        let connector = self.session.tls.clone().ok_or_else(|| {
            FtpError::SecurityNegotiation("no TLS connector configured".to_string())
        })?;
        let host = config.host.clone();
        let secured = connector.connect(&host, stream)?;
        self.session
            .validate_certificate(secured.peer_certificate())?;
        Ok(DataStream::Ssl(Box::new(secured)))
    }

    fn empty_channel(&self, reply: Reply, restart: u64) -> DataChannel<T> {
        DataChannel {
            stream: None,
            local_addr: None,
            peer_addr: None,
            reply,
            encrypted: false,
            restart,
            awaiting_reply: false,
            pending: self.session.pending_reply.clone(),
            closed: false,
        }
    }
}

impl<T> ControlSession<T>
where
    T: TlsStream,
{
    /// Open a data channel for `command`. See [`DataChannelNegotiator::open`].
    pub fn open_data_channel(
        &mut self,
        command: Command,
        restart: u64,
    ) -> FtpResult<DataChannel<T>> {
        DataChannelNegotiator::new(self).open(command, restart)
    }

    /// Close the data channel and read the final reply of its command
    pub fn close_data_channel(&mut self, mut channel: DataChannel<T>) -> FtpResult<Reply> {
        channel.closed = true;
        // the server won't send the final reply until the data connection is closed
        if let Some(mut stream) = channel.stream.take() {
            if let Err(err) = stream.flush() {
                self.log
                    .warn(format!("Failed to flush data channel: {err}"));
            }
        }
        if !channel.awaiting_reply {
            return Ok(channel.reply.clone());
        }
        if !Arc::ptr_eq(&channel.pending, &self.pending_reply) {
            self.log
                .warn("Data channel belongs to a previous connection");
            return Err(FtpError::NotConnected);
        }
        self.read_reply()?.into_result()
    }
}

/// Address advertised in a `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)` reply
pub(crate) fn parse_passive_address(reply: &Reply) -> FtpResult<SocketAddr> {
    let caps = PASV_PORT_RE
        .captures(reply.message())
        .ok_or_else(|| FtpError::ProtocolParse(format!("PASV reply {reply}")))?;
    let mut numbers = [0u8; 6];
    for (i, number) in numbers.iter_mut().enumerate() {
        *number = caps[i + 1]
            .parse::<u8>()
            .map_err(|_| FtpError::ProtocolParse(format!("PASV reply {reply}")))?;
    }
    let ip = Ipv4Addr::new(numbers[0], numbers[1], numbers[2], numbers[3]);
    let port = (u16::from(numbers[4]) << 8) | u16::from(numbers[5]);
    Ok(SocketAddr::new(ip.into(), port))
}

/// Port of a `229 Entering Extended Passive Mode (|||port|)` reply
pub(crate) fn parse_epsv_port(reply: &Reply) -> FtpResult<u16> {
    EPSV_PORT_RE
        .captures(reply.message())
        .and_then(|caps| caps[1].parse::<u16>().ok())
        .ok_or_else(|| FtpError::ProtocolParse(format!("EPSV reply {reply}")))
}

/// `PORT` argument: `h1,h2,h3,h4,p1,p2`. IPv6 addresses can't be expressed.
pub(crate) fn format_port(addr: SocketAddr) -> FtpResult<String> {
    match addr.ip() {
        IpAddr::V4(ip) => Ok(format!(
            "{},{},{}",
            ip.to_string().replace('.', ","),
            addr.port() / 256,
            addr.port() % 256
        )),
        IpAddr::V6(_) => Err(FtpError::InvalidConfig(format!(
            "PORT can't announce IPv6 address {addr}"
        ))),
    }
}

/// `EPRT` argument: `|1|addr|port|` for IPv4, `|2|addr|port|` for IPv6
pub(crate) fn format_eprt(addr: SocketAddr) -> String {
    let family = if addr.is_ipv4() { 1 } else { 2 };
    format!("|{family}|{}|{}|", addr.ip(), addr.port())
}

/// Whether a server may advertise `ip` from behind a NAT
pub(crate) fn is_unroutable(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ip) => UNROUTABLE_IPV4_RE.is_match(&ip.to_string()),
        IpAddr::V6(_) => false,
    }
}
