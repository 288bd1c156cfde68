//! # Session
//!
//! The control connection of an FTP session. Data channels, transfers and listings are
//! built on top of it in the child modules.

mod clone;
mod data_channel;
mod data_stream;
mod listing;
mod tls;
mod transfer;
mod transport;

use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::NaiveDateTime;
// export
pub use clone::SessionCloner;
pub use data_channel::{DataChannel, DataChannelNegotiator};
pub use data_stream::DataStream;
pub use listing::ListingOptions;
pub use tls::{CertificateValidator, NoTlsStream, TlsConnector, TlsStream};
#[cfg(feature = "native-tls")]
pub use tls::{NativeTlsConnector, NativeTlsStream};
#[cfg(feature = "rustls")]
pub use tls::{RustlsConnector, RustlsStream};
pub use transfer::{TransferEngine, UploadMode};
pub use transport::{DirectTransport, Transport};

use crate::cancel::CancellationToken;
use crate::capability::{Capability, CapabilitySet};
use crate::command::feat::parse_features;
use crate::command::{AuthMechanism, Command, ProtectionLevel};
use crate::config::{ConnectionConfig, DataMode, EncryptionMode, TextEncoding};
use crate::list::{Dialect, parse_timestamp};
use crate::log_sink::SharedLogSink;
use crate::regex::{PWD_RE, SIZE_RE};
use crate::status::{ReplyKind, Status};
use crate::types::{FileType, FtpError, FtpResult, Reply};

/// Lifecycle of the control connection
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    /// Socket being opened
    Connecting,
    /// The server greeting was read
    Greeted,
    /// `AUTH` or the implicit TLS handshake is in progress
    TlsNegotiating,
    /// Credentials accepted, post-login setup in progress
    Authenticated,
    /// Commands can be executed
    Ready,
}

/// The control connection to an FTP server.
///
/// Every I/O operation borrows the session mutably, so there is never more than one command
/// in flight. Concurrent work requires a clone (see [`ControlSession::try_clone`]).
///
/// A session whose connection broke is marked disconnected; the next command reconnects it.
pub struct ControlSession<T>
where
    T: TlsStream,
{
    config: ConnectionConfig,
    reader: Option<BufReader<DataStream<T>>>,
    state: SessionState,
    tls: Option<Arc<dyn TlsConnector<Stream = T>>>,
    certificate_validator: Option<Arc<CertificateValidator>>,
    /// Certificate accepted on the control connection, DER encoded
    accepted_certificate: Option<Vec<u8>>,
    transport: Arc<dyn Transport>,
    log: SharedLogSink,
    cancel: CancellationToken,
    capabilities: CapabilitySet,
    system_type: Option<String>,
    dialect: Dialect,
    welcome_msg: Option<String>,
    encoding: TextEncoding,
    encrypted: bool,
    epsv_unsupported: bool,
    working_dir: Option<String>,
    /// Set by a data channel dropped before its final reply was read
    pending_reply: Arc<AtomicBool>,
    is_clone: bool,
}

impl<T> ControlSession<T>
where
    T: TlsStream,
{
    /// Create a disconnected session. No I/O is performed until [`Self::connect`].
    pub fn new(config: ConnectionConfig) -> Self {
        let encoding = config.encoding.unwrap_or_default();
        Self {
            config,
            reader: None,
            state: SessionState::Disconnected,
            tls: None,
            certificate_validator: None,
            accepted_certificate: None,
            transport: Arc::new(DirectTransport),
            log: SharedLogSink::default(),
            cancel: CancellationToken::new(),
            capabilities: CapabilitySet::default(),
            system_type: None,
            dialect: Dialect::Unknown,
            welcome_msg: None,
            encoding,
            encrypted: false,
            epsv_unsupported: false,
            working_dir: None,
            pending_reply: Arc::new(AtomicBool::new(false)),
            is_clone: false,
        }
    }

    /// Set the connector used to secure the control connection and the data channels
    pub fn with_tls(mut self, connector: impl TlsConnector<Stream = T> + 'static) -> Self {
        self.tls = Some(Arc::new(connector));
        self
    }

    /// Set the callback deciding whether the server certificate is accepted.
    ///
    /// Without a validator, the verification performed by the TLS provider is final.
    pub fn with_certificate_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&[u8]) -> bool + Send + Sync + 'static,
    {
        self.certificate_validator = Some(Arc::new(validator));
        self
    }

    /// Set the strategy used to open the sockets (e.g. a proxy)
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    pub fn with_log_sink(mut self, log: SharedLogSink) -> Self {
        self.log = log;
        self
    }

    /// Use `token` to cancel the operations of this session
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    // -- accessors

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.reader.is_some()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Capabilities advertised through `FEAT`; empty until connected
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Returns welcome message retrieved from server (if available)
    pub fn welcome_msg(&self) -> Option<&str> {
        self.welcome_msg.as_deref()
    }

    /// `SYST` reply of the server
    pub fn system_type(&self) -> Option<&str> {
        self.system_type.as_deref()
    }

    /// Listing dialect detected after login
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Whether the control connection is encrypted
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    pub fn is_clone(&self) -> bool {
        self.is_clone
    }

    /// Working directory as last reported by `PWD`
    pub fn working_dir(&self) -> Option<&str> {
        self.working_dir.as_deref()
    }

    /// Text encoding currently used on the control connection
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Handle to the token cancelling the operations of this session
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns a reference to the underlying [`TcpStream`] of the control connection
    pub fn get_ref(&self) -> Option<&TcpStream> {
        self.reader.as_ref().map(|reader| reader.get_ref().get_ref())
    }

    /// Enable or disable TCP keep-alive. Applied to the live control socket immediately.
    pub fn set_keep_alive(&mut self, enabled: bool) -> FtpResult<()> {
        self.config.keep_alive = enabled;
        if let Some(stream) = self.get_ref() {
            apply_keep_alive(stream, enabled).map_err(FtpError::connection)?;
        }
        Ok(())
    }

    /// Change the data channel mode; used from the next data channel on
    pub fn set_data_mode(&mut self, mode: DataMode) {
        self.log.debug(format!("Changed data mode to {mode:?}"));
        self.config.data_mode = mode;
    }

    // -- connection

    /// Connect and log in with the configured credentials.
    ///
    /// Runs the whole setup sequence: TLS, login, data protection, `FEAT`, UTF-8, `SYST` and
    /// working directory. On failure the session is left disconnected.
    pub fn connect(&mut self) -> FtpResult<()> {
        self.config.validate()?;
        self.cancel.check()?;
        if self.reader.is_some() {
            self.drop_connection();
        }
        self.state = SessionState::Connecting;
        match self.establish() {
            Ok(()) => Ok(()),
            Err(err) => {
                self.log.error(format!("Failed to connect: {err}"));
                self.drop_connection();
                self.state = SessionState::Disconnected;
                Err(err)
            }
        }
    }

    fn establish(&mut self) -> FtpResult<()> {
        let config = &self.config;
        self.log.info(format!(
            "Connecting to {}:{}",
            config.host, config.port
        ));
        let stream = self
            .transport
            .connect(
                &config.host,
                config.port,
                config.ip_version,
                config.connect_timeout,
            )
            .map_err(FtpError::connect)?;
        stream
            .set_read_timeout(Some(config.read_timeout))
            .and_then(|_| stream.set_write_timeout(Some(config.read_timeout)))
            .and_then(|_| apply_keep_alive(&stream, config.keep_alive))
            .map_err(FtpError::connect)?;
        self.encoding = config.encoding.unwrap_or_default();

        let stream = if config.encryption_mode == EncryptionMode::Implicit {
            self.state = SessionState::TlsNegotiating;
            DataStream::Ssl(Box::new(self.secure(stream)?))
        } else {
            DataStream::Tcp(stream)
        };
        self.encrypted = stream.is_secure();
        self.reader = Some(BufReader::new(stream));

        let greeting = self.read_reply()?;
        if greeting.status() != Status::Ready {
            return Err(FtpError::ConnectFailure(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("unexpected greeting {greeting}"),
            )));
        }
        let mut welcome = greeting.info().to_vec();
        welcome.push(greeting.message().to_string());
        self.welcome_msg = Some(welcome.join("\n"));
        self.state = SessionState::Greeted;
        self.log.debug(format!("Server READY; greeting: {greeting}"));

        if matches!(
            self.config.encryption_mode,
            EncryptionMode::Explicit | EncryptionMode::Auto
        ) {
            self.auth_tls()?;
        }
        let (username, password) = (self.config.username.clone(), self.config.password.clone());
        self.login(&username, &password)?;
        self.setup()?;

        self.state = SessionState::Ready;
        self.log.info(format!(
            "Connected to {}:{} (encrypted: {})",
            self.config.host, self.config.port, self.encrypted
        ));
        Ok(())
    }

    /// Upgrade the control connection with `AUTH TLS`, then `AUTH SSL`
    fn auth_tls(&mut self) -> FtpResult<()> {
        let optional = self.config.encryption_mode == EncryptionMode::Auto;
        if self.tls.is_none() {
            if optional {
                self.log
                    .warn("No TLS connector configured; staying on a plain connection");
                return Ok(());
            }
            return Err(FtpError::SecurityNegotiation(
                "explicit TLS requires a TLS connector".to_string(),
            ));
        }
        self.state = SessionState::TlsNegotiating;
        let mut reply = self.exchange(Command::Auth(AuthMechanism::Tls))?;
        if !reply.is_success() {
            self.log
                .debug(format!("AUTH TLS refused ({reply}); trying AUTH SSL"));
            reply = self.exchange(Command::Auth(AuthMechanism::Ssl))?;
        }
        if !reply.is_success() {
            if optional {
                self.log.warn(format!(
                    "Server refused TLS ({reply}); staying on a plain connection"
                ));
                self.state = SessionState::Greeted;
                return Ok(());
            }
            return Err(FtpError::SecurityNegotiation(format!(
                "server refused TLS: {reply}"
            )));
        }
        let stream = match self.reader.take() {
            Some(reader) => reader.into_inner(),
            None => return Err(FtpError::NotConnected),
        };
        let stream = match stream {
            DataStream::Tcp(stream) => stream,
            secured @ DataStream::Ssl(_) => {
                self.reader = Some(BufReader::new(secured));
                return Ok(());
            }
        };
        let secured = self.secure(stream)?;
        self.reader = Some(BufReader::new(DataStream::Ssl(Box::new(secured))));
        self.encrypted = true;
        self.log.info("Control connection secured");
        Ok(())
    }

    /// Perform the TLS handshake on `stream` and validate the server certificate
    fn secure(&mut self, stream: TcpStream) -> FtpResult<T> {
        let connector = self.tls.clone().ok_or_else(|| {
            FtpError::SecurityNegotiation("no TLS connector configured".to_string())
        })?;
        let secured = connector.connect(&self.config.host, stream)?;
        self.validate_certificate(secured.peer_certificate())?;
        Ok(secured)
    }

    /// Run the certificate validator, unless the certificate was already accepted
    pub(crate) fn validate_certificate(&mut self, certificate: Option<Vec<u8>>) -> FtpResult<()> {
        let Some(certificate) = certificate else {
            return Ok(());
        };
        if self.accepted_certificate.as_ref() == Some(&certificate) {
            self.log.debug("Certificate already accepted");
            return Ok(());
        }
        if let Some(validator) = self.certificate_validator.as_ref() {
            if !validator(&certificate) {
                return Err(FtpError::SecurityNegotiation(
                    "server certificate rejected".to_string(),
                ));
            }
        }
        self.accepted_certificate = Some(certificate);
        Ok(())
    }

    /// Log in to the FTP server.
    pub fn login(&mut self, username: &str, password: &str) -> FtpResult<()> {
        self.log.debug(format!("Signing in with user '{username}'"));
        let mut reply = self.exchange(Command::User(username.to_string()))?;
        if reply.status() == Status::NeedPassword {
            self.log.debug("Password is required");
            reply = self.exchange(Command::Pass(password.to_string()))?;
        }
        if reply.kind() != ReplyKind::PositiveCompletion {
            return Err(FtpError::AuthFailure(reply));
        }
        self.state = SessionState::Authenticated;
        self.log.debug("Login OK");
        Ok(())
    }

    /// Setup following the login
    fn setup(&mut self) -> FtpResult<()> {
        if self.encrypted && self.config.data_channel_encryption {
            self.exchange(Command::Pbsz(0))?.into_result()?;
            self.exchange(Command::Prot(ProtectionLevel::Private))?
                .into_result()?;
        }
        if !self.is_clone && self.config.check_capabilities {
            let reply = self.exchange(Command::Feat)?;
            if reply.is_success() {
                self.capabilities = parse_features(&reply, &self.log);
            } else {
                self.log.debug(format!("FEAT not supported: {reply}"));
            }
        }
        if self.config.encoding.is_none() && self.capabilities.has(Capability::Utf8) {
            let reply = self.exchange(Command::Opts(
                "UTF8".to_string(),
                Some("ON".to_string()),
            ))?;
            if reply.is_success() {
                self.log.debug("Using UTF-8 on the control connection");
                self.encoding = TextEncoding::Utf8;
            }
        }
        if self.system_type.is_none() {
            let reply = self.exchange(Command::Syst)?;
            if reply.is_success() {
                self.system_type = Some(reply.message().to_string());
            }
        }
        self.dialect = Dialect::detect(self.system_type.as_deref(), &self.capabilities);
        self.log
            .debug(format!("Listing dialect is {}", self.dialect));
        match self.working_dir.clone() {
            Some(dir) => {
                let reply = self.exchange(Command::Cwd(dir.clone()))?;
                if !reply.is_success() {
                    self.log
                        .warn(format!("Could not restore working directory {dir}: {reply}"));
                }
            }
            None => {
                let reply = self.exchange(Command::Pwd)?;
                match reply.into_result().and_then(|reply| parse_pwd(&reply)) {
                    Ok(dir) => self.working_dir = Some(dir),
                    Err(err) => self
                        .log
                        .warn(format!("Could not get working directory: {err}")),
                }
            }
        }
        Ok(())
    }

    /// Send `QUIT` (unless the disconnection is ungraceful) and close the socket.
    ///
    /// Errors are logged and never returned.
    pub fn disconnect(&mut self) {
        if self.config.ungraceful_disconnect {
            // reset the connection instead of waiting for the server to close it
            if let Some(stream) = self.get_ref() {
                if let Err(err) = socket2::SockRef::from(stream).set_linger(Some(Duration::ZERO)) {
                    self.log.debug(format!("Could not set linger: {err}"));
                }
            }
        } else if self.reader.is_some() {
            match self.exchange(Command::Quit) {
                Ok(reply) => self.log.debug(format!("Server said goodbye: {reply}")),
                Err(err) => self.log.warn(format!("QUIT failed: {err}")),
            }
        }
        self.drop_connection();
        self.state = SessionState::Disconnected;
        self.log.info("Disconnected");
    }

    // -- command execution

    /// Execute `command` and return its reply.
    ///
    /// A pending transfer reply is consumed first and unsolicited data on the socket forces a
    /// reconnect. A disconnected session is reconnected. Negative replies are returned, not
    /// raised.
    pub fn execute(&mut self, command: Command) -> FtpResult<Reply> {
        self.prepare()?;
        self.exchange(command)
    }

    /// Bring the session to a state where a command can be sent
    pub(crate) fn prepare(&mut self) -> FtpResult<()> {
        self.consume_pending_reply();
        self.cancel.check()?;
        self.discard_stale_data();
        if self.reader.is_none() {
            self.log.info("Session is disconnected; reconnecting");
            self.connect()?;
        }
        Ok(())
    }

    /// Send `command` and read its reply, with no checks
    pub(crate) fn exchange(&mut self, command: Command) -> FtpResult<Reply> {
        self.send(&command)?;
        self.read_reply()
    }

    fn send(&mut self, command: &Command) -> FtpResult<()> {
        self.log.trace(format!("CC OUT: {}", command.masked()));
        let line = command.encode(self.encoding);
        let stream = self
            .reader
            .as_mut()
            .ok_or(FtpError::NotConnected)?
            .get_mut();
        if let Err(err) = stream.write_all(&line).and_then(|_| stream.flush()) {
            self.mark_disconnected(&err);
            return Err(FtpError::connection(err));
        }
        Ok(())
    }

    /// Read a complete reply.
    ///
    /// Lines are read until one made of a 3 digit code followed by a space (or nothing);
    /// the lines before it are the info of the reply, with their `ddd-` prefix stripped.
    pub(crate) fn read_reply(&mut self) -> FtpResult<Reply> {
        let first = self.read_line()?;
        let (code, separator, text) = split_reply_line(&first)
            .ok_or_else(|| FtpError::ProtocolParse(format!("invalid reply line {first:?}")))?;
        if separator != Some('-') {
            return Ok(Reply::new(code, text));
        }
        let mut info = vec![text.to_string()];
        loop {
            let line = self.read_line()?;
            match split_reply_line(&line) {
                Some((code, separator, text)) if separator != Some('-') => {
                    return Ok(Reply::new(code, text).with_info(info));
                }
                Some((_, _, text)) => info.push(text.to_string()),
                None => info.push(line),
            }
        }
    }

    fn read_line(&mut self) -> FtpResult<String> {
        let reader = self.reader.as_mut().ok_or(FtpError::NotConnected)?;
        let mut line = Vec::new();
        match reader.read_until(0x0A, &mut line) {
            Ok(0) => {
                let err = io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by server",
                );
                self.mark_disconnected(&err);
                return Err(FtpError::ConnectionError(err));
            }
            Ok(_) => {}
            Err(err) => {
                self.mark_disconnected(&err);
                return Err(FtpError::connection(err));
            }
        }
        while line.last().is_some_and(|b| *b == b'\n' || *b == b'\r') {
            line.pop();
        }
        let line = self.encoding.decode(&line);
        self.log.trace(format!("CC IN: {line}"));
        Ok(line)
    }

    /// Read the final reply left behind by a data channel dropped without being closed
    fn consume_pending_reply(&mut self) {
        if !self.pending_reply.swap(false, Ordering::SeqCst) || self.reader.is_none() {
            return;
        }
        match self.read_reply() {
            Ok(reply) => self
                .log
                .debug(format!("Consumed pending transfer reply {reply}")),
            Err(err) => self
                .log
                .warn(format!("Failed to read pending transfer reply: {err}")),
        }
    }

    /// Drop the connection if unread bytes sit on the control socket
    fn discard_stale_data(&mut self) {
        if !self.config.stale_data_check {
            return;
        }
        let Some(reader) = self.reader.as_ref() else {
            return;
        };
        let mut unread = reader.buffer().to_vec();
        let stale = if unread.is_empty() {
            match peek_unread_bytes(reader.get_ref().get_ref()) {
                Ok(Some(bytes)) => {
                    unread = bytes;
                    true
                }
                Ok(None) => false,
                Err(err) => {
                    self.log
                        .warn(format!("Could not check the control socket: {err}"));
                    true
                }
            }
        } else {
            true
        };
        if stale {
            self.log.warn(format!(
                "Stale data on the control connection {:?}; reconnecting",
                String::from_utf8_lossy(&unread).trim_end()
            ));
            self.drop_connection();
            self.state = SessionState::Disconnected;
        }
    }

    fn mark_disconnected(&mut self, err: &io::Error) {
        self.log
            .warn(format!("Control connection lost: {err}"));
        self.drop_connection();
        self.state = SessionState::Disconnected;
    }

    /// Release the socket. Data channels opened on it can no longer leave a pending reply.
    fn drop_connection(&mut self) {
        self.reader = None;
        self.encrypted = false;
        self.pending_reply = Arc::new(AtomicBool::new(false));
    }

    // -- commands

    /// Change the current directory to the path specified
    pub fn cwd(&mut self, path: &str) -> FtpResult<()> {
        self.execute(Command::Cwd(path.to_string()))?
            .into_result()?;
        self.refresh_working_dir();
        Ok(())
    }

    /// Move the current directory to the parent directory
    pub fn cdup(&mut self) -> FtpResult<()> {
        self.execute(Command::Cdup)?.into_result()?;
        self.refresh_working_dir();
        Ok(())
    }

    fn refresh_working_dir(&mut self) {
        if let Err(err) = self.pwd() {
            self.log
                .warn(format!("Could not get working directory: {err}"));
            self.working_dir = None;
        }
    }

    /// Get the current directory
    pub fn pwd(&mut self) -> FtpResult<String> {
        let reply = self.execute(Command::Pwd)?.into_result()?;
        let dir = parse_pwd(&reply)?;
        self.working_dir = Some(dir.clone());
        Ok(dir)
    }

    /// Send a `NOOP`
    pub fn noop(&mut self) -> FtpResult<()> {
        self.execute(Command::Noop)?.into_result().map(|_| ())
    }

    /// Create a new directory
    pub fn mkdir(&mut self, path: &str) -> FtpResult<()> {
        self.execute(Command::Mkd(path.to_string()))?
            .into_result()
            .map(|_| ())
    }

    /// Remove a directory
    pub fn rmdir(&mut self, path: &str) -> FtpResult<()> {
        self.execute(Command::Rmd(path.to_string()))?
            .into_result()
            .map(|_| ())
    }

    /// Remove a file
    pub fn rm(&mut self, path: &str) -> FtpResult<()> {
        self.execute(Command::Dele(path.to_string()))?
            .into_result()
            .map(|_| ())
    }

    /// Rename a file
    pub fn rename(&mut self, from: &str, to: &str) -> FtpResult<()> {
        self.execute(Command::RenameFrom(from.to_string()))?
            .into_result()?;
        self.execute(Command::RenameTo(to.to_string()))?
            .into_result()
            .map(|_| ())
    }

    /// Set the type of file to be transferred
    pub fn transfer_type(&mut self, file_type: FileType) -> FtpResult<()> {
        self.execute(Command::Type(file_type))?
            .into_result()
            .map(|_| ())
    }

    /// Retrieve the size of a file in bytes
    pub fn size(&mut self, path: &str) -> FtpResult<u64> {
        let reply = self.execute(Command::Size(path.to_string()))?.into_result()?;
        SIZE_RE
            .captures(reply.message())
            .and_then(|caps| caps[1].parse::<u64>().ok())
            .ok_or_else(|| FtpError::ProtocolParse(format!("SIZE reply {reply}")))
    }

    /// Retrieve the modification time of a file
    pub fn mdtm(&mut self, path: &str) -> FtpResult<NaiveDateTime> {
        let reply = self.execute(Command::Mdtm(path.to_string()))?.into_result()?;
        parse_timestamp(reply.message())
            .ok_or_else(|| FtpError::ProtocolParse(format!("MDTM reply {reply}")))
    }

    /// Query the features of the server and remember them
    pub fn feat(&mut self) -> FtpResult<CapabilitySet> {
        let reply = self.execute(Command::Feat)?.into_result()?;
        self.capabilities = parse_features(&reply, &self.log);
        Ok(self.capabilities.clone())
    }

    /// Set an option of the server (`OPTS`)
    pub fn opts(&mut self, option: &str, value: Option<&str>) -> FtpResult<()> {
        self.execute(Command::Opts(
            option.to_string(),
            value.map(|v| v.to_string()),
        ))?
        .into_result()
        .map(|_| ())
    }

    /// Ask the system type of the server
    pub fn syst(&mut self) -> FtpResult<String> {
        let reply = self.execute(Command::Syst)?.into_result()?;
        self.system_type = Some(reply.message().to_string());
        Ok(reply.message().to_string())
    }

    /// Execute a `SITE` command
    pub fn site(&mut self, command: &str) -> FtpResult<Reply> {
        self.execute(Command::Site(command.to_string()))?
            .into_result()
    }

    /// Execute a command line verbatim. The reply must carry one of the `expected` codes;
    /// with no expected code any successful reply is accepted.
    pub fn custom_command(&mut self, command: &str, expected: &[Status]) -> FtpResult<Reply> {
        let reply = self.execute(Command::Custom(command.to_string()))?;
        let accepted = if expected.is_empty() {
            reply.is_success()
        } else {
            expected.contains(&reply.status())
        };
        if accepted {
            Ok(reply)
        } else {
            Err(FtpError::CommandFailure(reply))
        }
    }

    // -- crate internals

    pub(crate) fn log(&self) -> &SharedLogSink {
        &self.log
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// The TCP stream of the control connection
    pub(crate) fn control_stream(&self) -> FtpResult<&TcpStream> {
        self.get_ref().ok_or(FtpError::NotConnected)
    }
}

/// Split a reply line into code, separator and text. `None` when it doesn't start with a code.
fn split_reply_line(line: &str) -> Option<(&str, Option<char>, &str)> {
    let code = line.get(0..3)?;
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut rest = line[3..].chars();
    match rest.next() {
        None => Some((code, None, "")),
        Some(separator @ (' ' | '-')) => Some((code, Some(separator), rest.as_str())),
        Some(_) => None,
    }
}

/// Path of a `PWD` reply; doubled quotes are unescaped
fn parse_pwd(reply: &Reply) -> FtpResult<String> {
    PWD_RE
        .captures(reply.message())
        .map(|caps| caps[1].replace("\"\"", "\""))
        .ok_or_else(|| FtpError::ProtocolParse(format!("PWD reply {reply}")))
}

/// Bytes waiting on `stream`, without consuming them nor blocking.
/// The end of stream counts as an empty read.
fn peek_unread_bytes(stream: &TcpStream) -> io::Result<Option<Vec<u8>>> {
    stream.set_nonblocking(true)?;
    let mut buf = [0u8; 1024];
    let result = stream.peek(&mut buf);
    stream.set_nonblocking(false)?;
    match result {
        Ok(read) => Ok(Some(buf[..read].to_vec())),
        Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(err) => Err(err),
    }
}

/// Set `SO_KEEPALIVE` on the socket
pub(crate) fn apply_keep_alive(stream: &TcpStream, enabled: bool) -> io::Result<()> {
    socket2::SockRef::from(stream).set_keepalive(enabled)
}
