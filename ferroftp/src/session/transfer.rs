//! # Transfer
//!
//! Chunked uploads and downloads, resumed when the data connection is reset

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use super::{ControlSession, DataChannel, TlsStream};
use crate::command::Command;
use crate::types::{FtpError, FtpResult, Reply, TransferOutcome};

/// Phrases of a negative reply telling the remote file doesn't exist (lower case)
const NOT_FOUND_PHRASES: [&str; 4] = ["no such file", "not exist", "missing file", "unknown file"];

/// How an upload treats an existing remote file
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum UploadMode {
    /// Replace the remote file (`STOR`)
    #[default]
    Overwrite,
    /// Append the whole source to the remote file (`APPE`)
    Append,
    /// Skip the bytes already on the server and append the rest
    Resume,
}

/// Moves file contents over data channels of a session.
///
/// The transfer is split in chunks; cancellation is checked and progress reported at each
/// chunk. When the data connection is reset the transfer restarts from the last offset
/// written, once per reset.
pub struct TransferEngine<'a, T>
where
    T: TlsStream,
{
    session: &'a mut ControlSession<T>,
    chunk_size: usize,
    progress: Option<Box<dyn FnMut(u64) + 'a>>,
}

impl<'a, T> TransferEngine<'a, T>
where
    T: TlsStream,
{
    pub fn new(session: &'a mut ControlSession<T>) -> Self {
        let chunk_size = session.config().chunk_size;
        Self {
            session,
            chunk_size,
            progress: None,
        }
    }

    /// Size of the chunks moved at once
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Call `progress` with the offset in the file after each chunk
    pub fn progress<F>(mut self, progress: F) -> Self
    where
        F: FnMut(u64) + 'a,
    {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Upload the content of `reader` to `remote_path`.
    ///
    /// Returns the number of bytes sent by this call.
    pub fn upload<R>(
        &mut self,
        reader: &mut R,
        remote_path: &str,
        mode: UploadMode,
    ) -> FtpResult<TransferOutcome>
    where
        R: Read + Seek,
    {
        let offset = match mode {
            UploadMode::Resume => match self.session.size(remote_path) {
                Ok(size) => size,
                Err(FtpError::CommandFailure(reply)) => {
                    self.session
                        .log()
                        .debug(format!("No remote file to resume ({reply})"));
                    0
                }
                Err(err) => return Err(err),
            },
            _ => 0,
        };
        let command = match mode {
            UploadMode::Overwrite => Command::Store(remote_path.to_string()),
            UploadMode::Resume if offset == 0 => Command::Store(remote_path.to_string()),
            UploadMode::Append | UploadMode::Resume => Command::Appe(remote_path.to_string()),
        };
        self.session.log().info(format!(
            "Uploading {remote_path} from offset {offset} ({mode:?})"
        ));
        reader
            .seek(SeekFrom::Start(offset))
            .map_err(FtpError::LocalResource)?;
        let mut bytes = self.send(reader, remote_path, command, offset)?;

        if self.session.transport().is_proxy() && mode != UploadMode::Append {
            bytes += self.append_shortfall(reader, remote_path)?;
        }
        self.session
            .log()
            .info(format!("Uploaded {bytes} bytes to {remote_path}"));
        Ok(TransferOutcome::Success { bytes })
    }

    /// Download `remote_path` into `writer`, starting at offset `restart`.
    ///
    /// Returns [`TransferOutcome::NotFound`] when the server says the file doesn't exist.
    pub fn download<W>(
        &mut self,
        writer: &mut W,
        remote_path: &str,
        restart: u64,
    ) -> FtpResult<TransferOutcome>
    where
        W: Write,
    {
        let size = match self.session.size(remote_path) {
            Ok(size) => Some(size),
            Err(FtpError::CommandFailure(reply)) if is_not_found(&reply) => {
                return Ok(TransferOutcome::NotFound(reply));
            }
            Err(FtpError::CommandFailure(reply)) => {
                self.session
                    .log()
                    .debug(format!("Size of {remote_path} is unknown ({reply})"));
                None
            }
            Err(err) => return Err(err),
        };
        self.session.log().info(format!(
            "Downloading {remote_path} from offset {restart} (size: {size:?})"
        ));
        let command = Command::Retr(remote_path.to_string());
        let mut channel = match self.session.open_data_channel(command.clone(), restart) {
            Ok(channel) => channel,
            Err(FtpError::CommandFailure(reply)) if is_not_found(&reply) => {
                return Ok(TransferOutcome::NotFound(reply));
            }
            Err(err) => return Err(err),
        };

        let mut buf = vec![0; self.chunk_size];
        let mut position = restart;
        let mut last_reset = None;
        loop {
            self.session.cancel.check()?;
            let err = match channel.read(&mut buf) {
                Ok(0) if size.is_some_and(|size| position < size) => io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("data connection closed at {position}"),
                ),
                Ok(0) => break,
                Ok(read) => {
                    writer
                        .write_all(&buf[..read])
                        .map_err(FtpError::LocalResource)?;
                    position += read as u64;
                    self.report(position);
                    continue;
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) if is_reset(&err) => err,
                Err(err) => return Err(FtpError::transfer(err)),
            };
            if last_reset == Some(position) {
                return Err(FtpError::transfer(err));
            }
            last_reset = Some(position);
            self.session.log().warn(format!(
                "Download of {remote_path} interrupted at {position} ({err}); resuming"
            ));
            drop(channel);
            channel = self.session.open_data_channel(command.clone(), position)?;
        }
        writer.flush().map_err(FtpError::LocalResource)?;
        self.session.close_data_channel(channel)?;

        let bytes = position - restart;
        self.session
            .log()
            .info(format!("Downloaded {bytes} bytes from {remote_path}"));
        Ok(TransferOutcome::Success { bytes })
    }

    /// Send `reader` from `offset` through the data channel opened by `command`.
    /// A reset reopens the channel with `APPE` at the current offset.
    fn send<R>(
        &mut self,
        reader: &mut R,
        remote_path: &str,
        command: Command,
        offset: u64,
    ) -> FtpResult<u64>
    where
        R: Read + Seek,
    {
        let mut channel = self.session.open_data_channel(command, 0)?;
        let mut buf = vec![0; self.chunk_size];
        let mut position = offset;
        let mut last_reset = None;
        loop {
            self.session.cancel.check()?;
            let read = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(FtpError::LocalResource(err)),
            };
            match channel.write_all(&buf[..read]) {
                Ok(()) => {
                    position += read as u64;
                    self.report(position);
                }
                Err(err) if is_reset(&err) => {
                    if last_reset == Some(position) {
                        return Err(FtpError::transfer(err));
                    }
                    last_reset = Some(position);
                    self.session.log().warn(format!(
                        "Upload of {remote_path} interrupted at {position} ({err}); resuming"
                    ));
                    drop(channel);
                    reader
                        .seek(SeekFrom::Start(position))
                        .map_err(FtpError::LocalResource)?;
                    channel = self
                        .session
                        .open_data_channel(Command::Appe(remote_path.to_string()), 0)?;
                }
                Err(err) => return Err(FtpError::transfer(err)),
            }
        }
        channel.flush().map_err(FtpError::transfer)?;
        self.session.close_data_channel(channel)?;
        Ok(position - offset)
    }

    /// Proxies may cut uploads short; append what the server is missing
    fn append_shortfall<R>(&mut self, reader: &mut R, remote_path: &str) -> FtpResult<u64>
    where
        R: Read + Seek,
    {
        let total = reader
            .seek(SeekFrom::End(0))
            .map_err(FtpError::LocalResource)?;
        let remote = match self.session.size(remote_path) {
            Ok(remote) => remote,
            Err(err) => {
                self.session
                    .log()
                    .warn(format!("Could not verify size of {remote_path}: {err}"));
                return Ok(0);
            }
        };
        if remote >= total {
            return Ok(0);
        }
        self.session.log().warn(format!(
            "{remote_path} is {remote} bytes on the server instead of {total}; appending the rest"
        ));
        reader
            .seek(SeekFrom::Start(remote))
            .map_err(FtpError::LocalResource)?;
        self.send(
            reader,
            remote_path,
            Command::Appe(remote_path.to_string()),
            remote,
        )
    }

    fn report(&mut self, position: u64) {
        if let Some(progress) = self.progress.as_mut() {
            progress(position);
        }
    }
}

impl<T> ControlSession<T>
where
    T: TlsStream,
{
    /// Retrieves the file name specified from the server as a readable stream.
    /// Once the file has been read, call [`ControlSession::finalize_stream`].
    pub fn retr_as_stream(&mut self, path: &str) -> FtpResult<DataChannel<T>> {
        self.open_data_channel(Command::Retr(path.to_string()), 0)
    }

    /// Retrieve a whole file in memory
    pub fn retr_as_buffer(&mut self, path: &str) -> FtpResult<Cursor<Vec<u8>>> {
        let mut buffer = Vec::new();
        match TransferEngine::new(self).download(&mut buffer, path, 0)? {
            TransferOutcome::Success { .. } => Ok(Cursor::new(buffer)),
            TransferOutcome::NotFound(reply) => Err(FtpError::CommandFailure(reply)),
        }
    }

    /// Open `path` for writing with `STOR`.
    /// Once the file has been written, call [`ControlSession::finalize_stream`].
    pub fn put_as_stream(&mut self, path: &str) -> FtpResult<DataChannel<T>> {
        self.open_data_channel(Command::Store(path.to_string()), 0)
    }

    /// Open `path` for appending with `APPE`.
    /// Once the data has been written, call [`ControlSession::finalize_stream`].
    pub fn append_as_stream(&mut self, path: &str) -> FtpResult<DataChannel<T>> {
        self.open_data_channel(Command::Appe(path.to_string()), 0)
    }

    /// Close a stream got from one of the `*_as_stream` methods and check the final reply
    pub fn finalize_stream(&mut self, stream: DataChannel<T>) -> FtpResult<Reply> {
        self.close_data_channel(stream)
    }
}

/// Whether the reply says the file doesn't exist
fn is_not_found(reply: &Reply) -> bool {
    let message = reply.message().to_lowercase();
    NOT_FOUND_PHRASES
        .iter()
        .any(|phrase| message.contains(phrase))
}

/// Whether the data connection was torn down by the peer
fn is_reset(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted | io::ErrorKind::BrokenPipe
    )
}

#[cfg(test)]
mod test {

    use std::net::{SocketAddr, TcpStream};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serial_test::serial;

    use super::*;
    use crate::config::{ConnectionConfig, IpVersion};
    use crate::mock_server::{MockServer, Step, script};
    use crate::session::{DirectTransport, NoTlsStream, Transport};

    type TestSession = ControlSession<NoTlsStream>;

    fn connect(config: ConnectionConfig) -> TestSession {
        crate::log_init();
        let mut session = TestSession::new(config);
        session.connect().unwrap();
        session
    }

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    /// Direct connections pretending to go through a proxy
    #[derive(Debug)]
    struct ProxyTransport;

    impl Transport for ProxyTransport {
        fn connect(
            &self,
            host: &str,
            port: u16,
            ip_version: IpVersion,
            timeout: Duration,
        ) -> io::Result<TcpStream> {
            DirectTransport.connect(host, port, ip_version, timeout)
        }

        fn connect_data(&self, addr: SocketAddr, timeout: Duration) -> io::Result<TcpStream> {
            DirectTransport.connect_data(addr, timeout)
        }

        fn is_proxy(&self) -> bool {
            true
        }
    }

    #[test]
    fn should_tell_not_found_replies() {
        assert!(is_not_found(&Reply::new(550, "No such file or directory")));
        assert!(is_not_found(&Reply::new(550, "File does NOT EXIST")));
        assert!(is_not_found(&Reply::new(450, "Unknown file a.txt")));
        assert!(!is_not_found(&Reply::new(550, "Permission denied")));
    }

    #[test]
    fn should_tell_reset_errors() {
        assert!(is_reset(&io::ErrorKind::ConnectionReset.into()));
        assert!(is_reset(&io::ErrorKind::BrokenPipe.into()));
        assert!(!is_reset(&io::ErrorKind::TimedOut.into()));
    }

    #[test]
    #[serial]
    fn should_upload_file() {
        let data = payload(10_000);
        let server = MockServer::start(script(vec![Step::Epsv, Step::Receive("STOR a.bin")]));
        let mut ftp = connect(server.config());
        let progress = Arc::new(Mutex::new(Vec::new()));
        let progress_t = progress.clone();
        let outcome = TransferEngine::new(&mut ftp)
            .chunk_size(4096)
            .progress(move |position| progress_t.lock().unwrap().push(position))
            .upload(&mut Cursor::new(data.clone()), "a.bin", UploadMode::Overwrite)
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Success { bytes: 10_000 });
        assert_eq!(*progress.lock().unwrap(), vec![4096, 8192, 10_000]);
        ftp.disconnect();
        let recorded = server.join();
        assert_eq!(recorded.uploads, vec![data]);
    }

    #[test]
    #[serial]
    fn should_resume_upload_from_remote_size() {
        let data = payload(100);
        let server = MockServer::start(script(vec![
            Step::Reply("SIZE a.bin", "213 40"),
            Step::Epsv,
            Step::Receive("APPE a.bin"),
        ]));
        let mut ftp = connect(server.config());
        let outcome = TransferEngine::new(&mut ftp)
            .upload(&mut Cursor::new(data.clone()), "a.bin", UploadMode::Resume)
            .unwrap();
        assert_eq!(outcome.bytes(), 60);
        ftp.disconnect();
        let recorded = server.join();
        assert_eq!(recorded.uploads, vec![data[40..].to_vec()]);
    }

    #[test]
    #[serial]
    fn should_store_when_nothing_to_resume() {
        let data = payload(100);
        let server = MockServer::start(script(vec![
            Step::Reply("SIZE a.bin", "550 No such file"),
            Step::Epsv,
            Step::Receive("STOR a.bin"),
        ]));
        let mut ftp = connect(server.config());
        let outcome = TransferEngine::new(&mut ftp)
            .upload(&mut Cursor::new(data.clone()), "a.bin", UploadMode::Resume)
            .unwrap();
        assert_eq!(outcome.bytes(), 100);
        ftp.disconnect();
        assert_eq!(server.join().uploads, vec![data]);
    }

    #[test]
    #[serial]
    fn should_append_file() {
        let server = MockServer::start(script(vec![Step::Epsv, Step::Receive("APPE log.txt")]));
        let mut ftp = connect(server.config());
        let outcome = TransferEngine::new(&mut ftp)
            .upload(&mut Cursor::new(b"line\n".to_vec()), "log.txt", UploadMode::Append)
            .unwrap();
        assert_eq!(outcome.bytes(), 5);
        ftp.disconnect();
        assert_eq!(server.join().uploads, vec![b"line\n".to_vec()]);
    }

    #[test]
    #[serial]
    fn should_resume_upload_after_reset() {
        // large enough for the writes to block until the reset
        let data = payload(32 * 1024 * 1024);
        let server = MockServer::start(script(vec![
            Step::Epsv,
            Step::ReceiveReset("STOR big.bin", 1024),
            Step::Epsv,
            Step::Receive("APPE big.bin"),
        ]));
        let mut ftp = connect(server.config());
        let outcome = TransferEngine::new(&mut ftp)
            .upload(&mut Cursor::new(data.clone()), "big.bin", UploadMode::Overwrite)
            .unwrap();
        assert_eq!(outcome.bytes(), data.len() as u64);
        ftp.disconnect();
        let recorded = server.join();
        assert_eq!(recorded.count("STOR"), 1);
        assert_eq!(recorded.count("APPE"), 1);
    }

    #[test]
    #[serial]
    fn should_append_shortfall_through_proxy() {
        let data = payload(10);
        let server = MockServer::start(script(vec![
            Step::Epsv,
            Step::Receive("STOR a.bin"),
            Step::Reply("SIZE a.bin", "213 3"),
            Step::Epsv,
            Step::Receive("APPE a.bin"),
        ]));
        crate::log_init();
        let mut ftp = TestSession::new(server.config()).with_transport(ProxyTransport);
        ftp.connect().unwrap();
        let outcome = TransferEngine::new(&mut ftp)
            .upload(&mut Cursor::new(data.clone()), "a.bin", UploadMode::Overwrite)
            .unwrap();
        assert_eq!(outcome.bytes(), 17);
        ftp.disconnect();
        let recorded = server.join();
        assert_eq!(recorded.uploads, vec![data.clone(), data[3..].to_vec()]);
    }

    #[test]
    #[serial]
    fn should_download_file() {
        let data = payload(10_000);
        let server = MockServer::start(script(vec![
            Step::Reply("SIZE a.bin", "213 10000"),
            Step::Epsv,
            Step::Send("RETR a.bin", data.clone()),
        ]));
        let mut ftp = connect(server.config());
        let mut buffer = Vec::new();
        let outcome = TransferEngine::new(&mut ftp)
            .download(&mut buffer, "a.bin", 0)
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Success { bytes: 10_000 });
        assert_eq!(buffer, data);
        ftp.disconnect();
        server.join();
    }

    #[test]
    #[serial]
    fn should_download_with_unknown_size() {
        let server = MockServer::start(script(vec![
            Step::Reply("SIZE a.txt", "550 SIZE not allowed in ASCII mode"),
            Step::Epsv,
            Step::Send("RETR a.txt", b"hello".to_vec()),
        ]));
        let mut ftp = connect(server.config());
        let mut buffer = Vec::new();
        let outcome = TransferEngine::new(&mut ftp)
            .download(&mut buffer, "a.txt", 0)
            .unwrap();
        assert_eq!(outcome.bytes(), 5);
        assert_eq!(buffer, b"hello".to_vec());
        ftp.disconnect();
        server.join();
    }

    #[test]
    #[serial]
    fn should_report_missing_file() {
        let server = MockServer::start(script(vec![
            Step::Reply("SIZE missing.txt", "550 No such file or directory"),
            Step::Reply("SIZE gone.txt", "550 Could not get file size"),
            Step::Epsv,
            Step::Reply("RETR gone.txt", "550 File does not exist"),
        ]));
        let mut ftp = connect(server.config());
        let mut buffer = Vec::new();
        let outcome = TransferEngine::new(&mut ftp)
            .download(&mut buffer, "missing.txt", 0)
            .unwrap();
        assert!(matches!(outcome, TransferOutcome::NotFound(ref reply) if reply.code() == "550"));
        let outcome = TransferEngine::new(&mut ftp)
            .download(&mut buffer, "gone.txt", 0)
            .unwrap();
        assert!(!outcome.is_success());
        assert_eq!(outcome.bytes(), 0);
        ftp.disconnect();
        server.join();
    }

    #[test]
    #[serial]
    fn should_resume_download_after_reset() {
        let data = payload(64 * 1024);
        let server = MockServer::start(script(vec![
            Step::Reply("SIZE big.bin", "213 65536"),
            Step::Epsv,
            Step::SendReset("RETR big.bin", data.clone(), 10_000),
            Step::Epsv,
            Step::Send("RETR big.bin", data.clone()),
        ]));
        let mut ftp = connect(server.config());
        let mut buffer = Vec::new();
        let outcome = TransferEngine::new(&mut ftp)
            .download(&mut buffer, "big.bin", 0)
            .unwrap();
        assert_eq!(outcome.bytes(), data.len() as u64);
        assert_eq!(buffer, data);
        ftp.disconnect();
        assert_eq!(server.join().count("RETR"), 2);
    }

    #[test]
    #[serial]
    fn should_resume_download_after_premature_eof() {
        let data = payload(1000);
        let server = MockServer::start(script(vec![
            Step::Reply("SIZE a.bin", "213 1000"),
            Step::Epsv,
            Step::SendTruncated("RETR a.bin", data.clone(), 600),
            Step::Epsv,
            Step::Send("RETR a.bin", data.clone()),
        ]));
        let mut ftp = connect(server.config());
        let mut buffer = Vec::new();
        let outcome = TransferEngine::new(&mut ftp)
            .download(&mut buffer, "a.bin", 0)
            .unwrap();
        assert_eq!(outcome.bytes(), 1000);
        assert_eq!(buffer, data);
        ftp.disconnect();
        assert_eq!(server.join().count("REST 600"), 1);
    }

    #[test]
    #[serial]
    fn should_restart_download_at_offset() {
        let data = payload(100);
        let server = MockServer::start(script(vec![
            Step::Reply("SIZE a.bin", "213 100"),
            Step::Epsv,
            Step::Send("RETR a.bin", data.clone()),
        ]));
        let mut ftp = connect(server.config());
        let mut buffer = Vec::new();
        let outcome = TransferEngine::new(&mut ftp)
            .download(&mut buffer, "a.bin", 30)
            .unwrap();
        assert_eq!(outcome.bytes(), 70);
        assert_eq!(buffer, data[30..].to_vec());
        ftp.disconnect();
        server.join();
    }

    #[test]
    #[serial]
    fn should_cancel_download() {
        let data = payload(100);
        let server = MockServer::start(script(vec![
            Step::Reply("SIZE a.bin", "213 100"),
            Step::Epsv,
            Step::Send("RETR a.bin", data),
        ]));
        let mut ftp = connect(server.config().with_ungraceful_disconnect(true));
        let token = ftp.cancel_token();
        let mut buffer = Vec::new();
        let result = TransferEngine::new(&mut ftp)
            .chunk_size(10)
            .progress(move |_| token.cancel())
            .download(&mut buffer, "a.bin", 0);
        assert!(matches!(result, Err(FtpError::Cancelled)));
        assert_eq!(buffer.len(), 10);
        ftp.cancel_token().reset();
        ftp.disconnect();
        server.join();
    }

    #[test]
    #[serial]
    fn should_use_stream_api() {
        let server = MockServer::start(script(vec![
            Step::Epsv,
            Step::Receive("STOR a.txt"),
            Step::Epsv,
            Step::Send("RETR a.txt", b"hello".to_vec()),
            Step::Reply("SIZE a.txt", "213 5"),
            Step::Epsv,
            Step::Send("RETR a.txt", b"hello".to_vec()),
        ]));
        let mut ftp = connect(server.config());
        let mut stream = ftp.put_as_stream("a.txt").unwrap();
        stream.write_all(b"hello").unwrap();
        ftp.finalize_stream(stream).unwrap();
        let mut stream = ftp.retr_as_stream("a.txt").unwrap();
        let mut content = String::new();
        stream.read_to_string(&mut content).unwrap();
        assert_eq!(content.as_str(), "hello");
        ftp.finalize_stream(stream).unwrap();
        assert_eq!(ftp.retr_as_buffer("a.txt").unwrap().into_inner(), b"hello".to_vec());
        ftp.disconnect();
        assert_eq!(server.join().uploads, vec![b"hello".to_vec()]);
    }

    mod integration {

        use std::io::Cursor;

        use pretty_assertions::assert_eq;
        use rand::distr::{Alphanumeric, SampleString};
        use serial_test::serial;

        use super::TestSession;
        use crate::session::{ListingOptions, TransferEngine, UploadMode};
        use crate::test_container::SyncPureFtpRunner;
        use crate::types::{FileType, TransferOutcome};

        fn setup(container: &SyncPureFtpRunner) -> TestSession {
            crate::log_init();
            let mut ftp = TestSession::new(container.config()).with_transport(container.transport());
            ftp.connect().unwrap();
            ftp.transfer_type(FileType::Binary).unwrap();
            let tempdir = Alphanumeric.sample_string(&mut rand::rng(), 8);
            ftp.mkdir(&tempdir).unwrap();
            ftp.cwd(&tempdir).unwrap();
            ftp
        }

        fn finalize(mut ftp: TestSession) {
            let wrkdir = ftp.pwd().unwrap();
            ftp.cwd("..").unwrap();
            ftp.rmdir(&wrkdir).unwrap();
            ftp.disconnect();
        }

        #[test]
        #[ignore = "requires docker"]
        #[serial]
        fn should_upload_list_and_download() {
            let container = SyncPureFtpRunner::start();
            let mut ftp = setup(&container);
            let content = b"test data\ntest data\n".to_vec();
            let outcome = TransferEngine::new(&mut ftp)
                .upload(&mut Cursor::new(content.clone()), "test.txt", UploadMode::Overwrite)
                .unwrap();
            assert_eq!(outcome, TransferOutcome::Success { bytes: 20 });
            assert_eq!(ftp.size("test.txt").unwrap(), 20);

            let entries = ftp.get_listing("", ListingOptions::default()).unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].name(), "test.txt");
            assert!(entries[0].is_file());
            assert_eq!(entries[0].size(), 20);

            let mut downloaded = Vec::new();
            TransferEngine::new(&mut ftp)
                .download(&mut downloaded, "test.txt", 0)
                .unwrap();
            assert_eq!(downloaded, content);
            assert!(matches!(
                TransferEngine::new(&mut ftp).download(&mut Vec::new(), "missing.txt", 0),
                Ok(TransferOutcome::NotFound(_))
            ));
            ftp.rm("test.txt").unwrap();
            finalize(ftp);
        }

        #[test]
        #[ignore = "requires docker"]
        #[serial]
        fn should_resume_upload() {
            let container = SyncPureFtpRunner::start();
            let mut ftp = setup(&container);
            let content: Vec<u8> = (0..4096).map(|i| (i % 256) as u8).collect();
            TransferEngine::new(&mut ftp)
                .upload(&mut Cursor::new(content[..1000].to_vec()), "part.bin", UploadMode::Overwrite)
                .unwrap();
            let outcome = TransferEngine::new(&mut ftp)
                .upload(&mut Cursor::new(content.clone()), "part.bin", UploadMode::Resume)
                .unwrap();
            assert_eq!(outcome, TransferOutcome::Success { bytes: 3096 });
            assert_eq!(ftp.retr_as_buffer("part.bin").unwrap().into_inner(), content);
            ftp.rm("part.bin").unwrap();
            finalize(ftp);
        }
    }
}
