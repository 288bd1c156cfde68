//! # Listing
//!
//! Directory listings fetched over data channels and parsed into entries

use std::io::{BufRead, BufReader};
use std::sync::Arc;

use super::{ControlSession, TlsStream};
use crate::capability::Capability;
use crate::command::Command;
use crate::list::{Dialect, DirectoryEntry, ListingParser, join_path};
use crate::types::{FtpError, FtpResult};

/// Options of [`ControlSession::get_listing`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListingOptions {
    /// Use `LIST` even when the server supports `MLSD`
    pub force_list: bool,
    /// Keep `.` and `..` entries
    pub include_self_and_parent: bool,
    /// Resolve symbolic links with [`ControlSession::dereference_link`]
    pub dereference_links: bool,
}

impl ListingOptions {
    pub fn force_list(mut self, force: bool) -> Self {
        self.force_list = force;
        self
    }

    pub fn include_self_and_parent(mut self, include: bool) -> Self {
        self.include_self_and_parent = include;
        self
    }

    pub fn dereference_links(mut self, dereference: bool) -> Self {
        self.dereference_links = dereference;
        self
    }
}

impl<T> ControlSession<T>
where
    T: TlsStream,
{
    /// Execute `LIST` command which returns the detailed file listing in human readable format.
    /// If `path` is omitted then the list of files in the current directory will be
    /// returned otherwise it will the list of files on `path`.
    pub fn list(&mut self, path: Option<&str>) -> FtpResult<Vec<String>> {
        self.stream_lines(Command::List(path.map(|p| p.to_string())))
    }

    /// Execute `NLST` command which returns the list of file names only.
    /// An empty directory yields an empty list, even when the server answers `550`.
    pub fn nlst(&mut self, path: Option<&str>) -> FtpResult<Vec<String>> {
        self.stream_lines(Command::Nlst(path.map(|p| p.to_string())))
    }

    /// Execute `MLSD` command which returns the machine-processable listing of a directory.
    pub fn mlsd(&mut self, path: Option<&str>) -> FtpResult<Vec<String>> {
        self.stream_lines(Command::Mlsd(path.map(|p| p.to_string())))
    }

    /// List `path` and parse the result.
    ///
    /// `MLSD` is used when the server advertises it, `LIST` otherwise. An empty `path` lists the
    /// working directory.
    pub fn get_listing(
        &mut self,
        path: &str,
        options: ListingOptions,
    ) -> FtpResult<Vec<DirectoryEntry>> {
        let dir = if path.is_empty() {
            self.working_dir.clone().unwrap_or_default()
        } else {
            path.to_string()
        };
        let arg = (!path.is_empty()).then(|| path.to_string());
        let machine = !options.force_list && self.capabilities.has(Capability::Mlsd);
        let (lines, dialect) = if machine {
            (self.stream_lines(Command::Mlsd(arg))?, Dialect::MachineFacts)
        } else {
            (self.stream_lines(Command::List(arg))?, self.list_dialect())
        };
        let entries = self
            .listing_parser(dialect)
            .include_self_and_parent(options.include_self_and_parent)
            .parse_listing(&dir, &lines);
        self.log.debug(format!(
            "Listed {} entries of {dir} ({} lines)",
            entries.len(),
            lines.len()
        ));
        if !options.dereference_links {
            return Ok(entries);
        }
        let depth = self.config.max_dereference_depth;
        entries
            .into_iter()
            .map(|entry| {
                if entry.is_symlink() {
                    self.dereference_link(&entry, depth)
                } else {
                    Ok(entry)
                }
            })
            .collect()
    }

    /// Resolve the target of a link entry.
    ///
    /// The parent directory of the target is listed with `LIST` and links are followed up to
    /// `max_depth` hops. The returned entry is a copy of `entry` carrying the resolved target;
    /// size and modification time are queried when the server supports it. Targets which can't
    /// be found leave the entry unresolved.
    pub fn dereference_link(
        &mut self,
        entry: &DirectoryEntry,
        max_depth: usize,
    ) -> FtpResult<DirectoryEntry> {
        let mut resolved = entry.clone();
        let mut current = entry.clone();
        let mut depth = 0;
        let target = loop {
            if !current.is_symlink() {
                break current;
            }
            if depth >= max_depth {
                self.log.warn(format!(
                    "Giving up on {} after {max_depth} links",
                    entry.full_path()
                ));
                return Ok(resolved);
            }
            depth += 1;
            let Some(target_path) = current.link_target().map(|t| t.to_string()) else {
                self.log
                    .debug(format!("Link {} has no target", current.full_path()));
                return Ok(resolved);
            };
            match self.find_entry(&target_path)? {
                Some(next) => current = next,
                None => {
                    self.log
                        .warn(format!("Link target {target_path} not found"));
                    return Ok(resolved);
                }
            }
        };

        let mut target = target;
        if target.is_file() && self.capabilities.has(Capability::Size) {
            match self.size(target.full_path()) {
                Ok(size) => target.size = Some(size),
                Err(FtpError::CommandFailure(reply)) => self
                    .log
                    .debug(format!("SIZE of {} failed: {reply}", target.full_path())),
                Err(err) => return Err(err),
            }
        }
        if self.capabilities.has(Capability::Mdtm) {
            match self.mdtm(target.full_path()) {
                Ok(modified) => target.modified = Some(modified),
                Err(FtpError::CommandFailure(reply)) => self
                    .log
                    .debug(format!("MDTM of {} failed: {reply}", target.full_path())),
                Err(err) => return Err(err),
            }
        }
        resolved.link_entry = Some(Arc::new(target));
        Ok(resolved)
    }

    /// Look `path` up in the `LIST` of its parent directory
    fn find_entry(&mut self, path: &str) -> FtpResult<Option<DirectoryEntry>> {
        let path = join_path("", path);
        let (parent, name) = match path.rsplit_once('/') {
            Some(("", name)) => ("/".to_string(), name.to_string()),
            Some((parent, name)) => (parent.to_string(), name.to_string()),
            None => (self.working_dir.clone().unwrap_or_default(), path.clone()),
        };
        let lines = self.stream_lines(Command::List(Some(parent.clone())))?;
        let entries = self
            .listing_parser(self.list_dialect())
            .parse_listing(&parent, &lines);
        Ok(entries.into_iter().find(|entry| entry.name() == name))
    }

    /// Dialect of `LIST` replies; the machine facts grammar only applies to `MLSD`
    fn list_dialect(&self) -> Dialect {
        match self.dialect {
            Dialect::MachineFacts => Dialect::Unknown,
            dialect => dialect,
        }
    }

    fn listing_parser(&self, dialect: Dialect) -> ListingParser {
        ListingParser::new(dialect)
            .with_log_sink(self.log.clone())
            .with_zos_lrecl(self.config.zos_lrecl)
    }

    /// Execute a command which returns list of strings in a separate stream
    fn stream_lines(&mut self, command: Command) -> FtpResult<Vec<String>> {
        let mut channel = self.open_data_channel(command, 0)?;
        let mut lines = Vec::new();
        {
            let mut reader = BufReader::new(&mut channel);
            loop {
                let mut line = Vec::new();
                match reader.read_until(b'\n', &mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        while line.last().is_some_and(|b| *b == b'\n' || *b == b'\r') {
                            line.pop();
                        }
                        if line.is_empty() {
                            continue;
                        }
                        let line = self.encoding.decode(&line);
                        self.log.trace(format!("STREAM IN: {line}"));
                        lines.push(line);
                    }
                    Err(err) => {
                        self.log
                            .error(format!("failed to get lines from stream: {err}"));
                        return Err(FtpError::transfer(err));
                    }
                }
            }
        }
        self.close_data_channel(channel)?;
        Ok(lines)
    }
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;
    use serial_test::serial;

    use super::*;
    use crate::config::ConnectionConfig;
    use crate::list::EntryKind;
    use crate::mock_server::{MockServer, Step, script};
    use crate::session::NoTlsStream;

    type TestSession = ControlSession<NoTlsStream>;

    fn connect(config: ConnectionConfig) -> TestSession {
        crate::log_init();
        let mut session = TestSession::new(config);
        session.connect().unwrap();
        session
    }

    const UNIX_LISTING: &str = "total 12\r\n\
        drwxr-xr-x   2 omar  users      4096 Nov  5  2018 .\r\n\
        drwxr-xr-x   3 omar  users      4096 Nov  5  2018 ..\r\n\
        -rw-r--r--   1 omar  users      8192 Nov  5  2018 omar.txt\r\n\
        lrwxrwxrwx   1 omar  users         8 Nov  5  2018 link -> omar.txt\r\n\
        drwxr-xr-x   2 omar  users      4096 Nov  5  2018 pub\r\n";

    #[test]
    #[serial]
    fn should_list_raw_lines() {
        let server = MockServer::start(script(vec![
            Step::Epsv,
            Step::Send("LIST /pub", b"a\r\n\r\nb\r\n".to_vec()),
            Step::Epsv,
            Step::Send("NLST", b"a\r\nb\r\n".to_vec()),
            Step::Epsv,
            Step::Reply("NLST", "550 No files found."),
            Step::Epsv,
            Step::Send("MLSD", b"type=file; a\r\n".to_vec()),
        ]));
        let mut ftp = connect(server.config());
        assert_eq!(ftp.list(Some("/pub")).unwrap(), vec!["a", "b"]);
        assert_eq!(ftp.nlst(None).unwrap(), vec!["a", "b"]);
        assert!(ftp.nlst(None).unwrap().is_empty());
        assert_eq!(ftp.mlsd(None).unwrap(), vec!["type=file; a"]);
        ftp.disconnect();
        server.join();
    }

    #[test]
    #[serial]
    fn should_get_unix_listing() {
        let server = MockServer::start(script(vec![
            Step::Epsv,
            Step::Send("LIST /home/omar", UNIX_LISTING.as_bytes().to_vec()),
        ]));
        let mut ftp = connect(server.config());
        let entries = ftp
            .get_listing("/home/omar", ListingOptions::default())
            .unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["omar.txt", "link", "pub"]);
        assert_eq!(entries[0].full_path(), "/home/omar/omar.txt");
        assert_eq!(entries[0].size(), 8192);
        assert_eq!(entries[1].kind(), EntryKind::Link);
        assert_eq!(entries[1].link_target(), Some("/home/omar/omar.txt"));
        assert!(entries[2].is_directory());
        ftp.disconnect();
        server.join();
    }

    #[test]
    #[serial]
    fn should_prefer_mlsd_when_advertised() {
        let server = MockServer::start(script(vec![
            Step::Epsv,
            Step::Send(
                "MLSD",
                b"type=cdir; .\r\ntype=file;size=42;modify=20230201111632; a.txt\r\ntype=dir; sub\r\n"
                    .to_vec(),
            ),
            Step::Epsv,
            Step::Send("LIST", UNIX_LISTING.as_bytes().to_vec()),
        ]));
        let mut ftp = connect(server.config());
        ftp.capabilities.insert(Capability::Mlsd);
        ftp.dialect = Dialect::MachineFacts;
        let entries = ftp.get_listing("", ListingOptions::default()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].full_path(), "/home/test/a.txt");
        assert_eq!(entries[0].size_opt(), Some(42));
        assert!(entries[1].is_directory());
        // LIST output is detected from the listing itself
        let entries = ftp
            .get_listing("", ListingOptions::default().force_list(true))
            .unwrap();
        assert_eq!(entries.len(), 3);
        ftp.disconnect();
        server.join();
    }

    #[test]
    #[serial]
    fn should_dereference_links() {
        let server = MockServer::start(script(vec![
            Step::Epsv,
            Step::Send(
                "LIST /data",
                b"lrwxrwxrwx 1 omar users 9 Nov  5  2018 current -> releases\r\n".to_vec(),
            ),
            Step::Epsv,
            Step::Send(
                "LIST /data",
                b"lrwxrwxrwx 1 omar users 9 Nov  5  2018 current -> releases\r\n\
                  lrwxrwxrwx 1 omar users 9 Nov  5  2018 releases -> /opt/v2.bin\r\n"
                    .to_vec(),
            ),
            Step::Epsv,
            Step::Send(
                "LIST /opt",
                b"-rw-r--r-- 1 omar users 1024 Nov  5  2018 v2.bin\r\n".to_vec(),
            ),
            Step::Reply("SIZE /opt/v2.bin", "213 2048"),
        ]));
        let mut ftp = connect(server.config());
        ftp.capabilities.insert(Capability::Size);
        let entries = ftp
            .get_listing("/data", ListingOptions::default().dereference_links(true))
            .unwrap();
        assert_eq!(entries.len(), 1);
        let target = entries[0].link_entry().unwrap();
        assert_eq!(target.full_path(), "/opt/v2.bin");
        assert!(target.is_file());
        assert_eq!(target.size(), 2048);
        ftp.disconnect();
        server.join();
    }

    #[test]
    #[serial]
    fn should_stop_dereferencing_at_max_depth() {
        let server = MockServer::start(script(vec![
            Step::Epsv,
            Step::Send(
                "LIST /",
                b"lrwxrwxrwx 1 omar users 1 Nov  5  2018 a -> /b\r\n\
                  lrwxrwxrwx 1 omar users 1 Nov  5  2018 b -> /a\r\n"
                    .to_vec(),
            ),
            Step::Epsv,
            Step::Send(
                "LIST /",
                b"lrwxrwxrwx 1 omar users 1 Nov  5  2018 a -> /b\r\n\
                  lrwxrwxrwx 1 omar users 1 Nov  5  2018 b -> /a\r\n"
                    .to_vec(),
            ),
        ]));
        let mut ftp = connect(server.config());
        let link = ListingParser::new(Dialect::Unix)
            .parse_line("/", "lrwxrwxrwx 1 omar users 1 Nov  5  2018 a -> /b")
            .unwrap();
        let resolved = ftp.dereference_link(&link, 2).unwrap();
        assert!(resolved.link_entry().is_none());
        assert_eq!(resolved, link);
        ftp.disconnect();
        server.join();
    }
}
