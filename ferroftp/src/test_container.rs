#![allow(dead_code)]

use std::borrow::Cow;
use std::collections::HashMap;
use std::io;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use testcontainers::core::{CmdWaitFor, ExecCommand, WaitFor};
use testcontainers::{Container, Image};

use crate::config::{ConnectionConfig, IpVersion};
use crate::session::{DirectTransport, Transport};

/// Passive ports pure-ftpd advertises
const PASSIVE_PORTS: std::ops::RangeInclusive<u16> = 30000..=30009;

/// pure-ftpd, with a `test` user and a home directory prepared for the listing tests
#[derive(Debug, Default, Clone)]
struct PureFtpImage {
    _priv: (),
}

impl Image for PureFtpImage {
    fn name(&self) -> &str {
        "stilliard/pure-ftpd"
    }

    fn tag(&self) -> &str {
        "latest"
    }

    fn ready_conditions(&self) -> Vec<WaitFor> {
        vec![WaitFor::message_on_stdout("Starting Pure-FTPd")]
    }

    fn env_vars(
        &self,
    ) -> impl IntoIterator<Item = (impl Into<Cow<'_, str>>, impl Into<Cow<'_, str>>)> {
        vec![
            ("PUBLICHOST", "localhost"),
            ("FTP_USER_NAME", "test"),
            ("FTP_USER_PASS", "test"),
            ("FTP_USER_HOME", "/home/test"),
        ]
    }
}

pub struct SyncPureFtpRunner {
    container: Container<PureFtpImage>,
}

impl SyncPureFtpRunner {
    pub fn start() -> Self {
        use testcontainers::runners::SyncRunner;
        let container = PureFtpImage::default()
            .start()
            .expect("Failed to start container");
        let runner = Self { container };
        runner.exec(&["/bin/mkdir", "-p", "/home/test/docs"]);
        runner.exec(&["/bin/ln", "-s", "/home/test/docs", "/home/test/docs-link"]);
        runner.exec(&["/bin/chown", "-R", "ftpuser:ftpgroup", "/home/test"]);
        runner
    }

    /// Run `cmd` in the container, asserting it exits with 0
    fn exec(&self, cmd: &[&str]) {
        let resp = self
            .container
            .exec(
                ExecCommand::new(cmd.iter().map(|arg| arg.to_string()))
                    .with_cmd_ready_condition(CmdWaitFor::Exit { code: Some(0) }),
            )
            .unwrap_or_else(|e| panic!("failed to run {cmd:?}: {e}"));
        assert_eq!(
            resp.exit_code()
                .expect("failed to get exit code")
                .expect("no exit code"),
            0,
            "{cmd:?} failed"
        );
    }

    pub fn get_ftp_port(&self) -> u16 {
        self.container.get_host_port_ipv4(21).unwrap()
    }

    pub fn get_mapped_port(&self, port: u16) -> u16 {
        self.container.get_host_port_ipv4(port).unwrap()
    }

    /// Transport redirecting passive data connections to the ports mapped on the host
    pub fn transport(&self) -> MappedPortTransport {
        MappedPortTransport {
            ports: PASSIVE_PORTS
                .map(|port| (port, self.get_mapped_port(port)))
                .collect(),
        }
    }

    /// Configuration of the `test` user on this server
    pub fn config(&self) -> ConnectionConfig {
        ConnectionConfig::new("127.0.0.1")
            .with_port(self.get_ftp_port())
            .with_credentials("test", "test")
    }
}

/// Connects passive data channels to the host port docker mapped the advertised port to
#[derive(Debug)]
pub struct MappedPortTransport {
    ports: HashMap<u16, u16>,
}

impl Transport for MappedPortTransport {
    fn connect(
        &self,
        host: &str,
        port: u16,
        ip_version: IpVersion,
        timeout: Duration,
    ) -> io::Result<TcpStream> {
        DirectTransport.connect(host, port, ip_version, timeout)
    }

    fn connect_data(&self, mut addr: SocketAddr, timeout: Duration) -> io::Result<TcpStream> {
        if let Some(mapped) = self.ports.get(&addr.port()) {
            info!("mapped port {} to {mapped} for PASV", addr.port());
            addr.set_port(*mapped);
        }
        TcpStream::connect_timeout(&addr, timeout)
    }
}
