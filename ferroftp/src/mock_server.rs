//! Scripted FTP server running on a thread, used to drive sessions through exact reply sequences

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{IpAddr, Ipv4Addr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::ConnectionConfig;

/// One exchange of the script
pub enum Step {
    /// Expect a command starting with the prefix and answer with the reply (without final CRLF)
    Reply(&'static str, &'static str),
    /// Expect `EPSV` and answer with the port of a new data listener
    Epsv,
    /// Expect `PASV` and answer with a new data listener, advertising the given `h1,h2,h3,h4` host
    Pasv(&'static str),
    /// Expect a command (`EPRT` or `PORT`) carrying the address the server has to connect to
    Active(&'static str),
    /// Expect the command and send the payload, from the last `REST` offset, on the data connection
    Send(&'static str, Vec<u8>),
    /// Like [`Step::Send`], but the data connection is reset after the given amount of bytes
    SendReset(&'static str, Vec<u8>, usize),
    /// Like [`Step::Send`], but the data connection is closed after the given amount of bytes
    SendTruncated(&'static str, Vec<u8>, usize),
    /// Expect the command and receive data until end of stream
    Receive(&'static str),
    /// Expect the command, receive the given amount of bytes and reset the data connection
    ReceiveReset(&'static str, usize),
    /// Write a line on the control connection without waiting for a command
    Unsolicited(&'static str),
    /// Drop the control connection, then accept a new one and greet it
    Reconnect,
}

/// What the server saw
#[derive(Debug, Default)]
pub struct Recorded {
    pub commands: Vec<String>,
    pub uploads: Vec<Vec<u8>>,
}

impl Recorded {
    /// Number of commands starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(prefix)).count()
    }
}

pub struct MockServer {
    pub ip: IpAddr,
    pub port: u16,
    handle: JoinHandle<Recorded>,
}

impl MockServer {
    pub fn start(steps: Vec<Step>) -> Self {
        Self::start_on(Ipv4Addr::LOCALHOST.into(), steps)
    }

    /// Serve the script on `ip`; data listeners are bound to the same address
    pub fn start_on(ip: IpAddr, steps: Vec<Step>) -> Self {
        let listener =
            TcpListener::bind(SocketAddr::new(ip, 0)).expect("failed to bind mock server");
        let port = listener.local_addr().unwrap().port();
        let handle = std::thread::spawn(move || Script::new(listener).run(steps));
        Self { ip, port, handle }
    }

    /// Wait for the script to complete and the client to quit
    pub fn join(self) -> Recorded {
        self.handle.join().expect("mock server panicked")
    }

    pub fn config(&self) -> ConnectionConfig {
        ConnectionConfig::new(self.ip)
            .with_port(self.port)
            .with_credentials("test", "test")
            .with_check_capabilities(false)
            .with_read_timeout(Duration::from_secs(5))
            .with_data_connect_timeout(Duration::from_secs(5))
            .with_data_read_timeout(Duration::from_secs(5))
    }
}

/// Login as performed by a session with `check_capabilities` off
pub fn login_steps() -> Vec<Step> {
    vec![
        Step::Reply("USER test", "331 Password required"),
        Step::Reply("PASS test", "230 Logged in"),
        Step::Reply("SYST", "215 UNIX Type: L8"),
        Step::Reply("PWD", "257 \"/home/test\" is the current directory"),
    ]
}

/// Login steps followed by `steps`
pub fn script(steps: Vec<Step>) -> Vec<Step> {
    let mut all = login_steps();
    all.extend(steps);
    all
}

struct Script {
    listener: TcpListener,
    control: BufReader<TcpStream>,
    data: Option<TcpListener>,
    active: Option<SocketAddr>,
    rest: usize,
    recorded: Recorded,
}

impl Script {
    fn new(listener: TcpListener) -> Self {
        let control = Self::greet(&listener);
        Self {
            listener,
            control,
            data: None,
            active: None,
            rest: 0,
            recorded: Recorded::default(),
        }
    }

    fn greet(listener: &TcpListener) -> BufReader<TcpStream> {
        let (mut stream, _) = listener.accept().expect("no client connected");
        stream.write_all(b"220 mock ready\r\n").unwrap();
        BufReader::new(stream)
    }

    fn run(mut self, steps: Vec<Step>) -> Recorded {
        for step in steps {
            match step {
                Step::Reply(prefix, reply) => {
                    self.expect(prefix);
                    self.reply(reply);
                }
                Step::Epsv => {
                    self.expect("EPSV");
                    let port = self.listen();
                    self.reply(&format!("229 Entering Extended Passive Mode (|||{port}|)"));
                }
                Step::Pasv(host) => {
                    self.expect("PASV");
                    let port = self.listen();
                    self.reply(&format!(
                        "227 Entering Passive Mode ({host},{},{})",
                        port / 256,
                        port % 256
                    ));
                }
                Step::Active(prefix) => {
                    let command = self.expect(prefix);
                    self.active = Some(parse_active_address(&command));
                    self.reply("200 Command okay");
                }
                Step::Send(prefix, payload) => {
                    self.expect(prefix);
                    let mut data = self.open_data();
                    self.reply("150 Opening data connection");
                    let start = std::mem::take(&mut self.rest).min(payload.len());
                    data.write_all(&payload[start..]).unwrap();
                    drop(data);
                    self.reply("226 Transfer complete");
                }
                Step::SendReset(prefix, payload, cut) => {
                    self.expect(prefix);
                    let mut data = self.open_data();
                    self.reply("150 Opening data connection");
                    let start = std::mem::take(&mut self.rest).min(payload.len());
                    let end = (start + cut).min(payload.len());
                    data.write_all(&payload[start..end]).unwrap();
                    reset(data);
                    self.reply("426 Connection reset by peer");
                }
                Step::SendTruncated(prefix, payload, cut) => {
                    self.expect(prefix);
                    let mut data = self.open_data();
                    self.reply("150 Opening data connection");
                    let start = std::mem::take(&mut self.rest).min(payload.len());
                    let end = (start + cut).min(payload.len());
                    data.write_all(&payload[start..end]).unwrap();
                    drop(data);
                    self.reply("226 Transfer complete");
                }
                Step::Receive(prefix) => {
                    self.expect(prefix);
                    let mut data = self.open_data();
                    self.reply("150 Ok to send data");
                    let mut received = Vec::new();
                    data.read_to_end(&mut received).unwrap();
                    self.recorded.uploads.push(received);
                    self.reply("226 Transfer complete");
                }
                Step::ReceiveReset(prefix, cut) => {
                    self.expect(prefix);
                    let mut data = self.open_data();
                    self.reply("150 Ok to send data");
                    let mut received = vec![0u8; cut];
                    data.read_exact(&mut received).unwrap();
                    self.recorded.uploads.push(received);
                    reset(data);
                    self.reply("426 Connection reset by peer");
                }
                Step::Unsolicited(line) => self.reply(line),
                Step::Reconnect => {
                    let _ = self.control.get_ref().shutdown(Shutdown::Both);
                    self.control = Self::greet(&self.listener);
                }
            }
        }
        self.serve_quit();
        self.recorded
    }

    /// Answer whatever comes after the script until the client quits or hangs up
    fn serve_quit(&mut self) {
        while let Some(command) = self.read_command() {
            if command.starts_with("QUIT") {
                self.reply("221 Goodbye");
                break;
            }
            self.reply("500 Unexpected command");
        }
    }

    /// Read the next command, answering `REST` on the fly
    fn expect(&mut self, prefix: &str) -> String {
        loop {
            let command = self
                .read_command()
                .unwrap_or_else(|| panic!("client hung up while expecting {prefix}"));
            if let Some(offset) = command
                .strip_prefix("REST ")
                .filter(|_| !prefix.starts_with("REST"))
            {
                self.rest = offset.parse().unwrap();
                self.reply("350 Restarting");
                continue;
            }
            assert!(
                command.starts_with(prefix),
                "expected {prefix}, got {command}"
            );
            return command;
        }
    }

    fn read_command(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.control.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let command = line.trim_end_matches(['\r', '\n']).to_string();
                self.recorded.commands.push(command.clone());
                Some(command)
            }
        }
    }

    fn reply(&mut self, reply: &str) {
        let stream = self.control.get_mut();
        stream.write_all(reply.as_bytes()).unwrap();
        stream.write_all(b"\r\n").unwrap();
    }

    fn listen(&mut self) -> u16 {
        let ip = self.listener.local_addr().unwrap().ip();
        let listener = TcpListener::bind(SocketAddr::new(ip, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        self.data = Some(listener);
        port
    }

    fn open_data(&mut self) -> TcpStream {
        let stream = match (self.data.take(), self.active.take()) {
            (Some(listener), _) => listener.accept().unwrap().0,
            (None, Some(addr)) => TcpStream::connect(addr).unwrap(),
            (None, None) => panic!("no data connection negotiated"),
        };
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream
    }
}

/// Close the socket with a RST instead of a FIN
fn reset(stream: TcpStream) {
    socket2::SockRef::from(&stream)
        .set_linger(Some(Duration::ZERO))
        .unwrap();
    drop(stream);
}

/// Address of an `EPRT |af|addr|port|` or `PORT h1,h2,h3,h4,p1,p2` command
fn parse_active_address(command: &str) -> SocketAddr {
    if let Some(arg) = command.strip_prefix("EPRT ") {
        let parts: Vec<&str> = arg.split('|').collect();
        let ip: std::net::IpAddr = parts[2].parse().unwrap();
        SocketAddr::new(ip, parts[3].parse().unwrap())
    } else {
        let arg = command.strip_prefix("PORT ").unwrap();
        let numbers: Vec<u16> = arg.split(',').map(|n| n.parse().unwrap()).collect();
        let ip = Ipv4Addr::new(
            numbers[0] as u8,
            numbers[1] as u8,
            numbers[2] as u8,
            numbers[3] as u8,
        );
        SocketAddr::new(ip.into(), numbers[4] * 256 + numbers[5])
    }
}
