//! Lifecycle and control channel of the external `wpa_supplicant` process.

use std::fs;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::os::unix::net::UnixDatagram;
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tempfile::{NamedTempFile, TempDir};

use crate::{Error, Result};

const SUPPLICANT_BINARY: &str = "wpa_supplicant";
const DRIVER_LIST: &str = "nl80211,wext,hostapd,wired";
const SOCKET_POLL: Duration = Duration::from_millis(100);
const REPLY_BUFFER: usize = 4096;
// Debug bytes discarded before a fresh exchange starts.
const DRAIN_CHUNK: usize = 300;

/// A running supplicant: the process, its debug stream, and the datagram
/// control socket bound to a private path.
pub struct Supplicant {
    child: Child,
    stdout: BufReader<ChildStdout>,
    sock: Option<UnixDatagram>,
    sock_path: PathBuf,
    ctrl_path: PathBuf,
    config: Option<NamedTempFile>,
    tempdir: Option<TempDir>,
    closed: bool,
}

impl Supplicant {
    /// Spawn `wpa_supplicant` for `interface` and wait until its control
    /// socket appears.
    pub fn start(interface: &str) -> Result<Self> {
        println!("[*] Running wpa_supplicant…");
        let tempdir = tempfile::tempdir()?;
        let mut config = tempfile::Builder::new()
            .prefix("wpas-")
            .suffix(".conf")
            .tempfile()?;
        write!(
            config,
            "ctrl_interface={}\nctrl_interface_group=root\nupdate_config=1\n",
            tempdir.path().display()
        )?;
        config.flush()?;

        let mut child = Command::new(SUPPLICANT_BINARY)
            .arg("-K")
            .arg("-d")
            .arg(format!("-D{DRIVER_LIST}"))
            .arg(format!("-i{interface}"))
            .arg(format!("-c{}", config.path().display()))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::SupplicantStart {
                stderr: format!("cannot run {SUPPLICANT_BINARY}: {source}"),
            })?;

        let ctrl_path = tempdir.path().join(interface);
        loop {
            if let Some(status) = child.try_wait()? {
                let mut stderr = String::new();
                if let Some(mut pipe) = child.stderr.take() {
                    let _ = pipe.read_to_string(&mut stderr);
                }
                if stderr.is_empty() {
                    stderr = format!("exited with {status} before creating the control socket");
                }
                return Err(Error::SupplicantStart { stderr });
            }
            if ctrl_path.exists() {
                break;
            }
            thread::sleep(SOCKET_POLL);
        }

        let stdout = BufReader::new(
            child
                .stdout
                .take()
                .ok_or_else(|| io::Error::other("supplicant stdout not captured"))?,
        );

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos();
        let sock_path =
            std::env::temp_dir().join(format!("oneshot-{}-{nanos:08x}", std::process::id()));
        let sock = UnixDatagram::bind(&sock_path)?;

        Ok(Self {
            child,
            stdout,
            sock: Some(sock),
            sock_path,
            ctrl_path,
            config: Some(config),
            tempdir: Some(tempdir),
            closed: false,
        })
    }

    fn socket(&self) -> Result<&UnixDatagram> {
        self.sock
            .as_ref()
            .ok_or_else(|| Error::Io(io::Error::new(io::ErrorKind::NotConnected, "control socket closed")))
    }

    /// Send a control request without waiting for the reply.
    pub fn send_only(&self, command: &str) -> Result<()> {
        self.socket()?.send_to(command.as_bytes(), &self.ctrl_path)?;
        Ok(())
    }

    /// Send a control request and block for one reply datagram.
    pub fn send_and_receive(&self, command: &str) -> Result<String> {
        let sock = self.socket()?;
        sock.send_to(command.as_bytes(), &self.ctrl_path)?;
        let mut buf = [0u8; REPLY_BUFFER];
        let (len, _) = sock.recv_from(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
    }

    /// One line of the debug stream, without the trailing newline and with
    /// invalid UTF-8 replaced. `None` once the supplicant closed its
    /// stdout.
    pub fn read_event_line(&mut self) -> Result<Option<String>> {
        let mut raw = Vec::new();
        let len = self.stdout.read_until(b'\n', &mut raw)?;
        if len == 0 {
            let _ = self.child.wait();
            return Ok(None);
        }
        while matches!(raw.last(), Some(&b'\n') | Some(&b'\r')) {
            raw.pop();
        }
        Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
    }

    /// Throw away bytes queued from the previous exchange.
    pub fn drain(&mut self) {
        let mut scratch = [0u8; DRAIN_CHUNK];
        let _ = self.stdout.read(&mut scratch);
    }

    /// Terminate the process and release every on-disk resource. Safe to
    /// call more than once; also runs on drop.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.child.kill();
        let _ = self.child.wait();
        drop(self.sock.take());
        let _ = fs::remove_file(&self.sock_path);
        if let Some(config) = self.config.take() {
            let _ = config.close();
        }
        if let Some(tempdir) = self.tempdir.take() {
            let _ = tempdir.close();
        }
    }
}

impl Drop for Supplicant {
    fn drop(&mut self) {
        self.close();
    }
}
