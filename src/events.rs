//! Interpretation of the supplicant debug stream: one line in, state
//! transitions and harvested handshake material out.

use colored::Colorize;

use crate::pixie::{PixieData, WPS_KEY_VERSION_1, WPS_KEY_VERSION_2};
use crate::status::{ConnectionStatus, TerminalStatus, WpsPhase};
use crate::{Error, Result};

/// What the orchestrator should do after a line was consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSignal {
    Continue,
    /// A retryable link failure (deauth, failed association, disconnect).
    Disconnected,
}

pub struct EventContext<'a> {
    pub pixie_mode: bool,
    pub pbc_mode: bool,
    pub interface: &'a str,
}

// Expected hexdump payload sizes, in hex digits.
const E_NONCE_LEN: usize = 16 * 2;
const PUBKEY_LEN: usize = 192 * 2;
const AUTHKEY_LEN: usize = 32 * 2;
const HASH_LEN: usize = 32 * 2;

/// Consume one debug line, mutating connection and Pixie state.
pub fn process_line(
    raw: &str,
    ctx: &EventContext,
    status: &mut ConnectionStatus,
    pixie: &mut PixieData,
) -> Result<EventSignal> {
    let line = raw.strip_prefix('\t').unwrap_or(raw);

    if let Some(wps) = line.strip_prefix("WPS: ") {
        process_wps_line(line, wps, ctx, status, pixie)?;
        return Ok(EventSignal::Continue);
    }

    if line.contains(": State: ") {
        if line.contains("-> SCANNING") {
            status.set_phase(WpsPhase::Scanning);
            println!("[*] Scanning…");
        }
    } else if line.contains("WPS-FAIL") {
        status.terminal = TerminalStatus::WpsFail;
        status.set_phase(WpsPhase::Fail);
        println!("{}", "[-] wpa_supplicant returned WPS-FAIL".red());
    } else if line.contains("Trying to authenticate with") {
        status.set_phase(WpsPhase::Authenticating);
        if line.contains("SSID") {
            status.essid = quoted_ssid(line);
        }
        println!("[*] Authenticating…");
    } else if line.contains("Authentication response") {
        println!("{}", "[+] Authenticated".green());
    } else if line.contains("Trying to associate with") {
        status.set_phase(WpsPhase::Associating);
        if line.contains("SSID") {
            status.essid = quoted_ssid(line);
        }
        println!("[*] Associating with AP…");
    } else if line.contains("Associated with") && line.contains(ctx.interface) {
        let bssid = line
            .split_whitespace()
            .next_back()
            .unwrap_or_default()
            .to_uppercase();
        if status.essid.is_empty() {
            println!("{}", format!("[+] Associated with {bssid}").green());
        } else {
            println!(
                "{}",
                format!("[+] Associated with {bssid} (ESSID: {})", status.essid).green()
            );
        }
    } else if line.contains("EAPOL: txStart") {
        println!("[*] Sending EAPOL Start…");
    } else if line.contains("EAP entering state IDENTITY") {
        println!("[*] Received Identity Request");
    } else if line.contains("using real identity") {
        println!("[*] Sending Identity Response…");
    } else if ctx.pbc_mode && line.contains("selected BSS ") {
        let bssid = line
            .split("selected BSS ")
            .last()
            .unwrap_or_default()
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_uppercase();
        println!("[*] Selected AP: {bssid}");
        status.bssid = bssid;
    } else if line.contains("Deauthentication notification") {
        println!("{}", "[!] Received deauthentication notification".yellow());
        if status.can_retry() {
            return Ok(EventSignal::Disconnected);
        }
    } else if line.contains("Association request to the driver failed") {
        println!("{}", "[!] Association request failed".yellow());
        if status.can_retry() {
            return Ok(EventSignal::Disconnected);
        }
    } else if line.contains("CTRL-EVENT-DISCONNECTED") {
        println!("{}", "[!] Disconnected from AP".yellow());
        if status.can_retry() {
            return Ok(EventSignal::Disconnected);
        }
    }

    Ok(EventSignal::Continue)
}

fn process_wps_line(
    line: &str,
    wps: &str,
    ctx: &EventContext,
    status: &mut ConnectionStatus,
    pixie: &mut PixieData,
) -> Result<()> {
    if let Some(tail) = wps.split("Building Message M").nth(1) {
        if let Some(n) = leading_number(tail) {
            status.last_m = n;
            status.set_phase(WpsPhase::Message(n));
            println!("[*] Sending WPS Message M{n}…");
        }
    } else if let Some(tail) = wps.split("Received M").nth(1) {
        if let Some(n) = leading_number(tail) {
            status.last_m = n;
            status.set_phase(WpsPhase::Message(n));
            println!("[*] Received WPS Message M{n}");
            if n == 5 {
                println!("{}", "[+] The first half of the PIN is valid".green());
            }
        }
    } else if wps.contains("Received WSC_NACK") {
        status.terminal = TerminalStatus::WscNack;
        status.set_phase(WpsPhase::Fail);
        println!("[*] Received WSC NACK");
        println!("{}", "[-] Error: wrong PIN code".red());
    } else if line.contains("hexdump") {
        if line.contains("Enrollee Nonce") {
            pixie.e_nonce = checked_hex(line, "E-Nonce", E_NONCE_LEN)?;
            announce_pixie(ctx, "E-Nonce", &pixie.e_nonce);
        } else if line.contains("DH own Public Key") {
            pixie.pkr = checked_hex(line, "PKR", PUBKEY_LEN)?;
            announce_pixie(ctx, "PKR", &pixie.pkr);
        } else if line.contains("DH peer Public Key") {
            pixie.pke = checked_hex(line, "PKE", PUBKEY_LEN)?;
            announce_pixie(ctx, "PKE", &pixie.pke);
        } else if line.contains("AuthKey") {
            pixie.authkey = checked_hex(line, "AuthKey", AUTHKEY_LEN)?;
            announce_pixie(ctx, "AuthKey", &pixie.authkey);
        } else if line.contains("E-Hash1") {
            pixie.e_hash1 = checked_hex(line, "E-Hash1", HASH_LEN)?;
            announce_pixie(ctx, "E-Hash1", &pixie.e_hash1);
        } else if line.contains("E-Hash2") {
            pixie.e_hash2 = checked_hex(line, "E-Hash2", HASH_LEN)?;
            announce_pixie(ctx, "E-Hash2", &pixie.e_hash2);
        } else if line.contains("Network Key") {
            status.terminal = TerminalStatus::GotPsk;
            status.set_phase(WpsPhase::Done);
            status.wpa_psk = decode_psk(&hex_tail(line));
        }
    } else if wps.contains("WPS-TIMEOUT") {
        status.set_phase(WpsPhase::Timeout);
        println!("{}", "[!] WPS operation timed out".yellow());
    } else if wps.contains("WPS-FAIL") {
        status.set_phase(WpsPhase::Fail);
        println!("{}", "[-] WPS operation failed".red());
    }

    if ctx.pixie_mode {
        collect_extended(line, pixie);
    }
    Ok(())
}

// Extra material used by the newer solver algorithms; lengths vary by
// chipset, so these are collected without assertions.
fn collect_extended(line: &str, pixie: &mut PixieData) {
    if line.contains("hexdump") {
        if line.contains("Registrar Nonce") {
            pixie.r_nonce = hex_tail(line);
            return;
        }
        if line.contains("Enrollee SNonce") {
            pixie.e_snonce = hex_tail(line);
            return;
        }
        if line.contains("Registrar SNonce") {
            pixie.r_snonce = hex_tail(line);
            return;
        }
    }
    if line.contains("Manufacturer") {
        pixie.e_manufacturer = value_tail(line);
    } else if line.contains("Model Name") {
        pixie.e_model = value_tail(line);
    } else if line.contains("Model Number") {
        pixie.e_version = value_tail(line);
    } else if line.contains("OS Version") {
        let version = value_tail(line);
        if version.contains("1.0") {
            pixie.key_version = WPS_KEY_VERSION_1;
        } else if version.contains("2.0") {
            pixie.key_version = WPS_KEY_VERSION_2;
        }
    }
}

fn announce_pixie(ctx: &EventContext, name: &str, value: &str) {
    if ctx.pixie_mode {
        println!("{}", format!("[P] {name}: {value}").cyan());
    }
}

fn leading_number(tail: &str) -> Option<u8> {
    let digits: String = tail.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// The hexdump payload: everything after the second colon, spaces removed,
/// uppercased.
fn hex_tail(line: &str) -> String {
    line.splitn(4, ':')
        .nth(2)
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn checked_hex(line: &str, field: &'static str, expected: usize) -> Result<String> {
    let hex = hex_tail(line);
    if hex.len() != expected || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::ProtocolParse {
            field,
            expected,
            wrong_length: hex.len(),
        });
    }
    Ok(hex)
}

/// Everything after the first colon, trimmed.
fn value_tail(line: &str) -> String {
    line.splitn(2, ':').nth(1).unwrap_or_default().trim().to_string()
}

fn decode_psk(hex: &str) -> String {
    let bytes: Vec<u8> = hex
        .as_bytes()
        .chunks(2)
        .filter(|pair| pair.len() == 2)
        .filter_map(|pair| u8::from_str_radix(core::str::from_utf8(pair).ok()?, 16).ok())
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// The SSID between the first and last single quote, escape-decoded with
/// invalid UTF-8 rendered as replacement characters.
fn quoted_ssid(line: &str) -> String {
    let Some(start) = line.find('\'') else {
        return String::new();
    };
    let end = line.rfind('\'').unwrap_or(start);
    if end <= start {
        return String::new();
    }
    decode_escaped(&line[start + 1..end])
}

// Generic-escape decode to bytes, then byte-preserving lossy UTF-8.
pub(crate) fn decode_escaped(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('x') => {
                let hi = chars.next();
                let lo = chars.next();
                match (hi, lo) {
                    (Some(hi), Some(lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                        let value = (hi.to_digit(16).unwrap() * 16 + lo.to_digit(16).unwrap()) as u8;
                        bytes.push(value);
                    }
                    _ => bytes.extend_from_slice(b"\\x"),
                }
            }
            Some('n') => bytes.push(b'\n'),
            Some('t') => bytes.push(b'\t'),
            Some('r') => bytes.push(b'\r'),
            Some('0') => bytes.push(0),
            Some('\\') => bytes.push(b'\\'),
            Some('\'') => bytes.push(b'\''),
            Some('"') => bytes.push(b'"'),
            Some(other) => {
                bytes.push(b'\\');
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => bytes.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixie::PixieData;
    use crate::status::{ConnectionStatus, TerminalStatus, WpsPhase};

    fn ctx(pixie_mode: bool) -> EventContext<'static> {
        EventContext {
            pixie_mode,
            pbc_mode: false,
            interface: "wlan0",
        }
    }

    fn feed(line: &str, c: &EventContext, status: &mut ConnectionStatus, pixie: &mut PixieData) -> EventSignal {
        process_line(line, c, status, pixie).unwrap()
    }

    #[test]
    fn message_progress_is_tracked() {
        let mut status = ConnectionStatus::new();
        let mut pixie = PixieData::new();
        let c = ctx(false);
        feed("WPS: Building Message M1", &c, &mut status, &mut pixie);
        assert_eq!(status.last_m, 1);
        assert_eq!(status.phase, WpsPhase::Message(1));
        feed("WPS: Received M2D", &c, &mut status, &mut pixie);
        assert_eq!(status.last_m, 2);
        feed("WPS: Received M5", &c, &mut status, &mut pixie);
        assert_eq!(status.phase, WpsPhase::Message(5));
    }

    #[test]
    fn wsc_nack_is_terminal() {
        let mut status = ConnectionStatus::new();
        let mut pixie = PixieData::new();
        feed("WPS: Received WSC_NACK", &ctx(false), &mut status, &mut pixie);
        assert_eq!(status.terminal, TerminalStatus::WscNack);
        assert_eq!(status.phase, WpsPhase::Fail);
    }

    #[test]
    fn hexdump_fields_land_in_the_pixie_record() {
        let mut status = ConnectionStatus::new();
        let mut pixie = PixieData::new();
        let c = ctx(true);
        let nonce = "aa ".repeat(16);
        feed(
            &format!("WPS: Enrollee Nonce - hexdump(len=16): {nonce}"),
            &c,
            &mut status,
            &mut pixie,
        );
        assert_eq!(pixie.e_nonce, "AA".repeat(16));
        let key = "0b ".repeat(192);
        feed(
            &format!("WPS: DH peer Public Key - hexdump(len=192): {key}"),
            &c,
            &mut status,
            &mut pixie,
        );
        assert_eq!(pixie.pke.len(), 384);
        feed(
            &format!("WPS: DH own Public Key - hexdump(len=192): {key}"),
            &c,
            &mut status,
            &mut pixie,
        );
        let hash = "3c ".repeat(32);
        feed(&format!("WPS: AuthKey - hexdump(len=32): {hash}"), &c, &mut status, &mut pixie);
        feed(&format!("WPS: E-Hash1 - hexdump(len=32): {hash}"), &c, &mut status, &mut pixie);
        feed(&format!("WPS: E-Hash2 - hexdump(len=32): {hash}"), &c, &mut status, &mut pixie);
        assert!(pixie.got_basic());
    }

    #[test]
    fn short_hexdump_is_a_hard_error() {
        let mut status = ConnectionStatus::new();
        let mut pixie = PixieData::new();
        let res = process_line(
            "WPS: Enrollee Nonce - hexdump(len=16): aa bb",
            &ctx(false),
            &mut status,
            &mut pixie,
        );
        assert!(res.is_err());
    }

    #[test]
    fn network_key_completes_the_exchange() {
        let mut status = ConnectionStatus::new();
        let mut pixie = PixieData::new();
        // "s3cret_k3y" in hex.
        feed(
            "WPS: Network Key - hexdump(len=10): 73 33 63 72 65 74 5f 6b 33 79",
            &ctx(false),
            &mut status,
            &mut pixie,
        );
        assert_eq!(status.terminal, TerminalStatus::GotPsk);
        assert_eq!(status.phase, WpsPhase::Done);
        assert_eq!(status.wpa_psk, "s3cret_k3y");
    }

    #[test]
    fn extended_fields_only_collected_in_pixie_mode() {
        let mut status = ConnectionStatus::new();
        let mut pixie = PixieData::new();
        let nonce = "1f ".repeat(16);
        let line = format!("WPS: Registrar Nonce - hexdump(len=16): {nonce}");
        feed(&line, &ctx(false), &mut status, &mut pixie);
        assert!(pixie.r_nonce.is_empty());
        feed(&line, &ctx(true), &mut status, &mut pixie);
        assert_eq!(pixie.r_nonce, "1F".repeat(16));
    }

    #[test]
    fn os_version_sets_the_key_version() {
        let mut status = ConnectionStatus::new();
        let mut pixie = PixieData::new();
        feed("WPS: OS Version: 2.0", &ctx(true), &mut status, &mut pixie);
        assert_eq!(pixie.key_version, 0x20);
        feed("WPS: OS Version: 1.0", &ctx(true), &mut status, &mut pixie);
        assert_eq!(pixie.key_version, 0x10);
    }

    #[test]
    fn essid_is_captured_from_association_lines() {
        let mut status = ConnectionStatus::new();
        let mut pixie = PixieData::new();
        feed(
            "wlan0: Trying to associate with aa:bb:cc:dd:ee:ff (SSID='My AP' freq=2412 MHz)",
            &ctx(false),
            &mut status,
            &mut pixie,
        );
        assert_eq!(status.essid, "My AP");
        assert_eq!(status.phase, WpsPhase::Associating);
    }

    #[test]
    fn essid_escapes_decode_lossily() {
        assert_eq!(decode_escaped("caf\\xc3\\xa9"), "café");
        // A lone continuation byte renders as the replacement character.
        assert_eq!(decode_escaped("bad\\xff"), "bad\u{FFFD}");
        assert_eq!(decode_escaped("tab\\there"), "tab\there");
    }

    #[test]
    fn disconnect_signals_retry_while_budget_remains() {
        let mut status = ConnectionStatus::new();
        let mut pixie = PixieData::new();
        let c = ctx(false);
        assert_eq!(
            feed("wlan0: CTRL-EVENT-DISCONNECTED bssid=aa:bb:cc:dd:ee:ff", &c, &mut status, &mut pixie),
            EventSignal::Disconnected
        );
        status.retries = status.max_retries;
        assert_eq!(
            feed("wlan0: CTRL-EVENT-DISCONNECTED bssid=aa:bb:cc:dd:ee:ff", &c, &mut status, &mut pixie),
            EventSignal::Continue
        );
    }

    #[test]
    fn wps_fail_event_sets_the_terminal_status() {
        let mut status = ConnectionStatus::new();
        let mut pixie = PixieData::new();
        feed(
            "wlan0: WPS-FAIL msg=8 config_error=15",
            &ctx(false),
            &mut status,
            &mut pixie,
        );
        assert_eq!(status.terminal, TerminalStatus::WpsFail);
        assert_eq!(status.phase, WpsPhase::Fail);
    }

    #[test]
    fn leading_tab_is_stripped() {
        let mut status = ConnectionStatus::new();
        let mut pixie = PixieData::new();
        feed("\tWPS: Received M3", &ctx(false), &mut status, &mut pixie);
        assert_eq!(status.last_m, 3);
    }
}
