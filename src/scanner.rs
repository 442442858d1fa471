//! `iw` scan parsing and interactive target selection.

use std::io::{self, BufRead, Write};
use std::process::Command;

use colored::Colorize;
use regex::Regex;

use crate::events::decode_escaped;
use crate::{Error, Result};

/// One access point from a scan.
#[derive(Debug, Clone, Default)]
pub struct NetworkInfo {
    pub bssid: String,
    pub essid: String,
    pub level: i32,
    pub security: String,
    /// WPS IE version string; empty when the AP does not advertise WPS.
    pub wps_version: String,
    pub wps_locked: bool,
    pub model: String,
    pub model_number: String,
    pub device_name: String,
}

impl NetworkInfo {
    fn new() -> Self {
        Self {
            security: "Unknown".to_string(),
            ..Self::default()
        }
    }

    fn model_line(&self) -> String {
        format!("{} {}", self.model, self.model_number)
    }
}

pub struct WifiScanner {
    interface: String,
    vuln_list: Vec<String>,
    stored: Vec<(String, String)>,
}

struct Matchers {
    bss: Regex,
    ssid: Regex,
    level: Regex,
    capability: Regex,
    rsn: Regex,
    wpa: Regex,
    wps: Regex,
    locked: Regex,
    model: Regex,
    model_number: Regex,
    device_name: Regex,
}

impl Matchers {
    fn new() -> Self {
        Self {
            bss: Regex::new(r"^BSS (\S+?)( )?\(on \w+\)").unwrap(),
            ssid: Regex::new(r"^SSID: (.*)").unwrap(),
            level: Regex::new(r"^signal: ([+-]?([0-9]*[.])?[0-9]+) dBm").unwrap(),
            capability: Regex::new(r"^capability: (.+)").unwrap(),
            rsn: Regex::new(r"^RSN:\t \* Version: \d+").unwrap(),
            wpa: Regex::new(r"^WPA:\t \* Version: \d+").unwrap(),
            wps: Regex::new(r"^WPS:\t \* Version: (([0-9]*[.])?[0-9]+)").unwrap(),
            locked: Regex::new(r"^ \* AP setup locked: (0x[0-9]+)").unwrap(),
            model: Regex::new(r"^ \* Model: (.*)").unwrap(),
            model_number: Regex::new(r"^ \* Model Number: (.*)").unwrap(),
            device_name: Regex::new(r"^ \* Device name: (.*)").unwrap(),
        }
    }
}

impl WifiScanner {
    pub fn new(interface: &str, vuln_list: Vec<String>, stored: Vec<(String, String)>) -> Self {
        Self {
            interface: interface.to_string(),
            vuln_list,
            stored,
        }
    }

    /// Run one `iw` scan and keep the WPS-capable networks, strongest
    /// signal first.
    pub fn scan(&self) -> Result<Vec<NetworkInfo>> {
        let output = Command::new("iw")
            .args(["dev", &self.interface, "scan"])
            .output()?;
        let text = String::from_utf8_lossy(&output.stdout);
        for line in text.lines() {
            if line.starts_with("command failed:") {
                println!("{}", format!("[!] Error: {line}").yellow());
                return Err(Error::Io(io::Error::other(line.to_string())));
            }
        }
        Ok(parse_scan(&text))
    }

    /// Scan, render the result table, and let the user pick a target.
    /// Returns the chosen BSSID, or `None` when no WPS network is in range.
    pub fn prompt_network(&self, reverse: bool) -> Result<Option<String>> {
        loop {
            let mut networks = self.scan()?;
            if networks.is_empty() {
                println!("{}", "[-] No WPS networks found.".red());
                return Ok(None);
            }
            if reverse {
                networks.reverse();
            }
            self.print_table(&networks);

            loop {
                print!("Select target (press Enter to refresh): ");
                io::stdout().flush()?;
                let mut answer = String::new();
                if io::stdin().lock().read_line(&mut answer)? == 0 {
                    return Err(Error::UserAbort);
                }
                let answer = answer.trim().to_lowercase();
                if answer.is_empty() || answer == "r" || answer == "0" {
                    break;
                }
                match answer.parse::<usize>() {
                    Ok(n) if n >= 1 && n <= networks.len() => {
                        return Ok(Some(networks[n - 1].bssid.clone()));
                    }
                    _ => println!("Invalid number"),
                }
            }
        }
    }

    fn print_table(&self, networks: &[NetworkInfo]) {
        if !self.vuln_list.is_empty() {
            println!(
                "Network marks: {} | {} | {}",
                "Possibly vulnerable".green(),
                "WPS locked".red(),
                "Already stored".yellow()
            );
        }
        println!("Networks list:");
        println!(
            "{:<4} {:<18} {:<25} {:<8} {:<4} {:<27} {:<}",
            "#", "BSSID", "ESSID", "Sec.", "PWR", "WSC device name", "WSC model"
        );
        for (i, network) in networks.iter().enumerate() {
            let line = format!(
                "{:<4} {:<18} {:<25} {:<8} {:<4} {:<27} {:<}",
                format!("{})", i + 1),
                network.bssid,
                truncate(&network.essid, 25),
                network.security,
                network.level,
                truncate(&network.device_name, 27),
                network.model_line()
            );
            if self
                .stored
                .iter()
                .any(|(bssid, essid)| *bssid == network.bssid && *essid == network.essid)
            {
                println!("{}", line.yellow());
            } else if network.wps_locked {
                println!("{}", line.red());
            } else if self.vuln_list.contains(&network.model_line()) {
                println!("{}", line.green());
            } else {
                println!("{line}");
            }
        }
    }
}

fn parse_scan(text: &str) -> Vec<NetworkInfo> {
    let matchers = Matchers::new();
    let mut networks: Vec<NetworkInfo> = Vec::new();
    for raw in text.lines() {
        let line = raw.trim_matches('\t');
        if let Some(caps) = matchers.bss.captures(line) {
            let mut network = NetworkInfo::new();
            network.bssid = caps[1].to_uppercase();
            networks.push(network);
            continue;
        }
        let Some(network) = networks.last_mut() else {
            continue;
        };
        if let Some(caps) = matchers.ssid.captures(line) {
            network.essid = decode_escaped(&caps[1]);
        } else if let Some(caps) = matchers.level.captures(line) {
            network.level = caps[1].parse::<f64>().unwrap_or(0.0) as i32;
        } else if let Some(caps) = matchers.capability.captures(line) {
            network.security = if caps[1].contains("Privacy") {
                "WEP".to_string()
            } else {
                "Open".to_string()
            };
        } else if matchers.rsn.is_match(line) {
            network.security = match network.security.as_str() {
                "WEP" | "Open" | "Unknown" => "WPA2".to_string(),
                "WPA" => "WPA/WPA2".to_string(),
                other => other.to_string(),
            };
        } else if matchers.wpa.is_match(line) {
            network.security = match network.security.as_str() {
                "WEP" | "Open" | "Unknown" => "WPA".to_string(),
                "WPA2" => "WPA/WPA2".to_string(),
                other => other.to_string(),
            };
        } else if let Some(caps) = matchers.wps.captures(line) {
            network.wps_version = caps[1].to_string();
        } else if let Some(caps) = matchers.locked.captures(line) {
            network.wps_locked = u32::from_str_radix(caps[1].trim_start_matches("0x"), 16)
                .map(|flag| flag != 0)
                .unwrap_or(false);
        } else if let Some(caps) = matchers.model.captures(line) {
            network.model = decode_escaped(&caps[1]);
        } else if let Some(caps) = matchers.model_number.captures(line) {
            network.model_number = decode_escaped(&caps[1]);
        } else if let Some(caps) = matchers.device_name.captures(line) {
            network.device_name = decode_escaped(&caps[1]);
        }
    }
    let mut networks: Vec<NetworkInfo> = networks
        .into_iter()
        .filter(|n| !n.wps_version.is_empty())
        .collect();
    networks.sort_by_key(|n| core::cmp::Reverse(n.level));
    networks
}

fn truncate(s: &str, length: usize) -> String {
    if s.chars().count() > length {
        let cut: String = s.chars().take(length.saturating_sub(1)).collect();
        format!("{cut}…")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCAN_OUTPUT: &str = "\
BSS aa:bb:cc:dd:ee:ff(on wlan0)
\tsignal: -44.00 dBm
\tcapability: ESS Privacy ShortSlotTime (0x0411)
\tSSID: HomeNet
\tRSN:\t * Version: 1
\tWPS:\t * Version: 1.0
\t\t * Model: Archer C7
\t\t * Model Number: 2.0
\t\t * Device name: ArcherC7
BSS 11:22:33:44:55:66(on wlan0)
\tsignal: -60.00 dBm
\tcapability: ESS (0x0401)
\tSSID: OpenNet
BSS 22:33:44:55:66:77(on wlan0)
\tsignal: -30.00 dBm
\tcapability: ESS Privacy (0x0411)
\tSSID: LockedNet
\tWPA:\t * Version: 1
\tRSN:\t * Version: 1
\tWPS:\t * Version: 2.0
\t\t * AP setup locked: 0x01
";

    #[test]
    fn keeps_only_wps_networks_sorted_by_signal() {
        let networks = parse_scan(SCAN_OUTPUT);
        assert_eq!(networks.len(), 2);
        assert_eq!(networks[0].bssid, "22:33:44:55:66:77");
        assert_eq!(networks[1].bssid, "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn collects_wsc_device_fields() {
        let networks = parse_scan(SCAN_OUTPUT);
        let home = networks.iter().find(|n| n.essid == "HomeNet").unwrap();
        assert_eq!(home.model, "Archer C7");
        assert_eq!(home.model_number, "2.0");
        assert_eq!(home.device_name, "ArcherC7");
        assert_eq!(home.level, -44);
        assert!(!home.wps_locked);
    }

    #[test]
    fn security_accumulates_across_ies() {
        let networks = parse_scan(SCAN_OUTPUT);
        let home = networks.iter().find(|n| n.essid == "HomeNet").unwrap();
        assert_eq!(home.security, "WPA2");
        let locked = networks.iter().find(|n| n.essid == "LockedNet").unwrap();
        assert_eq!(locked.security, "WPA/WPA2");
        assert!(locked.wps_locked);
    }

    #[test]
    fn truncation_marks_long_names() {
        assert_eq!(truncate("short", 25), "short");
        assert_eq!(truncate("abcdefghij", 6), "abcde…");
    }
}
