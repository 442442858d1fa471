//! On-disk layout: brute-force session cursors, memoized PINs, and
//! success reports.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::{Error, Result};

const APP_DIR: &str = ".OneShot";
const SESSIONS_DIR: &str = "sessions";
const PIXIEWPS_DIR: &str = "pixiewps";
const REPORTS_DIR: &str = "reports";
const REPORT_STEM: &str = "stored";
const CSV_HEADER: [&str; 5] = ["Date", "BSSID", "ESSID", "WPS PIN", "WPA PSK"];

/// Per-user directories for resumable state and reports.
pub struct Storage {
    sessions_dir: PathBuf,
    pixiewps_dir: PathBuf,
    reports_dir: PathBuf,
}

fn persistence_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::Persistence {
        path: path.to_path_buf(),
        source,
    }
}

impl Storage {
    /// Open the storage layout, creating the state directories if missing.
    /// The reports directory lives next to the executable and is created
    /// lazily on first write.
    pub fn open() -> Result<Self> {
        let base = home::home_dir()
            .ok_or_else(|| Error::Persistence {
                path: PathBuf::from("~"),
                source: std::io::Error::other("cannot determine home directory"),
            })?
            .join(APP_DIR);
        let sessions_dir = base.join(SESSIONS_DIR);
        let pixiewps_dir = base.join(PIXIEWPS_DIR);
        fs::create_dir_all(&sessions_dir).map_err(persistence_error(&sessions_dir))?;
        fs::create_dir_all(&pixiewps_dir).map_err(persistence_error(&pixiewps_dir))?;

        let reports_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_default()
            .join(REPORTS_DIR);

        Ok(Self {
            sessions_dir,
            pixiewps_dir,
            reports_dir,
        })
    }

    /// A layout rooted at explicit directories.
    pub fn at(sessions_dir: PathBuf, pixiewps_dir: PathBuf, reports_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&sessions_dir).map_err(persistence_error(&sessions_dir))?;
        fs::create_dir_all(&pixiewps_dir).map_err(persistence_error(&pixiewps_dir))?;
        Ok(Self {
            sessions_dir,
            pixiewps_dir,
            reports_dir,
        })
    }

    pub fn stored_report_path(&self) -> PathBuf {
        self.reports_dir.join(format!("{REPORT_STEM}.csv"))
    }

    fn run_file(dir: &Path, bssid: &str) -> PathBuf {
        dir.join(format!("{}.run", bssid.replace(':', "").to_uppercase()))
    }

    /// The saved brute-force cursor for this AP, if any.
    pub fn load_session(&self, bssid: &str) -> Option<String> {
        read_first_line(&Self::run_file(&self.sessions_dir, bssid))
    }

    /// Persist the next cursor to try. The write is atomic so an interrupt
    /// mid-write cannot corrupt a resumable session.
    pub fn save_session(&self, bssid: &str, cursor: &str) -> Result<PathBuf> {
        let path = Self::run_file(&self.sessions_dir, bssid);
        write_atomic(&path, cursor)?;
        Ok(path)
    }

    pub fn remove_session(&self, bssid: &str) {
        let _ = fs::remove_file(Self::run_file(&self.sessions_dir, bssid));
    }

    /// The memoized last-known PIN for this AP, if any.
    pub fn load_pin(&self, bssid: &str) -> Option<String> {
        read_first_line(&Self::run_file(&self.pixiewps_dir, bssid))
    }

    pub fn save_pin(&self, bssid: &str, pin: &str) -> Result<PathBuf> {
        let path = Self::run_file(&self.pixiewps_dir, bssid);
        write_atomic(&path, pin)?;
        Ok(path)
    }

    pub fn remove_pin(&self, bssid: &str) {
        let _ = fs::remove_file(Self::run_file(&self.pixiewps_dir, bssid));
    }

    /// Append the recovered credentials to the human-readable and CSV
    /// report files.
    pub fn save_report(&self, bssid: &str, essid: &str, pin: &str, psk: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.reports_dir).map_err(persistence_error(&self.reports_dir))?;
        let date = Local::now().format("%d.%m.%Y %H:%M").to_string();

        let txt_path = self.reports_dir.join(format!("{REPORT_STEM}.txt"));
        let mut txt = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&txt_path)
            .map_err(persistence_error(&txt_path))?;
        writeln!(
            txt,
            "{date}\nBSSID: {bssid}\nESSID: {essid}\nWPS PIN: {pin}\nWPA PSK: {psk}\n"
        )
        .map_err(persistence_error(&txt_path))?;

        let csv_path = self.stored_report_path();
        let write_header = !csv_path.is_file();
        let mut csv = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&csv_path)
            .map_err(persistence_error(&csv_path))?;
        if write_header {
            writeln!(csv, "{}", csv_row(&CSV_HEADER)).map_err(persistence_error(&csv_path))?;
        }
        writeln!(csv, "{}", csv_row(&[&date, bssid, essid, pin, psk]))
            .map_err(persistence_error(&csv_path))?;

        Ok(self.reports_dir.clone())
    }
}

fn read_first_line(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    Some(content.lines().next().unwrap_or_default().trim().to_string())
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content).map_err(persistence_error(&tmp))?;
    fs::rename(&tmp, path).map_err(persistence_error(path))?;
    Ok(())
}

// Semicolon-separated, every field quoted, embedded quotes doubled.
fn csv_row(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| format!("\"{}\"", field.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(";")
}

/// Parse the stored CSV into `(BSSID, ESSID)` pairs for the scanner's
/// already-cracked marks.
pub fn read_stored_pairs(csv_path: &Path) -> Vec<(String, String)> {
    let Ok(content) = fs::read_to_string(csv_path) else {
        return Vec::new();
    };
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields = parse_csv_row(line);
            match (fields.get(1), fields.get(2)) {
                (Some(bssid), Some(essid)) => Some((bssid.clone(), essid.clone())),
                _ => None,
            }
        })
        .collect()
}

fn parse_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                fields.push(core::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_are_fully_quoted() {
        assert_eq!(
            csv_row(&["a", "b;c", "d\"e"]),
            "\"a\";\"b;c\";\"d\"\"e\""
        );
    }

    #[test]
    fn csv_row_round_trip() {
        let row = csv_row(&["01.01.2026 12:00", "AA:BB:CC:DD:EE:FF", "Home; sweet \"home\""]);
        assert_eq!(
            parse_csv_row(&row),
            ["01.01.2026 12:00", "AA:BB:CC:DD:EE:FF", "Home; sweet \"home\""]
        );
    }
}
