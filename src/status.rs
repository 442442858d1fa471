//! Connection-state and brute-force progress tracking.

use core::fmt;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::Local;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a WPS exchange currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WpsPhase {
    #[default]
    Idle,
    Scanning,
    Authenticating,
    Associating,
    WpsStart,
    /// M1..=M8 of the registration protocol.
    Message(u8),
    Done,
    Fail,
    Timeout,
}

impl fmt::Display for WpsPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WpsPhase::Idle => write!(f, "IDLE"),
            WpsPhase::Scanning => write!(f, "SCANNING"),
            WpsPhase::Authenticating => write!(f, "AUTHENTICATING"),
            WpsPhase::Associating => write!(f, "ASSOCIATING"),
            WpsPhase::WpsStart => write!(f, "WPS_START"),
            WpsPhase::Message(n) => write!(f, "WPS_M{n}"),
            WpsPhase::Done => write!(f, "WPS_DONE"),
            WpsPhase::Fail => write!(f, "WPS_FAIL"),
            WpsPhase::Timeout => write!(f, "WPS_TIMEOUT"),
        }
    }
}

/// Final outcome of one WPS exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminalStatus {
    #[default]
    None,
    WscNack,
    WpsFail,
    GotPsk,
}

/// Mutable state of the current connection attempt.
#[derive(Debug)]
pub struct ConnectionStatus {
    pub phase: WpsPhase,
    pub terminal: TerminalStatus,
    /// Highest WPS message number seen so far.
    pub last_m: u8,
    pub essid: String,
    pub wpa_psk: String,
    pub bssid: String,
    pub retries: u32,
    pub max_retries: u32,
    pub timeout: Duration,
    last_transition: Instant,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            phase: WpsPhase::Idle,
            terminal: TerminalStatus::None,
            last_m: 0,
            essid: String::new(),
            wpa_psk: String::new(),
            bssid: String::new(),
            retries: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            last_transition: Instant::now(),
        }
    }
}

impl ConnectionStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_phase(&mut self, phase: WpsPhase) {
        if phase != self.phase {
            self.phase = phase;
            self.last_transition = Instant::now();
            println!("[*] State changed to: {phase}");
        }
    }

    /// The registrar's M5 was accepted, meaning the enrollee moved past it.
    pub fn is_first_half_valid(&self) -> bool {
        self.last_m > 5
    }

    pub fn timed_out(&self) -> bool {
        self.last_transition.elapsed() > self.timeout
    }

    pub fn can_retry(&self) -> bool {
        self.retries < self.max_retries
    }

    /// Consume one retry; true while the budget is not exhausted.
    pub fn register_retry(&mut self) -> bool {
        self.retries += 1;
        self.can_retry()
    }

    /// Reset protocol progress for a fresh exchange. The retry budget
    /// survives so that repeated re-entry stays bounded.
    pub fn clear(&mut self) {
        let retries = self.retries;
        let max_retries = self.max_retries;
        let timeout = self.timeout;
        *self = Self::default();
        self.retries = retries;
        self.max_retries = max_retries;
        self.timeout = timeout;
    }

    /// Full reset, retry budget included.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

const ATTEMPT_WINDOW: usize = 15;
const STATISTICS_PERIOD: u32 = 5;
/// First half spans 10^4 prefixes, second half 10^3, so a complete run
/// walks at most 11000 cursor positions.
const TOTAL_CURSOR_SPACE: f64 = 11000.0;

/// Brute-force progress: cursor, attempt counter and pacing statistics.
#[derive(Debug)]
pub struct BruteforceStatus {
    pub started_at: String,
    /// Next cursor to try: a 4-digit first half, or first+second halves.
    pub cursor: String,
    counter: u32,
    attempt_times: VecDeque<f64>,
    last_attempt: Instant,
}

impl BruteforceStatus {
    pub fn new() -> Self {
        Self {
            started_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            cursor: String::new(),
            counter: 0,
            attempt_times: VecDeque::with_capacity(ATTEMPT_WINDOW),
            last_attempt: Instant::now(),
        }
    }

    /// Record one finished attempt and move the cursor; prints a progress
    /// line every few attempts.
    pub fn register_attempt(&mut self, cursor: &str) {
        self.cursor = cursor.to_string();
        self.counter += 1;
        if self.attempt_times.len() == ATTEMPT_WINDOW {
            self.attempt_times.pop_front();
        }
        self.attempt_times
            .push_back(self.last_attempt.elapsed().as_secs_f64());
        self.last_attempt = Instant::now();
        if self.counter == STATISTICS_PERIOD {
            self.counter = 0;
            self.display_status();
        }
    }

    pub fn display_status(&self) {
        let mean = if self.attempt_times.is_empty() {
            0.0
        } else {
            self.attempt_times.iter().sum::<f64>() / self.attempt_times.len() as f64
        };
        println!(
            "[*] {:.2}% complete @ {} ({:.2} seconds/pin)",
            self.percentage(),
            self.started_at,
            mean
        );
    }

    fn percentage(&self) -> f64 {
        let progress = if self.cursor.len() == 4 {
            self.cursor.parse::<f64>().unwrap_or(0.0)
        } else {
            10_000.0
                + self
                    .cursor
                    .get(4..)
                    .and_then(|tail| tail.parse::<f64>().ok())
                    .unwrap_or(0.0)
        };
        progress / TOTAL_CURSOR_SPACE * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn phase_change_updates_transition_time() {
        let mut status = ConnectionStatus::new();
        status.timeout = Duration::from_millis(20);
        thread::sleep(Duration::from_millis(30));
        assert!(status.timed_out());
        status.set_phase(WpsPhase::WpsStart);
        assert!(!status.timed_out());
    }

    #[test]
    fn first_half_valid_after_m6() {
        let mut status = ConnectionStatus::new();
        status.last_m = 5;
        assert!(!status.is_first_half_valid());
        status.last_m = 6;
        assert!(status.is_first_half_valid());
    }

    #[test]
    fn retry_budget_is_bounded() {
        let mut status = ConnectionStatus::new();
        assert!(status.register_retry());
        assert!(status.register_retry());
        assert!(!status.register_retry());
        assert_eq!(status.retries, 3);
    }

    #[test]
    fn clear_keeps_the_retry_budget() {
        let mut status = ConnectionStatus::new();
        status.last_m = 7;
        status.terminal = TerminalStatus::GotPsk;
        status.register_retry();
        status.clear();
        assert_eq!(status.last_m, 0);
        assert_eq!(status.terminal, TerminalStatus::None);
        assert_eq!(status.retries, 1);
        status.reset();
        assert_eq!(status.retries, 0);
    }

    #[test]
    fn attempt_ring_stays_bounded() {
        let mut bf = BruteforceStatus::new();
        for i in 0..40 {
            bf.register_attempt(&format!("{i:04}"));
        }
        assert!(bf.attempt_times.len() <= ATTEMPT_WINDOW);
        assert_eq!(bf.cursor, "0039");
    }

    #[test]
    fn phase_names_match_the_protocol() {
        assert_eq!(WpsPhase::Message(5).to_string(), "WPS_M5");
        assert_eq!(WpsPhase::Timeout.to_string(), "WPS_TIMEOUT");
    }
}
