mod mac;
pub use mac::MacAddress;

pub mod events;
pub mod pins;
pub mod pixie;
pub mod scanner;
pub mod session;
pub mod status;
pub mod storage;
pub mod supplicant;

use std::io;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid MAC address: {wrong_input}")]
    InvalidMac { wrong_input: String },
    #[error("Invalid WPS pin algorithm: {wrong_id}")]
    InvalidAlgorithm { wrong_id: String },
    #[error("Invalid PIN format: {wrong_pin}")]
    InvalidPinFormat { wrong_pin: String },
    #[error("wpa_supplicant returned an error: {stderr}")]
    SupplicantStart { stderr: String },
    #[error("Unexpected supplicant response to `{command}`: {response}")]
    SupplicantProtocol { command: String, response: String },
    #[error("Malformed {field} hexdump: expected {expected} hex digits, got {wrong_length}")]
    ProtocolParse {
        field: &'static str,
        expected: usize,
        wrong_length: usize,
    },
    #[error("Pixiewps failed: {reason}")]
    Solver { reason: String },
    #[error("Cannot read or write {}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Interrupted by user")]
    UserAbort,
    #[error("I/O error")]
    Io(#[from] io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;
