use std::fs;

use oneshot::storage::{Storage, read_stored_pairs};

fn layout(root: &std::path::Path) -> Storage {
    Storage::at(
        root.join("sessions"),
        root.join("pixiewps"),
        root.join("reports"),
    )
    .expect("create storage layout")
}

#[test]
fn test_session_cursor_round_trip() {
    let root = tempfile::tempdir().unwrap();
    let storage = layout(root.path());

    assert_eq!(storage.load_session("AA:BB:CC:DD:EE:FF"), None);
    storage.save_session("AA:BB:CC:DD:EE:FF", "0421").unwrap();
    assert_eq!(
        storage.load_session("AA:BB:CC:DD:EE:FF"),
        Some("0421".to_string())
    );

    // The cursor file is keyed by the BSSID without separators.
    assert!(root.path().join("sessions/AABBCCDDEEFF.run").is_file());
    // The atomic write leaves no temporary behind.
    assert!(!root.path().join("sessions/AABBCCDDEEFF.tmp").is_file());

    storage.remove_session("AA:BB:CC:DD:EE:FF");
    assert_eq!(storage.load_session("AA:BB:CC:DD:EE:FF"), None);
}

#[test]
fn test_resume_returns_the_exact_saved_cursor() {
    let root = tempfile::tempdir().unwrap();
    let storage = layout(root.path());
    for cursor in ["0000", "9999", "1234567"] {
        storage.save_session("aa:bb:cc:00:11:22", cursor).unwrap();
        assert_eq!(
            storage.load_session("aa:bb:cc:00:11:22").as_deref(),
            Some(cursor)
        );
    }
}

#[test]
fn test_pin_memo_round_trip() {
    let root = tempfile::tempdir().unwrap();
    let storage = layout(root.path());
    storage.save_pin("AA:BB:CC:DD:EE:FF", "12345670").unwrap();
    assert_eq!(
        storage.load_pin("AA:BB:CC:DD:EE:FF"),
        Some("12345670".to_string())
    );
    storage.remove_pin("AA:BB:CC:DD:EE:FF");
    assert_eq!(storage.load_pin("AA:BB:CC:DD:EE:FF"), None);
}

#[test]
fn test_report_has_header_and_quoted_rows() {
    let root = tempfile::tempdir().unwrap();
    let storage = layout(root.path());

    storage
        .save_report("AA:BB:CC:DD:EE:FF", "Home; \"net\"", "12345670", "pass phrase")
        .unwrap();
    storage
        .save_report("11:22:33:44:55:66", "Other", "00000000", "qwerty")
        .unwrap();

    let csv = fs::read_to_string(root.path().join("reports/stored.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "\"Date\";\"BSSID\";\"ESSID\";\"WPS PIN\";\"WPA PSK\"");
    assert!(lines[1].contains("\"Home; \"\"net\"\"\""));

    let txt = fs::read_to_string(root.path().join("reports/stored.txt")).unwrap();
    assert!(txt.contains("BSSID: AA:BB:CC:DD:EE:FF"));
    assert!(txt.contains("WPA PSK: pass phrase"));

    let pairs = read_stored_pairs(&storage.stored_report_path());
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].0, "AA:BB:CC:DD:EE:FF");
    assert_eq!(pairs[0].1, "Home; \"net\"");
}
