//! Decoder Integration Tests
//!
//! Tests for candidate encoding precedence and the two failure modes.

use rollcall::ingest::{decode, DecodeError, Encoding};
use rollcall::extract;
use tempfile::TempDir;

#[test]
fn test_utf8_file_decodes_as_utf8() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("card.txt");
    std::fs::write(&path, "ФИО: Иванов Иван\nГруппа: ИС-21\n").unwrap();

    let decoded = decode(&path).unwrap();

    assert_eq!(decoded.encoding, Encoding::Utf8);
    assert!(decoded.text.contains("Иванов Иван"));
}

#[test]
fn test_koi8r_file_falls_through_cp1251() {
    // "≤" encodes to 0x98, which windows-1251 leaves unassigned
    let (bytes, _, had_errors) = encoding_rs::KOI8_R.encode("Имя: Петров ≤5\nГруппа: ИС-21\n");
    assert!(!had_errors);
    assert!(bytes.contains(&0x98));

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("koi8.txt");
    std::fs::write(&path, &bytes).unwrap();

    let decoded = decode(&path).unwrap();

    assert_eq!(decoded.encoding, Encoding::Koi8R);
    assert_eq!(decoded.text, "Имя: Петров ≤5\nГруппа: ИС-21\n");

    let record = extract(&decoded.text);
    assert_eq!(record.name.as_deref(), Some("Петров ≤5"));
    assert_eq!(record.group.as_deref(), Some("ИС-21"));
}

#[test]
fn test_cp1251_only_file_still_decodes() {
    // "ФИО: Иванов" encoded as windows-1251, which is not valid UTF-8
    let (bytes, _, had_errors) = encoding_rs::WINDOWS_1251.encode("ФИО: Иванов\nID: 42\n");
    assert!(!had_errors);
    assert!(std::str::from_utf8(&bytes).is_err());

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("legacy.txt");
    std::fs::write(&path, &bytes).unwrap();

    let decoded = decode(&path).unwrap();

    // Never tagged with the earlier encoding that rejected it
    assert_ne!(decoded.encoding, Encoding::Utf8);
    assert_eq!(decoded.encoding, Encoding::Windows1251);
    assert_eq!(decoded.text, "ФИО: Иванов\nID: 42\n");

    let record = extract(&decoded.text);
    assert_eq!(record.name.as_deref(), Some("Иванов"));
    assert_eq!(record.id.as_deref(), Some("42"));
}

#[test]
fn test_missing_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let err = decode(temp.path().join("nope.txt")).unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(err, DecodeError::NotFound { .. }));
}

#[test]
fn test_directory_is_not_found() {
    let temp = TempDir::new().unwrap();
    let err = decode(temp.path()).unwrap_err();

    assert!(err.is_not_found());
}

#[test]
fn test_candidate_order_is_fixed() {
    assert_eq!(
        Encoding::CANDIDATES,
        [
            Encoding::Utf8,
            Encoding::Windows1251,
            Encoding::Koi8R,
            Encoding::Latin1
        ]
    );
    let names: Vec<_> = Encoding::CANDIDATES.iter().map(|e| e.as_str()).collect();
    assert_eq!(names, vec!["utf-8", "windows-1251", "koi8-r", "iso-8859-1"]);
}
