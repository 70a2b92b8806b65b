//! Integration tests for the file-level validation pipeline.
//!
//! These exercise the checks that run before any document is decoded:
//! existence, size, extension, and the terminal sample-structure error.
//! Engine-level behavior on decoded sheets is covered by module tests.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use gridform::Gridform;

const MAX_SIZE: usize = 10 * 1024 * 1024;

/// Write a file with a controlled name (extension checks need real names).
fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("failed to write test file");
    path
}

#[test]
fn test_nonexistent_upload_is_terminal() {
    let dir = TempDir::new().unwrap();
    let sample = write_file(&dir, "sample.xlsx", b"whatever");

    let outcome = Gridform::new().validate(dir.path().join("missing.xlsx"), sample);
    assert!(!outcome.is_valid());
    assert_eq!(outcome.errors(), ["File does not exist"]);
}

#[test]
fn test_empty_upload_is_terminal() {
    let dir = TempDir::new().unwrap();
    let uploaded = write_file(&dir, "upload.xlsx", b"");
    let sample = write_file(&dir, "sample.xlsx", b"whatever");

    let outcome = Gridform::new().validate(uploaded, sample);
    assert_eq!(outcome.errors(), ["File is empty"]);
}

#[test]
fn test_upload_at_size_limit_passes_size_check() {
    // Scenario: a file of exactly the configured maximum clears the size
    // check; the next failure is the unreadable sample, not the size cap.
    let dir = TempDir::new().unwrap();
    let uploaded = write_file(&dir, "upload.xlsx", &vec![0u8; MAX_SIZE]);
    let sample = write_file(&dir, "sample.xlsx", b"not a real workbook");

    let outcome = Gridform::new().validate(uploaded, sample);
    assert_eq!(outcome.errors(), ["Could not read sample file structure"]);
}

#[test]
fn test_upload_one_byte_over_limit_is_terminal() {
    let dir = TempDir::new().unwrap();
    let uploaded = write_file(&dir, "upload.xlsx", &vec![0u8; MAX_SIZE + 1]);
    let sample = write_file(&dir, "sample.xlsx", b"whatever");

    let outcome = Gridform::new().validate(uploaded, sample);
    // The size failure is the only error: no further checks ran.
    assert_eq!(outcome.errors(), ["File size exceeds 10MB limit"]);
}

#[test]
fn test_unsupported_extension_is_terminal() {
    let dir = TempDir::new().unwrap();
    let uploaded = write_file(&dir, "upload.csv", b"a,b,c");
    let sample = write_file(&dir, "sample.xlsx", b"whatever");

    let outcome = Gridform::new().validate(uploaded, sample);
    assert_eq!(
        outcome.errors(),
        ["Unsupported file format. Only XLSX, XLS files are allowed"]
    );
}

#[test]
fn test_extension_check_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let uploaded = write_file(&dir, "UPLOAD.XLSX", b"binary junk");
    let sample = write_file(&dir, "sample.xlsx", b"binary junk");

    let outcome = Gridform::new().validate(uploaded, sample);
    // Past the extension check; fails later on the unreadable sample.
    assert_eq!(outcome.errors(), ["Could not read sample file structure"]);
}

#[test]
fn test_metadata_records_file_name_on_failure() {
    let dir = TempDir::new().unwrap();
    let uploaded = write_file(&dir, "quarterly_upload.xlsx", b"junk");
    let sample = write_file(&dir, "sample.xlsx", b"junk");

    let outcome = Gridform::new().validate(uploaded, sample);
    assert!(!outcome.is_valid());
    assert_eq!(outcome.metadata().file_name, "quarterly_upload.xlsx");
}

#[test]
fn test_validate_bytes_rejects_oversize_and_bad_extension() {
    let gridform = Gridform::new();

    let outcome = gridform.validate_bytes("upload.xlsx", &vec![0u8; MAX_SIZE + 1], b"sample");
    assert_eq!(outcome.errors(), ["File size exceeds 10MB limit"]);

    let outcome = gridform.validate_bytes("upload.txt", b"some bytes", b"sample");
    assert_eq!(
        outcome.errors(),
        ["Unsupported file format. Only XLSX, XLS files are allowed"]
    );

    let outcome = gridform.validate_bytes("upload.xlsx", b"", b"sample");
    assert_eq!(outcome.errors(), ["File is empty"]);
}

#[test]
fn test_outcome_validity_always_tracks_error_list() {
    let dir = TempDir::new().unwrap();
    let sample = write_file(&dir, "sample.xlsx", b"junk");

    let gridform = Gridform::new();
    let outcomes = vec![
        gridform.validate(dir.path().join("missing.xlsx"), &sample),
        gridform.validate_bytes("upload.xlsx", b"junk", b"junk"),
        gridform.validate_bytes("upload.pdf", b"junk", b"junk"),
    ];

    for outcome in outcomes {
        assert_eq!(outcome.is_valid(), outcome.errors().is_empty());
    }
}

#[test]
fn test_process_unreadable_upload_is_a_hard_failure() {
    // Processing, unlike validation, surfaces undecodable documents as an
    // error value rather than degrading.
    let dir = TempDir::new().unwrap();
    let uploaded = write_file(&dir, "upload.xlsx", b"junk");
    let sample = write_file(&dir, "sample.xlsx", b"junk");

    assert!(Gridform::new().process(uploaded, sample).is_err());
}
