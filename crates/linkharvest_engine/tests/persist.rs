use std::fs;

use linkharvest_engine::{ensure_output_dir, write_atomic, PersistError};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out").join("nested");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
    assert_eq!(fs::read_dir(&new_dir).unwrap().count(), 0);
}

#[test]
fn output_dir_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let err = ensure_output_dir(&file_path).unwrap_err();
    assert!(matches!(err, PersistError::OutputDir(_)));
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("doc.csv");

    write_atomic(&target, b"hello").unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "hello");

    write_atomic(&target, b"world").unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "world");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let result = write_atomic(&file_path.join("doc.csv"), b"data");
    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&file_path).unwrap(), "x");
}

#[test]
fn atomic_write_creates_missing_parent() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("reports").join("links.csv");

    write_atomic(&target, b"title,url\r\n").unwrap();

    assert_eq!(fs::read(&target).unwrap(), b"title,url\r\n");
}
