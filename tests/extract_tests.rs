use std::io::{Cursor, Write};

use cohort::extract::{ExtractError, extract_submission};
use tempfile::TempDir;
use zip::write::{SimpleFileOptions, ZipWriter};

const SIZE_LIMIT: u64 = 1024 * 1024;

fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, contents) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(name.trim_end_matches('/'), options)
                .expect("should add directory");
        } else {
            writer.start_file(*name, options).expect("should start file");
            writer
                .write_all(contents.as_bytes())
                .expect("should write entry");
        }
    }
    writer
        .finish()
        .expect("should finish archive")
        .into_inner()
}

#[test]
fn extracts_zip_preserving_directory_layout() {
    let scratch = TempDir::new().expect("should create temp dir");
    let archive = scratch.path().join("alice.zip");
    std::fs::write(
        &archive,
        zip_bytes(&[
            ("edu/", ""),
            ("edu/Main.java", "public class Main {}"),
            ("README.txt", "notes"),
        ]),
    )
    .expect("should write archive");

    let dest = scratch.path().join("alice");
    let src_dir =
        extract_submission(&archive, &dest, SIZE_LIMIT).expect("extraction should succeed");

    let main = std::fs::read_to_string(src_dir.join("edu/Main.java"))
        .expect("extracted file should exist");
    assert_eq!(main, "public class Main {}");
    assert!(src_dir.join("README.txt").is_file());
}

#[test]
fn copies_a_plain_directory_submission() {
    let scratch = TempDir::new().expect("should create temp dir");
    let submission = scratch.path().join("bob");
    std::fs::create_dir_all(submission.join("pkg")).expect("should create submission dir");
    std::fs::write(submission.join("pkg/Main.java"), "class Main {}")
        .expect("should write source");

    let dest = scratch.path().join("work");
    let src_dir =
        extract_submission(&submission, &dest, SIZE_LIMIT).expect("copy should succeed");
    assert!(src_dir.join("pkg/Main.java").is_file());
}

#[test]
fn empty_archive_is_rejected() {
    let scratch = TempDir::new().expect("should create temp dir");
    let archive = scratch.path().join("empty.zip");
    std::fs::write(&archive, zip_bytes(&[])).expect("should write archive");

    let err = extract_submission(&archive, &scratch.path().join("work"), SIZE_LIMIT)
        .expect_err("empty archive should be rejected");
    assert!(matches!(err, ExtractError::Empty));
}

#[test]
fn zip_slip_entry_is_rejected() {
    let scratch = TempDir::new().expect("should create temp dir");
    let archive = scratch.path().join("evil.zip");
    std::fs::write(
        &archive,
        zip_bytes(&[("../outside.txt", "escaped")]),
    )
    .expect("should write archive");

    let err = extract_submission(&archive, &scratch.path().join("work"), SIZE_LIMIT)
        .expect_err("traversal entry should be rejected");
    assert!(matches!(err, ExtractError::UnsafePath(_)));
    assert!(!scratch.path().join("outside.txt").exists());
}

#[test]
fn consecutive_dots_inside_a_name_are_legal() {
    let scratch = TempDir::new().expect("should create temp dir");
    let archive = scratch.path().join("dots.zip");
    std::fs::write(
        &archive,
        zip_bytes(&[
            ("notes..txt", "fine"),
            ("a..b/Main.java", "class Main {}"),
        ]),
    )
    .expect("should write archive");

    let src_dir = extract_submission(&archive, &scratch.path().join("work"), SIZE_LIMIT)
        .expect("dotted names should extract");
    assert!(src_dir.join("notes..txt").is_file());
    assert!(src_dir.join("a..b/Main.java").is_file());
}

#[test]
fn oversized_archive_is_rejected() {
    let scratch = TempDir::new().expect("should create temp dir");
    let archive = scratch.path().join("big.zip");
    let big = "x".repeat(4096);
    std::fs::write(&archive, zip_bytes(&[("big.txt", &big)])).expect("should write archive");

    let err = extract_submission(&archive, &scratch.path().join("work"), 1024)
        .expect_err("archive above the ceiling should be rejected");
    assert!(matches!(err, ExtractError::TooLarge { .. }));
}

#[test]
fn garbage_bytes_are_unreadable() {
    let scratch = TempDir::new().expect("should create temp dir");
    let archive = scratch.path().join("junk.zip");
    std::fs::write(&archive, b"not a zip archive").expect("should write file");

    let err = extract_submission(&archive, &scratch.path().join("work"), SIZE_LIMIT)
        .expect_err("garbage should be rejected");
    assert!(matches!(err, ExtractError::Unreadable(_)));
}
