use cohort::orchestrator::discover_submissions;
use tempfile::TempDir;

#[test]
fn finds_directories_and_zip_archives_sorted_by_id() {
    let folder = TempDir::new().expect("should create temp dir");
    std::fs::create_dir(folder.path().join("carol")).expect("should create dir");
    std::fs::write(folder.path().join("alice.zip"), b"").expect("should write file");
    std::fs::write(folder.path().join("bob.ZIP"), b"").expect("should write file");

    let submissions = discover_submissions(folder.path()).expect("discovery should succeed");
    let ids: Vec<&str> = submissions.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["alice", "bob", "carol"]);
}

#[test]
fn ignores_loose_files_that_are_not_archives() {
    let folder = TempDir::new().expect("should create temp dir");
    std::fs::create_dir(folder.path().join("alice")).expect("should create dir");
    std::fs::write(folder.path().join("notes.txt"), b"ignore me").expect("should write file");
    std::fs::write(folder.path().join("expected_output.txt"), b"42\n")
        .expect("should write file");

    let submissions = discover_submissions(folder.path()).expect("discovery should succeed");
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].id, "alice");
}

#[test]
fn directory_and_archive_with_the_same_stem_both_survive() {
    let folder = TempDir::new().expect("should create temp dir");
    std::fs::create_dir(folder.path().join("alice")).expect("should create dir");
    std::fs::write(folder.path().join("alice.zip"), b"").expect("should write file");

    let submissions = discover_submissions(folder.path()).expect("discovery should succeed");
    let mut ids: Vec<&str> = submissions.iter().map(|s| s.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"alice"));
    assert!(ids.contains(&"alice.zip"));
}

#[test]
fn empty_folder_yields_no_submissions() {
    let folder = TempDir::new().expect("should create temp dir");
    let submissions = discover_submissions(folder.path()).expect("discovery should succeed");
    assert!(submissions.is_empty());
}
