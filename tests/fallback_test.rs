use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let mut cmd = Command::new(cargo_bin!("dropin"));
    cmd.args(["--db-path", "some_db", "checkout", "--brand", "card"]);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."));
}

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_resume_without_persistence_loses_context() {
    let mut cmd = Command::new(cargo_bin!("dropin"));
    cmd.args([
        "--db-path",
        "some_db",
        "resume",
        "--identity",
        "6f1c2d3e-4a5b-4c6d-8e9f-0a1b2c3d4e5f",
        "--brand",
        "paypal",
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,terminal,error,lost_context"));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut cmd = Command::new(cargo_bin!("dropin"));
    cmd.arg("--db-path")
        .arg(&db_path)
        .args(["checkout", "--brand", "card"]);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING").not());
}
