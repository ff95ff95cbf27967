use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn splitbook(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("splitbook").unwrap();
    cmd.env("HOME", home).env("NO_COLOR", "1").env_remove("SPLITBOOK_LOG");
    cmd
}

fn init(home: &Path) {
    let data = home.join("data");
    splitbook(home)
        .args(["init", "--data-dir"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized splitbook at"));
}

#[test]
fn test_add_list_summary() {
    let home = tempfile::tempdir().unwrap();
    init(home.path());

    splitbook(home.path())
        .args([
            "add",
            "--amount",
            "100,00",
            "--person",
            "Joel",
            "--category",
            "Shared (50/50)",
            "--description",
            "Lidl",
            "--date",
            "01/05/2024",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added expense #1"));

    splitbook(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Lidl"))
        .stdout(predicate::str::contains("2024-01-05"))
        .stdout(predicate::str::contains("Showing 1 of 1 expenses"));

    splitbook(home.path())
        .args(["list", "--person", "Ana"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No expenses match the current filters"));

    splitbook(home.path())
        .arg("summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("Settlement"))
        .stdout(predicate::str::contains("50.00 kr"));
}

#[test]
fn test_init_expands_home_in_data_dir() {
    let home = tempfile::tempdir().unwrap();
    let cwd = tempfile::tempdir().unwrap();
    splitbook(home.path())
        .current_dir(cwd.path())
        .args(["init", "--data-dir", "~/books"])
        .assert()
        .success();
    assert!(home.path().join("books").join("splitbook.db").exists());
    assert!(!cwd.path().join("~").exists());
}

#[test]
fn test_empty_list() {
    let home = tempfile::tempdir().unwrap();
    init(home.path());
    splitbook(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No expenses yet"));
}

#[test]
fn test_add_rejects_unknown_person() {
    let home = tempfile::tempdir().unwrap();
    init(home.path());
    splitbook(home.path())
        .args(["add", "--amount", "5", "--person", "Mallory"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown person: Mallory"));
}

#[test]
fn test_import_without_review() {
    let home = tempfile::tempdir().unwrap();
    init(home.path());
    let csv = home.path().join("statement.csv");
    std::fs::write(
        &csv,
        "Beskrivning,Belopp,Datum,Kortmedlem\nLidl,\"17,90\",01/05/2024,Ana\nRent,0,01/05/2024,Ana\n",
    )
    .unwrap();

    splitbook(home.path())
        .arg("import")
        .arg(&csv)
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 entries. Please categorize each one."))
        .stdout(predicate::str::contains("Successfully added 1 entries!"));

    splitbook(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Expenses:   1"));
}

#[test]
fn test_import_with_no_valid_rows() {
    let home = tempfile::tempdir().unwrap();
    init(home.path());
    let csv = home.path().join("zero.csv");
    std::fs::write(&csv, "Datum,Beskrivning,Kortmedlem,Belopp\n01/05/2024,Rent,Ana,0\n").unwrap();

    splitbook(home.path())
        .arg("import")
        .arg(&csv)
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains("No valid entries found in CSV."));
}

#[test]
fn test_delete_missing_id_fails() {
    let home = tempfile::tempdir().unwrap();
    init(home.path());
    splitbook(home.path())
        .args(["delete", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No expense with ID 99"));
}

#[test]
fn test_delete_all_requires_confirmation() {
    let home = tempfile::tempdir().unwrap();
    init(home.path());
    splitbook(home.path())
        .args(["add", "--amount", "5"])
        .assert()
        .success();

    splitbook(home.path())
        .arg("delete-all")
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing deleted."));

    splitbook(home.path())
        .args(["delete-all", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 expenses"));
}
