//! CLI Integration Tests
//!
//! `excel2csv`バイナリを直接実行し、終了コード、出力ファイル、メッセージを検証します。

#![allow(deprecated)] // Command::cargo_bin

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use rust_xlsxwriter::{Format, Workbook};
use tempfile::TempDir;

/// 2シート（Data, Notes|2025）のワークブックを書き出す
fn write_workbook(dir: &Path, file_name: &str) -> PathBuf {
    let mut workbook = Workbook::new();

    let data = workbook.add_worksheet();
    data.set_name("Data").unwrap();
    data.write_string(0, 0, "name").unwrap();
    data.write_string(0, 1, "joined").unwrap();
    data.write_string(1, 0, "Alice, A.").unwrap();
    data.write_number_with_format(1, 1, 45672.0, &Format::new().set_num_format("yyyy-mm-dd"))
        .unwrap();

    let notes = workbook.add_worksheet();
    notes.set_name("Notes|2025").unwrap();
    notes.write_string(0, 0, "memo").unwrap();

    let path = dir.join(file_name);
    workbook.save(&path).unwrap();
    path
}

fn excel2csv() -> Command {
    let mut cmd = Command::cargo_bin("excel2csv").unwrap();
    cmd.env_remove("EXCEL2CSV_DATE_FORMAT").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_version() {
    excel2csv()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("excel2csv"));
}

#[test]
fn test_cli_help() {
    excel2csv()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Convert an Excel worksheet"));
}

#[test]
fn test_missing_argument() {
    excel2csv()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("please provide an excel file to convert."));
}

#[test]
fn test_input_not_found() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.xlsx");

    excel2csv()
        .arg(&missing)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(format!(
            "not found a file: {}",
            missing.display()
        )));
}

#[test]
fn test_input_with_wrong_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.xls");
    fs::write(&path, b"not a workbook").unwrap();

    excel2csv()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found a file:"));
}

#[test]
fn test_input_is_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("folder.xlsx");
    fs::create_dir(&path).unwrap();

    excel2csv()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found a file:"));
}

#[test]
fn test_convert_writes_sibling_csv() {
    let dir = TempDir::new().unwrap();
    let input = write_workbook(dir.path(), "people.xlsx");

    excel2csv().arg(&input).assert().success();

    let csv = fs::read_to_string(dir.path().join("people.csv")).unwrap();
    assert_eq!(csv, "name,joined\r\n\"Alice, A.\",2025-01-15\r\n");
}

#[test]
fn test_convert_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write_workbook(dir.path(), "people.xlsx");

    excel2csv()
        .arg(&input)
        .args(["-o", "-", "--tab", "--lf"])
        .assert()
        .success()
        .stdout("name\tjoined\nAlice, A.\t2025-01-15\n");

    assert!(!dir.path().join("people.csv").exists());
}

#[test]
fn test_sheet_by_name_and_output_path() {
    let dir = TempDir::new().unwrap();
    let input = write_workbook(dir.path(), "people.xlsx");
    let output = dir.path().join("first.csv");

    excel2csv()
        .arg(&input)
        .arg("Data")
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert!(fs::read_to_string(&output).unwrap().starts_with("name,joined"));
}

#[test]
fn test_sheet_by_index() {
    let dir = TempDir::new().unwrap();
    let input = write_workbook(dir.path(), "people.xlsx");

    excel2csv()
        .arg(&input)
        .args(["--sheet-index", "1", "-o", "-"])
        .assert()
        .success()
        .stdout("memo\r\n");
}

#[test]
fn test_sheet_not_found() {
    let dir = TempDir::new().unwrap();
    let input = write_workbook(dir.path(), "people.xlsx");

    excel2csv()
        .arg(&input)
        .arg("Nope")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error. not found sheet: Nope"));

    // 失敗時は出力ファイルを作らない
    assert!(!dir.path().join("people.csv").exists());
}

#[test]
fn test_invalid_workbook() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("broken.xlsx");
    fs::write(&input, b"this is not a zip archive").unwrap();

    excel2csv()
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("error. "));
}

#[test]
fn test_date_format_from_env() {
    let dir = TempDir::new().unwrap();
    let input = write_workbook(dir.path(), "people.xlsx");

    excel2csv()
        .env("EXCEL2CSV_DATE_FORMAT", "%d.%m.%Y")
        .arg(&input)
        .args(["-o", "-"])
        .assert()
        .success()
        .stdout(predicate::str::contains("15.01.2025"));
}

#[test]
fn test_all_sheets_into_directory() {
    let dir = TempDir::new().unwrap();
    let input = write_workbook(dir.path(), "people.xlsx");
    let out_dir = dir.path().join("out");

    excel2csv()
        .arg(&input)
        .arg("--all-sheets")
        .arg("-o")
        .arg(&out_dir)
        .assert()
        .success();

    assert!(out_dir.join("people_Data.csv").exists());
    // ファイル名に使えない文字は置き換えられる
    assert_eq!(
        fs::read_to_string(out_dir.join("people_Notes_2025.csv")).unwrap(),
        "memo\r\n"
    );
}

#[test]
fn test_all_sheets_keeps_sheets_with_same_file_name() {
    let dir = TempDir::new().unwrap();
    let mut workbook = Workbook::new();
    for (name, value) in [("Q1|Q2", "pipe"), ("Q1_Q2", "underscore"), ("Q1<Q2", "angle")] {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name).unwrap();
        worksheet.write_string(0, 0, value).unwrap();
    }
    let input = dir.path().join("report.xlsx");
    workbook.save(&input).unwrap();

    excel2csv().arg(&input).arg("--all-sheets").assert().success();

    let read = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
    assert_eq!(read("report_Q1_Q2.csv"), "pipe\r\n");
    assert_eq!(read("report_Q1_Q2_2.csv"), "underscore\r\n");
    assert_eq!(read("report_Q1_Q2_3.csv"), "angle\r\n");
}

#[test]
fn test_all_sheets_rejects_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write_workbook(dir.path(), "people.xlsx");

    excel2csv()
        .arg(&input)
        .args(["--all-sheets", "-o", "-"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot write to stdout"));
}

#[test]
fn test_summary_json() {
    let dir = TempDir::new().unwrap();
    let input = write_workbook(dir.path(), "people.xlsx");

    excel2csv()
        .arg(&input)
        .arg("--summary-json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sheet_name\": \"Data\""))
        .stdout(predicate::str::contains("\"rows\": 2"));
}

#[test]
fn test_conflicting_sheet_arguments() {
    let dir = TempDir::new().unwrap();
    let input = write_workbook(dir.path(), "people.xlsx");

    excel2csv()
        .arg(&input)
        .arg("Data")
        .args(["--sheet-index", "0"])
        .assert()
        .failure();
}
