use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const HEADER: &str = "TransID,BatchID,VendorName,VendorBankName,VendorAcctNumber,Amount,Currency,\
CustomerAcctNumber,CompanyName,PaymentDate,PaidDate,ProcessFlag,ProcessType,PaymentDeclined,PaymentFlag,Remarks";

struct Fixture {
    dir: TempDir,
    file: PathBuf,
}

fn fixture(rows: &[&str]) -> Fixture {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("export.csv");
    let mut body = vec![HEADER];
    body.extend_from_slice(rows);
    std::fs::write(&file, body.join("\n")).unwrap();
    Fixture { dir, file }
}

fn sample() -> Fixture {
    fixture(&[
        // Monday
        "1,B1,V,Bank,1,\"1,000.50\",UGX,9,Acme,2024-01-15T10:00:00,01/15/2024,A,1,0,1,",
        // Wednesday
        "2,B1,V,Bank,1,200,UGX,9,Beta,2024-07-03T10:00:00,07/03/2024,A,11,0,1,",
        "3,B1,V,Bank,1,300,UGX,9,Beta,2024-07-04T10:00:00,,A,11,0,0,",
        "4,B1,V,Bank,1,400,UGX,9,Gamma,2024-07-05T10:00:00,,A,4,1,0,",
    ])
}

fn gaps(fx: &Fixture) -> Command {
    let mut cmd = Command::cargo_bin("gaps").unwrap();
    cmd.env("GAPS_CONFIG", config_path(fx.dir.path()))
        .env_remove("GAPS_FILE")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .arg("--file")
        .arg(&fx.file);
    cmd
}

fn config_path(dir: &Path) -> PathBuf {
    dir.join("config").join("settings.json")
}

fn json(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.arg("--format").arg("json").output().unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_slice(&out.stdout).unwrap()
}

#[test]
fn summary_reports_buckets() {
    let fx = sample();
    gaps(&fx)
        .arg("summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("Successful"))
        .stdout(predicate::str::contains("Pending"))
        .stdout(predicate::str::contains("three-flag"));
}

#[test]
fn summary_json_counts() {
    let fx = sample();
    let v = json(gaps(&fx).arg("summary"));
    assert_eq!(v["total_count"], 4);
    assert_eq!(v["successful"]["count"], 2);
    assert_eq!(v["declined"]["count"], 1);
    assert_eq!(v["pending"]["count"], 1);
}

#[test]
fn two_flag_rule_from_flag() {
    let fx = sample();
    let v = json(gaps(&fx).args(["--rule", "two-flag", "summary"]));
    assert_eq!(v["successful"]["count"], 3);
}

#[test]
fn quarterly_fills_empty_quarters() {
    let fx = sample();
    let v = json(gaps(&fx).arg("quarterly"));
    let quarters = v.as_array().unwrap();
    assert_eq!(quarters.len(), 4);
    let counts: Vec<_> = quarters.iter().map(|q| q["count"].as_u64().unwrap()).collect();
    assert_eq!(counts, vec![1, 0, 1, 0]);
    assert_eq!(quarters[1]["quarter"], "Q2");
}

#[test]
fn weekly_starts_on_monday() {
    let fx = sample();
    let v = json(gaps(&fx).arg("weekly"));
    let days: Vec<_> = v["rows"].as_array().unwrap().iter().map(|d| d.as_str().unwrap()).collect();
    assert_eq!(
        days,
        vec!["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
    );
}

#[test]
fn companies_ranked_by_count() {
    let fx = fixture(&[
        "1,B1,V,Bank,1,10,UGX,9,Zed,2024-01-15T10:00:00,01/15/2024,A,1,0,1,",
        "2,B1,V,Bank,1,10,UGX,9,Acme,2024-01-16T10:00:00,01/16/2024,A,1,0,1,",
        "3,B1,V,Bank,1,10,UGX,9,Acme,2024-01-17T10:00:00,01/17/2024,A,1,0,1,",
        "4,B1,V,Bank,1,10,UGX,9,Beta,2024-01-18T10:00:00,01/18/2024,A,1,0,1,",
    ]);
    let v = json(gaps(&fx).args(["companies", "--top", "2"]));
    let names: Vec<_> = v.as_array().unwrap().iter().map(|c| c["company"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Acme", "Zed"]);
}

#[test]
fn missing_column_fails() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bad.csv");
    std::fs::write(&file, "TransID,Amount\n1,100\n").unwrap();
    let fx = Fixture { dir, file };
    gaps(&fx)
        .arg("summary")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing required column"));
}

#[test]
fn malformed_strict_date_fails() {
    let fx = fixture(&["1,B1,V,Bank,1,10,UGX,9,Acme,15/01/2024,01/15/2024,A,1,0,1,"]);
    gaps(&fx)
        .arg("summary")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PaymentDate"));
}

#[test]
fn empty_year_is_zero_state() {
    let fx = sample();
    gaps(&fx)
        .args(["--year", "1999", "monthly"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no transactions"))
        .stdout(predicate::str::contains("No successful transactions."));
}

#[test]
fn years_lists_payment_years() {
    let fx = sample();
    gaps(&fx)
        .arg("years")
        .assert()
        .success()
        .stdout(predicate::str::diff("2024\n"));
}

#[test]
fn table_lists_declined_rows() {
    let fx = sample();
    gaps(&fx)
        .args(["table", "declined"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Declined Transactions (1)"))
        .stdout(predicate::str::contains("Gamma"));
}

#[test]
fn missing_file_flag_fails() {
    let fx = sample();
    let mut cmd = Command::cargo_bin("gaps").unwrap();
    cmd.env("GAPS_CONFIG", config_path(fx.dir.path()))
        .env_remove("GAPS_FILE")
        .arg("summary")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No input file"));
}

#[test]
fn config_set_persists() {
    let fx = sample();
    gaps(&fx)
        .args(["config", "set", "classification_rule", "two-flag"])
        .assert()
        .success();
    assert!(config_path(fx.dir.path()).exists());

    gaps(&fx)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"two-flag\""));

    let v = json(gaps(&fx).arg("summary"));
    assert_eq!(v["rule"], "two-flag");
    assert_eq!(v["successful"]["count"], 3);
}

#[test]
fn config_set_rejects_unknown_key() {
    let fx = sample();
    gaps(&fx)
        .args(["config", "set", "colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown setting"));
}

#[test]
fn table_limit_keeps_bucket_size() {
    let fx = sample();
    gaps(&fx)
        .args(["table", "raw", "--limit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Raw Data (4)"))
        .stdout(predicate::str::contains("3 more rows"));

    let v = json(gaps(&fx).args(["table", "raw", "--limit", "1"]));
    assert_eq!(v.as_array().unwrap().len(), 1);
}

#[test]
fn weekly_table_lists_days_for_empty_year() {
    let fx = sample();
    gaps(&fx)
        .args(["--year", "1999", "weekly"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Monday"))
        .stdout(predicate::str::contains("Sunday"))
        .stdout(predicate::str::contains("No successful transactions.").not());
}
