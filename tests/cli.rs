use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const ACCOUNT_SCRIPT: &str = r#"
blueprint Account {
    field balance = 100

    law no_overdraft {
        when self.balance < 0
    }

    forge deposit(amount) {
        self.balance = self.balance + amount
        reply self.balance
    }

    forge withdraw(amount) {
        self.balance = self.balance - amount
        reply self.balance
    }
}

let acct = Account()
show acct.deposit(50)
show acct.withdraw(30)
"#;

#[test]
fn tinytalk_run_prints_show_output() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("account.tt");
    fs::write(&script, ACCOUNT_SCRIPT).expect("write script");

    let mut cmd = Command::cargo_bin("tinytalk").expect("binary exists");
    cmd.arg("run").arg(&script);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("150").and(predicate::str::contains("120")));
}

#[test]
fn tinytalk_run_reports_invariant_violation() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("overdraft.tt");
    fs::write(
        &script,
        format!("{ACCOUNT_SCRIPT}\nshow acct.withdraw(500)\n"),
    )
    .expect("write script");

    let mut cmd = Command::cargo_bin("tinytalk").expect("binary exists");
    cmd.arg("run").arg(&script);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("150"))
        .stderr(predicate::str::contains("invariant violation"))
        .stderr(predicate::str::contains("no_overdraft"));
}

#[test]
fn tinytalk_eval_snippet() {
    let mut cmd = Command::cargo_bin("tinytalk").expect("binary exists");
    cmd.arg("eval").arg("show 1 + 2 + 3");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("6"));
}

#[test]
fn tinytalk_eval_reports_parse_errors() {
    let mut cmd = Command::cargo_bin("tinytalk").expect("binary exists");
    cmd.arg("eval").arg("let = 3");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("parse error"));
}

#[test]
fn tinytalk_run_honors_step_budget() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("spin.tt");
    fs::write(&script, "loop { }\n").expect("write script");

    let mut cmd = Command::cargo_bin("tinytalk").expect("binary exists");
    cmd.arg("run").arg(&script).arg("--max-steps").arg("100");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("execution budget exhausted"));
}
