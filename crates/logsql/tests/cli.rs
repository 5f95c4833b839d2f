//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Creates a temp directory holding a headered CSV and a headerless log.
fn create_test_files() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");

    std::fs::write(
        temp.path().join("waf_log.csv"),
        "时间,类型,风险级别,URL\n\
         2024-05-01 10:00:01,SQL注入,高,/login.php\n\
         2024-05-01 10:00:07,扫描,低,/robots.txt\n\
         2024-05-01 10:01:12,XSS,高,/search\n",
    )
    .expect("Failed to write csv");

    std::fs::write(
        temp.path().join("waf_log.log"),
        "10.0.0.1 GET 攻击 /admin\n\
         10.0.0.2 GET 正常 /index.html\n\
         10.0.0.3 POST 攻击 /login\n",
    )
    .expect("Failed to write log");

    temp
}

fn logsql() -> Command {
    Command::cargo_bin("logsql").unwrap()
}

#[test]
fn test_help() {
    logsql()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("table 'current'"))
        .stdout(predicate::str::contains("--sep"));
}

#[test]
fn test_version() {
    logsql()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("logsql"));
}

#[test]
fn test_missing_file_fails() {
    logsql()
        .arg("/nonexistent/waf_log.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("File doesn't exist"));
}

#[test]
fn test_empty_file_fails() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("empty.log");
    std::fs::write(&path, "").unwrap();

    logsql()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("File is empty"));
}

#[test]
fn test_csv_session() {
    let temp = create_test_files();

    logsql()
        .arg(temp.path().join("waf_log.csv"))
        .write_stdin("SELECT URL FROM current\nWHERE 风险级别='高';\n.q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("/login.php"))
        .stdout(predicate::str::contains("/search"))
        .stdout(predicate::str::contains("/robots.txt").not())
        .stdout(predicate::str::contains("(2 rows)"))
        .stdout(predicate::str::ends_with("Exit.\n"));
}

#[test]
fn test_log_session_with_positional_columns() {
    let temp = create_test_files();

    logsql()
        .arg(temp.path().join("waf_log.log"))
        .write_stdin(".cols\nSELECT $1 FROM current WHERE $3='攻击';\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("$1, $2, $3, $4"))
        .stdout(predicate::str::contains("10.0.0.3"))
        .stdout(predicate::str::contains("10.0.0.2").not())
        .stdout(predicate::str::contains("(2 rows)"));
}

#[test]
fn test_errors_do_not_end_session() {
    let temp = create_test_files();

    logsql()
        .arg(temp.path().join("waf_log.log"))
        .write_stdin("SELEKT *;\n.head zero\n.bogus\nSELECT COUNT(*) AS n FROM current;\n.q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Error: near \"SELEKT\": syntax error"))
        .stdout(predicate::str::contains("Error: Usage: .head"))
        .stdout(predicate::str::contains("Error: Unknown command: .bogus"))
        .stdout(predicate::str::contains("│ 3 │"));
}

#[test]
fn test_sep_option() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("pipes.txt");
    std::fs::write(&path, "a b|c\nd e|f\n").unwrap();

    logsql()
        .arg(&path)
        .args(["--sep", "|"])
        .write_stdin(".sep\nSELECT $1 FROM current WHERE $2 = 'f';\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Current separator: '|'"))
        .stdout(predicate::str::contains("d e"));
}

#[test]
fn test_invalid_sep_option() {
    let temp = create_test_files();

    logsql()
        .arg(temp.path().join("waf_log.log"))
        .args(["--sep", "(unclosed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid separator"));
}

#[test]
fn test_execute_json() {
    let temp = create_test_files();

    logsql()
        .arg(temp.path().join("waf_log.log"))
        .args(["--format", "json", "-e", "SELECT $3, COUNT(*) AS n FROM current GROUP BY $3 ORDER BY n DESC;"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"$3\": \"攻击\""))
        .stdout(predicate::str::contains("\"n\": 2"));
}

#[test]
fn test_execute_csv() {
    let temp = create_test_files();

    logsql()
        .arg(temp.path().join("waf_log.csv"))
        .args(["-f", "csv", "-e", "SELECT 类型, URL FROM current WHERE 风险级别 = '低'"])
        .assert()
        .success()
        .stdout("类型,URL\n扫描,/robots.txt\n");
}

#[test]
fn test_execute_error_fails() {
    let temp = create_test_files();

    logsql()
        .arg(temp.path().join("waf_log.csv"))
        .args(["-e", "SELECT nope FROM current"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no such column: nope"));
}

#[test]
fn test_uneven_rows_notice() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ragged.log");
    std::fs::write(&path, "a b c\nd e\n").unwrap();

    logsql()
        .arg(&path)
        .write_stdin(".q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Note: 1 short row padded with empty values"));
}

#[cfg(unix)]
#[test]
fn test_interrupt_flushes_and_exits_cleanly() {
    use std::io::Write;
    use std::process::{Command as StdCommand, Stdio};
    use std::time::Duration;

    let temp = create_test_files();
    let mut child = StdCommand::new(assert_cmd::cargo::cargo_bin("logsql"))
        .arg(temp.path().join("waf_log.log"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to spawn logsql");

    // Keep stdin open so the session is still waiting when the signal lands.
    let mut stdin = child.stdin.take().unwrap();
    stdin
        .write_all("SELECT COUNT(*) AS n FROM current;\n".as_bytes())
        .unwrap();
    stdin.flush().unwrap();
    std::thread::sleep(Duration::from_millis(500));

    let status = StdCommand::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .expect("Failed to run kill");
    assert!(status.success());

    let output = child.wait_with_output().unwrap();
    drop(stdin);
    assert!(output.status.success());
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("│ 3 │"));
}
