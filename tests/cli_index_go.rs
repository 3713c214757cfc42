//! CLI integration test for `index-go` + `qi`, in the teacher's
//! `assert_cmd`-driven style (see the original `cli_index.rs`): write
//! a small fixture tree, index it `--once`, then query it.

use assert_cmd::cargo::cargo_bin_cmd;
use std::fs;
use tempfile::tempdir;

fn write_fixture(dir: &std::path::Path) {
    fs::create_dir_all(dir.join("worker")).unwrap();
    fs::write(
        dir.join("worker/worker.go"),
        r#"package worker

type Worker struct {
    in chan int
}

func (w *Worker) Handle(v int) {
    w.process(v)
}

func (w *Worker) process(v int) {
}
"#,
    )
    .unwrap();
}

#[test]
fn index_once_then_query_finds_method_definition() {
    let tmp = tempdir().expect("tempdir");
    write_fixture(tmp.path());

    let db_file = tmp.path().join("code-index.db");
    let config_root = tmp.path().join("config");
    fs::create_dir_all(&config_root).unwrap();

    let mut index_cmd = cargo_bin_cmd!("index-go");
    index_cmd
        .current_dir(tmp.path())
        .arg("worker")
        .arg("--once")
        .arg("--quiet")
        .arg("--db-file")
        .arg(&db_file)
        .arg("--config-root")
        .arg(&config_root);
    index_cmd.assert().success();

    let mut qi_cmd = cargo_bin_cmd!("qi");
    qi_cmd
        .current_dir(tmp.path())
        .arg("--db-file")
        .arg(&db_file)
        .arg("process")
        .arg("--def");
    let assert = qi_cmd.assert().success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(output.contains("process"), "expected a `process` definition row, got: {output}");
}

#[test]
fn qi_returns_exit_code_one_when_nothing_matches() {
    let tmp = tempdir().expect("tempdir");
    write_fixture(tmp.path());

    let db_file = tmp.path().join("code-index.db");
    let config_root = tmp.path().join("config");
    fs::create_dir_all(&config_root).unwrap();

    let mut index_cmd = cargo_bin_cmd!("index-go");
    index_cmd
        .current_dir(tmp.path())
        .arg("worker")
        .arg("--once")
        .arg("--quiet")
        .arg("--db-file")
        .arg(&db_file)
        .arg("--config-root")
        .arg(&config_root);
    index_cmd.assert().success();

    let mut qi_cmd = cargo_bin_cmd!("qi");
    qi_cmd
        .current_dir(tmp.path())
        .arg("--db-file")
        .arg(&db_file)
        .arg("no_such_symbol_anywhere");
    qi_cmd.assert().code(1);
}
