//! Functional tests for running whole tables from disk.
//!
//! Guarantees exercised here:
//! - Branches jump to the named block, case-insensitively, forwards or back.
//! - `ExitTable` and `SHUTDOWN_HOOK` stop the run early.
//! - A branch to an undefined block and a runaway loop are reported as errors.
//! - Hook configuration reaches the processors.

use pretty_assertions::assert_eq;
use safs_dispatch::{MessageKind, ProcessorConfig, ProcessorSlots, VariableStore};
use safs_hook::{HookConfig, HookError, StopReason, TableRunner};
use safs_record::StatusCode;
use safs_test_utils::{MemoryLog, SpyProcessor};
use std::fs;
use tempfile::TempDir;

fn write_table(dir: &TempDir, name: &str, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

/// The block is re-entered once, until the copied value changes.
#[test]
fn backward_branch_runs_a_loop() {
    let tmp = TempDir::new().unwrap();
    let table = write_table(
        &tmp,
        "loop.sdd",
        &[
            "; go around once",
            "C | SetVariableValueEx | pass | first",
            "B | again",
            "C | CopyVariableValueEx | pass | seen",
            "C | SetVariableValueEx | pass | second",
            "C | OnEqualGotoBlockID | AGAIN | ^seen | first",
            "C | SetVariableValueEx | done | yes",
        ],
    );
    let mut runner = TableRunner::new(HookConfig::new().with_separator("|"));
    let report = runner.run_file(&table).unwrap();

    assert_eq!(report.table, "loop.sdd");
    assert_eq!(report.stop, StopReason::EndOfTable);
    assert_eq!(report.failures(), 0);
    assert_eq!(report.outcomes.len(), 8);
    assert_eq!(report.count(StatusCode::BranchToBlockId), 1);
    let vars = runner.variables();
    assert_eq!(vars.get("seen").unwrap().as_deref(), Some("second"));
    assert_eq!(vars.get("done").unwrap().as_deref(), Some("yes"));
}

#[test]
fn exit_table_stops_the_run() {
    let tmp = TempDir::new().unwrap();
    let table = write_table(
        &tmp,
        "exit.sdd",
        &[
            "C, GotoBlockID, end",
            "C, SetVariableValueEx, skipped, yes",
            "B, End",
            "C, ExitTable",
            "C, SetVariableValueEx, after, yes",
        ],
    );
    let mut runner = TableRunner::new(HookConfig::new());
    let report = runner.run_file(&table).unwrap();

    assert_eq!(report.stop, StopReason::ExitTable);
    let lines: Vec<u64> = report.outcomes.iter().map(|o| o.line_number).collect();
    assert_eq!(lines, vec![1, 4]);
    assert_eq!(runner.variables().get("skipped").unwrap(), None);
    assert_eq!(runner.variables().get("after").unwrap(), None);
}

#[test]
fn undefined_block_is_an_error() {
    let mut runner = TableRunner::new(HookConfig::new());
    let err = runner
        .run_table("missing.sdd", "C, SetVariableValueEx, a, 1\nC, GotoBlockID, Nowhere\n")
        .unwrap_err();
    match err {
        HookError::BlockNotFound { block, line } => {
            assert_eq!(block, "Nowhere");
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn endless_loop_hits_the_step_limit() {
    let mut runner = TableRunner::new(HookConfig::new().with_max_steps(10));
    let err = runner.run_table("spin.sdd", "B, top\nC, GotoBlockID, top\n").unwrap_err();
    assert!(matches!(err, HookError::StepLimit(10)));
}

#[test]
fn missing_table_file_is_an_io_error() {
    let tmp = TempDir::new().unwrap();
    let mut runner = TableRunner::new(HookConfig::new());
    let err = runner.run_file(&tmp.path().join("absent.sdd")).unwrap_err();
    assert!(matches!(err, HookError::Io { .. }));
}

/// Relative file names in the table resolve against the configured
/// project directory.
#[test]
fn project_directory_from_config() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("hook.toml");
    fs::write(
        &config_path,
        format!(
            "separator = \";\"\nproject_directory = '{}'\n\n[processor]\ntest_domains = \"Java\"\n",
            tmp.path().display()
        ),
    )
    .unwrap();
    let config = HookConfig::load(&config_path).unwrap();
    assert_eq!(config.processor.test_domains, "Java");

    let log = MemoryLog::shared();
    let mut runner = TableRunner::with_log(config, log.clone());
    let report = runner
        .run_table("files.sdd", "C; CreateFile; out.txt; hello\nC; ReadFileString; out.txt; text\n")
        .unwrap();

    assert!(report.is_success());
    assert_eq!(fs::read_to_string(tmp.path().join("out.txt")).unwrap(), "hello");
    assert_eq!(runner.variables().get("text").unwrap().as_deref(), Some("hello"));
    assert!(log.contains(MessageKind::Passed, "CreateFile successful"));
}

/// Processor slots supplied by the caller see every executed record, and
/// labels and comments never reach them.
#[test]
fn custom_slots_receive_only_executable_records() {
    let (spy, handle) = SpyProcessor::new("spy").setting(StatusCode::ScriptWarning).boxed();
    let slots = ProcessorSlots {
        custom_driver: Some(spy),
        ..ProcessorSlots::default()
    };
    let config = HookConfig::new().with_processor(ProcessorConfig::new().with_test_domains("Html"));
    let mut runner = TableRunner::with_slots(config, MemoryLog::shared(), slots);

    let report = runner
        .run_table("spy.sdd", "; comment\nB, Block\nC, One\n\nT, Win, Comp, Click\nSHUTDOWN_HOOK\nC, Never\n")
        .unwrap();

    assert_eq!(report.stop, StopReason::Shutdown);
    assert_eq!(handle.calls(), 2);
    assert_eq!(report.count(StatusCode::ScriptWarning), 2);
    assert_eq!(
        runner.variables().get("SAFS/Hook/statuscode").unwrap().as_deref(),
        Some("-2")
    );
}

#[test]
fn report_serializes_to_json() {
    let mut runner = TableRunner::new(HookConfig::new());
    let report = runner.run_table("json.sdd", "C, ToUpperCase, abc, up\n").unwrap();

    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["table"], "json.sdd");
    assert_eq!(json["stop"], "end_of_table");
    assert_eq!(json["outcomes"][0]["status_name"], "NO_SCRIPT_FAILURE");
    assert_eq!(json["outcomes"][0]["command"], "ToUpperCase");
}
