//! Functional tests for file driver commands run through the dispatcher.
//!
//! Relative file names resolve against the project directory variable, and
//! file errors surface as `GENERAL_SCRIPT_FAILURE` with a FAILED log line.

use pretty_assertions::assert_eq;
use safs_dispatch::{MessageKind, ProcessRequest, ProcessorServices};
use safs_record::StatusCode;
use safs_test_utils::{record, var, MemoryLog};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

struct Session {
    request: ProcessRequest,
    log: Arc<MemoryLog>,
}

impl Session {
    fn new() -> Self {
        let log = MemoryLog::shared();
        let request = ProcessRequest::new(record("C, GetVersion, version", "|"), log.clone(), &ProcessorServices::new());
        Self { request, log }
    }

    /// Run one `|`-separated record and return its status
    fn run(&mut self, line: &str) -> StatusCode {
        let rec = self.request.record_mut().unwrap();
        rec.record.reinit();
        rec.record.set_input_record(line);
        rec.record.set_separator("|");
        self.request.do_request().unwrap();
        self.request.record().unwrap().record.status_code
    }

    fn var(&self, name: &str) -> Option<String> {
        var(self.request.record().unwrap(), name)
    }
}

#[test]
fn relative_paths_use_project_directory() {
    let tmp = TempDir::new().unwrap();
    let mut session = Session::new();

    let project = tmp.path().display().to_string();
    assert_eq!(session.run(&format!("C|SetProjectDirectory|{project}")), StatusCode::OK);
    assert_eq!(session.run("C|CreateFile|notes.txt|first line"), StatusCode::OK);
    assert!(tmp.path().join("notes.txt").is_file());

    assert_eq!(session.run("C|PrintToFile|notes.txt|second line"), StatusCode::OK);
    let content = fs::read_to_string(tmp.path().join("notes.txt")).unwrap();
    assert_eq!(content, "first linesecond line\n");

    assert_eq!(session.run("C|ReadFileString|notes.txt|content"), StatusCode::OK);
    assert_eq!(session.var("content").as_deref(), Some("first linesecond line"));

    assert_eq!(session.run("C|GetFileSize|notes.txt|size"), StatusCode::OK);
    assert_eq!(session.var("size").as_deref(), Some("22"));
    assert!(session.log.contains(MessageKind::Passed, "GetFileSize successful"));
}

#[test]
fn if_exist_file_runs_nested_command() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("a.txt");
    let target = tmp.path().join("b.txt");
    fs::write(&source, "data").unwrap();
    let mut session = Session::new();

    let status = session.run(&format!(
        "C|IfExistFile|{}|CopyFile|{}|{}",
        source.display(),
        source.display(),
        target.display()
    ));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fs::read_to_string(&target).unwrap(), "data");

    let missing = tmp.path().join("missing.txt");
    let status = session.run(&format!(
        "C|IfExistFile|{}|DeleteFile|{}",
        missing.display(),
        target.display()
    ));
    assert_eq!(status, StatusCode::GeneralScriptFailure);
    assert!(target.exists());
}

#[test]
fn missing_file_fails_and_logs() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nowhere.txt");
    let mut session = Session::new();

    let status = session.run(&format!("C|GetFileSize|{}|size", missing.display()));
    assert_eq!(status, StatusCode::GeneralScriptFailure);
    assert_eq!(session.var("size"), None);
    assert!(session.log.contains(MessageKind::Failed, "Unable to perform 'GetFileSize'"));
    assert_eq!(session.var("customStatusCode").as_deref(), Some("0"));
}

#[test]
fn directory_listing_is_sorted() {
    let tmp = TempDir::new().unwrap();
    let data = tmp.path().join("data");
    fs::create_dir(&data).unwrap();
    for name in ["c.txt", "a.txt", "b.txt"] {
        fs::write(data.join(name), name).unwrap();
    }
    fs::create_dir(data.join("nested")).unwrap();
    let listing = tmp.path().join("listing.txt");
    let mut session = Session::new();

    let status = session.run(&format!("C|GetFiles|{}|{}", data.display(), listing.display()));
    assert_eq!(status, StatusCode::OK);

    let names: Vec<String> = fs::read_to_string(&listing)
        .unwrap()
        .lines()
        .map(|line| line.rsplit(['/', '\\']).next().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);

    assert_eq!(
        session.run(&format!("C|DeleteDirectoryContents|{}", data.display())),
        StatusCode::OK
    );
    assert!(data.join("nested").is_dir());
    assert!(!data.join("a.txt").exists());
}
