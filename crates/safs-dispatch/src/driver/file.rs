//! File system driver commands
//!
//! Tried first in the driver sub-chain: `IfExistFile` and `IfExistDir` wrap
//! another file command and must not be shadowed by a later family.

use super::command::{find_command, CommandContext, CommandFamily, CommandTable};
use crate::error::CommandError;
use crate::processor::ProcessorServices;
use safs_record::keywords::file;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Family name used in logs
pub const NAME: &str = "DCDriverFileCommands";

static COMMANDS: CommandTable<()> = &[
    (file::COPY_FILE, copy_file),
    (file::CREATE_DIRECTORY, create_directory),
    (file::CREATE_FILE, create_file),
    (file::DELETE_DIRECTORY, delete_directory),
    (file::DELETE_DIRECTORY_CONTENTS, delete_directory_contents),
    (file::DELETE_FILE, delete_file),
    (file::GET_FILE_SIZE, get_file_size),
    (file::GET_FILES, get_files),
    (file::IF_EXIST_DIR, if_exist_dir),
    (file::IF_EXIST_FILE, if_exist_file),
    (file::PRINT_TO_FILE, print_to_file),
    (file::READ_FILE_STRING, read_file_string),
    (file::RENAME_FILE, rename_file),
];

/// Create the file command family
#[must_use]
pub fn commands(services: ProcessorServices) -> CommandFamily<()> {
    CommandFamily::new(NAME, services, (), COMMANDS)
}

fn shown_path(path: &Path) -> String {
    path.display().to_string()
}

fn copy_file(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(2)?;
    let source = ctx.resolve_path(ctx.arg(0)?)?;
    let target = ctx.resolve_path(ctx.arg(1)?)?;
    fs::copy(&source, &target).map_err(|e| CommandError::file(shown_path(&source), e))?;
    ctx.generic_success(&format!("{} copied to {}", shown_path(&source), shown_path(&target)));
    Ok(())
}

fn create_directory(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let dir = ctx.resolve_path(ctx.arg(0)?)?;
    fs::create_dir_all(&dir).map_err(|e| CommandError::file(shown_path(&dir), e))?;
    ctx.generic_success(&shown_path(&dir));
    Ok(())
}

fn create_file(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let path = ctx.resolve_path(ctx.arg(0)?)?;
    let content = ctx.param(1).unwrap_or("");
    fs::write(&path, content).map_err(|e| CommandError::file(shown_path(&path), e))?;
    ctx.generic_success(&shown_path(&path));
    Ok(())
}

fn delete_directory(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let dir = ctx.resolve_path(ctx.arg(0)?)?;
    if !dir.is_dir() {
        return Err(CommandError::ParameterValue(format!("Directory={}", shown_path(&dir))));
    }
    fs::remove_dir(&dir).map_err(|e| CommandError::file(shown_path(&dir), e))?;
    ctx.generic_success(&shown_path(&dir));
    Ok(())
}

/// `DeleteDirectoryContents, dir [, deleteSubdirectories]`
fn delete_directory_contents(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let dir = ctx.resolve_path(ctx.arg(0)?)?;
    let with_subdirs = ctx
        .param(1)
        .is_some_and(|flag| flag.trim().eq_ignore_ascii_case("true"));
    if !dir.is_dir() {
        return Err(CommandError::ParameterValue(format!("Directory={}", shown_path(&dir))));
    }
    let entries = fs::read_dir(&dir).map_err(|e| CommandError::file(shown_path(&dir), e))?;
    for entry in entries {
        let path = entry.map_err(|e| CommandError::file(shown_path(&dir), e))?.path();
        let removed = if path.is_dir() {
            if !with_subdirs {
                continue;
            }
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| CommandError::file(shown_path(&path), e))?;
    }
    ctx.generic_success(&shown_path(&dir));
    Ok(())
}

fn delete_file(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let path = ctx.resolve_path(ctx.arg(0)?)?;
    fs::remove_file(&path).map_err(|e| CommandError::file(shown_path(&path), e))?;
    ctx.generic_success(&shown_path(&path));
    Ok(())
}

fn get_file_size(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(2)?;
    let path = ctx.resolve_path(ctx.arg(0)?)?;
    let var = ctx.var_name(1)?;
    let size = fs::metadata(&path)
        .map_err(|e| CommandError::file(shown_path(&path), e))?
        .len();
    ctx.set_var(&var, &size.to_string())?;
    ctx.generic_success(&format!("{var} equals {size}"));
    Ok(())
}

/// Writes the absolute path of every file in a directory, one per line
fn get_files(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(2)?;
    let dir = ctx.resolve_path(ctx.arg(0)?)?;
    let output = ctx.resolve_path(ctx.arg(1)?)?;
    if !dir.is_dir() {
        return Err(CommandError::ParameterValue(format!("Directory={}", shown_path(&dir))));
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(&dir).map_err(|e| CommandError::file(shown_path(&dir), e))? {
        let path = entry.map_err(|e| CommandError::file(shown_path(&dir), e))?.path();
        if path.is_file() {
            files.push(fs::canonicalize(&path).unwrap_or(path));
        }
    }
    files.sort();

    let mut listing = String::new();
    for path in &files {
        listing.push_str(&shown_path(path));
        listing.push('\n');
    }
    fs::write(&output, listing).map_err(|e| CommandError::file(shown_path(&output), e))?;
    ctx.generic_success(&format!(
        "performed on {}; output file '{}'",
        shown_path(&dir),
        shown_path(&output)
    ));
    Ok(())
}

fn if_exist_file(state: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    if_exist(state, ctx, true)
}

fn if_exist_dir(state: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    if_exist(state, ctx, false)
}

/// `IfExistFile, path, command [, params...]` runs a nested file command
fn if_exist(state: &mut (), ctx: &mut CommandContext<'_>, want_file: bool) -> Result<(), CommandError> {
    ctx.require(2)?;
    let kind = if want_file { "file" } else { "directory" };
    let path = ctx.resolve_path(ctx.arg(0)?)?;
    let nested = ctx.arg(1)?.to_string();
    let nested_params = ctx.params()[2..].to_vec();

    let exists = if want_file { path.is_file() } else { path.is_dir() };
    if !exists {
        return Err(CommandError::Action(format!(
            "{kind} does not exist: {}, NOT EXECUTING: {nested}",
            shown_path(&path)
        )));
    }
    let Some(handler) = find_command(COMMANDS, &nested) else {
        return Err(CommandError::ParameterValue(format!("file command '{nested}'")));
    };
    tracing::info!(
        "{}: {kind} exists: {}, EXECUTING: {nested} for: {nested_params:?}",
        ctx.command(),
        shown_path(&path)
    );
    ctx.redirect(&nested, nested_params);
    handler(state, ctx)
}

/// `PrintToFile, path, text [, append]`; append defaults to true
fn print_to_file(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(2)?;
    let path = ctx.resolve_path(ctx.arg(0)?)?;
    let text = ctx.arg(1)?;
    let append = ctx
        .param(2)
        .map_or(true, |flag| !flag.trim().eq_ignore_ascii_case("false"));
    let mut out = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(&path)
        .map_err(|e| CommandError::file(shown_path(&path), e))?;
    writeln!(out, "{text}").map_err(|e| CommandError::file(shown_path(&path), e))?;
    ctx.generic_success(&shown_path(&path));
    Ok(())
}

fn read_file_string(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(2)?;
    let path = ctx.resolve_path(ctx.arg(0)?)?;
    let var = ctx.var_name(1)?;
    let content = fs::read_to_string(&path).map_err(|e| CommandError::file(shown_path(&path), e))?;
    let content = content.trim_end_matches(['\r', '\n']);
    ctx.set_var(&var, content)?;
    ctx.generic_success(&format!("{var} read from {}", shown_path(&path)));
    Ok(())
}

fn rename_file(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(2)?;
    let from = ctx.resolve_path(ctx.arg(0)?)?;
    let to = ctx.resolve_path(ctx.arg(1)?)?;
    fs::rename(&from, &to).map_err(|e| CommandError::file(shown_path(&from), e))?;
    ctx.generic_success(&format!("{} renamed to {}", shown_path(&from), shown_path(&to)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::RecordHelper;
    use crate::processor::Processor;
    use safs_record::{StatusCode, TestRecord};
    use tempfile::TempDir;

    fn run(line: &str) -> RecordHelper {
        let mut family = commands(ProcessorServices::new());
        let mut rec = RecordHelper::in_memory();
        rec.record = TestRecord::from_line(line, "|");
        let count = rec.record.token_count().unwrap();
        rec.record.command = Some(rec.record.trimmed_unquoted_token(1).unwrap().to_string());
        let params = (2..count)
            .map(|i| rec.record.trimmed_unquoted_token(i).unwrap().to_string())
            .collect();
        family.set_params(params);
        family.process(&mut rec);
        assert!(family.is_record_processed());
        rec
    }

    #[test]
    fn test_create_copy_and_size() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.txt");
        let b = tmp.path().join("b.txt");

        let rec = run(&format!("C|CreateFile|{}|hello", a.display()));
        assert_eq!(rec.record.status_code, StatusCode::OK);

        let rec = run(&format!("C|CopyFile|{}|{}", a.display(), b.display()));
        assert_eq!(rec.record.status_code, StatusCode::OK);
        assert_eq!(fs::read_to_string(&b).unwrap(), "hello");

        let rec = run(&format!("C|GetFileSize|{}|^size", b.display()));
        assert_eq!(rec.record.status_code, StatusCode::OK);
        assert_eq!(rec.variables().get("size").unwrap().as_deref(), Some("5"));
    }

    #[test]
    fn test_missing_file_is_failure() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.txt");
        let rec = run(&format!("C|DeleteFile|{}", missing.display()));
        assert_eq!(rec.record.status_code, StatusCode::GeneralScriptFailure);
    }

    #[test]
    fn test_if_exist_file_runs_nested_command() {
        let tmp = TempDir::new().unwrap();
        let marker = tmp.path().join("marker");
        let created = tmp.path().join("created");
        fs::write(&marker, "").unwrap();

        let rec = run(&format!(
            "C|IfExistFile|{}|CreateDirectory|{}",
            marker.display(),
            created.display()
        ));
        assert_eq!(rec.record.status_code, StatusCode::OK);
        assert_eq!(rec.record.command.as_deref(), Some("CreateDirectory"));
        assert!(created.is_dir());

        let rec = run(&format!(
            "C|IfExistDir|{}|CreateDirectory|{}",
            marker.display(),
            created.display()
        ));
        assert_eq!(rec.record.status_code, StatusCode::GeneralScriptFailure);
    }

    #[test]
    fn test_if_exist_rejects_foreign_command() {
        let tmp = TempDir::new().unwrap();
        let rec = run(&format!("C|IfExistDir|{}|Delay|10", tmp.path().display()));
        assert_eq!(rec.record.status_code, StatusCode::GeneralScriptFailure);
    }

    #[test]
    fn test_print_and_read() {
        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join("log.txt");
        run(&format!("C|PrintToFile|{}|one", log.display()));
        run(&format!("C|PrintToFile|{}|two", log.display()));
        assert_eq!(fs::read_to_string(&log).unwrap(), "one\ntwo\n");

        let rec = run(&format!("C|ReadFileString|{}|text", log.display()));
        assert_eq!(rec.variables().get("text").unwrap().as_deref(), Some("one\ntwo"));
    }

    #[test]
    fn test_get_files_and_delete_contents() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("data");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("x"), "").unwrap();
        fs::write(dir.join("y"), "").unwrap();
        fs::create_dir(dir.join("sub")).unwrap();
        let listing = tmp.path().join("listing.txt");

        let rec = run(&format!("C|GetFiles|{}|{}", dir.display(), listing.display()));
        assert_eq!(rec.record.status_code, StatusCode::OK);
        assert_eq!(fs::read_to_string(&listing).unwrap().lines().count(), 2);

        run(&format!("C|DeleteDirectoryContents|{}", dir.display()));
        assert!(dir.join("sub").is_dir());
        assert!(!dir.join("x").exists());

        run(&format!("C|DeleteDirectoryContents|{}|true", dir.display()));
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);

        let rec = run(&format!("C|DeleteDirectory|{}", dir.display()));
        assert_eq!(rec.record.status_code, StatusCode::OK);
        assert!(!dir.exists());
    }
}
