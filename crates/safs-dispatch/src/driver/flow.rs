//! Flow control driver commands
//!
//! A taken branch leaves `BRANCH_TO_BLOCKID` with the target block id as the
//! status info; the table runner performs the jump. A branch that is not
//! taken is a plain success.

use super::command::{CommandContext, CommandFamily, CommandTable};
use crate::error::CommandError;
use crate::log::MessageKind;
use crate::processor::ProcessorServices;
use safs_record::keywords::flow;
use safs_record::StatusCode;
use std::cmp::Ordering;

/// Family name used in logs
pub const NAME: &str = "DCDriverFlowCommands";

static COMMANDS: CommandTable<()> = &[
    (flow::ON_EQUAL_GOTO_BLOCK_ID, on_equal),
    (flow::ON_NOT_EQUAL_GOTO_BLOCK_ID, on_not_equal),
    (flow::ON_GREATER_THAN_GOTO_BLOCK_ID, on_greater_than),
    (flow::ON_LESS_THAN_GOTO_BLOCK_ID, on_less_than),
    (flow::ON_CONTAINS_GOTO_BLOCK_ID, on_contains),
    (flow::ON_FILE_EXIST_GOTO_BLOCK_ID, on_file_exist),
    (flow::ON_FILE_NOT_EXIST_GOTO_BLOCK_ID, on_file_not_exist),
    (flow::GOTO_BLOCK_ID, goto_block),
    (flow::EXIT_TABLE, exit_table),
];

/// Create the flow command family
#[must_use]
pub fn commands(services: ProcessorServices) -> CommandFamily<()> {
    CommandFamily::new(NAME, services, (), COMMANDS)
}

fn block_id(ctx: &CommandContext<'_>) -> Result<String, CommandError> {
    let id = ctx.arg(0)?.trim();
    if id.is_empty() {
        return Err(CommandError::ParameterValue("BlockID".into()));
    }
    Ok(id.to_string())
}

fn value(ctx: &CommandContext<'_>, index: usize) -> Result<String, CommandError> {
    let raw = ctx.arg(index)?;
    Ok(ctx.base().substitute_variable(&*ctx.rec, raw)?)
}

fn branch(ctx: &mut CommandContext<'_>, block: &str, take: bool, reason: &str) {
    if take {
        ctx.rec.record.set_status(StatusCode::BranchToBlockId, block);
        let message = format!("{}: branching to {block}. {reason}", ctx.command());
        ctx.base().log_message(&*ctx.rec, &message, MessageKind::Generic);
    } else {
        ctx.generic_success(&format!("not branching to {block}. {reason}"));
    }
}

/// Numeric when both sides parse as numbers, text otherwise
fn compare_values(left: &str, right: &str) -> Ordering {
    match (left.trim().parse::<f64>(), right.trim().parse::<f64>()) {
        (Ok(l), Ok(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
        _ => left.cmp(right),
    }
}

fn on_condition(ctx: &mut CommandContext<'_>, test: fn(&str, &str) -> bool, relation: &str) -> Result<(), CommandError> {
    ctx.require(3)?;
    let block = block_id(ctx)?;
    let left = value(ctx, 1)?;
    let right = value(ctx, 2)?;
    let take = test(&left, &right);
    branch(ctx, &block, take, &format!("'{left}' {relation} '{right}': {take}"));
    Ok(())
}

fn on_equal(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    on_condition(ctx, |l, r| l == r, "equals")
}

fn on_not_equal(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    on_condition(ctx, |l, r| l != r, "not equal to")
}

fn on_greater_than(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    on_condition(ctx, |l, r| compare_values(l, r) == Ordering::Greater, "greater than")
}

fn on_less_than(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    on_condition(ctx, |l, r| compare_values(l, r) == Ordering::Less, "less than")
}

fn on_contains(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    on_condition(ctx, |l, r| l.contains(r), "contains")
}

fn on_file(ctx: &mut CommandContext<'_>, want: bool) -> Result<(), CommandError> {
    ctx.require(2)?;
    let block = block_id(ctx)?;
    let raw = value(ctx, 1)?;
    let path = ctx.resolve_path(&raw)?;
    let exists = path.exists();
    branch(ctx, &block, exists == want, &format!("{} exists: {exists}", path.display()));
    Ok(())
}

fn on_file_exist(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    on_file(ctx, true)
}

fn on_file_not_exist(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    on_file(ctx, false)
}

fn goto_block(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let block = block_id(ctx)?;
    branch(ctx, &block, true, "");
    Ok(())
}

fn exit_table(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.rec.record.status_code = StatusCode::ExitTableCommand;
    ctx.base()
        .log_message(&*ctx.rec, &format!("{}: exiting table", ctx.command()), MessageKind::Generic);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::RecordHelper;
    use crate::processor::Processor;
    use safs_record::TestRecord;

    fn run(rec: &mut RecordHelper, line: &str) {
        let mut family = commands(ProcessorServices::new());
        rec.record = TestRecord::from_line(line, ",");
        let count = rec.record.token_count().unwrap();
        rec.record.command = Some(rec.record.trimmed_unquoted_token(1).unwrap().to_string());
        let params = (2..count)
            .map(|i| rec.record.trimmed_unquoted_token(i).unwrap().to_string())
            .collect();
        family.set_params(params);
        family.process(rec);
    }

    #[test]
    fn test_branch_sets_block_id() {
        let mut rec = RecordHelper::in_memory();
        run(&mut rec, "C,OnEqualGotoBlockID,Done,a,a");
        assert_eq!(rec.record.status_code, StatusCode::BranchToBlockId);
        assert_eq!(rec.record.status_info.as_deref(), Some("Done"));

        run(&mut rec, "C,OnEqualGotoBlockID,Done,a,b");
        assert_eq!(rec.record.status_code, StatusCode::OK);
    }

    #[test]
    fn test_values_are_substituted() {
        let mut rec = RecordHelper::in_memory();
        rec.variables().set("count", "10").unwrap();
        run(&mut rec, "C,OnGreaterThanGotoBlockID,Big,^count,9");
        assert_eq!(rec.record.status_code, StatusCode::BranchToBlockId);
        run(&mut rec, "C,OnLessThanGotoBlockID,Small,^count,9");
        assert_eq!(rec.record.status_code, StatusCode::OK);
        run(&mut rec, "C,OnContainsGotoBlockID,Has,haystack,st");
        assert_eq!(rec.record.status_code, StatusCode::BranchToBlockId);
        assert_eq!(rec.record.status_info.as_deref(), Some("Has"));
    }

    #[test]
    fn test_numeric_comparison() {
        assert_eq!(compare_values("10", "9"), Ordering::Greater);
        assert_eq!(compare_values("10", "9x"), Ordering::Less);
        assert_eq!(compare_values(" 2.5", "2.50"), Ordering::Equal);
    }

    #[test]
    fn test_goto_and_exit() {
        let mut rec = RecordHelper::in_memory();
        run(&mut rec, "C,GotoBlockID,Cleanup");
        assert_eq!(rec.record.status_code, StatusCode::BranchToBlockId);
        assert_eq!(rec.record.status_info.as_deref(), Some("Cleanup"));

        run(&mut rec, "C,ExitTable");
        assert_eq!(rec.record.status_code, StatusCode::ExitTableCommand);

        run(&mut rec, "C,GotoBlockID");
        assert_eq!(rec.record.status_code, StatusCode::GeneralScriptFailure);
    }

    #[test]
    fn test_file_branches() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut rec = RecordHelper::in_memory();
        run(&mut rec, &format!("C,OnFileExistGotoBlockID,Found,{}", tmp.path().display()));
        assert_eq!(rec.record.status_code, StatusCode::BranchToBlockId);
        run(&mut rec, &format!("C,OnFileNotExistGotoBlockID,Missing,{}", tmp.path().display()));
        assert_eq!(rec.record.status_code, StatusCode::OK);
    }
}
