//! String manipulation driver commands
//!
//! Every command stores its result in the variable named by its last
//! required parameter. Character positions count Unicode scalar values.

use super::command::{CommandContext, CommandFamily, CommandTable};
use crate::error::CommandError;
use crate::processor::ProcessorServices;
use regex::Regex;
use safs_record::keywords::string;
use safs_record::tokenize;

/// Family name used in logs
pub const NAME: &str = "DCDriverStringCommands";

static COMMANDS: CommandTable<()> = &[
    (string::LENGTH, length),
    (string::COMPARE, compare),
    (string::CONCATENATE, concatenate),
    (string::TO_UPPER_CASE, to_upper_case),
    (string::TO_LOWER_CASE, to_lower_case),
    (string::LEFT_TRIM, left_trim),
    (string::RIGHT_TRIM, right_trim),
    (string::TRIM, trim),
    (string::LEFT, left),
    (string::RIGHT, right),
    (string::SUB_STRING, sub_string),
    (string::INDEX, index),
    (string::REPLACE, replace),
    (string::GET_FIELD, get_field),
    (string::GET_FIELD_COUNT, get_field_count),
    (string::GET_SYSTEM_ENVIRON, get_system_environ),
    (string::GET_SYSTEM_USER, get_system_user),
];

/// Create the string command family
#[must_use]
pub fn commands(services: ProcessorServices) -> CommandFamily<()> {
    CommandFamily::new(NAME, services, (), COMMANDS)
}

fn store(ctx: &mut CommandContext<'_>, var: &str, value: &str) -> Result<(), CommandError> {
    ctx.set_var(var, value)?;
    ctx.generic_success(&format!("{var} equals {value}"));
    Ok(())
}

fn char_slice(src: &str, start: usize, len: Option<usize>) -> Option<String> {
    let total = src.chars().count();
    if start > total {
        return None;
    }
    let len = match len {
        Some(len) if start + len > total => return None,
        Some(len) => len,
        None => total - start,
    };
    Some(src.chars().skip(start).take(len).collect())
}

fn count_arg(ctx: &CommandContext<'_>, index: usize, name: &str) -> Result<usize, CommandError> {
    let value = ctx.int_arg(index, name)?;
    usize::try_from(value).map_err(|_| CommandError::ParameterValue(format!("{name}={value}")))
}

fn out_of_range(ctx: &CommandContext<'_>, var: &str, src: &str) -> Result<CommandError, CommandError> {
    ctx.set_var(var, "")?;
    Ok(CommandError::Action(format!("index out of range for '{src}'")))
}

fn length(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(2)?;
    let len = ctx.arg(0)?.chars().count().to_string();
    let var = ctx.var_name(1)?;
    store(ctx, &var, &len)
}

/// `Compare, source, other, var [, regexMatch]` stores `true` or `false`
fn compare(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(3)?;
    let src = ctx.arg(0)?.to_string();
    let other = ctx.arg(1)?.to_string();
    let var = ctx.var_name(2)?;
    let regex_match = ctx
        .param(3)
        .is_some_and(|flag| flag.trim().eq_ignore_ascii_case("true"));

    let matched = if regex_match {
        let pattern = Regex::new(&other)
            .map_err(|e| CommandError::ParameterValue(format!("regex '{other}': {e}")))?;
        pattern.is_match(&src)
    } else {
        src == other
    };
    store(ctx, &var, if matched { "true" } else { "false" })
}

fn concatenate(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(3)?;
    let value = format!("{}{}", ctx.arg(0)?, ctx.arg(1)?);
    let var = ctx.var_name(2)?;
    store(ctx, &var, &value)
}

fn unary(ctx: &mut CommandContext<'_>, op: fn(&str) -> String) -> Result<(), CommandError> {
    ctx.require(2)?;
    let value = op(ctx.arg(0)?);
    let var = ctx.var_name(1)?;
    store(ctx, &var, &value)
}

fn to_upper_case(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    unary(ctx, str::to_uppercase)
}

fn to_lower_case(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    unary(ctx, str::to_lowercase)
}

fn left_trim(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    unary(ctx, |s| s.trim_start().to_string())
}

fn right_trim(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    unary(ctx, |s| s.trim_end().to_string())
}

fn trim(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    unary(ctx, |s| s.trim().to_string())
}

/// `Left, source, count, var`
fn left(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(3)?;
    let src = ctx.arg(0)?.to_string();
    let count = count_arg(ctx, 1, "count")?;
    let var = ctx.var_name(2)?;
    match char_slice(&src, 0, Some(count)) {
        Some(value) => store(ctx, &var, &value),
        None => Err(out_of_range(ctx, &var, &src)?),
    }
}

/// `Right, source, count, var`
fn right(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(3)?;
    let src = ctx.arg(0)?.to_string();
    let count = count_arg(ctx, 1, "count")?;
    let var = ctx.var_name(2)?;
    let total = src.chars().count();
    match total.checked_sub(count).and_then(|start| char_slice(&src, start, None)) {
        Some(value) => store(ctx, &var, &value),
        None => Err(out_of_range(ctx, &var, &src)?),
    }
}

/// `SubString, source, start, length, var`; an empty or non-positive length
/// takes the rest of the string
fn sub_string(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(4)?;
    let src = ctx.arg(0)?.to_string();
    let start = count_arg(ctx, 1, "start")?;
    let len_raw = ctx.arg(2)?.trim().to_string();
    let len = if len_raw.is_empty() {
        None
    } else {
        let len: i64 = len_raw
            .parse()
            .map_err(|_| CommandError::ParameterValue("LENGTH".into()))?;
        usize::try_from(len).ok().filter(|len| *len > 0)
    };
    let var = ctx.var_name(3)?;
    match char_slice(&src, start, len) {
        Some(value) => store(ctx, &var, &value),
        None => Err(out_of_range(ctx, &var, &src)?),
    }
}

/// `Index, start, source, find, var` stores the character position or `-1`
fn index(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(4)?;
    let start = count_arg(ctx, 0, "start")?;
    let src = ctx.arg(1)?.to_string();
    let find = ctx.arg(2)?.to_string();
    let var = ctx.var_name(3)?;
    let Some(tail) = char_slice(&src, start, None) else {
        return Err(out_of_range(ctx, &var, &src)?);
    };
    let position = tail.find(&find).map_or_else(
        || "-1".to_string(),
        |byte| (tail[..byte].chars().count() + start).to_string(),
    );
    store(ctx, &var, &position)
}

fn replace(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(4)?;
    let src = ctx.arg(0)?;
    let find = ctx.arg(1)?;
    let value = if find.is_empty() {
        src.to_string()
    } else {
        src.replace(find, ctx.arg(2)?)
    };
    let var = ctx.var_name(3)?;
    store(ctx, &var, &value)
}

/// `GetField, source, index, delimiters, var`; fields count from 0
fn get_field(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(4)?;
    let src = ctx.arg(0)?.to_string();
    let field = count_arg(ctx, 1, "index")?;
    let delims = ctx.arg(2)?.to_string();
    let var = ctx.var_name(3)?;
    match tokenize(&src, &delims).get(field) {
        Some(value) => store(ctx, &var, value),
        None => Err(out_of_range(ctx, &var, &src)?),
    }
}

/// `GetFieldCount, source, startIndex, delimiters, var`
fn get_field_count(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(4)?;
    let src = ctx.arg(0)?.to_string();
    let start = count_arg(ctx, 1, "startIndex")?;
    let delims = ctx.arg(2)?.to_string();
    let var = ctx.var_name(3)?;
    let Some(tail) = char_slice(&src, start, None) else {
        return Err(out_of_range(ctx, &var, &src)?);
    };
    let count = if tail.is_empty() {
        0
    } else {
        tokenize(&tail, &delims).len()
    };
    store(ctx, &var, &count.to_string())
}

fn get_system_environ(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(2)?;
    let name = ctx.arg(0)?.trim().to_string();
    let var = ctx.var_name(1)?;
    let value = std::env::var(&name).unwrap_or_default();
    store(ctx, &var, &value)
}

fn get_system_user(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let var = ctx.var_name(0)?;
    let user = ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|key| std::env::var(key).ok())
        .unwrap_or_default();
    store(ctx, &var, &user)
}
