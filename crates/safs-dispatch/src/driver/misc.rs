//! Miscellaneous driver commands: delays, breakpoints, debug switches, dates
//! and variable housekeeping.

use super::command::{CommandContext, CommandFamily, CommandTable};
use crate::error::CommandError;
use crate::helper::vars;
use crate::processor::ProcessorServices;
use chrono::{DateTime, Local};
use safs_record::keywords::misc;
use std::thread;
use std::time::Duration;

/// Family name used in logs
pub const NAME: &str = "DCDriverMiscCommands";

/// Date format written by `GetSystemDate`
pub const DATE_FORMAT: &str = "%m-%d-%Y";
/// 24-hour time format
pub const MILITARY_TIME_FORMAT: &str = "%H:%M:%S";
/// 12-hour time format
pub const TIME_FORMAT: &str = "%I:%M:%S %p";

static COMMANDS: CommandTable<()> = &[
    (misc::DELAY, delay),
    (misc::PAUSE, pause),
    (misc::BP, breakpoint),
    (misc::BREAKPOINTS, breakpoints),
    (misc::COMMAND_DEBUG, command_debug),
    (misc::TEST_DEBUG, test_debug),
    (misc::GET_SYSTEM_DATE, get_system_date),
    (misc::GET_SYSTEM_DATE_TIME, get_system_date_time),
    (misc::GET_SYSTEM_TIME, get_system_time),
    (misc::SET_VARIABLE_VALUES, set_variable_values),
    (misc::SET_VARIABLE_VALUE_EX, set_variable_value_ex),
    (misc::COPY_VARIABLE_VALUE_EX, copy_variable_value_ex),
    (misc::CLEAR_ALL_VARIABLES, clear_all_variables),
    (misc::SET_PROJECT_DIRECTORY, set_project_directory),
    (misc::SET_TEST_DIRECTORY, set_test_directory),
    (misc::SET_BENCH_DIRECTORY, set_bench_directory),
    (misc::GET_VERSION, get_version),
];

/// Create the misc command family
#[must_use]
pub fn commands(services: ProcessorServices) -> CommandFamily<()> {
    CommandFamily::new(NAME, services, (), COMMANDS)
}

/// `ON`/`OFF`, `TRUE`/`FALSE`, `YES`/`NO`
fn switch_arg(ctx: &CommandContext<'_>, index: usize) -> Result<bool, CommandError> {
    let value = ctx.arg(index)?;
    match value.trim().to_ascii_uppercase().as_str() {
        "ON" | "TRUE" | "YES" | "1" => Ok(true),
        "OFF" | "FALSE" | "NO" | "0" => Ok(false),
        _ => Err(CommandError::ParameterValue(format!("ON/OFF={value}"))),
    }
}

/// Sleep for parameter 0 counted in `unit` milliseconds
fn sleep_for(ctx: &mut CommandContext<'_>, name: &str, unit: u64) -> Result<(), CommandError> {
    let count = ctx.int_arg(0, name)?;
    let millis = u64::try_from(count)
        .ok()
        .and_then(|count| count.checked_mul(unit))
        .ok_or_else(|| CommandError::ParameterValue(format!("{name}={count}")))?;
    thread::sleep(Duration::from_millis(millis));
    ctx.generic_success(&format!("{count} {name}"));
    Ok(())
}

fn delay(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    sleep_for(ctx, "milliseconds", 1)
}

fn pause(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    sleep_for(ctx, "seconds", 1000)
}

fn breakpoint(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    if ctx.base().check_breakpoints() {
        ctx.base().activate_breakpoint(&*ctx.rec);
    }
    ctx.generic_success("");
    Ok(())
}

fn breakpoints(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let on = switch_arg(ctx, 0)?;
    ctx.base().settings().set_breakpoints(on);
    ctx.generic_success(if on { "ON" } else { "OFF" });
    Ok(())
}

fn command_debug(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let on = switch_arg(ctx, 0)?;
    ctx.base().settings().set_command_debug(on);
    ctx.generic_success(if on { "ON" } else { "OFF" });
    Ok(())
}

fn test_debug(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let on = switch_arg(ctx, 0)?;
    ctx.base().settings().set_test_debug(on);
    ctx.generic_success(if on { "ON" } else { "OFF" });
    Ok(())
}

#[derive(Clone, Copy)]
enum Stamp {
    Date,
    Time,
    DateTime,
}

fn format_stamp(now: &DateTime<Local>, stamp: Stamp, military: bool) -> String {
    let time = if military { MILITARY_TIME_FORMAT } else { TIME_FORMAT };
    match stamp {
        Stamp::Date => now.format(DATE_FORMAT).to_string(),
        Stamp::Time => now.format(time).to_string(),
        Stamp::DateTime => format!("{} {}", now.format(DATE_FORMAT), now.format(time)),
    }
}

/// `GetSystem*, var [, militaryTime]`
fn system_stamp(ctx: &mut CommandContext<'_>, stamp: Stamp) -> Result<(), CommandError> {
    let var = ctx.var_name(0)?;
    let military = ctx.param(1).is_some() && switch_arg(ctx, 1)?;
    let value = format_stamp(&Local::now(), stamp, military);
    ctx.set_var(&var, &value)?;
    ctx.generic_success(&format!("{var} equals {value}"));
    Ok(())
}

fn get_system_date(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    system_stamp(ctx, Stamp::Date)
}

fn get_system_time(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    system_stamp(ctx, Stamp::Time)
}

fn get_system_date_time(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    system_stamp(ctx, Stamp::DateTime)
}

/// `SetVariableValues, name=value [, name=value...]`
fn set_variable_values(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(1)?;
    let mut assignments = Vec::with_capacity(ctx.params().len());
    for param in ctx.params() {
        let Some((name, value)) = param.split_once('=') else {
            return Err(CommandError::ParameterValue(format!("assignment '{param}'")));
        };
        let name = name.trim();
        let name = name.strip_prefix('^').unwrap_or(name);
        if name.is_empty() {
            return Err(CommandError::ParameterValue(format!("assignment '{param}'")));
        }
        assignments.push((name.to_string(), value.to_string()));
    }
    for (name, value) in &assignments {
        ctx.set_var(name, value)?;
    }
    ctx.generic_success(&format!("{} variables set", assignments.len()));
    Ok(())
}

fn set_variable_value_ex(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(2)?;
    let var = ctx.var_name(0)?;
    let value = ctx.arg(1)?.to_string();
    ctx.set_var(&var, &value)?;
    ctx.generic_success(&format!("{var} equals {value}"));
    Ok(())
}

fn copy_variable_value_ex(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(2)?;
    let source = ctx.var_name(0)?;
    let target = ctx.var_name(1)?;
    let value = ctx.get_var(&source)?.unwrap_or_default();
    ctx.set_var(&target, &value)?;
    ctx.generic_success(&format!("{target} equals {value}"));
    Ok(())
}

fn clear_all_variables(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.rec.variables().clear_all()?;
    ctx.generic_success("");
    Ok(())
}

fn set_directory(ctx: &mut CommandContext<'_>, suffix: &str) -> Result<(), CommandError> {
    let dir = ctx.arg(0)?.trim().to_string();
    if dir.is_empty() {
        return Err(CommandError::ParameterValue("directory".into()));
    }
    ctx.set_instance_var(suffix, &dir)?;
    ctx.generic_success(&dir);
    Ok(())
}

fn set_project_directory(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    set_directory(ctx, vars::PROJECT_DIRECTORY)
}

fn set_test_directory(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    set_directory(ctx, vars::TEST_DIRECTORY)
}

fn set_bench_directory(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    set_directory(ctx, vars::BENCH_DIRECTORY)
}

fn get_version(_: &mut (), ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let var = ctx.var_name(0)?;
    ctx.set_var(&var, crate::VERSION)?;
    ctx.generic_success(&format!("{var} equals {}", crate::VERSION));
    Ok(())
}
