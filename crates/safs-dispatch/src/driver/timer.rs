//! Named timer driver commands
//!
//! The variable named after a timer holds its state (`active` or `stopped`);
//! `<name>.startTime`, `<name>.endTime` and `<name>.elapsed` hold the
//! readings.

use super::command::{CommandContext, CommandFamily, CommandTable};
use crate::error::CommandError;
use crate::log::MessageKind;
use crate::processor::ProcessorServices;
use chrono::{DateTime, Local};
use safs_record::keywords::timer as keys;
use std::collections::HashMap;

/// Family name used in logs
pub const NAME: &str = "DCDriverTimerCommands";

/// Value of the timer variable while running
pub const TIMER_STATUS_ACTIVE: &str = "active";
/// Value of the timer variable once stopped
pub const TIMER_STATUS_STOPPED: &str = "stopped";

const STAMP_FORMAT: &str = "%m-%d-%Y %H:%M:%S%.3f";

/// One named timer
#[derive(Debug, Clone)]
pub struct Timer {
    start: DateTime<Local>,
    end: Option<DateTime<Local>>,
    limit_ms: Option<i64>,
}

impl Timer {
    fn elapsed_ms(&self, now: DateTime<Local>) -> i64 {
        (self.end.unwrap_or(now) - self.start).num_milliseconds()
    }

    /// Whether the timer is still running
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.end.is_none()
    }
}

/// Timers keyed by lower-cased name
pub type Timers = HashMap<String, Timer>;

static COMMANDS: CommandTable<Timers> = &[
    (keys::START_TIMER, start_timer),
    (keys::STOP_TIMER, stop_timer),
    (keys::RESET_TIMER, reset_timer),
    (keys::VERIFY_TIMER, verify_timer),
    (keys::STORE_TIMER_INFO, store_timer_info),
];

/// Create the timer command family
#[must_use]
pub fn commands(services: ProcessorServices) -> CommandFamily<Timers> {
    CommandFamily::new(NAME, services, Timers::new(), COMMANDS)
}

fn timer_name(ctx: &CommandContext<'_>) -> Result<(String, String), CommandError> {
    let name = ctx.var_name(0)?;
    let key = name.to_lowercase();
    Ok((name, key))
}

fn store_readings(ctx: &CommandContext<'_>, prefix: &str, reading: &Timer) -> Result<(), CommandError> {
    let now = Local::now();
    ctx.set_var(
        &format!("{prefix}{}", keys::START_TIME_SUFFIX),
        &reading.start.format(STAMP_FORMAT).to_string(),
    )?;
    let end = reading
        .end
        .map(|end| end.format(STAMP_FORMAT).to_string())
        .unwrap_or_default();
    ctx.set_var(&format!("{prefix}{}", keys::END_TIME_SUFFIX), &end)?;
    ctx.set_var(
        &format!("{prefix}{}", keys::ELAPSED_SUFFIX),
        &reading.elapsed_ms(now).to_string(),
    )
}

/// `StartTimer, name [, limitMs]`; a stopped timer may be restarted
fn start_timer(timers: &mut Timers, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let (name, key) = timer_name(ctx)?;
    let limit_ms = match ctx.param(1).map(str::trim) {
        None | Some("") => None,
        Some(_) => Some(ctx.int_arg(1, "VerifyValue")?).filter(|limit| *limit >= 0),
    };
    match timers.get(&key) {
        Some(existing) if existing.is_active() => {
            return Err(CommandError::Action(format!("{name} exists.")));
        }
        Some(_) => ctx.base().log_message(
            &*ctx.rec,
            &format!("Timer {name} will be restarted."),
            MessageKind::Warning,
        ),
        None => {}
    }
    let timer = Timer {
        start: Local::now(),
        end: None,
        limit_ms,
    };
    ctx.set_var(&name, TIMER_STATUS_ACTIVE)?;
    store_readings(ctx, &name, &timer)?;
    timers.insert(key, timer);
    ctx.generic_success(&format!("{name} started"));
    Ok(())
}

fn stop_timer(timers: &mut Timers, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let (name, key) = timer_name(ctx)?;
    let timer = timers
        .get_mut(&key)
        .filter(|timer| timer.is_active())
        .ok_or_else(|| CommandError::Action(format!("Timer {name} is not active.")))?;
    timer.end = Some(Local::now());
    let timer = timer.clone();
    ctx.set_var(&name, TIMER_STATUS_STOPPED)?;
    store_readings(ctx, &name, &timer)?;
    ctx.generic_success(&format!("{name} stopped after {} ms", timer.elapsed_ms(Local::now())));
    Ok(())
}

fn reset_timer(timers: &mut Timers, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let (name, key) = timer_name(ctx)?;
    if !timers.get(&key).is_some_and(|timer| !timer.is_active()) {
        return Err(CommandError::Action(format!("Timer {name} must be stopped.")));
    }
    timers.remove(&key);
    ctx.set_var(&name, "")?;
    for suffix in [keys::START_TIME_SUFFIX, keys::END_TIME_SUFFIX, keys::ELAPSED_SUFFIX] {
        ctx.set_var(&format!("{name}{suffix}"), "")?;
    }
    ctx.generic_success(&format!("{name} reset"));
    Ok(())
}

/// `VerifyTimer, name [, limitMs]`; fails when elapsed time exceeds the limit
fn verify_timer(timers: &mut Timers, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let (name, key) = timer_name(ctx)?;
    let timer = timers
        .get(&key)
        .ok_or_else(|| CommandError::Action(format!("Timer {name} does not exist.")))?;
    let limit = match ctx.param(1).map(str::trim) {
        None | Some("") => timer.limit_ms,
        Some(_) => Some(ctx.int_arg(1, "VerifyValue")?),
    };
    let elapsed = timer.elapsed_ms(Local::now());
    match limit {
        Some(limit) if limit >= 0 && elapsed > limit => Err(CommandError::Action(format!(
            "Timer {name} elapsed {elapsed} ms, exceeding {limit} ms"
        ))),
        _ => {
            ctx.generic_success(&format!("{name} elapsed {elapsed} ms"));
            Ok(())
        }
    }
}

/// `StoreTimerInfo, name [, prefix]`
fn store_timer_info(timers: &mut Timers, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let (name, key) = timer_name(ctx)?;
    let timer = timers
        .get(&key)
        .ok_or_else(|| CommandError::Action(format!("Timer {name} does not exist.")))?;
    let prefix = match ctx.param(1).map(str::trim) {
        None | Some("") => name.clone(),
        Some(_) => ctx.var_name(1)?,
    };
    store_readings(ctx, &prefix, timer)?;
    ctx.generic_success(&format!("{name} stored as {prefix}"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::RecordHelper;
    use crate::processor::Processor;
    use safs_record::{StatusCode, TestRecord};

    fn run(family: &mut CommandFamily<Timers>, rec: &mut RecordHelper, line: &str) -> StatusCode {
        rec.record = TestRecord::from_line(line, ",");
        let count = rec.record.token_count().unwrap();
        rec.record.command = Some(rec.record.trimmed_unquoted_token(1).unwrap().to_string());
        let params = (2..count)
            .map(|i| rec.record.trimmed_unquoted_token(i).unwrap().to_string())
            .collect();
        family.set_params(params);
        family.process(rec);
        rec.record.status_code
    }

    #[test]
    fn test_timer_lifecycle() {
        let mut family = commands(ProcessorServices::new());
        let mut rec = RecordHelper::in_memory();

        assert_eq!(run(&mut family, &mut rec, "C,StartTimer,t1"), StatusCode::OK);
        assert_eq!(rec.variables().get("t1").unwrap().as_deref(), Some("active"));
        assert_eq!(
            run(&mut family, &mut rec, "C,StartTimer,t1"),
            StatusCode::GeneralScriptFailure
        );
        assert_eq!(
            run(&mut family, &mut rec, "C,ResetTimer,t1"),
            StatusCode::GeneralScriptFailure
        );

        assert_eq!(run(&mut family, &mut rec, "C,StopTimer,T1"), StatusCode::OK);
        assert_eq!(rec.variables().get("t1").unwrap().as_deref(), Some("stopped"));
        let elapsed: i64 = rec.variables().get("t1.elapsed").unwrap().unwrap().parse().unwrap();
        assert!(elapsed >= 0);
        assert!(!rec.variables().get("t1.endTime").unwrap().unwrap().is_empty());

        assert_eq!(run(&mut family, &mut rec, "C,StoreTimerInfo,t1,copy"), StatusCode::OK);
        assert!(rec.variables().get("copy.startTime").unwrap().is_some());

        assert_eq!(run(&mut family, &mut rec, "C,ResetTimer,t1"), StatusCode::OK);
        assert!(family.state().is_empty());
        assert_eq!(rec.variables().get("t1").unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_verify_limit() {
        let mut family = commands(ProcessorServices::new());
        let mut rec = RecordHelper::in_memory();
        run(&mut family, &mut rec, "C,StartTimer,t2,60000");
        assert_eq!(run(&mut family, &mut rec, "C,VerifyTimer,t2"), StatusCode::OK);

        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(
            run(&mut family, &mut rec, "C,VerifyTimer,t2,0"),
            StatusCode::GeneralScriptFailure
        );
        assert_eq!(
            run(&mut family, &mut rec, "C,VerifyTimer,missing"),
            StatusCode::GeneralScriptFailure
        );
    }

    #[test]
    fn test_stop_requires_active_timer() {
        let mut family = commands(ProcessorServices::new());
        let mut rec = RecordHelper::in_memory();
        assert_eq!(
            run(&mut family, &mut rec, "C,StopTimer,never"),
            StatusCode::GeneralScriptFailure
        );
    }
}
