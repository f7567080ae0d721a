//! Database driver commands
//!
//! Connections and SQL execution live behind [`DatabaseBackend`]. Without a
//! backend the commands are still recognized but fail the record.

use super::command::{CommandContext, CommandFamily, CommandTable};
use crate::error::{CommandError, DatabaseError};
use crate::processor::ProcessorServices;
use safs_record::keywords::database;
use std::fmt;
use std::sync::Arc;

/// Family name used in logs
pub const NAME: &str = "DCDriverDatabaseCommands";

/// Connection parameters taken from a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSource<'a> {
    /// Data source name or connection URL
    pub name: &'a str,
    /// Optional user id
    pub user: Option<&'a str>,
    /// Optional password
    pub password: Option<&'a str>,
    /// Driver selected with `SetJdbcDriver`
    pub driver: Option<&'a str>,
}

/// Executes SQL against named data sources
pub trait DatabaseBackend: Send + Sync {
    /// Run `sql` and return the result rows as strings
    ///
    /// # Errors
    /// Connection or query failures.
    fn query(&self, source: &DataSource<'_>, sql: &str) -> Result<Vec<Vec<String>>, DatabaseError>;
}

/// State kept between database commands
#[derive(Default)]
pub struct DatabaseState {
    backend: Option<Arc<dyn DatabaseBackend>>,
    driver: Option<String>,
}

impl DatabaseState {
    /// State using `backend`
    #[must_use]
    pub fn with_backend(backend: Arc<dyn DatabaseBackend>) -> Self {
        Self {
            backend: Some(backend),
            driver: None,
        }
    }

    /// Driver selected by the last `SetJdbcDriver`
    #[must_use]
    pub fn driver(&self) -> Option<&str> {
        self.driver.as_deref()
    }

    fn run(&self, ctx: &CommandContext<'_>, source_index: usize, sql: &str) -> Result<Vec<Vec<String>>, CommandError> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| CommandError::Action("no database backend is configured".into()))?;
        let source = DataSource {
            name: ctx.arg(source_index)?,
            user: ctx.param(source_index + 3),
            password: ctx.param(source_index + 4),
            driver: self.driver.as_deref(),
        };
        tracing::debug!("query on {}: {sql}", source.name);
        Ok(backend.query(&source, sql)?)
    }
}

impl fmt::Debug for DatabaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseState")
            .field("has_backend", &self.backend.is_some())
            .field("driver", &self.driver)
            .finish()
    }
}

static COMMANDS: CommandTable<DatabaseState> = &[
    (database::SET_JDBC_DRIVER, set_jdbc_driver),
    (database::EXEC_SQL_QUERY, exec_sql_query),
    (database::GET_DB_VALUE, get_db_value),
    (database::VERIFY_DB_VALUE, verify_db_value),
    (database::GET_DB_TABLE_ROW_COUNT, get_db_table_row_count),
];

/// Create the database command family
#[must_use]
pub fn commands(services: ProcessorServices, backend: Option<Arc<dyn DatabaseBackend>>) -> CommandFamily<DatabaseState> {
    let state = DatabaseState {
        backend,
        driver: None,
    };
    CommandFamily::new(NAME, services, state, COMMANDS)
}

fn set_jdbc_driver(state: &mut DatabaseState, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let driver = ctx.arg(0)?.trim().to_string();
    if driver.is_empty() {
        return Err(CommandError::ParameterValue("DriverClassName".into()));
    }
    ctx.generic_success(&driver);
    state.driver = Some(driver);
    Ok(())
}

/// `ExecSQLQuery, source, query, statusVar [, user, password]`
fn exec_sql_query(state: &mut DatabaseState, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(3)?;
    let sql = ctx.arg(1)?.to_string();
    let status_var = ctx.var_name(2)?;
    match state.run(ctx, 0, &sql) {
        Ok(_) => {
            ctx.set_var(&status_var, "OK")?;
            ctx.generic_success(&sql);
            Ok(())
        }
        Err(err) => {
            ctx.set_var(&status_var, &err.to_string())?;
            Err(err)
        }
    }
}

/// `GetDBValue, source, query, resultVar [, user, password]`
fn get_db_value(state: &mut DatabaseState, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(3)?;
    let sql = ctx.arg(1)?.to_string();
    let var = ctx.var_name(2)?;
    let rows = state.run(ctx, 0, &sql)?;
    match rows.first().and_then(|row| row.first()) {
        Some(value) => {
            ctx.set_var(&var, value)?;
            ctx.generic_success(&format!("{var} equals {value}"));
        }
        None => {
            ctx.set_var(&var, "")?;
            ctx.action_warning(&format!("query returned no rows: {sql}"));
        }
    }
    Ok(())
}

/// `VerifyDBValue, source, query, expected [, user, password]`
fn verify_db_value(state: &mut DatabaseState, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(3)?;
    let sql = ctx.arg(1)?.to_string();
    let expected = ctx.arg(2)?.to_string();
    let rows = state.run(ctx, 0, &sql)?;
    let actual = rows
        .first()
        .and_then(|row| row.first())
        .map_or("", String::as_str);
    if actual != expected {
        return Err(CommandError::Action(format!(
            "value '{actual}' does not match expected '{expected}'"
        )));
    }
    ctx.generic_success(&format!("'{actual}' matches"));
    Ok(())
}

/// `GetDBTableRowCount, source, table, countVar [, user, password]`
fn get_db_table_row_count(state: &mut DatabaseState, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.require(3)?;
    let table = ctx.arg(1)?.trim().to_string();
    if table.is_empty() {
        return Err(CommandError::ParameterValue("TableName".into()));
    }
    let var = ctx.var_name(2)?;
    let rows = state.run(ctx, 0, &format!("SELECT COUNT(*) FROM {table}"))?;
    let count = rows
        .first()
        .and_then(|row| row.first())
        .cloned()
        .unwrap_or_else(|| "0".to_string());
    ctx.set_var(&var, &count)?;
    ctx.generic_success(&format!("{var} equals {count}"));
    Ok(())
}
