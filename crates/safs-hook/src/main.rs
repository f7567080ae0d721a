//! `safs-hook` command line: run test tables, name status codes

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, Command};
use safs_hook::{HookConfig, TableRunner};
use safs_record::{status_string, StatusCode};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn cli() -> Command {
    Command::new("safs-hook")
        .version(safs_hook::VERSION)
        .about("Run SAFS keyword-driven test tables")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Write diagnostics as JSON lines"),
        )
        .subcommand(
            Command::new("run")
                .about("Execute a test table")
                .arg(
                    Arg::new("table")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Table file to execute"),
                )
                .arg(
                    Arg::new("separator")
                        .long("separator")
                        .short('s')
                        .help("Field separator (overrides the configuration)"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML configuration file"),
                )
                .arg(
                    Arg::new("project-dir")
                        .long("project-dir")
                        .help("Directory relative file names resolve against"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the report as JSON"),
                ),
        )
        .subcommand(
            Command::new("status")
                .about("Name a status code")
                .arg(
                    Arg::new("code")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(i32))
                        .help("Integer status code"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "safs=info".into());
    let text = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    let json = json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));
    tracing_subscriber::registry().with(filter).with(text).with(json).init();
}

fn run_table(args: &clap::ArgMatches) -> anyhow::Result<bool> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => HookConfig::load(path)?,
        None => HookConfig::new(),
    };
    if let Some(separator) = args.get_one::<String>("separator") {
        config = config.with_separator(separator.as_str());
    }
    if let Some(dir) = args.get_one::<String>("project-dir") {
        config = config.with_project_directory(dir.as_str());
    }
    if config.separator.is_empty() {
        bail!("the field separator must not be empty");
    }

    let Some(table) = args.get_one::<PathBuf>("table") else {
        bail!("no table given");
    };
    let mut runner = TableRunner::new(config);
    let report = runner
        .run_file(table)
        .with_context(|| format!("running {}", table.display()))?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(report.failures() == 0)
}

fn print_status(args: &clap::ArgMatches) -> bool {
    let Some(&code) = args.get_one::<i32>("code") else {
        return false;
    };
    match status_string(code) {
        Some(name) => {
            let failure = StatusCode::from_code(code).is_some_and(StatusCode::is_failure);
            println!("{code}: {name}{}", if failure { " (failure)" } else { "" });
            true
        }
        None => {
            println!("{code}: undefined status code");
            false
        }
    }
}

fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let ok = match matches.subcommand() {
        Some(("run", args)) => run_table(args)?,
        Some(("status", args)) => print_status(args),
        _ => {
            cli().print_help()?;
            false
        }
    };
    std::process::exit(if ok { 0 } else { 1 });
}
