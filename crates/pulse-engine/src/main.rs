//! `pulse` command-line interface: presence simulation and offline search and scan

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use pulse_core::{
    parse_calendar_date, Clock, CollabBus, ManualClock, SharedSnapshot, SystemClock,
    WorkspaceSnapshot,
};
use pulse_engine::{run_simulator, EngineConfig, SimulatorConfig, VERSION};
use pulse_notify::{JsonFileSettingsStore, MemorySettingsStore, NotificationCenter, SettingsStore};
use pulse_search::{search, ResultView, SearchFilters};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("pulse")
        .version(VERSION)
        .about("Real-time collaboration and notification engine")
        .subcommand_required(true)
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("JSON output and JSON logs"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration file (TOML)"),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run the presence simulator")
                .arg(
                    Arg::new("operations")
                        .long("ops")
                        .default_value("10000")
                        .value_parser(value_parser!(u64))
                        .help("Number of operations to simulate"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("stop-on-violation")
                        .long("stop-on-violation")
                        .action(ArgAction::SetTrue)
                        .help("Stop simulation on first violation"),
                ),
        )
        .subcommand(
            Command::new("search")
                .about("Search a workspace snapshot")
                .arg(snapshot_arg())
                .arg(date_arg())
                .arg(
                    Arg::new("full")
                        .long("full")
                        .action(ArgAction::SetTrue)
                        .help("Show every hit instead of the compact preview"),
                )
                .arg(Arg::new("query").required(true).help("Search text")),
        )
        .subcommand(
            Command::new("scan")
                .about("Run one deadline scan over a workspace snapshot")
                .arg(snapshot_arg())
                .arg(date_arg())
                .arg(
                    Arg::new("settings")
                        .long("settings")
                        .value_parser(value_parser!(PathBuf))
                        .help("Notification settings file (JSON)"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Print the effective configuration")
                .arg(
                    Arg::new("path")
                        .long("path")
                        .value_parser(value_parser!(PathBuf))
                        .help("Configuration file to check instead of --config"),
                ),
        )
}

fn snapshot_arg() -> Arg {
    Arg::new("snapshot")
        .long("snapshot")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Workspace snapshot file (JSON)")
}

fn date_arg() -> Arg {
    Arg::new("date")
        .long("date")
        .value_parser(parse_date)
        .help("Treat this day (YYYY-MM-DD) as today")
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    parse_calendar_date(raw).ok_or_else(|| format!("not a date: {raw}"))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_snapshot(path: &Path) -> Result<WorkspaceSnapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    WorkspaceSnapshot::from_json(&text)
        .with_context(|| format!("parsing snapshot {}", path.display()))
}

fn clock_for(args: &ArgMatches) -> Arc<dyn Clock> {
    match args.get_one::<NaiveDate>("date") {
        Some(day) => Arc::new(ManualClock::at_date(*day)),
        None => Arc::new(SystemClock::local()),
    }
}

fn required_path<'a>(args: &'a ArgMatches, id: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(id)
        .with_context(|| format!("missing --{id}"))
}

fn simulate(args: &ArgMatches, json: bool) -> Result<ExitCode> {
    let config = SimulatorConfig {
        seed: args.get_one::<u64>("seed").copied().unwrap_or(42),
        total_operations: args.get_one::<u64>("operations").copied().unwrap_or(10_000),
        stop_on_first_violation: args.get_flag("stop-on-violation"),
        ..SimulatorConfig::default()
    };
    let report = run_simulator(config)?;

    if json {
        let by_type: std::collections::BTreeMap<_, _> =
            report.stats.operations_by_type.iter().collect();
        let out = serde_json::json!({
            "seed": report.config.seed,
            "operations": report.stats.total_operations,
            "rejected": report.stats.failed_operations,
            "by_type": by_type,
            "violations": report.violations.iter().map(|v| format!("{v:?}")).collect::<Vec<_>>(),
            "passed": report.passed(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", report.generate_text());
    }
    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_search(args: &ArgMatches, config: &EngineConfig, json: bool) -> Result<()> {
    let snapshot = load_snapshot(required_path(args, "snapshot")?)?;
    let query = args
        .get_one::<String>("query")
        .context("missing query")?;
    let today = clock_for(args).today();

    let results = search(&snapshot, query, &SearchFilters::new(), today, &config.search)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    let view = if args.get_flag("full") {
        ResultView::Full
    } else {
        ResultView::Compact
    };
    println!("{} result(s) for \"{}\"", results.total, results.query);
    for group in results.grouped(view) {
        println!("\n{} ({} of {})", group.entity.label(), group.hits.len(), group.total);
        for hit in &group.hits {
            println!("  - {}", hit.title());
        }
    }
    if !results.suggestions.is_empty() {
        println!("\nSuggestions: {}", results.suggestions.join(", "));
    }
    Ok(())
}

fn run_scan(args: &ArgMatches, config: &EngineConfig, json: bool) -> Result<()> {
    let snapshot = load_snapshot(required_path(args, "snapshot")?)?;
    let store: Arc<dyn SettingsStore> = match args.get_one::<PathBuf>("settings") {
        Some(path) => Arc::new(JsonFileSettingsStore::new(path.clone())),
        None => Arc::new(MemorySettingsStore::new()),
    };
    let center = NotificationCenter::new(
        config.notifications.clone(),
        CollabBus::new(),
        clock_for(args),
        Arc::new(SharedSnapshot::new(snapshot)),
        store,
        None,
    );

    let report = center.scan();
    let created = center.list();
    center.shutdown();

    if json {
        let out = serde_json::json!({ "report": report, "notifications": created });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "Checked {} task(s) and {} project(s): {} new notification(s)",
        report.tasks_checked,
        report.projects_checked,
        report.created()
    );
    if report.malformed > 0 {
        println!("Skipped {} malformed date(s)", report.malformed);
    }
    for record in &created {
        println!("  [{:?}] {}: {}", record.priority, record.title, record.message);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let matches = cli().get_matches();
    let json = matches.get_flag("json");
    init_tracing(json);

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match matches.subcommand() {
        Some(("simulate", args)) => simulate(args, json),
        Some(("search", args)) => run_search(args, &config, json).map(|()| ExitCode::SUCCESS),
        Some(("scan", args)) => run_scan(args, &config, json).map(|()| ExitCode::SUCCESS),
        Some(("config", args)) => {
            let config = match args.get_one::<PathBuf>("path") {
                Some(path) => EngineConfig::load(path)?,
                None => config,
            };
            print!("{}", config.to_toml_string()?);
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            cli().print_help()?;
            Ok(ExitCode::FAILURE)
        }
    }
}
