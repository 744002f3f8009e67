//! `series-cal` CLI: project show calendars, check recurrence rules, and work with
//! occurrence ids from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Project a workspace export ({"templates": [...], "exceptions": [...]}) over March
//! series-cal project -i workspace.json --start 2025-03-01T00:00:00Z --end 2025-04-01T00:00:00Z
//!
//! # Same, from stdin, with an engine config file and cancelled instances kept
//! cat workspace.json | series-cal project --start 2025-03-01 --end 2025-04-01 \
//!     --config engine.json --retain-cancelled
//!
//! # Validate and normalize a rule
//! series-cal rule "freq=weekly;byday=fr,mo;count=10"
//!
//! # Encode / decode occurrence ids
//! series-cal id encode abc 2025-03-10T09:00:00Z
//! series-cal id decode abc:20250310T090000Z
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use series_engine::rule::{self, Termination};
use series_engine::{
    CancelledInstancePolicy, DstPolicy, EngineConfig, ExceptionRecord, OccurrenceId,
    SeriesTemplate, Window,
};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "series-cal",
    version,
    about = "Recurring show calendar projection"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level used when RUST_LOG is not set (logs go to stderr)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Project templates and exceptions into calendar entries for a window
    Project {
        /// Input JSON with `templates` and `exceptions` arrays (reads stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Window start (inclusive), RFC 3339 or YYYY-MM-DD
        #[arg(long)]
        start: String,
        /// Window end (exclusive), RFC 3339 or YYYY-MM-DD
        #[arg(long)]
        end: String,
        /// Engine config JSON file; flags below override its fields
        #[arg(long)]
        config: Option<String>,
        /// Emit cancelled occurrences flagged instead of omitting them
        #[arg(long)]
        retain_cancelled: bool,
        /// Leave out templates whose status is cancelled
        #[arg(long)]
        hide_cancelled_series: bool,
        /// How to place occurrences that fall into a DST gap
        #[arg(long, value_enum)]
        dst_policy: Option<DstPolicyArg>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Validate a recurrence rule and print its canonical form
    Rule {
        /// Rule text, e.g. "FREQ=WEEKLY;BYDAY=MO,WE;COUNT=10"
        text: String,
    },
    /// Encode or decode occurrence ids
    Id {
        #[command(subcommand)]
        action: IdAction,
    },
}

#[derive(Subcommand)]
enum IdAction {
    /// Build the id of a series occurrence from its nominal start
    Encode { series_id: String, nominal_start: String },
    /// Split an occurrence id into series id and nominal start
    Decode { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum DstPolicyArg {
    Skip,
    ShiftForward,
    WallClock,
}

impl From<DstPolicyArg> for DstPolicy {
    fn from(arg: DstPolicyArg) -> Self {
        match arg {
            DstPolicyArg::Skip => DstPolicy::Skip,
            DstPolicyArg::ShiftForward => DstPolicy::ShiftForward,
            DstPolicyArg::WallClock => DstPolicy::WallClock,
        }
    }
}

/// A workspace export as produced by the storage layer.
#[derive(Deserialize)]
struct WorkspaceInput {
    templates: Vec<SeriesTemplate>,
    #[serde(default)]
    exceptions: Vec<ExceptionRecord>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Project {
            input,
            output,
            start,
            end,
            config,
            retain_cancelled,
            hide_cancelled_series,
            dst_policy,
            pretty,
        } => {
            let mut engine_config = load_config(config.as_deref())?;
            if retain_cancelled {
                engine_config.cancelled_instances = CancelledInstancePolicy::Retain;
            }
            if hide_cancelled_series {
                engine_config.hide_cancelled_series = true;
            }
            if let Some(policy) = dst_policy {
                engine_config.dst_policy = policy.into();
            }

            let window = Window::new(
                parse_instant(&start).context("Invalid --start")?,
                parse_instant(&end).context("Invalid --end")?,
            );

            let raw = read_input(input.as_deref())?;
            let workspace: WorkspaceInput =
                serde_json::from_str(&raw).context("Failed to parse workspace JSON")?;
            tracing::info!(
                templates = workspace.templates.len(),
                exceptions = workspace.exceptions.len(),
                "projecting calendar"
            );

            let entries = series_engine::build_calendar(
                &workspace.templates,
                &workspace.exceptions,
                window,
                &engine_config,
            )
            .context("Failed to project calendar")?;

            let json = if pretty {
                serde_json::to_string_pretty(&entries)?
            } else {
                serde_json::to_string(&entries)?
            };
            write_output(output.as_deref(), &json)?;
        }
        Commands::Rule { text } => {
            match rule::parse(Some(&text)).context("Invalid recurrence rule")? {
                None => println!("non-recurring"),
                Some(parsed) => {
                    println!("canonical: {}", rule::serialize(&parsed));
                    println!("frequency: {}", parsed.frequency());
                    println!("interval:  {}", parsed.interval());
                    if !parsed.weekdays().is_empty() {
                        let indices: Vec<String> =
                            parsed.weekday_indices().iter().map(u8::to_string).collect();
                        println!("weekdays:  {}", indices.join(","));
                    }
                    match parsed.termination() {
                        Termination::Never => println!("ends:      never"),
                        Termination::Count(n) => println!("ends:      after {} occurrences", n),
                        Termination::Until(t) => println!("ends:      {}", t.to_rfc3339()),
                    }
                }
            }
        }
        Commands::Id { action } => match action {
            IdAction::Encode {
                series_id,
                nominal_start,
            } => {
                let start = parse_instant(&nominal_start).context("Invalid nominal start")?;
                println!("{}", OccurrenceId::new(series_id, start));
            }
            IdAction::Decode { id } => {
                let decoded = OccurrenceId::parse(&id).context("Failed to decode occurrence id")?;
                println!("series_id:     {}", decoded.series_id());
                println!("nominal_start: {}", decoded.nominal_start().to_rfc3339());
            }
        },
    }

    Ok(())
}

fn load_config(path: Option<&str>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path))?;
            EngineConfig::from_json(&raw).with_context(|| format!("Invalid config: {}", path))
        }
        None => Ok(EngineConfig::default()),
    }
}

/// RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (read as UTC), or a bare date (midnight UTC).
fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(ndt.and_utc());
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Unrecognized datetime: {}", s))?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
