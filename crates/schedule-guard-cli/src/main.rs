//! `slotcheck` CLI — check gym class schedules for double-bookings.
//!
//! Works on a JSON export of the `schedules` collection (an array of schedule
//! records). Inactive records are dropped before any check.
//!
//! ## Usage
//!
//! ```sh
//! # Would a new slot double-book an active schedule? (exit 1 if so)
//! slotcheck -s schedules.json check \
//!   --start-date 01/03/2024 --end-date 31/03/2024 \
//!   --start-time "6:00 PM" --end-time "7:00 PM"
//!
//! # Same check while editing schedule "s1" (its stored version is ignored)
//! slotcheck -s schedules.json check --exclude s1 ...
//!
//! # Explain a rejection: every overlapping schedule as JSON
//! slotcheck -s schedules.json conflicts ...
//!
//! # Which active schedules cover a given day?
//! slotcheck -s schedules.json on-date --date 15/03/2024 --professor prof-1
//!
//! # Find legacy double-bookings already in the data
//! cat schedules.json | slotcheck audit
//! ```
//!
//! Set `RUST_LOG=schedule_guard=debug` to see skipped records on stderr.

use std::io::{self, Read};
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use schedule_guard::{
    find_overlaps, has_overlap, parse_date, DocumentStore, Filter, Interval, MemoryStore, Overlap,
    ParsedInterval, Schedule, ScheduleRepository,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

/// Exit status when the candidate double-books an existing schedule.
const EXIT_CONFLICT: i32 = 1;
/// Exit status for bad input (unreadable file, invalid JSON, invalid date/time).
const EXIT_ERROR: i32 = 2;

#[derive(Parser)]
#[command(
    name = "slotcheck",
    version,
    about = "Check gym class schedules for double-bookings"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON array of schedule records (reads from stdin if omitted)
    #[arg(short, long, global = true, env = "SLOTCHECK_SCHEDULES")]
    schedules: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Exit 0 if the window is free, 1 if it overlaps an active schedule
    Check(Window),
    /// Print every active schedule the window overlaps, as JSON
    Conflicts(Window),
    /// Print the active schedules whose date range includes a day, as JSON
    OnDate {
        /// Day to look up (dd/MM/yyyy)
        #[arg(long)]
        date: String,
        /// Only schedules taught by this professor
        #[arg(long)]
        professor: Option<String>,
    },
    /// Report pairs of active schedules that already overlap each other
    Audit,
}

/// The candidate date/time window.
#[derive(Args)]
struct Window {
    /// First day (dd/MM/yyyy)
    #[arg(long)]
    start_date: String,
    /// Last day, inclusive (dd/MM/yyyy)
    #[arg(long)]
    end_date: String,
    /// Start time ("6:00 PM" or "18:00")
    #[arg(long)]
    start_time: String,
    /// End time ("7:00 PM" or "19:00")
    #[arg(long)]
    end_time: String,
    /// Id of the schedule being edited, ignored during the check
    #[arg(long)]
    exclude: Option<String>,
}

impl Window {
    fn interval(&self) -> Interval {
        Interval::new(
            self.exclude.clone().unwrap_or_default(),
            &self.start_date,
            &self.end_date,
            &self.start_time,
            &self.end_time,
        )
    }
}

#[derive(Serialize)]
struct ConflictReport {
    candidate: Interval,
    overlaps: Vec<Overlap>,
}

#[derive(Serialize)]
struct AuditPair {
    first: String,
    second: String,
    overlap_days: i64,
    overlap_minutes: i64,
}

#[derive(Serialize)]
struct AuditReport {
    conflicts: Vec<AuditPair>,
    /// Active records whose dates/times could not be parsed.
    skipped: Vec<String>,
}

fn main() {
    // Diagnostics go to stderr so stdout stays machine-readable.
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(EXIT_ERROR);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let raw = read_input(cli.schedules.as_deref())?;
    let schedules = active_schedules(&raw)?;
    info!(count = schedules.len(), "loaded active schedules");

    match cli.command {
        Commands::Check(window) => {
            let candidate = validated_candidate(&window)?;
            let existing = intervals(&schedules);
            let exclude = window.exclude.as_deref();

            if has_overlap(&candidate, &existing, exclude) {
                let ids: Vec<String> = find_overlaps(&candidate, &existing, exclude)
                    .into_iter()
                    .map(|o| o.existing_id)
                    .collect();
                println!("CONFLICT: overlaps schedule(s) {}", ids.join(", "));
                return Ok(EXIT_CONFLICT);
            }
            println!("OK: no overlapping schedule");
        }
        Commands::Conflicts(window) => {
            let candidate = validated_candidate(&window)?;
            let overlaps = find_overlaps(
                &candidate,
                &intervals(&schedules),
                window.exclude.as_deref(),
            );
            print_json(&ConflictReport {
                candidate,
                overlaps,
            })?;
        }
        Commands::OnDate { date, professor } => {
            let covering = match professor {
                Some(professor) => load_repository(&schedules)?
                    .for_date(&professor, &date)
                    .with_context(|| format!("Failed to look up schedules on {}", date))?,
                None => covering_date(&schedules, &date)?,
            };
            print_json(&covering)?;
        }
        Commands::Audit => {
            print_json(&audit(&schedules))?;
        }
    }

    Ok(0)
}

/// The candidate must parse; a window that cannot be compared is a usage error.
fn validated_candidate(window: &Window) -> Result<Interval> {
    let candidate = window.interval();
    candidate
        .parse()
        .context("Invalid date/time for the candidate schedule")?;
    Ok(candidate)
}

/// Records whose `active` field is literally `true`; a missing flag does not count.
fn active_schedules(raw: &str) -> Result<Vec<Schedule>> {
    let all: Vec<serde_json::Value> =
        serde_json::from_str(raw).context("Failed to parse schedules JSON")?;
    let active = Filter::active();
    all.into_iter()
        .filter(|record| active.matches(record))
        .map(|record| serde_json::from_value(record).context("Invalid schedule record"))
        .collect()
}

fn intervals(schedules: &[Schedule]) -> Vec<Interval> {
    schedules.iter().map(Schedule::interval).collect()
}

fn load_repository(schedules: &[Schedule]) -> Result<ScheduleRepository<MemoryStore>> {
    let repo = ScheduleRepository::new(MemoryStore::new());
    for schedule in schedules {
        // Raw upsert: the export may already contain overlaps.
        let doc = schedule.to_document()?;
        repo.store().upsert(repo.collection(), &doc.id, doc.data)?;
    }
    Ok(repo)
}

fn covering_date(schedules: &[Schedule], date: &str) -> Result<Vec<Schedule>> {
    let target = parse_date(date).with_context(|| format!("Invalid date: {}", date))?;
    Ok(schedules
        .iter()
        .filter(|s| {
            matches!(
                (parse_date(&s.start_date), parse_date(&s.end_date)),
                (Ok(start), Ok(end)) if start <= target && target <= end
            )
        })
        .cloned()
        .collect())
}

fn audit(schedules: &[Schedule]) -> AuditReport {
    let mut parsed: Vec<(&str, ParsedInterval)> = Vec::new();
    let mut skipped = Vec::new();
    for schedule in schedules {
        match schedule.interval().parse() {
            Ok(p) => parsed.push((schedule.id.as_str(), p)),
            Err(_) => skipped.push(schedule.id.clone()),
        }
    }

    let mut conflicts = Vec::new();
    for (i, (first, a)) in parsed.iter().enumerate() {
        for (second, b) in &parsed[i + 1..] {
            if a.overlaps(b) {
                conflicts.push(AuditPair {
                    first: first.to_string(),
                    second: second.to_string(),
                    overlap_days: a.overlap_days(b),
                    overlap_minutes: a.overlap_minutes(b),
                });
            }
        }
    }

    AuditReport { conflicts, skipped }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", pretty);
    Ok(())
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
