mod config;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use range_core::zone::{end_of_day, start_of_day};
use range_core::{trailing_days, Clock, DateRange, DateRangePicker, DisplayMonth, Selection, SystemClock, WEEKDAY_LABELS};
use range_table::users::{fetch_users_by_range, sample_users, user_columns, user_rows};
use range_table::{DataTable, EMPTY_TABLE_TEXT};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "range")]
#[command(author, version, about = "Browse user registrations through a timezone-aware date-range picker")]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// IANA timezone the picker snaps day boundaries to
    #[arg(long)]
    timezone: Option<String>,

    /// Days back from today that can be picked (-1 for no limit)
    #[arg(long, allow_negative_numbers = true)]
    max_past_days: Option<i32>,

    /// Trigger text while no range is committed
    #[arg(long)]
    placeholder: Option<String>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive picker and user table (default)
    Tui,

    /// Print the calendar grid of a month
    Grid {
        /// Month as YYYY-MM, defaults to the current month
        #[arg(long, value_parser = parse_month)]
        month: Option<DisplayMonth>,
    },

    /// Print the users registered within a range
    Users {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day, YYYY-MM-DD (defaults to FROM)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
}

fn parse_month(s: &str) -> std::result::Result<DisplayMonth, String> {
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
        .map(DisplayMonth::containing)
        .map_err(|err| format!("expected YYYY-MM: {err}"))
}

fn init_logging(level: &str, log_file: Option<&Path>, terminal_is_free: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None if terminal_is_free => builder.with_writer(std::io::stderr).init(),
        None => builder.with_writer(std::io::sink).init(),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(timezone) = cli.timezone {
        config.picker.timezone = timezone;
    }
    if let Some(days) = cli.max_past_days {
        config.picker.max_past_days = days;
    }
    if let Some(placeholder) = cli.placeholder {
        config.picker.placeholder = placeholder;
    }
    config.validate()?;

    let level = if cli.verbose { "debug" } else { config.general.log_level.as_str() };
    let log_file = cli.log_file.as_deref().or(config.general.log_file.as_deref());
    let command = cli.command.unwrap_or(Commands::Tui);
    init_logging(level, log_file, !matches!(command, Commands::Tui))?;
    debug!(?config, "configuration loaded");

    match command {
        Commands::Tui => run_tui(&config),
        Commands::Grid { month } => {
            print_grid(&config, month);
            Ok(())
        }
        Commands::Users { from, to } => {
            print_users(&config, from, to)
        }
    }
}

fn user_table(config: &Config) -> DataTable {
    DataTable::new(user_columns(), Vec::new()).with_initial_sort(
        config.table.initial_sort_key.as_deref(),
        config.table.initial_sort_direction,
    )
}

fn run_tui(config: &Config) -> Result<()> {
    let now = SystemClock.now();
    let committed = trailing_days(config.table.default_range_days, &config.picker.timezone, now);
    let picker = DateRangePicker::new(config.picker.clone(), committed);
    info!(range = %picker.display_text(), "starting picker");
    let app = range_tui::App::new(picker, user_table(config), sample_users());
    range_tui::run(app)
}

fn print_grid(config: &Config, month: Option<DisplayMonth>) {
    let mut picker = DateRangePicker::new(config.picker.clone(), DateRange::empty());
    if let Some(month) = month {
        let current = picker.display_month();
        let delta = (month.year() - current.year()) * 12 + month.month() as i32 - current.month() as i32;
        picker.navigate_month(delta);
    }

    println!("{:^28}", picker.month_label());
    println!("{}", WEEKDAY_LABELS.map(|d| format!("{d:>3} ")).concat());
    for week in picker.calendar_days().chunks(7) {
        let line: String = week
            .iter()
            .map(|day| match (day.is_current_month, day.is_disabled) {
                (false, _) => format!("({:>2})", day.day_of_month),
                (true, true) => format!("[{:>2}]", day.day_of_month),
                (true, false) => format!(" {:>2} ", day.day_of_month),
            })
            .collect();
        println!("{line}");
    }
    println!("(d) other month  [d] out of range");
}

/// The range `users` reports on. Endpoints given in either order are put in
/// order before they become day boundaries; no dates means the default
/// trailing range.
fn users_range(
    config: &Config,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> Result<DateRange> {
    let zone = config.picker.timezone.as_str();
    if from.is_none() && to.is_some() {
        bail!("--to needs --from");
    }
    let Some((first, last)) = Selection::from_endpoints(from, to).finish() else {
        return Ok(trailing_days(config.table.default_range_days, zone, now));
    };
    let start = start_of_day(first, zone).with_context(|| format!("no start of {first} in {zone}"))?;
    let end = match last {
        Some(last) => Some(end_of_day(last, zone).with_context(|| format!("no end of {last} in {zone}"))?),
        None => None,
    };
    Ok(DateRange::new(Some(start), end))
}

fn print_users(config: &Config, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<()> {
    let zone = config.picker.timezone.as_str();
    let range = users_range(config, from, to, SystemClock.now())?;

    let picker = DateRangePicker::new(config.picker.clone(), range);
    println!("Registered: {}\n", picker.display_text());

    let mut table = user_table(config);
    table.set_rows(user_rows(&fetch_users_by_range(&sample_users(), &range, zone)));
    let rows = table.visible_rows();
    if rows.is_empty() {
        println!("{EMPTY_TABLE_TEXT}");
        return Ok(());
    }

    let widths: Vec<usize> = table
        .columns()
        .iter()
        .map(|column| {
            rows.iter()
                .map(|row| table.cell_text(row, column).chars().count())
                .chain(std::iter::once(column.header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();
    let header: Vec<String> = table
        .columns()
        .iter()
        .zip(&widths)
        .map(|(column, width)| format!("{:<width$}", column.header))
        .collect();
    println!("{}", header.join("  "));
    for row in rows {
        let cells: Vec<String> = table
            .columns()
            .iter()
            .zip(&widths)
            .map(|(column, width)| format!("{:<width$}", table.cell_text(row, column)))
            .collect();
        println!("{}", cells.join("  "));
    }
    Ok(())
}
