//! `nextrun` — print (and optionally wait for) the next occurrence of a schedule.

use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, Utc, Weekday};
use clap::{Args, Parser, Subcommand};
use nextrun_core::NextrunConfig;
use nextrun_scheduler::{
    Clock, Field, FieldKind, FixedClock, Interval, Resolve, Scheduled, SystemClock, Ticker, Timer,
};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "nextrun")]
#[command(about = "Compute the next occurrence of a relative or absolute schedule")]
struct Cli {
    /// Config file (default: $NEXTRUN_CONFIG or ~/.nextrun/nextrun.toml)
    #[arg(long)]
    config: Option<String>,

    /// Resolve against this instant instead of the wall clock (RFC 3339)
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// IANA location for date arithmetic (overrides config)
    #[arg(long)]
    location: Option<String>,

    /// Sleep until the occurrence fires; repeats if the config says so
    #[arg(long)]
    wait: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fire after a relative offset from now
    After(OffsetArgs),

    /// Fire at the next instant matching the given fields (`*` = any)
    At(FieldArgs),
}

#[derive(Args)]
struct OffsetArgs {
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    years: i64,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    months: i64,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    weeks: i64,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    days: i64,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    hours: i64,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    minutes: i64,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    seconds: i64,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    nanoseconds: i64,
}

#[derive(Args)]
struct FieldArgs {
    #[arg(long, value_parser = parse_field)]
    year: Option<Field>,
    #[arg(long, value_parser = parse_field)]
    month: Option<Field>,
    /// 0-6 (Sunday = 0), a weekday name, or `*`; informational only
    #[arg(long, value_parser = parse_weekday)]
    weekday: Option<Field>,
    /// Day of the month
    #[arg(long, value_parser = parse_field)]
    date: Option<Field>,
    #[arg(long, value_parser = parse_field)]
    hour: Option<Field>,
    #[arg(long, value_parser = parse_field)]
    minute: Option<Field>,
    #[arg(long, value_parser = parse_field)]
    second: Option<Field>,
    #[arg(long, value_parser = parse_field)]
    nanosecond: Option<Field>,
    /// Field to take from `now` (repeatable); explicit values win
    #[arg(long, value_name = "FIELD")]
    every: Vec<FieldKind>,
}

fn parse_field(s: &str) -> Result<Field, String> {
    if s == "*" {
        return Ok(Field::Every);
    }
    s.parse::<u32>()
        .map(Field::At)
        .map_err(|e| format!("expected a number or `*`: {e}"))
}

fn parse_weekday(s: &str) -> Result<Field, String> {
    parse_field(s).or_else(|_| {
        s.parse::<Weekday>()
            .map(|day| Field::At(day.num_days_from_sunday()))
            .map_err(|_| format!("unknown weekday: {s}"))
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nextrun_cli=info,nextrun_scheduler=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // load config: --config > NEXTRUN_CONFIG env > ~/.nextrun/nextrun.toml
    let config_path = cli.config.clone().or_else(|| std::env::var("NEXTRUN_CONFIG").ok());
    let mut config = NextrunConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        NextrunConfig::default()
    });
    if let Some(location) = cli.location.clone() {
        config.resolver.location = location;
    }

    let clock: Arc<dyn Clock> = match cli.now {
        Some(now) => Arc::new(FixedClock(now)),
        None => Arc::new(SystemClock),
    };
    let repeat = config.ticker.repeat;

    match cli.command {
        Command::After(o) => {
            let interval = Interval::configured(&config.resolver, repeat)?
                .add_year(o.years)
                .add_month(o.months)
                .add_week(o.weeks)
                .add_day(o.days)
                .add_hour(o.hours)
                .add_minute(o.minutes)
                .add_second(o.seconds)
                .add_nanosecond(o.nanoseconds);
            drive(interval, clock, cli.wait, &config).await
        }
        Command::At(f) => {
            let open = f
                .every
                .iter()
                .fold(Timer::configured(&config.resolver, repeat)?, |timer, &kind| {
                    timer.every(kind)
                });
            let timer = [
                (FieldKind::Year, f.year),
                (FieldKind::Month, f.month),
                (FieldKind::Weekday, f.weekday),
                (FieldKind::Date, f.date),
                (FieldKind::Hour, f.hour),
                (FieldKind::Minute, f.minute),
                (FieldKind::Second, f.second),
                (FieldKind::Nanosecond, f.nanosecond),
            ]
            .into_iter()
            .fold(open, |timer, (kind, field)| match field {
                Some(field) => timer.set(kind, field),
                None => timer,
            });
            drive(timer, clock, cli.wait, &config).await
        }
    }
}

/// Print the next occurrence; with `wait`, hand the schedule to a ticker and
/// print each firing until it finishes or Ctrl-C arrives.
async fn drive<R>(
    schedule: R,
    clock: Arc<dyn Clock>,
    wait: bool,
    config: &NextrunConfig,
) -> anyhow::Result<()>
where
    R: Resolve + Clone + Display + Send + 'static,
{
    let next = Scheduled::resolve(schedule.clone(), &*clock)?;
    println!("schedule: {schedule}");
    println!("next:     {}", next.occurrence());

    if !wait {
        return Ok(());
    }

    let (fired_tx, mut fired_rx) = mpsc::channel(config.ticker.channel_capacity.max(1));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping");
            let _ = shutdown_tx.send(true);
        }
    });

    let ticker = tokio::spawn(Ticker::new(schedule, clock).run(fired_tx, shutdown_rx));
    while let Some(occurrence) = fired_rx.recv().await {
        println!("fired:    {}", occurrence.at().format("%Y-%m-%d %H:%M:%S%.f %Z"));
    }

    let fired = ticker.await??;
    info!(fired, "done");
    Ok(())
}
