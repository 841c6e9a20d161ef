use std::{fmt::Display, path::PathBuf};

use anyhow::Result;
use chrono::Duration;
use clap::{Parser, ValueEnum};
use tracing::level_filters::LevelFilter;

use crate::{
    monitor::{alert::AlertPolicy, start_monitor, MonitorConfig},
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, MONITOR_PREFIX},
        time::parse_time_limit,
    },
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyOption {
    Escalating,
    Immediate,
}

impl Display for PolicyOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyOption::Escalating => write!(f, "escalating"),
            PolicyOption::Immediate => write!(f, "immediate"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "Timesup", version, long_about = None)]
#[command(about = "Monitor active keyboard and mouse time against a daily budget", long_about = None)]
struct Args {
    #[arg(
        short = 't',
        long = "time",
        help = "Time limit in a format like 1h10m01s. Components are optional but order-fixed"
    )]
    time: String,
    #[arg(
        long,
        default_value_t = PolicyOption::Escalating,
        help = "What happens once the limit is reached. Escalating keeps alerting until the alert budget runs out, immediate ends the session on the first breach"
    )]
    policy: PolicyOption,
    #[arg(
        long = "max-alerts",
        default_value_t = AlertPolicy::DEFAULT_MAX_ALERTS,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Number of alerts played before the session is ended. Only used by the escalating policy"
    )]
    max_alerts: u32,
    #[arg(
        long = "log-interval",
        default_value_t = 2,
        value_parser = clap::value_parser!(i64).range(1..),
        help = "Seconds between periodic activity log records"
    )]
    log_interval: i64,
    #[arg(
        long,
        help = "Activity log file. By default activity.log in the application directory"
    )]
    output: Option<PathBuf>,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, help = "Enable console logging. This option is for debugging purposes only")]
    log: bool,
    #[arg(long = "log-filter")]
    log_filter: Option<LevelFilter>,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args.dir.map_or_else(create_application_default_path, Ok)?;
    enable_logging(MONITOR_PREFIX, &app_dir, args.log_filter, args.log)?;

    let time_limit = parse_time_limit(&args.time)?;

    let policy = match args.policy {
        PolicyOption::Escalating => AlertPolicy::Escalating {
            max_alerts: args.max_alerts,
        },
        PolicyOption::Immediate => AlertPolicy::Immediate,
    };

    let config = MonitorConfig {
        time_limit,
        policy,
        log_interval: Duration::seconds(args.log_interval),
        activity_log: args
            .output
            .unwrap_or_else(|| app_dir.join("activity.log")),
    };

    start_monitor(config).await
}
