//! a terminal dashboard for cumulative kernel counters.

use {
    clap::Parser,
    odo::{
        App, AppError,
        config::{Config, ConfigError},
    },
    std::{io, path::PathBuf},
};

type Error = Box<dyn std::error::Error>;

/// a terminal dashboard for cpu, memory, disk and network rates.
#[derive(Debug, Parser)]
#[command(name = "odo", version)]
struct Cli {
    /// read options from this TOML file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// seconds between polls.
    #[arg(long, value_name = "SECS")]
    interval: Option<f64>,

    /// samples kept for each graph.
    #[arg(long, value_name = "N")]
    history: Option<usize>,

    /// polls an absent device is kept for.
    #[arg(long, value_name = "N")]
    grace: Option<u32>,

    /// consecutive failed reads before a domain is shown as unavailable.
    #[arg(long, value_name = "N")]
    failure_threshold: Option<u32>,

    /// decimal places for a metric, e.g. `down=0`.
    #[arg(long, value_name = "METRIC=DECIMALS", value_parser = parse_precision)]
    precision: Vec<(String, u8)>,

    /// print one report and exit, instead of opening the dashboard.
    #[arg(long)]
    once: bool,
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    run(Cli::parse())?;
    Ok(())
}

fn run(cli: Cli) -> Result<(), AppError> {
    let once = cli.once;
    let config = cli.into_config()?;
    log::debug!("running with {config:?}");

    let app = App::new(&config);
    if once {
        app.once(&mut io::stdout().lock())
    } else {
        app.tui()
    }
}

// === impl Cli ===

impl Cli {
    /// loads the configuration file, if any, and applies flags over it.
    fn into_config(self) -> Result<Config, ConfigError> {
        let Self {
            config,
            interval,
            history,
            grace,
            failure_threshold,
            precision,
            once: _,
        } = self;

        let mut config = match config {
            Some(path) => Config::load(&path)?,
            None => Config::default(),
        };

        if let Some(interval) = interval {
            config.interval = interval;
        }
        if let Some(history) = history {
            config.history = history;
        }
        if let Some(grace) = grace {
            config.grace = grace;
        }
        if let Some(failure_threshold) = failure_threshold {
            config.failure_threshold = failure_threshold;
        }
        config.precision.extend(precision);

        config.validate()?;
        Ok(config)
    }
}

/// parses a `METRIC=DECIMALS` pair.
fn parse_precision(arg: &str) -> Result<(String, u8), String> {
    let (metric, decimals) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected METRIC=DECIMALS, found {arg}"))?;
    let decimals = decimals
        .parse::<u8>()
        .map_err(|error| format!("invalid decimals for {metric}: {error}"))?;

    Ok((metric.to_owned(), decimals))
}
