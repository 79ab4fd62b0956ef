//! a terminal dashboard for cumulative kernel counters.
//!
//! counters are read from a [`CounterSource`][source::CounterSource], turned into rates by a
//! [`Poller`][poller::Poller], and drawn as panels.

use {
    self::{
        config::{Config, ConfigError},
        history::HistoryBook,
        host::Host,
        poller::Poller,
        procfs::ProcFs,
        sample::Domain,
        source::{Clock, CounterSource, SystemClock},
    },
    std::{
        fmt::{self, Display},
        io::{self, Write},
    },
};

pub mod config;
pub mod history;
pub mod host;
pub mod meter;
pub mod panel;
pub mod poller;
pub mod procfs;
pub mod rate;
pub mod sample;
pub mod source;
pub mod store;
pub mod topology;

/// the interactive dashboard.
mod window;

pub struct App<C = SystemClock, S = ProcFs> {
    poller: Poller<C, S>,
    /// recent values of every metric.
    history: HistoryBook,
    /// what the source last said about the machine.
    host: Host,
}

/// the dashboard could not be run.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    /// the terminal could not be written to.
    Io(io::Error),
}

// === impl App ===

impl App {
    /// initializes a new application, reading counters from `/proc`.
    pub fn new(config: &Config) -> Self {
        Self::with_source(SystemClock::default(), ProcFs::default(), config)
    }
}

impl<C, S> App<C, S>
where
    C: Clock,
    S: CounterSource,
{
    /// initializes a new application, reading counters from the given source.
    pub fn with_source(clock: C, source: S, config: &Config) -> Self {
        Self {
            poller: Poller::new(clock, source, config),
            history: HistoryBook::new(config.history),
            host: Host::default(),
        }
    }

    /// polls every domain, and records the results.
    pub fn tick(&mut self) {
        let Self {
            poller,
            history,
            host,
        } = self;

        poller.tick();
        for domain in Domain::ALL {
            if let Some(report) = poller.latest(domain) {
                history.record(domain, report);
            }
        }

        match poller.source().host() {
            Ok(latest) => *host = latest,
            Err(error) => log::warn!("could not describe the host: {error}"),
        }
    }

    /// polls twice, one interval apart, and prints a plain report.
    ///
    /// the first poll only establishes a baseline; rates are measured across the interval.
    pub fn once(mut self, out: &mut impl Write) -> Result<(), AppError> {
        self.tick();
        std::thread::sleep(self.poller.interval());
        self.tick();

        for line in self.report() {
            writeln!(out, "{line}")?;
        }
        out.flush().map_err(AppError::from)
    }

    /// renders the host header, and the latest report of every domain.
    pub fn report(&self) -> Vec<String> {
        let Self { poller, host, .. } = self;

        let mut lines = host.header();
        for domain in Domain::ALL {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            let section = panel::report(domain, poller.latest(domain));
            lines.extend(section.render(&panel::title(domain)));
        }

        lines
    }
}

// === impl AppError ===

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(config) => Some(config),
            Self::Io(io) => Some(io),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(config) => f.write_fmt(format_args!("{}", config)),
            Self::Io(io) => f.write_fmt(format_args!("{}", io)),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(config: ConfigError) -> Self {
        Self::Config(config)
    }
}

impl From<io::Error> for AppError {
    fn from(io: io::Error) -> Self {
        Self::Io(io)
    }
}
