use {
    crate::rate,
    serde::Deserialize,
    std::{
        collections::BTreeMap,
        fmt::{self, Display},
        io,
        path::Path,
        time::Duration,
    },
};

/// options recognized by the dashboard.
///
/// every option may be omitted from a configuration file; see [`Config::default()`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// seconds between ticks.
    pub interval: f64,
    /// the number of samples kept for each graph.
    pub history: usize,
    /// the number of consecutive polls an absent entity is kept for.
    pub grace: u32,
    /// the number of consecutive failed reads before a domain is shown as unavailable.
    pub failure_threshold: u32,
    /// seconds a single domain's read may take before it is discarded.
    pub read_timeout: f64,
    /// decimal places published for each metric, unless overridden in `precision`.
    pub default_precision: u8,
    /// decimal places published for particular metrics, by name.
    pub precision: BTreeMap<String, u8>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(toml::de::Error),
    Invalid { option: &'static str, reason: String },
}

// === impl Config ===

impl Default for Config {
    fn default() -> Self {
        Self {
            interval: 1.0,
            history: 60,
            grace: 1,
            failure_threshold: 3,
            read_timeout: 0.5,
            default_precision: 1,
            precision: BTreeMap::new(),
        }
    }
}

impl Config {
    /// the most decimal places a metric may be rounded to.
    const MAX_PRECISION: u8 = 6;

    /// loads a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        contents.parse()
    }

    /// checks that every option is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |option, reason: &str| {
            Err(ConfigError::Invalid {
                option,
                reason: reason.to_owned(),
            })
        };

        if !(self.interval.is_finite() && self.interval > 0.0) {
            return invalid("interval", "must be a positive number of seconds");
        }
        if Duration::try_from_secs_f64(self.interval).is_err() {
            return invalid("interval", "is too long to wait between polls");
        }
        if !(self.read_timeout.is_finite() && self.read_timeout > 0.0) {
            return invalid("read_timeout", "must be a positive number of seconds");
        }
        if self.history == 0 {
            return invalid("history", "must keep at least one sample");
        }
        if self.failure_threshold == 0 {
            return invalid("failure_threshold", "must allow at least one failure");
        }
        if self.default_precision > Self::MAX_PRECISION {
            return invalid("default_precision", "must be at most 6 decimal places");
        }

        for (metric, decimals) in &self.precision {
            if *decimals > Self::MAX_PRECISION {
                return invalid("precision", &format!("{metric} must be at most 6 decimal places"));
            }
            if !rate::is_known_metric(metric) {
                log::warn!("precision is configured for unknown metric {metric}");
            }
        }

        Ok(())
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;
    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        let config = toml::from_str::<Self>(contents)?;
        config.validate()?;
        Ok(config)
    }
}

// === impl ConfigError ===

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(io) => Some(io),
            Self::Parse(parse) => Some(parse),
            Self::Invalid { .. } => None,
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(io) => f.write_fmt(format_args!("could not read configuration: {io}")),
            Self::Parse(parse) => f.write_fmt(format_args!("invalid configuration: {parse}")),
            Self::Invalid { option, reason } => f.write_fmt(format_args!("{option} {reason}")),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(io: io::Error) -> Self {
        Self::Io(io)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(parse: toml::de::Error) -> Self {
        Self::Parse(parse)
    }
}
