//! facts about the machine being watched, shown above the panels.

/// what is known about the host.
///
/// every field is optional; a source that cannot tell leaves it empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Host {
    pub hostname: Option<String>,
    /// the running kernel's release, e.g. `6.8.0-45-generic`.
    pub kernel: Option<String>,
    pub arch: Option<&'static str>,
    /// the model name of the first processor.
    pub cpu_model: Option<String>,
    /// seconds since boot.
    pub uptime: Option<f64>,
    /// the 1, 5 and 15 minute load averages.
    pub load: Option<[f64; 3]>,
}

// === impl Host ===

impl Host {
    /// lays out the known facts as header lines.
    ///
    /// nothing is shown for a host nothing is known about.
    pub fn header(&self) -> Vec<String> {
        let Self {
            hostname,
            kernel,
            arch,
            cpu_model,
            uptime,
            load,
        } = self;

        let banner = [
            hostname.clone(),
            kernel.as_ref().map(|kernel| format!("kernel {kernel}")),
            arch.map(str::to_owned),
        ];
        let status = [
            uptime.map(|uptime| format!("up {}", format_uptime(uptime))),
            load.map(|[one, five, fifteen]| format!("load {one:.2} {five:.2} {fifteen:.2}")),
        ];

        [join(banner), join(status), cpu_model.clone()]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// joins the known parts of a line, or returns `None` if none are known.
fn join<const N: usize>(parts: [Option<String>; N]) -> Option<String> {
    let parts = parts.into_iter().flatten().collect::<Vec<_>>();
    (!parts.is_empty()).then(|| parts.join(" | "))
}

/// formats a number of seconds as days, hours and minutes, e.g. `3d 4h 5m`.
///
/// an uptime of less than a minute is shown in seconds.
pub fn format_uptime(seconds: f64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    // `as` saturates, and maps NaN to zero.
    let seconds = seconds as u64;
    let (days, hours, minutes) = (
        seconds / DAY,
        seconds % DAY / HOUR,
        seconds % HOUR / MINUTE,
    );

    let parts = [(days, "d"), (hours, "h"), (minutes, "m")]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, suffix)| format!("{count}{suffix}"))
        .collect::<Vec<_>>();

    if parts.is_empty() {
        format!("{}s", seconds % MINUTE)
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime() {
        assert_eq!(format_uptime(0.0), "0s");
        assert_eq!(format_uptime(42.9), "42s");
        assert_eq!(format_uptime(3600.0), "1h");
        assert_eq!(format_uptime(3.0 * 86400.0 + 4.0 * 3600.0 + 5.0 * 60.0 + 6.0), "3d 4h 5m");
        assert_eq!(format_uptime(86400.0 + 120.0), "1d 2m");
        assert_eq!(format_uptime(-5.0), "0s");
    }

    #[test]
    fn unknown_host_has_no_header() {
        assert!(Host::default().header().is_empty());
    }

    #[test]
    fn header() {
        let host = Host {
            hostname: Some("bench".to_owned()),
            kernel: Some("6.8.0".to_owned()),
            arch: Some("x86_64"),
            cpu_model: Some("AMD Ryzen 7 5800X 8-Core Processor".to_owned()),
            uptime: Some(90061.0),
            load: Some([0.5, 0.25, 1.0]),
        };
        assert_eq!(
            host.header(),
            [
                "bench | kernel 6.8.0 | x86_64",
                "up 1d 1h 1m | load 0.50 0.25 1.00",
                "AMD Ryzen 7 5800X 8-Core Processor",
            ]
        );
    }

    #[test]
    fn partial_header() {
        let host = Host {
            load: Some([1.0, 2.0, 3.0]),
            ..Host::default()
        };
        assert_eq!(host.header(), ["load 1.00 2.00 3.00"]);
    }
}
