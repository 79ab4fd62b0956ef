use {
    crate::{host::Host, source::SourceError},
    std::io::BufRead,
};

/// the files a [`Host`] is read from; each may be absent.
pub struct Files<R> {
    pub uptime: Option<R>,
    pub loadavg: Option<R>,
    pub cpuinfo: Option<R>,
    pub hostname: Option<R>,
    pub osrelease: Option<R>,
}

/// reads what `/proc` says about the host.
///
/// a file that is absent, or cannot be understood, leaves its field empty.
pub fn read<R: BufRead>(files: Files<R>) -> Result<Host, SourceError> {
    let Files {
        uptime,
        loadavg,
        cpuinfo,
        hostname,
        osrelease,
    } = files;

    Ok(Host {
        hostname: first_line(hostname)?,
        kernel: first_line(osrelease)?,
        arch: Some(std::env::consts::ARCH),
        cpu_model: match cpuinfo {
            Some(cpuinfo) => cpu_model(cpuinfo)?,
            None => None,
        },
        uptime: first_line(uptime)?.as_deref().and_then(parse_uptime),
        load: first_line(loadavg)?.as_deref().and_then(parse_loadavg),
    })
}

/// returns the trimmed first line of a file, if it has one.
fn first_line(file: Option<impl BufRead>) -> Result<Option<String>, SourceError> {
    let Some(file) = file else {
        return Ok(None);
    };

    match file.lines().next() {
        Some(line) => {
            let line = line?;
            let line = line.trim();
            Ok((!line.is_empty()).then(|| line.to_owned()))
        }
        None => Ok(None),
    }
}

/// parses `/proc/uptime`, e.g. `350735.47 234388.90`.
fn parse_uptime(line: &str) -> Option<f64> {
    let uptime = line.split_whitespace().next()?.parse::<f64>().ok();
    if uptime.is_none() {
        log::debug!("could not parse uptime from {line:?}");
    }
    uptime
}

/// parses `/proc/loadavg`, e.g. `0.52 0.58 0.59 1/467 38211`.
fn parse_loadavg(line: &str) -> Option<[f64; 3]> {
    let mut fields = line.split_whitespace().map(str::parse::<f64>);
    match (fields.next(), fields.next(), fields.next()) {
        (Some(Ok(one)), Some(Ok(five)), Some(Ok(fifteen))) => Some([one, five, fifteen]),
        _ => {
            log::debug!("could not parse load averages from {line:?}");
            None
        }
    }
}

/// finds the first `model name` in `/proc/cpuinfo`.
fn cpu_model(cpuinfo: impl BufRead) -> Result<Option<String>, SourceError> {
    for line in cpuinfo.lines() {
        let line = line?;
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if key.trim() == "model name" {
            return Ok(Some(value.trim().to_owned()));
        }
    }

    Ok(None)
}
