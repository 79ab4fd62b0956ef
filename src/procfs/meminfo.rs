use {
    super::parse_field,
    crate::{
        sample::{Counters, EntityId},
        source::{Record, RecordError, Sample, Schema, SourceError},
    },
    std::{collections::BTreeMap, io::BufRead},
};

/// the counters provided for `ram` and `swap`.
const COUNTERS: [&str; 9] = [
    "total",
    "used",
    "free",
    "available",
    "buffers",
    "cached",
    "shared",
    "page_in",
    "page_out",
];

/// a table of `key: value` lines, with each value parsed independently.
type Table = BTreeMap<String, Result<u64, RecordError>>;

pub fn schema() -> Schema {
    COUNTERS.into_iter().collect()
}

/// reads the `ram` and `swap` entities.
///
/// sizes are reported in bytes. paging counters are zero if `vmstat` is not available.
pub fn read(meminfo: impl BufRead, vmstat: Option<impl BufRead>) -> Result<Sample, SourceError> {
    let meminfo = parse_meminfo(meminfo)?;
    let vmstat = match vmstat {
        Some(vmstat) => parse_vmstat(vmstat)?,
        None => Table::new(),
    };

    let ram = ram(&meminfo, &vmstat);
    let swap = swap(&meminfo, &vmstat);

    Ok(Sample::from([
        (EntityId::from("ram"), ram),
        (EntityId::from("swap"), swap),
    ]))
}

fn ram(meminfo: &Table, vmstat: &Table) -> Record {
    let total = lookup(meminfo, "MemTotal")?;
    let free = lookup(meminfo, "MemFree")?;
    let available = lookup(meminfo, "MemAvailable")?;
    let buffers = lookup(meminfo, "Buffers")?;
    let cached = lookup(meminfo, "Cached")?.saturating_add(lookup(meminfo, "SReclaimable")?);
    let shared = lookup(meminfo, "Shmem")?;

    // kernels older than 3.14 do not estimate available memory.
    let used = if meminfo.contains_key("MemAvailable") {
        total.saturating_sub(available)
    } else {
        total
            .saturating_sub(free)
            .saturating_sub(buffers)
            .saturating_sub(cached)
    };

    Ok(Counters::from([
        ("total", total),
        ("used", used),
        ("free", free),
        ("available", available),
        ("buffers", buffers),
        ("cached", cached),
        ("shared", shared),
        ("page_in", lookup(vmstat, "pgpgin")?),
        ("page_out", lookup(vmstat, "pgpgout")?),
    ]))
}

fn swap(meminfo: &Table, vmstat: &Table) -> Record {
    let total = lookup(meminfo, "SwapTotal")?;
    let free = lookup(meminfo, "SwapFree")?;

    Ok(Counters::from([
        ("total", total),
        ("used", total.saturating_sub(free)),
        ("free", free),
        ("cached", lookup(meminfo, "SwapCached")?),
        ("page_in", lookup(vmstat, "pswpin")?),
        ("page_out", lookup(vmstat, "pswpout")?),
    ]))
}

/// returns a parsed value, zero if it is absent, or the error it could not be parsed with.
fn lookup(table: &Table, key: &str) -> Result<u64, RecordError> {
    match table.get(key) {
        Some(Ok(value)) => Ok(*value),
        Some(Err(error)) => Err(error.clone()),
        None => Ok(0),
    }
}

/// parses `/proc/meminfo`, whose lines look like `MemTotal:       16318220 kB`.
fn parse_meminfo(meminfo: impl BufRead) -> Result<Table, SourceError> {
    let mut table = Table::new();

    for line in meminfo.lines() {
        let line = line?;
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        let mut tokens = value.split_whitespace();
        let value = match (tokens.next(), tokens.next()) {
            (Some(value), Some("kB")) => parse_field(key, value).map(|kb| kb.saturating_mul(1024)),
            (Some(value), _) => parse_field(key, value),
            (None, _) => Err(RecordError::Truncated {
                found: 0,
                expected: 1,
            }),
        };
        table.insert(key.trim().to_owned(), value);
    }

    Ok(table)
}

/// parses `/proc/vmstat`, whose lines look like `pgpgin 2260432`.
fn parse_vmstat(vmstat: impl BufRead) -> Result<Table, SourceError> {
    let mut table = Table::new();

    for line in vmstat.lines() {
        let line = line?;
        if let Some((key, value)) = line.split_once(' ') {
            table.insert(key.to_owned(), parse_field(key, value.trim()));
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "\
MemTotal:        1000000 kB
MemFree:          200000 kB
MemAvailable:     600000 kB
Buffers:           50000 kB
Cached:           100000 kB
SwapCached:         1000 kB
Shmem:             10000 kB
SReclaimable:      20000 kB
SwapTotal:        500000 kB
SwapFree:         400000 kB
HugePages_Total:       0
";

    const VMSTAT: &str = "\
nr_free_pages 50000
pgpgin 2260432
pgpgout 1020
pswpin 3
pswpout 7
";

    fn sample(meminfo: &str, vmstat: Option<&str>) -> Sample {
        read(meminfo.as_bytes(), vmstat.map(str::as_bytes)).unwrap()
    }

    #[test]
    fn ram_used_excludes_available() {
        let sample = sample(MEMINFO, Some(VMSTAT));
        let ram = sample.get("ram").unwrap().as_ref().unwrap();
        assert_eq!(ram.get("total"), 1_024_000_000);
        assert_eq!(ram.get("used"), 409_600_000);
        assert_eq!(ram.get("cached"), 122_880_000);
        assert_eq!(ram.get("page_in"), 2_260_432);
        assert_eq!(ram.get("page_out"), 1020);
    }

    #[test]
    fn swap_used() {
        let sample = sample(MEMINFO, Some(VMSTAT));
        let swap = sample.get("swap").unwrap().as_ref().unwrap();
        assert_eq!(swap.get("used"), 102_400_000);
        assert_eq!(swap.get("cached"), 1_024_000);
        assert!(!swap.contains("buffers"));
        assert_eq!(swap.get("page_in"), 3);
        assert_eq!(swap.get("page_out"), 7);
    }

    #[test]
    fn without_available_estimate() {
        let meminfo = MEMINFO.replace("MemAvailable:     600000 kB\n", "");
        let sample = sample(&meminfo, None);
        let ram = sample.get("ram").unwrap().as_ref().unwrap();
        // 1000000 - 200000 - 50000 - 120000
        assert_eq!(ram.get("used"), 630_000 * 1024);
        assert_eq!(ram.get("page_in"), 0);
    }

    #[test]
    fn malformed_swap_does_not_spoil_ram() {
        let meminfo = MEMINFO.replace("SwapFree:         400000 kB", "SwapFree: lots kB");
        let sample = sample(&meminfo, Some(VMSTAT));
        assert!(sample.get("ram").unwrap().is_ok());
        assert!(sample.get("swap").unwrap().is_err());
    }

    #[test]
    fn unitless_values() {
        let table = parse_meminfo(MEMINFO.as_bytes()).unwrap();
        assert_eq!(lookup(&table, "HugePages_Total"), Ok(0));
        assert_eq!(lookup(&table, "Missing"), Ok(0));
    }
}
