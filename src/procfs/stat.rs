use {
    super::parse_field,
    crate::{
        sample::{Counters, EntityId},
        source::{RecordError, Sample, Schema, SourceError},
    },
    std::{
        fmt::{self, Display},
        io::BufRead,
        ops::Not,
        str::FromStr,
    },
};

pub use self::{cpu_time::CpuTime, user_hz::UserHz};

mod cpu_time;
mod user_hz;


/// an entry in the `/proc/stat` kernel statistics table.
///
/// see `proc_stat(5)` for more information.
#[derive(Debug, Eq, PartialEq)]
pub enum Entry {
    /// the amount of time that the system ("cpu" line) spent in various states.
    AllCpu {
        time: CpuTime,
    },
    /// the amount of time that a specific cpu ("cpuN" line) spent in various states.
    Cpu {
        id: CpuId,
        time: CpuTime,
    },
    /// the number of pages the system paged in and the number that were paged out (from disk).
    Page,
    /// the number of swap pages that have been brought in and out.
    Swap,
    /// this line shows counts of interrupts serviced since boot time.
    Intr,
    DiskIo,
    /// the number of context switches that the system underwent.
    Ctxt,
    Btime,
    /// the number of forks since boot.
    Processes,
    /// the number of processes in runnable state.  (linux 2.5.45 onward.)
    ProcsRunning,
    /// the number of processes blocked waiting for i/o to complete.
    ProcsBlocked,
    /// this line shows the number of softirq for all cpus.
    SoftIrq,
}

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct CpuId(u16);

enum Either<'a> {
    Cpu(&'a str),
    Entry(Entry),
}

/// the counters provided for each cpu.
pub fn schema() -> Schema {
    CpuTime::NAMES
        .into_iter()
        .chain([CpuTime::TOTAL, CpuTime::IDLE_ALL])
        .collect()
}

/// reads a sample of every cpu, and the system as a whole.
///
/// a malformed `cpu` line is reported as a bad record for that cpu. lines of other kinds are
/// not entities, and are skipped if they cannot be parsed.
pub fn read(stats: impl BufRead) -> Result<Sample, SourceError> {
    let mut sample = Sample::new();

    for line in stats.lines() {
        let line = line?;
        let Some(kind) = line.split_whitespace().next() else {
            continue;
        };

        match line.parse::<Entry>() {
            Ok(Entry::AllCpu { time }) => {
                sample.insert(EntityId::from("cpu"), Ok(time.into()));
            }
            Ok(Entry::Cpu { id, time }) => {
                sample.insert(EntityId::from(id.to_string()), Ok(time.into()));
            }
            Ok(_) => {}
            Err(error) if kind.starts_with("cpu") => {
                sample.insert(EntityId::from(kind), Err(error));
            }
            Err(error) => log::debug!("skipping /proc/stat line: {error}"),
        }
    }

    Ok(sample)
}

// === impl Entry ===

impl FromStr for Entry {
    type Err = RecordError;
    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let tokens = entry
            .split(' ')
            .filter(|t| t.is_empty().not())
            .collect::<Vec<_>>();
        let [kind, tokens @ ..] = tokens.as_slice() else {
            return Err(RecordError::Truncated {
                found: 0,
                expected: 1,
            });
        };

        let id = match Self::parse_entry_kind(kind) {
            Either::Cpu(cpu) => Self::parse_cpu_id(cpu)?,
            Either::Entry(entry) => return Ok(entry),
        };

        let time = tokens
            .iter()
            .zip(CpuTime::NAMES.into_iter().chain(std::iter::repeat("extra")))
            .map(|(token, name)| token.parse::<UserHz>().map_err(|error| (name, error)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|(name, error)| RecordError::Field {
                name: name.to_owned(),
                error,
            })
            .and_then(CpuTime::try_from)?;

        Ok(if let Some(id) = id {
            Self::Cpu { id, time }
        } else {
            Self::AllCpu { time }
        })
    }
}

impl Entry {
    fn parse_entry_kind(kind: &str) -> Either {
        use Entry::*;

        match kind {
            "page" => Either::Entry(Page),
            "swap" => Either::Entry(Swap),
            "intr" => Either::Entry(Intr),
            "disk_io" => Either::Entry(DiskIo),
            "ctxt" => Either::Entry(Ctxt),
            "btime" => Either::Entry(Btime),
            "processes" => Either::Entry(Processes),
            "procs_running" => Either::Entry(ProcsRunning),
            "procs_blocked" => Either::Entry(ProcsBlocked),
            "softirq" => Either::Entry(SoftIrq),
            cpu => Either::Cpu(cpu),
        }
    }

    fn parse_cpu_id(token: &str) -> Result<Option<CpuId>, RecordError> {
        use RecordError::Unrecognized;

        // strip the token of its "cpu" prefix.
        let suffix = token.strip_prefix("cpu").ok_or_else(|| Unrecognized {
            kind: token.to_owned(),
        })?;

        // if there is no suffix, return `None`.
        if suffix.is_empty() {
            return Ok(None);
        }

        // parse the id into an integer.
        parse_field("cpu id", suffix)
            .and_then(|id| {
                u16::try_from(id).map_err(|_| Unrecognized {
                    kind: token.to_owned(),
                })
            })
            .map(CpuId)
            .map(Some)
    }
}

// === impl CpuId ===

impl CpuId {
    pub fn as_u16(&self) -> u16 {
        let Self(id) = self;
        *id
    }
}

impl Display for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("cpu{}", self.as_u16()))
    }
}

// === impl CpuTime ===

impl From<CpuTime> for Counters {
    fn from(time: CpuTime) -> Self {
        let total = time.total();
        let idle = time.idle_all();
        let times: [UserHz; 10] = time.into();

        CpuTime::NAMES
            .into_iter()
            .zip(times.map(u64::from))
            .chain([(CpuTime::TOTAL, total.into()), (CpuTime::IDLE_ALL, idle.into())])
            .collect()
    }
}
