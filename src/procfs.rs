//! counters read from the linux `/proc` filesystem.

use {
    crate::{
        host::Host,
        sample::Domain,
        source::{CounterSource, RecordError, Sample, Schema, SourceError},
    },
    std::{
        fs::File,
        io::{self, BufRead, BufReader},
        path::{Path, PathBuf},
    },
};

/// kernel statistics facilities.
///
/// this file provides tools to interact with `/proc/stat`.
mod stat;

/// memory and paging statistics, from `/proc/meminfo` and `/proc/vmstat`.
mod meminfo;

/// block device statistics, from `/proc/diskstats`.
mod diskstats;

/// network interface statistics, from `/proc/net/dev`.
mod net_dev;

/// uptime, load and the machine's name, from `/proc`.
mod host;


/// counters backed by `/proc`.
pub struct ProcFs {
    /// the directory `/proc` is mounted at.
    root: PathBuf,
    /// the columns of `/proc/net/dev`, once negotiated.
    net_columns: Option<net_dev::Columns>,
}

// === impl ProcFs ===

impl Default for ProcFs {
    fn default() -> Self {
        Self::new(Self::ROOT)
    }
}

impl ProcFs {
    const ROOT: &str = "/proc";
    const STAT: &str = "stat";
    const MEMINFO: &str = "meminfo";
    const VMSTAT: &str = "vmstat";
    const DISKSTATS: &str = "diskstats";
    const NET_DEV: &str = "net/dev";
    const UPTIME: &str = "uptime";
    const LOADAVG: &str = "loadavg";
    const CPUINFO: &str = "cpuinfo";
    const HOSTNAME: &str = "sys/kernel/hostname";
    const OSRELEASE: &str = "sys/kernel/osrelease";

    /// returns a source reading from a `/proc` filesystem mounted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_owned(),
            net_columns: None,
        }
    }

    /// returns a reader.
    fn open(&self, name: &str) -> io::Result<impl BufRead> {
        File::open(self.root.join(name)).map(BufReader::new)
    }

    /// returns a reader, or `None` if the file does not exist.
    fn open_optional(&self, name: &str) -> io::Result<Option<impl BufRead>> {
        match self.open(name) {
            Ok(reader) => Ok(Some(reader)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error),
        }
    }
}

impl CounterSource for ProcFs {
    fn schema(&mut self, domain: Domain) -> Result<Schema, SourceError> {
        match domain {
            Domain::Cpu => Ok(stat::schema()),
            Domain::Memory => Ok(meminfo::schema()),
            Domain::Disk => Ok(diskstats::schema()),
            Domain::Network => {
                let columns = net_dev::Columns::read(self.open(Self::NET_DEV)?)?;
                let schema = columns.schema();
                self.net_columns = Some(columns);
                Ok(schema)
            }
        }
    }

    fn read(&self, domain: Domain) -> Result<Sample, SourceError> {
        match domain {
            Domain::Cpu => stat::read(self.open(Self::STAT)?),
            Domain::Memory => {
                let meminfo = self.open(Self::MEMINFO)?;
                let vmstat = self.open_optional(Self::VMSTAT)?;
                meminfo::read(meminfo, vmstat)
            }
            Domain::Disk => diskstats::read(self.open(Self::DISKSTATS)?),
            Domain::Network => {
                let columns = self.net_columns.as_ref().ok_or(SourceError::Layout {
                    path: "/proc/net/dev",
                    reason: "columns were not negotiated".to_owned(),
                })?;
                columns.read_sample(self.open(Self::NET_DEV)?)
            }
        }
    }

    fn host(&self) -> Result<Host, SourceError> {
        host::read(host::Files {
            uptime: self.open_optional(Self::UPTIME)?,
            loadavg: self.open_optional(Self::LOADAVG)?,
            cpuinfo: self.open_optional(Self::CPUINFO)?,
            hostname: self.open_optional(Self::HOSTNAME)?,
            osrelease: self.open_optional(Self::OSRELEASE)?,
        })
    }
}

/// parses a field as an unsigned counter.
fn parse_field(name: &str, value: &str) -> Result<u64, RecordError> {
    value
        .parse::<u64>()
        .map_err(|error| RecordError::Field {
            name: name.to_owned(),
            error,
        })
}
