use {
    super::parse_field,
    crate::{
        sample::{Counters, EntityId},
        source::{Record, RecordError, Sample, Schema, SourceError},
    },
    std::io::BufRead,
};

/// the column layout of `/proc/net/dev`.
///
/// the layout is read from the file's header once, and then fixed for the lifetime of the
/// process.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Columns {
    /// counter names, in column order: each receive column, then each transmit column.
    names: Vec<String>,
}

/// the loopback interface, which is not shown.
const LOOPBACK: &str = "lo";

const PATH: &str = "/proc/net/dev";

// === impl Columns ===

impl Columns {
    /// reads the column layout from the file's header.
    ///
    /// the second line of the header looks like this:
    ///
    /// ```text
    ///  face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets ...
    /// ```
    pub fn read(net_dev: impl BufRead) -> Result<Self, SourceError> {
        let header = net_dev
            .lines()
            .nth(1)
            .transpose()?
            .ok_or_else(|| Self::layout("the header is missing"))?;

        let groups = header.split('|').collect::<Vec<_>>();
        let [_, rx, tx] = groups[..] else {
            return Err(Self::layout("expected receive and transmit column groups"));
        };

        let names = rx
            .split_whitespace()
            .map(|column| format!("rx_{column}"))
            .chain(tx.split_whitespace().map(|column| format!("tx_{column}")))
            .collect::<Vec<_>>();

        if names.is_empty() {
            return Err(Self::layout("no columns were declared"));
        }

        Ok(Self { names })
    }

    pub fn schema(&self) -> Schema {
        self.names.iter().map(String::as_str).collect()
    }

    /// reads a sample of every interface except the loopback interface.
    pub fn read_sample(&self, net_dev: impl BufRead) -> Result<Sample, SourceError> {
        let mut sample = Sample::new();

        // skip the two header lines.
        for line in net_dev.lines().skip(2) {
            let line = line?;
            let Some((interface, values)) = line.split_once(':') else {
                continue;
            };

            let interface = interface.trim();
            if interface == LOOPBACK {
                continue;
            }

            sample.insert(EntityId::from(interface), self.parse(values));
        }

        Ok(sample)
    }

    fn parse(&self, values: &str) -> Record {
        let Self { names } = self;

        let values = values.split_whitespace().collect::<Vec<_>>();
        if values.len() < names.len() {
            return Err(RecordError::Truncated {
                found: values.len(),
                expected: names.len(),
            });
        }

        names
            .iter()
            .zip(values)
            .map(|(name, value)| parse_field(name, value).map(|value| (name.as_str(), value)))
            .collect::<Result<Counters, _>>()
    }

    fn layout(reason: &str) -> SourceError {
        SourceError::Layout {
            path: PATH,
            reason: reason.to_owned(),
        }
    }
}
