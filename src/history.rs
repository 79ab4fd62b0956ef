use {
    crate::{
        poller::{DomainReport, EntityReport},
        sample::{Domain, EntityId},
    },
    std::collections::{BTreeMap, VecDeque},
};

/// a bounded record of recent values, oldest first.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryBuffer {
    capacity: usize,
    values: VecDeque<f64>,
}

/// the histories shown by the dashboard.
#[derive(Debug)]
pub struct HistoryBook {
    capacity: usize,
    /// each entity's metrics.
    metrics: BTreeMap<(Domain, EntityId, &'static str), HistoryBuffer>,
    /// each domain's headline graph.
    graphs: BTreeMap<Domain, HistoryBuffer>,
}

/// the series a domain's headline graph follows.
enum Series {
    /// one metric of one entity.
    Entity {
        entity: &'static str,
        metric: &'static str,
    },
    /// the sum of some metrics, across every fresh entity.
    Sum { names: &'static [&'static str] },
    /// the sum of some metrics, across every fresh whole disk.
    ///
    /// partitions and stacked devices are left out, their traffic is already counted by the
    /// disks beneath them.
    Disks { names: &'static [&'static str] },
}

// === impl HistoryBuffer ===

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    /// records a value, evicting the oldest if the buffer is full.
    pub fn push(&mut self, value: f64) {
        let Self { capacity, values } = self;

        if *capacity == 0 {
            return;
        }
        while values.len() >= *capacity {
            values.pop_front();
        }
        values.push_back(value);
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// the largest recorded value, or zero.
    pub fn max(&self) -> f64 {
        self.values().fold(0.0, f64::max)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// === impl HistoryBook ===

impl HistoryBook {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            metrics: BTreeMap::new(),
            graphs: BTreeMap::new(),
        }
    }

    /// records a domain's latest report.
    ///
    /// stale results are not recorded again, and the histories of entities that are no longer
    /// reported are forgotten.
    pub fn record(&mut self, domain: Domain, report: &DomainReport) {
        let Self {
            capacity,
            metrics,
            graphs,
        } = self;

        metrics.retain(|(d, id, _), _| *d != domain || report.entities.contains_key(id));

        if !report.available {
            return;
        }

        let fresh = report
            .entities
            .iter()
            .filter(|(_, entity)| !entity.stale)
            .collect::<BTreeMap<_, _>>();

        for (&id, entity) in &fresh {
            for result in &entity.results {
                metrics
                    .entry((domain, id.clone(), result.metric_name))
                    .or_insert_with(|| HistoryBuffer::new(*capacity))
                    .push(result.value);
            }
        }

        let value = match Series::of(domain) {
            Series::Entity { entity, metric } => fresh
                .get(&EntityId::from(entity))
                .and_then(|fresh| fresh.results.iter().find(|r| r.metric_name == metric))
                .map(|result| result.value),
            // nothing fresh to sum: every entity is carried over.
            _ if fresh.is_empty() && !report.entities.is_empty() => None,
            Series::Sum { names } => Some(sum(fresh.values().copied(), names)),
            Series::Disks { names } => {
                let disks = fresh
                    .iter()
                    .filter(|(id, _)| !is_nested(id.as_str(), report.entities.keys()))
                    .map(|(_, entity)| *entity);
                Some(sum(disks, names))
            }
        };

        if let Some(value) = value {
            graphs
                .entry(domain)
                .or_insert_with(|| HistoryBuffer::new(*capacity))
                .push(value);
        }
    }

    /// returns the history of one entity's metric.
    pub fn get(
        &self,
        domain: Domain,
        entity_id: &str,
        metric: &'static str,
    ) -> Option<&HistoryBuffer> {
        self.metrics.get(&(domain, EntityId::from(entity_id), metric))
    }

    /// returns a domain's headline graph.
    pub fn graph(&self, domain: Domain) -> Option<&HistoryBuffer> {
        self.graphs.get(&domain)
    }
}

// === impl Series ===

impl Series {
    fn of(domain: Domain) -> Self {
        match domain {
            Domain::Cpu => Self::Entity {
                entity: "cpu",
                metric: "usage",
            },
            Domain::Memory => Self::Entity {
                entity: "ram",
                metric: "used",
            },
            Domain::Disk => Self::Disks {
                names: &["read", "write"],
            },
            Domain::Network => Self::Sum {
                names: &["down", "up"],
            },
        }
    }
}

/// adds up the named metrics of some entities.
fn sum<'a>(entities: impl Iterator<Item = &'a EntityReport>, names: &[&str]) -> f64 {
    entities
        .flat_map(|entity| &entity.results)
        .filter(|result| names.contains(&result.metric_name))
        .map(|result| result.value)
        .sum()
}

/// returns true if `device` is a partition of one of `devices`, or is stacked on other disks.
///
/// partitions extend their disk's name with a number: `sda1`, or `nvme0n1p1` when the disk's
/// name already ends in a digit.
fn is_nested<'a>(device: &str, devices: impl IntoIterator<Item = &'a EntityId>) -> bool {
    const STACKED: [&str; 2] = ["dm-", "md"];

    if STACKED.iter().any(|prefix| device.starts_with(prefix)) {
        return true;
    }

    devices.into_iter().any(|disk| {
        let disk = disk.as_str();
        let Some(rest) = device.strip_prefix(disk) else {
            return false;
        };
        let number = if disk.ends_with(|c: char| c.is_ascii_digit()) {
            rest.strip_prefix('p')
        } else {
            Some(rest)
        };
        number.is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
    })
}
