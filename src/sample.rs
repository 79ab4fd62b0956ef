use std::{
    borrow::Borrow,
    collections::BTreeMap,
    fmt::{self, Display},
};

/// a family of measured entities, polled together.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Domain {
    Cpu,
    Memory,
    Disk,
    Network,
}

/// an addressable measurement subject: a cpu core, a block device, a network interface.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct EntityId(String);

/// a record of named, cumulative, unsigned counters.
///
/// a name that is absent reads as zero.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Counters(BTreeMap<String, u64>);

/// the counters of one entity, captured at a moment in time.
#[derive(Clone, Debug, PartialEq)]
pub struct CounterSnapshot {
    pub entity_id: EntityId,
    /// monotonic seconds.
    pub timestamp: f64,
    pub counters: Counters,
}

// === impl Domain ===

impl Domain {
    /// every domain, in polling order.
    pub const ALL: [Domain; 4] = [Domain::Cpu, Domain::Memory, Domain::Disk, Domain::Network];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Disk => "disk",
            Self::Network => "network",
        }
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// === impl EntityId ===

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        let Self(id) = self;
        id
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

// === impl Counters ===

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// returns the value of the named counter, or zero if it is absent.
    pub fn get(&self, name: &str) -> u64 {
        let Self(counters) = self;
        counters.get(name).copied().unwrap_or(0)
    }

    pub fn contains(&self, name: &str) -> bool {
        let Self(counters) = self;
        counters.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: u64) -> Option<u64> {
        let Self(counters) = self;
        counters.insert(name.into(), value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        let Self(counters) = self;
        counters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        let Self(counters) = self;
        counters.len()
    }

    pub fn is_empty(&self) -> bool {
        let Self(counters) = self;
        counters.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for Counters {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<K: Into<String>, const N: usize> From<[(K, u64); N]> for Counters {
    fn from(counters: [(K, u64); N]) -> Self {
        counters.into_iter().collect()
    }
}

// === impl CounterSnapshot ===

impl CounterSnapshot {
    pub fn new(entity_id: EntityId, timestamp: f64, counters: Counters) -> Self {
        Self {
            entity_id,
            timestamp,
            counters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_counters_read_as_zero() {
        let counters = Counters::from([("rx_bytes", 10)]);
        assert_eq!(counters.get("rx_bytes"), 10);
        assert_eq!(counters.get("tx_bytes"), 0);
        assert!(!counters.contains("tx_bytes"));
    }

    #[test]
    fn domains_poll_in_order() {
        let names = Domain::ALL.iter().map(Domain::name).collect::<Vec<_>>();
        assert_eq!(names, ["cpu", "memory", "disk", "network"]);
    }
}
