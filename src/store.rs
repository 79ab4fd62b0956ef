use {
    crate::sample::{CounterSnapshot, Domain, EntityId},
    std::collections::BTreeMap,
};

/// holds the previous snapshot of every entity, per domain.
///
/// each domain's state is kept in its own [`DomainStore`]; domains never share mutable state.
#[derive(Debug, Default)]
pub struct SampleStore {
    domains: BTreeMap<Domain, DomainStore>,
}

/// the entities of one domain.
#[derive(Debug, Default)]
pub struct DomainStore {
    entities: BTreeMap<EntityId, EntityState>,
}

/// the sampling state of one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityState {
    pub entity_id: EntityId,
    /// the last snapshot committed for this entity.
    pub last_snapshot: Option<CounterSnapshot>,
}

// === impl SampleStore ===

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// returns the last committed snapshot of an entity, if there is one.
    pub fn get_previous(&self, domain: Domain, entity_id: &str) -> Option<&CounterSnapshot> {
        self.domains
            .get(&domain)?
            .entities
            .get(entity_id)?
            .last_snapshot
            .as_ref()
    }

    /// records `snapshot` as the latest observation of an entity.
    ///
    /// this always overwrites the previous snapshot, creating the entity's state if needed.
    pub fn commit(&mut self, domain: Domain, snapshot: CounterSnapshot) {
        self.domain_mut(domain).commit(snapshot);
    }

    /// commits a full poll cycle's snapshots for `domain` at once.
    pub fn commit_all(
        &mut self,
        domain: Domain,
        snapshots: impl IntoIterator<Item = CounterSnapshot>,
    ) {
        let store = self.domain_mut(domain);
        for snapshot in snapshots {
            store.commit(snapshot);
        }
    }

    /// forgets an entity entirely.
    pub fn purge(&mut self, domain: Domain, entity_id: &str) -> Option<EntityState> {
        self.domains.get_mut(&domain)?.entities.remove(entity_id)
    }

    /// returns the ids of every entity known in `domain`.
    pub fn entities(&self, domain: Domain) -> impl Iterator<Item = &EntityId> {
        self.domains
            .get(&domain)
            .into_iter()
            .flat_map(|store| store.entities.keys())
    }

    fn domain_mut(&mut self, domain: Domain) -> &mut DomainStore {
        self.domains.entry(domain).or_default()
    }
}

// === impl DomainStore ===

impl DomainStore {
    fn commit(&mut self, snapshot: CounterSnapshot) {
        let state = self
            .entities
            .entry(snapshot.entity_id.clone())
            .or_insert_with(|| EntityState::new(snapshot.entity_id.clone()));
        state.last_snapshot = Some(snapshot);
    }
}

// === impl EntityState ===

impl EntityState {
    fn new(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            last_snapshot: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::sample::Counters};

    fn snapshot(id: &str, timestamp: f64, bytes: u64) -> CounterSnapshot {
        CounterSnapshot::new(id.into(), timestamp, Counters::from([("rx_bytes", bytes)]))
    }

    #[test]
    fn empty_store_has_no_previous() {
        let store = SampleStore::new();
        assert_eq!(store.get_previous(Domain::Network, "eth0"), None);
    }

    #[test]
    fn commit_overwrites() {
        let mut store = SampleStore::new();
        store.commit(Domain::Network, snapshot("eth0", 1.0, 3000));
        store.commit(Domain::Network, snapshot("eth0", 2.0, 2000));

        let prev = store.get_previous(Domain::Network, "eth0").unwrap();
        assert_eq!(prev.timestamp, 2.0);
        assert_eq!(prev.counters.get("rx_bytes"), 2000);
    }

    #[test]
    fn domains_are_isolated() {
        let mut store = SampleStore::new();
        store.commit(Domain::Network, snapshot("eth0", 1.0, 10));
        assert!(store.get_previous(Domain::Disk, "eth0").is_none());
        assert_eq!(store.entities(Domain::Disk).count(), 0);
        assert_eq!(store.entities(Domain::Network).count(), 1);
    }

    #[test]
    fn commit_creates_state_lazily() {
        let mut store = SampleStore::new();
        assert!(store.purge(Domain::Network, "eth0").is_none());
        store.commit(Domain::Network, snapshot("eth0", 1.0, 10));
        let state = store.purge(Domain::Network, "eth0").unwrap();
        assert_eq!(state.entity_id, EntityId::from("eth0"));
        assert_eq!(state.last_snapshot.as_ref().map(|s| s.timestamp), Some(1.0));
        assert_eq!(store.entities(Domain::Network).count(), 0);
    }

    #[test]
    fn purge_forgets() {
        let mut store = SampleStore::new();
        store.commit_all(
            Domain::Network,
            [snapshot("eth0", 1.0, 10), snapshot("wlan0", 1.0, 10)],
        );
        assert!(store.purge(Domain::Network, "eth0").is_some());
        assert!(store.get_previous(Domain::Network, "eth0").is_none());
        assert!(store.get_previous(Domain::Network, "wlan0").is_some());
    }
}
