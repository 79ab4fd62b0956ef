use {
    crate::sample::{Domain, EntityId},
    std::collections::{BTreeMap, BTreeSet},
};

/// tracks which entities exist in each domain.
///
/// an entity that disappears is kept for a grace period of consecutive polls, so that a single
/// transient read glitch does not make it flicker in and out of view.
#[derive(Debug)]
pub struct TopologyTracker {
    /// the number of consecutive polls an absent entity is retained for.
    grace: u32,
    /// known entities, and the number of consecutive polls each has been absent for.
    domains: BTreeMap<Domain, BTreeMap<EntityId, u32>>,
}

/// how a domain's entities changed across one poll.
#[derive(Debug, Default, PartialEq)]
pub struct Topology {
    /// entities seen for the first time, or for the first time since being purged.
    pub appeared: Vec<EntityId>,
    /// entities seen in this poll and the one before.
    pub present: Vec<EntityId>,
    /// entities absent from this poll, but still within their grace period.
    pub lingering: Vec<EntityId>,
    /// entities whose grace period has now been exceeded.
    pub purged: Vec<EntityId>,
}

// === impl TopologyTracker ===

impl TopologyTracker {
    pub fn new(grace: u32) -> Self {
        Self {
            grace,
            domains: BTreeMap::new(),
        }
    }

    /// records the entities seen by the latest read of `domain`.
    pub fn observe<'a>(
        &mut self,
        domain: Domain,
        seen: impl IntoIterator<Item = &'a EntityId>,
    ) -> Topology {
        let Self { grace, domains } = self;
        let known = domains.entry(domain).or_default();
        let seen = seen.into_iter().collect::<BTreeSet<_>>();
        let mut topology = Topology::default();

        for id in &seen {
            match known.insert((*id).clone(), 0) {
                Some(_) => topology.present.push((*id).clone()),
                None => topology.appeared.push((*id).clone()),
            }
        }

        known.retain(|id, missed| {
            if seen.contains(id) {
                return true;
            }
            *missed += 1;
            if *missed > *grace {
                topology.purged.push(id.clone());
                false
            } else {
                topology.lingering.push(id.clone());
                true
            }
        });

        topology
    }

    /// returns the number of consecutive polls a known entity has been absent for.
    ///
    /// this is `None` if `entity_id` is not known in `domain`, or has been purged.
    pub fn missed(&self, domain: Domain, entity_id: &str) -> Option<u32> {
        self.domains.get(&domain)?.get(entity_id).copied()
    }
}

// === impl Topology ===

impl Topology {
    /// returns true if nothing appeared or was purged.
    pub fn is_stable(&self) -> bool {
        self.appeared.is_empty() && self.purged.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(ids: &[&str]) -> Vec<EntityId> {
        ids.iter().copied().map(EntityId::from).collect()
    }

    #[test]
    fn first_sighting_appears() {
        let mut tracker = TopologyTracker::new(1);
        let topology = tracker.observe(Domain::Disk, &ids(&["sda", "sdb"]));
        assert_eq!(topology.appeared, ids(&["sda", "sdb"]));
        assert!(topology.present.is_empty());
        assert!(!topology.is_stable());
    }

    #[test]
    fn second_sighting_is_present() {
        let mut tracker = TopologyTracker::new(1);
        tracker.observe(Domain::Disk, &ids(&["sda"]));
        let topology = tracker.observe(Domain::Disk, &ids(&["sda"]));
        assert_eq!(topology.present, ids(&["sda"]));
        assert!(topology.is_stable());
    }

    #[test]
    fn absence_within_grace_lingers() {
        let mut tracker = TopologyTracker::new(1);
        tracker.observe(Domain::Disk, &ids(&["sda", "sdb"]));
        let topology = tracker.observe(Domain::Disk, &ids(&["sda"]));
        assert_eq!(topology.lingering, ids(&["sdb"]));
        assert!(topology.purged.is_empty());
        assert_eq!(tracker.missed(Domain::Disk, "sdb"), Some(1));
        assert_eq!(tracker.missed(Domain::Disk, "sda"), Some(0));
    }

    #[test]
    fn absence_beyond_grace_purges() {
        let mut tracker = TopologyTracker::new(1);
        tracker.observe(Domain::Disk, &ids(&["sda", "sdb"]));
        tracker.observe(Domain::Disk, &ids(&["sda"]));
        let topology = tracker.observe(Domain::Disk, &ids(&["sda"]));
        assert_eq!(topology.purged, ids(&["sdb"]));
        assert_eq!(tracker.missed(Domain::Disk, "sdb"), None);
    }

    #[test]
    fn reappearance_within_grace_is_present() {
        let mut tracker = TopologyTracker::new(2);
        tracker.observe(Domain::Network, &ids(&["eth0"]));
        tracker.observe(Domain::Network, &ids(&[]));
        tracker.observe(Domain::Network, &ids(&[]));
        let topology = tracker.observe(Domain::Network, &ids(&["eth0"]));
        assert_eq!(topology.present, ids(&["eth0"]));
        assert_eq!(tracker.missed(Domain::Network, "eth0"), Some(0));
    }

    #[test]
    fn reappearance_after_purge_appears_again() {
        let mut tracker = TopologyTracker::new(0);
        tracker.observe(Domain::Network, &ids(&["eth0"]));
        let topology = tracker.observe(Domain::Network, &ids(&[]));
        assert_eq!(topology.purged, ids(&["eth0"]));
        let topology = tracker.observe(Domain::Network, &ids(&["eth0"]));
        assert_eq!(topology.appeared, ids(&["eth0"]));
    }

    #[test]
    fn domains_are_tracked_separately() {
        let mut tracker = TopologyTracker::new(1);
        tracker.observe(Domain::Network, &ids(&["eth0"]));
        let topology = tracker.observe(Domain::Disk, &ids(&["eth0"]));
        assert_eq!(topology.appeared, ids(&["eth0"]));
    }
}
