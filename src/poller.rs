use {
    crate::{
        config::Config,
        procfs::ProcFs,
        rate::{self, MetricSpec, RateResult},
        sample::{CounterSnapshot, Domain, EntityId},
        source::{Clock, CounterSource, Sample, SourceError, SystemClock},
        store::SampleStore,
        topology::TopologyTracker,
    },
    std::{collections::BTreeMap, time::Duration},
};


/// polls every domain of a counter source, and publishes the rates it observes.
pub struct Poller<C = SystemClock, S = ProcFs> {
    /// the clock being used to measure time.
    clock: C,
    /// the underlying source of counters.
    source: S,
    /// the previous snapshot of every entity.
    store: SampleStore,
    /// the entities known in each domain.
    topology: TopologyTracker,
    /// the polling state of each domain.
    domains: BTreeMap<Domain, DomainState>,
    settings: Settings,
}

/// the stage of a domain's poll cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Idle,
    Reading,
    Calculating,
    Published,
}

/// the most recent results for a domain.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DomainReport {
    /// each entity's results.
    pub entities: BTreeMap<EntityId, EntityReport>,
    /// the number of consecutive failed reads.
    pub failures: u32,
    /// false once `failures` has reached the configured threshold.
    pub available: bool,
    /// when the results were last computed.
    pub as_of: Option<f64>,
}

/// the most recent results for one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityReport {
    pub results: Vec<RateResult>,
    /// true if these results were carried over from an earlier poll.
    pub stale: bool,
}

struct DomainState {
    phase: Phase,
    capability: Capability,
    report: Option<DomainReport>,
}

/// the metrics a domain can compute, once its source has declared a schema.
enum Capability {
    Unnegotiated,
    Negotiated(Vec<MetricSpec>),
}

struct Settings {
    interval: Duration,
    failure_threshold: u32,
    read_timeout: f64,
    default_precision: u8,
    precision: BTreeMap<String, u8>,
}

/// a successful read of a domain.
struct Reading {
    sample: Sample,
    timestamp: f64,
}

// === impl Poller ===

impl<C, S> Poller<C, S>
where
    C: Clock,
    S: CounterSource,
{
    /// creates a new [`Poller`].
    pub fn new(clock: C, source: S, config: &Config) -> Self {
        let domains = Domain::ALL
            .into_iter()
            .map(|domain| (domain, DomainState::new()))
            .collect();

        Self {
            clock,
            source,
            store: SampleStore::new(),
            topology: TopologyTracker::new(config.grace),
            domains,
            settings: Settings::new(config),
        }
    }

    /// returns the underlying counter source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// the time between ticks.
    pub fn interval(&self) -> Duration {
        self.settings.interval
    }

    /// returns the most recently published results for `domain`.
    ///
    /// this is `None` until the domain has been polled once.
    pub fn latest(&self, domain: Domain) -> Option<&DomainReport> {
        self.domains.get(&domain)?.report.as_ref()
    }

    /// returns the stage of `domain`'s poll cycle.
    pub fn phase(&self, domain: Domain) -> Phase {
        self.domains
            .get(&domain)
            .map(|state| state.phase)
            .unwrap_or(Phase::Idle)
    }

    /// polls every domain once, in order.
    ///
    /// this never fails: a domain that cannot be read republishes its previous results.
    pub fn tick(&mut self) {
        for domain in Domain::ALL {
            self.poll(domain);
        }
    }

    fn poll(&mut self, domain: Domain) {
        self.transition(domain, Phase::Reading);

        match self.read(domain) {
            Ok(reading) => {
                self.transition(domain, Phase::Calculating);
                self.calculate(domain, reading);
            }
            Err(error) => self.fail(domain, error),
        }

        self.transition(domain, Phase::Published);
        self.transition(domain, Phase::Idle);
    }

    /// reads `domain`, negotiating its schema first if needed.
    ///
    /// the read timeout is checked once the read has returned: a read that took too long is
    /// discarded and counted as a failure, but a read that never returns is not interrupted and
    /// blocks the tick.
    fn read(&mut self, domain: Domain) -> Result<Reading, SourceError> {
        self.negotiate(domain)?;

        let Self {
            clock,
            source,
            settings,
            ..
        } = self;

        let start = clock.now();
        let sample = source.read(domain)?;
        let elapsed = clock.now() - start;

        if elapsed > settings.read_timeout {
            return Err(SourceError::Timeout {
                elapsed,
                limit: settings.read_timeout,
            });
        }

        Ok(Reading {
            sample,
            timestamp: start,
        })
    }

    /// asks the source which counters it provides, and keeps the metrics it can compute.
    fn negotiate(&mut self, domain: Domain) -> Result<(), SourceError> {
        let Self {
            source, domains, ..
        } = self;
        let state = domains.entry(domain).or_insert_with(DomainState::new);
        if let Capability::Negotiated(_) = state.capability {
            return Ok(());
        }

        let schema = source.schema(domain)?;
        let metrics = rate::metrics(domain)
            .iter()
            .filter(|spec| {
                let missing = spec
                    .formula
                    .counters()
                    .into_iter()
                    .filter(|counter| !schema.declares(counter))
                    .collect::<Vec<_>>();
                if !missing.is_empty() {
                    log::warn!(
                        "{domain} source does not provide {missing:?}; {} will not be shown",
                        spec.name
                    );
                }
                missing.is_empty()
            })
            .copied()
            .collect::<Vec<_>>();

        log::debug!("{domain} provides {} counters, {} metrics", schema.len(), metrics.len());
        state.capability = Capability::Negotiated(metrics);
        Ok(())
    }

    /// computes and publishes results for a successful read.
    fn calculate(&mut self, domain: Domain, Reading { sample, timestamp }: Reading) {
        let Self {
            store,
            topology,
            domains,
            settings,
            ..
        } = self;
        let state = domains.entry(domain).or_insert_with(DomainState::new);
        let metrics: &[MetricSpec] = match &state.capability {
            Capability::Negotiated(metrics) => metrics.as_slice(),
            Capability::Unnegotiated => &[],
        };
        let previous = state.report.take().unwrap_or_default();

        let changes = topology.observe(domain, sample.keys());
        if !changes.is_stable() {
            log::debug!(
                "{domain} entities changed: {:?} appeared, {:?} gone",
                changes.appeared,
                changes.purged
            );
        }

        let mut entities = BTreeMap::new();
        let mut snapshots = Vec::with_capacity(sample.len());

        for (id, record) in sample {
            let counters = match record {
                Ok(counters) => counters,
                Err(error) => {
                    log::warn!("skipping malformed {domain} record for {id}: {error}");
                    if let Some(report) = previous.entities.get(&id) {
                        entities.insert(id, report.carried());
                    }
                    continue;
                }
            };

            let snapshot = CounterSnapshot::new(id.clone(), timestamp, counters);
            let results = match store.get_previous(domain, id.as_str()) {
                Some(prev) => {
                    Self::note_anomalies(domain, metrics, prev, &snapshot);
                    metrics
                        .iter()
                        .map(|spec| spec.compute(prev, &snapshot))
                        .map(|result| settings.round(result))
                        .collect()
                }
                // first observation: there is nothing to compare against yet.
                None => metrics.iter().map(|spec| spec.neutral(id.clone())).collect(),
            };

            entities.insert(
                id,
                EntityReport {
                    results,
                    stale: false,
                },
            );
            snapshots.push(snapshot);
        }

        for id in changes.lingering {
            if let Some(missed) = topology.missed(domain, id.as_str()) {
                log::trace!("{domain} entity {id} has been absent for {missed} polls");
            }
            if let Some(report) = previous.entities.get(&id) {
                entities.insert(id, report.carried());
            }
        }

        // the store keeps a snapshot only for entities the tracker still knows.
        let forgotten = store
            .entities(domain)
            .filter(|id| topology.missed(domain, id.as_str()).is_none())
            .cloned()
            .collect::<Vec<_>>();
        for id in forgotten {
            store.purge(domain, id.as_str());
        }

        store.commit_all(domain, snapshots);
        state.report = Some(DomainReport {
            entities,
            failures: 0,
            available: true,
            as_of: Some(timestamp),
        });
    }

    /// republishes `domain`'s previous results after a failed read.
    fn fail(&mut self, domain: Domain, error: SourceError) {
        let threshold = self.settings.failure_threshold;
        let state = self.domains.entry(domain).or_insert_with(DomainState::new);
        let report = state.report.get_or_insert_with(DomainReport::default);

        report.failures = report.failures.saturating_add(1);
        for entity in report.entities.values_mut() {
            entity.stale = true;
        }
        log::warn!(
            "could not read {domain} ({} consecutive failures): {error}",
            report.failures
        );

        let available = report.failures < threshold;
        if report.available && !available {
            log::warn!("{domain} is unavailable");
        }
        report.available = available;
    }

    fn note_anomalies(
        domain: Domain,
        metrics: &[MetricSpec],
        prev: &CounterSnapshot,
        curr: &CounterSnapshot,
    ) {
        let id = &curr.entity_id;

        if curr.timestamp <= prev.timestamp {
            log::debug!(
                "{domain} entity {id}: clock went from {} to {}",
                prev.timestamp,
                curr.timestamp
            );
        }

        for name in discontinuities(metrics, prev, curr) {
            let (a, b) = (prev.counters.get(name), curr.counters.get(name));
            log::debug!("{domain} entity {id}: {name} went from {a} to {b}, resynchronizing");
        }
    }

    fn transition(&mut self, domain: Domain, phase: Phase) {
        if let Some(state) = self.domains.get_mut(&domain) {
            log::trace!("{domain}: {:?} -> {phase:?}", state.phase);
            state.phase = phase;
        }
    }
}

/// returns the cumulative counters of `metrics` that decreased between two snapshots.
///
/// gauges rise and fall freely, and are not checked.
fn discontinuities(
    metrics: &[MetricSpec],
    prev: &CounterSnapshot,
    curr: &CounterSnapshot,
) -> Vec<&'static str> {
    let mut names = metrics
        .iter()
        .filter(|spec| spec.formula.is_cumulative())
        .flat_map(|spec| spec.formula.counters())
        .filter(|name| curr.counters.get(name) < prev.counters.get(name))
        .collect::<Vec<_>>();
    names.sort_unstable();
    names.dedup();
    names
}

// === impl DomainState ===

impl DomainState {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            capability: Capability::Unnegotiated,
            report: None,
        }
    }
}

// === impl DomainReport ===

impl DomainReport {
    /// returns the named metric of an entity.
    pub fn get(&self, entity_id: &str, metric: &str) -> Option<&RateResult> {
        self.entities
            .get(entity_id)?
            .results
            .iter()
            .find(|result| result.metric_name == metric)
    }
}

// === impl EntityReport ===

impl EntityReport {
    /// these results, carried over to a later poll.
    fn carried(&self) -> Self {
        Self {
            results: self.results.clone(),
            stale: true,
        }
    }
}

// === impl Settings ===

impl Settings {
    fn new(config: &Config) -> Self {
        Self {
            interval: Duration::try_from_secs_f64(config.interval).unwrap_or(Duration::MAX),
            failure_threshold: config.failure_threshold,
            read_timeout: config.read_timeout,
            default_precision: config.default_precision,
            precision: config.precision.clone(),
        }
    }

    /// rounds a result to its metric's configured precision.
    fn round(&self, result: RateResult) -> RateResult {
        let decimals = self
            .precision
            .get(result.metric_name)
            .copied()
            .unwrap_or(self.default_precision);
        result.round(decimals)
    }
}
