use {
    crate::{
        host::Host,
        sample::{Counters, Domain, EntityId},
    },
    std::{
        cell::{Cell, RefCell},
        collections::{BTreeMap, BTreeSet, VecDeque},
        fmt::{self, Display},
        io,
        num::ParseIntError,
        rc::Rc,
        time::Instant,
    },
};

pub use self::{clock::*, counters::*, error::*};

mod clock {
    use super::*;

    /// a source of monotonic time, in seconds.
    pub trait Clock {
        fn now(&self) -> f64;
    }

    /// the system's monotonic clock, measured from when this clock was created.
    pub struct SystemClock {
        epoch: Instant,
    }

    /// a mock clock.
    ///
    /// time stands still until it is moved by hand.
    #[derive(Default)]
    #[allow(dead_code, reason = "this is a testing utility.")]
    pub struct MockClock {
        now: Cell<f64>,
    }

    // === impl SystemClock ===

    impl Default for SystemClock {
        fn default() -> Self {
            Self {
                epoch: Instant::now(),
            }
        }
    }

    impl Clock for SystemClock {
        fn now(&self) -> f64 {
            self.epoch.elapsed().as_secs_f64()
        }
    }

    // === impl MockClock ===

    #[allow(dead_code, reason = "this is a testing utility.")]
    impl MockClock {
        pub fn set(&self, now: f64) {
            self.now.set(now);
        }

        pub fn advance(&self, seconds: f64) {
            self.now.set(self.now.get() + seconds);
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> f64 {
            self.now.get()
        }
    }

    impl<C: Clock> Clock for Rc<C> {
        fn now(&self) -> f64 {
            C::now(self)
        }
    }
}

/// abstracts over providers of counters.
mod counters {
    use super::*;

    /// the counter names a source provides for a domain.
    #[derive(Clone, Debug, Default, Eq, PartialEq)]
    pub struct Schema {
        counters: BTreeSet<String>,
    }

    /// the result of reading one entity's record.
    pub type Record = Result<Counters, RecordError>;

    /// one read of a domain: each entity's record, by id.
    pub type Sample = BTreeMap<EntityId, Record>;

    /// a source of cumulative counters.
    pub trait CounterSource {
        /// declares the counters this source provides for `domain`.
        ///
        /// this is called once per domain, before the first read.
        fn schema(&mut self, domain: Domain) -> Result<Schema, SourceError>;

        /// reads the current counters of every entity in `domain`.
        fn read(&self, domain: Domain) -> Result<Sample, SourceError>;

        /// describes the machine the counters are read from.
        fn host(&self) -> Result<Host, SourceError> {
            Ok(Host::default())
        }
    }

    /// a mock counter source.
    #[derive(Default)]
    #[allow(dead_code, reason = "this is a testing utility.")]
    pub struct MockSource {
        schemas: BTreeMap<Domain, Schema>,
        replies: RefCell<BTreeMap<Domain, VecDeque<Reply>>>,
        /// a clock moved forward by stalled reads.
        clock: Option<Rc<MockClock>>,
    }

    /// a reply from a [`MockSource`].
    #[allow(dead_code, reason = "this is a testing utility.")]
    pub enum Reply {
        Sample(Sample),
        Fail,
        /// a sample that takes the given number of seconds to read.
        Stall(f64, Sample),
    }

    // === impl Schema ===

    impl Schema {
        /// returns true if this schema provides the named counter.
        pub fn declares(&self, name: &str) -> bool {
            self.counters.contains(name)
        }

        pub fn len(&self) -> usize {
            self.counters.len()
        }

        pub fn is_empty(&self) -> bool {
            self.counters.is_empty()
        }
    }

    impl<S: Into<String>> FromIterator<S> for Schema {
        fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
            Self {
                counters: iter.into_iter().map(Into::into).collect(),
            }
        }
    }

    // === impl MockSource ===

    #[allow(dead_code, reason = "this is a testing utility.")]
    impl MockSource {
        pub fn new() -> Self {
            Self::default()
        }

        /// returns a mock source whose stalled reads advance `clock`.
        pub fn with_clock(clock: Rc<MockClock>) -> Self {
            Self {
                clock: Some(clock),
                ..Self::default()
            }
        }

        /// declares the counters provided for `domain`.
        pub fn declare<S: Into<String>>(
            mut self,
            domain: Domain,
            counters: impl IntoIterator<Item = S>,
        ) -> Self {
            self.schemas.insert(domain, counters.into_iter().collect());
            self
        }

        /// queues a reply to the next read of `domain`.
        pub fn push(&self, domain: Domain, reply: Reply) {
            self.replies
                .borrow_mut()
                .entry(domain)
                .or_default()
                .push_back(reply);
        }

        /// queues a sample of well-formed records.
        pub fn push_sample<'a>(
            &self,
            domain: Domain,
            entities: impl IntoIterator<Item = (&'a str, Counters)>,
        ) {
            let sample = entities
                .into_iter()
                .map(|(id, counters)| (EntityId::from(id), Ok(counters)))
                .collect();
            self.push(domain, Reply::Sample(sample));
        }
    }

    impl CounterSource for MockSource {
        fn schema(&mut self, domain: Domain) -> Result<Schema, SourceError> {
            Ok(self.schemas.get(&domain).cloned().unwrap_or_default())
        }

        /// returns the next queued reply, or an empty sample if none is queued.
        fn read(&self, domain: Domain) -> Result<Sample, SourceError> {
            let Self { replies, clock, .. } = self;

            let reply = replies
                .borrow_mut()
                .get_mut(&domain)
                .and_then(VecDeque::pop_front);

            match reply {
                None => Ok(Sample::new()),
                Some(Reply::Sample(sample)) => Ok(sample),
                Some(Reply::Fail) => Err(SourceError::Io(io::Error::other("mock read failure"))),
                Some(Reply::Stall(seconds, sample)) => {
                    if let Some(clock) = clock {
                        clock.advance(seconds);
                    }
                    Ok(sample)
                }
            }
        }
    }
}

mod error {
    use super::*;

    /// a counter source could not be read this cycle.
    #[derive(Debug)]
    pub enum SourceError {
        Io(io::Error),
        /// the source's layout could not be understood.
        Layout { path: &'static str, reason: String },
        /// the read took longer than it was allowed to.
        Timeout { elapsed: f64, limit: f64 },
    }

    /// one entity's record could not be parsed.
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum RecordError {
        /// a field was not an unsigned integer.
        Field { name: String, error: ParseIntError },
        /// the record had fewer fields than required.
        Truncated { found: usize, expected: usize },
        /// the record had more fields than allowed.
        Overlong { found: usize, allowed: usize },
        /// the record was of a kind this source does not recognize.
        Unrecognized { kind: String },
    }

    // === impl SourceError ===

    impl std::error::Error for SourceError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                Self::Io(io) => Some(io),
                Self::Layout { .. } | Self::Timeout { .. } => None,
            }
        }
    }

    impl Display for SourceError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Io(io) => f.write_fmt(format_args!("{}", io)),
                Self::Layout { path, reason } => {
                    f.write_fmt(format_args!("unexpected layout in {path}: {reason}"))
                }
                Self::Timeout { elapsed, limit } => f.write_fmt(format_args!(
                    "read took {elapsed:.3}s, longer than the {limit:.3}s allowed"
                )),
            }
        }
    }

    impl From<io::Error> for SourceError {
        fn from(io: io::Error) -> Self {
            Self::Io(io)
        }
    }

    // === impl RecordError ===

    impl std::error::Error for RecordError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                Self::Field { error, .. } => Some(error),
                Self::Truncated { .. } | Self::Overlong { .. } | Self::Unrecognized { .. } => None,
            }
        }
    }

    impl Display for RecordError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            use RecordError::*;
            match self {
                Field { name, error } => f.write_fmt(format_args!("invalid {name}: {error}")),
                Truncated { found, expected } => f.write_fmt(format_args!(
                    "found {found} fields, expected at least {expected}"
                )),
                Overlong { found, allowed } => f.write_fmt(format_args!(
                    "found {found} fields, expected at most {allowed}"
                )),
                Unrecognized { kind } => {
                    f.write_fmt(format_args!("unrecognized entry kind: {kind}"))
                }
            }
        }
    }
}
