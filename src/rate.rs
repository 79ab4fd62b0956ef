//! rate calculation.
//!
//! every counter family shares the same shape: a delta over an elapsed interval, clamped to a
//! physically valid range. these are pure functions; identical inputs always yield identical
//! outputs.

use {
    crate::sample::{CounterSnapshot, Domain, EntityId},
    std::fmt::{self, Display},
};

pub use self::table::metrics;

mod table;

#[cfg(test)]
mod tests;

/// a computed value, and whether it was forced into its valid range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rate {
    pub value: f64,
    /// true if the raw value was clamped to a bound, or neutralized by a counter discontinuity
    /// or a clock anomaly.
    pub clamped: bool,
}

/// the unit a metric is published in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Unit {
    Percent,
    Bytes,
    BytesPerSecond,
    OpsPerSecond,
    PagesPerSecond,
    PacketsPerSecond,
}

/// a counter family, and the counters it reads.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Formula {
    /// a cumulative counter, per second.
    Monotonic { counter: &'static str },
    /// the share of a total tick count not spent idle.
    BusyIdle {
        total: &'static str,
        idle: &'static str,
    },
    /// an instantaneous gauge, as it is.
    Gauge { counter: &'static str },
    /// an instantaneous gauge, as a share of its capacity.
    UsedTotal {
        used: &'static str,
        total: &'static str,
    },
    /// completed reads and writes, per second.
    Ops {
        reads: &'static str,
        writes: &'static str,
    },
    /// milliseconds spent busy, as a share of the interval.
    Ticks { counter: &'static str },
}

/// a named metric, computed by a [`Formula`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MetricSpec {
    pub name: &'static str,
    pub formula: Formula,
    pub unit: Unit,
}

/// a metric's value for one entity, for one poll.
#[derive(Clone, Debug, PartialEq)]
pub struct RateResult {
    pub entity_id: EntityId,
    pub metric_name: &'static str,
    pub value: f64,
    pub unit: Unit,
    pub clamped: bool,
}

/// returns true if `dt` is an interval that can be divided by.
fn is_valid_interval(dt: f64) -> bool {
    dt.is_finite() && dt > 0.0
}

/// `max(curr - prev, 0) / dt`.
///
/// a counter that went backwards has been reset. the interval is resynchronized and reports
/// zero; the next interval is measured against `curr`.
pub fn rate_from_monotonic_counter(prev: u64, curr: u64, dt: f64) -> Rate {
    if !is_valid_interval(dt) {
        return Rate::NEUTRALIZED;
    }

    match curr.checked_sub(prev) {
        Some(delta) => Rate::at_least_zero(delta as f64 / dt),
        None => Rate::NEUTRALIZED,
    }
}

/// the percentage of `total` ticks that were not `idle` ticks.
pub fn percent_from_busy_idle(
    prev_total: u64,
    prev_idle: u64,
    curr_total: u64,
    curr_idle: u64,
) -> Rate {
    let (Some(total), Some(idle)) = (
        curr_total.checked_sub(prev_total),
        curr_idle.checked_sub(prev_idle),
    ) else {
        return Rate::NEUTRALIZED;
    };

    if total == 0 {
        return Rate::ZERO;
    }

    let (total, idle) = (total as f64, idle as f64);
    let busy = total - idle;
    Rate::percent(busy / total * 100.0)
}

/// `used` as a percentage of `total`.
pub fn percent_from_used_total(used: u64, total: u64) -> Rate {
    if total == 0 {
        return Rate::ZERO;
    }

    Rate::percent(used as f64 / total as f64 * 100.0)
}

/// read and write operations completed per second.
pub fn iops_from_ops(prev_r: u64, prev_w: u64, curr_r: u64, curr_w: u64, dt: f64) -> Rate {
    if !is_valid_interval(dt) {
        return Rate::NEUTRALIZED;
    }

    let (Some(reads), Some(writes)) = (curr_r.checked_sub(prev_r), curr_w.checked_sub(prev_w))
    else {
        return Rate::NEUTRALIZED;
    };

    Rate::at_least_zero((reads as f64 + writes as f64) / dt)
}

/// the percentage of the interval that a device spent busy.
///
/// ticks are counted in milliseconds.
pub fn utilization_from_ticks(prev_ticks: u64, curr_ticks: u64, dt: f64) -> Rate {
    if !is_valid_interval(dt) {
        return Rate::NEUTRALIZED;
    }

    match curr_ticks.checked_sub(prev_ticks) {
        Some(ticks) => Rate::percent(ticks as f64 / (dt * 1000.0) * 100.0),
        None => Rate::NEUTRALIZED,
    }
}

// === impl Rate ===

impl Rate {
    /// a neutral value, computed without incident.
    pub const ZERO: Self = Self {
        value: 0.0,
        clamped: false,
    };

    /// a neutral value, forced by a discontinuity or clock anomaly.
    const NEUTRALIZED: Self = Self {
        value: 0.0,
        clamped: true,
    };

    fn clamp(value: f64, lower: f64, upper: f64) -> Self {
        if value.is_nan() {
            return Self::NEUTRALIZED;
        }

        let clamped = value.clamp(lower, upper);
        Self {
            value: clamped,
            clamped: clamped != value,
        }
    }

    fn percent(value: f64) -> Self {
        Self::clamp(value, 0.0, 100.0)
    }

    fn at_least_zero(value: f64) -> Self {
        Self::clamp(value, 0.0, f64::INFINITY)
    }
}

// === impl Unit ===

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Percent => "%",
            Self::Bytes => "B",
            Self::BytesPerSecond => "B/s",
            Self::OpsPerSecond => "ops/s",
            Self::PagesPerSecond => "pages/s",
            Self::PacketsPerSecond => "pkt/s",
        }
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// === impl Formula ===

impl Formula {
    /// the names of the counters this formula reads.
    pub fn counters(&self) -> Vec<&'static str> {
        match *self {
            Self::Monotonic { counter } | Self::Ticks { counter } | Self::Gauge { counter } => {
                vec![counter]
            }
            Self::BusyIdle { total, idle } => vec![total, idle],
            Self::UsedTotal { used, total } => vec![used, total],
            Self::Ops { reads, writes } => vec![reads, writes],
        }
    }

    /// returns true if this formula reads counters that only ever grow.
    pub fn is_cumulative(&self) -> bool {
        !matches!(self, Self::Gauge { .. } | Self::UsedTotal { .. })
    }

    /// applies this formula to two snapshots of the same entity.
    pub fn evaluate(&self, prev: &CounterSnapshot, curr: &CounterSnapshot) -> Rate {
        let dt = curr.timestamp - prev.timestamp;
        let (a, b) = (&prev.counters, &curr.counters);

        match *self {
            Self::Monotonic { counter } => {
                rate_from_monotonic_counter(a.get(counter), b.get(counter), dt)
            }
            Self::BusyIdle { total, idle } => {
                if !is_valid_interval(dt) {
                    return Rate::NEUTRALIZED;
                }
                percent_from_busy_idle(a.get(total), a.get(idle), b.get(total), b.get(idle))
            }
            Self::Gauge { counter } => {
                if !is_valid_interval(dt) {
                    return Rate::NEUTRALIZED;
                }
                Rate::at_least_zero(b.get(counter) as f64)
            }
            Self::UsedTotal { used, total } => {
                if !is_valid_interval(dt) {
                    return Rate::NEUTRALIZED;
                }
                percent_from_used_total(b.get(used), b.get(total))
            }
            Self::Ops { reads, writes } => {
                iops_from_ops(a.get(reads), a.get(writes), b.get(reads), b.get(writes), dt)
            }
            Self::Ticks { counter } => utilization_from_ticks(a.get(counter), b.get(counter), dt),
        }
    }
}

// === impl MetricSpec ===

impl MetricSpec {
    /// computes this metric for the interval between two snapshots.
    pub fn compute(&self, prev: &CounterSnapshot, curr: &CounterSnapshot) -> RateResult {
        let Rate { value, clamped } = self.formula.evaluate(prev, curr);
        self.result(curr.entity_id.clone(), value, clamped)
    }

    /// this metric's neutral value, used for an entity's first observation.
    pub fn neutral(&self, entity_id: EntityId) -> RateResult {
        let Rate { value, clamped } = Rate::ZERO;
        self.result(entity_id, value, clamped)
    }

    fn result(&self, entity_id: EntityId, value: f64, clamped: bool) -> RateResult {
        let Self { name, unit, .. } = *self;
        RateResult {
            entity_id,
            metric_name: name,
            value,
            unit,
            clamped,
        }
    }
}

// === impl RateResult ===

impl RateResult {
    /// rounds this value to the given number of decimal places.
    pub fn round(mut self, decimals: u8) -> Self {
        let scale = 10f64.powi(decimals.into());
        self.value = (self.value * scale).round() / scale;
        self
    }
}

/// returns true if any domain has a metric with the given name.
pub fn is_known_metric(name: &str) -> bool {
    Domain::ALL
        .into_iter()
        .flat_map(metrics)
        .any(|spec| spec.name == name)
}
