use super::{Formula::*, MetricSpec, Unit::*};
use crate::sample::Domain;

/// returns the metrics computed for each entity of `domain`.
pub fn metrics(domain: Domain) -> &'static [MetricSpec] {
    match domain {
        Domain::Cpu => CPU,
        Domain::Memory => MEMORY,
        Domain::Disk => DISK,
        Domain::Network => NETWORK,
    }
}

const CPU: &[MetricSpec] = &[MetricSpec {
    name: "usage",
    formula: BusyIdle {
        total: "total",
        idle: "idle_all",
    },
    unit: Percent,
}];

const MEMORY: &[MetricSpec] = &[
    MetricSpec {
        name: "used",
        formula: UsedTotal {
            used: "used",
            total: "total",
        },
        unit: Percent,
    },
    MetricSpec {
        name: "total",
        formula: Gauge { counter: "total" },
        unit: Bytes,
    },
    MetricSpec {
        name: "free",
        formula: Gauge { counter: "free" },
        unit: Bytes,
    },
    MetricSpec {
        name: "available",
        formula: Gauge {
            counter: "available",
        },
        unit: Bytes,
    },
    MetricSpec {
        name: "buffers",
        formula: Gauge { counter: "buffers" },
        unit: Bytes,
    },
    MetricSpec {
        name: "cached",
        formula: Gauge { counter: "cached" },
        unit: Bytes,
    },
    MetricSpec {
        name: "shared",
        formula: Gauge { counter: "shared" },
        unit: Bytes,
    },
    MetricSpec {
        name: "page_in",
        formula: Monotonic { counter: "page_in" },
        unit: PagesPerSecond,
    },
    MetricSpec {
        name: "page_out",
        formula: Monotonic {
            counter: "page_out",
        },
        unit: PagesPerSecond,
    },
];

const DISK: &[MetricSpec] = &[
    MetricSpec {
        name: "read",
        formula: Monotonic {
            counter: "read_bytes",
        },
        unit: BytesPerSecond,
    },
    MetricSpec {
        name: "write",
        formula: Monotonic {
            counter: "write_bytes",
        },
        unit: BytesPerSecond,
    },
    MetricSpec {
        name: "iops",
        formula: Ops {
            reads: "reads",
            writes: "writes",
        },
        unit: OpsPerSecond,
    },
    MetricSpec {
        name: "util",
        formula: Ticks {
            counter: "io_ticks",
        },
        unit: Percent,
    },
];

const NETWORK: &[MetricSpec] = &[
    MetricSpec {
        name: "down",
        formula: Monotonic {
            counter: "rx_bytes",
        },
        unit: BytesPerSecond,
    },
    MetricSpec {
        name: "up",
        formula: Monotonic {
            counter: "tx_bytes",
        },
        unit: BytesPerSecond,
    },
    MetricSpec {
        name: "rx_packets",
        formula: Monotonic {
            counter: "rx_packets",
        },
        unit: PacketsPerSecond,
    },
    MetricSpec {
        name: "tx_packets",
        formula: Monotonic {
            counter: "tx_packets",
        },
        unit: PacketsPerSecond,
    },
];
