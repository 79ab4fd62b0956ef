//! presentation of published results.

use {
    crate::{
        history::HistoryBuffer,
        meter::Meter,
        poller::{DomainReport, EntityReport},
        rate::{RateResult, Unit},
        sample::{Domain, EntityId},
    },
    std::iter::once,
};

/// the contents of one section of the dashboard.
#[derive(Clone, Debug, PartialEq)]
pub enum Panel {
    /// preformatted lines.
    Lines(Vec<String>),
    /// labelled values.
    Table(Vec<(String, String)>),
}

/// the width of a table's label column.
const LABEL_WIDTH: usize = 28;

/// the width of a cpu meter, in cells.
const METER_WIDTH: usize = 20;

/// shown in place of a domain that is unavailable, or has never been read.
pub const NO_DATA: &str = "no data";

/// the suffix of an entity whose results were carried over from an earlier poll.
pub const STALE: &str = "(stale)";

// === impl Panel ===

impl Panel {
    /// renders this panel beneath a title.
    pub fn render(&self, title: &str) -> Vec<String> {
        let body: Vec<String> = match self {
            Self::Lines(lines) => lines.clone(),
            Self::Table(rows) => rows
                .iter()
                .map(|(label, value)| format!("{label:<LABEL_WIDTH$} {value}"))
                .collect(),
        };

        once(title.to_owned()).chain(body).collect()
    }

    fn no_data() -> Self {
        Self::Lines(vec![NO_DATA.to_owned()])
    }
}

/// the title of a domain's section.
pub fn title(domain: Domain) -> String {
    domain.name().to_uppercase()
}

/// the title of a domain's headline graph.
pub fn graph_title(domain: Domain) -> &'static str {
    match domain {
        Domain::Cpu => "CPU usage %",
        Domain::Memory => "RAM used %",
        Domain::Disk => "Disk read + write",
        Domain::Network => "Network RX + TX",
    }
}

/// lays out a domain's latest report.
pub fn report(domain: Domain, report: Option<&DomainReport>) -> Panel {
    let Some(report) = report.filter(|report| report.available) else {
        return Panel::no_data();
    };

    match domain {
        Domain::Cpu => cpu(report),
        Domain::Memory => memory(report),
        Domain::Disk | Domain::Network => table(domain, report),
    }
}

/// one meter per cpu.
fn cpu(report: &DomainReport) -> Panel {
    let lines = report
        .entities
        .iter()
        .map(|(id, entity)| {
            let usage = entity
                .results
                .iter()
                .find(|result| result.metric_name == "usage")
                .map(|result| result.value)
                .unwrap_or(0.0);
            let meter = Meter::percent(usage, METER_WIDTH);
            let line = format!("{:<6} {meter} {usage:>5.1}%", id.as_str());
            suffixed(line, entity)
        })
        .collect();

    Panel::Lines(lines)
}

/// one row per metric, grouped by entity.
fn table(domain: Domain, report: &DomainReport) -> Panel {
    let rows = report
        .entities
        .iter()
        .flat_map(|(id, entity)| {
            entity
                .results
                .iter()
                .map(move |result| (label(id, entity, result), format_result(domain, result)))
        })
        .collect();

    Panel::Table(rows)
}

/// one row per metric, with each size shown beside its share of the total.
fn memory(report: &DomainReport) -> Panel {
    let rows = report
        .entities
        .iter()
        .flat_map(|(id, entity)| {
            let total = entity
                .results
                .iter()
                .find(|result| result.metric_name == "total")
                .map(|result| result.value)
                .unwrap_or(0.0);
            let shown = breakdown(id.as_str());

            entity
                .results
                .iter()
                .filter(move |result| {
                    result.unit != Unit::Bytes || shown.contains(&result.metric_name)
                })
                .map(move |result| {
                    let mut value = format_result(Domain::Memory, result);
                    if result.unit == Unit::Bytes && result.metric_name != "total" && total > 0.0 {
                        value = format!("{value} ({:.1}%)", result.value / total * 100.0);
                    }
                    (label(id, entity, result), value)
                })
        })
        .collect();

    Panel::Table(rows)
}

/// the sizes shown for a memory entity.
fn breakdown(entity_id: &str) -> &'static [&'static str] {
    match entity_id {
        "swap" => &["total", "free", "cached"],
        _ => &["total", "free", "available", "buffers", "cached", "shared"],
    }
}

fn label(id: &EntityId, entity: &EntityReport, result: &RateResult) -> String {
    let label = format!("{} {}", id.as_str(), result.metric_name.replace('_', " "));
    suffixed(label, entity)
}

/// lays out a domain's headline graph.
pub fn graph(history: Option<&HistoryBuffer>) -> Panel {
    let Some(history) = history.filter(|history| !history.is_empty()) else {
        return Panel::no_data();
    };

    let peak = history.max();
    Panel::Lines(vec![sparkline(history.values(), peak)])
}

fn suffixed(line: String, entity: &EntityReport) -> String {
    if entity.stale {
        format!("{line} {STALE}")
    } else {
        line
    }
}

/// formats a result in its unit.
///
/// disk throughput is shown in bytes, network throughput in bits.
pub fn format_result(domain: Domain, result: &RateResult) -> String {
    let RateResult { value, unit, .. } = *result;

    match (domain, unit) {
        (Domain::Network, Unit::BytesPerSecond) => format_speed(value),
        (_, Unit::BytesPerSecond) => format!("{}/s", format_bytes(value)),
        (_, Unit::Bytes) => format_bytes(value),
        (_, Unit::Percent) => format!("{value}%"),
        (_, unit) => format!("{value} {unit}"),
    }
}

/// formats a number of bytes in binary units.
pub fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut value = bytes;
    for unit in UNITS {
        if value < 1024.0 {
            return format!("{value:.2} {unit}");
        }
        value /= 1024.0;
    }

    format!("{value:.2} PiB")
}

/// formats a number of bytes per second as bits per second, in decimal units.
pub fn format_speed(bytes_per_sec: f64) -> String {
    const UNITS: [&str; 4] = ["bps", "Kbps", "Mbps", "Gbps"];

    let mut bits = bytes_per_sec * 8.0;
    for unit in UNITS {
        if bits < 1000.0 {
            return format!("{bits:.2} {unit}");
        }
        bits /= 1000.0;
    }

    format!("{bits:.2} Tbps")
}

/// draws values as a line of block characters, scaled against `peak`.
pub fn sparkline(values: impl Iterator<Item = f64>, peak: f64) -> String {
    const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    const TOP: usize = BLOCKS.len() - 1;

    values
        .map(|value| {
            if !(peak > 0.0 && value > 0.0) {
                return BLOCKS[0];
            }
            let level = (value / peak * TOP as f64).round() as usize;
            BLOCKS[level.min(TOP)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use {super::*, std::collections::BTreeMap};

    fn result(entity: &str, metric: &'static str, value: f64, unit: Unit) -> RateResult {
        RateResult {
            entity_id: EntityId::from(entity),
            metric_name: metric,
            value,
            unit,
            clamped: false,
        }
    }

    fn domain_report(entities: Vec<(&str, Vec<RateResult>, bool)>) -> DomainReport {
        let entities = entities
            .into_iter()
            .map(|(id, results, stale)| (EntityId::from(id), EntityReport { results, stale }))
            .collect::<BTreeMap<_, _>>();
        DomainReport {
            entities,
            failures: 0,
            available: true,
            as_of: Some(1.0),
        }
    }

    mod format_tests {
        use super::*;

        #[test]
        fn bytes() {
            assert_eq!(format_bytes(0.0), "0.00 B");
            assert_eq!(format_bytes(1023.0), "1023.00 B");
            assert_eq!(format_bytes(1024.0), "1.00 KiB");
            assert_eq!(format_bytes(1536.0 * 1024.0), "1.50 MiB");
            assert_eq!(format_bytes(1024f64.powi(5)), "1.00 PiB");
        }

        #[test]
        fn speed() {
            assert_eq!(format_speed(0.0), "0.00 bps");
            assert_eq!(format_speed(100.0), "800.00 bps");
            assert_eq!(format_speed(125.0), "1.00 Kbps");
            assert_eq!(format_speed(125_000_000.0), "1.00 Gbps");
            assert_eq!(format_speed(125e12), "1000.00 Tbps");
        }

        #[test]
        fn results() {
            let down = result("eth0", "down", 125.0, Unit::BytesPerSecond);
            assert_eq!(format_result(Domain::Network, &down), "1.00 Kbps");
            let read = result("sda", "read", 2048.0, Unit::BytesPerSecond);
            assert_eq!(format_result(Domain::Disk, &read), "2.00 KiB/s");
            let used = result("ram", "used", 42.5, Unit::Percent);
            assert_eq!(format_result(Domain::Memory, &used), "42.5%");
            let cached = result("ram", "cached", 3.0 * 1024.0 * 1024.0, Unit::Bytes);
            assert_eq!(format_result(Domain::Memory, &cached), "3.00 MiB");
            let iops = result("sda", "iops", 12.0, Unit::OpsPerSecond);
            assert_eq!(format_result(Domain::Disk, &iops), "12 ops/s");
        }
    }

    mod render_tests {
        use super::*;

        #[test]
        fn lines() {
            let panel = Panel::Lines(vec!["a".to_owned(), "b".to_owned()]);
            assert_eq!(panel.render("TITLE"), ["TITLE", "a", "b"]);
        }

        #[test]
        fn table() {
            let panel = Panel::Table(vec![("ram used".to_owned(), "50%".to_owned())]);
            let rendered = panel.render("MEMORY");
            assert_eq!(rendered.len(), 2);
            assert_eq!(rendered[1], format!("{:<28} 50%", "ram used"));
        }

        #[test]
        fn unavailable_domain() {
            let mut report = domain_report(vec![]);
            report.available = false;
            assert_eq!(
                super::super::report(Domain::Disk, Some(&report)),
                Panel::Lines(vec![NO_DATA.to_owned()])
            );
            assert_eq!(
                super::super::report(Domain::Disk, None),
                Panel::Lines(vec![NO_DATA.to_owned()])
            );
        }

        #[test]
        fn stale_entities_are_marked() {
            let report = domain_report(vec![
                ("eth0", vec![result("eth0", "down", 0.0, Unit::BytesPerSecond)], true),
                ("wlan0", vec![result("wlan0", "down", 0.0, Unit::BytesPerSecond)], false),
            ]);
            let Panel::Table(rows) = super::super::report(Domain::Network, Some(&report)) else {
                panic!("network is shown as a table");
            };
            assert_eq!(rows[0].0, "eth0 down (stale)");
            assert_eq!(rows[1].0, "wlan0 down");
        }

        #[test]
        fn memory_breakdown() {
            const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
            let report = domain_report(vec![
                (
                    "ram",
                    vec![
                        result("ram", "used", 25.0, Unit::Percent),
                        result("ram", "total", 8.0 * GIB, Unit::Bytes),
                        result("ram", "free", 2.0 * GIB, Unit::Bytes),
                        result("ram", "shared", 0.0, Unit::Bytes),
                        result("ram", "page_in", 4.0, Unit::PagesPerSecond),
                    ],
                    false,
                ),
                (
                    "swap",
                    vec![
                        result("swap", "total", GIB, Unit::Bytes),
                        result("swap", "buffers", 0.0, Unit::Bytes),
                    ],
                    false,
                ),
            ]);
            let Panel::Table(rows) = super::super::report(Domain::Memory, Some(&report)) else {
                panic!("memory is shown as a table");
            };
            let rows = rows
                .iter()
                .map(|(label, value)| (label.as_str(), value.as_str()))
                .collect::<Vec<_>>();
            assert_eq!(
                rows,
                [
                    ("ram used", "25%"),
                    ("ram total", "8.00 GiB"),
                    ("ram free", "2.00 GiB (25.0%)"),
                    ("ram shared", "0.00 B (0.0%)"),
                    ("ram page in", "4 pages/s"),
                    ("swap total", "1.00 GiB"),
                ]
            );
        }

        #[test]
        fn cpu_meters() {
            let report = domain_report(vec![(
                "cpu",
                vec![result("cpu", "usage", 50.0, Unit::Percent)],
                false,
            )]);
            let Panel::Lines(lines) = super::super::report(Domain::Cpu, Some(&report)) else {
                panic!("cpus are shown as lines");
            };
            let meter = Meter::percent(50.0, METER_WIDTH);
            assert_eq!(lines, [format!("cpu    {meter}  50.0%")]);
        }
    }

    mod graph_tests {
        use super::*;

        #[test]
        fn sparkline_scales_to_peak() {
            let line = sparkline([0.0, 50.0, 100.0].into_iter(), 100.0);
            assert_eq!(line, "▁▅█");
        }

        #[test]
        fn flat_sparkline() {
            assert_eq!(sparkline([0.0, 0.0].into_iter(), 0.0), "▁▁");
        }

        #[test]
        fn empty_graph() {
            let history = HistoryBuffer::new(60);
            assert_eq!(graph(Some(&history)), Panel::Lines(vec![NO_DATA.to_owned()]));
            assert_eq!(graph(None), Panel::Lines(vec![NO_DATA.to_owned()]));
        }
    }
}
