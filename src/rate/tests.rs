use {super::*, crate::sample::Counters};

fn snapshot<const N: usize>(timestamp: f64, counters: [(&str, u64); N]) -> CounterSnapshot {
    CounterSnapshot::new(EntityId::from("sda"), timestamp, Counters::from(counters))
}

mod monotonic_tests {
    use super::*;

    #[test]
    fn steady_increase() {
        let rate = rate_from_monotonic_counter(1000, 1010, 1.0);
        assert_eq!(rate, Rate { value: 10.0, clamped: false });
    }

    #[test]
    fn irregular_interval() {
        let rate = rate_from_monotonic_counter(0, 300, 1.5);
        assert_eq!(rate.value, 200.0);
    }

    #[test]
    fn reset_is_zero() {
        let rate = rate_from_monotonic_counter(3000, 2000, 1.0);
        assert_eq!(rate, Rate { value: 0.0, clamped: true });
    }

    #[test]
    fn zero_interval() {
        let rate = rate_from_monotonic_counter(1000, 1010, 0.0);
        assert_eq!(rate.value, 0.0);
    }

    #[test]
    fn negative_interval() {
        let rate = rate_from_monotonic_counter(1000, 1010, -1.0);
        assert_eq!(rate.value, 0.0);
    }

    #[test]
    fn nan_interval() {
        let rate = rate_from_monotonic_counter(1000, 1010, f64::NAN);
        assert_eq!(rate.value, 0.0);
    }

    #[test]
    fn huge_counters_do_not_overflow() {
        let rate = rate_from_monotonic_counter(u64::MAX - 10, u64::MAX, 1.0);
        assert_eq!(rate.value, 10.0);
        let rate = rate_from_monotonic_counter(u64::MAX, 0, 1.0);
        assert_eq!(rate.value, 0.0);
    }
}

mod busy_idle_tests {
    use super::*;

    #[test]
    fn half_busy() {
        let rate = percent_from_busy_idle(1000, 800, 1100, 850);
        assert_eq!(rate, Rate { value: 50.0, clamped: false });
    }

    #[test]
    fn fully_idle() {
        let rate = percent_from_busy_idle(1000, 800, 1100, 900);
        assert_eq!(rate.value, 0.0);
    }

    #[test]
    fn no_ticks_elapsed() {
        let rate = percent_from_busy_idle(1000, 800, 1000, 800);
        assert_eq!(rate, Rate::ZERO);
    }

    /// idle time grew faster than total time; this is clamped rather than negative.
    #[test]
    fn idle_outpaces_total() {
        let rate = percent_from_busy_idle(1000, 800, 1100, 950);
        assert_eq!(rate, Rate { value: 0.0, clamped: true });
    }

    #[test]
    fn total_reset() {
        let rate = percent_from_busy_idle(1000, 800, 10, 5);
        assert_eq!(rate.value, 0.0);
        assert!(rate.clamped);
    }

    #[test]
    fn idle_reset() {
        let rate = percent_from_busy_idle(1000, 800, 1100, 5);
        assert_eq!(rate.value, 0.0);
    }
}

mod used_total_tests {
    use super::*;

    #[test]
    fn quarter_used() {
        assert_eq!(percent_from_used_total(256, 1024).value, 25.0);
    }

    #[test]
    fn no_capacity() {
        assert_eq!(percent_from_used_total(10, 0), Rate::ZERO);
    }

    #[test]
    fn overcommitted() {
        let rate = percent_from_used_total(2048, 1024);
        assert_eq!(rate, Rate { value: 100.0, clamped: true });
    }
}

mod ops_tests {
    use super::*;

    #[test]
    fn reads_and_writes() {
        assert_eq!(iops_from_ops(10, 20, 40, 30, 2.0).value, 20.0);
    }

    #[test]
    fn write_counter_reset() {
        let rate = iops_from_ops(10, 20, 40, 0, 1.0);
        assert_eq!(rate, Rate { value: 0.0, clamped: true });
    }

    #[test]
    fn zero_interval() {
        assert_eq!(iops_from_ops(10, 20, 40, 30, 0.0).value, 0.0);
    }
}

mod ticks_tests {
    use super::*;

    #[test]
    fn half_busy() {
        assert_eq!(utilization_from_ticks(1000, 1500, 1.0).value, 50.0);
    }

    /// more busy milliseconds than elapsed milliseconds, e.g. from a late read.
    #[test]
    fn saturated() {
        let rate = utilization_from_ticks(0, 2500, 2.0);
        assert_eq!(rate, Rate { value: 100.0, clamped: true });
    }

    #[test]
    fn reset() {
        assert_eq!(utilization_from_ticks(1500, 10, 1.0).value, 0.0);
    }
}

mod formula_tests {
    use super::*;

    #[test]
    fn monotonic_uses_timestamps() {
        let formula = Formula::Monotonic {
            counter: "read_bytes",
        };
        let prev = snapshot(10.0, [("read_bytes", 1000)]);
        let curr = snapshot(12.0, [("read_bytes", 3000)]);
        assert_eq!(formula.evaluate(&prev, &curr).value, 1000.0);
    }

    #[test]
    fn missing_counters_read_as_zero() {
        let formula = Formula::Ops {
            reads: "reads",
            writes: "writes",
        };
        let prev = snapshot(0.0, [("reads", 10)]);
        let curr = snapshot(1.0, [("reads", 15)]);
        assert_eq!(formula.evaluate(&prev, &curr).value, 5.0);
    }

    #[test]
    fn identical_timestamps_are_neutral() {
        let prev = snapshot(5.0, [("used", 10), ("total", 20), ("io_ticks", 0)]);
        let curr = snapshot(5.0, [("used", 15), ("total", 20), ("io_ticks", 900)]);
        for domain in Domain::ALL {
            for spec in metrics(domain) {
                let rate = spec.formula.evaluate(&prev, &curr);
                assert_eq!(rate.value, 0.0, "{} {}", domain, spec.name);
            }
        }
    }

    #[test]
    fn evaluation_is_idempotent() {
        let prev = snapshot(1.0, [("total", 1000), ("idle_all", 800)]);
        let curr = snapshot(2.0, [("total", 1100), ("idle_all", 850)]);
        let formula = Formula::BusyIdle {
            total: "total",
            idle: "idle_all",
        };
        let first = formula.evaluate(&prev, &curr);
        let second = formula.evaluate(&prev, &curr);
        assert_eq!(first, second);
        assert_eq!(first.value, 50.0);
    }

    #[test]
    fn gauge_reads_the_current_value() {
        let formula = Formula::Gauge { counter: "cached" };
        let prev = snapshot(1.0, [("cached", 4096)]);
        let curr = snapshot(2.0, [("cached", 1024)]);
        let rate = formula.evaluate(&prev, &curr);
        assert_eq!(rate.value, 1024.0);
        assert!(!rate.clamped);
    }

    #[test]
    fn gauges_are_not_cumulative() {
        assert!(!Formula::Gauge { counter: "free" }.is_cumulative());
        assert!(
            !Formula::UsedTotal {
                used: "used",
                total: "total"
            }
            .is_cumulative()
        );
        assert!(Formula::Monotonic { counter: "page_in" }.is_cumulative());
        assert!(Formula::Ticks { counter: "io_ticks" }.is_cumulative());
    }

    #[test]
    fn counters_are_declared() {
        let formula = Formula::BusyIdle {
            total: "total",
            idle: "idle_all",
        };
        assert_eq!(formula.counters(), ["total", "idle_all"]);
    }
}

mod result_tests {
    use super::*;

    #[test]
    fn rounding() {
        let spec = metrics(Domain::Cpu)[0];
        let result = RateResult {
            value: 33.3333,
            ..spec.neutral(EntityId::from("cpu"))
        };
        assert_eq!(result.clone().round(1).value, 33.3);
        assert_eq!(result.clone().round(2).value, 33.33);
        assert_eq!(result.round(0).value, 33.0);
    }

    #[test]
    fn neutral_results() {
        for spec in metrics(Domain::Disk) {
            let result = spec.neutral(EntityId::from("sda"));
            assert_eq!(result.value, 0.0);
            assert!(!result.clamped);
            assert_eq!(result.metric_name, spec.name);
        }
    }

    #[test]
    fn known_metrics() {
        assert!(is_known_metric("usage"));
        assert!(is_known_metric("down"));
        assert!(!is_known_metric("bogus"));
    }
}
